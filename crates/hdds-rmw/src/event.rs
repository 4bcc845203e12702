// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entity events and the push-callback dispatch thread.
//!
//! Callbacks never run on the thread that produced the event. Producers
//! enqueue an invocation on a crossbeam channel and the `hdds-rmw-events`
//! thread owned by the context runs it.

use crate::error::{Error, Result};
use crate::qos::PolicyKind;
use crossbeam::channel::{self, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Push callback. The argument is the number of events since the last
/// invocation (always >= 1). User data is whatever the closure captures.
pub type EventCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Status events an [`crate::entity::EventHandle`] can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SubscriptionMatched,
    PublicationMatched,
    RequestedQosIncompatible,
    OfferedQosIncompatible,
    SubscriptionIncompatibleType,
    PublisherIncompatibleType,
    LivelinessChanged,
    LivelinessLost,
    RequestedDeadlineMissed,
    OfferedDeadlineMissed,
    MessageLost,
}

/// Which status book of an endpoint an event reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusSlot {
    Matched = 0,
    IncompatibleQos = 1,
    IncompatibleType = 2,
}

impl EventKind {
    /// `false` for kinds this backend never raises.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self.route().is_ok()
    }

    /// `true` when the event belongs to a publisher, `false` for a
    /// subscription.
    #[must_use]
    pub fn on_publisher(self) -> bool {
        matches!(
            self,
            Self::PublicationMatched
                | Self::OfferedQosIncompatible
                | Self::PublisherIncompatibleType
                | Self::LivelinessLost
                | Self::OfferedDeadlineMissed
        )
    }

    pub(crate) fn route(self) -> Result<StatusSlot> {
        match self {
            Self::SubscriptionMatched | Self::PublicationMatched => Ok(StatusSlot::Matched),
            Self::RequestedQosIncompatible | Self::OfferedQosIncompatible => {
                Ok(StatusSlot::IncompatibleQos)
            }
            Self::SubscriptionIncompatibleType | Self::PublisherIncompatibleType => {
                Ok(StatusSlot::IncompatibleType)
            }
            Self::LivelinessChanged => Err(Error::Unsupported("liveliness changed event")),
            Self::LivelinessLost => Err(Error::Unsupported("liveliness lost event")),
            Self::RequestedDeadlineMissed => {
                Err(Error::Unsupported("requested deadline missed event"))
            }
            Self::OfferedDeadlineMissed => Err(Error::Unsupported("offered deadline missed event")),
            Self::MessageLost => Err(Error::Unsupported("message lost event")),
        }
    }
}

/// Snapshot returned by [`crate::entity::EventHandle::take_status`].
///
/// `*_change` fields count what happened since the previous take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Matched {
        total_count: u32,
        total_count_change: i32,
        current_count: u32,
        current_count_change: i32,
    },
    IncompatibleQos {
        total_count: u32,
        total_count_change: i32,
        last_policy_kind: Option<PolicyKind>,
    },
    IncompatibleType {
        total_count: u32,
        total_count_change: i32,
    },
}

impl EventStatus {
    pub(crate) fn empty(slot: StatusSlot) -> Self {
        match slot {
            StatusSlot::Matched => Self::Matched {
                total_count: 0,
                total_count_change: 0,
                current_count: 0,
                current_count_change: 0,
            },
            StatusSlot::IncompatibleQos => Self::IncompatibleQos {
                total_count: 0,
                total_count_change: 0,
                last_policy_kind: None,
            },
            StatusSlot::IncompatibleType => Self::IncompatibleType {
                total_count: 0,
                total_count_change: 0,
            },
        }
    }

    /// Something changed since the last take.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match *self {
            Self::Matched {
                total_count_change,
                current_count_change,
                ..
            } => total_count_change != 0 || current_count_change != 0,
            Self::IncompatibleQos {
                total_count_change, ..
            }
            | Self::IncompatibleType {
                total_count_change, ..
            } => total_count_change != 0,
        }
    }

    pub(crate) fn record_match(&mut self, matched: bool) {
        if let Self::Matched {
            total_count,
            total_count_change,
            current_count,
            current_count_change,
        } = self
        {
            if matched {
                *total_count += 1;
                *total_count_change += 1;
                *current_count += 1;
                *current_count_change += 1;
            } else {
                *current_count = current_count.saturating_sub(1);
                *current_count_change -= 1;
            }
        }
    }

    pub(crate) fn record_incompatible_qos(&mut self, policy: PolicyKind) {
        if let Self::IncompatibleQos {
            total_count,
            total_count_change,
            last_policy_kind,
        } = self
        {
            *total_count += 1;
            *total_count_change += 1;
            *last_policy_kind = Some(policy);
        }
    }

    pub(crate) fn record_incompatible_type(&mut self) {
        if let Self::IncompatibleType {
            total_count,
            total_count_change,
        } = self
        {
            *total_count += 1;
            *total_count_change += 1;
        }
    }

    /// Return the current snapshot and zero the change counters.
    pub(crate) fn take(&mut self) -> Self {
        let snapshot = *self;
        match self {
            Self::Matched {
                total_count_change,
                current_count_change,
                ..
            } => {
                *total_count_change = 0;
                *current_count_change = 0;
            }
            Self::IncompatibleQos {
                total_count_change, ..
            }
            | Self::IncompatibleType {
                total_count_change, ..
            } => *total_count_change = 0,
        }
        snapshot
    }
}

enum Job {
    Invoke { callback: EventCallback, count: usize },
    Stop,
}

/// Cloneable producer side of the dispatch queue.
#[derive(Clone)]
pub(crate) struct DispatchSender {
    tx: Sender<Job>,
}

impl DispatchSender {
    pub(crate) fn dispatch(&self, callback: EventCallback, count: usize) {
        if self.tx.send(Job::Invoke { callback, count }).is_err() {
            log::debug!("[rmw-events] dispatcher stopped, dropping {} event(s)", count);
        }
    }
}

/// Dispatch thread owned by a context.
pub(crate) struct EventDispatcher {
    tx: Sender<Job>,
    thread: Option<JoinHandle<()>>,
}

impl EventDispatcher {
    pub(crate) fn start() -> Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        let thread = thread::Builder::new()
            .name("hdds-rmw-events".into())
            .spawn(move || run(rx))
            .map_err(|e| Error::Error(format!("failed to spawn event thread: {}", e)))?;

        Ok(Self {
            tx,
            thread: Some(thread),
        })
    }

    pub(crate) fn sender(&self) -> DispatchSender {
        DispatchSender {
            tx: self.tx.clone(),
        }
    }

    /// Run queued callbacks, then stop the thread. Idempotent.
    pub(crate) fn stop(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // The worker may already be gone; joining reports why.
        let _ = self.tx.send(Job::Stop);
        thread
            .join()
            .map_err(|_| Error::Error("event thread panicked".to_string()))
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("[rmw-events] {}", e);
        }
    }
}

fn run(rx: Receiver<Job>) {
    log::debug!("[rmw-events] dispatch thread started");
    while let Ok(job) = rx.recv() {
        match job {
            Job::Invoke { callback, count } => {
                if panic::catch_unwind(AssertUnwindSafe(|| callback(count))).is_err() {
                    log::warn!("[rmw-events] user callback panicked");
                }
            }
            Job::Stop => break,
        }
    }
    log::debug!("[rmw-events] dispatch thread stopped");
}
