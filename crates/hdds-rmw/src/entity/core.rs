// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared state of a local endpoint.
//!
//! The graph cache holds an `Arc<EndpointCore>` for every local endpoint so
//! that match changes and intra-process deliveries reach it without going
//! through the user-facing handle.

use crate::condition::Readiness;
use crate::event::{DispatchSender, EventStatus, StatusSlot};
use crate::graph::{EndpointKind, Gid};
use crate::qos::PolicyKind;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One queued payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Message {
    pub payload: Vec<u8>,
    /// Writer of the message: publisher, client or service.
    pub source: Gid,
    pub sequence: i64,
}

pub(crate) struct StatusBook {
    status: Mutex<EventStatus>,
    pub readiness: Readiness,
}

impl StatusBook {
    fn new(slot: StatusSlot, dispatcher: DispatchSender) -> Self {
        Self {
            status: Mutex::new(EventStatus::empty(slot)),
            readiness: Readiness::new(dispatcher),
        }
    }

    fn update(&self, f: impl FnOnce(&mut EventStatus)) {
        f(&mut self.status.lock());
        self.readiness.notify();
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.status.lock().has_changes()
    }

    pub(crate) fn take(&self) -> EventStatus {
        self.status.lock().take()
    }
}

pub(crate) struct EndpointCore {
    pub gid: Gid,
    pub kind: EndpointKind,
    pub ignore_local: bool,
    capacity: Option<usize>,
    inbox: Mutex<VecDeque<Message>>,
    /// New samples, requests or responses.
    pub data: Readiness,
    books: [StatusBook; 3],
}

impl EndpointCore {
    pub(crate) fn new(
        gid: Gid,
        kind: EndpointKind,
        capacity: Option<usize>,
        ignore_local: bool,
        dispatcher: &DispatchSender,
    ) -> Self {
        Self {
            gid,
            kind,
            ignore_local,
            capacity,
            inbox: Mutex::new(VecDeque::new()),
            data: Readiness::new(dispatcher.clone()),
            books: [
                StatusBook::new(StatusSlot::Matched, dispatcher.clone()),
                StatusBook::new(StatusSlot::IncompatibleQos, dispatcher.clone()),
                StatusBook::new(StatusSlot::IncompatibleType, dispatcher.clone()),
            ],
        }
    }

    /// Queue a message, evicting the oldest when history is full.
    pub(crate) fn deliver(&self, message: Message) {
        {
            let mut inbox = self.inbox.lock();
            if let Some(cap) = self.capacity {
                while inbox.len() >= cap {
                    inbox.pop_front();
                }
            }
            inbox.push_back(message);
        }
        self.data.notify();
    }

    pub(crate) fn pop(&self) -> Option<Message> {
        self.inbox.lock().pop_front()
    }

    pub(crate) fn has_data(&self) -> bool {
        !self.inbox.lock().is_empty()
    }

    pub(crate) fn book(&self, slot: StatusSlot) -> &StatusBook {
        &self.books[slot as usize]
    }

    pub(crate) fn record_match(&self, matched: bool) {
        self.book(StatusSlot::Matched)
            .update(|s| s.record_match(matched));
    }

    pub(crate) fn record_incompatible_qos(&self, policy: PolicyKind) {
        self.book(StatusSlot::IncompatibleQos)
            .update(|s| s.record_incompatible_qos(policy));
    }

    pub(crate) fn record_incompatible_type(&self) {
        self.book(StatusSlot::IncompatibleType)
            .update(EventStatus::record_incompatible_type);
    }
}
