// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wake primitives shared by wait sets and the event dispatcher.
//!
//! - [`GuardCondition`]: application-triggered, edge-triggered wake.
//! - [`Readiness`]: per-entity notifier. Every new sample, request, response
//!   or status change goes through it, reaching both attached wait sets and
//!   the entity's push callback.

use crate::event::{DispatchSender, EventCallback};
use crate::rt::Signal;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

struct Hook {
    id: u64,
    signal: Weak<dyn Signal>,
}

/// Wait-set signals attached to one readiness source.
#[derive(Default)]
pub(crate) struct SignalHooks {
    hooks: Mutex<Vec<Hook>>,
}

impl SignalHooks {
    pub(crate) fn attach(&self, signal: &Arc<dyn Signal>) {
        let mut hooks = self.hooks.lock();
        hooks.retain(|hook| hook.signal.strong_count() > 0);
        hooks.push(Hook {
            id: signal.id(),
            signal: Arc::downgrade(signal),
        });
    }

    pub(crate) fn detach(&self, id: u64) {
        self.hooks.lock().retain(|hook| hook.id != id);
    }

    pub(crate) fn notify(&self) {
        self.hooks.lock().retain(|hook| match hook.signal.upgrade() {
            Some(signal) => {
                signal.signal();
                true
            }
            None => false,
        });
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hooks.lock().len()
    }
}

/// Exclusive "being waited on" marker.
#[derive(Default)]
pub(crate) struct WaitClaim(AtomicBool);

impl WaitClaim {
    pub(crate) fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Manually triggered wake primitive.
///
/// Triggers are edge-triggered and coalesce: any number of
/// [`trigger`](Self::trigger) calls before the next wait produce exactly one
/// wake, and reporting the condition ready consumes the trigger.
pub struct GuardCondition {
    id: u64,
    triggered: AtomicBool,
    hooks: SignalHooks,
    claim: WaitClaim,
}

impl GuardCondition {
    #[must_use]
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            triggered: AtomicBool::new(false),
            hooks: SignalHooks::default(),
            claim: WaitClaim::default(),
        }
    }

    /// Process-unique identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wake whoever waits on this condition. Callable from any thread.
    pub fn trigger(&self) -> crate::error::Result<()> {
        if !self.triggered.swap(true, Ordering::AcqRel) {
            self.hooks.notify();
        }
        Ok(())
    }

    /// Pending trigger not yet consumed by a wait.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    pub(crate) fn consume(&self) -> bool {
        self.triggered.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn hooks(&self) -> &SignalHooks {
        &self.hooks
    }

    pub(crate) fn claim(&self) -> &WaitClaim {
        &self.claim
    }
}

impl Default for GuardCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GuardCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardCondition")
            .field("id", &self.id)
            .field("triggered", &self.is_triggered())
            .finish()
    }
}

#[derive(Default)]
struct CallbackState {
    callback: Option<EventCallback>,
    unnotified: usize,
}

/// Per-entity notifier feeding wait sets and the push callback.
///
/// Events raised while no callback is registered are counted; registering a
/// callback flushes that count as a single invocation.
pub(crate) struct Readiness {
    state: Mutex<CallbackState>,
    hooks: SignalHooks,
    claim: WaitClaim,
    dispatcher: DispatchSender,
}

impl Readiness {
    pub(crate) fn new(dispatcher: DispatchSender) -> Self {
        Self {
            state: Mutex::new(CallbackState::default()),
            hooks: SignalHooks::default(),
            claim: WaitClaim::default(),
            dispatcher,
        }
    }

    /// One new event on the entity.
    pub(crate) fn notify(&self) {
        {
            let mut state = self.state.lock();
            match state.callback.clone() {
                Some(callback) => {
                    let count = state.unnotified + 1;
                    state.unnotified = 0;
                    self.dispatcher.dispatch(callback, count);
                }
                None => state.unnotified += 1,
            }
        }
        self.hooks.notify();
    }

    /// Register or clear the push callback.
    pub(crate) fn set_callback(&self, callback: Option<EventCallback>) {
        let mut state = self.state.lock();
        state.callback = callback;
        if let Some(callback) = state.callback.clone() {
            if state.unnotified > 0 {
                let count = std::mem::take(&mut state.unnotified);
                self.dispatcher.dispatch(callback, count);
            }
        }
    }

    pub(crate) fn hooks(&self) -> &SignalHooks {
        &self.hooks
    }

    pub(crate) fn claim(&self) -> &WaitClaim {
        &self.claim
    }
}

#[cfg(test)]
mod tests;
