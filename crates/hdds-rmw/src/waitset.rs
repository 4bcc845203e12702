// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wait multiplexer.
//!
//! A [`WaitSet`] blocks on a heterogeneous list of [`Waitable`]s until one
//! of them is ready, its own guard condition fires or the timeout elapses.
//! Slots of handles that were not ready come back as `None`.
//!
//! Each call attaches a driver slot to every handle, scans readiness, and
//! only blocks when the scan found nothing. The attachment is undone on
//! every exit path, so a handle can move freely between wait sets across
//! calls. Waiting on a handle that another wait currently holds is
//! rejected.

use crate::backend::{Backend, Hdds};
use crate::condition::{GuardCondition, SignalHooks, WaitClaim};
use crate::entity::{Client, EventHandle, Service, Subscription};
use crate::error::{Error, Result};
use crate::rt::{Signal, WaitDriver, WaitError};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Anything a [`WaitSet`] can wait on.
pub enum Waitable<'a, B: Backend = Hdds> {
    /// Ready when a sample is queued.
    Subscription(&'a Subscription<'a, B>),
    /// Ready when a request is queued.
    Service(&'a Service<'a, B>),
    /// Ready when a response is queued.
    Client(&'a Client<'a, B>),
    /// Ready when the status changed since the last take.
    Event(&'a EventHandle<'a, B>),
    /// Ready when triggered; reporting it ready consumes the trigger.
    GuardCondition(&'a GuardCondition),
}

impl<B: Backend> Clone for Waitable<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Backend> Copy for Waitable<'_, B> {}

impl<'a, B: Backend> Waitable<'a, B> {
    fn hooks(self) -> &'a SignalHooks {
        match self {
            Waitable::Subscription(s) => s.core().data.hooks(),
            Waitable::Service(s) => s.core().data.hooks(),
            Waitable::Client(c) => c.core().data.hooks(),
            Waitable::Event(e) => e.readiness().hooks(),
            Waitable::GuardCondition(g) => g.hooks(),
        }
    }

    fn claim(self) -> &'a WaitClaim {
        match self {
            Waitable::Subscription(s) => s.core().data.claim(),
            Waitable::Service(s) => s.core().data.claim(),
            Waitable::Client(c) => c.core().data.claim(),
            Waitable::Event(e) => e.readiness().claim(),
            Waitable::GuardCondition(g) => g.claim(),
        }
    }

    fn poll(self) -> bool {
        match self {
            Waitable::Subscription(s) => s.core().has_data(),
            Waitable::Service(s) => s.core().has_data(),
            Waitable::Client(c) => c.core().has_data(),
            Waitable::Event(e) => e.has_changes(),
            Waitable::GuardCondition(g) => g.consume(),
        }
    }

    fn is_guard(self, guard: &GuardCondition) -> bool {
        matches!(self, Waitable::GuardCondition(g) if std::ptr::eq(g, guard))
    }
}

struct Enrolled<'s> {
    hooks: &'s SignalHooks,
    claim: &'s WaitClaim,
    slot: usize,
    // Hooks hold the signal weakly; this keeps it alive for the wait.
    signal: Arc<dyn Signal>,
}

/// Handles attached for the duration of one `wait` call.
struct Session<'s> {
    driver: &'s WaitDriver,
    enrolled: Vec<Enrolled<'s>>,
}

impl<'s> Session<'s> {
    fn new(driver: &'s WaitDriver, expected: usize) -> Self {
        Self {
            driver,
            enrolled: Vec::with_capacity(expected),
        }
    }

    fn enroll(&mut self, hooks: &'s SignalHooks, claim: &'s WaitClaim) -> Result<()> {
        if !claim.try_claim() {
            return Err(Error::invalid(
                "handle is already being waited on by another wait set",
            ));
        }
        let registration = match self.driver.register() {
            Ok(registration) => registration,
            Err(e) => {
                claim.release();
                return Err(e);
            }
        };
        hooks.attach(&registration.signal);
        self.enrolled.push(Enrolled {
            hooks,
            claim,
            slot: registration.slot,
            signal: registration.signal,
        });
        Ok(())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        for entry in self.enrolled.drain(..) {
            let id = entry.signal.id();
            entry.hooks.detach(id);
            self.driver.release(entry.slot, id);
            entry.claim.release();
        }
    }
}

/// Reusable wait multiplexer. `wait` takes `&mut self`: one waiter at a
/// time.
pub struct WaitSet<B: Backend = Hdds> {
    driver: WaitDriver,
    guard: Arc<GuardCondition>,
    max_handles: usize,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> WaitSet<B> {
    pub(crate) fn new(max_handles: usize, initial_capacity: usize) -> Result<Self> {
        let capacity = if max_handles == 0 {
            initial_capacity
        } else {
            max_handles.saturating_add(1)
        };
        let driver = WaitDriver::new(capacity)?;
        log::debug!(
            "[rmw-waitset] created (max handles {}, {} slots)",
            max_handles,
            capacity
        );
        Ok(Self {
            driver,
            guard: Arc::new(GuardCondition::new()),
            max_handles,
            _backend: PhantomData,
        })
    }

    /// Triggering this condition from any thread wakes the current `wait`.
    #[must_use]
    pub fn guard_condition(&self) -> Arc<GuardCondition> {
        Arc::clone(&self.guard)
    }

    /// Handle limit per wait; 0 is unbounded.
    #[must_use]
    pub fn max_handles(&self) -> usize {
        self.max_handles
    }

    /// Block until at least one handle is ready.
    ///
    /// - `timeout = None` blocks indefinitely, `Some(Duration::ZERO)` only
    ///   scans.
    /// - Returns the number of ready handles. Slots of handles that were not
    ///   ready are set to `None`.
    /// - `Err(Error::Timeout)` when nothing became ready; every slot is
    ///   `None` then.
    /// - Triggering [`guard_condition`](Self::guard_condition) while it is not
    ///   in `handles` returns `Ok(0)`. When it is in `handles` it is
    ///   reported like any other guard.
    /// - Argument errors leave `handles` untouched.
    pub fn wait(
        &mut self,
        handles: &mut [Option<Waitable<'_, B>>],
        timeout: Option<Duration>,
    ) -> Result<usize> {
        let guard = Arc::clone(&self.guard);
        let guard_listed = handles.iter().flatten().any(|h| h.is_guard(&guard));

        // The own guard has its slot on top of `max_handles`.
        let requested = handles
            .iter()
            .flatten()
            .filter(|h| !h.is_guard(&guard))
            .count();
        if self.max_handles != 0 && requested > self.max_handles {
            return Err(Error::invalid(format!(
                "{} handles exceed the wait set capacity of {}",
                requested, self.max_handles
            )));
        }
        self.reserve(requested + 1)?;
        let mut ready = vec![false; handles.len()];

        let outcome = {
            let mut session = Session::new(&self.driver, requested + 1);
            if !guard_listed {
                session.enroll(guard.hooks(), guard.claim())?;
            }
            for handle in handles.iter().flatten() {
                session.enroll(handle.hooks(), handle.claim())?;
            }
            self.block(handles, &mut ready, &guard, guard_listed, timeout)
        };

        match outcome {
            Ok(_) | Err(Error::Timeout) => {
                for (slot, is_ready) in handles.iter_mut().zip(&ready) {
                    if !is_ready {
                        *slot = None;
                    }
                }
            }
            Err(_) => {}
        }
        outcome
    }

    fn block(
        &self,
        handles: &[Option<Waitable<'_, B>>],
        ready: &mut [bool],
        guard: &GuardCondition,
        guard_listed: bool,
        timeout: Option<Duration>,
    ) -> Result<usize> {
        // A deadline too far out to represent is the same as none.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let count = scan(handles, ready);
            if count > 0 {
                return Ok(count);
            }
            if !guard_listed && guard.consume() {
                log::debug!("[rmw-waitset] wait cancelled through guard condition");
                return Ok(0);
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::Timeout);
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            match self.driver.wait(remaining) {
                Ok(_) | Err(WaitError::Timeout) => {}
                Err(WaitError::Io(e)) => {
                    return Err(Error::Error(format!("wait failed: {}", e)));
                }
            }
        }
    }

    /// Grow the driver of an unbounded wait set so `needed` slots fit.
    fn reserve(&mut self, needed: usize) -> Result<()> {
        let capacity = self.driver.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let grown = needed.max(capacity.saturating_mul(2));
        log::debug!(
            "[rmw-waitset] growing slot table {} -> {}",
            capacity,
            grown
        );
        self.driver = WaitDriver::new(grown)?;
        Ok(())
    }
}

impl<B: Backend> std::fmt::Debug for WaitSet<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitSet")
            .field("max_handles", &self.max_handles)
            .field("capacity", &self.driver.capacity())
            .finish_non_exhaustive()
    }
}

fn scan<B: Backend>(handles: &[Option<Waitable<'_, B>>], ready: &mut [bool]) -> usize {
    let mut count = 0;
    for (handle, flag) in handles.iter().zip(ready.iter_mut()) {
        *flag = handle.is_some_and(Waitable::poll);
        if *flag {
            count += 1;
        }
    }
    count
}
