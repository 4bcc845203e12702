// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Slot-based wake driver behind every wait set.
//!
//! Each waitable attached to a wait set gets a slot and a [`Signal`]. A
//! signal marks its slot pending and, on the first mark only, wakes the
//! event the waiter blocks on. Marks coalesce until the waiter drains.
//!
//! - Linux: eventfd + poll.
//! - Elsewhere: mutex/condvar event.

use super::bitmap::SlotBits;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::io;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Slot count used when nothing else is configured.
pub const DEFAULT_SLOT_CAPACITY: usize = 2048;

/// Outcome of [`WaitDriver::wait`] other than a wake.
#[derive(Debug)]
pub enum WaitError {
    Timeout,
    Io(io::Error),
}

/// Handle given to readiness sources.
///
/// Sources keep a weak reference and call [`Signal::signal`] whenever they
/// become ready. `id` is unique per registration and used to detach.
pub trait Signal: Send + Sync {
    fn signal(&self);
    fn id(&self) -> u64;
}

/// Shared wake driver.
#[derive(Clone)]
pub struct WaitDriver {
    inner: Arc<DriverInner>,
}

/// A registered slot. Dropping it does not release the slot; call
/// [`WaitDriver::release`].
pub struct Registration {
    pub slot: usize,
    pub id: u64,
    pub signal: Arc<dyn Signal>,
}

impl WaitDriver {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid("wait driver capacity must be > 0"));
        }
        let event = platform::Event::new()
            .map_err(|e| Error::Error(format!("failed to create wake event: {}", e)))?;

        Ok(Self {
            inner: Arc::new(DriverInner {
                event,
                pending: SlotBits::new(capacity),
                slots: Mutex::new(SlotTable::default()),
                capacity,
            }),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Slots currently registered.
    #[must_use]
    pub fn active_slots(&self) -> usize {
        self.inner.slots.lock().active
    }

    pub fn register(&self) -> Result<Registration> {
        let (slot, id) = self.inner.slots.lock().allocate(self.inner.capacity)?;
        let signal: Arc<dyn Signal> = Arc::new(SlotSignal {
            inner: Arc::downgrade(&self.inner),
            slot,
            id,
        });
        Ok(Registration { slot, id, signal })
    }

    /// Release a slot. Returns `false` when `id` no longer owns `slot`.
    pub fn release(&self, slot: usize, id: u64) -> bool {
        let released = self.inner.slots.lock().release(slot, id);
        if released {
            self.inner.pending.clear(slot);
        }
        released
    }

    /// Block until a slot is signalled or `timeout` elapses. Returns the
    /// signalled slots, possibly none when a signal raced a release.
    pub fn wait(&self, timeout: Option<Duration>) -> std::result::Result<Vec<usize>, WaitError> {
        self.inner.event.wait(timeout)?;
        self.inner.event.drain();
        Ok(self.inner.pending.drain())
    }
}

struct DriverInner {
    event: platform::Event,
    pending: SlotBits,
    slots: Mutex<SlotTable>,
    capacity: usize,
}

impl DriverInner {
    fn signal_slot(&self, slot: usize) {
        if !self.pending.mark(slot) {
            self.event.signal();
        }
    }
}

struct SlotSignal {
    inner: Weak<DriverInner>,
    slot: usize,
    id: u64,
}

impl Signal for SlotSignal {
    fn signal(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.signal_slot(self.slot);
        }
    }

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Default)]
struct SlotTable {
    owners: Vec<Option<u64>>,
    free: Vec<usize>,
    next_id: u64,
    active: usize,
}

impl SlotTable {
    fn allocate(&mut self, capacity: usize) -> Result<(usize, u64)> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = self.owners.len();
                if slot >= capacity {
                    log::debug!("[rmw-waitset] slot table full ({} slots)", capacity);
                    return Err(Error::BadAlloc);
                }
                self.owners.push(None);
                slot
            }
        };

        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.owners[slot] = Some(self.next_id);
        self.active += 1;
        Ok((slot, self.next_id))
    }

    fn release(&mut self, slot: usize, id: u64) -> bool {
        match self.owners.get(slot) {
            Some(Some(owner)) if *owner == id => {
                self.owners[slot] = None;
                self.free.push(slot);
                self.active -= 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::WaitError;
    use std::io;
    use std::os::fd::RawFd;
    use std::time::{Duration, Instant};

    pub(super) struct Event {
        fd: RawFd,
    }

    impl Event {
        pub(super) fn new() -> io::Result<Self> {
            // SAFETY: eventfd takes no pointers; flags are valid constants.
            let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { fd })
        }

        pub(super) fn wait(&self, timeout: Option<Duration>) -> Result<(), WaitError> {
            let deadline = timeout.and_then(|d| Instant::now().checked_add(d));

            let mut pollfd = libc::pollfd {
                fd: self.fd,
                events: libc::POLLIN,
                revents: 0,
            };

            loop {
                // Recomputed on every pass so an interrupted poll resumes
                // with what is left of the timeout.
                let timeout_ms = poll_timeout_ms(deadline, Instant::now());
                // SAFETY: pollfd lives on this stack frame for the whole call.
                let res = unsafe { libc::poll(std::ptr::addr_of_mut!(pollfd), 1, timeout_ms) };
                match res {
                    0 => return Err(WaitError::Timeout),
                    r if r > 0 => return Ok(()),
                    _ => {
                        let err = io::Error::last_os_error();
                        if err.kind() != io::ErrorKind::Interrupted {
                            return Err(WaitError::Io(err));
                        }
                    }
                }
            }
        }

        pub(super) fn signal(&self) {
            let payload = 1u64.to_ne_bytes();
            loop {
                // SAFETY: payload is an 8-byte stack buffer as eventfd requires.
                let ret = unsafe { libc::write(self.fd, payload.as_ptr().cast(), payload.len()) };
                if ret >= 0 {
                    return;
                }
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted => continue,
                    // Counter saturated: the waiter is already woken.
                    io::ErrorKind::WouldBlock => return,
                    _ => {
                        log::debug!("[rmw-waitset] eventfd write failed: {}", err);
                        return;
                    }
                }
            }
        }

        pub(super) fn drain(&self) {
            let mut payload = [0u8; 8];
            loop {
                // SAFETY: payload is an 8-byte stack buffer as eventfd requires.
                let ret =
                    unsafe { libc::read(self.fd, payload.as_mut_ptr().cast(), payload.len()) };
                if ret >= 0 {
                    return;
                }
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted => continue,
                    io::ErrorKind::WouldBlock => return,
                    _ => {
                        log::debug!("[rmw-waitset] eventfd read failed: {}", err);
                        return;
                    }
                }
            }
        }
    }

    impl Drop for Event {
        fn drop(&mut self) {
            // SAFETY: fd came from eventfd and is closed exactly once.
            unsafe {
                libc::close(self.fd);
            }
        }
    }

    /// `poll` timeout for the time left until `deadline`; -1 blocks.
    fn poll_timeout_ms(deadline: Option<Instant>, now: Instant) -> libc::c_int {
        match deadline {
            None => -1,
            Some(deadline) => {
                // Round up so a sub-millisecond remainder still waits.
                let ms = deadline
                    .saturating_duration_since(now)
                    .as_nanos()
                    .div_ceil(1_000_000);
                libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn poll_timeout_shrinks_toward_the_deadline() {
            let start = Instant::now();
            let deadline = start + Duration::from_millis(100);

            assert_eq!(poll_timeout_ms(None, start), -1);
            assert_eq!(poll_timeout_ms(Some(deadline), start), 100);
            assert_eq!(
                poll_timeout_ms(Some(deadline), start + Duration::from_millis(60)),
                40
            );
            assert_eq!(
                poll_timeout_ms(Some(deadline), start + Duration::from_micros(99_500)),
                1
            );
            assert_eq!(
                poll_timeout_ms(Some(deadline), start + Duration::from_millis(150)),
                0
            );
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::WaitError;
    use parking_lot::{Condvar, Mutex};
    use std::io;
    use std::time::{Duration, Instant};

    pub(super) struct Event {
        set: Mutex<bool>,
        cond: Condvar,
    }

    impl Event {
        pub(super) fn new() -> io::Result<Self> {
            Ok(Self {
                set: Mutex::new(false),
                cond: Condvar::new(),
            })
        }

        pub(super) fn wait(&self, timeout: Option<Duration>) -> Result<(), WaitError> {
            let mut set = self.set.lock();
            let deadline = timeout.map(|d| Instant::now() + d);
            while !*set {
                match deadline {
                    None => self.cond.wait(&mut set),
                    Some(deadline) => {
                        if self.cond.wait_until(&mut set, deadline).timed_out() && !*set {
                            return Err(WaitError::Timeout);
                        }
                    }
                }
            }
            Ok(())
        }

        pub(super) fn signal(&self) {
            *self.set.lock() = true;
            self.cond.notify_one();
        }

        pub(super) fn drain(&self) {
            *self.set.lock() = false;
        }
    }
}
