// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::event::EventDispatcher;
use crate::rt::WaitDriver;
use std::sync::mpsc;
use std::time::Duration;

#[test]
fn guard_trigger_wakes_attached_driver_once() {
    let driver = WaitDriver::new(4).expect("driver");
    let reg = driver.register().expect("slot");
    let guard = GuardCondition::new();
    guard.hooks().attach(&reg.signal);

    guard.trigger().expect("trigger");
    guard.trigger().expect("trigger");
    guard.trigger().expect("trigger");

    let signalled = driver.wait(Some(Duration::from_millis(10))).expect("wake");
    assert_eq!(signalled, vec![reg.slot]);
    assert!(guard.consume());
    assert!(!guard.consume());
}

#[test]
fn detached_hooks_stop_signalling() {
    let driver = WaitDriver::new(4).expect("driver");
    let reg = driver.register().expect("slot");
    let guard = GuardCondition::new();
    guard.hooks().attach(&reg.signal);
    guard.hooks().detach(reg.id);
    assert_eq!(guard.hooks().len(), 0);

    guard.trigger().expect("trigger");
    assert!(driver.wait(Some(Duration::ZERO)).is_err());
    assert!(guard.is_triggered());
}

#[test]
fn dead_signals_are_pruned() {
    let guard = GuardCondition::new();
    {
        let driver = WaitDriver::new(4).expect("driver");
        let reg = driver.register().expect("slot");
        guard.hooks().attach(&reg.signal);
    }
    guard.trigger().expect("trigger");
    assert_eq!(guard.hooks().len(), 0);
}

#[test]
fn claim_is_exclusive() {
    let guard = GuardCondition::new();
    assert!(guard.claim().try_claim());
    assert!(!guard.claim().try_claim());
    guard.claim().release();
    assert!(guard.claim().try_claim());
}

#[test]
fn guard_ids_are_unique() {
    assert_ne!(GuardCondition::new().id(), GuardCondition::default().id());
}

#[test]
fn readiness_coalesces_events_until_callback_is_set() {
    let mut dispatcher = EventDispatcher::start().expect("dispatcher");
    let readiness = Readiness::new(dispatcher.sender());

    readiness.notify();
    readiness.notify();
    readiness.notify();

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    readiness.set_callback(Some(Arc::new(move |count: usize| {
        let _ = tx.lock().send(count);
    })));

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).expect("flush"), 3);

    readiness.notify();
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).expect("single"), 1);

    readiness.set_callback(None);
    readiness.notify();
    readiness.notify();
    dispatcher.stop().expect("stop");
    assert!(rx.try_recv().is_err());
}

#[test]
fn readiness_signals_wait_sets_with_or_without_callback() {
    let dispatcher = EventDispatcher::start().expect("dispatcher");
    let readiness = Readiness::new(dispatcher.sender());
    let driver = WaitDriver::new(4).expect("driver");
    let reg = driver.register().expect("slot");
    readiness.hooks().attach(&reg.signal);

    readiness.notify();
    assert_eq!(
        driver.wait(Some(Duration::from_millis(10))).expect("wake"),
        vec![reg.slot]
    );

    readiness.set_callback(Some(Arc::new(|_: usize| {})));
    readiness.notify();
    assert_eq!(
        driver.wait(Some(Duration::from_millis(10))).expect("wake"),
        vec![reg.slot]
    );
}
