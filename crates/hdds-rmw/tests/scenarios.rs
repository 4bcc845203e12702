// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end behavior through the public API only.

use hdds_rmw::qos::{resolve, EndpointRole, Severity};
use hdds_rmw::{
    check_compatible, Compatibility, Context, ContextOptions, Durability, EndpointKind, Error,
    Gid, PolicyKind, QosProfile, Reliability, RemoteEndpoint, SubscriptionOptions, Waitable,
    RMW_GID_STORAGE_SIZE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const STRING: &str = "std_msgs/msg/String";

fn with(reliability: Reliability, durability: Durability) -> QosProfile {
    QosProfile {
        reliability,
        durability,
        ..QosProfile::default()
    }
}

fn context() -> Context {
    Context::new(ContextOptions::default()).expect("context")
}

#[test]
fn reliable_offer_serves_best_effort_request() {
    let offer = with(Reliability::Reliable, Durability::Volatile);
    let request = with(Reliability::BestEffort, Durability::Volatile);

    let (verdict, reasons) = check_compatible(&offer, &request);
    assert_eq!(verdict, Compatibility::Compatible);
    assert!(reasons.is_empty());
}

#[test]
fn best_effort_offer_fails_reliable_request() {
    let offer = with(Reliability::BestEffort, Durability::Volatile);
    let request = with(Reliability::Reliable, Durability::Volatile);

    let (verdict, reasons) = check_compatible(&offer, &request);
    assert_eq!(verdict, Compatibility::Incompatible);
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].policy, PolicyKind::Reliability);
    assert_eq!(reasons[0].severity, Severity::Error);
    assert_eq!(
        reasons[0].explanation,
        "offer is best-effort but request requires reliable"
    );
}

#[test]
fn transient_local_offer_serves_volatile_request() {
    let offer = with(Reliability::Reliable, Durability::TransientLocal);
    let request = with(Reliability::Reliable, Durability::Volatile);
    assert_eq!(check_compatible(&offer, &request).0, Compatibility::Compatible);
}

#[test]
fn idle_subscriptions_time_out_with_every_slot_cleared() {
    let ctx = context();
    let node = ctx.create_node("listener", "/").expect("node");
    let subs: Vec<_> = ["/a", "/b", "/c"]
        .iter()
        .map(|topic| {
            node.create_subscription(
                topic,
                STRING,
                &QosProfile::default(),
                SubscriptionOptions::default(),
            )
            .expect("subscription")
        })
        .collect();
    let mut ws = ctx.create_wait_set(3).expect("wait set");
    let mut handles: Vec<_> = subs
        .iter()
        .map(|s| Some(Waitable::Subscription(s)))
        .collect();

    let start = Instant::now();
    let res = ws.wait(&mut handles, Some(Duration::from_millis(100)));
    assert!(matches!(res, Err(Error::Timeout)));
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(handles.iter().all(Option::is_none));
}

#[test]
fn triggering_the_wait_set_guard_unblocks_an_infinite_wait() {
    let ctx = context();
    let node = ctx.create_node("listener", "/").expect("node");
    let subs: Vec<_> = ["/a", "/b", "/c"]
        .iter()
        .map(|topic| {
            node.create_subscription(
                topic,
                STRING,
                &QosProfile::default(),
                SubscriptionOptions::default(),
            )
            .expect("subscription")
        })
        .collect();
    let mut ws = ctx.create_wait_set(3).expect("wait set");
    let guard = ws.guard_condition();

    let mut idle: Vec<_> = subs
        .iter()
        .map(|s| Some(Waitable::Subscription(s)))
        .collect();
    assert!(matches!(
        ws.wait(&mut idle, Some(Duration::from_millis(10))),
        Err(Error::Timeout)
    ));

    let mut handles: Vec<_> = subs
        .iter()
        .map(|s| Some(Waitable::Subscription(s)))
        .collect();
    handles.push(Some(Waitable::GuardCondition(&*guard)));

    let trigger = {
        let guard = Arc::clone(&guard);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            guard.trigger().expect("trigger");
        })
    };

    let start = Instant::now();
    let n = ws.wait(&mut handles, None).expect("woken");
    assert_eq!(n, 1);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(handles[..3].iter().all(Option::is_none));
    assert!(handles[3].is_some());
    trigger.join().expect("trigger thread");
}

#[test]
fn best_available_freezes_at_creation() {
    let reliable = with(Reliability::Reliable, Durability::Volatile);
    let best_effort = with(Reliability::BestEffort, Durability::Volatile);
    let request = QosProfile {
        reliability: Reliability::BestAvailable,
        ..QosProfile::default()
    };

    let resolved = resolve(
        &request,
        EndpointRole::Subscription,
        &[reliable, best_effort],
        &QosProfile::default(),
    );
    assert_eq!(resolved.reliability, Reliability::BestEffort);

    let again = resolve(
        &resolved,
        EndpointRole::Subscription,
        &[reliable, best_effort, reliable],
        &QosProfile::default(),
    );
    assert_eq!(again, resolved);
}

#[test]
fn entity_qos_stays_frozen_when_new_peers_appear() {
    let ctx = context();
    let feed = ctx.discovery();
    for (seed, reliability) in [(1u8, Reliability::Reliable), (2, Reliability::BestEffort)] {
        let mut bytes = [0u8; RMW_GID_STORAGE_SIZE];
        bytes[0] = 0xEE;
        bytes[1] = seed;
        feed.announce_endpoint(RemoteEndpoint {
            gid: Gid::from_bytes(bytes),
            kind: EndpointKind::Publisher,
            name: "/scan".to_string(),
            type_name: STRING.to_string(),
            node_name: "lidar".to_string(),
            node_namespace: "/".to_string(),
            qos: with(reliability, Durability::Volatile),
        })
        .expect("announce publisher");
    }

    let node = ctx.create_node("listener", "/").expect("node");
    let sub = node
        .create_subscription(
            "/scan",
            STRING,
            &QosProfile {
                reliability: Reliability::BestAvailable,
                ..QosProfile::default()
            },
            SubscriptionOptions::default(),
        )
        .expect("subscription");
    assert_eq!(sub.actual_qos().reliability, Reliability::BestEffort);
    assert_eq!(sub.matched_count().expect("count"), 2);

    let _late = node
        .create_publisher("/scan", STRING, &with(Reliability::Reliable, Durability::Volatile))
        .expect("late publisher");
    assert_eq!(sub.actual_qos().reliability, Reliability::BestEffort);
    assert_eq!(sub.matched_count().expect("count"), 3);
}

#[test]
fn callbacks_run_off_the_publishing_thread() {
    let ctx = context();
    let node = ctx.create_node("n", "/").expect("node");
    let publisher = node
        .create_publisher("/t", STRING, &QosProfile::default())
        .expect("publisher");
    let sub = node
        .create_subscription("/t", STRING, &QosProfile::default(), SubscriptionOptions::default())
        .expect("subscription");

    let total = Arc::new(AtomicUsize::new(0));
    let on_publisher_thread = Arc::new(AtomicUsize::new(0));
    let me = thread::current().id();
    {
        let total = Arc::clone(&total);
        let on_publisher_thread = Arc::clone(&on_publisher_thread);
        sub.set_on_new_message_callback(Some(Arc::new(move |count: usize| {
            total.fetch_add(count, Ordering::SeqCst);
            if thread::current().id() == me {
                on_publisher_thread.fetch_add(1, Ordering::SeqCst);
            }
        })));
    }

    for _ in 0..5 {
        publisher.publish(b"x").expect("publish");
    }
    drop(sub);
    drop(publisher);
    drop(node);
    assert!(ctx.shutdown().is_clean());

    assert_eq!(total.load(Ordering::SeqCst), 5);
    assert_eq!(on_publisher_thread.load(Ordering::SeqCst), 0);
}
