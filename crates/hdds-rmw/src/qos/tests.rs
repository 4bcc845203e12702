// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;

#[test]
fn default_profile_matches_ros_defaults() {
    let qos = QosProfile::default();
    assert_eq!(qos.history, History::KeepLast);
    assert_eq!(qos.depth, 10);
    assert_eq!(qos.reliability, Reliability::Reliable);
    assert_eq!(qos.durability, Durability::Volatile);
    assert_eq!(qos.deadline, QosDuration::Unspecified);
    assert!(!qos.has_best_available());
    assert!(qos.validate().is_ok());
}

#[test]
fn presets_differ_where_expected() {
    assert_eq!(QosProfile::sensor_data().reliability, Reliability::BestEffort);
    assert_eq!(QosProfile::sensor_data().depth, 5);
    assert_eq!(QosProfile::parameters().depth, 1000);
    assert_eq!(QosProfile::parameter_events().depth, 1000);
    assert_eq!(QosProfile::services_default(), QosProfile::default());
    assert_eq!(
        QosProfile::system_default().reliability,
        Reliability::SystemDefault
    );
    assert_eq!(QosProfile::unknown().durability, Durability::Unknown);
}

#[test]
fn best_available_preset_is_unresolved() {
    let qos = QosProfile::best_available();
    assert!(qos.has_best_available());
    assert!(qos.validate().is_ok());
}

#[test]
fn keep_last_requires_depth() {
    let qos = QosProfile {
        depth: 0,
        ..QosProfile::default()
    };
    assert!(matches!(qos.validate(), Err(Error::InvalidArgument(_))));

    let keep_all = QosProfile {
        history: History::KeepAll,
        depth: 0,
        ..QosProfile::default()
    };
    assert!(keep_all.validate().is_ok());
}

#[test]
fn lifespan_cannot_be_best_available() {
    let qos = QosProfile {
        lifespan: QosDuration::BestAvailable,
        ..QosProfile::default()
    };
    assert!(qos.validate().is_err());
}

#[test]
fn zero_duration_is_unspecified() {
    assert_eq!(
        QosDuration::from_duration(Duration::ZERO),
        QosDuration::Unspecified
    );
    assert_eq!(
        QosDuration::from_millis(5).as_offer_bound(),
        Some(Duration::from_millis(5))
    );
    assert_eq!(QosDuration::Infinite.as_offer_bound(), None);
    assert_eq!(QosDuration::Unspecified.as_request_bound(), None);
}

#[test]
fn queue_capacity_follows_history() {
    assert_eq!(QosProfile::default().queue_capacity(), Some(10));
    assert_eq!(QosProfile::sensor_data().queue_capacity(), Some(5));
    assert_eq!(QosProfile::system_default().queue_capacity(), Some(10));
    let keep_all = QosProfile {
        history: History::KeepAll,
        ..QosProfile::default()
    };
    assert_eq!(keep_all.queue_capacity(), None);
}

#[test]
fn sentinels_are_undetermined() {
    assert!(Reliability::SystemDefault.is_undetermined());
    assert!(Reliability::BestAvailable.is_undetermined());
    assert!(!Reliability::BestEffort.is_undetermined());
    assert!(Durability::Unknown.is_undetermined());
    assert!(!Durability::TransientLocal.is_undetermined());
    assert!(Liveliness::SystemDefault.is_undetermined());
    assert!(!Liveliness::ManualByTopic.is_undetermined());
}
