// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical strings for QoS policy kinds and values.
//!
//! These are the lowercase, underscore-separated names used by ROS 2
//! tooling (`ros2 topic info --verbose`, parameter overrides, YAML files).
//! Sentinel values map to `system_default`, `unknown` and `best_available`.

use super::{Durability, History, Liveliness, PolicyKind, Reliability};

const SYSTEM_DEFAULT: &str = "system_default";
const UNKNOWN: &str = "unknown";
const BEST_AVAILABLE: &str = "best_available";

#[must_use]
pub fn policy_kind_to_str(kind: PolicyKind) -> &'static str {
    match kind {
        PolicyKind::Durability => "durability",
        PolicyKind::Deadline => "deadline",
        PolicyKind::Liveliness => "liveliness",
        PolicyKind::Reliability => "reliability",
        PolicyKind::History => "history",
        PolicyKind::Lifespan => "lifespan",
        PolicyKind::Depth => "depth",
        PolicyKind::LivelinessLeaseDuration => "liveliness_lease_duration",
        PolicyKind::AvoidRosNamespaceConventions => "avoid_ros_namespace_conventions",
    }
}

#[must_use]
pub fn policy_kind_from_str(s: &str) -> Option<PolicyKind> {
    Some(match s {
        "durability" => PolicyKind::Durability,
        "deadline" => PolicyKind::Deadline,
        "liveliness" => PolicyKind::Liveliness,
        "reliability" => PolicyKind::Reliability,
        "history" => PolicyKind::History,
        "lifespan" => PolicyKind::Lifespan,
        "depth" => PolicyKind::Depth,
        "liveliness_lease_duration" => PolicyKind::LivelinessLeaseDuration,
        "avoid_ros_namespace_conventions" => PolicyKind::AvoidRosNamespaceConventions,
        _ => return None,
    })
}

#[must_use]
pub fn history_to_str(value: History) -> &'static str {
    match value {
        History::SystemDefault => SYSTEM_DEFAULT,
        History::KeepLast => "keep_last",
        History::KeepAll => "keep_all",
        History::Unknown => UNKNOWN,
    }
}

#[must_use]
pub fn history_from_str(s: &str) -> Option<History> {
    Some(match s {
        SYSTEM_DEFAULT => History::SystemDefault,
        "keep_last" => History::KeepLast,
        "keep_all" => History::KeepAll,
        UNKNOWN => History::Unknown,
        _ => return None,
    })
}

#[must_use]
pub fn reliability_to_str(value: Reliability) -> &'static str {
    match value {
        Reliability::SystemDefault => SYSTEM_DEFAULT,
        Reliability::Reliable => "reliable",
        Reliability::BestEffort => "best_effort",
        Reliability::Unknown => UNKNOWN,
        Reliability::BestAvailable => BEST_AVAILABLE,
    }
}

#[must_use]
pub fn reliability_from_str(s: &str) -> Option<Reliability> {
    Some(match s {
        SYSTEM_DEFAULT => Reliability::SystemDefault,
        "reliable" => Reliability::Reliable,
        "best_effort" => Reliability::BestEffort,
        UNKNOWN => Reliability::Unknown,
        BEST_AVAILABLE => Reliability::BestAvailable,
        _ => return None,
    })
}

#[must_use]
pub fn durability_to_str(value: Durability) -> &'static str {
    match value {
        Durability::SystemDefault => SYSTEM_DEFAULT,
        Durability::TransientLocal => "transient_local",
        Durability::Volatile => "volatile",
        Durability::Unknown => UNKNOWN,
        Durability::BestAvailable => BEST_AVAILABLE,
    }
}

#[must_use]
pub fn durability_from_str(s: &str) -> Option<Durability> {
    Some(match s {
        SYSTEM_DEFAULT => Durability::SystemDefault,
        "transient_local" => Durability::TransientLocal,
        "volatile" => Durability::Volatile,
        UNKNOWN => Durability::Unknown,
        BEST_AVAILABLE => Durability::BestAvailable,
        _ => return None,
    })
}

#[must_use]
pub fn liveliness_to_str(value: Liveliness) -> &'static str {
    match value {
        Liveliness::SystemDefault => SYSTEM_DEFAULT,
        Liveliness::Automatic => "automatic",
        Liveliness::ManualByTopic => "manual_by_topic",
        Liveliness::Unknown => UNKNOWN,
        Liveliness::BestAvailable => BEST_AVAILABLE,
    }
}

#[must_use]
pub fn liveliness_from_str(s: &str) -> Option<Liveliness> {
    Some(match s {
        SYSTEM_DEFAULT => Liveliness::SystemDefault,
        "automatic" => Liveliness::Automatic,
        "manual_by_topic" => Liveliness::ManualByTopic,
        UNKNOWN => Liveliness::Unknown,
        BEST_AVAILABLE => Liveliness::BestAvailable,
        _ => return None,
    })
}
