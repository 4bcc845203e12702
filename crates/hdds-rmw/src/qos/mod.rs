// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS model for the ROS 2 middleware layer.
//!
//! A [`QosProfile`] is the set of negotiable delivery policies attached to a
//! publisher, subscription, service or client. Policy enums carry three kinds
//! of sentinel besides their concrete values:
//!
//! - `SystemDefault` - unspecified, the backend picks;
//! - `Unknown` - reported by introspection when a peer value cannot be
//!   represented;
//! - `BestAvailable` - resolved once, at entity creation, against the peers
//!   known at that moment (see [`resolve`]).
//!
//! History and depth only affect local buffering and never take part in
//! compatibility checks.
//!
//! The deprecated "manual by node" liveliness mode is intentionally absent.

/// Offer/request compatibility verdicts.
pub mod compat;
/// YAML profile loader.
#[cfg(feature = "qos-loaders")]
pub mod loader;
/// String conversions for policy kinds and values.
pub mod names;
/// Best-available resolution against discovered peers.
pub mod resolve;

pub use compat::{check_compatible, Compatibility, PolicyKind, Reason, Severity};
pub use resolve::{resolve, resolve_for, EndpointRole};

use crate::error::{Error, Result};
use std::time::Duration;

/// HISTORY policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum History {
    #[default]
    SystemDefault,
    /// Keep the most recent `depth` samples.
    KeepLast,
    /// Keep everything, up to resource limits.
    KeepAll,
    Unknown,
}

/// RELIABILITY policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    #[default]
    SystemDefault,
    Reliable,
    BestEffort,
    Unknown,
    BestAvailable,
}

/// DURABILITY policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    #[default]
    SystemDefault,
    TransientLocal,
    Volatile,
    Unknown,
    BestAvailable,
}

/// LIVELINESS policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Liveliness {
    #[default]
    SystemDefault,
    Automatic,
    ManualByTopic,
    Unknown,
    BestAvailable,
}

impl Reliability {
    /// `true` when the value says nothing about actual delivery.
    #[must_use]
    pub fn is_undetermined(self) -> bool {
        matches!(self, Self::SystemDefault | Self::Unknown | Self::BestAvailable)
    }
}

impl Durability {
    #[must_use]
    pub fn is_undetermined(self) -> bool {
        matches!(self, Self::SystemDefault | Self::Unknown | Self::BestAvailable)
    }
}

impl Liveliness {
    #[must_use]
    pub fn is_undetermined(self) -> bool {
        matches!(self, Self::SystemDefault | Self::Unknown | Self::BestAvailable)
    }
}

/// Duration-valued policy (deadline, lifespan, liveliness lease).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QosDuration {
    /// No value set; the backend default applies.
    #[default]
    Unspecified,
    /// Explicitly unbounded.
    Infinite,
    /// Resolved at creation time against known peers.
    BestAvailable,
    Finite(Duration),
}

impl QosDuration {
    /// Build from a duration; zero maps to `Unspecified`.
    #[must_use]
    pub fn from_duration(value: Duration) -> Self {
        if value.is_zero() {
            Self::Unspecified
        } else {
            Self::Finite(value)
        }
    }

    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::from_duration(Duration::from_millis(ms))
    }

    /// Upper bound promised by an offering side. `None` means unbounded:
    /// an unspecified offer promises nothing.
    #[must_use]
    pub fn as_offer_bound(self) -> Option<Duration> {
        match self {
            Self::Finite(d) => Some(d),
            Self::Unspecified | Self::Infinite | Self::BestAvailable => None,
        }
    }

    /// Bound demanded by a requesting side. `None` means no requirement.
    #[must_use]
    pub fn as_request_bound(self) -> Option<Duration> {
        self.as_offer_bound()
    }

    #[must_use]
    pub fn is_best_available(self) -> bool {
        matches!(self, Self::BestAvailable)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

/// Default queue depth for keep-last history when none is set.
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Depth value meaning "not set".
pub const DEPTH_SYSTEM_DEFAULT: usize = 0;

/// Complete QoS profile of a single endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosProfile {
    pub history: History,
    /// Queue depth, only meaningful with [`History::KeepLast`].
    pub depth: usize,
    pub reliability: Reliability,
    pub durability: Durability,
    pub deadline: QosDuration,
    pub lifespan: QosDuration,
    pub liveliness: Liveliness,
    pub liveliness_lease: QosDuration,
    /// Ignore ROS namespace conventions when mapping names.
    pub avoid_ros_namespace_conventions: bool,
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::default_profile()
    }
}

impl QosProfile {
    /// General purpose profile: keep-last 10, reliable, volatile.
    #[must_use]
    pub const fn default_profile() -> Self {
        Self {
            history: History::KeepLast,
            depth: DEFAULT_HISTORY_DEPTH,
            reliability: Reliability::Reliable,
            durability: Durability::Volatile,
            deadline: QosDuration::Unspecified,
            lifespan: QosDuration::Unspecified,
            liveliness: Liveliness::SystemDefault,
            liveliness_lease: QosDuration::Unspecified,
            avoid_ros_namespace_conventions: false,
        }
    }

    /// Sensor streams: keep-last 5, best effort.
    #[must_use]
    pub const fn sensor_data() -> Self {
        Self {
            depth: 5,
            reliability: Reliability::BestEffort,
            ..Self::default_profile()
        }
    }

    #[must_use]
    pub const fn parameters() -> Self {
        Self {
            depth: 1000,
            ..Self::default_profile()
        }
    }

    #[must_use]
    pub const fn services_default() -> Self {
        Self::default_profile()
    }

    #[must_use]
    pub const fn parameter_events() -> Self {
        Self {
            depth: 1000,
            ..Self::default_profile()
        }
    }

    /// Every policy left to the backend.
    #[must_use]
    pub const fn system_default() -> Self {
        Self {
            history: History::SystemDefault,
            depth: DEPTH_SYSTEM_DEFAULT,
            reliability: Reliability::SystemDefault,
            durability: Durability::SystemDefault,
            deadline: QosDuration::Unspecified,
            lifespan: QosDuration::Unspecified,
            liveliness: Liveliness::SystemDefault,
            liveliness_lease: QosDuration::Unspecified,
            avoid_ros_namespace_conventions: false,
        }
    }

    /// Match the majority of peers while staying as strict as possible.
    #[must_use]
    pub const fn best_available() -> Self {
        Self {
            history: History::KeepLast,
            depth: DEFAULT_HISTORY_DEPTH,
            reliability: Reliability::BestAvailable,
            durability: Durability::BestAvailable,
            deadline: QosDuration::BestAvailable,
            lifespan: QosDuration::Unspecified,
            liveliness: Liveliness::BestAvailable,
            liveliness_lease: QosDuration::BestAvailable,
            avoid_ros_namespace_conventions: false,
        }
    }

    /// Placeholder reported for peers whose QoS could not be read.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            history: History::Unknown,
            depth: DEPTH_SYSTEM_DEFAULT,
            reliability: Reliability::Unknown,
            durability: Durability::Unknown,
            deadline: QosDuration::Unspecified,
            lifespan: QosDuration::Unspecified,
            liveliness: Liveliness::Unknown,
            liveliness_lease: QosDuration::Unspecified,
            avoid_ros_namespace_conventions: false,
        }
    }

    /// `true` while any field still holds the best-available sentinel.
    #[must_use]
    pub fn has_best_available(&self) -> bool {
        self.reliability == Reliability::BestAvailable
            || self.durability == Durability::BestAvailable
            || self.liveliness == Liveliness::BestAvailable
            || self.deadline.is_best_available()
            || self.liveliness_lease.is_best_available()
            || self.lifespan.is_best_available()
    }

    /// Reject malformed profiles before anything is created.
    pub fn validate(&self) -> Result<()> {
        if self.history == History::KeepLast && self.depth == DEPTH_SYSTEM_DEFAULT {
            return Err(Error::invalid("keep-last history requires depth > 0"));
        }
        if self.lifespan.is_best_available() {
            return Err(Error::invalid("lifespan does not support best-available"));
        }
        Ok(())
    }

    /// Queue capacity implied by history/depth. `None` is unbounded.
    #[must_use]
    pub fn queue_capacity(&self) -> Option<usize> {
        match self.history {
            History::KeepLast => Some(self.depth.max(1)),
            History::KeepAll => None,
            History::SystemDefault | History::Unknown => Some(if self.depth == 0 {
                DEFAULT_HISTORY_DEPTH
            } else {
                self.depth
            }),
        }
    }
}

#[cfg(test)]
mod tests;
