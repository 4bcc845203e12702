// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS compatibility checking (offered vs requested).
//!
//! | Policy      | Incompatible when                                    |
//! |-------------|------------------------------------------------------|
//! | Reliability | offer best-effort, request reliable                  |
//! | Durability  | offer volatile, request transient-local              |
//! | Deadline    | offer bound > request bound (unset offer = infinite) |
//! | Liveliness  | concrete kinds differ                                |
//! | Lease       | offer lease > request lease                          |
//!
//! History, depth and lifespan are local buffering concerns and never show
//! up in a verdict. Undetermined values (system default, unknown,
//! best-available) downgrade the verdict to a warning when they could hide an
//! incompatibility. Errors always precede warnings in the reason list.

use super::{Durability, Liveliness, QosDuration, QosProfile, Reliability};
use std::fmt;
use std::time::Duration;

/// Overall verdict of a compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// Compatible as far as can be told; some values were undetermined.
    Warning,
    Incompatible,
}

/// QoS policy identifiers used in reasons and incompatibility events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Durability,
    Deadline,
    Liveliness,
    Reliability,
    History,
    Lifespan,
    Depth,
    LivelinessLeaseDuration,
    AvoidRosNamespaceConventions,
}

/// Whether a reason breaks the match or only flags uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One entry of a compatibility report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    pub policy: PolicyKind,
    pub severity: Severity,
    pub explanation: String,
}

impl Reason {
    fn error(policy: PolicyKind, explanation: String) -> Self {
        Self {
            policy,
            severity: Severity::Error,
            explanation,
        }
    }

    fn warning(policy: PolicyKind, explanation: String) -> Self {
        Self {
            policy,
            severity: Severity::Warning,
            explanation,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        write!(
            f,
            "{}: {}: {}",
            tag,
            super::names::policy_kind_to_str(self.policy),
            self.explanation
        )
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<Reason>,
    warnings: Vec<Reason>,
}

/// Check whether `offer` (publisher side) can serve `request`.
///
/// Pure function. A single error forces [`Compatibility::Incompatible`].
#[must_use]
pub fn check_compatible(
    offer: &QosProfile,
    request: &QosProfile,
) -> (Compatibility, Vec<Reason>) {
    let mut findings = Findings::default();

    check_reliability(offer.reliability, request.reliability, &mut findings);
    check_durability(offer.durability, request.durability, &mut findings);
    check_bound(
        PolicyKind::Deadline,
        offer.deadline,
        request.deadline,
        &mut findings,
    );
    check_liveliness(offer.liveliness, request.liveliness, &mut findings);
    check_bound(
        PolicyKind::LivelinessLeaseDuration,
        offer.liveliness_lease,
        request.liveliness_lease,
        &mut findings,
    );

    let verdict = if !findings.errors.is_empty() {
        Compatibility::Incompatible
    } else if !findings.warnings.is_empty() {
        Compatibility::Warning
    } else {
        Compatibility::Compatible
    };

    let mut reasons = findings.errors;
    reasons.extend(findings.warnings);

    if verdict != Compatibility::Compatible {
        log::debug!("[rmw-qos] verdict {:?}: {:?}", verdict, reasons);
    }

    (verdict, reasons)
}

fn check_reliability(offer: Reliability, request: Reliability, out: &mut Findings) {
    // Best effort is the weakest requirement: anything satisfies it.
    if request == Reliability::BestEffort {
        return;
    }
    if offer == Reliability::BestEffort && request == Reliability::Reliable {
        out.errors.push(Reason::error(
            PolicyKind::Reliability,
            "offer is best-effort but request requires reliable".to_string(),
        ));
        return;
    }
    if offer.is_undetermined() || request.is_undetermined() {
        out.warnings.push(Reason::warning(
            PolicyKind::Reliability,
            format!(
                "cannot determine compatibility: offer is {} and request is {}",
                reliability_label(offer),
                reliability_label(request)
            ),
        ));
    }
}

fn check_durability(offer: Durability, request: Durability, out: &mut Findings) {
    // Volatile is satisfied by every offer.
    if request == Durability::Volatile {
        return;
    }
    if offer == Durability::Volatile && request == Durability::TransientLocal {
        out.errors.push(Reason::error(
            PolicyKind::Durability,
            "offer is volatile but request requires transient-local".to_string(),
        ));
        return;
    }
    if offer.is_undetermined() || request.is_undetermined() {
        out.warnings.push(Reason::warning(
            PolicyKind::Durability,
            format!(
                "cannot determine compatibility: offer is {} and request is {}",
                durability_label(offer),
                durability_label(request)
            ),
        ));
    }
}

fn check_liveliness(offer: Liveliness, request: Liveliness, out: &mut Findings) {
    match (offer.is_undetermined(), request.is_undetermined()) {
        (false, false) => {
            if offer != request {
                out.errors.push(Reason::error(
                    PolicyKind::Liveliness,
                    format!(
                        "offer liveliness is {} but request requires {}",
                        liveliness_label(offer),
                        liveliness_label(request)
                    ),
                ));
            }
        }
        (true, false) | (false, true) => {
            // Only a manual-by-topic side can clash with an undetermined
            // peer; both defaults resolve to automatic.
            if offer == Liveliness::ManualByTopic || request == Liveliness::ManualByTopic {
                out.warnings.push(Reason::warning(
                    PolicyKind::Liveliness,
                    format!(
                        "cannot determine compatibility: offer is {} and request is {}",
                        liveliness_label(offer),
                        liveliness_label(request)
                    ),
                ));
            }
        }
        (true, true) => {}
    }
}

fn check_bound(policy: PolicyKind, offer: QosDuration, request: QosDuration, out: &mut Findings) {
    if offer.is_best_available() || request.is_best_available() {
        out.warnings.push(Reason::warning(
            policy,
            format!(
                "cannot determine compatibility: offer is {} and request is {}",
                duration_label(offer),
                duration_label(request)
            ),
        ));
        return;
    }

    match (offer.as_offer_bound(), request.as_request_bound()) {
        (_, None) => {
            // No requirement. Flag mixed sentinels so callers notice that
            // one side left the value to the backend.
            if !offer.is_finite() && offer != request {
                out.warnings.push(Reason::warning(
                    policy,
                    format!(
                        "offer is {} and request is {}",
                        duration_label(offer),
                        duration_label(request)
                    ),
                ));
            }
        }
        (None, Some(requested)) => out.errors.push(Reason::error(
            policy,
            format!(
                "request requires {} but offer has no bound",
                format_duration(requested)
            ),
        )),
        (Some(offered), Some(requested)) => {
            if offered > requested {
                out.errors.push(Reason::error(
                    policy,
                    format!(
                        "offer {} exceeds request {}",
                        format_duration(offered),
                        format_duration(requested)
                    ),
                ));
            }
        }
    }
}

fn reliability_label(value: Reliability) -> &'static str {
    match value {
        Reliability::SystemDefault => "system-default",
        Reliability::Reliable => "reliable",
        Reliability::BestEffort => "best-effort",
        Reliability::Unknown => "unknown",
        Reliability::BestAvailable => "best-available",
    }
}

fn durability_label(value: Durability) -> &'static str {
    match value {
        Durability::SystemDefault => "system-default",
        Durability::TransientLocal => "transient-local",
        Durability::Volatile => "volatile",
        Durability::Unknown => "unknown",
        Durability::BestAvailable => "best-available",
    }
}

fn liveliness_label(value: Liveliness) -> &'static str {
    match value {
        Liveliness::SystemDefault => "system-default",
        Liveliness::Automatic => "automatic",
        Liveliness::ManualByTopic => "manual-by-topic",
        Liveliness::Unknown => "unknown",
        Liveliness::BestAvailable => "best-available",
    }
}

fn duration_label(value: QosDuration) -> String {
    match value {
        QosDuration::Unspecified => "unspecified".to_string(),
        QosDuration::Infinite => "infinite".to_string(),
        QosDuration::BestAvailable => "best-available".to_string(),
        QosDuration::Finite(d) => format_duration(d),
    }
}

fn format_duration(value: Duration) -> String {
    format!("{}ms", value.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::{History, QosProfile};

    fn profile(reliability: Reliability, durability: Durability) -> QosProfile {
        QosProfile {
            reliability,
            durability,
            ..QosProfile::default()
        }
    }

    #[test]
    fn reliable_offer_serves_best_effort_request() {
        let offer = profile(Reliability::Reliable, Durability::Volatile);
        let request = profile(Reliability::BestEffort, Durability::Volatile);

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Compatible);
        assert!(reasons.is_empty());
    }

    #[test]
    fn best_effort_offer_fails_reliable_request() {
        let offer = profile(Reliability::BestEffort, Durability::Volatile);
        let request = profile(Reliability::Reliable, Durability::Volatile);

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Incompatible);
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].policy, PolicyKind::Reliability);
        assert_eq!(
            reasons[0].explanation,
            "offer is best-effort but request requires reliable"
        );
    }

    #[test]
    fn reliable_request_against_best_effort_is_always_one_reliability_error() {
        let durabilities = [
            Durability::SystemDefault,
            Durability::TransientLocal,
            Durability::Volatile,
            Durability::Unknown,
        ];
        let livelinesses = [
            Liveliness::SystemDefault,
            Liveliness::Automatic,
            Liveliness::ManualByTopic,
        ];
        let mut rng = fastrand::Rng::with_seed(0x5eed);

        for _ in 0..256 {
            let offer = QosProfile {
                reliability: Reliability::BestEffort,
                durability: durabilities[rng.usize(..durabilities.len())],
                liveliness: livelinesses[rng.usize(..livelinesses.len())],
                deadline: QosDuration::from_millis(rng.u64(0..500)),
                ..QosProfile::default()
            };
            let request = QosProfile {
                reliability: Reliability::Reliable,
                durability: durabilities[rng.usize(..durabilities.len())],
                liveliness: livelinesses[rng.usize(..livelinesses.len())],
                deadline: QosDuration::from_millis(rng.u64(0..500)),
                ..QosProfile::default()
            };

            let (verdict, reasons) = check_compatible(&offer, &request);
            assert_eq!(verdict, Compatibility::Incompatible);
            let reliability_entries = reasons
                .iter()
                .filter(|reason| reason.policy == PolicyKind::Reliability)
                .count();
            assert_eq!(reliability_entries, 1, "reasons: {:?}", reasons);
        }
    }

    #[test]
    fn transient_local_offer_serves_volatile_request() {
        for reliability in [Reliability::Reliable, Reliability::BestEffort] {
            let offer = profile(Reliability::Reliable, Durability::TransientLocal);
            let request = profile(reliability, Durability::Volatile);
            let (verdict, _) = check_compatible(&offer, &request);
            assert_eq!(verdict, Compatibility::Compatible);
        }
    }

    #[test]
    fn volatile_offer_fails_transient_local_request() {
        let offer = profile(Reliability::Reliable, Durability::Volatile);
        let request = profile(Reliability::Reliable, Durability::TransientLocal);

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Incompatible);
        assert_eq!(reasons[0].policy, PolicyKind::Durability);
    }

    #[test]
    fn undetermined_reliability_is_a_warning() {
        let offer = profile(Reliability::SystemDefault, Durability::Volatile);
        let request = profile(Reliability::Reliable, Durability::Volatile);

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Warning);
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].severity, Severity::Warning);
        assert_eq!(reasons[0].policy, PolicyKind::Reliability);
    }

    #[test]
    fn undetermined_durability_is_a_warning() {
        let offer = profile(Reliability::Reliable, Durability::Unknown);
        let request = profile(Reliability::Reliable, Durability::TransientLocal);

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Warning);
        assert_eq!(reasons[0].policy, PolicyKind::Durability);
    }

    #[test]
    fn errors_precede_warnings() {
        let offer = QosProfile {
            reliability: Reliability::Unknown,
            durability: Durability::Volatile,
            ..QosProfile::default()
        };
        let request = QosProfile {
            reliability: Reliability::Reliable,
            durability: Durability::TransientLocal,
            ..QosProfile::default()
        };

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Incompatible);
        assert_eq!(reasons.len(), 2);
        assert_eq!(reasons[0].severity, Severity::Error);
        assert_eq!(reasons[0].policy, PolicyKind::Durability);
        assert_eq!(reasons[1].severity, Severity::Warning);
        assert_eq!(reasons[1].policy, PolicyKind::Reliability);
    }

    #[test]
    fn deadline_offer_must_not_exceed_request() {
        let fast = QosProfile {
            deadline: QosDuration::from_millis(100),
            ..QosProfile::default()
        };
        let slow = QosProfile {
            deadline: QosDuration::from_millis(200),
            ..QosProfile::default()
        };

        assert_eq!(check_compatible(&fast, &slow).0, Compatibility::Compatible);

        let (verdict, reasons) = check_compatible(&slow, &fast);
        assert_eq!(verdict, Compatibility::Incompatible);
        assert_eq!(reasons[0].policy, PolicyKind::Deadline);
    }

    #[test]
    fn unspecified_offer_deadline_counts_as_infinite() {
        let offer = QosProfile::default();
        let request = QosProfile {
            deadline: QosDuration::from_millis(50),
            ..QosProfile::default()
        };

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Incompatible);
        assert_eq!(reasons[0].policy, PolicyKind::Deadline);

        // Unspecified request: no requirement at all.
        let (verdict, _) = check_compatible(&request, &offer);
        assert_eq!(verdict, Compatibility::Compatible);
    }

    #[test]
    fn mixed_deadline_sentinels_warn() {
        let offer = QosProfile::default();
        let request = QosProfile {
            deadline: QosDuration::Infinite,
            ..QosProfile::default()
        };

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Warning);
        assert_eq!(reasons[0].policy, PolicyKind::Deadline);

        let (verdict, _) = check_compatible(&offer, &QosProfile::default());
        assert_eq!(verdict, Compatibility::Compatible);
    }

    #[test]
    fn liveliness_kind_must_match() {
        let automatic = QosProfile {
            liveliness: Liveliness::Automatic,
            ..QosProfile::default()
        };
        let manual = QosProfile {
            liveliness: Liveliness::ManualByTopic,
            ..QosProfile::default()
        };

        assert_eq!(
            check_compatible(&automatic, &manual).0,
            Compatibility::Incompatible
        );
        assert_eq!(
            check_compatible(&manual, &automatic).0,
            Compatibility::Incompatible
        );
        assert_eq!(
            check_compatible(&manual, &manual).0,
            Compatibility::Compatible
        );
    }

    #[test]
    fn liveliness_lease_mirrors_deadline() {
        let offer = QosProfile {
            liveliness: Liveliness::Automatic,
            liveliness_lease: QosDuration::from_millis(5_000),
            ..QosProfile::default()
        };
        let request = QosProfile {
            liveliness: Liveliness::Automatic,
            liveliness_lease: QosDuration::from_millis(1_000),
            ..QosProfile::default()
        };

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Incompatible);
        assert_eq!(reasons[0].policy, PolicyKind::LivelinessLeaseDuration);
        assert_eq!(
            check_compatible(&request, &offer).0,
            Compatibility::Compatible
        );
    }

    #[test]
    fn history_and_depth_never_matter() {
        let offer = QosProfile {
            history: History::KeepLast,
            depth: 1,
            ..QosProfile::default()
        };
        let request = QosProfile {
            history: History::KeepAll,
            depth: 0,
            ..QosProfile::default()
        };

        let (verdict, reasons) = check_compatible(&offer, &request);
        assert_eq!(verdict, Compatibility::Compatible);
        assert!(reasons.is_empty());
    }

    #[test]
    fn reason_display_is_tagged() {
        let offer = profile(Reliability::BestEffort, Durability::Volatile);
        let request = profile(Reliability::Reliable, Durability::Volatile);
        let (_, reasons) = check_compatible(&offer, &request);
        assert_eq!(
            reasons[0].to_string(),
            "ERROR: reliability: offer is best-effort but request requires reliable"
        );
    }
}
