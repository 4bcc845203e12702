// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Best-available resolution.
//!
//! A best-available field is replaced by the strictest concrete value that
//! stays compatible with every peer known when the entity is created. The
//! result is frozen: a resolved profile holds no sentinel, so resolving it
//! again is a no-op whatever the peer set looks like by then.
//!
//! Liveliness kinds must match exactly, so peers mixing `Automatic` and
//! `ManualByTopic` leave no kind that suits all of them. The kind held by
//! most of those peers wins (`Automatic` on a tie) and the conflict is
//! logged; the minority stays incompatible.

use super::{Durability, Liveliness, QosDuration, QosProfile, Reliability};
use crate::backend::Backend;
use std::time::Duration;

/// Side of the match being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    /// Offering side; peers are subscriptions.
    Publisher,
    /// Requesting side; peers are publishers.
    Subscription,
}

/// Resolve every best-available field of `profile` against `peers`.
///
/// With no peers the corresponding `fallback` field is used. Fields that
/// are not best-available are returned untouched.
#[must_use]
pub fn resolve(
    profile: &QosProfile,
    role: EndpointRole,
    peers: &[QosProfile],
    fallback: &QosProfile,
) -> QosProfile {
    let mut out = *profile;
    if !profile.has_best_available() {
        return out;
    }

    if out.reliability == Reliability::BestAvailable {
        out.reliability = if peers.is_empty() {
            fallback.reliability
        } else {
            match role {
                // Reliable serves both reliable and best-effort requests.
                EndpointRole::Publisher => Reliability::Reliable,
                EndpointRole::Subscription => {
                    if peers.iter().all(|p| p.reliability == Reliability::Reliable) {
                        Reliability::Reliable
                    } else {
                        Reliability::BestEffort
                    }
                }
            }
        };
    }

    if out.durability == Durability::BestAvailable {
        out.durability = if peers.is_empty() {
            fallback.durability
        } else {
            match role {
                EndpointRole::Publisher => Durability::TransientLocal,
                EndpointRole::Subscription => {
                    if peers
                        .iter()
                        .all(|p| p.durability == Durability::TransientLocal)
                    {
                        Durability::TransientLocal
                    } else {
                        Durability::Volatile
                    }
                }
            }
        };
    }

    if out.liveliness == Liveliness::BestAvailable {
        out.liveliness = if peers.is_empty() {
            fallback.liveliness
        } else {
            resolve_liveliness(role, peers)
        };
    }

    if out.deadline.is_best_available() {
        out.deadline = resolve_bound(role, peers.iter().map(|p| p.deadline), fallback.deadline);
    }
    if out.liveliness_lease.is_best_available() {
        out.liveliness_lease = resolve_bound(
            role,
            peers.iter().map(|p| p.liveliness_lease),
            fallback.liveliness_lease,
        );
    }
    if out.lifespan.is_best_available() {
        out.lifespan = fallback.lifespan;
    }

    log::debug!(
        "[rmw-qos] resolved best-available as {:?} against {} peer(s)",
        role,
        peers.len()
    );
    out
}

/// Resolve with backend `B`'s fallback profile.
#[must_use]
pub fn resolve_for<B: Backend>(
    profile: &QosProfile,
    role: EndpointRole,
    peers: &[QosProfile],
) -> QosProfile {
    resolve(profile, role, peers, &B::fallback_profile())
}

fn resolve_liveliness(role: EndpointRole, peers: &[QosProfile]) -> Liveliness {
    let count = |kind: Liveliness| peers.iter().filter(|p| p.liveliness == kind).count();
    let manual = count(Liveliness::ManualByTopic);
    let automatic = count(Liveliness::Automatic);

    if manual > 0 && automatic > 0 {
        let pick = if manual > automatic {
            Liveliness::ManualByTopic
        } else {
            Liveliness::Automatic
        };
        log::warn!(
            "[rmw-qos] peers mix automatic ({}) and manual-by-topic ({}) liveliness, resolved {:?}",
            automatic,
            manual,
            pick
        );
        return pick;
    }

    let pick_manual = match role {
        EndpointRole::Publisher => manual > 0,
        EndpointRole::Subscription => manual == peers.len(),
    };
    if pick_manual {
        Liveliness::ManualByTopic
    } else {
        Liveliness::Automatic
    }
}

/// Publishers promise the tightest bound any subscription asks for.
/// Subscriptions ask for the loosest bound any publisher promises; an
/// unbounded publisher leaves nothing to ask for.
fn resolve_bound(
    role: EndpointRole,
    peers: impl Iterator<Item = QosDuration>,
    fallback: QosDuration,
) -> QosDuration {
    let mut seen = false;
    let mut unbounded = false;
    let mut acc: Option<Duration> = None;

    for value in peers {
        seen = true;
        match value.as_offer_bound() {
            Some(d) => {
                acc = Some(match (role, acc) {
                    (_, None) => d,
                    (EndpointRole::Publisher, Some(cur)) => cur.min(d),
                    (EndpointRole::Subscription, Some(cur)) => cur.max(d),
                });
            }
            None => unbounded = true,
        }
    }

    if !seen {
        return concrete(fallback);
    }
    match role {
        EndpointRole::Publisher => acc.map_or(QosDuration::Unspecified, QosDuration::Finite),
        EndpointRole::Subscription if unbounded => QosDuration::Unspecified,
        EndpointRole::Subscription => acc.map_or(QosDuration::Unspecified, QosDuration::Finite),
    }
}

fn concrete(value: QosDuration) -> QosDuration {
    if value.is_best_available() {
        QosDuration::Unspecified
    } else {
        value
    }
}
