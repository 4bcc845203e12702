// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery graph.
//!
//! One [`GraphCache`] per context records every known node and endpoint,
//! local or remote, plus the match set of each local endpoint. Mutations
//! are serialized behind a write lock; every effective change bumps the
//! version and triggers the graph guard condition, which carries no payload.
//! Callers re-query to learn what changed.

mod gid;

pub use gid::{Gid, RMW_GID_STORAGE_SIZE};
pub(crate) use gid::GidAllocator;

use crate::condition::GuardCondition;
use crate::entity::core::EndpointCore;
use crate::error::{Error, Result};
use crate::qos::{check_compatible, Compatibility, PolicyKind, QosProfile};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Topic or service name mapped to the set of type names seen for it.
pub type NamesAndTypes = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Publisher,
    Subscription,
    Service,
    Client,
}

impl EndpointKind {
    fn is_topic(self) -> bool {
        matches!(self, Self::Publisher | Self::Subscription)
    }

    /// The kind this one matches against.
    #[must_use]
    pub fn counterpart(self) -> Self {
        match self {
            Self::Publisher => Self::Subscription,
            Self::Subscription => Self::Publisher,
            Self::Service => Self::Client,
            Self::Client => Self::Service,
        }
    }
}

/// Endpoint description returned by `*_info_by_topic` queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEndpointInfo {
    pub node_name: String,
    pub node_namespace: String,
    pub topic_type: String,
    pub endpoint_type: EndpointKind,
    pub gid: Gid,
    pub qos: QosProfile,
}

/// Endpoint reported by a transport's discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEndpoint {
    pub gid: Gid,
    pub kind: EndpointKind,
    /// Topic or service name.
    pub name: String,
    pub type_name: String,
    pub node_name: String,
    pub node_namespace: String,
    /// Must be concrete: no best-available field.
    pub qos: QosProfile,
}

/// Node entry as listed by [`GraphCache::node_names_with_enclaves`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeInfo {
    pub name: String,
    pub namespace: String,
    pub enclave: String,
}

pub(crate) struct NewEndpoint {
    pub gid: Gid,
    pub kind: EndpointKind,
    pub name: String,
    pub type_name: String,
    pub node_name: String,
    pub node_namespace: String,
    pub qos: QosProfile,
    pub local: Option<Arc<EndpointCore>>,
}

struct EndpointRecord {
    kind: EndpointKind,
    name: String,
    type_name: String,
    node_name: String,
    node_namespace: String,
    qos: QosProfile,
    local: Option<Arc<EndpointCore>>,
    matches: HashSet<Gid>,
}

impl EndpointRecord {
    fn info(&self, gid: Gid) -> TopicEndpointInfo {
        TopicEndpointInfo {
            node_name: self.node_name.clone(),
            node_namespace: self.node_namespace.clone(),
            topic_type: self.type_name.clone(),
            endpoint_type: self.kind,
            gid,
            qos: self.qos,
        }
    }
}

enum Notice {
    Matched(Arc<EndpointCore>, bool),
    IncompatibleQos(Arc<EndpointCore>, PolicyKind),
    IncompatibleType(Arc<EndpointCore>),
}

impl Notice {
    fn fire(self) {
        match self {
            Notice::Matched(core, matched) => core.record_match(matched),
            Notice::IncompatibleQos(core, policy) => core.record_incompatible_qos(policy),
            Notice::IncompatibleType(core) => core.record_incompatible_type(),
        }
    }
}

#[derive(Default)]
struct GraphState {
    version: u64,
    nodes: HashMap<Gid, NodeInfo>,
    endpoints: HashMap<Gid, EndpointRecord>,
}

/// Process-local view of nodes, endpoints and matches.
pub struct GraphCache {
    state: RwLock<GraphState>,
    /// Local endpoints by gid, read on the request/response path without
    /// touching the graph lock. Written under the write lock only.
    locals: DashMap<Gid, Arc<EndpointCore>>,
    guard: Arc<GuardCondition>,
}

impl GraphCache {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            locals: DashMap::new(),
            guard: Arc::new(GuardCondition::new()),
        }
    }

    /// Triggered on every graph change.
    #[must_use]
    pub fn guard_condition(&self) -> &Arc<GuardCondition> {
        &self.guard
    }

    /// Monotonic change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    fn changed(&self, notices: Vec<Notice>) {
        for notice in notices {
            notice.fire();
        }
        // Triggering never fails.
        let _ = self.guard.trigger();
    }

    pub(crate) fn add_node(&self, gid: Gid, info: NodeInfo) -> bool {
        {
            let mut state = self.state.write();
            if state.nodes.get(&gid) == Some(&info) {
                return false;
            }
            log::debug!(
                "[rmw-graph] node {}{} joined ({})",
                info.namespace,
                info.name,
                gid
            );
            state.nodes.insert(gid, info);
            state.version += 1;
        }
        self.changed(Vec::new());
        true
    }

    pub(crate) fn remove_node(&self, gid: Gid) -> bool {
        {
            let mut state = self.state.write();
            if state.nodes.remove(&gid).is_none() {
                return false;
            }
            state.version += 1;
        }
        log::debug!("[rmw-graph] node {} left", gid);
        self.changed(Vec::new());
        true
    }

    /// Insert an endpoint and compute its matches.
    pub(crate) fn add_endpoint(&self, new: NewEndpoint) -> Result<()> {
        let mut notices = Vec::new();
        {
            let mut state = self.state.write();
            if state.endpoints.contains_key(&new.gid) {
                return Err(Error::invalid(format!("duplicate endpoint gid {}", new.gid)));
            }

            let mut record = EndpointRecord {
                kind: new.kind,
                name: new.name,
                type_name: new.type_name,
                node_name: new.node_name,
                node_namespace: new.node_namespace,
                qos: new.qos,
                local: new.local,
                matches: HashSet::new(),
            };

            for (other_gid, other) in state.endpoints.iter_mut() {
                if other.kind != record.kind.counterpart() || other.name != record.name {
                    continue;
                }
                // Match sets exist for local endpoints only.
                if record.local.is_none() && other.local.is_none() {
                    continue;
                }
                pair_up(new.gid, &mut record, *other_gid, other, &mut notices);
            }

            log::debug!(
                "[rmw-graph] {:?} {} on '{}' added, {} match(es)",
                record.kind,
                new.gid,
                record.name,
                record.matches.len()
            );
            if let Some(core) = &record.local {
                self.locals.insert(new.gid, Arc::clone(core));
            }
            state.endpoints.insert(new.gid, record);
            state.version += 1;
        }
        self.changed(notices);
        Ok(())
    }

    /// Remove an endpoint and unmatch its peers.
    pub(crate) fn remove_endpoint(&self, gid: Gid) -> bool {
        let mut notices = Vec::new();
        {
            let mut state = self.state.write();
            let Some(record) = state.endpoints.remove(&gid) else {
                return false;
            };
            self.locals.remove(&gid);
            for peer in &record.matches {
                if let Some(other) = state.endpoints.get_mut(peer) {
                    other.matches.remove(&gid);
                    if record.kind.is_topic() {
                        if let Some(core) = &other.local {
                            notices.push(Notice::Matched(Arc::clone(core), false));
                        }
                    }
                }
            }
            state.version += 1;
            log::debug!("[rmw-graph] {:?} {} removed", record.kind, gid);
        }
        self.changed(notices);
        true
    }

    /// Drop every node and endpoint. Returns how many entries went away.
    pub(crate) fn clear(&self) -> usize {
        let dropped = {
            let mut state = self.state.write();
            let dropped = state.nodes.len() + state.endpoints.len();
            if dropped == 0 {
                return 0;
            }
            state.nodes.clear();
            state.endpoints.clear();
            self.locals.clear();
            state.version += 1;
            dropped
        };
        self.changed(Vec::new());
        dropped
    }

    /// QoS of every known counterpart endpoint on `name` with `type_name`.
    pub(crate) fn peer_qos(&self, kind: EndpointKind, name: &str, type_name: &str) -> Vec<QosProfile> {
        let wanted = kind.counterpart();
        self.state
            .read()
            .endpoints
            .values()
            .filter(|r| r.kind == wanted && r.name == name && r.type_name == type_name)
            .map(|r| r.qos)
            .collect()
    }

    /// Local endpoints matched with `gid`.
    pub(crate) fn matched_local(&self, gid: Gid) -> Vec<Arc<EndpointCore>> {
        let state = self.state.read();
        let Some(record) = state.endpoints.get(&gid) else {
            return Vec::new();
        };
        record
            .matches
            .iter()
            .filter_map(|peer| state.endpoints.get(peer))
            .filter_map(|peer| peer.local.clone())
            .collect()
    }

    /// Local endpoint registered under `gid`, if any.
    pub(crate) fn local(&self, gid: Gid) -> Option<Arc<EndpointCore>> {
        self.locals.get(&gid).map(|entry| Arc::clone(entry.value()))
    }

    /// Size of `gid`'s match set.
    pub fn matched_count(&self, gid: Gid) -> Result<usize> {
        self.state
            .read()
            .endpoints
            .get(&gid)
            .map(|r| r.matches.len())
            .ok_or_else(|| Error::invalid(format!("unknown endpoint {}", gid)))
    }

    /// Topic names and types across publishers and subscriptions.
    #[must_use]
    pub fn topic_names_and_types(&self) -> NamesAndTypes {
        self.names_and_types(|r| r.kind.is_topic())
    }

    /// Service names and types across services and clients.
    #[must_use]
    pub fn service_names_and_types(&self) -> NamesAndTypes {
        self.names_and_types(|r| !r.kind.is_topic())
    }

    fn names_and_types(&self, keep: impl Fn(&EndpointRecord) -> bool) -> NamesAndTypes {
        let state = self.state.read();
        let mut out = NamesAndTypes::new();
        for record in state.endpoints.values().filter(|r| keep(r)) {
            out.entry(record.name.clone())
                .or_default()
                .insert(record.type_name.clone());
        }
        out
    }

    /// Names and types of `kind` endpoints owned by one node.
    pub fn names_and_types_by_node(
        &self,
        kind: EndpointKind,
        node_name: &str,
        node_namespace: &str,
    ) -> Result<NamesAndTypes> {
        let state = self.state.read();
        let known = state
            .nodes
            .values()
            .any(|n| n.name == node_name && n.namespace == node_namespace);
        if !known {
            return Err(Error::invalid(format!(
                "node {}/{} not found",
                node_namespace.trim_end_matches('/'),
                node_name
            )));
        }

        let mut out = NamesAndTypes::new();
        for record in state.endpoints.values().filter(|r| {
            r.kind == kind && r.node_name == node_name && r.node_namespace == node_namespace
        }) {
            out.entry(record.name.clone())
                .or_default()
                .insert(record.type_name.clone());
        }
        Ok(out)
    }

    /// Number of `kind` endpoints on `name`.
    #[must_use]
    pub fn count(&self, kind: EndpointKind, name: &str) -> usize {
        self.state
            .read()
            .endpoints
            .values()
            .filter(|r| r.kind == kind && r.name == name)
            .count()
    }

    /// Publishers or subscriptions on `topic`, ordered by gid.
    #[must_use]
    pub fn endpoints_info_by_topic(&self, kind: EndpointKind, topic: &str) -> Vec<TopicEndpointInfo> {
        let state = self.state.read();
        let mut out: Vec<_> = state
            .endpoints
            .iter()
            .filter(|(_, r)| r.kind == kind && r.name == topic)
            .map(|(gid, r)| r.info(*gid))
            .collect();
        out.sort_by(|a, b| a.gid.cmp(&b.gid));
        out
    }

    /// `(name, namespace)` of every node, sorted.
    #[must_use]
    pub fn node_names(&self) -> Vec<(String, String)> {
        self.node_names_with_enclaves()
            .into_iter()
            .map(|n| (n.name, n.namespace))
            .collect()
    }

    #[must_use]
    pub fn node_names_with_enclaves(&self) -> Vec<NodeInfo> {
        let mut nodes: Vec<_> = self.state.read().nodes.values().cloned().collect();
        nodes.sort();
        nodes
    }
}

/// Evaluate one counterpart pair; compatible pairs join each other's match
/// set.
fn pair_up(
    gid: Gid,
    record: &mut EndpointRecord,
    other_gid: Gid,
    other: &mut EndpointRecord,
    notices: &mut Vec<Notice>,
) {
    let locals = [record.local.clone(), other.local.clone()];

    if record.type_name != other.type_name {
        if record.kind.is_topic() {
            log::debug!(
                "[rmw-graph] type mismatch on '{}': {} vs {}",
                record.name,
                record.type_name,
                other.type_name
            );
            notices.extend(locals.into_iter().flatten().map(Notice::IncompatibleType));
        }
        return;
    }

    if record.kind.is_topic() {
        let (offer, request) = if record.kind == EndpointKind::Publisher {
            (&record.qos, &other.qos)
        } else {
            (&other.qos, &record.qos)
        };
        let (verdict, reasons) = check_compatible(offer, request);
        if verdict == Compatibility::Incompatible {
            let policy = reasons
                .first()
                .map_or(PolicyKind::Reliability, |reason| reason.policy);
            log::debug!(
                "[rmw-graph] incompatible QoS on '{}' ({:?})",
                record.name,
                policy
            );
            notices.extend(
                locals
                    .into_iter()
                    .flatten()
                    .map(|core| Notice::IncompatibleQos(core, policy)),
            );
            return;
        }
        if verdict == Compatibility::Warning {
            for reason in &reasons {
                log::debug!("[rmw-graph] '{}': {}", record.name, reason);
            }
        }
        notices.extend(
            locals
                .into_iter()
                .flatten()
                .map(|core| Notice::Matched(core, true)),
        );
    }

    record.matches.insert(other_gid);
    other.matches.insert(gid);
}
