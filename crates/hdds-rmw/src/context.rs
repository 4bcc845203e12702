// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Middleware context.
//!
//! A [`Context`] owns the discovery graph, the event dispatch thread and the
//! gid allocator shared by every node created from it. Nodes and entities
//! borrow the context, so none of them can outlive it, and tearing it down
//! is an explicit [`Context::shutdown`] or its `Drop`.

use crate::backend::{Backend, Hdds};
use crate::condition::GuardCondition;
use crate::config::{DiscoveryRange, EnvConfig, MAX_DOMAIN_ID};
use crate::error::{Error, Result, TeardownReport};
use crate::event::{DispatchSender, EventDispatcher};
use crate::graph::{
    EndpointKind, Gid, GidAllocator, GraphCache, NamesAndTypes, NewEndpoint, NodeInfo,
    RemoteEndpoint, TopicEndpointInfo,
};
use crate::node::Node;
use crate::qos::QosProfile;
use crate::waitset::WaitSet;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Construction parameters of a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    pub domain_id: u32,
    pub enclave: String,
    pub discovery_range: DiscoveryRange,
    pub discovery_peers: Vec<String>,
    /// Distinguishes contexts of one process inside gids. `None` picks the
    /// next process-unique value.
    pub instance_id: Option<u32>,
    /// Initial slot count of unbounded wait sets.
    pub waitset_capacity: usize,
    pub qos_profile_path: Option<String>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::from_config(&EnvConfig::default())
    }
}

impl ContextOptions {
    #[must_use]
    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            domain_id: config.domain_id,
            enclave: config.enclave.clone(),
            discovery_range: config.discovery_range,
            discovery_peers: config.discovery_peers.clone(),
            instance_id: None,
            waitset_capacity: config.waitset_capacity,
            qos_profile_path: config.qos_profile_path.clone(),
        }
    }

    /// Builder-style domain override.
    #[must_use]
    pub fn with_domain_id(mut self, domain_id: u32) -> Self {
        self.domain_id = domain_id;
        self
    }

    #[must_use]
    pub fn with_enclave(mut self, enclave: impl Into<String>) -> Self {
        self.enclave = enclave.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.domain_id > MAX_DOMAIN_ID {
            return Err(Error::invalid(format!(
                "domain id {} exceeds maximum {}",
                self.domain_id, MAX_DOMAIN_ID
            )));
        }
        if !self.enclave.starts_with('/') {
            return Err(Error::invalid(format!(
                "enclave must be absolute, got '{}'",
                self.enclave
            )));
        }
        if self.waitset_capacity == 0 {
            return Err(Error::invalid("wait set capacity must be > 0"));
        }
        Ok(())
    }
}

fn next_instance_id() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Root of every node, entity and wait set.
pub struct Context<B: Backend = Hdds> {
    options: ContextOptions,
    instance_id: u32,
    gids: GidAllocator,
    graph: GraphCache,
    dispatcher: EventDispatcher,
    dispatch: DispatchSender,
    closed: bool,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> Context<B> {
    pub fn new(options: ContextOptions) -> Result<Self> {
        options.validate()?;
        let instance_id = options.instance_id.unwrap_or_else(next_instance_id);
        let dispatcher = EventDispatcher::start()?;
        let dispatch = dispatcher.sender();

        log::info!(
            "[rmw-context] {} context up: domain {}, enclave '{}', instance {}, discovery {:?}",
            B::IDENTIFIER,
            options.domain_id,
            options.enclave,
            instance_id,
            options.discovery_range
        );

        Ok(Self {
            options,
            instance_id,
            gids: GidAllocator::new(instance_id),
            graph: GraphCache::new(),
            dispatcher,
            dispatch,
            closed: false,
            _backend: PhantomData,
        })
    }

    /// Build a context from `HDDS_*` / `ROS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = EnvConfig::from_env()?;
        Self::new(ContextOptions::from_config(&config))
    }

    #[must_use]
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    #[must_use]
    pub fn domain_id(&self) -> u32 {
        self.options.domain_id
    }

    #[must_use]
    pub fn enclave(&self) -> &str {
        &self.options.enclave
    }

    #[must_use]
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    #[must_use]
    pub fn implementation_identifier(&self) -> &'static str {
        B::IDENTIFIER
    }

    pub fn create_node(&self, name: &str, namespace: &str) -> Result<Node<'_, B>> {
        Node::new(self, name, namespace)
    }

    /// Fresh guard condition usable in any wait set of this context.
    #[must_use]
    pub fn create_guard_condition(&self) -> Arc<GuardCondition> {
        Arc::new(GuardCondition::new())
    }

    /// Create a wait set holding at most `max_handles` waitables per wait;
    /// 0 means unbounded.
    pub fn create_wait_set(&self, max_handles: usize) -> Result<WaitSet<B>> {
        WaitSet::new(max_handles, self.options.waitset_capacity)
    }

    /// Guard triggered on every graph change.
    #[must_use]
    pub fn graph_guard_condition(&self) -> Arc<GuardCondition> {
        Arc::clone(self.graph.guard_condition())
    }

    #[must_use]
    pub fn graph_version(&self) -> u64 {
        self.graph.version()
    }

    /// Mutation surface for the transport's discovery.
    #[must_use]
    pub fn discovery(&self) -> DiscoveryFeed<'_, B> {
        DiscoveryFeed { ctx: self }
    }

    #[must_use]
    pub fn topic_names_and_types(&self) -> NamesAndTypes {
        self.graph.topic_names_and_types()
    }

    #[must_use]
    pub fn service_names_and_types(&self) -> NamesAndTypes {
        self.graph.service_names_and_types()
    }

    #[must_use]
    pub fn count_publishers(&self, topic: &str) -> usize {
        self.graph.count(EndpointKind::Publisher, topic)
    }

    #[must_use]
    pub fn count_subscribers(&self, topic: &str) -> usize {
        self.graph.count(EndpointKind::Subscription, topic)
    }

    #[must_use]
    pub fn count_services(&self, service: &str) -> usize {
        self.graph.count(EndpointKind::Service, service)
    }

    #[must_use]
    pub fn count_clients(&self, service: &str) -> usize {
        self.graph.count(EndpointKind::Client, service)
    }

    #[must_use]
    pub fn node_names(&self) -> Vec<(String, String)> {
        self.graph.node_names()
    }

    #[must_use]
    pub fn node_names_with_enclaves(&self) -> Vec<NodeInfo> {
        self.graph.node_names_with_enclaves()
    }

    /// Names and types of `kind` endpoints owned by the node
    /// `node_namespace`/`node_name`. Unknown nodes are `InvalidArgument`.
    pub fn names_and_types_by_node(
        &self,
        kind: EndpointKind,
        node_name: &str,
        node_namespace: &str,
    ) -> Result<NamesAndTypes> {
        self.graph
            .names_and_types_by_node(kind, node_name, node_namespace)
    }

    #[must_use]
    pub fn publishers_info_by_topic(&self, topic: &str) -> Vec<TopicEndpointInfo> {
        self.graph
            .endpoints_info_by_topic(EndpointKind::Publisher, topic)
    }

    #[must_use]
    pub fn subscriptions_info_by_topic(&self, topic: &str) -> Vec<TopicEndpointInfo> {
        self.graph
            .endpoints_info_by_topic(EndpointKind::Subscription, topic)
    }

    /// Profile `name` from the YAML file configured with
    /// `HDDS_QOS_PROFILE_PATH`. An empty name selects the file's default.
    #[cfg(feature = "qos-loaders")]
    pub fn qos_profile(&self, name: &str) -> Result<QosProfile> {
        use crate::qos::loader::YamlLoader;

        let Some(path) = self.options.qos_profile_path.as_deref() else {
            return Err(Error::invalid("no QoS profile file configured"));
        };
        let doc = YamlLoader::load_from_file(path)?;
        if name.is_empty() {
            YamlLoader::get_default_profile(&doc)
        } else {
            YamlLoader::get_profile(&doc, name)
        }
    }

    #[cfg(not(feature = "qos-loaders"))]
    pub fn qos_profile(&self, _name: &str) -> Result<QosProfile> {
        Err(Error::Unsupported("QoS profile files (feature qos-loaders)"))
    }

    /// Stop the dispatch thread and drop every graph entry.
    pub fn shutdown(mut self) -> TeardownReport {
        self.teardown()
    }

    fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::new();
        if self.closed {
            return report;
        }
        self.closed = true;

        report.absorb(self.dispatcher.stop());
        let dropped = self.graph.clear();
        log::info!(
            "[rmw-context] context {} shut down ({} graph entries dropped)",
            self.instance_id,
            dropped
        );
        report
    }

    pub(crate) fn graph(&self) -> &GraphCache {
        &self.graph
    }

    pub(crate) fn next_gid(&self) -> Gid {
        self.gids.next()
    }

    pub(crate) fn dispatch_sender(&self) -> &DispatchSender {
        &self.dispatch
    }
}

impl<B: Backend> Drop for Context<B> {
    fn drop(&mut self) {
        for err in self.teardown().errors {
            log::warn!("[rmw-context] teardown: {}", err);
        }
    }
}

impl<B: Backend> std::fmt::Debug for Context<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("backend", &B::IDENTIFIER)
            .field("instance_id", &self.instance_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Entry point for a transport's discovery layer.
///
/// Everything announced here is remote: it takes part in matching with local
/// endpoints and in every graph query, but carries no local queue.
pub struct DiscoveryFeed<'a, B: Backend> {
    ctx: &'a Context<B>,
}

impl<B: Backend> DiscoveryFeed<'_, B> {
    /// Record a remote node. Returns `false` when nothing changed.
    pub fn announce_node(
        &self,
        gid: Gid,
        name: &str,
        namespace: &str,
        enclave: &str,
    ) -> Result<bool> {
        if name.is_empty() || namespace.is_empty() {
            return Err(Error::invalid("node name and namespace must not be empty"));
        }
        Ok(self.ctx.graph.add_node(
            gid,
            NodeInfo {
                name: name.to_string(),
                namespace: namespace.to_string(),
                enclave: enclave.to_string(),
            },
        ))
    }

    /// Forget a remote node. Its endpoints are withdrawn separately.
    pub fn withdraw_node(&self, gid: Gid) -> bool {
        self.ctx.graph.remove_node(gid)
    }

    pub fn announce_endpoint(&self, endpoint: RemoteEndpoint) -> Result<()> {
        if endpoint.name.is_empty() || endpoint.type_name.is_empty() {
            return Err(Error::invalid("endpoint name and type must not be empty"));
        }
        if endpoint.qos.has_best_available() {
            return Err(Error::invalid(format!(
                "remote endpoint {} advertises best-available QoS",
                endpoint.gid
            )));
        }
        self.ctx.graph.add_endpoint(NewEndpoint {
            gid: endpoint.gid,
            kind: endpoint.kind,
            name: endpoint.name,
            type_name: endpoint.type_name,
            node_name: endpoint.node_name,
            node_namespace: endpoint.node_namespace,
            qos: endpoint.qos,
            local: None,
        })
    }

    /// Withdraw a remote endpoint. Local endpoints are destroyed through
    /// their handle and are rejected here.
    pub fn withdraw_endpoint(&self, gid: Gid) -> Result<bool> {
        if self.ctx.graph.local(gid).is_some() {
            return Err(Error::invalid(format!(
                "endpoint {} is local and cannot be withdrawn",
                gid
            )));
        }
        Ok(self.ctx.graph.remove_endpoint(gid))
    }
}
