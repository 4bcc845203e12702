// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Nodes: named entity factories.

use crate::backend::Backend;
use crate::context::Context;
use crate::entity::core::EndpointCore;
use crate::entity::{Client, Publisher, Service, Subscription, SubscriptionOptions};
use crate::error::{Error, Result};
use crate::graph::{EndpointKind, Gid, NewEndpoint, NodeInfo};
use crate::qos::{resolve_for, EndpointRole, QosProfile};
use std::sync::Arc;

/// A node registered in its context's graph for as long as it lives.
pub struct Node<'ctx, B: Backend> {
    ctx: &'ctx Context<B>,
    gid: Gid,
    name: String,
    namespace: String,
    retired: bool,
}

/// What [`Node::register_endpoint`] hands back to the entity constructors.
pub(crate) struct Registered {
    pub core: Arc<EndpointCore>,
    pub name: String,
    pub type_name: String,
    pub qos: QosProfile,
}

impl<'ctx, B: Backend> Node<'ctx, B> {
    pub(crate) fn new(ctx: &'ctx Context<B>, name: &str, namespace: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid("node name must not be empty"));
        }
        if !namespace.starts_with('/') {
            return Err(Error::invalid(format!(
                "node namespace must be absolute, got '{}'",
                namespace
            )));
        }

        let gid = ctx.next_gid();
        ctx.graph().add_node(
            gid,
            NodeInfo {
                name: name.to_string(),
                namespace: namespace.to_string(),
                enclave: ctx.enclave().to_string(),
            },
        );

        Ok(Self {
            ctx,
            gid,
            name: name.to_string(),
            namespace: namespace.to_string(),
            retired: false,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn gid(&self) -> Gid {
        self.gid
    }

    #[must_use]
    pub fn context(&self) -> &'ctx Context<B> {
        self.ctx
    }

    pub fn create_publisher(
        &self,
        topic: &str,
        type_name: &str,
        qos: &QosProfile,
    ) -> Result<Publisher<'_, B>> {
        let registered =
            self.register_endpoint(EndpointKind::Publisher, topic, type_name, qos, false)?;
        Ok(Publisher::new(self, registered))
    }

    pub fn create_subscription(
        &self,
        topic: &str,
        type_name: &str,
        qos: &QosProfile,
        options: SubscriptionOptions,
    ) -> Result<Subscription<'_, B>> {
        let registered = self.register_endpoint(
            EndpointKind::Subscription,
            topic,
            type_name,
            qos,
            options.ignore_local_publications,
        )?;
        Ok(Subscription::new(self, registered, options))
    }

    pub fn create_service(
        &self,
        service: &str,
        type_name: &str,
        qos: &QosProfile,
    ) -> Result<Service<'_, B>> {
        let registered =
            self.register_endpoint(EndpointKind::Service, service, type_name, qos, false)?;
        Ok(Service::new(self, registered))
    }

    pub fn create_client(
        &self,
        service: &str,
        type_name: &str,
        qos: &QosProfile,
    ) -> Result<Client<'_, B>> {
        let registered =
            self.register_endpoint(EndpointKind::Client, service, type_name, qos, false)?;
        Ok(Client::new(self, registered))
    }

    /// Validate, resolve best-available fields against the peers known right
    /// now, then enter the endpoint into the graph.
    pub(crate) fn register_endpoint(
        &self,
        kind: EndpointKind,
        name: &str,
        type_name: &str,
        qos: &QosProfile,
        ignore_local: bool,
    ) -> Result<Registered> {
        if name.is_empty() || type_name.is_empty() {
            return Err(Error::invalid("name and type must not be empty"));
        }
        qos.validate()?;

        // Services answer (offer), clients ask (request).
        let role = match kind {
            EndpointKind::Publisher | EndpointKind::Service => EndpointRole::Publisher,
            EndpointKind::Subscription | EndpointKind::Client => EndpointRole::Subscription,
        };
        let graph = self.ctx.graph();
        let peers = graph.peer_qos(kind, name, type_name);
        let resolved = resolve_for::<B>(qos, role, &peers);

        let gid = self.ctx.next_gid();
        let core = Arc::new(EndpointCore::new(
            gid,
            kind,
            resolved.queue_capacity(),
            ignore_local,
            self.ctx.dispatch_sender(),
        ));
        graph.add_endpoint(NewEndpoint {
            gid,
            kind,
            name: name.to_string(),
            type_name: type_name.to_string(),
            node_name: self.name.clone(),
            node_namespace: self.namespace.clone(),
            qos: resolved,
            local: Some(Arc::clone(&core)),
        })?;

        Ok(Registered {
            core,
            name: name.to_string(),
            type_name: type_name.to_string(),
            qos: resolved,
        })
    }

    /// Unregister the node. Entities created from it are already gone: they
    /// borrow the node.
    pub fn destroy(mut self) -> Result<()> {
        self.retire()
    }

    fn retire(&mut self) -> Result<()> {
        if self.retired {
            return Ok(());
        }
        self.retired = true;
        if self.ctx.graph().remove_node(self.gid) {
            Ok(())
        } else {
            Err(Error::Error(format!("node {} already withdrawn", self.gid)))
        }
    }
}

impl<B: Backend> Drop for Node<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.retire() {
            log::debug!("[rmw-context] {}", e);
        }
    }
}

impl<B: Backend> std::fmt::Debug for Node<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("gid", &self.gid)
            .finish()
    }
}
