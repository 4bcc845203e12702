// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publishers, subscriptions, services, clients and their event handles.
//!
//! Every handle borrows the [`Node`] it was created from and consumes itself
//! on [`destroy`](Publisher::destroy); dropping a handle without destroying
//! it unregisters it as well. Payloads are opaque bytes: serialization is
//! the caller's business.

pub(crate) mod core;
mod service;

pub use service::{Client, RequestId, Service};

use self::core::{EndpointCore, Message};
use crate::backend::Backend;
use crate::condition::Readiness;
use crate::error::{Error, Result};
use crate::event::{EventCallback, EventKind, EventStatus, StatusSlot};
use crate::graph::{EndpointKind, Gid, GraphCache};
use crate::node::{Node, Registered};
use crate::qos::QosProfile;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Options fixed at subscription creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Skip samples published by endpoints of the same context.
    pub ignore_local_publications: bool,
}

/// One taken message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub payload: Vec<u8>,
    pub publisher_gid: Gid,
    /// Per-publisher sequence number, starting at 1.
    pub sequence: i64,
}

impl From<Message> for Sample {
    fn from(message: Message) -> Self {
        Self {
            payload: message.payload,
            publisher_gid: message.source,
            sequence: message.sequence,
        }
    }
}

/// Registration shared by every endpoint handle.
pub(crate) struct EndpointHandle<'a, B: Backend> {
    node: &'a Node<'a, B>,
    core: Arc<EndpointCore>,
    name: String,
    type_name: String,
    qos: QosProfile,
    retired: bool,
}

impl<'a, B: Backend> EndpointHandle<'a, B> {
    pub(crate) fn new(node: &'a Node<'a, B>, registered: Registered) -> Self {
        Self {
            node,
            core: registered.core,
            name: registered.name,
            type_name: registered.type_name,
            qos: registered.qos,
            retired: false,
        }
    }

    pub(crate) fn graph(&self) -> &'a GraphCache {
        self.node.context().graph()
    }

    pub(crate) fn core(&self) -> &EndpointCore {
        &self.core
    }

    pub(crate) fn gid(&self) -> Gid {
        self.core.gid
    }

    pub(crate) fn matched_count(&self) -> Result<usize> {
        self.graph().matched_count(self.core.gid)
    }

    pub(crate) fn take(&self) -> Option<Message> {
        self.core.pop()
    }

    pub(crate) fn create_event(&self, kind: EventKind) -> Result<EventHandle<'_, B>> {
        let slot = kind.route()?;
        let publisher_side = self.core.kind == EndpointKind::Publisher;
        if kind.on_publisher() != publisher_side {
            return Err(Error::invalid(format!(
                "{:?} does not apply to a {:?}",
                kind, self.core.kind
            )));
        }
        Ok(EventHandle {
            core: Arc::clone(&self.core),
            kind,
            slot,
            _owner: PhantomData,
        })
    }

    pub(crate) fn retire(&mut self) -> Result<()> {
        if self.retired {
            return Ok(());
        }
        self.retired = true;
        if self.graph().remove_endpoint(self.core.gid) {
            Ok(())
        } else {
            Err(Error::Error(format!(
                "{:?} {} already removed from the graph",
                self.core.kind, self.core.gid
            )))
        }
    }
}

impl<B: Backend> Drop for EndpointHandle<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.retire() {
            log::debug!("[rmw-graph] {}", e);
        }
    }
}

/// Topic writer.
pub struct Publisher<'a, B: Backend> {
    inner: EndpointHandle<'a, B>,
    sequence: AtomicI64,
}

impl<'a, B: Backend> Publisher<'a, B> {
    pub(crate) fn new(node: &'a Node<'a, B>, registered: Registered) -> Self {
        Self {
            inner: EndpointHandle::new(node, registered),
            sequence: AtomicI64::new(1),
        }
    }

    #[must_use]
    pub fn gid(&self) -> Gid {
        self.inner.gid()
    }

    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// Profile in effect, best-available fields resolved at creation.
    #[must_use]
    pub fn actual_qos(&self) -> QosProfile {
        self.inner.qos
    }

    /// Number of subscriptions currently matched.
    pub fn matched_count(&self) -> Result<usize> {
        self.inner.matched_count()
    }

    /// Deliver `payload` to every matched local subscription. Returns the
    /// number of deliveries.
    pub fn publish(&self, payload: &[u8]) -> Result<usize> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let source = self.gid();
        let mut delivered = 0;
        for subscription in self.inner.graph().matched_local(source) {
            if subscription.ignore_local {
                continue;
            }
            subscription.deliver(Message {
                payload: payload.to_vec(),
                source,
                sequence,
            });
            delivered += 1;
        }
        Ok(delivered)
    }

    pub fn create_event(&self, kind: EventKind) -> Result<EventHandle<'_, B>> {
        self.inner.create_event(kind)
    }

    pub fn destroy(mut self) -> Result<()> {
        self.inner.retire()
    }
}

/// Topic reader.
pub struct Subscription<'a, B: Backend> {
    inner: EndpointHandle<'a, B>,
    options: SubscriptionOptions,
}

impl<'a, B: Backend> Subscription<'a, B> {
    pub(crate) fn new(
        node: &'a Node<'a, B>,
        registered: Registered,
        options: SubscriptionOptions,
    ) -> Self {
        Self {
            inner: EndpointHandle::new(node, registered),
            options,
        }
    }

    #[must_use]
    pub fn gid(&self) -> Gid {
        self.inner.gid()
    }

    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    #[must_use]
    pub fn actual_qos(&self) -> QosProfile {
        self.inner.qos
    }

    #[must_use]
    pub fn options(&self) -> SubscriptionOptions {
        self.options
    }

    /// Number of publishers currently matched.
    pub fn matched_count(&self) -> Result<usize> {
        self.inner.matched_count()
    }

    /// Oldest queued sample, if any. Concurrent takers never see the same
    /// sample twice.
    pub fn take(&self) -> Result<Option<Sample>> {
        Ok(self.inner.take().map(Sample::from))
    }

    /// Up to `count` queued samples, oldest first.
    pub fn take_sequence(&self, count: usize) -> Result<Vec<Sample>> {
        if count == 0 {
            return Err(Error::invalid("take_sequence count must be > 0"));
        }
        let mut samples = Vec::with_capacity(count.min(64));
        while samples.len() < count {
            match self.inner.take() {
                Some(message) => samples.push(Sample::from(message)),
                None => break,
            }
        }
        Ok(samples)
    }

    /// Push callback fired for every new sample. Samples that arrived while
    /// no callback was set are reported in the first invocation.
    pub fn set_on_new_message_callback(&self, callback: Option<EventCallback>) {
        self.inner.core().data.set_callback(callback);
    }

    pub fn create_event(&self, kind: EventKind) -> Result<EventHandle<'_, B>> {
        self.inner.create_event(kind)
    }

    pub fn destroy(mut self) -> Result<()> {
        self.inner.retire()
    }

    pub(crate) fn core(&self) -> &EndpointCore {
        self.inner.core()
    }
}

/// Status event of one publisher or subscription.
pub struct EventHandle<'a, B: Backend> {
    core: Arc<EndpointCore>,
    kind: EventKind,
    slot: StatusSlot,
    _owner: PhantomData<(&'a (), fn() -> B)>,
}

impl<B: Backend> EventHandle<'_, B> {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Current status; resets its change counters.
    pub fn take_status(&self) -> EventStatus {
        self.core.book(self.slot).take()
    }

    pub fn set_callback(&self, callback: Option<EventCallback>) {
        self.core.book(self.slot).readiness.set_callback(callback);
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.core.book(self.slot).has_changes()
    }

    pub(crate) fn readiness(&self) -> &Readiness {
        &self.core.book(self.slot).readiness
    }
}
