// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/response endpoints.

use super::core::{EndpointCore, Message};
use super::EndpointHandle;
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::event::EventCallback;
use crate::graph::{EndpointKind, Gid};
use crate::node::{Node, Registered};
use crate::qos::QosProfile;
use std::sync::atomic::{AtomicI64, Ordering};

/// Identifies one request: the client that wrote it and its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub writer_gid: Gid,
    pub sequence_number: i64,
}

/// Server side of a service.
pub struct Service<'a, B: Backend> {
    inner: EndpointHandle<'a, B>,
}

impl<'a, B: Backend> Service<'a, B> {
    pub(crate) fn new(node: &'a Node<'a, B>, registered: Registered) -> Self {
        Self {
            inner: EndpointHandle::new(node, registered),
        }
    }

    #[must_use]
    pub fn gid(&self) -> Gid {
        self.inner.gid()
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn actual_qos(&self) -> QosProfile {
        self.inner.qos
    }

    /// Number of clients currently matched.
    pub fn matched_count(&self) -> Result<usize> {
        self.inner.matched_count()
    }

    pub fn take_request(&self) -> Result<Option<(RequestId, Vec<u8>)>> {
        Ok(self.inner.take().map(|message| {
            (
                RequestId {
                    writer_gid: message.source,
                    sequence_number: message.sequence,
                },
                message.payload,
            )
        }))
    }

    /// Answer `request`. A client that went away in the meantime is not an
    /// error; the response is dropped.
    pub fn send_response(&self, request: &RequestId, payload: &[u8]) -> Result<()> {
        let Some(client) = self.inner.graph().local(request.writer_gid) else {
            log::debug!(
                "[rmw-graph] client {} gone, dropping response #{}",
                request.writer_gid,
                request.sequence_number
            );
            return Ok(());
        };
        if client.kind != EndpointKind::Client {
            return Err(Error::invalid(format!(
                "request writer {} is not a client",
                request.writer_gid
            )));
        }
        client.deliver(Message {
            payload: payload.to_vec(),
            source: self.gid(),
            sequence: request.sequence_number,
        });
        Ok(())
    }

    pub fn set_on_new_request_callback(&self, callback: Option<EventCallback>) {
        self.inner.core().data.set_callback(callback);
    }

    pub fn destroy(mut self) -> Result<()> {
        self.inner.retire()
    }

    pub(crate) fn core(&self) -> &EndpointCore {
        self.inner.core()
    }
}

/// Client side of a service.
pub struct Client<'a, B: Backend> {
    inner: EndpointHandle<'a, B>,
    sequence: AtomicI64,
}

impl<'a, B: Backend> Client<'a, B> {
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
    pub fn service_name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn actual_qos(&self) -> QosProfile {
        self.inner.qos
    }

    /// Number of services currently matched.
    pub fn matched_count(&self) -> Result<usize> {
        self.inner.matched_count()
    }

    /// `true` once at least one service answers on this name and type.
    pub fn service_is_available(&self) -> Result<bool> {
        Ok(self.matched_count()? > 0)
    }

    /// Send a request to every matched local service. Returns its sequence
    /// number, which the response carries back.
    pub fn send_request(&self, payload: &[u8]) -> Result<i64> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let source = self.gid();
        for service in self.inner.graph().matched_local(source) {
            service.deliver(Message {
                payload: payload.to_vec(),
                source,
                sequence,
            });
        }
        Ok(sequence)
    }

    /// Oldest response, keyed by this client's gid and the request sequence.
    pub fn take_response(&self) -> Result<Option<(RequestId, Vec<u8>)>> {
        let writer_gid = self.gid();
        Ok(self.inner.take().map(|message| {
            (
                RequestId {
                    writer_gid,
                    sequence_number: message.sequence,
                },
                message.payload,
            )
        }))
    }

    pub fn set_on_new_response_callback(&self, callback: Option<EventCallback>) {
        self.inner.core().data.set_callback(callback);
    }

    pub fn destroy(mut self) -> Result<()> {
        self.inner.retire()
    }

    pub(crate) fn core(&self) -> &EndpointCore {
        self.inner.core()
    }
}
