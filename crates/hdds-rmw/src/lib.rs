// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-rmw - ROS 2 middleware core for HDDS
//!
//! Vendor-neutral pub/sub core behind the `rmw_hdds` middleware: QoS
//! negotiation, the discovery graph, the wait multiplexer and push-callback
//! event dispatch. Transports plug in underneath through
//! [`Context::discovery`]; the data plane shipped here is intra-process.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_rmw::{Context, ContextOptions, QosProfile, Result, SubscriptionOptions, Waitable};
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let ctx: Context = Context::new(ContextOptions::default())?;
//!     let node = ctx.create_node("talker", "/")?;
//!
//!     let qos = QosProfile::default();
//!     let publisher = node.create_publisher("/chatter", "std_msgs/msg/String", &qos)?;
//!     let subscription = node.create_subscription(
//!         "/chatter",
//!         "std_msgs/msg/String",
//!         &qos,
//!         SubscriptionOptions::default(),
//!     )?;
//!     publisher.publish(b"hello")?;
//!
//!     let mut wait_set = ctx.create_wait_set(0)?;
//!     let mut handles = [Some(Waitable::Subscription(&subscription))];
//!     wait_set.wait(&mut handles, Some(Duration::from_millis(100)))?;
//!
//!     if let Some(sample) = subscription.take()? {
//!         assert_eq!(sample.payload, b"hello");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  Context<B> -> Node -> Publisher/Subscription/Service/Client        |
//! +---------------------------------------------------------------------+
//! |  QoS: check_compatible | resolve (best-available, frozen)           |
//! +---------------------------------------------------------------------+
//! |  GraphCache: nodes, endpoints, match sets, graph guard condition    |
//! +---------------------------------------------------------------------+
//! |  WaitSet (eventfd driver) | EventDispatcher (callback thread)       |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Context`] | Owns the graph and the dispatch thread, factory for nodes |
//! | [`QosProfile`] | Negotiable delivery policies |
//! | [`GraphCache`] | Known nodes, endpoints and matches |
//! | [`WaitSet`] | Blocks on a list of [`Waitable`]s |
//! | [`GuardCondition`] | Edge-triggered, cross-thread wake |

/// Sealed backend markers.
pub mod backend;
/// Guard conditions and entity readiness.
pub mod condition;
/// Environment configuration (`HDDS_*`, `ROS_*`).
pub mod config;
/// Context, options and the discovery feed.
pub mod context;
/// Publishers, subscriptions, services, clients, event handles.
pub mod entity;
/// Error taxonomy and teardown reports.
pub mod error;
/// Event kinds, statuses and the dispatch thread.
pub mod event;
/// Gids and the discovery graph cache.
pub mod graph;
/// Nodes.
pub mod node;
/// QoS model, compatibility and resolution.
pub mod qos;
/// Wake driver behind wait sets.
pub mod rt;
/// Wait multiplexer.
pub mod waitset;

pub use backend::{ensure_identifier, Backend, Hdds};
pub use condition::GuardCondition;
pub use config::{DiscoveryRange, EnvConfig};
pub use context::{Context, ContextOptions, DiscoveryFeed};
pub use entity::{
    Client, EventHandle, Publisher, RequestId, Sample, Service, Subscription, SubscriptionOptions,
};
pub use error::{Error, Result, TeardownReport};
pub use event::{EventCallback, EventKind, EventStatus};
pub use graph::{
    EndpointKind, Gid, GraphCache, NamesAndTypes, NodeInfo, RemoteEndpoint, TopicEndpointInfo,
    RMW_GID_STORAGE_SIZE,
};
pub use node::Node;
pub use qos::{
    check_compatible, Compatibility, Durability, History, Liveliness, PolicyKind, QosDuration,
    QosProfile, Reason, Reliability,
};
pub use waitset::{WaitSet, Waitable};
