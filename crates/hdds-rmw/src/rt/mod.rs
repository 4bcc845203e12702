// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime support for wait sets.
//!
//! [`WaitDriver`] is the blocking primitive: readiness sources hold a
//! [`Signal`] and the wait set blocks on the driver until one fires.

mod bitmap;
mod driver;

pub use driver::{Registration, Signal, WaitDriver, WaitError, DEFAULT_SLOT_CAPACITY};
