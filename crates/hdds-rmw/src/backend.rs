// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backend markers.
//!
//! Every context, node, entity and wait set is parameterized by a backend
//! type, so handing a handle from one backend to another is a type error.
//! The string identifier survives only for callers crossing a language
//! boundary, where [`ensure_identifier`] performs the runtime comparison.

use crate::error::{Error, Result};
use crate::qos::QosProfile;

mod sealed {
    pub trait Sealed {}
}

/// An rmw implementation. Sealed: only this crate provides backends.
pub trait Backend: sealed::Sealed + Send + Sync + 'static {
    /// Implementation identifier exposed at FFI boundaries.
    const IDENTIFIER: &'static str;

    /// Concrete profile used by best-available resolution when no peer is
    /// known yet.
    fn fallback_profile() -> QosProfile {
        QosProfile::default()
    }
}

/// The HDDS backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hdds;

impl sealed::Sealed for Hdds {}

impl Backend for Hdds {
    const IDENTIFIER: &'static str = "rmw_hdds_cpp";
}

/// Compare a foreign identifier against backend `B`.
pub fn ensure_identifier<B: Backend>(found: &str) -> Result<()> {
    if found == B::IDENTIFIER {
        Ok(())
    } else {
        Err(Error::IncorrectImplementation {
            expected: B::IDENTIFIER,
            found: found.to_string(),
        })
    }
}
