// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by every rmw operation.
//!
//! Two call shapes exist:
//! - validation paths return [`Error`] immediately and leave every input and
//!   output untouched;
//! - teardown paths keep releasing resources after a failure and collect the
//!   failures in a [`TeardownReport`].

use thiserror::Error;

/// Errors emitted by the rmw core.
#[derive(Debug, Error)]
pub enum Error {
    /// Null, zero-initialized or malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Handle produced by another backend than the one invoked.
    #[error("incorrect rmw implementation: expected '{expected}', found '{found}'")]
    IncorrectImplementation {
        expected: &'static str,
        found: String,
    },
    /// Allocation or capacity failure.
    #[error("allocation failed")]
    BadAlloc,
    /// Nothing became ready before the deadline.
    #[error("timed out")]
    Timeout,
    /// Feature not implemented by this backend.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// Unspecified failure.
    #[error("{0}")]
    Error(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal failures collected while tearing something down.
///
/// Teardown never stops at the first failure: everything reachable is freed
/// and every failure is recorded in encounter order.
#[derive(Debug, Default)]
#[must_use]
pub struct TeardownReport {
    pub errors: Vec<Error>,
}

impl TeardownReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and keep going.
    pub fn record(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Record the error side of `result`, if any.
    pub fn absorb(&mut self, result: Result<()>) {
        if let Err(err) = result {
            self.record(err);
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into the first recorded error.
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }
}
