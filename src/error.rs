// SPDX-License-Identifier: MIT

//! Error type returned by the DRBG engine.
use crate::entropy;

use thiserror::Error;

/// Failures surfaced to callers of [`Drbg`](crate::drbg::Drbg).
///
/// None of these are retried internally. Corruption of the internal
/// state (seed material of the wrong length, misuse of a mechanism
/// before it is initialized) is not reported here; it panics.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed an out-of-range value: strength too high,
    /// input too long, or a capability the mechanism cannot provide.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is disabled by the configured capability.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The entropy source failed or returned an unusable buffer.
    #[error(transparent)]
    Entropy(#[from] entropy::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedOperation(msg.into())
    }
}
