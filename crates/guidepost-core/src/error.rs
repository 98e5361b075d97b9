// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine error type.

use thiserror::Error;

/// Errors raised synchronously by the engine.
///
/// Missing guides or steps are not errors (engagement calls return `Ok(None)`),
/// and fetch failures are recorded in the store as query status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuideError {
    /// The operation needs a user context and the engine has none.
    #[error("{operation} requires an authenticated user")]
    Unauthenticated {
        /// Operation that was attempted.
        operation: &'static str,
    },
}

impl GuideError {
    pub(crate) fn unauthenticated(operation: &'static str) -> Self {
        GuideError::Unauthenticated { operation }
    }
}
