//! Error type shared by subscribe and unsubscribe.
//!
//! Every failure surfaces synchronously to the immediate caller. Nothing here is
//! retried or swallowed.

use alloc::boxed::Box;
use thiserror::Error;

/// Boxed error produced by a fallible producer or teardown.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// The value handed to `subscribe` was neither a `next` callback nor an observer.
    /// Raised before the producer runs.
    #[error("invalid consumer: expected a next callback or an observer, got {got}")]
    InvalidConsumer {
        /// Short description of why the input was rejected.
        got: &'static str,
    },

    /// The producer failed while connecting; no subscription was created.
    #[error("producer failed to connect: {0}")]
    ProducerInvocation(#[source] BoxError),

    /// The teardown failed while disconnecting. The teardown slot is already
    /// cleared, so calling `unsubscribe` again is a no-op.
    #[error("teardown failed: {0}")]
    TeardownInvocation(#[source] BoxError),
}

impl Error {
    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::InvalidConsumer { .. } => "invalid_consumer",
            Error::ProducerInvocation(_) => "producer_invocation",
            Error::TeardownInvocation(_) => "teardown_invocation",
        }
    }
}
