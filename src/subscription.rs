//! Teardown slot with at-most-once release.
//!
//! # Overview
//! - A [`Subscription`] owns the [`Teardown`] returned by a producer.
//! - `unsubscribe` runs the teardown at most once, no matter how many times or
//!   from how many threads it is called.
//! - Dropping a subscription without unsubscribing drops the teardown unrun.
//!
//! # Memory ordering
//! The `released` flag is swapped before the slot is touched. Only the caller
//! that flips it from `false` to `true` reads the slot, so the slot never has
//! two accessors. A call made from inside the teardown itself sees the flag
//! already set and returns immediately.

use alloc::boxed::Box;
use core::cell::UnsafeCell;
use core::fmt;

use crate::error::{BoxError, Error, Result};
use crate::sync::{AtomicBool, Ordering};

type DisconnectFn = Box<dyn FnOnce() -> core::result::Result<(), BoxError> + Send>;

/// Disconnect function returned by a producer, or nothing to release.
#[derive(Default)]
pub struct Teardown(Option<DisconnectFn>);

impl Teardown {
    /// Nothing to release.
    #[inline]
    pub const fn none() -> Self {
        Teardown(None)
    }

    pub fn new<F>(disconnect: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Teardown(Some(Box::new(move || {
            disconnect();
            Ok(())
        })))
    }

    /// A disconnect that can fail. The error reaches the `unsubscribe` caller
    /// as [`Error::TeardownInvocation`].
    pub fn try_new<F, E>(disconnect: F) -> Self
    where
        F: FnOnce() -> core::result::Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        Teardown(Some(Box::new(move || disconnect().map_err(Into::into))))
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    fn run(self) -> Result<()> {
        match self.0 {
            Some(disconnect) => disconnect().map_err(Error::TeardownInvocation),
            None => Ok(()),
        }
    }
}

impl<F> From<F> for Teardown
where
    F: FnOnce() + Send + 'static,
{
    fn from(disconnect: F) -> Self {
        Teardown::new(disconnect)
    }
}

impl From<()> for Teardown {
    fn from(_: ()) -> Self {
        Teardown::none()
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Teardown(..)"),
            None => f.write_str("Teardown(none)"),
        }
    }
}

/// Handle returned by `subscribe`.
#[must_use = "dropping a Subscription never disconnects; call `unsubscribe`"]
pub struct Subscription {
    released: AtomicBool,
    teardown: UnsafeCell<Teardown>,
}

// The slot is only read by the single caller that wins the `released` swap.
unsafe impl Sync for Subscription {}

impl Subscription {
    pub(crate) fn new(teardown: Teardown) -> Self {
        Self {
            released: AtomicBool::new(false),
            teardown: UnsafeCell::new(teardown),
        }
    }

    /// Disconnect from the event source.
    ///
    /// Runs the teardown on the first call and clears it before running, so
    /// later, concurrent, and re-entrant calls are no-ops returning `Ok(())`.
    /// If the teardown fails, the error is returned once and never again.
    pub fn unsubscribe(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let teardown = unsafe { core::mem::take(&mut *self.teardown.get()) };
        if teardown.is_none() {
            return Ok(());
        }

        log::trace!(target: "ph_indefinite", "disconnecting subscription");
        teardown.run().inspect_err(|err| {
            log::debug!(target: "ph_indefinite", "teardown failed ({}): {err}", err.as_label());
        })
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.released.load(Ordering::Acquire))
            .finish()
    }
}
