//! Atomic used by the teardown slot.
//!
//! Targets without native compare-and-swap enable one of the `portable-atomic*`
//! features to get a drop-in `AtomicBool`.

#[cfg(feature = "portable-atomic")]
pub(crate) use portable_atomic::{AtomicBool, Ordering};

#[cfg(not(feature = "portable-atomic"))]
pub(crate) use core::sync::atomic::{AtomicBool, Ordering};
