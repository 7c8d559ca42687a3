//! Lazy, indefinite observables for no-std targets with `alloc`.
//!
//! # Highlights
//! - Nothing runs at construction; each `subscribe` runs the producer once.
//! - Every subscriber gets its own producer invocation and its own teardown.
//! - `unsubscribe` runs the teardown at most once, including re-entrant and
//!   concurrent calls.
//! - Never completes, never errors: only the subscriber ends the stream.
//!
//! # Quick start
//! ```
//! use ph_indefinite::{Consumer, Observable};
//! use std::sync::{Arc, Mutex};
//!
//! let closed = Arc::new(Mutex::new(false));
//! let flag = Arc::clone(&closed);
//! let clicks = Observable::new(move |consumer: Consumer<u32>| {
//!     consumer.next(1);
//!     consumer.next(2);
//!     let flag = Arc::clone(&flag);
//!     move || *flag.lock().unwrap() = true
//! });
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let sub = clicks.subscribe(move |v| sink.lock().unwrap().push(v)).unwrap();
//! assert_eq!(*seen.lock().unwrap(), [1, 2]);
//!
//! sub.unsubscribe().unwrap();
//! sub.unsubscribe().unwrap();
//! assert!(*closed.lock().unwrap());
//! ```
//!
//! # No-std
//! The crate is `#![no_std]` and needs `alloc`. Tests require `std`.
//!
//! # Semantics
//! - Producers receive a [`Consumer`]: a bare callback is wrapped, an observer
//!   passed as `Arc<O>` arrives as the same allocation.
//! - Producer and teardown failures surface synchronously as [`Error`]; there is
//!   no retry and no suppression.
//! - Dropping a [`Subscription`] does not disconnect. Call `unsubscribe`.
//! - Emission timing belongs to the producer. An emission already in flight
//!   when `unsubscribe` runs may still complete.
#![no_std]

extern crate alloc;

pub mod error;
pub mod observable;
pub mod observer;
pub mod subscription;
mod sync;

pub use error::{BoxError, Error, Result};
pub use observable::{AsObservable, Observable, Subscribe};
pub use observer::{Consumer, Observer, ObserverOrNext};
pub use subscription::{Subscription, Teardown};

#[cfg(test)]
extern crate std;
