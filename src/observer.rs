//! Consumer normalization.
//!
//! Callers subscribe with either a bare `next` callback or an object that
//! implements [`Observer`]. Both paths converge on [`Consumer`], the single
//! handle a producer ever sees.
//!
//! # Identity
//! An observer passed as `Arc<O>` reaches the producer as the same allocation.
//! Only bare callbacks get wrapped, and a fresh wrapper is made per subscribe.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use crate::error::{Error, Result};

/// Object-shaped consumer: anything with a `next` handler.
pub trait Observer<T>: Send + Sync {
    /// Handle one event.
    fn next(&self, value: T);
}

/// Wrapper giving a bare callback the `Observer` shape.
struct NextFn<F>(F);

impl<T, F> Observer<T> for NextFn<F>
where
    F: Fn(T) + Send + Sync,
{
    #[inline]
    fn next(&self, value: T) {
        (self.0)(value)
    }
}

/// Canonical consumer handle passed to producers.
///
/// Cloning shares the underlying observer, so a producer can stash a clone in
/// whatever listener registry it wires up.
pub struct Consumer<T> {
    inner: Arc<dyn Observer<T>>,
}

impl<T: 'static> Consumer<T> {
    /// Wrap a bare callback in a new observer.
    pub fn from_fn<F>(next: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(NextFn(next)),
        }
    }

    /// Use an existing observer as-is.
    pub fn from_observer<O>(observer: Arc<O>) -> Self
    where
        O: Observer<T> + 'static,
    {
        Self { inner: observer }
    }

    /// Use an existing type-erased observer as-is.
    pub fn from_dyn(observer: Arc<dyn Observer<T>>) -> Self {
        Self { inner: observer }
    }
}

impl<T> Consumer<T> {
    /// Deliver one event.
    #[inline]
    pub fn next(&self, value: T) {
        self.inner.next(value)
    }

    /// True if both handles point at the same observer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// True if this handle is `observer` itself rather than a wrapper around it.
    pub fn is_observer<O: ?Sized>(&self, observer: &Arc<O>) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(observer))
    }
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("observer", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

/// Either shape a caller may subscribe with.
pub enum ObserverOrNext<T> {
    /// Bare callback; wrapped on normalization.
    Next(Box<dyn Fn(T) + Send + Sync>),
    /// Observer; passed through as-is.
    Observer(Arc<dyn Observer<T>>),
}

impl<T: 'static> ObserverOrNext<T> {
    /// Subscribe with a bare callback.
    pub fn next<F>(next: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        ObserverOrNext::Next(Box::new(next))
    }

    /// Subscribe with a shared observer.
    pub fn observer<O>(observer: Arc<O>) -> Self
    where
        O: Observer<T> + 'static,
    {
        ObserverOrNext::Observer(observer)
    }

    /// Normalize a type-erased value.
    ///
    /// Accepts a boxed `Arc<dyn Observer<T>>`, `Box<dyn Fn(T) + Send + Sync>` or
    /// `Arc<dyn Fn(T) + Send + Sync>`. Anything else is rejected with
    /// [`Error::InvalidConsumer`].
    pub fn from_any(value: Box<dyn Any + Send>) -> Result<Self> {
        let value = match value.downcast::<Arc<dyn Observer<T>>>() {
            Ok(observer) => return Ok(ObserverOrNext::Observer(*observer)),
            Err(value) => value,
        };
        let value = match value.downcast::<Box<dyn Fn(T) + Send + Sync>>() {
            Ok(next) => return Ok(ObserverOrNext::Next(*next)),
            Err(value) => value,
        };
        match value.downcast::<Arc<dyn Fn(T) + Send + Sync>>() {
            Ok(next) => {
                let next = *next;
                Ok(ObserverOrNext::Next(Box::new(move |v| next(v))))
            }
            Err(_) => {
                log::debug!(target: "ph_indefinite", "rejected consumer of unsupported type");
                Err(Error::InvalidConsumer {
                    got: "value without a next handler",
                })
            }
        }
    }

    /// Produce the canonical handle. Observers pass through untouched.
    pub fn into_consumer(self) -> Consumer<T> {
        match self {
            ObserverOrNext::Next(next) => Consumer::from_fn(next),
            ObserverOrNext::Observer(observer) => Consumer::from_dyn(observer),
        }
    }
}

impl<T> fmt::Debug for ObserverOrNext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverOrNext::Next(_) => f.write_str("Next(..)"),
            ObserverOrNext::Observer(_) => f.write_str("Observer(..)"),
        }
    }
}
