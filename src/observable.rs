//! Lazy, indefinite observable.
//!
//! An [`Observable`] stores a producer and does nothing until `subscribe`.
//! Each subscribe runs the producer once with a fresh [`Consumer`] and wraps
//! the returned [`Teardown`] in a [`Subscription`]. The observable never
//! signals completion or error; only the subscriber ends the relationship.

use alloc::sync::Arc;
use core::fmt;

use crate::error::{BoxError, Error, Result};
use crate::observer::{Consumer, Observer, ObserverOrNext};
use crate::subscription::{Subscription, Teardown};

type Connect<T> =
    dyn Fn(Consumer<T>) -> core::result::Result<Teardown, BoxError> + Send + Sync;

/// Anything that can hand back the canonical observable it represents.
pub trait AsObservable<T> {
    /// The canonical observable; for [`Observable`] this is `self`.
    fn as_observable(&self) -> &Observable<T>;
}

/// The generic subscribe convention.
///
/// Code that only consumes streams can take `impl Subscribe<T>` and drive any
/// compliant source.
pub trait Subscribe<T> {
    /// Normalize `observer` and connect it.
    fn subscribe_with(&self, observer: ObserverOrNext<T>) -> Result<Subscription>;
}

/// Push-based event stream that connects on subscribe and disconnects on
/// unsubscribe.
///
/// Clones share the same producer.
pub struct Observable<T> {
    connect: Arc<Connect<T>>,
}

impl<T: 'static> Observable<T> {
    /// Build from a producer that cannot fail.
    ///
    /// The producer receives the consumer and returns what to run on
    /// unsubscribe: a closure, a [`Teardown`], or `()` for nothing.
    pub fn new<F, R>(connect: F) -> Self
    where
        F: Fn(Consumer<T>) -> R + Send + Sync + 'static,
        R: Into<Teardown>,
    {
        Self {
            connect: Arc::new(
                move |consumer: Consumer<T>| -> core::result::Result<Teardown, BoxError> {
                    Ok(connect(consumer).into())
                },
            ),
        }
    }

    /// Build from a producer that may fail while connecting.
    ///
    /// A failure reaches the `subscribe` caller as
    /// [`Error::ProducerInvocation`]; any wiring done before the failure is
    /// the producer's to undo.
    pub fn try_new<F, E>(connect: F) -> Self
    where
        F: Fn(Consumer<T>) -> core::result::Result<Teardown, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            connect: Arc::new(
                move |consumer: Consumer<T>| -> core::result::Result<Teardown, BoxError> {
                    connect(consumer).map_err(Into::into)
                },
            ),
        }
    }

    /// Subscribe with a bare `next` callback.
    pub fn subscribe<F>(&self, next: F) -> Result<Subscription>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.connect(Consumer::from_fn(next))
    }

    /// Subscribe with an observer. The producer receives this same observer.
    pub fn subscribe_observer<O>(&self, observer: Arc<O>) -> Result<Subscription>
    where
        O: Observer<T> + 'static,
    {
        self.connect(Consumer::from_observer(observer))
    }

    fn connect(&self, consumer: Consumer<T>) -> Result<Subscription> {
        log::trace!(target: "ph_indefinite", "connecting {consumer:?}");
        match (self.connect)(consumer) {
            Ok(teardown) => Ok(Subscription::new(teardown)),
            Err(err) => {
                let err = Error::ProducerInvocation(err);
                log::debug!(target: "ph_indefinite", "connect failed ({}): {err}", err.as_label());
                Err(err)
            }
        }
    }
}

impl<T: 'static> Subscribe<T> for Observable<T> {
    fn subscribe_with(&self, observer: ObserverOrNext<T>) -> Result<Subscription> {
        self.connect(observer.into_consumer())
    }
}

impl<T> AsObservable<T> for Observable<T> {
    #[inline]
    fn as_observable(&self) -> &Observable<T> {
        self
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            connect: Arc::clone(&self.connect),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("connect", &Arc::as_ptr(&self.connect))
            .finish()
    }
}

impl<T> Observable<T> {
    /// True if both observables share the same producer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.connect, &other.connect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use std::panic::AssertUnwindSafe;
    use std::string::String;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::vec::Vec;

    type Log<V> = Arc<Mutex<Vec<V>>>;

    fn log<V>() -> Log<V> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn construction_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _obs = Observable::<u32>::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn emits_then_tears_down_once() {
        let closed: Log<String> = log();
        let sink = Arc::clone(&closed);
        let obs = Observable::new(move |consumer: Consumer<u32>| {
            consumer.next(1);
            consumer.next(2);
            let sink = Arc::clone(&sink);
            move || sink.lock().unwrap().push(String::from("closed"))
        });

        let received: Log<u32> = log();
        let rx = Arc::clone(&received);
        let sub = obs.subscribe(move |v| rx.lock().unwrap().push(v)).unwrap();
        assert_eq!(&received.lock().unwrap()[..], &[1, 2]);

        sub.unsubscribe().unwrap();
        assert_eq!(&closed.lock().unwrap()[..], &[String::from("closed")]);

        sub.unsubscribe().unwrap();
        assert_eq!(closed.lock().unwrap().len(), 1);
    }

    #[test]
    fn producer_without_teardown() {
        let obs = Observable::new(|consumer: Consumer<u32>| consumer.next(5));
        let sub = obs.subscribe(|_| {}).unwrap();
        assert!(sub.unsubscribe().is_ok());
        assert!(sub.unsubscribe().is_ok());
    }

    #[test]
    fn each_subscribe_connects_independently() {
        let consumers: Log<Consumer<u32>> = log();
        let seen = Arc::clone(&consumers);
        let obs = Observable::new(move |consumer: Consumer<u32>| {
            seen.lock().unwrap().push(consumer);
        });

        let _a = obs.subscribe(|_| {}).unwrap();
        let _b = obs.subscribe(|_| {}).unwrap();

        let consumers = consumers.lock().unwrap();
        assert_eq!(consumers.len(), 2);
        assert!(!consumers[0].ptr_eq(&consumers[1]));
    }

    struct Tagged {
        seen: Mutex<Vec<u32>>,
    }

    impl Observer<u32> for Tagged {
        fn next(&self, value: u32) {
            self.seen.lock().unwrap().push(value);
        }
    }

    #[test]
    fn observer_identity_is_preserved() {
        let consumers: Log<Consumer<u32>> = log();
        let seen = Arc::clone(&consumers);
        let obs = Observable::new(move |consumer: Consumer<u32>| {
            consumer.next(11);
            seen.lock().unwrap().push(consumer);
        });

        let observer = Arc::new(Tagged {
            seen: Mutex::new(Vec::new()),
        });
        let _a = obs.subscribe_observer(Arc::clone(&observer)).unwrap();
        let _b = obs
            .subscribe_with(ObserverOrNext::observer(Arc::clone(&observer)))
            .unwrap();

        let consumers = consumers.lock().unwrap();
        assert!(consumers.iter().all(|c| c.is_observer(&observer)));
        assert_eq!(&observer.seen.lock().unwrap()[..], &[11, 11]);
    }

    #[test]
    fn producer_failure_surfaces_without_subscription() {
        let obs = Observable::<u32>::try_new(|_| Err("listener registry full"));
        let err = obs.subscribe(|_| {}).unwrap_err();
        assert!(matches!(err, Error::ProducerInvocation(_)));
    }

    #[test]
    fn invalid_consumer_never_reaches_producer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let obs = Observable::<u32>::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = ObserverOrNext::<u32>::from_any(Box::new(42i64))
            .and_then(|observer| obs.subscribe_with(observer));

        assert!(matches!(result, Err(Error::InvalidConsumer { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn producer_panic_unwinds_to_subscriber() {
        let obs = Observable::<u32>::new(|_| -> Teardown { panic!("event source gone") });

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| obs.subscribe(|_| {})));

        assert!(outcome.is_err());
    }

    #[test]
    fn consumer_may_unsubscribe_from_inside_next() {
        let emitter: Log<Consumer<u32>> = log();
        let stash = Arc::clone(&emitter);
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        let obs = Observable::new(move |consumer: Consumer<u32>| {
            stash.lock().unwrap().push(consumer);
            let counter = Arc::clone(&counter);
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let slot: Arc<std::sync::OnceLock<Subscription>> = Arc::new(std::sync::OnceLock::new());
        let inner = Arc::clone(&slot);
        let sub = obs
            .subscribe(move |_| {
                if let Some(sub) = inner.get() {
                    sub.unsubscribe().unwrap();
                }
            })
            .unwrap();
        slot.set(sub).unwrap();

        let consumer = emitter.lock().unwrap()[0].clone();
        consumer.next(1);
        consumer.next(2);

        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn as_observable_returns_self() {
        let obs = Observable::<u32>::new(|_| ());
        assert!(core::ptr::eq(obs.as_observable(), &obs));
        assert!(obs.clone().ptr_eq(&obs));
    }

    fn drain<S: Subscribe<u32>>(source: &S, into: Log<u32>) -> Subscription {
        source
            .subscribe_with(ObserverOrNext::next(move |v: u32| into.lock().unwrap().push(v)))
            .unwrap()
    }

    #[test]
    fn generic_code_drives_observable() {
        let obs = Observable::new(|consumer: Consumer<u32>| {
            (0..3).for_each(|v| consumer.next(v));
        });
        let received = log();
        let _sub = drain(&obs, Arc::clone(&received));
        assert_eq!(&received.lock().unwrap()[..], &[0, 1, 2]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn n_subscribes_connect_n_times(n in 1usize..16) {
                let calls = Arc::new(AtomicUsize::new(0));
                let counter = Arc::clone(&calls);
                let obs = Observable::<u32>::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });

                let subs: Vec<_> = (0..n).map(|_| obs.subscribe(|_| {}).unwrap()).collect();

                prop_assert_eq!(calls.load(Ordering::SeqCst), n);
                prop_assert_eq!(subs.len(), n);
            }

            #[test]
            fn repeated_unsubscribe_matches_single(repeats in 1usize..32) {
                let closes = Arc::new(AtomicUsize::new(0));
                let counter = Arc::clone(&closes);
                let obs = Observable::<u32>::new(move |_| {
                    let counter = Arc::clone(&counter);
                    move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                });

                let sub = obs.subscribe(|_| {}).unwrap();
                for _ in 0..repeats {
                    prop_assert!(sub.unsubscribe().is_ok());
                }

                prop_assert_eq!(closes.load(Ordering::SeqCst), 1);
            }
        }
    }
}
