//! Typed, synchronous publish/subscribe keyed by event.
//!
//! This module provides [`TypedEventEmitter`], which owns one
//! [`SubscriberSet`] per event key and delivers payloads to them inline.
//!
//! # Overview
//!
//! - **Type-checked keys**: only keys implementing [`Event<M>`](super::Event) for the
//!   emitter's map are accepted; anything else fails to compile.
//! - **Type-checked callbacks**: a subscriber must take exactly the event's payload
//!   as positional arguments.
//! - **Lazy entries**: an event gets its set on first subscription. Emitting an
//!   event nobody subscribed to does nothing and creates nothing.
//! - **Fail-fast delivery**: the first subscriber that returns an error ends the
//!   emit; later subscribers are not called and the error is returned.
//!
//! # Type Erasure
//!
//! Internally, sets are stored as `Box<dyn ErasedSet>` keyed by the event key's
//! `TypeId`. Generic accessors downcast back to the concrete set for the key's
//! payload type.
//!
//! # Concurrency
//!
//! `emit` takes `&self` and everything that changes subscriptions takes
//! `&mut self`, so subscriptions cannot change while an emit is delivering. The
//! emitter is `Send + Sync` but does no locking: to subscribe from several threads,
//! put it behind a lock you own. A subscriber must not try to take that same lock.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut emitter = TypedEventEmitter::<Events>::new();
//!
//! emitter.subscribe(Foo, |num: u32, text: String| println!("foo: {num} {text}"));
//! emitter.subscribe(Bar, |flag: bool| println!("bar: {flag}"));
//!
//! emitter.emit(Foo, (1, "hello".to_string()))?;
//! emit!(emitter, Bar, true)?;
//! ```

use std::{
    any::{Any, TypeId},
    collections::{HashMap, hash_map::Entry},
    fmt,
    marker::PhantomData,
};

use log::{debug, trace, warn};

use crate::{
    error::EmitError,
    event::{
        Event, EventMap, IntoSubscriber, Subscriber, SubscriberId, SubscriberSet,
        set::{ErasedSet, NamedSet},
    },
};

/// Publish/subscribe registry for the events declared in `M`.
///
/// See the [module documentation](self) for the delivery and concurrency model.
pub struct TypedEventEmitter<M: EventMap> {
    /// Type-erased subscriber sets, keyed by event key TypeId.
    sets: HashMap<TypeId, Box<dyn ErasedSet>>,
    map: PhantomData<fn() -> M>,
}

impl<M: EventMap> TypedEventEmitter<M> {
    /// Creates a new emitter with no subscribers.
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
            map: PhantomData,
        }
    }

    /// Creates an emitter with room for `events` distinct event keys before it
    /// reallocates.
    pub fn with_capacity(events: usize) -> Self {
        Self {
            sets: HashMap::with_capacity(events),
            map: PhantomData,
        }
    }

    /// Subscribe a callback to `event`.
    ///
    /// The callback is a function or closure taking the event's payload as
    /// positional arguments and returning `()` or a `Result`, or a [`Subscriber`]
    /// handle built from one. Subscribing a callback that is already subscribed to
    /// the event does nothing: it will still be called once per emit.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// fn on_bar(flag: bool) { println!("bar: {flag}"); }
    ///
    /// emitter.subscribe(Bar, on_bar);
    /// emitter.subscribe(Bar, on_bar); // already subscribed
    /// ```
    ///
    /// Capturing closures have no identity of their own. Passing the same
    /// closure value twice, even a `Copy` one, subscribes it twice. Wrap it in a
    /// [`Subscriber`] and pass `&handle` to subscribe it once.
    pub fn subscribe<E, Marker>(
        &mut self,
        _event: E,
        callback: impl IntoSubscriber<E::Payload, Marker>,
    ) where
        E: Event<M>,
    {
        let subscriber = callback.into_subscriber();
        let id = subscriber.id();
        if self.set_or_insert::<E>().insert(subscriber) {
            debug!("TypedEventEmitter::subscribe: event={} id={:?}", E::NAME, id);
        } else {
            debug!(
                "TypedEventEmitter::subscribe: event={} id={:?} already subscribed",
                E::NAME,
                id
            );
        }
    }

    /// Emit `event`, calling each of its subscribers with `payload`.
    ///
    /// Subscribers run synchronously on the calling thread before `emit` returns.
    /// Emitting an event with no subscribers is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Subscriber`] if a subscriber returns an error. The
    /// subscribers after it are not called. A panicking subscriber unwinds through
    /// `emit` and likewise ends delivery.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// emitter.emit(Foo, (1, "hello".to_string()))?;
    /// ```
    pub fn emit<E>(&self, _event: E, payload: E::Payload) -> Result<(), EmitError>
    where
        E: Event<M>,
    {
        let Some(set) = self.set::<E>() else {
            trace!("TypedEventEmitter::emit: event={} has no subscribers", E::NAME);
            return Ok(());
        };
        trace!(
            "TypedEventEmitter::emit: event={} subscribers={}",
            E::NAME,
            set.len()
        );
        set.deliver(E::NAME, payload).inspect_err(|err| {
            warn!("TypedEventEmitter::emit: {err}");
        })
    }

    /// Remove a subscriber handle from `event`.
    ///
    /// Returns `true` if it was subscribed.
    pub fn unsubscribe<E>(&mut self, event: E, subscriber: &Subscriber<E::Payload>) -> bool
    where
        E: Event<M>,
    {
        self.unsubscribe_id(event, subscriber.id())
    }

    /// Remove the subscriber with identity `id` from `event`.
    ///
    /// Returns `true` if it was subscribed. The event keeps its (possibly empty)
    /// entry.
    pub fn unsubscribe_id<E>(&mut self, _event: E, id: SubscriberId) -> bool
    where
        E: Event<M>,
    {
        let removed = self.set_mut::<E>().is_some_and(|set| set.remove(id));
        debug!(
            "TypedEventEmitter::unsubscribe: event={} id={:?} removed={}",
            E::NAME,
            id,
            removed
        );
        removed
    }

    /// Returns `true` if a subscriber with identity `id` is subscribed to `event`.
    pub fn is_subscribed<E>(&self, _event: E, id: SubscriberId) -> bool
    where
        E: Event<M>,
    {
        self.set::<E>().is_some_and(|set| set.contains(id))
    }

    /// Returns the number of subscribers of `event`.
    pub fn subscriber_count<E>(&self, _event: E) -> usize
    where
        E: Event<M>,
    {
        self.set::<E>().map_or(0, SubscriberSet::len)
    }

    /// Returns `true` if `event` has at least one subscriber.
    #[inline]
    pub fn has_subscribers<E>(&self, event: E) -> bool
    where
        E: Event<M>,
    {
        self.subscriber_count(event) > 0
    }

    /// Remove every subscriber of `event`.
    pub fn clear<E>(&mut self, _event: E)
    where
        E: Event<M>,
    {
        if let Some(set) = self.set_mut::<E>() {
            debug!(
                "TypedEventEmitter::clear: event={} removed={}",
                E::NAME,
                set.len()
            );
            set.clear();
        }
    }

    /// Remove every subscriber of every event.
    pub fn clear_all(&mut self) {
        debug!("TypedEventEmitter::clear_all: events={}", self.sets.len());
        for set in self.sets.values_mut() {
            set.clear();
        }
    }

    /// Names of the events that have an entry, in no particular order.
    ///
    /// An event gets an entry on its first subscription and keeps it after its
    /// subscribers are removed.
    pub fn event_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sets.values().map(|set| set.event_name())
    }

    /// Returns the number of events that have an entry.
    #[inline]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if no event has ever been subscribed to.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Returns the set for `E`, if one exists.
    fn set<E: Event<M>>(&self) -> Option<&SubscriberSet<E::Payload>> {
        let erased = self.sets.get(&TypeId::of::<E>())?;
        Some(&Self::downcast::<E>(erased.as_any()).set)
    }

    /// Returns the set for `E` mutably, if one exists.
    fn set_mut<E: Event<M>>(&mut self) -> Option<&mut SubscriberSet<E::Payload>> {
        let erased = self.sets.get_mut(&TypeId::of::<E>())?;
        Some(&mut Self::downcast_mut::<E>(erased.as_any_mut()).set)
    }

    /// Returns the set for `E`, creating it if needed.
    fn set_or_insert<E: Event<M>>(&mut self) -> &mut SubscriberSet<E::Payload> {
        let erased = match self.sets.entry(TypeId::of::<E>()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                trace!("TypedEventEmitter: creating subscriber set for event={}", E::NAME);
                vacant.insert(Box::new(NamedSet {
                    name: E::NAME,
                    set: SubscriberSet::<E::Payload>::new(),
                }))
            }
        };
        &mut Self::downcast_mut::<E>(erased.as_any_mut()).set
    }

    fn downcast<E: Event<M>>(erased: &dyn Any) -> &NamedSet<E::Payload> {
        match erased.downcast_ref::<NamedSet<E::Payload>>() {
            Some(named) => named,
            None => panic!(
                "subscriber set for event '{}' does not hold payload {}",
                E::NAME,
                std::any::type_name::<E::Payload>()
            ),
        }
    }

    fn downcast_mut<E: Event<M>>(erased: &mut dyn Any) -> &mut NamedSet<E::Payload> {
        match erased.downcast_mut::<NamedSet<E::Payload>>() {
            Some(named) => named,
            None => panic!(
                "subscriber set for event '{}' does not hold payload {}",
                E::NAME,
                std::any::type_name::<E::Payload>()
            ),
        }
    }
}

impl<M: EventMap> Default for TypedEventEmitter<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: EventMap> fmt::Debug for TypedEventEmitter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for set in self.sets.values() {
            map.entry(&set.event_name(), &set.subscriber_count());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{BoxError, emit};

    #[derive(crate::EventMap)]
    struct Events;

    #[derive(crate::Event)]
    #[event(map = Events, payload = (u32, String))]
    struct Foo;

    #[derive(crate::Event)]
    #[event(map = Events, payload = (bool))]
    struct Bar;

    #[derive(crate::Event)]
    #[event(map = Events, payload = ())]
    struct Tick;

    type Calls = Arc<Mutex<Vec<String>>>;

    fn record_foo(calls: &Calls, tag: &'static str) -> impl Fn(u32, String) + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |num: u32, text: String| calls.lock().unwrap().push(format!("{tag}({num}, {text})"))
    }

    fn record_bar(calls: &Calls, tag: &'static str) -> impl Fn(bool) + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |flag: bool| calls.lock().unwrap().push(format!("{tag}({flag})"))
    }

    static BAR_HITS: AtomicUsize = AtomicUsize::new(0);

    fn count_bar(_flag: bool) {
        BAR_HITS.fetch_add(1, Ordering::SeqCst);
    }

    // ==================== Construction ====================

    #[test]
    fn new_creates_empty_emitter() {
        let emitter = TypedEventEmitter::<Events>::new();

        assert!(emitter.is_empty());
        assert_eq!(emitter.subscriber_count(Foo), 0);
        assert!(!emitter.has_subscribers(Bar));
    }

    #[test]
    fn with_capacity_creates_empty_emitter() {
        let emitter = TypedEventEmitter::<Events>::with_capacity(8);

        assert_eq!(emitter.len(), 0);
    }

    // ==================== Subscribe ====================

    #[test]
    fn subscribe_creates_entry_lazily() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();

        emitter.subscribe(Foo, record_foo(&calls, "f1"));

        assert_eq!(emitter.len(), 1);
        assert_eq!(emitter.event_names().collect::<Vec<_>>(), vec!["foo"]);
        assert_eq!(emitter.subscriber_count(Foo), 1);
        assert_eq!(emitter.subscriber_count(Bar), 0);
    }

    #[test]
    fn subscribe_same_handle_twice_delivers_once() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        let b1 = Subscriber::new(record_bar(&calls, "b1"));

        emitter.subscribe(Bar, b1.clone());
        emitter.subscribe(Bar, &b1);
        emitter.emit(Bar, (false,)).unwrap();

        assert_eq!(emitter.subscriber_count(Bar), 1);
        assert_eq!(*calls.lock().unwrap(), vec!["b1(false)"]);
    }

    #[test]
    fn subscribe_same_fn_item_twice_delivers_once() {
        let mut emitter = TypedEventEmitter::<Events>::new();
        let before = BAR_HITS.load(Ordering::SeqCst);

        emitter.subscribe(Bar, count_bar);
        emitter.subscribe(Bar, count_bar);
        emitter.emit(Bar, (false,)).unwrap();

        assert_eq!(emitter.subscriber_count(Bar), 1);
        assert_eq!(BAR_HITS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn copy_closure_wrapped_in_handle_delivers_once() {
        let hits = AtomicUsize::new(0);
        let hits: &'static AtomicUsize = Box::leak(Box::new(hits));
        let on_bar = move |_flag: bool| {
            hits.fetch_add(1, Ordering::SeqCst);
        };
        let handle = Subscriber::new(on_bar);
        let mut emitter = TypedEventEmitter::<Events>::new();

        emitter.subscribe(Bar, &handle);
        emitter.subscribe(Bar, &handle);
        emitter.emit(Bar, (true,)).unwrap();

        assert_eq!(emitter.subscriber_count(Bar), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn one_handle_can_serve_several_emitters() {
        let calls = Calls::default();
        let mut first = TypedEventEmitter::<Events>::new();
        let mut second = TypedEventEmitter::<Events>::new();
        let b1 = Subscriber::new(record_bar(&calls, "b1"));

        first.subscribe(Bar, &b1);
        second.subscribe(Bar, &b1);
        first.emit(Bar, (true,)).unwrap();
        second.emit(Bar, (false,)).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["b1(true)", "b1(false)"]);
    }

    // ==================== Emit ====================

    #[test]
    fn emit_without_subscribers_is_noop() {
        let emitter = TypedEventEmitter::<Events>::new();

        assert!(emitter.emit(Foo, (1, "hello".to_string())).is_ok());
        assert!(emitter.emit(Tick, ()).is_ok());

        assert!(emitter.is_empty());
    }

    #[test]
    fn emit_delivers_payload_positionally() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Foo, move |num: u32, text: String| {
            *sink.lock().unwrap() = Some((num, text));
        });

        emitter.emit(Foo, (42, "answer".to_string())).unwrap();

        assert_eq!(*seen.lock().unwrap(), Some((42, "answer".to_string())));
    }

    #[test]
    fn emit_only_reaches_subscribers_of_that_event() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Foo, record_foo(&calls, "f1"));
        emitter.subscribe(Bar, record_bar(&calls, "b1"));

        emitter.emit(Bar, (true,)).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["b1(true)"]);
    }

    #[test]
    fn emit_zero_arity_event() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Tick, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emit!(emitter, Tick).unwrap();
        emit!(emitter, Tick).unwrap();

        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn emit_macro_builds_payload_tuple() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Foo, record_foo(&calls, "f1"));
        emitter.subscribe(Foo, record_foo(&calls, "f2"));
        emitter.subscribe(Bar, record_bar(&calls, "b1"));

        emit!(emitter, Foo, 1, "hello".to_string()).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["f1(1, hello)", "f2(1, hello)"]);

        emit!(emitter, Bar, true).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["f1(1, hello)", "f2(1, hello)", "b1(true)"]
        );
    }

    // ==================== Failure ====================

    #[test]
    fn emit_fails_fast_on_subscriber_error() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Bar, |_flag: bool| -> Result<(), BoxError> {
            Err("s1 refused".into())
        });
        emitter.subscribe(Bar, record_bar(&calls, "s2"));

        let err = emitter.emit(Bar, (true,)).unwrap_err();

        assert!(calls.lock().unwrap().is_empty());
        assert!(matches!(
            err,
            EmitError::Subscriber {
                event: "bar",
                position: 0,
                ..
            }
        ));
    }

    #[test]
    fn emit_after_failure_delivers_again() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Bar, |flag: bool| -> Result<(), &'static str> {
            if flag { Err("no") } else { Ok(()) }
        });
        emitter.subscribe(Bar, record_bar(&calls, "s2"));

        assert!(emitter.emit(Bar, (true,)).is_err());
        assert!(emitter.emit(Bar, (false,)).is_ok());

        assert_eq!(*calls.lock().unwrap(), vec!["s2(false)"]);
    }

    #[test]
    #[should_panic(expected = "s1 panicked")]
    fn emit_propagates_subscriber_panic() {
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Bar, |flag: bool| {
            if flag {
                panic!("s1 panicked");
            }
        });
        emitter.subscribe(Bar, |_flag: bool| -> Result<(), BoxError> {
            unreachable!("s2 must not run")
        });

        let _ = emitter.emit(Bar, (true,));
    }

    // ==================== Unsubscribe ====================

    #[test]
    fn unsubscribe_removes_handle() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        let b1 = Subscriber::new(record_bar(&calls, "b1"));
        let b2 = Subscriber::new(record_bar(&calls, "b2"));
        emitter.subscribe(Bar, &b1);
        emitter.subscribe(Bar, &b2);

        assert!(emitter.unsubscribe(Bar, &b1));
        assert!(!emitter.unsubscribe(Bar, &b1));
        emitter.emit(Bar, (true,)).unwrap();

        assert!(!emitter.is_subscribed(Bar, b1.id()));
        assert!(emitter.is_subscribed(Bar, b2.id()));
        assert_eq!(*calls.lock().unwrap(), vec!["b2(true)"]);
    }

    #[test]
    fn unsubscribe_unknown_event_returns_false() {
        let mut emitter = TypedEventEmitter::<Events>::new();
        let handle = Subscriber::new(count_bar);

        assert!(!emitter.unsubscribe(Bar, &handle));
        assert!(emitter.is_empty());
    }

    #[test]
    fn unsubscribe_fn_item_by_id() {
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Bar, count_bar);
        let id = Subscriber::new(count_bar).id();

        assert!(emitter.unsubscribe_id(Bar, id));

        assert!(!emitter.has_subscribers(Bar));
        assert_eq!(emitter.len(), 1);
    }

    #[test]
    fn stale_id_does_not_match_later_subscriber() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        let first = Subscriber::new(record_bar(&calls, "b1"));
        emitter.subscribe(Bar, &first);
        let stale = first.id();
        assert!(emitter.unsubscribe(Bar, &first));
        drop(first);

        emitter.subscribe(Bar, Subscriber::new(record_bar(&calls, "b2")));

        assert!(!emitter.is_subscribed(Bar, stale));
        assert!(!emitter.unsubscribe_id(Bar, stale));
        emitter.emit(Bar, (true,)).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["b2(true)"]);
    }

    #[test]
    fn unsubscribe_is_scoped_to_event() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        let f1 = Subscriber::new(record_foo(&calls, "f1"));
        emitter.subscribe(Foo, &f1);

        assert!(!emitter.unsubscribe_id(Bar, f1.id()));
        assert!(emitter.is_subscribed(Foo, f1.id()));
    }

    // ==================== Clear ====================

    #[test]
    fn clear_removes_one_event() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Foo, record_foo(&calls, "f1"));
        emitter.subscribe(Bar, record_bar(&calls, "b1"));

        emitter.clear(Foo);

        assert_eq!(emitter.subscriber_count(Foo), 0);
        assert_eq!(emitter.subscriber_count(Bar), 1);
    }

    #[test]
    fn clear_all_keeps_entries() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Foo, record_foo(&calls, "f1"));
        emitter.subscribe(Bar, record_bar(&calls, "b1"));

        emitter.clear_all();
        emit!(emitter, Foo, 1, "hello".to_string()).unwrap();

        assert_eq!(emitter.len(), 2);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn debug_lists_events_with_counts() {
        let calls = Calls::default();
        let mut emitter = TypedEventEmitter::<Events>::new();
        emitter.subscribe(Foo, record_foo(&calls, "f1"));
        emitter.subscribe(Foo, record_foo(&calls, "f2"));

        assert_eq!(format!("{emitter:?}"), r#"{"foo": 2}"#);
    }

    // ==================== Threads ====================

    #[test]
    fn emitter_can_be_shared_behind_a_lock() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypedEventEmitter<Events>>();

        let hits = Arc::new(AtomicUsize::new(0));
        let emitter = Arc::new(Mutex::new(TypedEventEmitter::<Events>::new()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let emitter = Arc::clone(&emitter);
                let hits = Arc::clone(&hits);
                std::thread::spawn(move || {
                    emitter.lock().unwrap().subscribe(Bar, move |_flag: bool| {
                        hits.fetch_add(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        emitter.lock().unwrap().emit(Bar, (true,)).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
