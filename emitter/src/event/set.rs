//! Per-event subscriber storage.
//!
//! This module provides [`SubscriberSet`], the collection of callbacks registered
//! for a single event. Each event key that has ever been subscribed to gets one set
//! inside the [`TypedEventEmitter`](super::TypedEventEmitter).
//!
//! # Set Semantics
//!
//! A set holds each [`SubscriberId`] at most once. Inserting a subscriber that is
//! already present leaves the set unchanged, so it is still called once per emit.
//!
//! # Delivery Order
//!
//! Subscribers are kept in insertion order and [`deliver()`](SubscriberSet::deliver)
//! walks them front to back. The order is stable for a given set but is not part of
//! the emitter's contract; callers should not depend on it.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut set = SubscriberSet::<(u32,)>::new();
//!
//! set.insert(Subscriber::new(|n: u32| println!("{n}")));
//! set.deliver("count", (3,))?;
//! ```

use std::any::Any;

use crate::{
    error::{BoxError, EmitError},
    event::{Subscriber, SubscriberId},
};

/// Ordered set of subscribers for one event payload type.
///
/// # Thread Safety
///
/// `SubscriberSet` does no locking of its own. Insertion and removal need
/// `&mut self`, delivery only `&self`, so the borrow checker keeps the set from
/// changing while a delivery is running.
pub struct SubscriberSet<Args> {
    /// Registered subscribers, in insertion order, without duplicate ids.
    subscribers: Vec<Subscriber<Args>>,
}

impl<Args: Clone + 'static> SubscriberSet<Args> {
    /// Creates a new, empty subscriber set.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty set with room for `capacity` subscribers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::with_capacity(capacity),
        }
    }

    /// Add a subscriber.
    ///
    /// Returns `false` and leaves the set untouched if a subscriber with the same
    /// id is already present.
    pub fn insert(&mut self, subscriber: Subscriber<Args>) -> bool {
        if self.contains(subscriber.id()) {
            return false;
        }
        self.subscribers.push(subscriber);
        true
    }

    /// Remove the subscriber with the given id.
    ///
    /// Returns `true` if it was present. The relative order of the remaining
    /// subscribers is preserved.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        match self.subscribers.iter().position(|s| s.id() == id) {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if a subscriber with this id is present.
    #[inline]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.iter().any(|s| s.id() == id)
    }

    /// Returns the number of subscribers.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if the set has no subscribers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Iterate the ids of all subscribers in delivery order.
    pub fn ids(&self) -> impl Iterator<Item = SubscriberId> + '_ {
        self.subscribers.iter().map(Subscriber::id)
    }

    /// Remove every subscriber.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    /// Call every subscriber with `args`, stopping at the first failure.
    ///
    /// Each subscriber but the last gets a clone of `args`; the last one gets the
    /// original. If a subscriber returns an error, the subscribers after it are
    /// skipped and the error is returned tagged with `event` and the failing
    /// position. Panics are not caught.
    pub fn deliver(&self, event: &'static str, args: Args) -> Result<(), EmitError> {
        let Some((last, rest)) = self.subscribers.split_last() else {
            return Ok(());
        };

        let fail = |position: usize, source: BoxError| EmitError::Subscriber {
            event,
            position,
            source,
        };

        for (position, subscriber) in rest.iter().enumerate() {
            subscriber
                .call(args.clone())
                .map_err(|source| fail(position, source))?;
        }
        last.call(args).map_err(|source| fail(rest.len(), source))
    }
}

impl<Args: Clone + 'static> Default for SubscriberSet<Args> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased interface for subscriber sets.
///
/// This trait lets the emitter store sets for different payload types in one map
/// and still answer questions that don't need the payload type, such as how many
/// subscribers an event has. [`as_any()`](Self::as_any) and
/// [`as_any_mut()`](Self::as_any_mut) downcast back to the concrete
/// `SubscriberSet<Args>`.
pub(crate) trait ErasedSet: Send + Sync {
    /// Name of the event this set belongs to.
    fn event_name(&self) -> &'static str;

    /// Returns the number of subscribers.
    fn subscriber_count(&self) -> usize;

    /// Remove every subscriber.
    fn clear(&mut self);

    /// Returns a reference to the set as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to the set as `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A subscriber set together with the name of the event it serves.
pub(crate) struct NamedSet<Args> {
    pub(crate) name: &'static str,
    pub(crate) set: SubscriberSet<Args>,
}

impl<Args: Clone + Send + Sync + 'static> ErasedSet for NamedSet<Args> {
    fn event_name(&self) -> &'static str {
        self.name
    }

    fn subscriber_count(&self) -> usize {
        self.set.len()
    }

    fn clear(&mut self) {
        self.set.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
