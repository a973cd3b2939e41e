//! Event declarations and the typed emitter built on them.
//!
//! An emitter is parameterized by an *event map*: a marker type naming a fixed set
//! of events. Each event is a key type implementing [`Event`] for that map, carrying
//! its string name and the tuple of arguments its subscribers take.
//!
//! # Example
//!
//! ```rust,ignore
//! use typed_emitter::{Event, EventMap, TypedEventEmitter};
//!
//! #[derive(EventMap)]
//! struct Events;
//!
//! #[derive(Event)]
//! #[event(map = Events, payload = (u32, String))]
//! struct Foo;
//!
//! #[derive(Event)]
//! #[event(map = Events, payload = (bool))]
//! struct Bar;
//!
//! let mut emitter = TypedEventEmitter::<Events>::new();
//! emitter.subscribe(Foo, |num: u32, text: String| println!("{num} {text}"));
//! emitter.emit(Foo, (1, "hello".to_string()))?;
//! ```

pub mod emitter;
pub mod set;
pub mod subscriber;

pub use emitter::TypedEventEmitter;
pub use set::SubscriberSet;
pub use subscriber::{Callback, IntoOutcome, IntoSubscriber, Subscriber, SubscriberId};

use crate::all_tuples;

/// Marker trait for the type that names a fixed set of events.
///
/// The map type is never instantiated; it only ties event keys to an emitter.
/// Use `#[derive(EventMap)]` or implement it by hand:
///
/// ```rust,ignore
/// struct Events;
/// impl EventMap for Events {}
/// ```
pub trait EventMap: 'static {}

/// An event key declared in the map `M`.
///
/// Implementing `Event<M>` for a key is what makes it valid for a
/// `TypedEventEmitter<M>`. The associated payload fixes, at compile time, the
/// arguments every subscriber takes and every `emit` passes.
///
/// A key type may be declared in several maps, each with its own payload.
pub trait Event<M: EventMap>: 'static {
    /// Positional arguments delivered to subscribers.
    type Payload: Payload;

    /// Name of the event, used in logs and errors.
    const NAME: &'static str;
}

/// A tuple of event arguments.
///
/// Implemented for `()` and for tuples of up to 26 elements whose members are
/// `Clone + Send + Sync + 'static`. Each subscriber receives its own copy of the
/// payload, which is why elements must be `Clone`.
pub trait Payload: Clone + Send + Sync + 'static {
    /// Number of positional arguments.
    const ARITY: usize;
}

impl Payload for () {
    const ARITY: usize = 0;
}

macro_rules! payload_impl {
    ($($param:ident),*) => {
        impl<$($param: Clone + Send + Sync + 'static),*> Payload for ($($param,)*) {
            const ARITY: usize = [$(stringify!($param)),*].len();
        }
    };
}

all_tuples!(payload_impl);
