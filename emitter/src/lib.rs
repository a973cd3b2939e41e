//! A typed, in-process event emitter.
//!
//! [`TypedEventEmitter`] maps event keys to sets of subscriber callbacks. Which keys
//! an emitter accepts, and the arguments each one carries, are fixed by an event
//! map at compile time: emitting an undeclared event or subscribing a callback with
//! the wrong parameters does not build.
//!
//! ```rust,ignore
//! use typed_emitter::{Event, EventMap, TypedEventEmitter, emit};
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
//! emitter.subscribe(Foo, |num: u32, text: String| println!("foo: {num} {text}"));
//! emitter.subscribe(Bar, |flag: bool| println!("bar: {flag}"));
//!
//! emit!(emitter, Foo, 1, "hello".to_string())?;
//! emit!(emitter, Bar, true)?;
//! ```

// Lets the derive macros refer to `::typed_emitter` from inside this crate too.
extern crate self as typed_emitter;

pub mod error;
pub mod event;
pub(crate) mod util;

pub use error::{BoxError, EmitError};
pub use event::{
    Event, EventMap, IntoSubscriber, Payload, Subscriber, SubscriberId, TypedEventEmitter,
};
pub use typed_emitter_macros::{Event, EventMap};
