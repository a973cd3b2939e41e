//! Walkthrough of the emitter with two events.
//!
//! This example shows:
//! - Declaring an event map and its events with the derives
//! - Subscribing functions, closures and shared handles
//! - Duplicate subscriptions being ignored
//! - A failing subscriber stopping delivery
//!
//! Run with `RUST_LOG=trace cargo run --example foo_bar` to see the emitter's log.

use log::info;
use typed_emitter::{BoxError, EmitError, Event, EventMap, Subscriber, TypedEventEmitter, emit};

// ============================================================================
// Events
// ============================================================================

#[derive(EventMap)]
struct Events;

#[derive(Event)]
#[event(map = Events, payload = (u32, String))]
struct Foo;

#[derive(Event)]
#[event(map = Events, payload = (bool))]
struct Bar;

// ============================================================================
// Subscribers
// ============================================================================

fn describe_foo(num: u32, text: String) {
    info!("foo is emitted with: {num} ({}) and {text:?}", std::any::type_name_of_val(&num));
}

fn reject_false(flag: bool) -> Result<(), BoxError> {
    if flag {
        Ok(())
    } else {
        Err("bar must be true".into())
    }
}

fn main() -> Result<(), EmitError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut emitter = TypedEventEmitter::<Events>::new();

    emitter.subscribe(Foo, describe_foo);
    emitter.subscribe(Foo, |num: u32, text: String| {
        info!("foo again: {}", text.repeat(num as usize));
    });

    let on_bar = Subscriber::new(|flag: bool| info!("bar is emitted with: {flag}"));
    emitter.subscribe(Bar, &on_bar);
    emitter.subscribe(Bar, &on_bar);
    info!("bar has {} subscriber(s)", emitter.subscriber_count(Bar));

    emit!(emitter, Foo, 1, "hello".to_string())?;
    emit!(emitter, Bar, true)?;

    emitter.subscribe(Bar, reject_false);
    if let Err(err) = emit!(emitter, Bar, false) {
        info!("delivery stopped: {err}");
    }

    emitter.unsubscribe(Bar, &on_bar);
    info!("emitter: {emitter:?}");

    Ok(())
}
