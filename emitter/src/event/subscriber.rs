//! Subscriber callbacks and their identity.
//!
//! This module provides [`Subscriber`], the type-erased handle the emitter stores
//! for every registered callback, and the traits that turn plain functions and
//! closures into one.
//!
//! # Positional Callbacks
//!
//! A callback for an event with payload `(u32, String)` is any
//! `Fn(u32, String) -> Out` where `Out` is `()` or a `Result`. The tuple is split
//! into positional arguments by [`Callback`], which is implemented for every arity
//! from 0 to 26 by the [`all_tuples!`](crate::all_tuples) macro.
//!
//! ```rust,ignore
//! fn on_foo(num: u32, text: String) { /* .. */ }
//!
//! emitter.subscribe(Foo, on_foo);
//! emitter.subscribe(Foo, |num: u32, text: String| -> Result<(), BoxError> {
//!     if num == 0 { return Err("zero".into()); }
//!     Ok(())
//! });
//! ```
//!
//! # Identity
//!
//! Subscriber sets hold each callback at most once. Identity is a [`SubscriberId`]:
//!
//! - A [`Subscriber`] handle gets a process-unique id when it is created, and
//!   all of its clones carry that id. Ids are never reused.
//! - A zero-sized callable, such as a `fn` item or a closure that captures
//!   nothing, is identified by its type. Every value of such a type behaves
//!   identically, so subscribing `on_foo` twice registers it once.
//!
//! Two separately written capturing closures are always distinct subscribers. To
//! subscribe the same closure twice, or to unsubscribe it later, wrap it in a
//! [`Subscriber`] and pass clones. This includes `Copy` closures: passing the
//! same capturing closure value twice subscribes two copies.

use std::{
    any::TypeId,
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{all_tuples, error::BoxError};

/// Conversion of a callback's return value into a delivery outcome.
///
/// Implemented for `()` (always succeeds) and for `Result<(), E>` where `E` can
/// be boxed into a [`BoxError`] (`String`, `&str` and every
/// `std::error::Error + Send + Sync` qualify).
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    #[inline]
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoOutcome for Result<(), E>
where
    E: Into<BoxError>,
{
    #[inline]
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// A function callable with the elements of the tuple `Args` as positional
/// arguments.
///
/// You don't implement this trait manually. It's implemented for every
/// `Fn(A, B, ..) -> Out + Send + Sync + 'static` with up to 26 parameters. The
/// `Out` parameter only exists so the return type can stay generic.
pub trait Callback<Args, Out>: Send + Sync + 'static {
    /// Call the function with the tuple spread into its parameters.
    fn call(&self, args: Args) -> Out;
}

impl<Func, Out> Callback<(), Out> for Func
where
    Func: Fn() -> Out + Send + Sync + 'static,
{
    #[inline]
    fn call(&self, _args: ()) -> Out {
        self()
    }
}

macro_rules! callback_impl {
    ($($param:ident),*) => {
        impl<Func, Out, $($param),*> Callback<($($param,)*), Out> for Func
        where
            Func: Fn($($param),*) -> Out + Send + Sync + 'static,
        {
            #[inline]
            #[allow(clippy::too_many_arguments, non_snake_case)]
            fn call(&self, args: ($($param,)*)) -> Out {
                let ($($param,)*) = args;
                self($($param),*)
            }
        }
    };
}

all_tuples!(callback_impl);

/// Identity of a subscriber within a subscriber set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberId {
    /// A shared callback, identified by a counter assigned on creation.
    Shared(u64),
    /// A zero-sized callable, identified by its type.
    Static(TypeId),
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

type ErasedFn<Args> = dyn Fn(Args) -> Result<(), BoxError> + Send + Sync;

/// A type-erased, cloneable subscriber for events with payload `Args`.
///
/// Cloning a `Subscriber` is cheap and keeps its identity, so a clone can be used
/// to subscribe the same callback to several events or to unsubscribe it later.
///
/// ```rust,ignore
/// let on_bar = Subscriber::new(|flag: bool| println!("bar: {flag}"));
///
/// emitter.subscribe(Bar, &on_bar);
/// emitter.subscribe(Bar, &on_bar); // no-op, already subscribed
/// emitter.unsubscribe(Bar, &on_bar);
/// ```
pub struct Subscriber<Args> {
    id: SubscriberId,
    callback: Arc<ErasedFn<Args>>,
}

impl<Args: 'static> Subscriber<Args> {
    /// Wrap a callback into a subscriber handle.
    pub fn new<Func, Out>(callback: Func) -> Self
    where
        Func: Callback<Args, Out>,
        Out: IntoOutcome + 'static,
    {
        let static_id = (size_of::<Func>() == 0).then(TypeId::of::<Func>);
        let callback: Arc<ErasedFn<Args>> =
            Arc::new(move |args: Args| callback.call(args).into_outcome());
        let id = match static_id {
            Some(type_id) => SubscriberId::Static(type_id),
            None => SubscriberId::Shared(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        };
        Self { id, callback }
    }

    /// The identity this subscriber is deduplicated by.
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the callback directly.
    #[inline]
    pub fn call(&self, args: Args) -> Result<(), BoxError> {
        (self.callback)(args)
    }
}

impl<Args> Clone for Subscriber<Args> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<Args> fmt::Debug for Subscriber<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Marker type for converting an existing [`Subscriber`] handle.
pub struct HandleMarker;

/// Marker type for converting a function or closure returning `Out`.
pub struct FunctionMarker<Out>(PhantomData<fn() -> Out>);

/// Conversion into a [`Subscriber`] for payload `Args`.
///
/// This is what [`TypedEventEmitter::subscribe`](crate::TypedEventEmitter::subscribe)
/// accepts. The `Marker` parameter keeps the handle and function implementations
/// apart and is always inferred.
///
/// Closures need their parameter types written out, since the expected signature
/// is only known through this trait: `|num: u32, text: String| ..`.
pub trait IntoSubscriber<Args, Marker> {
    fn into_subscriber(self) -> Subscriber<Args>;
}

impl<Args> IntoSubscriber<Args, HandleMarker> for Subscriber<Args> {
    #[inline]
    fn into_subscriber(self) -> Subscriber<Args> {
        self
    }
}

impl<Args> IntoSubscriber<Args, HandleMarker> for &Subscriber<Args> {
    #[inline]
    fn into_subscriber(self) -> Subscriber<Args> {
        self.clone()
    }
}

impl<Args, Func, Out> IntoSubscriber<Args, FunctionMarker<Out>> for Func
where
    Args: 'static,
    Func: Callback<Args, Out>,
    Out: IntoOutcome + 'static,
{
    #[inline]
    fn into_subscriber(self) -> Subscriber<Args> {
        Subscriber::new(self)
    }
}
