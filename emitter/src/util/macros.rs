/// Implement another macro for tuples of types recursively.
#[macro_export]
macro_rules! for_every_tuple {
    ($m:ident !! $head_ty:ident) => {
        $m!($head_ty);
    };
    ($m:ident !! $head_ty:ident, $($tail_ty:ident),*) => (
        $m!($head_ty, $( $tail_ty ),*);
        $crate::for_every_tuple!($m !! $( $tail_ty ),*);
    );
}

/// Apply a macro to all tuple arities from A to Z.
#[macro_export]
macro_rules! all_tuples {
    ($m:ident) => {
        $crate::for_every_tuple!($m !! A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z);
    };
}

/// Emit an event with its payload written positionally.
///
/// Expands to [`TypedEventEmitter::emit`](crate::TypedEventEmitter::emit) with the
/// arguments collected into the payload tuple: `emit!(emitter, Foo, 1, "hi")` is
/// `emitter.emit(Foo, (1, "hi"))`.
///
/// ```rust,ignore
/// emit!(emitter, Bar, true)?;
/// emit!(emitter, Tick)?;
/// ```
#[macro_export]
macro_rules! emit {
    ($emitter:expr, $event:expr) => {
        $emitter.emit($event, ())
    };
    ($emitter:expr, $event:expr, $($arg:expr),+ $(,)?) => {
        $emitter.emit($event, ($($arg,)+))
    };
}
