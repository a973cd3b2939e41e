mod event;
mod event_map;

use proc_macro::TokenStream;

/// Declare an event key for one or more event maps.
///
/// ```rust,ignore
/// #[derive(Event)]
/// #[event(map = Events, payload = (u32, String))]
/// struct Foo;
///
/// #[derive(Event)]
/// #[event(map = Events, name = "bar:toggled", payload = (bool))]
/// struct Bar;
/// ```
///
/// - `map` (required): the event map type the key belongs to.
/// - `payload` (required): the argument tuple. `(T)` and a bare `T` mean `(T,)`.
/// - `name` (optional): the event name. Defaults to the key in snake_case.
///
/// Repeat the attribute to declare the key in several maps.
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(item: TokenStream) -> TokenStream {
    event::derive_event(item)
}

#[proc_macro_derive(EventMap)]
pub fn derive_event_map(item: TokenStream) -> TokenStream {
    event_map::derive_event_map(item)
}
