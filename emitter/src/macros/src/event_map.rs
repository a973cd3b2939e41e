use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_event_map(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let map_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // `::typed_emitter` resolves inside the crate through `extern crate self as typed_emitter;`.
    TokenStream::from(quote! {
        impl #impl_generics ::typed_emitter::EventMap for #map_name #ty_generics #where_clause {
        }
    })
}
