use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, LitStr, Path, Type, parse_macro_input, parse_quote};

pub fn derive_event(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    expand(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Arguments of one `#[event(..)]` attribute.
struct EventArgs {
    map: Path,
    payload: Type,
    name: Option<LitStr>,
}

fn expand(ast: &DeriveInput) -> syn::Result<TokenStream2> {
    let key = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let declarations = ast
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("event"))
        .map(|attr| parse_args(key, attr))
        .collect::<syn::Result<Vec<_>>>()?;

    if declarations.is_empty() {
        return Err(syn::Error::new_spanned(
            key,
            "#[derive(Event)] needs an #[event(map = .., payload = ..)] attribute",
        ));
    }

    let default_name = snake_case(&key.to_string());
    let impls = declarations.into_iter().map(|args| {
        let EventArgs { map, payload, name } = args;
        let name = name.map_or_else(|| default_name.clone(), |lit| lit.value());
        quote! {
            impl #impl_generics ::typed_emitter::Event<#map> for #key #ty_generics #where_clause {
                type Payload = #payload;
                const NAME: &'static str = #name;
            }
        }
    });

    Ok(quote! { #(#impls)* })
}

fn parse_args(key: &Ident, attr: &Attribute) -> syn::Result<EventArgs> {
    let mut map = None;
    let mut payload = None;
    let mut name = None;

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("map") {
            map = Some(meta.value()?.parse::<Path>()?);
        } else if meta.path.is_ident("payload") {
            payload = Some(payload_tuple(meta.value()?.parse::<Type>()?));
        } else if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse::<LitStr>()?);
        } else {
            return Err(meta.error(
                "unknown event argument, expected `map`, `payload` or `name`",
            ));
        }
        Ok(())
    })?;

    let missing = |arg: &str| syn::Error::new_spanned(attr, format!("event `{key}` is missing `{arg} = ..`"));
    let map = map.ok_or_else(|| missing("map"))?;
    let payload = payload.ok_or_else(|| missing("payload"))?;

    Ok(EventArgs { map, payload, name })
}

/// Payloads are always tuples: `(T)` and `T` both become `(T,)`.
fn payload_tuple(ty: Type) -> Type {
    match ty {
        Type::Tuple(_) => ty,
        Type::Paren(paren) => {
            let elem = paren.elem;
            parse_quote!((#elem,))
        }
        other => parse_quote!((#other,)),
    }
}

/// Convert a type name to snake_case: `ColorChanged` -> `color_changed`,
/// `HTTPRequest` -> `http_request`.
fn snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
