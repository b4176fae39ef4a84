//! `#[endpoint]` expansion.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ItemFn;

use crate::parse::{EndpointAttrs, EndpointFn};

/// Expands the `#[endpoint]` attribute macro.
pub fn expand_endpoint(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let attrs: EndpointAttrs = syn::parse2(attr)?;
    let item_fn: ItemFn = syn::parse2(item)?;
    let endpoint = EndpointFn::parse(item_fn)?;

    Ok(generate(&attrs, &endpoint))
}

fn generate(attrs: &EndpointAttrs, endpoint: &EndpointFn) -> TokenStream {
    let fn_name = &endpoint.name;
    let vis = &endpoint.item.vis;
    let original_fn = &endpoint.item;
    let ctor_name = format_ident!("{}_endpoint", fn_name);
    let name = attrs.name.clone().unwrap_or_else(|| fn_name.to_string());
    let core = attrs
        .core
        .clone()
        .unwrap_or_else(|| syn::parse_quote!(::docket::core));

    let doc = if endpoint.doc.is_empty() {
        quote! { ::core::option::Option::None }
    } else {
        let text = endpoint.doc.join("\n");
        quote! { ::core::option::Option::Some(::std::string::String::from(#text)) }
    };

    let call = match &endpoint.arg {
        Some(ty) => quote! {
            #fn_name(<#ty as ::core::convert::From<#core::Request>>::from(request))
        },
        None => quote! {{
            let _ = request;
            #fn_name()
        }},
    };

    let ctor_doc = format!("Endpoint `{name}` bound to [`{fn_name}`].");

    quote! {
        #original_fn

        #[doc = #ctor_doc]
        #vis fn #ctor_name() -> #core::Endpoint {
            #core::Endpoint::new(
                #name,
                #doc,
                #core::FnHandler::new(|request: #core::Request| #call),
            )
        }
    }
}
