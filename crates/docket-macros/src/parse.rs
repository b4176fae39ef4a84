//! Parsing for endpoint attributes and function signatures.

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprLit, FnArg, Ident, ItemFn, Lit, Meta, Path, Token, Type,
};

/// Parsed `#[endpoint(...)]` attributes.
#[derive(Debug, Default)]
pub struct EndpointAttrs {
    /// Endpoint name override.
    pub name: Option<String>,
    /// Path to the core crate.
    pub core: Option<Path>,
}

impl Parse for EndpointAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = Self::default();
        let meta_list: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in meta_list {
            let Meta::NameValue(nv) = meta else {
                return Err(syn::Error::new(meta.span(), "expected name = value"));
            };
            let ident = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                .to_string();
            let value = match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => s.clone(),
                _ => return Err(syn::Error::new(nv.value.span(), "expected string literal")),
            };

            match ident.as_str() {
                "name" => {
                    if value.value().trim().is_empty() {
                        return Err(syn::Error::new(value.span(), "endpoint name must not be empty"));
                    }
                    attrs.name = Some(value.value());
                }
                "core" => attrs.core = Some(value.parse()?),
                _ => {
                    return Err(syn::Error::new(
                        nv.path.span(),
                        format!("unknown attribute: {ident}"),
                    ))
                }
            }
        }

        Ok(attrs)
    }
}

/// Parsed endpoint function.
#[derive(Debug)]
pub struct EndpointFn {
    /// The function name.
    pub name: Ident,
    /// Type of the single argument, if any.
    pub arg: Option<Type>,
    /// Documentation lines, with the leading space rustdoc adds removed.
    pub doc: Vec<String>,
    /// The original function item.
    pub item: ItemFn,
}

impl EndpointFn {
    /// Parses and checks an `ItemFn`.
    pub fn parse(item: ItemFn) -> syn::Result<Self> {
        if item.sig.asyncness.is_none() {
            return Err(syn::Error::new(
                item.sig.fn_token.span,
                "endpoints must be async functions",
            ));
        }
        if !item.sig.generics.params.is_empty() {
            return Err(syn::Error::new(
                item.sig.generics.span(),
                "endpoints cannot be generic",
            ));
        }
        if matches!(item.sig.output, syn::ReturnType::Default) {
            return Err(syn::Error::new(
                item.sig.fn_token.span,
                "endpoints must return HandlerResult",
            ));
        }

        let mut inputs = item.sig.inputs.iter();
        let arg = match inputs.next() {
            None => None,
            Some(FnArg::Typed(pat)) => Some((*pat.ty).clone()),
            Some(receiver @ FnArg::Receiver(_)) => {
                return Err(syn::Error::new(
                    receiver.span(),
                    "endpoints cannot have a self parameter",
                ))
            }
        };
        if let Some(extra) = inputs.next() {
            return Err(syn::Error::new(
                extra.span(),
                "endpoints take at most one argument",
            ));
        }

        Ok(Self {
            name: item.sig.ident.clone(),
            arg,
            doc: doc_lines(&item.attrs),
            item,
        })
    }
}

/// Collects `#[doc = "..."]` attributes in order.
fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|chunk| {
            chunk
                .split('\n')
                .map(|line| line.strip_prefix(' ').unwrap_or(line).to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}
