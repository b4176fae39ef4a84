//! Procedural macros for Docket endpoints.
//!
//! The `#[endpoint]` attribute turns an async handler function into an
//! [`Endpoint`] whose documentation block is the function's own `///`
//! comments, so the contract lives next to the code it describes.
//!
//! # Example
//!
//! ```rust,ignore
//! use docket::prelude::*;
//!
//! /// Get a user.
//! ///
//! /// :param Int * user_id: the user
//! /// :raise id_not_exist: Record does not exist.
//! #[docket::endpoint(name = "user.get")]
//! async fn get_user(params: Params) -> HandlerResult {
//!     Ok(Reply::success().data(json!({ "id": params.int("user_id") })))
//! }
//!
//! let endpoint = get_user_endpoint();
//! ```
//!
//! [`Endpoint`]: https://docs.rs/docket-core/latest/docket_core/struct.Endpoint.html

mod endpoint;
mod parse;

use proc_macro::TokenStream;

/// Marks an async function as a Docket endpoint.
///
/// Generates `<fn>_endpoint() -> Endpoint` next to the function, carrying the
/// function's doc comments as its documentation block. The function takes
/// zero arguments or one argument built from the request with `From<Request>`
/// (`Params` or `Request` itself) and returns `HandlerResult`.
///
/// # Attributes
///
/// - `name`: endpoint name (optional, defaults to the function name)
/// - `core`: path to the `docket-core` crate (optional, defaults to
///   `::docket::core`)
#[proc_macro_attribute]
pub fn endpoint(attr: TokenStream, item: TokenStream) -> TokenStream {
    endpoint::expand_endpoint(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
