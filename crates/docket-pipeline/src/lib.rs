//! # Docket Pipeline
//!
//! Enforces a compiled [`Contract`](docket_element::Contract) at request time.
//!
//! A [`Pipeline`] binds a contract to its handler. Each dispatch runs the
//! contract's plugins as an around-chain, validates parameters with
//! [`validate`], calls the handler and renders the resulting envelope with
//! the contract's response type.
//!
//! ## Response codes
//!
//! | Situation | Code |
//! |-----------|------|
//! | required parameter absent or `null` | `param_missing` |
//! | value fails its type | the type's code (`int_invalid`, `list_invalid`, ...) |
//! | undeclared parameter | `param_unknown` |
//! | handler error, panic or undeclared reply code | `exception` |
//! | plugin short-circuit | the plugin's code |

#![doc(html_root_url = "https://docs.rs/docket-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod pipeline;
mod validation;

pub use pipeline::Pipeline;
pub use validation::{validate, Rejection};
