//! # Docket Element
//!
//! Compiles a handler's documentation block into an immutable [`Contract`].
//!
//! ```text
//! doc text ──► docblock::parse ──► Node tree ──► walk ──► ContractBuilder ──► Contract
//!                                                  │
//!                                         parse_field → Directive
//! ```
//!
//! - [`docblock`] - reStructuredText-subset block parser
//! - [`markup`] - inline markup to HTML
//! - [`directive`] - per-field directive parsing
//! - [`ContractBuilder`] - resolves names against the registries
//! - [`compile`] - the whole pipeline, with aggregated errors

#![doc(html_root_url = "https://docs.rs/docket-element/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod compiler;
mod contract;
pub mod directive;
pub mod docblock;
mod error;
pub mod markup;

pub use builder::ContractBuilder;
pub use compiler::compile;
pub use contract::{Contract, ContractDescriptor, ParamDescriptor, ParamOrigin, ParamSpec};
pub use directive::{parse_field, Directive, ParamDirective, TypeSpec};
pub use error::{CompileError, DirectiveError, FieldError};
