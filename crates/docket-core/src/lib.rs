//! # Docket Core
//!
//! Core types and traits for the Docket contract framework.
//!
//! This crate provides the building blocks shared by the contract compiler and
//! the request pipeline:
//!
//! - [`ParamType`] / [`GenericType`] - Parameter type descriptors (`Int`, `List[T]`, ...)
//! - [`Plugin`] - Cross-cutting request processing units with their own parameters and codes
//! - [`ResponseType`] - Renders a response [`Envelope`] into a [`Payload`]
//! - [`CodeTable`] - Ordered, deduplicated error-code table
//! - [`Registries`] - Explicit registration of types, plugins and response types
//! - [`Handler`] / [`Endpoint`] - Business logic bound to a documentation block
//! - [`Invocation`] - Per-request state flowing through the plugin chain

#![doc(html_root_url = "https://docs.rs/docket-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod code;
mod error;
pub mod fixtures;
mod handler;
mod invocation;
pub mod param_type;
mod plugin;
pub mod registry;
mod response;
pub mod types;

pub use code::{CodeCategory, CodeSpec, CodeTable, ErrorCode};
pub use error::RegistryError;
pub use handler::{Endpoint, FnHandler, Handler, HandlerResult, Reply, SharedHandler};
pub use invocation::{Extensions, Invocation, Params, RawParams, Request, RequestId};
pub use param_type::{GenericType, ParamType, SharedType, TypeEntry, TypeMismatch};
pub use plugin::{BoxFuture, Next, Plugin, PluginParam, SharedPlugin};
pub use registry::{PluginRegistry, Registries, ResponseRegistry, TypeRegistry};
pub use response::{Envelope, JsonResponse, Payload, PlainTextResponse, ResponseType, SharedResponse};
