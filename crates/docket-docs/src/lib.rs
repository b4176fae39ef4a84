//! # Docket Docs
//!
//! API documentation export for compiled contracts.
//!
//! - **OpenAPI 3.1** documents via [`OpenApiGenerator`], with the code table,
//!   plugins and response type carried in `x-` extensions
//! - A self-contained **HTML reference** via [`ReferencePage`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docket_docs::{OpenApiGenerator, ReferencePage};
//!
//! let spec = OpenApiGenerator::new()
//!     .title("User API")
//!     .version("1.0.0")
//!     .generate(app.routes())?;
//! std::fs::write("openapi.json", spec.to_json()?)?;
//!
//! let html = ReferencePage::new("User API").routes(app.routes()).html();
//! ```

#![warn(missing_docs)]

mod error;
mod openapi;
mod reference;

pub use error::{DocsError, DocsResult};
pub use openapi::{
    Info, MediaType, OpenApi, OpenApiGenerator, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, Response, Schema, SchemaType, Server, Tag,
};
pub use reference::ReferencePage;
