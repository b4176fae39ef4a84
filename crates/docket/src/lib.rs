//! # Docket
//!
//! **Doc-block contracts for request handlers**
//!
//! A handler's documentation is its contract. Docket compiles the doc block
//! of every registered handler at startup into a typed contract (parameters,
//! plugins, response type and response codes) and validates each request
//! against it before the handler runs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docket::prelude::*;
//!
//! /// Get the area information through its id.
//! ///
//! /// :param Int * area_id: area id
//! /// :raise id_not_exist: Record does not exist.
//! #[docket::endpoint(name = "area.get")]
//! async fn get_area(params: Params) -> HandlerResult {
//!     match params.int("area_id") {
//!         Some(id) if id > 0 => Ok(Reply::success().data(json!({ "id": id }))),
//!         _ => Ok(Reply::new("id_not_exist")),
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let app = Application::builder()
//!         .route("/area", &[Method::GET], get_area_endpoint())
//!         .build()?;
//!
//!     let payload = app.dispatch("/area", Method::GET, RawParams::new()).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! doc block ──► docket-element::compile ──► Contract
//!                                              │
//! request ──► route ──► plugins ──► validate ──► handler ──► envelope ──► payload
//! ```

#![doc(html_root_url = "https://docs.rs/docket/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod factory;
mod setup;

pub use app::{Application, ApplicationBuilder};
pub use error::{AppError, RouteError};
pub use factory::PluginFactories;
pub use setup::{init_telemetry, telemetry_config};

// Re-export core types
pub use docket_core as core;

// Re-export the contract compiler
pub use docket_element as element;

// Re-export dispatch
pub use docket_pipeline as pipeline;

// Re-export configuration
pub use docket_config as config;

// Re-export logging and metrics
pub use docket_telemetry as telemetry;

// Re-export documentation export
pub use docket_docs as docs;

// Re-export macros - the endpoint attribute macro
pub use docket_macros::endpoint;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use docket::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{AppError, Application, ApplicationBuilder, PluginFactories, RouteError};

    pub use docket_core::{
        Endpoint, Envelope, HandlerResult, Invocation, Next, Params, Payload, Plugin, RawParams,
        Reply, Request,
    };

    pub use docket_config::{ConfigLoader, DocketConfig};
    pub use docket_element::Contract;

    pub use docket_macros::endpoint;

    pub use http::Method;
    pub use serde_json::json;
}
