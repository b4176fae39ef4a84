//! Typed configuration for Docket applications.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! name = "users"
//! environment = "production"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [responses]
//! default = "json"
//!
//! [plugins.json_p]
//! kind = "json_p"
//!
//! [plugins.token]
//! kind = "token"
//! settings = { secret = "s3cret" }
//! ```
//!
//! Plugins are declared in order; the table key is the name endpoints use in
//! their `:plugin:` directives.
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `DOCKET__LOGGING__LEVEL=debug`
//! - `DOCKET__METRICS__ADDR=0.0.0.0:9100`
//! - `DOCKET__PLUGINS__TOKEN__SETTINGS__SECRET=rotated`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
