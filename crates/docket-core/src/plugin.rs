//! Plugin trait and the around-chain that runs plugins.
//!
//! A plugin contributes parameters and error codes to every contract that
//! names it, and wraps request processing with [`Plugin::process`]. Plugins
//! are shared read-only between requests; per-request state belongs in the
//! [`Invocation`] extensions.
//!
//! # Example
//!
//! ```
//! use docket_core::{BoxFuture, CodeSpec, Envelope, Invocation, Next, Plugin, PluginParam};
//!
//! #[derive(Debug)]
//! struct Maintenance {
//!     codes: Vec<CodeSpec>,
//! }
//!
//! impl Plugin for Maintenance {
//!     fn name(&self) -> &str {
//!         "maintenance"
//!     }
//!
//!     fn error_codes(&self) -> &[CodeSpec] {
//!         &self.codes
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         _inv: &'a mut Invocation,
//!         _next: Next<'a>,
//!     ) -> BoxFuture<'a, Envelope> {
//!         Box::pin(async { Envelope::new("maintenance") })
//!     }
//! }
//! ```

use crate::code::CodeSpec;
use crate::invocation::Invocation;
use crate::response::{Envelope, Payload};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared handle to a plugin.
pub type SharedPlugin = Arc<dyn Plugin>;

/// A parameter a plugin adds to every contract that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginParam {
    /// Parameter name.
    pub name: String,
    /// Registered type name, e.g. `Str` or `List[Int]`.
    pub type_name: String,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Human-readable description.
    pub description: String,
}

impl PluginParam {
    /// A required parameter.
    pub fn required(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: true,
            description: String::new(),
        }
    }

    /// An optional parameter.
    pub fn optional(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, type_name)
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A reusable request-processing unit.
///
/// # Invariants
///
/// - `process` calls `next.run()` at most once; not calling it short-circuits
///   the request with the returned envelope
/// - short-circuit envelopes use one of the plugin's own [`error_codes`](Plugin::error_codes)
pub trait Plugin: Send + Sync + fmt::Debug + 'static {
    /// Human-readable plugin name, used in logs.
    fn name(&self) -> &str;

    /// Parameters injected into every contract naming this plugin.
    fn parameters(&self) -> &[PluginParam] {
        &[]
    }

    /// Codes this plugin may respond with.
    fn error_codes(&self) -> &[CodeSpec] {
        &[]
    }

    /// Called once for every contract compiled with this plugin.
    fn init_endpoint(&self, _endpoint: &str) {}

    /// Wraps the rest of the chain.
    fn process<'a>(&'a self, inv: &'a mut Invocation, next: Next<'a>) -> BoxFuture<'a, Envelope> {
        Box::pin(next.run(inv))
    }

    /// Adjusts the rendered payload. Runs in reverse plugin order.
    fn finish(&self, _inv: &Invocation, _payload: &mut Payload) {}
}

/// Callback to invoke the next plugin in the chain.
///
/// Consumed by [`run`](Next::run), so it can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        plugin: &'a dyn Plugin,
        next: Box<Next<'a>>,
    },
    Terminal(Box<dyn FnOnce(&mut Invocation) -> BoxFuture<'static, Envelope> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that runs `plugin` before `next`.
    pub fn chain(plugin: &'a dyn Plugin, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                plugin,
                next: Box::new(next),
            },
        }
    }

    /// Creates the end of the chain.
    pub fn terminal<F>(f: F) -> Self
    where
        F: FnOnce(&mut Invocation) -> BoxFuture<'static, Envelope> + Send + 'a,
    {
        Self {
            inner: NextInner::Terminal(Box::new(f)),
        }
    }

    /// Builds a chain running `plugins` in order, then `terminal`.
    pub fn from_plugins<F>(plugins: &'a [SharedPlugin], terminal: F) -> Self
    where
        F: FnOnce(&mut Invocation) -> BoxFuture<'static, Envelope> + Send + 'a,
    {
        plugins
            .iter()
            .rev()
            .fold(Self::terminal(terminal), |next, plugin| {
                Self::chain(plugin.as_ref(), next)
            })
    }

    /// Invokes the next plugin, or the terminal.
    pub async fn run(self, inv: &mut Invocation) -> Envelope {
        match self.inner {
            NextInner::Chain { plugin, next } => plugin.process(inv, *next).await,
            NextInner::Terminal(terminal) => terminal(inv).await,
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            NextInner::Chain { plugin, .. } => {
                f.debug_struct("Next").field("plugin", &plugin.name()).finish()
            }
            NextInner::Terminal(_) => f.debug_struct("Next").field("terminal", &true).finish(),
        }
    }
}
