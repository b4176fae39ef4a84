//! Plugin factories for configuration-driven wiring.
//!
//! Configuration names plugins by *kind*; a factory registered under that
//! kind turns the entry's settings into a plugin instance.
//!
//! ```rust,ignore
//! let mut factories = PluginFactories::new();
//! factories.register("token", |config| {
//!     let secret = config
//!         .setting_str("secret")
//!         .ok_or_else(|| anyhow::anyhow!("missing setting 'secret'"))?;
//!     Ok(Arc::new(TokenPlugin::new(secret)) as SharedPlugin)
//! });
//! ```

use docket_config::PluginConfig;
use docket_core::SharedPlugin;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

type Factory = Arc<dyn Fn(&PluginConfig) -> anyhow::Result<SharedPlugin> + Send + Sync>;

/// Plugin constructors by kind.
#[derive(Clone, Default)]
pub struct PluginFactories {
    factories: IndexMap<String, Factory>,
}

impl PluginFactories {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory; a later registration for the same kind wins.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&PluginConfig) -> anyhow::Result<SharedPlugin> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Whether a factory exists for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Builds a plugin; `None` if no factory handles the kind.
    pub fn build(&self, config: &PluginConfig) -> Option<anyhow::Result<SharedPlugin>> {
        self.factories
            .get(&config.kind)
            .map(|factory| factory(config))
    }

    /// Registered kinds, in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for PluginFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginFactories")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
