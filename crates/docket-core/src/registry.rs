//! Explicit registries for types, plugins and response types.
//!
//! Nothing is discovered implicitly: every name a documentation block may
//! refer to must be registered here before contracts are compiled.
//!
//! # Example
//!
//! ```
//! use docket_core::{Registries, TypeEntry};
//!
//! let registries = Registries::default();
//! assert!(matches!(registries.types.lookup("Int"), Some(TypeEntry::Simple(_))));
//! assert!(matches!(registries.types.lookup("List"), Some(TypeEntry::Generic(_))));
//! assert_eq!(registries.responses.lookup("default").map(|r| r.name()), Some("json"));
//! ```

use crate::error::RegistryError;
use crate::param_type::{GenericType, ParamType, SharedType, TypeEntry};
use crate::plugin::{Plugin, SharedPlugin};
use crate::response::{JsonResponse, PlainTextResponse, ResponseType, SharedResponse};
use crate::types::{Bool, Float, Int, Json, List, Mail, Param, Str};
use indexmap::IndexMap;
use std::sync::Arc;

/// Name under which the default response type is always found.
pub const DEFAULT_RESPONSE: &str = "default";

fn check_key(key: &str) -> Result<(), RegistryError> {
    if key.is_empty() {
        return Err(RegistryError::invalid_key(key, "must not be empty"));
    }
    if key.chars().any(|c| c.is_whitespace() || c == '[' || c == ']' || c == ':') {
        return Err(RegistryError::invalid_key(
            key,
            "must not contain whitespace, brackets or colons",
        ));
    }
    Ok(())
}

/// Parameter types by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: IndexMap<String, TypeEntry>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let builtins: [TypeEntry; 8] = [
            TypeEntry::Simple(Arc::new(Param)),
            TypeEntry::Simple(Arc::new(Int)),
            TypeEntry::Simple(Arc::new(Float)),
            TypeEntry::Simple(Arc::new(Str)),
            TypeEntry::Simple(Arc::new(Bool)),
            TypeEntry::Simple(Arc::new(Mail)),
            TypeEntry::Simple(Arc::new(Json)),
            TypeEntry::Generic(Arc::new(List)),
        ];
        let entries = builtins
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry))
            .collect();
        Self { entries }
    }

    /// Registers a concrete type.
    pub fn register(&mut self, ty: impl ParamType) -> Result<(), RegistryError> {
        self.register_entry(TypeEntry::Simple(Arc::new(ty)))
    }

    /// Registers a type constructor.
    pub fn register_generic(&mut self, ty: impl GenericType) -> Result<(), RegistryError> {
        self.register_entry(TypeEntry::Generic(Arc::new(ty)))
    }

    /// Registers an entry under its own name.
    pub fn register_entry(&mut self, entry: TypeEntry) -> Result<(), RegistryError> {
        let name = entry.name().to_string();
        check_key(&name)?;
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateType { name });
        }
        tracing::debug!(type_name = %name, generic = entry.is_generic(), "registered parameter type");
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Looks up a type or type constructor.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }

    /// Looks up a concrete type.
    #[must_use]
    pub fn simple(&self, name: &str) -> Option<&SharedType> {
        match self.entries.get(name) {
            Some(TypeEntry::Simple(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Plugins by key.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, SharedPlugin>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin under `key`.
    pub fn register(&mut self, key: impl Into<String>, plugin: impl Plugin) -> Result<(), RegistryError> {
        self.register_shared(key, Arc::new(plugin))
    }

    /// Registers an already shared plugin under `key`.
    pub fn register_shared(
        &mut self,
        key: impl Into<String>,
        plugin: SharedPlugin,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        check_key(&key)?;
        if self.plugins.contains_key(&key) {
            return Err(RegistryError::DuplicatePlugin { key });
        }
        tracing::debug!(plugin = %key, name = plugin.name(), "registered plugin");
        self.plugins.insert(key, plugin);
        Ok(())
    }

    /// Looks up a plugin.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&SharedPlugin> {
        self.plugins.get(key)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Returns the number of plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if no plugin is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Response types by name, with a mandatory default.
#[derive(Debug, Clone)]
pub struct ResponseRegistry {
    default: SharedResponse,
    named: IndexMap<String, SharedResponse>,
}

impl ResponseRegistry {
    /// Creates a registry with `default` as the only entry.
    pub fn new(default: impl ResponseType) -> Self {
        let default: SharedResponse = Arc::new(default);
        let mut named = IndexMap::new();
        named.insert(default.name().to_string(), default.clone());
        Self { default, named }
    }

    /// Creates a registry with the built-in `json` (default) and `text` types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new(JsonResponse);
        registry
            .named
            .insert(PlainTextResponse.name().to_string(), Arc::new(PlainTextResponse));
        registry
    }

    /// Registers a response type under its own name.
    pub fn register(&mut self, response: impl ResponseType) -> Result<(), RegistryError> {
        let response: SharedResponse = Arc::new(response);
        let name = response.name().to_string();
        check_key(&name)?;
        if name == DEFAULT_RESPONSE || self.named.contains_key(&name) {
            return Err(RegistryError::DuplicateResponse { name });
        }
        self.named.insert(name, response);
        Ok(())
    }

    /// Makes a registered response type the default.
    pub fn set_default(&mut self, name: &str) -> Result<(), RegistryError> {
        match self.named.get(name) {
            Some(response) => {
                self.default = response.clone();
                Ok(())
            }
            None => Err(RegistryError::invalid_key(name, "no response type with this name")),
        }
    }

    /// Returns the default response type.
    #[must_use]
    pub fn default_response(&self) -> &SharedResponse {
        &self.default
    }

    /// Looks up a response type; `default` resolves to the default.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&SharedResponse> {
        if name == DEFAULT_RESPONSE {
            Some(&self.default)
        } else {
            self.named.get(name)
        }
    }

    /// Registered names, excluding the `default` alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }
}

impl Default for ResponseRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// The three registries a contract is compiled against.
#[derive(Debug, Clone)]
pub struct Registries {
    /// Parameter types.
    pub types: TypeRegistry,
    /// Plugins.
    pub plugins: PluginRegistry,
    /// Response types.
    pub responses: ResponseRegistry,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            types: TypeRegistry::with_builtins(),
            plugins: PluginRegistry::new(),
            responses: ResponseRegistry::with_builtins(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TokenPlugin;

    #[test]
    fn test_builtin_types() {
        let types = TypeRegistry::with_builtins();
        let names: Vec<_> = types.names().collect();
        assert_eq!(names, vec!["Param", "Int", "Float", "Str", "Bool", "Mail", "Json", "List"]);
        assert!(types.simple("List").is_none());
        assert!(types.simple("Int").is_some());
        assert!(types.lookup("Date").is_none());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut types = TypeRegistry::with_builtins();
        assert_eq!(
            types.register(Int),
            Err(RegistryError::DuplicateType { name: "Int".into() })
        );
    }

    #[test]
    fn test_plugin_registration() {
        let mut plugins = PluginRegistry::new();
        plugins.register("token", TokenPlugin::new("secret")).unwrap();

        assert!(plugins.lookup("token").is_some());
        assert!(matches!(
            plugins.register("token", TokenPlugin::new("other")),
            Err(RegistryError::DuplicatePlugin { .. })
        ));
        assert!(matches!(
            plugins.register("bad key", TokenPlugin::new("x")),
            Err(RegistryError::InvalidKey { .. })
        ));
        assert_eq!(plugins.keys().collect::<Vec<_>>(), vec!["token"]);
    }

    #[test]
    fn test_response_default_alias() {
        let mut responses = ResponseRegistry::with_builtins();
        assert_eq!(responses.lookup("default").unwrap().name(), "json");
        assert_eq!(responses.lookup("text").unwrap().name(), "text");

        responses.set_default("text").unwrap();
        assert_eq!(responses.default_response().name(), "text");
        assert!(responses.set_default("xml").is_err());
        assert!(responses.lookup("xml").is_none());
    }

    #[test]
    fn test_response_register_rejects_duplicates() {
        let mut responses = ResponseRegistry::new(JsonResponse);
        assert!(responses.lookup("text").is_none());
        responses.register(PlainTextResponse).unwrap();
        assert!(responses.register(PlainTextResponse).is_err());
    }
}
