//! Mutable state collected while walking a documentation block.
//!
//! The [`ContractBuilder`] receives terms, paragraphs and directives in
//! document order, checks every name against the [`Registries`], and freezes
//! the result into a [`Contract`] with [`build`](ContractBuilder::build).

use crate::contract::{Contract, ParamOrigin, ParamSpec};
use crate::directive::{Directive, ParamDirective, TypeSpec};
use crate::error::{DirectiveError, FieldError};
use crate::markup::to_html;
use docket_core::code::{PARAM_MISSING, PARAM_MISSING_INDEX};
use docket_core::param_type::is_exempt_method;
use docket_core::{
    CodeCategory, CodeTable, Registries, SharedPlugin, SharedResponse, SharedType, TypeEntry,
};
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;

/// Builds a [`Contract`].
///
/// # Example
///
/// ```
/// use docket_core::Registries;
/// use docket_element::{parse_field, ContractBuilder};
/// use http::Method;
///
/// let registries = Registries::default();
/// let mut builder = ContractBuilder::new("area.get", &[Method::GET], &registries);
/// builder.paragraph("Get an area.");
/// builder.apply(parse_field("param Int * area_id", "area id").unwrap()).unwrap();
///
/// let contract = builder.build().unwrap();
/// assert_eq!(contract.title(), "Get an area.");
/// assert_eq!(contract.required(), ["area_id"]);
/// assert_eq!(contract.message("int_invalid"), Some("Parameter must be an integer"));
/// ```
pub struct ContractBuilder<'r> {
    endpoint: String,
    methods: Vec<Method>,
    registries: &'r Registries,
    title: String,
    term_seen: bool,
    description: Option<String>,
    response: Option<SharedResponse>,
    plugins: Vec<(String, SharedPlugin)>,
    params: Vec<ParamSpec>,
    codes: CodeTable,
    version: Option<String>,
    deprecated: Option<String>,
    extra: IndexMap<String, String>,
}

impl<'r> ContractBuilder<'r> {
    /// Creates a builder for `endpoint` served under `methods`.
    pub fn new(endpoint: impl Into<String>, methods: &[Method], registries: &'r Registries) -> Self {
        Self {
            endpoint: endpoint.into(),
            methods: methods.to_vec(),
            registries,
            title: String::new(),
            term_seen: false,
            description: None,
            response: None,
            plugins: Vec::new(),
            params: Vec::new(),
            codes: CodeTable::with_bootstrap(),
            version: None,
            deprecated: None,
            extra: IndexMap::new(),
        }
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Records a definition-list term. Only the first term sets the title.
    pub fn term(&mut self, text: &str) {
        if self.term_seen {
            return;
        }
        self.term_seen = true;
        self.title = to_html(text);
    }

    /// Records a paragraph.
    ///
    /// Paragraphs before the first blank-line break fold into the title; the
    /// next one becomes the description and later ones are appended to it.
    pub fn paragraph(&mut self, text: &str) {
        let html = to_html(text);
        match self.description.as_mut() {
            None => {
                if !self.title.is_empty() && !html.is_empty() {
                    self.title.push(' ');
                }
                self.title.push_str(&html);
                self.description = Some(String::new());
            }
            Some(description) if description.is_empty() => *description = html,
            Some(description) => {
                description.push_str("\n\n");
                description.push_str(&html);
            }
        }
    }

    /// Applies one directive, stopping at the first failure.
    pub fn apply(&mut self, directive: Directive) -> Result<(), DirectiveError> {
        match self.apply_all(directive).into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Applies one directive and returns every failure.
    ///
    /// Each key of a `plugin` directive is attempted, so one field can yield
    /// several errors. Known keys are still added.
    pub fn apply_all(&mut self, directive: Directive) -> Vec<DirectiveError> {
        if let Directive::Plugins(keys) = directive {
            return keys
                .into_iter()
                .filter_map(|key| self.add_plugin(key).err())
                .collect();
        }
        self.apply_one(directive).err().into_iter().collect()
    }

    fn apply_one(&mut self, directive: Directive) -> Result<(), DirectiveError> {
        match directive {
            Directive::Response(name) => {
                let response = self
                    .registries
                    .responses
                    .lookup(&name)
                    .ok_or(DirectiveError::UnknownResponse { name })?;
                self.response = Some(response.clone());
            }
            Directive::Plugins(keys) => {
                for key in keys {
                    self.add_plugin(key)?;
                }
            }
            Directive::Raise { code, message } => {
                self.codes.insert(code, to_html(&message), CodeCategory::Biz);
            }
            Directive::Param(param) => self.add_param(param)?,
            Directive::Attribute { name, value } => self.set_attribute(name, value),
        }
        Ok(())
    }

    fn add_plugin(&mut self, key: String) -> Result<(), DirectiveError> {
        if self.plugins.iter().any(|(k, _)| *k == key) {
            return Ok(());
        }
        let plugin = self
            .registries
            .plugins
            .lookup(&key)
            .ok_or_else(|| DirectiveError::UnknownPlugin { key: key.clone() })?
            .clone();
        for spec in plugin.error_codes() {
            self.codes.insert(
                spec.code.clone(),
                spec.message.clone(),
                CodeCategory::Plugin(key.clone()),
            );
        }
        self.plugins.push((key, plugin));
        Ok(())
    }

    fn add_param(&mut self, param: ParamDirective) -> Result<(), DirectiveError> {
        if self.params.iter().any(|p| p.name == param.name) {
            return Err(DirectiveError::DuplicateParam { name: param.name });
        }
        let ty = self.resolve_type(&param.type_spec)?;
        self.check_methods(&param.name, &ty)?;
        self.register_type_codes(&ty);
        self.params.push(ParamSpec {
            name: param.name,
            ty,
            required: param.required,
            description: to_html(&param.description),
            origin: ParamOrigin::Handler,
        });
        Ok(())
    }

    fn set_attribute(&mut self, name: String, value: String) {
        match name.as_str() {
            "title" => self.title = to_html(&value),
            "description" => self.description = Some(to_html(&value)),
            "version" => self.version = Some(value),
            "deprecated" => self.deprecated = Some(value),
            _ => {
                self.extra.insert(name, value);
            }
        }
    }

    /// Resolves a type expression against the type registry.
    pub fn resolve_type(&self, spec: &TypeSpec) -> Result<SharedType, DirectiveError> {
        let types = &self.registries.types;
        match spec {
            TypeSpec::Simple(name) => match types.lookup(name) {
                Some(TypeEntry::Simple(ty)) => Ok(ty.clone()),
                Some(TypeEntry::Generic(_)) => {
                    Err(DirectiveError::MissingInnerType { name: name.clone() })
                }
                None => Err(DirectiveError::UnknownType { name: name.clone() }),
            },
            TypeSpec::Composite { outer, inner } => {
                let generic = match types.lookup(outer) {
                    Some(TypeEntry::Generic(generic)) => generic,
                    Some(TypeEntry::Simple(_)) => {
                        return Err(DirectiveError::NotGeneric { name: outer.clone() })
                    }
                    None => return Err(DirectiveError::UnknownType { name: outer.clone() }),
                };
                let inner_ty = match types.lookup(inner) {
                    Some(TypeEntry::Simple(ty)) if !ty.is_composite() => ty.clone(),
                    Some(_) => {
                        return Err(DirectiveError::CompositeInner {
                            outer: outer.clone(),
                            inner: inner.clone(),
                        })
                    }
                    None => return Err(DirectiveError::UnknownType { name: inner.clone() }),
                };
                Ok(generic.instantiate(inner_ty))
            }
        }
    }

    fn check_methods(&self, param: &str, ty: &SharedType) -> Result<(), DirectiveError> {
        match self
            .methods
            .iter()
            .find(|m| !is_exempt_method(m) && !ty.supports(m))
        {
            Some(method) => Err(DirectiveError::UnsupportedMethod {
                param: param.to_string(),
                type_name: ty.name().to_string(),
                method: method.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Inner code first, then the type's own code.
    fn register_type_codes(&mut self, ty: &SharedType) {
        let inner = ty.inner().and_then(|inner| inner.code());
        for spec in inner.into_iter().chain(ty.code()) {
            self.codes
                .insert(spec.code.clone(), spec.message.clone(), CodeCategory::Type);
        }
    }

    /// Resolves plugin parameters and places them ahead of the handler's.
    ///
    /// Each plugin's block is inserted at the front in declaration order, so
    /// `P[a, b]` then `Q[x, y]` ahead of `[c]` yields `[x, y, a, b, c]`.
    fn merge_plugin_params(&mut self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut merged = std::mem::take(&mut self.params);
        let plugins = self.plugins.clone();

        for (key, plugin) in &plugins {
            let mut block = Vec::with_capacity(plugin.parameters().len());
            for param in plugin.parameters() {
                let resolved = TypeSpec::parse(&param.type_name)
                    .and_then(|spec| self.resolve_type(&spec))
                    .and_then(|ty| self.check_methods(&param.name, &ty).map(|()| ty));
                match resolved {
                    Ok(ty) => block.push(ParamSpec {
                        name: param.name.clone(),
                        ty,
                        required: param.required,
                        description: to_html(&param.description),
                        origin: ParamOrigin::Plugin(key.clone()),
                    }),
                    Err(error) => errors.push(FieldError::new(format!("plugin:{key}"), error)),
                }
            }
            block.append(&mut merged);
            merged = block;
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut params: Vec<ParamSpec> = Vec::with_capacity(merged.len());
        for param in merged {
            if params.iter().any(|p| p.name == param.name) {
                continue;
            }
            if matches!(param.origin, ParamOrigin::Plugin(_)) {
                self.register_type_codes(&param.ty);
            }
            params.push(param);
        }
        self.params = params;
        Ok(())
    }

    /// Freezes the collected state.
    ///
    /// Calls [`Plugin::init_endpoint`](docket_core::Plugin::init_endpoint) on
    /// every plugin once the contract is complete.
    pub fn build(mut self) -> Result<Contract, Vec<FieldError>> {
        self.merge_plugin_params()?;

        let (required, optional): (Vec<&ParamSpec>, Vec<&ParamSpec>) =
            self.params.iter().partition(|p| p.required);
        let required: Vec<String> = required.into_iter().map(|p| p.name.clone()).collect();
        let optional: Vec<String> = optional.into_iter().map(|p| p.name.clone()).collect();
        let param_index: Vec<String> = required.iter().chain(&optional).cloned().collect();
        let defaults = param_index
            .iter()
            .map(|name| (name.clone(), Value::Null))
            .collect();

        if !required.is_empty() {
            self.codes.insert_at(
                PARAM_MISSING_INDEX,
                PARAM_MISSING,
                "Missing parameter",
                CodeCategory::Common,
            );
        }

        let response = self
            .response
            .unwrap_or_else(|| self.registries.responses.default_response().clone());
        let (plugin_keys, plugins): (Vec<String>, Vec<SharedPlugin>) =
            self.plugins.into_iter().unzip();

        for plugin in &plugins {
            plugin.init_endpoint(&self.endpoint);
        }

        Ok(Contract {
            endpoint: self.endpoint,
            methods: self.methods,
            title: self.title,
            description: self.description.unwrap_or_default(),
            response,
            plugin_keys,
            plugins,
            params: self.params,
            required,
            optional,
            param_index,
            defaults,
            codes: self.codes,
            version: self.version,
            deprecated: self.deprecated,
            extra: self.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse_field;
    use docket_core::{
        CodeSpec, Plugin, PluginParam, PluginRegistry, ResponseRegistry, TypeRegistry,
    };
    use std::sync::Arc;

    #[derive(Debug)]
    struct Fixture(&'static str, Vec<PluginParam>, Vec<CodeSpec>);

    impl Plugin for Fixture {
        fn name(&self) -> &str {
            self.0
        }

        fn parameters(&self) -> &[PluginParam] {
            &self.1
        }

        fn error_codes(&self) -> &[CodeSpec] {
            &self.2
        }
    }

    fn registries() -> Registries {
        let mut registries = Registries::default();
        registries
            .plugins
            .register(
                "p",
                Fixture(
                    "p",
                    vec![PluginParam::required("a", "Int"), PluginParam::optional("b", "Str")],
                    vec![CodeSpec::new("p_denied", "Denied")],
                ),
            )
            .unwrap();
        registries
            .plugins
            .register_shared(
                "q",
                Arc::new(Fixture(
                    "q",
                    vec![PluginParam::optional("x", "List[Int]"), PluginParam::optional("y", "Str")],
                    vec![],
                )),
            )
            .unwrap();
        registries
    }

    fn apply(builder: &mut ContractBuilder<'_>, name: &str, body: &str) -> Result<(), DirectiveError> {
        builder.apply(parse_field(name, body)?)
    }

    #[test]
    fn test_plugin_params_are_prepended_per_plugin() {
        let registries = registries();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        apply(&mut builder, "plugin", "p q").unwrap();
        apply(&mut builder, "param Str c", "").unwrap();

        let contract = builder.build().unwrap();
        let names: Vec<&str> = contract.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "a", "b", "c"]);
        assert_eq!(contract.required(), ["a"]);
        assert_eq!(contract.param_index(), ["a", "x", "y", "b", "c"]);
        assert_eq!(contract.param("x").unwrap().origin, ParamOrigin::Plugin("q".into()));
    }

    #[test]
    fn test_plugin_param_shadows_handler_param() {
        let registries = registries();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        apply(&mut builder, "plugin", "p").unwrap();
        apply(&mut builder, "param Str b", "mine").unwrap();

        let contract = builder.build().unwrap();
        assert_eq!(contract.params().len(), 2);
        assert_eq!(contract.param("b").unwrap().origin, ParamOrigin::Plugin("p".into()));
    }

    #[test]
    fn test_code_order_and_categories() {
        let registries = registries();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        apply(&mut builder, "plugin", "p q p").unwrap();
        apply(&mut builder, "raise gone", "It is *gone*.").unwrap();
        apply(&mut builder, "raise gone", "Ignored").unwrap();

        let contract = builder.build().unwrap();
        assert_eq!(contract.plugin_keys(), ["p", "q"]);
        assert_eq!(
            contract.code_index(),
            [
                "success",
                "exception",
                "param_missing",
                "param_unknown",
                "p_denied",
                "gone",
                "int_invalid",
                "list_invalid",
                "str_invalid",
            ]
        );
        assert_eq!(contract.message("gone"), Some("It is <em>gone</em>."));
        assert_eq!(
            contract.code("p_denied").unwrap().category,
            CodeCategory::Plugin("p".into())
        );
        assert_eq!(contract.code("list_invalid").unwrap().category, CodeCategory::Type);
        assert_eq!(
            contract.message("list_invalid"),
            Some("Parameter must be a list of Int")
        );
    }

    #[test]
    fn test_no_required_params_means_no_param_missing() {
        let registries = Registries::default();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        apply(&mut builder, "param Param anything", "").unwrap();

        let contract = builder.build().unwrap();
        assert_eq!(contract.code_index(), ["success", "exception", "param_unknown"]);
        assert_eq!(contract.response().name(), "json");
        assert_eq!(contract.description(), "");
    }

    #[test]
    fn test_title_and_description_folding() {
        let registries = Registries::default();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        builder.paragraph("Get the area");
        builder.paragraph("Longer text.");
        builder.paragraph("More text.");

        let contract = builder.build().unwrap();
        assert_eq!(contract.title(), "Get the area");
        assert_eq!(contract.description(), "Longer text.\n\nMore text.");
    }

    #[test]
    fn test_first_term_sets_title() {
        let registries = Registries::default();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        builder.term("Area");
        builder.term("Ignored");
        builder.paragraph("details");

        let contract = builder.build().unwrap();
        assert_eq!(contract.title(), "Area details");
    }

    #[test]
    fn test_plugin_keys_are_checked_independently() {
        let registries = registries();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        let errors = builder.apply_all(parse_field("plugin", "auth p oauth").unwrap());
        assert_eq!(
            errors,
            vec![
                DirectiveError::UnknownPlugin { key: "auth".into() },
                DirectiveError::UnknownPlugin { key: "oauth".into() },
            ]
        );
        assert_eq!(
            apply(&mut builder, "plugin", "auth"),
            Err(DirectiveError::UnknownPlugin { key: "auth".into() })
        );

        apply(&mut builder, "param Str c", "").unwrap();
        let contract = builder.build().unwrap();
        let names: Vec<&str> = contract.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_attributes() {
        let registries = Registries::default();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        apply(&mut builder, "version", "2.1").unwrap();
        apply(&mut builder, "deprecated", "use area.list").unwrap();
        apply(&mut builder, "owner", "geo team").unwrap();

        let contract = builder.build().unwrap();
        assert_eq!(contract.version(), Some("2.1"));
        assert!(contract.is_deprecated());
        assert_eq!(contract.extra().get("owner").map(String::as_str), Some("geo team"));
    }

    #[test]
    fn test_type_resolution_failures() {
        let registries = Registries::default();
        let builder = ContractBuilder::new("t", &[Method::GET], &registries);
        let resolve = |spec: &str| builder.resolve_type(&TypeSpec::parse(spec).unwrap());

        assert!(matches!(resolve("Date"), Err(DirectiveError::UnknownType { .. })));
        assert!(matches!(resolve("List"), Err(DirectiveError::MissingInnerType { .. })));
        assert!(matches!(resolve("Int[Str]"), Err(DirectiveError::NotGeneric { .. })));
        assert!(matches!(resolve("List[List]"), Err(DirectiveError::CompositeInner { .. })));
        assert!(matches!(resolve("List[Date]"), Err(DirectiveError::UnknownType { .. })));
        assert_eq!(resolve("List[Int]").unwrap().name(), "List[Int]");
    }

    #[test]
    fn test_composite_needs_registered_inner_type() {
        let mut types = TypeRegistry::new();
        types.register_generic(docket_core::types::List).unwrap();
        let registries = Registries {
            types,
            plugins: PluginRegistry::new(),
            responses: ResponseRegistry::with_builtins(),
        };
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        assert_eq!(
            apply(&mut builder, "param List[Int] ids", ""),
            Err(DirectiveError::UnknownType { name: "Int".into() })
        );
    }

    #[test]
    fn test_method_support_is_checked() {
        let registries = Registries::default();
        let mut builder =
            ContractBuilder::new("t", &[Method::HEAD, Method::GET, Method::POST], &registries);
        let err = apply(&mut builder, "param Json body", "").unwrap_err();
        assert_eq!(
            err,
            DirectiveError::UnsupportedMethod {
                param: "body".into(),
                type_name: "Json".into(),
                method: "GET".into(),
            }
        );

        let mut builder = ContractBuilder::new("t", &[Method::POST, Method::OPTIONS], &registries);
        apply(&mut builder, "param Json body", "").unwrap();
    }

    #[test]
    fn test_unknown_names_and_duplicates() {
        let registries = Registries::default();
        let mut builder = ContractBuilder::new("t", &[Method::GET], &registries);
        assert!(matches!(
            apply(&mut builder, "response", "xml"),
            Err(DirectiveError::UnknownResponse { .. })
        ));
        assert!(matches!(
            apply(&mut builder, "plugin", "auth"),
            Err(DirectiveError::UnknownPlugin { .. })
        ));
        apply(&mut builder, "param Int id", "").unwrap();
        assert_eq!(
            apply(&mut builder, "param Str id", ""),
            Err(DirectiveError::DuplicateParam { name: "id".into() })
        );
        apply(&mut builder, "response", "text").unwrap();
        assert_eq!(builder.build().unwrap().response().name(), "text");
    }
}
