//! Compiles a documentation block into a [`Contract`].

use crate::builder::ContractBuilder;
use crate::contract::Contract;
use crate::directive::parse_field;
use crate::docblock::{self, Node};
use crate::error::{CompileError, FieldError};
use docket_core::Registries;
use http::Method;

/// Compiles the documentation of `endpoint`.
///
/// Every field is checked; all invalid fields are reported together.
///
/// # Errors
///
/// - [`CompileError::MissingDocumentation`] when `doc` is absent or blank
/// - [`CompileError::InvalidDirectives`] when any field is invalid
/// - [`CompileError::NestingTooDeep`] when indentation nests too deeply
///
/// # Example
///
/// ```
/// use docket_core::{fixtures, Registries};
/// use docket_element::compile;
/// use http::Method;
///
/// let registries = fixtures::registries().unwrap();
/// let contract = compile("area.get", Some(fixtures::AREA_DOC), &[Method::GET], &registries).unwrap();
///
/// assert_eq!(contract.title(), "Get the area information through it&#x27;s id.");
/// assert_eq!(contract.param_index(), ["area_id", "callback"]);
/// assert_eq!(
///     contract.code_index(),
///     ["success", "exception", "param_missing", "param_unknown", "int_invalid", "id_not_exist", "str_invalid"]
/// );
///
/// assert!(compile("ping", None, &[Method::GET], &Registries::default()).is_err());
/// ```
pub fn compile(
    endpoint: &str,
    doc: Option<&str>,
    methods: &[Method],
    registries: &Registries,
) -> Result<Contract, CompileError> {
    let result = compile_inner(endpoint, doc, methods, registries);
    match &result {
        Ok(contract) => tracing::debug!(
            endpoint,
            params = ?contract.param_index(),
            plugins = ?contract.plugin_keys(),
            codes = contract.codes().len(),
            "compiled contract"
        ),
        Err(error) => tracing::error!(endpoint, error = %error, "failed to compile contract"),
    }
    result
}

fn compile_inner(
    endpoint: &str,
    doc: Option<&str>,
    methods: &[Method],
    registries: &Registries,
) -> Result<Contract, CompileError> {
    let doc = doc
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| CompileError::missing_documentation(endpoint))?;

    let tree = docblock::parse(doc).map_err(|e| CompileError::NestingTooDeep {
        endpoint: endpoint.to_string(),
        limit: e.limit,
    })?;
    let mut builder = ContractBuilder::new(endpoint, methods, registries);
    let mut errors = Vec::new();
    walk(&tree, &mut builder, &mut errors);

    if !errors.is_empty() {
        return Err(CompileError::InvalidDirectives {
            endpoint: endpoint.to_string(),
            errors,
        });
    }
    builder
        .build()
        .map_err(|errors| CompileError::InvalidDirectives {
            endpoint: endpoint.to_string(),
            errors,
        })
}

fn walk(node: &Node, builder: &mut ContractBuilder<'_>, errors: &mut Vec<FieldError>) {
    match node {
        Node::Term(text) => builder.term(text),
        Node::Paragraph(text) => builder.paragraph(text),
        Node::Field { name, body } => match parse_field(name, body) {
            Ok(directive) => errors.extend(
                builder
                    .apply_all(directive)
                    .into_iter()
                    .map(|error| FieldError::new(name.clone(), error)),
            ),
            Err(error) => errors.push(FieldError::new(name.clone(), error)),
        },
        Node::LiteralBlock(_) => {}
        other => {
            for child in other.children() {
                walk(child, builder, errors);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectiveError;

    #[test]
    fn test_blank_doc_is_missing() {
        let registries = Registries::default();
        for doc in [None, Some(""), Some("  \n\t\n")] {
            let err = compile("ping", doc, &[Method::GET], &registries).unwrap_err();
            assert_eq!(err, CompileError::missing_documentation("ping"));
        }
    }

    #[test]
    fn test_literal_blocks_are_ignored() {
        let doc = "Example::\n\n    :param Int * hidden: not a field\n\n:param Str shown:\n";
        let contract = compile("t", Some(doc), &[Method::GET], &Registries::default()).unwrap();
        assert_eq!(contract.title(), "Example:");
        assert_eq!(contract.param_index(), ["shown"]);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let doc: String = (0..64).map(|k| format!("{}step\n", " ".repeat(k))).collect();
        let err = compile("t", Some(&doc), &[Method::GET], &Registries::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::NestingTooDeep {
                endpoint: "t".into(),
                limit: docblock::MAX_DEPTH,
            }
        );
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn test_every_unknown_plugin_is_reported() {
        let doc = "Guarded.\n\n:plugin: auth oauth\n";
        let err = compile("t", Some(doc), &[Method::GET], &Registries::default()).unwrap_err();
        let errors: Vec<_> = err.field_errors().iter().map(|e| (e.field.as_str(), &e.error)).collect();
        assert_eq!(
            errors,
            [
                ("plugin", &DirectiveError::UnknownPlugin { key: "auth".into() }),
                ("plugin", &DirectiveError::UnknownPlugin { key: "oauth".into() }),
            ]
        );
    }

    #[test]
    fn test_errors_are_aggregated_in_document_order() {
        let doc = "Broken.\n\n:response: xml\n:param Int id:\n:param Date * day:\n:plugin: auth\n";
        let err = compile("t", Some(doc), &[Method::GET], &Registries::default()).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["response", "param Date * day", "plugin"]);
        assert_eq!(
            err.field_errors()[1].error,
            DirectiveError::UnknownType { name: "Date".into() }
        );
    }
}
