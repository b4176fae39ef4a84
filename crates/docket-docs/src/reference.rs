//! Self-contained HTML reference page.
//!
//! Unlike an OpenAPI viewer, the page needs no scripts or CDN: one section
//! per contract with its description, parameter table and code table.
//!
//! ```rust,ignore
//! use docket_docs::ReferencePage;
//!
//! let html = ReferencePage::new("User API")
//!     .route("/user", &contract)
//!     .html();
//! ```

use docket_core::CodeCategory;
use docket_element::markup::escape;
use docket_element::Contract;
use std::fmt::Write;

/// HTML reference for a set of routes.
#[derive(Debug, Clone)]
pub struct ReferencePage<'a> {
    title: String,
    routes: Vec<(String, &'a Contract)>,
}

impl<'a> ReferencePage<'a> {
    /// Creates an empty page.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            routes: Vec::new(),
        }
    }

    /// Adds a route.
    #[must_use]
    pub fn route(mut self, path: impl Into<String>, contract: &'a Contract) -> Self {
        self.routes.push((path.into(), contract));
        self
    }

    /// Adds several routes.
    #[must_use]
    pub fn routes<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Contract)>,
    {
        self.routes
            .extend(routes.into_iter().map(|(path, c)| (path.to_string(), c)));
        self
    }

    /// Renders the page.
    #[must_use]
    pub fn html(&self) -> String {
        let mut out = String::new();
        let title = escape(&self.title);
        let _ = write!(
            out,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
             <style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
        );

        out.push_str("<nav><ul>\n");
        for (path, contract) in &self.routes {
            let id = anchor(contract.endpoint());
            let _ = writeln!(
                out,
                "<li><a href=\"#{id}\">{}</a> <code>{}</code></li>",
                escape(contract.endpoint()),
                escape(path)
            );
        }
        out.push_str("</ul></nav>\n");

        for (path, contract) in &self.routes {
            render_contract(&mut out, path, contract);
        }

        out.push_str("</body>\n</html>\n");
        out
    }
}

const STYLE: &str = "body{font-family:sans-serif;max-width:60em;margin:auto}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.2em .5em;text-align:left}\
.deprecated{color:#a00}";

fn render_contract(out: &mut String, path: &str, contract: &Contract) {
    let methods: Vec<&str> = contract.methods().iter().map(http::Method::as_str).collect();
    let _ = writeln!(
        out,
        "<section id=\"{}\">\n<h2>{}</h2>\n<p><code>{} {}</code></p>",
        anchor(contract.endpoint()),
        escape(contract.endpoint()),
        methods.join("|"),
        escape(path)
    );
    if let Some(note) = contract.deprecated() {
        let _ = writeln!(out, "<p class=\"deprecated\">Deprecated: {}</p>", escape(note));
    }
    // Title and description are already HTML.
    if !contract.title().is_empty() {
        let _ = writeln!(out, "<p><strong>{}</strong></p>", contract.title());
    }
    if !contract.description().is_empty() {
        let _ = writeln!(out, "<div>{}</div>", contract.description());
    }

    if !contract.params().is_empty() {
        out.push_str("<h3>Parameters</h3>\n<table>\n<tr><th>Name</th><th>Type</th><th>Required</th><th>Source</th><th>Description</th></tr>\n");
        for spec in contract.params() {
            let _ = writeln!(
                out,
                "<tr><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&spec.name),
                escape(spec.type_name()),
                if spec.required { "yes" } else { "no" },
                escape(&spec.origin.to_string()),
                spec.description
            );
        }
        out.push_str("</table>\n");
    }

    out.push_str("<h3>Codes</h3>\n<table>\n<tr><th>Code</th><th>Message</th><th>Source</th></tr>\n");
    for entry in contract.codes().iter() {
        // `raise` messages are rendered markup; the rest are plain text.
        let message = match entry.category {
            CodeCategory::Biz => entry.message.clone(),
            _ => escape(&entry.message),
        };
        let _ = writeln!(
            out,
            "<tr><td><code>{}</code></td><td>{}</td><td>{}</td></tr>",
            escape(&entry.code),
            message,
            escape(&entry.category.to_string())
        );
    }
    out.push_str("</table>\n</section>\n");
}

fn anchor(endpoint: &str) -> String {
    endpoint
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
