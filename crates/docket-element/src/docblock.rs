//! Block-level parser for documentation blocks.
//!
//! Documentation blocks use a small subset of reStructuredText:
//!
//! ```text
//! Get the area information through its id.
//!
//! :plugin: json_p
//! :param Int * area_id: area id
//! :raise id_not_exist: Record does not exist.
//! ```
//!
//! [`parse`] turns such a block into a tree of [`Node`]s. Inline markup is
//! left untouched here; see [`crate::markup`].
//!
//! Grammar, per block (blocks are separated by blank lines):
//!
//! - `:name: body` starts a field; more-indented lines continue the body and
//!   consecutive fields form one field list. A field marker also ends a
//!   running paragraph.
//! - a line directly followed by a more-indented line is a definition-list
//!   term; the indented lines are its definition
//! - `- `, `* ` and `+ ` start bullet-list items
//! - a paragraph ending in `::` introduces an indented literal block
//! - any other indented block is a block quote
//! - everything else is a paragraph

use serde::Serialize;
use thiserror::Error;

const TAB_WIDTH: usize = 8;

/// Deepest indentation nesting [`parse`] accepts.
pub const MAX_DEPTH: usize = 32;

/// A documentation block nested deeper than [`MAX_DEPTH`] levels.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("documentation is nested deeper than {limit} levels")]
pub struct NestingTooDeep {
    /// The limit that was exceeded.
    pub limit: usize,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Node {
    /// The root.
    Document(Vec<Node>),
    /// Running text; lines are joined with `\n`.
    Paragraph(String),
    /// A list of [`Node::DefinitionListItem`]s.
    DefinitionList(Vec<Node>),
    /// A [`Node::Term`] followed by its [`Node::Definition`].
    DefinitionListItem(Vec<Node>),
    /// The term of a definition-list item.
    Term(String),
    /// The indented body of a definition-list item.
    Definition(Vec<Node>),
    /// A list of [`Node::Field`]s.
    FieldList(Vec<Node>),
    /// A `:name: body` field.
    Field {
        /// Text between the colons.
        name: String,
        /// Body text, continuation lines dedented and joined with `\n`.
        body: String,
    },
    /// An indented block.
    BlockQuote(Vec<Node>),
    /// A list of [`Node::ListItem`]s.
    BulletList(Vec<Node>),
    /// One bullet-list item.
    ListItem(Vec<Node>),
    /// Preformatted text introduced by `::`.
    LiteralBlock(String),
}

impl Node {
    /// Child nodes; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Document(children)
            | Self::DefinitionList(children)
            | Self::DefinitionListItem(children)
            | Self::Definition(children)
            | Self::FieldList(children)
            | Self::BlockQuote(children)
            | Self::BulletList(children)
            | Self::ListItem(children) => children,
            Self::Paragraph(_) | Self::Term(_) | Self::Field { .. } | Self::LiteralBlock(_) => &[],
        }
    }

    /// All fields in document order, at any depth.
    #[must_use]
    pub fn fields(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        if let Self::Field { name, body } = self {
            out.push((name, body));
        }
        for child in self.children() {
            child.collect_fields(out);
        }
    }
}

/// Parses a documentation block.
///
/// The first line is trimmed on its own; the remaining lines are dedented by
/// their common indentation. This accepts both `///` comments and
/// docstring-style text whose first line follows the opening quote.
///
/// # Errors
///
/// [`NestingTooDeep`] when block quotes, list items or definitions nest
/// more than [`MAX_DEPTH`] levels.
///
/// # Example
///
/// ```
/// use docket_element::docblock::{parse, Node};
///
/// let tree = parse("Ping.\n\n:raise busy: Try later.\n").unwrap();
/// assert_eq!(tree.children()[0], Node::Paragraph("Ping.".into()));
/// assert_eq!(tree.fields(), vec![("raise busy", "Try later.")]);
/// ```
pub fn parse(doc: &str) -> Result<Node, NestingTooDeep> {
    parse_blocks(&dedent(doc), 0).map(Node::Document)
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn strip_indent(lines: &[String]) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indent(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if is_blank(l) { String::new() } else { l[common..].to_string() })
        .collect()
}

fn dedent(doc: &str) -> Vec<String> {
    let lines: Vec<String> = doc.lines().map(|l| expand_tabs(l.trim_end())).collect();
    let Some((first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(lines.len());
    out.push(first.trim_start().to_string());
    out.extend(strip_indent(rest));

    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out
}

/// Splits `:name: rest` into its parts.
fn field_marker(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_prefix(':')?;
    let mut search = 0;
    while let Some(pos) = body[search..].find(':') {
        let end = search + pos;
        let after = &body[end + 1..];
        if after.is_empty() || after.starts_with(' ') {
            let name = &body[..end];
            if name.is_empty() || name.starts_with(' ') || name.ends_with(' ') {
                return None;
            }
            return Some((name, after.trim_start()));
        }
        search = end + 1;
    }
    None
}

fn bullet_marker(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let marker = chars.next().filter(|c| matches!(c, '-' | '*' | '+'))?;
    let rest = chars.as_str();
    if rest.is_empty() {
        Some((marker, rest))
    } else {
        rest.strip_prefix(' ').map(|text| (marker, text.trim_start()))
    }
}

fn skip_blank(lines: &[String], mut i: usize) -> usize {
    while i < lines.len() && is_blank(&lines[i]) {
        i += 1;
    }
    i
}

/// Collects the indented lines starting at `start`, dedented.
///
/// Blank lines are taken only when more indented text follows them.
fn take_indented(lines: &[String], start: usize) -> (Vec<String>, usize) {
    let mut end = start;
    let mut i = start;
    while i < lines.len() && (is_blank(&lines[i]) || indent(&lines[i]) > 0) {
        if !is_blank(&lines[i]) {
            end = i + 1;
        }
        i += 1;
    }
    (strip_indent(&lines[start..end]), end)
}

fn starts_definition(lines: &[String], i: usize) -> bool {
    let line = &lines[i];
    !is_blank(line)
        && indent(line) == 0
        && field_marker(line).is_none()
        && bullet_marker(line).is_none()
        && lines
            .get(i + 1)
            .is_some_and(|next| !is_blank(next) && indent(next) > 0)
}

fn parse_blocks(lines: &[String], depth: usize) -> Result<Vec<Node>, NestingTooDeep> {
    if depth > MAX_DEPTH {
        return Err(NestingTooDeep { limit: MAX_DEPTH });
    }
    let mut nodes = Vec::new();
    let mut literal_next = false;
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }

        if indent(line) > 0 {
            let (block, end) = take_indented(lines, i);
            i = end;
            if std::mem::take(&mut literal_next) {
                nodes.push(Node::LiteralBlock(block.join("\n")));
            } else {
                nodes.push(Node::BlockQuote(parse_blocks(&block, depth + 1)?));
            }
            continue;
        }
        literal_next = false;

        let (node, end) = if field_marker(line).is_some() {
            parse_field_list(lines, i)
        } else if bullet_marker(line).is_some() {
            parse_bullet_list(lines, i, depth)?
        } else if starts_definition(lines, i) {
            parse_definition_list(lines, i, depth)?
        } else {
            let (text, end) = take_paragraph(lines, i);
            let (text, literal) = strip_literal_marker(text);
            literal_next = literal;
            i = end;
            if !text.is_empty() {
                nodes.push(Node::Paragraph(text));
            }
            continue;
        };
        nodes.push(node);
        i = end;
    }
    Ok(nodes)
}

fn take_paragraph(lines: &[String], start: usize) -> (String, usize) {
    let mut i = start + 1;
    while i < lines.len()
        && !is_blank(&lines[i])
        && indent(&lines[i]) == 0
        && field_marker(&lines[i]).is_none()
    {
        i += 1;
    }
    (lines[start..i].join("\n"), i)
}

/// Handles a trailing `::`: `Example::` becomes `Example:`, `Example ::`
/// becomes `Example` and a lone `::` disappears.
fn strip_literal_marker(text: String) -> (String, bool) {
    let Some(head) = text.strip_suffix("::") else {
        return (text, false);
    };
    if head.trim().is_empty() {
        (String::new(), true)
    } else if head.ends_with(char::is_whitespace) {
        (head.trim_end().to_string(), true)
    } else {
        (format!("{head}:"), true)
    }
}

fn parse_field_list(lines: &[String], mut i: usize) -> (Node, usize) {
    let mut fields = Vec::new();
    while i < lines.len() {
        let Some((name, rest)) = field_marker(&lines[i]) else {
            break;
        };
        let (continuation, end) = take_indented(lines, i + 1);
        let mut body = rest.to_string();
        let continuation = continuation.join("\n");
        let continuation = continuation.trim();
        if !continuation.is_empty() {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(continuation);
        }
        fields.push(Node::Field {
            name: name.trim().to_string(),
            body,
        });

        let next = skip_blank(lines, end);
        if next < lines.len() && field_marker(&lines[next]).is_some() {
            i = next;
        } else {
            i = end;
            break;
        }
    }
    (Node::FieldList(fields), i)
}

fn parse_bullet_list(
    lines: &[String],
    mut i: usize,
    depth: usize,
) -> Result<(Node, usize), NestingTooDeep> {
    let marker = bullet_marker(&lines[i]).map(|(m, _)| m);
    let mut items = Vec::new();
    while i < lines.len() {
        let Some((m, first)) = bullet_marker(&lines[i]) else {
            break;
        };
        if Some(m) != marker {
            break;
        }
        let (continuation, end) = take_indented(lines, i + 1);
        let mut item_lines = vec![first.to_string()];
        item_lines.extend(continuation);
        items.push(Node::ListItem(parse_blocks(&item_lines, depth + 1)?));

        let next = skip_blank(lines, end);
        if next < lines.len() && bullet_marker(&lines[next]).map(|(m, _)| m) == marker {
            i = next;
        } else {
            i = end;
            break;
        }
    }
    Ok((Node::BulletList(items), i))
}

fn parse_definition_list(
    lines: &[String],
    mut i: usize,
    depth: usize,
) -> Result<(Node, usize), NestingTooDeep> {
    let mut items = Vec::new();
    while i < lines.len() && starts_definition(lines, i) {
        let term = lines[i].trim().to_string();
        let (block, end) = take_indented(lines, i + 1);
        items.push(Node::DefinitionListItem(vec![
            Node::Term(term),
            Node::Definition(parse_blocks(&block, depth + 1)?),
        ]));

        let next = skip_blank(lines, end);
        if next < lines.len() && starts_definition(lines, next) {
            i = next;
        } else {
            i = end;
            break;
        }
    }
    Ok((Node::DefinitionList(items), i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Node {
        Node::Paragraph(text.to_string())
    }

    fn field(name: &str, body: &str) -> Node {
        Node::Field {
            name: name.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_docstring_dedent() {
        let doc = "Get the area.\n\n        :plugin: json_p\n        :param Int * area_id: area id\n        ";
        let tree = parse(doc).unwrap();
        assert_eq!(
            tree,
            Node::Document(vec![
                para("Get the area."),
                Node::FieldList(vec![
                    field("plugin", "json_p"),
                    field("param Int * area_id", "area id"),
                ]),
            ])
        );
    }

    #[test]
    fn test_doc_comment_dedent() {
        let doc = " Title line\n second line\n\n :raise gone: Record is gone.";
        let tree = parse(doc).unwrap();
        assert_eq!(tree.children()[0], para("Title line\nsecond line"));
        assert_eq!(tree.fields(), vec![("raise gone", "Record is gone.")]);
    }

    #[test]
    fn test_field_marker_forms() {
        assert_eq!(field_marker(":plugin: a b"), Some(("plugin", "a b")));
        assert_eq!(field_marker(":param Str * identity:"), Some(("param Str * identity", "")));
        assert_eq!(field_marker(":a:b: c"), Some(("a:b", "c")));
        assert_eq!(field_marker("::"), None);
        assert_eq!(field_marker(": x: y"), None);
        assert_eq!(field_marker("plain"), None);
    }

    #[test]
    fn test_field_continuation_and_blank_separation() {
        let doc = "T\n\n:raise a: first\n   continued\n\n:raise b: second\n\nTrailing text.";
        let tree = parse(doc).unwrap();
        assert_eq!(
            tree.children()[1],
            Node::FieldList(vec![field("raise a", "first\ncontinued"), field("raise b", "second")])
        );
        assert_eq!(tree.children()[2], para("Trailing text."));
    }

    #[test]
    fn test_field_marker_ends_paragraph() {
        let tree = parse("Summary\n:plugin: token").unwrap();
        assert_eq!(
            tree.children(),
            &[para("Summary"), Node::FieldList(vec![field("plugin", "token")])]
        );
    }

    #[test]
    fn test_definition_list() {
        let tree = parse("\n    Area lookup\n        Returns one area.\n\n        More detail.\n    ").unwrap();
        let Node::DefinitionList(items) = &tree.children()[0] else {
            panic!("expected definition list, got {tree:?}");
        };
        assert_eq!(
            items[0],
            Node::DefinitionListItem(vec![
                Node::Term("Area lookup".into()),
                Node::Definition(vec![para("Returns one area."), para("More detail.")]),
            ])
        );
    }

    #[test]
    fn test_bullet_list() {
        let tree = parse("Notes:\n\n- first\n  wrapped\n- second\n\n* other list").unwrap();
        assert_eq!(
            tree.children()[1],
            Node::BulletList(vec![
                Node::ListItem(vec![para("first\nwrapped")]),
                Node::ListItem(vec![para("second")]),
            ])
        );
        assert!(matches!(tree.children()[2], Node::BulletList(_)));
    }

    #[test]
    fn test_literal_block() {
        let tree = parse("Example::\n\n    {\"id\": 1}\n      nested\n\nAfter.").unwrap();
        assert_eq!(
            tree.children(),
            &[
                para("Example:"),
                Node::LiteralBlock("{\"id\": 1}\n  nested".into()),
                para("After."),
            ]
        );

        let tree = parse("Title\n\n::\n\n    raw").unwrap();
        assert_eq!(tree.children(), &[para("Title"), Node::LiteralBlock("raw".into())]);
    }

    #[test]
    fn test_block_quote() {
        let tree = parse("Title\n\n    quoted text\n\nEnd").unwrap();
        assert_eq!(
            tree.children(),
            &[para("Title"), Node::BlockQuote(vec![para("quoted text")]), para("End")]
        );
    }

    #[test]
    fn test_tabs_expand() {
        assert_eq!(expand_tabs("\tx"), "        x");
        assert_eq!(expand_tabs("ab\tx"), "ab      x");
    }

    #[test]
    fn test_nesting_is_capped() {
        let staircase = |levels: usize| {
            (0..levels)
                .map(|k| format!("{}step", " ".repeat(k)))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert!(parse(&staircase(16)).is_ok());
        assert_eq!(
            parse(&staircase(64)),
            Err(NestingTooDeep { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap(), Node::Document(Vec::new()));
        assert_eq!(parse("   \n\n  ").unwrap(), Node::Document(Vec::new()));
    }
}
