//! Inline markup rendering.
//!
//! Paragraphs, terms and field bodies are rendered to HTML with a small set
//! of inline constructs:
//!
//! | Source | HTML |
//! |--------|------|
//! | ``` ``code`` ``` | `<code>code</code>` |
//! | `**strong**` | `<strong>strong</strong>` |
//! | `*emphasis*` | `<em>emphasis</em>` |
//! | `` `text <https://x>`_ `` | `<a href="https://x">text</a>` |
//! | `` `title` `` | `<cite>title</cite>` |
//!
//! Everything else is HTML-escaped. Line breaks and runs of whitespace
//! collapse to a single space. An opening marker only counts at the start of
//! the text or after whitespace or opening punctuation, and needs a matching
//! closing marker that directly follows non-whitespace; otherwise it is
//! rendered literally.

/// Escapes text for inclusion in HTML.
#[must_use]
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Renders inline markup to HTML.
///
/// # Example
///
/// ```
/// use docket_element::markup::to_html;
///
/// assert_eq!(
///     to_html("Use **GET**\nfor `docs <https://example.com>`_"),
///     r#"Use <strong>GET</strong> for <a href="https://example.com">docs</a>"#
/// );
/// assert_eq!(to_html("a < b"), "a &lt; b");
/// ```
#[must_use]
pub fn to_html(source: &str) -> String {
    let text = source.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text.as_str();
    let mut prev: Option<char> = None;

    while let Some(c) = rest.chars().next() {
        if can_open(prev) {
            if let Some((html, consumed)) = inline(rest) {
                out.push_str(&html);
                prev = rest[..consumed].chars().last();
                rest = &rest[consumed..];
                continue;
            }
        }
        out.push_str(&escape(c.encode_utf8(&mut [0; 4])));
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn can_open(prev: Option<char>) -> bool {
    prev.map_or(true, |c| c.is_whitespace() || "'\"([{<-/:".contains(c))
}

/// Finds the closing `marker` in `body`, which starts right after the opener.
fn find_close(body: &str, marker: &str) -> Option<usize> {
    if body.is_empty() || body.starts_with(char::is_whitespace) || body.starts_with(marker) {
        return None;
    }
    let mut from = 0;
    while let Some(pos) = body[from..].find(marker) {
        let at = from + pos;
        if at > 0 && !body[..at].ends_with(char::is_whitespace) {
            return Some(at);
        }
        from = at + marker.len();
    }
    None
}

fn wrap(tag: &str, body: &str) -> String {
    format!("<{tag}>{}</{tag}>", escape(body))
}

/// Renders one inline construct at the start of `s`.
///
/// Returns the HTML and the number of bytes consumed.
fn inline(s: &str) -> Option<(String, usize)> {
    if let Some(body) = s.strip_prefix("``") {
        let end = find_close(body, "``")?;
        return Some((wrap("code", &body[..end]), end + 4));
    }
    if let Some(body) = s.strip_prefix("**") {
        let end = find_close(body, "**")?;
        return Some((wrap("strong", &body[..end]), end + 4));
    }
    if let Some(body) = s.strip_prefix('*') {
        let end = find_close(body, "*")?;
        return Some((wrap("em", &body[..end]), end + 2));
    }
    if let Some(body) = s.strip_prefix('`') {
        let end = find_close(body, "`")?;
        let inner = &body[..end];
        if body[end + 1..].starts_with('_') {
            return Some((reference(inner), end + 3));
        }
        return Some((wrap("cite", inner), end + 2));
    }
    None
}

/// Renders `` `text <url>`_ ``; a reference without a target is plain text.
fn reference(inner: &str) -> String {
    let target = inner
        .strip_suffix('>')
        .and_then(|head| head.rfind('<').map(|at| (&head[..at], &head[at + 1..])));
    match target {
        Some((text, url)) if !url.trim().is_empty() => {
            let text = text.trim();
            let text = if text.is_empty() { url } else { text };
            format!(r#"<a href="{}">{}</a>"#, escape(url.trim()), escape(text))
        }
        _ => escape(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped_and_collapsed() {
        assert_eq!(to_html("Record  does\nnot   exist."), "Record does not exist.");
        assert_eq!(to_html("<b> & \"q\""), "&lt;b&gt; &amp; &quot;q&quot;");
        assert_eq!(to_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_inline_constructs() {
        assert_eq!(to_html("``a < b``"), "<code>a &lt; b</code>");
        assert_eq!(to_html("a **bold** b"), "a <strong>bold</strong> b");
        assert_eq!(to_html("(*em*)"), "(<em>em</em>)");
        assert_eq!(to_html("see `RFC 5322`"), "see <cite>RFC 5322</cite>");
        assert_eq!(
            to_html("`home <https://a.b/?x=1&y=2>`_"),
            r#"<a href="https://a.b/?x=1&amp;y=2">home</a>"#
        );
        assert_eq!(to_html("`plain`_"), "plain");
        assert_eq!(
            to_html("`<https://a.b>`_"),
            r#"<a href="https://a.b">https://a.b</a>"#
        );
    }

    #[test]
    fn test_unmatched_markers_are_literal() {
        assert_eq!(to_html("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(to_html("a*b*c"), "a*b*c");
        assert_eq!(to_html("**open"), "**open");
        assert_eq!(to_html("`tick"), "`tick");
        assert_eq!(to_html("* spaced*"), "* spaced*");
    }

    #[test]
    fn test_empty() {
        assert_eq!(to_html(""), "");
        assert_eq!(to_html(" \n "), "");
    }
}
