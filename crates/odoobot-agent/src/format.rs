// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML rendering of assistant replies and turn errors.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").unwrap());

/// Escape the characters that would otherwise open markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render model text as HTML with a timing footnote.
///
/// Supports `**bold**`, `*italic*`, and `` `code` ``. Empty input renders as
/// an empty string.
pub fn format_response(text: &str, elapsed: Option<Duration>) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape_html(text);
    let bold = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>$1</em>");
    let code = CODE.replace_all(&italic, "<code>$1</code>");
    let body = code.replace("\r\n", "<br/>").replace('\n', "<br/>");

    let footer = match elapsed.filter(|d| !d.is_zero()) {
        Some(d) => format!(
            "<div class=\"odoobot-footer\">⚡ Response generated in {:.2}s • MCP Assistant</div>",
            d.as_secs_f64()
        ),
        None => String::new(),
    };

    format!("<div class=\"odoobot-response\">{body}</div>{footer}")
}

/// Render a failed turn with suggested remedies.
pub fn format_error(message: &str) -> String {
    format!(
        "<div class=\"odoobot-error\">\
<h5>❌ Error</h5>\
<p><strong>Details:</strong> {}</p>\
<p><strong>Possible solutions:</strong></p>\
<ul>\
<li>Check your API key configuration</li>\
<li>Verify network connectivity</li>\
<li>Check API rate limits</li>\
</ul>\
</div>",
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_renders_nothing() {
        assert_eq!(format_response("", Some(Duration::from_secs(1))), "");
    }

    #[test]
    fn markdown_subset_is_converted() {
        let html = format_response("**Total**: *3* leads via `crm.lead`", None);
        assert!(html.contains("<strong>Total</strong>"));
        assert!(html.contains("<em>3</em>"));
        assert!(html.contains("<code>crm.lead</code>"));
    }

    #[test]
    fn newlines_become_breaks() {
        let html = format_response("a\nb\r\nc", None);
        assert!(html.contains("a<br/>b<br/>c"));
    }

    #[test]
    fn markup_in_model_text_is_escaped() {
        let html = format_response("<script>alert(1)</script> & co", None);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn footer_only_for_positive_elapsed() {
        let with = format_response("hi", Some(Duration::from_millis(1234)));
        assert!(with.contains("⚡ Response generated in 1.23s"));
        assert!(!format_response("hi", Some(Duration::ZERO)).contains("⚡"));
        assert!(!format_response("hi", None).contains("⚡"));
    }

    #[test]
    fn error_block_lists_remedies() {
        let html = format_error("Invalid <key>");
        assert!(html.contains("❌ Error"));
        assert!(html.contains("Invalid &lt;key&gt;"));
        assert!(html.contains("Check your API key configuration"));
        assert!(html.contains("Verify network connectivity"));
        assert!(html.contains("Check API rate limits"));
    }

    proptest! {
        #[test]
        fn output_never_contains_raw_angle_brackets_from_input(text in "[a-z<>&\\n ]{1,60}") {
            let html = format_response(&text, None);
            let inner = html
                .trim_start_matches("<div class=\"odoobot-response\">")
                .trim_end_matches("</div>")
                .replace("<br/>", "");
            prop_assert!(!inner.contains('<'));
            prop_assert!(!inner.contains('>'));
        }

        #[test]
        fn non_empty_input_is_wrapped(text in ".{1,80}") {
            let html = format_response(&text, None);
            prop_assert!(html.starts_with("<div class=\"odoobot-response\">"));
            prop_assert!(html.ends_with("</div>"));
        }
    }
}
