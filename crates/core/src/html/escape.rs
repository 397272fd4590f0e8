//! HTML escaping helpers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static ESCAPED_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&amp;([a-zA-Z][a-zA-Z0-9]*|#x[0-9a-fA-F]+|#[0-9]+);")
        .expect("entity regex is valid")
});

/// Escapes text content (`&`, `<`, `>`).
pub fn escape_text(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escapes an attribute value for a double-quoted context.
///
/// `&`, `<`, `>` and `"` are always escaped, but a character reference that is
/// already present (`&amp;`, `&#160;`, `&#x41;`) is kept as-is, so escaping an
/// already escaped value is a no-op.
pub fn escape_attribute(value: &str) -> String {
    let encoded = html_escape::encode_double_quoted_attribute(value);
    ESCAPED_ENTITY.replace_all(&encoded, "&$1;").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escaping() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
    }

    #[test]
    fn attribute_escapes_all_four() {
        assert_eq!(escape_attribute(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn attribute_escaping_is_stable() {
        let once = escape_attribute(r#"x & "y" <z>"#);
        assert_eq!(escape_attribute(&once), once);
    }

    #[test]
    fn existing_references_survive() {
        assert_eq!(escape_attribute("&#160;&#x41;&copy;"), "&#160;&#x41;&copy;");
        assert_eq!(escape_attribute("a && b"), "a &amp;&amp; b");
    }
}
