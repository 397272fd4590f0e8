//! Input normalization run before any pattern sees the text.

use quillmark_core::mark::strip_reserved;

/// Normalized text and the number of reserved characters that were removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Text with `\n` line endings, expanded tabs and no trailing whitespace
    pub text: String,
    /// Reserved placeholder characters stripped from the input
    pub stripped: usize,
}

/// Strips reserved characters, unifies line endings, expands tabs to
/// `tab_width` columns and trims trailing whitespace from every line.
pub fn normalize(input: &str, tab_width: usize) -> Normalized {
    let (text, stripped) = strip_reserved(input);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(expand_tabs(line, tab_width).trim_end());
    }

    Normalized {
        text: out,
        stripped,
    }
}

fn expand_tabs(line: &str, tab_width: usize) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + tab_width);
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = tab_width - column % tab_width;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_and_trailing_space() {
        let normalized = normalize("a  \r\nb\rc\t\n", 8);
        assert_eq!(normalized.text, "a\nb\nc\n");
        assert_eq!(normalized.stripped, 0);
    }

    #[test]
    fn tabs_expand_to_the_next_stop() {
        assert_eq!(normalize("\tx", 4).text, "    x");
        assert_eq!(normalize("ab\tx", 4).text, "ab  x");
        assert_eq!(normalize("abcd\tx", 4).text, "abcd    x");
    }

    #[test]
    fn reserved_characters_are_counted() {
        let normalized = normalize("a\u{14}b\u{1F}", 8);
        assert_eq!(normalized.text, "ab");
        assert_eq!(normalized.stripped, 2);
    }
}
