//! Protected spans ("marks").
//!
//! Finished fragments are moved into a per-document [`MarkTable`] and replaced in
//! the working text by a fixed-width token built only from the reserved control
//! characters U+0013..U+001F. Input text never contains those characters (they
//! are stripped during normalization), so no pattern can match inside a token.
//!
//! Token layout: `D d d d d d d d d d d D` with 11 base-8 id digits `d` drawn
//! from U+0018..U+001F, framed by a delimiter `D` that encodes the content type.

use crate::error::QuillError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Lowest reserved character.
pub const RESERVED_START: char = '\u{13}';
/// Highest reserved character.
pub const RESERVED_END: char = '\u{1F}';

const DIGIT_BASE: u8 = 0x18;
const ID_DIGITS: usize = 11;
const TOKEN_LEN: usize = ID_DIGITS + 2;

/// Rendering classification of a fragment, governing what it may be nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Not content at all (comments, empty carriers).
    None,
    /// Plain inline text.
    Inline,
    /// Block-level structure.
    Block,
    /// Inline element rendered as a tag (`em`, `code`).
    Markup,
    /// Inline element whose content is opaque (`img`, `br`).
    Replaced,
}

impl ContentType {
    /// Framing byte used in tokens of this type.
    pub const fn delimiter(self) -> u8 {
        match self {
            ContentType::None => 0x13,
            ContentType::Block => 0x14,
            ContentType::Inline => 0x15,
            ContentType::Replaced => 0x16,
            ContentType::Markup => 0x17,
        }
    }

    /// Inverse of [`ContentType::delimiter`].
    pub const fn from_delimiter(byte: u8) -> Option<Self> {
        match byte {
            0x13 => Some(ContentType::None),
            0x14 => Some(ContentType::Block),
            0x15 => Some(ContentType::Inline),
            0x16 => Some(ContentType::Replaced),
            0x17 => Some(ContentType::Markup),
            _ => None,
        }
    }
}

/// Where a fragment is about to be spliced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embedding {
    /// Block context: anything goes.
    Block,
    /// Inline context. Block fragments only when explicitly acknowledged.
    Inline {
        /// The surrounding construct permits block children.
        allow_block: bool,
    },
}

impl Embedding {
    /// Can a fragment of `content_type` be spliced here?
    pub fn accepts(self, content_type: ContentType) -> bool {
        match self {
            Embedding::Block => true,
            Embedding::Inline { allow_block } => allow_block || content_type != ContentType::Block,
        }
    }
}

/// Returns true for the characters reserved for placeholder tokens.
pub fn is_reserved(ch: char) -> bool {
    (RESERVED_START..=RESERVED_END).contains(&ch)
}

/// Removes reserved characters, returning the cleaned text and how many were removed.
pub fn strip_reserved(text: &str) -> (String, usize) {
    let mut removed = 0;
    let cleaned = text
        .chars()
        .filter(|&ch| {
            let reserved = is_reserved(ch);
            removed += usize::from(reserved);
            !reserved
        })
        .collect();
    (cleaned, removed)
}

/// Encodes the token for `id` without storing anything.
pub fn placeholder(id: u32, content_type: ContentType) -> String {
    let delimiter = content_type.delimiter();
    let mut bytes = [0u8; TOKEN_LEN];
    bytes[0] = delimiter;
    bytes[TOKEN_LEN - 1] = delimiter;
    let mut rest = id;
    for slot in bytes[1..=ID_DIGITS].iter_mut().rev() {
        *slot = DIGIT_BASE + (rest % 8) as u8;
        rest /= 8;
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes a token starting at `bytes[0]`, returning its id and type.
fn decode(bytes: &[u8]) -> Option<(u32, ContentType)> {
    if bytes.len() < TOKEN_LEN {
        return None;
    }
    let content_type = ContentType::from_delimiter(bytes[0])?;
    if bytes[TOKEN_LEN - 1] != bytes[0] {
        return None;
    }
    let mut id: u64 = 0;
    for &digit in &bytes[1..=ID_DIGITS] {
        if !(DIGIT_BASE..DIGIT_BASE + 8).contains(&digit) {
            return None;
        }
        id = id * 8 + u64::from(digit - DIGIT_BASE);
    }
    u32::try_from(id).ok().map(|id| (id, content_type))
}

/// A stored fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    /// Position in the table
    pub id: u32,
    /// Finished markup, possibly containing further tokens
    pub content: String,
    /// Classification carried by the token
    pub content_type: ContentType,
}

/// Append-only per-document store of protected fragments.
#[derive(Debug, Default)]
pub struct MarkTable {
    marks: Vec<Mark>,
}

static TAG_OR_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("tag stripping regex is valid")
});

impl MarkTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` and returns the token that stands for it.
    pub fn protect(
        &mut self,
        content: impl Into<String>,
        content_type: ContentType,
    ) -> Result<String, QuillError> {
        let id = u32::try_from(self.marks.len()).map_err(|_| QuillError::MarkTableFull)?;
        if id == u32::MAX {
            return Err(QuillError::MarkTableFull);
        }
        self.marks.push(Mark {
            id,
            content: content.into(),
            content_type,
        });
        Ok(placeholder(id, content_type))
    }

    /// Looks up a stored mark.
    pub fn get(&self, id: u32) -> Option<&Mark> {
        self.marks.get(id as usize)
    }

    /// Number of stored marks.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Returns true when nothing has been protected yet.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Expands every token in `text`, recursively, until none remain.
    pub fn resolve(&self, text: &str) -> Result<String, QuillError> {
        self.resolve_reachable(text).map(|(out, _)| out)
    }

    /// Like [`resolve`](Self::resolve), also returning the ids of every mark
    /// reached from `text`. Marks that are not in the set never made it into the output.
    pub fn resolve_reachable(&self, text: &str) -> Result<(String, HashSet<u32>), QuillError> {
        let mut out = String::with_capacity(text.len());
        let mut stack = Vec::new();
        let mut cache = HashMap::new();
        self.resolve_into(text, &mut out, &mut stack, &mut cache)?;
        Ok((out, cache.into_keys().collect()))
    }

    /// Id of the mark `token` stands for, if `token` is exactly one placeholder.
    pub fn token_id(token: &str) -> Option<u32> {
        let bytes = token.as_bytes();
        if bytes.len() != TOKEN_LEN {
            return None;
        }
        decode(bytes).map(|(id, _)| id)
    }

    fn resolve_into(
        &self,
        text: &str,
        out: &mut String,
        stack: &mut Vec<u32>,
        cache: &mut HashMap<u32, String>,
    ) -> Result<(), QuillError> {
        let bytes = text.as_bytes();
        let mut copied = 0;
        let mut pos = 0;
        while pos < bytes.len() {
            let Some((id, _)) = ContentType::from_delimiter(bytes[pos])
                .and_then(|_| decode(&bytes[pos..]))
            else {
                pos += 1;
                continue;
            };
            out.push_str(&text[copied..pos]);
            if let Some(done) = cache.get(&id) {
                out.push_str(done);
            } else {
                if stack.contains(&id) {
                    return Err(QuillError::MarkCycle { id });
                }
                let mark = self.get(id).ok_or(QuillError::UnknownMark { id })?;
                stack.push(id);
                let mut expanded = String::with_capacity(mark.content.len());
                self.resolve_into(&mark.content, &mut expanded, stack, cache)?;
                stack.pop();
                out.push_str(&expanded);
                cache.insert(id, expanded);
            }
            pos += TOKEN_LEN;
            copied = pos;
        }
        out.push_str(&text[copied..]);
        Ok(())
    }

    /// Plain-text projection: resolves tokens, strips tags and comments, decodes entities.
    pub fn to_text(&self, text: &str) -> Result<String, QuillError> {
        let resolved = self.resolve(text)?;
        let stripped = TAG_OR_COMMENT.replace_all(&resolved, "");
        Ok(html_escape::decode_html_entities(&stripped).into_owned())
    }

    /// Returns true if `text` contains a token of the given type.
    pub fn contains(text: &str, content_type: ContentType) -> bool {
        let delimiter = content_type.delimiter();
        let bytes = text.as_bytes();
        bytes
            .iter()
            .enumerate()
            .any(|(pos, &b)| b == delimiter && decode(&bytes[pos..]).is_some())
    }

    /// Returns true if `text` contains a block-typed token.
    pub fn contains_block(text: &str) -> bool {
        Self::contains(text, ContentType::Block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protect_then_resolve_is_identity() {
        let mut table = MarkTable::new();
        let token = table.protect("<em>hi</em>", ContentType::Markup).unwrap();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(is_reserved));
        assert_eq!(table.resolve(&token).unwrap(), "<em>hi</em>");
    }

    #[test]
    fn nested_tokens_resolve_recursively() {
        let mut table = MarkTable::new();
        let inner = table.protect("<b>x</b>", ContentType::Markup).unwrap();
        let outer = table
            .protect(format!("<p>a {inner} b</p>"), ContentType::Block)
            .unwrap();
        assert_eq!(
            table.resolve(&format!("[{outer}]")).unwrap(),
            "[<p>a <b>x</b> b</p>]"
        );
    }

    #[test]
    fn reachable_marks_exclude_orphans() {
        let mut table = MarkTable::new();
        let orphan = table.protect("<i>gone</i>", ContentType::Markup).unwrap();
        let inner = table.protect("<b>x</b>", ContentType::Markup).unwrap();
        let outer = table.protect(format!("<p>{inner}</p>"), ContentType::Block).unwrap();
        let (html, used) = table.resolve_reachable(&outer).unwrap();
        assert_eq!(html, "<p><b>x</b></p>");
        assert_eq!(MarkTable::token_id(&orphan), Some(0));
        assert!(!used.contains(&0));
        assert!(used.contains(&1) && used.contains(&2));
        assert_eq!(MarkTable::token_id("plain"), None);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut table = MarkTable::new();
        let token = table
            .protect(placeholder(0, ContentType::Inline), ContentType::Inline)
            .unwrap();
        let err = table.resolve(&token).unwrap_err();
        assert!(matches!(err, QuillError::MarkCycle { id: 0 }));
    }

    #[test]
    fn dangling_token_is_reported() {
        let table = MarkTable::new();
        let err = table
            .resolve(&placeholder(42, ContentType::Inline))
            .unwrap_err();
        assert!(matches!(err, QuillError::UnknownMark { id: 42 }));
    }

    #[test]
    fn ids_round_trip_through_tokens() {
        for id in [0, 7, 8, 511, u32::MAX - 1] {
            let token = placeholder(id, ContentType::Replaced);
            assert_eq!(decode(token.as_bytes()), Some((id, ContentType::Replaced)));
        }
    }

    #[test]
    fn repeated_tokens_expand_each_time() {
        let mut table = MarkTable::new();
        let token = table.protect("&amp;", ContentType::Inline).unwrap();
        assert_eq!(table.resolve(&format!("{token}{token}")).unwrap(), "&amp;&amp;");
    }

    #[test]
    fn plain_text_projection() {
        let mut table = MarkTable::new();
        let code = table
            .protect("<code>a &lt; b</code>", ContentType::Markup)
            .unwrap();
        let comment = table.protect("<!-- x -->", ContentType::None).unwrap();
        assert_eq!(
            table.to_text(&format!("Use {code}{comment} now")).unwrap(),
            "Use a < b now"
        );
    }

    #[test]
    fn strip_reserved_counts() {
        let (clean, removed) = strip_reserved("a\u{13}b\u{1F}c\u{12}");
        assert_eq!(clean, "abc\u{12}");
        assert_eq!(removed, 2);
    }

    #[test]
    fn block_detection_and_embedding() {
        let mut table = MarkTable::new();
        let block = table.protect("<div></div>", ContentType::Block).unwrap();
        let inline = table.protect("<em></em>", ContentType::Markup).unwrap();
        assert!(MarkTable::contains_block(&format!("x{block}")));
        assert!(!MarkTable::contains_block(&inline));
        assert!(!Embedding::Inline { allow_block: false }.accepts(ContentType::Block));
        assert!(Embedding::Inline { allow_block: true }.accepts(ContentType::Block));
        assert!(Embedding::Block.accepts(ContentType::Block));
    }
}
