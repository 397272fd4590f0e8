use thiserror::Error;

/// Errors that can occur while building or running the markup engine.
///
/// Malformed *input* never produces one of these: disallowed tags, broken
/// modifiers and unmatched delimiters degrade to literal text and are reported
/// as [`ParseWarning`]s instead.
#[derive(Debug, Error)]
pub enum QuillError {
    /// An element name was empty or contained characters not allowed in a tag name.
    #[error("Invalid element name: {name:?}")]
    InvalidElementName {
        /// The rejected name
        name: String,
    },
    /// A pattern source did not compile as a regular expression.
    #[error("Invalid pattern `{name}`: {source}")]
    InvalidPattern {
        /// Pattern name
        name: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
    /// An option value is out of its permitted range.
    #[error("Invalid option `{field}`: {message}")]
    InvalidOption {
        /// Dotted path of the offending option
        field: &'static str,
        /// Error message
        message: String,
    },
    /// A placeholder expands (directly or transitively) into itself.
    #[error("Placeholder cycle detected at mark {id}")]
    MarkCycle {
        /// Id of the mark seen twice on the expansion path
        id: u32,
    },
    /// A placeholder references an id that was never stored.
    #[error("Unknown mark {id}")]
    UnknownMark {
        /// The dangling id
        id: u32,
    },
    /// The per-document mark table ran out of ids.
    #[error("Mark table is full")]
    MarkTableFull,
    /// Block/line parser recursion went deeper than the configured limit.
    #[error("Nesting exceeds the limit of {limit} levels")]
    NestingTooDeep {
        /// Configured maximum depth
        limit: usize,
    },
    /// The per-document time limit elapsed.
    #[error("Document processing exceeded its time limit")]
    DeadlineExceeded,
    /// Error raised from inside a module callback or handler.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl QuillError {
    /// Create a handler error from a message
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Returns true for structural failures that abort a `process` call
    /// (as opposed to contract violations by a caller or collaborator module).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            QuillError::MarkCycle { .. }
                | QuillError::UnknownMark { .. }
                | QuillError::MarkTableFull
                | QuillError::NestingTooDeep { .. }
                | QuillError::DeadlineExceeded
        )
    }
}

/// Non-fatal problems found in the input. The offending span is rendered as
/// literal text (or dropped) and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A tag outside the active whitelist was emitted as escaped text.
    DisallowedTag {
        /// Tag name as written in the input
        tag: String,
    },
    /// An attribute outside the tag's whitelist was dropped.
    DisallowedAttribute {
        /// Tag carrying the attribute
        tag: String,
        /// Dropped attribute name
        attribute: String,
    },
    /// A child element not permitted by the parent's content model was flattened.
    InvalidNesting {
        /// Parent tag name
        parent: String,
        /// Child tag name
        child: String,
    },
    /// A block-level fragment was refused inside an inline context.
    BlockInInline {
        /// Name of the pattern that produced the fragment
        pattern: String,
    },
    /// Reserved placeholder characters were removed from the input.
    ReservedCharacters {
        /// Number of characters removed
        count: usize,
    },
}

impl ParseWarning {
    /// Stable snake_case identifier, e.g. `"disallowed_tag"`
    pub fn kind(&self) -> &'static str {
        match self {
            ParseWarning::DisallowedTag { .. } => "disallowed_tag",
            ParseWarning::DisallowedAttribute { .. } => "disallowed_attribute",
            ParseWarning::InvalidNesting { .. } => "invalid_nesting",
            ParseWarning::BlockInInline { .. } => "block_in_inline",
            ParseWarning::ReservedCharacters { .. } => "reserved_characters",
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::DisallowedTag { tag } => {
                write!(f, "tag <{}> is not allowed and was escaped", tag)
            }
            ParseWarning::DisallowedAttribute { tag, attribute } => {
                write!(f, "attribute '{}' is not allowed on <{}>", attribute, tag)
            }
            ParseWarning::InvalidNesting { parent, child } => {
                write!(f, "<{}> may not contain <{}>; child flattened", parent, child)
            }
            ParseWarning::BlockInInline { pattern } => {
                write!(f, "block content from '{}' refused in inline context", pattern)
            }
            ParseWarning::ReservedCharacters { count } => {
                write!(f, "{} reserved control character(s) removed", count)
            }
        }
    }
}

/// Collection of warnings gathered while processing one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseDiagnostics {
    /// Warnings in the order they were raised
    pub warnings: Vec<ParseWarning>,
}

impl ParseDiagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the collection
    pub fn add_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get total count of warnings
    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Iterate over the warnings
    pub fn iter(&self) -> std::slice::Iter<'_, ParseWarning> {
        self.warnings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_kinds_are_distinguished() {
        assert!(QuillError::MarkCycle { id: 3 }.is_fatal());
        assert!(QuillError::NestingTooDeep { limit: 4 }.is_fatal());
        assert!(!QuillError::InvalidElementName { name: String::new() }.is_fatal());
        assert!(!QuillError::handler("boom").is_fatal());
    }

    #[test]
    fn warnings_render_readably() {
        let warning = ParseWarning::DisallowedAttribute {
            tag: "code".into(),
            attribute: "onclick".into(),
        };
        assert_eq!(
            warning.to_string(),
            "attribute 'onclick' is not allowed on <code>"
        );
    }

    #[test]
    fn diagnostics_count() {
        let mut diagnostics = ParseDiagnostics::new();
        assert!(!diagnostics.has_warnings());
        diagnostics.add_warning(ParseWarning::ReservedCharacters { count: 2 });
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(diagnostics.iter().count(), 1);
    }
}
