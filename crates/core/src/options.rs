//! Engine configuration.
//!
//! `Options` is read once when an engine is built and shared read-only by every
//! document processed afterwards. All sections deserialize from JSON with
//! defaults, accepting camelCase aliases for the binding crates.

use crate::error::QuillError;
use crate::html::HtmlElement;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Heading module settings
    pub heading: HeadingOptions,
    /// HTML passthrough and sanitization settings
    pub html: HtmlOptions,
    /// Serialization settings
    pub output: OutputOptions,
    /// Code span settings
    pub code: CodeOptions,
    /// Resource limits
    pub limits: Limits,
}

impl Options {
    /// Options for untrusted input: safe-mode HTML whitelist, no comments.
    pub fn safe() -> Self {
        Self {
            html: HtmlOptions {
                mode: HtmlMode::Safe,
                ..HtmlOptions::default()
            },
            ..Self::default()
        }
    }

    /// Check every value against its permitted range.
    pub fn validate(&self) -> Result<(), QuillError> {
        if !(1..=6).contains(&self.heading.top) {
            return Err(QuillError::InvalidOption {
                field: "heading.top",
                message: format!("must be between 1 and 6, got {}", self.heading.top),
            });
        }
        if self.limits.max_nesting == 0 {
            return Err(QuillError::InvalidOption {
                field: "limits.max_nesting",
                message: "must be at least 1".to_string(),
            });
        }
        if self.limits.tab_width == 0 {
            return Err(QuillError::InvalidOption {
                field: "limits.tab_width",
                message: "must be at least 1".to_string(),
            });
        }
        if self.code.tag.is_empty() {
            return Err(QuillError::InvalidOption {
                field: "code.tag",
                message: "use \"none\" to render code spans without an element".to_string(),
            });
        }
        if self.code.tag != "none" && HtmlElement::new(&self.code.tag).is_err() {
            return Err(QuillError::InvalidOption {
                field: "code.tag",
                message: format!("{:?} is not a valid element name", self.code.tag),
            });
        }
        Ok(())
    }
}

/// Heading numbering strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Balancing {
    /// Remap the levels that occur to a gapless sequence starting at `top`.
    #[default]
    Dynamic,
    /// Use the marker-derived level plus `top` unchanged.
    Fixed,
}

/// Raw heading level for each underline marker character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderlineLevels {
    /// `###` underline
    pub hash: u8,
    /// `***` underline
    pub star: u8,
    /// `===` underline
    pub equals: u8,
    /// `---` underline
    pub dash: u8,
}

impl Default for UnderlineLevels {
    fn default() -> Self {
        Self {
            hash: 0,
            star: 1,
            equals: 2,
            dash: 3,
        }
    }
}

impl UnderlineLevels {
    /// Raw level for an underline marker, `None` for characters that are not markers.
    pub fn level_for(&self, marker: char) -> Option<u8> {
        match marker {
            '#' => Some(self.hash),
            '*' => Some(self.star),
            '=' => Some(self.equals),
            '-' => Some(self.dash),
            _ => None,
        }
    }
}

/// Heading module options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingOptions {
    /// Level of the top heading, 1..=6
    pub top: u8,
    /// Numbering strategy
    pub balancing: Balancing,
    /// Generate `id` attributes from heading text
    #[serde(alias = "generateIds")]
    pub generate_ids: bool,
    /// Prefix prepended to generated ids
    #[serde(alias = "idPrefix")]
    pub id_prefix: String,
    /// Underline marker table
    pub levels: UnderlineLevels,
}

impl Default for HeadingOptions {
    fn default() -> Self {
        Self {
            top: 1,
            balancing: Balancing::Dynamic,
            generate_ids: false,
            id_prefix: "toc-".to_string(),
            levels: UnderlineLevels::default(),
        }
    }
}

/// Which raw HTML tags the passthrough module accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlMode {
    /// Any well-formed tag, known or not.
    TrustAll,
    /// Tags known to the content-model table.
    #[default]
    TrustKnown,
    /// Only the safe-tag whitelist, each with its own attribute whitelist.
    Safe,
    /// No tags at all.
    None,
}

impl HtmlMode {
    /// Trust modes allow comments unless overridden.
    pub fn is_trusted(self) -> bool {
        matches!(self, HtmlMode::TrustAll | HtmlMode::TrustKnown)
    }
}

/// An "everything", "nothing" or explicit-list whitelist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AllowRepr", into = "AllowRepr")]
pub enum Allow {
    /// Every value is allowed.
    #[default]
    All,
    /// No value is allowed.
    None,
    /// Only the listed values are allowed.
    Only(BTreeSet<String>),
}

impl Allow {
    /// Build a whitelist from a list of values.
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Allow::Only(values.into_iter().map(Into::into).collect())
    }

    /// Is `value` permitted by this whitelist?
    pub fn permits(&self, value: &str) -> bool {
        match self {
            Allow::All => true,
            Allow::None => false,
            Allow::Only(set) => set.contains(value),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AllowRepr {
    Keyword(bool),
    Word(String),
    List(Vec<String>),
}

impl From<AllowRepr> for Allow {
    fn from(repr: AllowRepr) -> Self {
        match repr {
            AllowRepr::Keyword(true) => Allow::All,
            AllowRepr::Keyword(false) => Allow::None,
            AllowRepr::Word(word) => match word.as_str() {
                "all" => Allow::All,
                "none" => Allow::None,
                _ => Allow::only([word]),
            },
            AllowRepr::List(list) => Allow::only(list),
        }
    }
}

impl From<Allow> for AllowRepr {
    fn from(allow: Allow) -> Self {
        match allow {
            Allow::All => AllowRepr::Word("all".to_string()),
            Allow::None => AllowRepr::Word("none".to_string()),
            Allow::Only(set) => AllowRepr::List(set.into_iter().collect()),
        }
    }
}

/// HTML passthrough options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    /// Tag acceptance mode
    pub mode: HtmlMode,
    /// Replaces the built-in safe-mode tag table when set
    #[serde(alias = "safeTags")]
    pub safe_tags: Option<BTreeMap<String, Vec<String>>>,
    /// Per-tag attribute whitelists merged over the safe-mode table
    #[serde(alias = "tagAttributes")]
    pub tag_attributes: BTreeMap<String, Vec<String>>,
    /// Allowed CSS classes; `#name` entries whitelist ids
    #[serde(alias = "allowedClasses")]
    pub allowed_classes: Allow,
    /// Allowed CSS properties
    #[serde(alias = "allowedStyles")]
    pub allowed_styles: Allow,
    /// Force comments on or off regardless of `mode`
    #[serde(alias = "allowComments")]
    pub allow_comments: Option<bool>,
}

impl HtmlOptions {
    /// Whether HTML comments pass through.
    pub fn comments_allowed(&self) -> bool {
        self.allow_comments.unwrap_or_else(|| self.mode.is_trusted())
    }

    /// Is `id` allowed by the class whitelist (as a `#id` entry)?
    pub fn permits_id(&self, id: &str) -> bool {
        match &self.allowed_classes {
            Allow::All => true,
            Allow::None => false,
            Allow::Only(set) => set.contains(&format!("#{id}")),
        }
    }
}

/// Serialization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Strict output: `<br />` and `checked="checked"`
    pub xhtml: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { xhtml: true }
    }
}

/// Code span options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeOptions {
    /// Element wrapping code spans, `"none"` for bare text
    pub tag: String,
}

impl Default for CodeOptions {
    fn default() -> Self {
        Self {
            tag: "code".to_string(),
        }
    }
}

/// Per-document resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum parser recursion depth
    #[serde(alias = "maxNesting")]
    pub max_nesting: usize,
    /// Optional wall-clock budget per document, in milliseconds
    #[serde(alias = "timeLimitMs")]
    pub time_limit_ms: Option<u64>,
    /// Columns per tab stop during normalization
    #[serde(alias = "tabWidth")]
    pub tab_width: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_nesting: 32,
            time_limit_ms: None,
            tab_width: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = Options::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.heading.top, 1);
        assert_eq!(options.heading.id_prefix, "toc-");
        assert_eq!(options.html.mode, HtmlMode::TrustKnown);
        assert!(options.output.xhtml);
        assert_eq!(options.limits.max_nesting, 32);
    }

    #[test]
    fn top_out_of_range_is_rejected() {
        let mut options = Options::default();
        options.heading.top = 7;
        let err = options.validate().unwrap_err();
        assert!(matches!(
            err,
            QuillError::InvalidOption {
                field: "heading.top",
                ..
            }
        ));
    }

    #[test]
    fn underline_levels() {
        let levels = UnderlineLevels::default();
        assert_eq!(levels.level_for('#'), Some(0));
        assert_eq!(levels.level_for('-'), Some(3));
        assert_eq!(levels.level_for('~'), None);
    }

    #[test]
    fn deserializes_camel_case_and_allow_forms() {
        let json = r##"{
            "heading": { "top": 2, "generateIds": true, "balancing": "fixed" },
            "html": {
                "mode": "safe",
                "allowedClasses": ["note", "#intro"],
                "allowedStyles": "none",
                "tagAttributes": { "code": ["title", "class"] }
            },
            "limits": { "maxNesting": 8 }
        }"##;
        let options: Options = serde_json::from_str(json).unwrap();
        assert_eq!(options.heading.top, 2);
        assert!(options.heading.generate_ids);
        assert_eq!(options.heading.balancing, Balancing::Fixed);
        assert_eq!(options.html.mode, HtmlMode::Safe);
        assert!(options.html.allowed_classes.permits("note"));
        assert!(!options.html.allowed_classes.permits("warning"));
        assert!(options.html.permits_id("intro"));
        assert!(!options.html.permits_id("other"));
        assert_eq!(options.html.allowed_styles, Allow::None);
        assert_eq!(options.limits.max_nesting, 8);
        assert_eq!(options.limits.tab_width, 8);
    }

    #[test]
    fn comments_follow_mode_unless_overridden() {
        let mut html = HtmlOptions::default();
        assert!(html.comments_allowed());
        html.mode = HtmlMode::Safe;
        assert!(!html.comments_allowed());
        html.allow_comments = Some(true);
        assert!(html.comments_allowed());
    }

    #[test]
    fn allow_serializes_back_to_keywords() {
        let json = serde_json::to_string(&Allow::All).unwrap();
        assert_eq!(json, "\"all\"");
        let json = serde_json::to_string(&Allow::only(["b", "a"])).unwrap();
        assert_eq!(json, "[\"a\",\"b\"]");
    }
}
