//! Trailing modifier syntax: `.(title)[class #id]{style}` plus alignment.

use crate::html::HtmlElement;
use crate::options::HtmlOptions;
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex fragment matching a modifier; group 1 holds the body after the dot.
/// Patterns embed it as `(?:[ \t]+{MODIFIER})?`.
pub const MODIFIER: &str =
    r"\.((?:\([^)\n]+\)|\[[^\]\n]+\]|\{[^}\n]+\}|<>|>|=|<){1,4})";

static PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([^)\n]+)\)|\[([^\]\n]+)\]|\{([^}\n]+)\}|(<>|>|=|<)")
        .expect("modifier part regex is valid")
});

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    /// `<`
    Left,
    /// `>`
    Right,
    /// `<>`
    Center,
    /// `=`
    Justify,
}

impl HAlign {
    /// CSS `text-align` value
    pub fn as_css(self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Right => "right",
            HAlign::Center => "center",
            HAlign::Justify => "justify",
        }
    }
}

/// Parsed modifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifier {
    /// `(title)`
    pub title: Option<String>,
    /// Classes from `[...]`
    pub classes: Vec<String>,
    /// `#id` from `[...]`
    pub id: Option<String>,
    /// Properties from `{...}`, in order
    pub styles: Vec<(String, String)>,
    /// Alignment marker
    pub h_align: Option<HAlign>,
}

impl Modifier {
    /// Parses a modifier body (the text after the dot). Malformed parts are ignored.
    pub fn parse(body: Option<&str>) -> Self {
        let mut modifier = Self::default();
        let Some(body) = body else {
            return modifier;
        };
        for caps in PART.captures_iter(body) {
            if let Some(title) = caps.get(1) {
                let title = title.as_str().trim();
                if !title.is_empty() {
                    modifier.title = Some(title.to_string());
                }
            } else if let Some(classes) = caps.get(2) {
                for word in classes.as_str().split_whitespace() {
                    match word.strip_prefix('#') {
                        Some(id) if !id.is_empty() => modifier.id = Some(id.to_string()),
                        Some(_) => {}
                        None => modifier.classes.push(word.to_string()),
                    }
                }
            } else if let Some(styles) = caps.get(3) {
                for declaration in styles.as_str().split(';') {
                    let Some((property, value)) = declaration.split_once(':') else {
                        continue;
                    };
                    let property = property.trim().to_ascii_lowercase();
                    let value = value.trim();
                    if !property.is_empty() && !value.is_empty() {
                        modifier.styles.push((property, value.to_string()));
                    }
                }
            } else if let Some(align) = caps.get(4) {
                modifier.h_align = match align.as_str() {
                    "<" => Some(HAlign::Left),
                    ">" => Some(HAlign::Right),
                    "<>" => Some(HAlign::Center),
                    _ => Some(HAlign::Justify),
                };
            }
        }
        modifier
    }

    /// True when nothing was specified.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the modifier to `el`, filtering classes, ids and styles through
    /// the configured whitelists.
    pub fn decorate(&self, el: &mut HtmlElement, html: &HtmlOptions) {
        if let Some(title) = &self.title {
            el.set_attr("title", title.as_str());
        }
        for class in &self.classes {
            if html.allowed_classes.permits(class) {
                el.add_class(class);
            }
        }
        if let Some(id) = &self.id
            && html.permits_id(id)
        {
            el.set_attr("id", id.as_str());
        }
        for (property, value) in &self.styles {
            if html.allowed_styles.permits(property) {
                el.set_style(property, value);
            }
        }
        if let Some(align) = self.h_align {
            el.set_style("text-align", align.as_css());
        }
    }
}
