//! Static content-model table.
//!
//! For each known tag: its permitted attributes and its permitted children.
//! Tags not in the table are never constrained.

use crate::mark::ContentType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// What an element may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildModel {
    /// Void element, no children at all.
    Empty,
    /// Text and phrasing elements.
    Phrasing,
    /// Anything.
    Flow,
    /// Text plus exactly the listed elements.
    Only(&'static [&'static str]),
}

/// Content model of one known tag.
#[derive(Debug, Clone, Copy)]
pub struct ElementModel {
    /// Tag-specific attributes (global attributes are implied)
    pub attributes: &'static [&'static str],
    /// Permitted children
    pub children: ChildModel,
    /// Rendering classification
    pub content_type: ContentType,
}

const GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey", "class", "dir", "hidden", "id", "lang", "role", "style", "tabindex", "title",
    "translate", "xml:lang", "onblur", "onclick", "ondblclick", "onfocus", "onkeydown",
    "onkeypress", "onkeyup", "onmousedown", "onmousemove", "onmouseout", "onmouseover",
    "onmouseup",
];

const PHRASING: &[&str] = &[
    "a", "abbr", "acronym", "audio", "b", "bdi", "bdo", "big", "br", "button", "canvas", "cite",
    "code", "data", "del", "dfn", "em", "embed", "i", "iframe", "img", "input", "ins", "kbd",
    "label", "map", "mark", "meter", "noscript", "object", "output", "progress", "q", "s", "samp",
    "script", "select", "small", "span", "strike", "strong", "sub", "sup", "textarea", "time",
    "tt", "u", "var", "video", "wbr",
];

const REPLACED: &[&str] = &[
    "audio", "br", "button", "canvas", "embed", "iframe", "img", "input", "object", "select",
    "textarea", "video", "wbr",
];

use ChildModel::{Empty, Flow, Only, Phrasing};

const TABLE: &[(&str, &[&str], ChildModel)] = &[
    ("a", &["charset", "download", "href", "hreflang", "name", "rel", "rev", "target", "type"], Phrasing),
    ("abbr", &[], Phrasing),
    ("acronym", &[], Phrasing),
    ("address", &[], Flow),
    ("area", &["alt", "coords", "href", "nohref", "shape", "target"], Empty),
    ("article", &[], Flow),
    ("aside", &[], Flow),
    ("audio", &["autoplay", "controls", "loop", "muted", "preload", "src"], Flow),
    ("b", &[], Phrasing),
    ("base", &["href", "target"], Empty),
    ("bdi", &[], Phrasing),
    ("bdo", &[], Phrasing),
    ("big", &[], Phrasing),
    ("blockquote", &["cite"], Flow),
    ("body", &["onload", "onunload"], Flow),
    ("br", &["clear"], Empty),
    ("button", &["disabled", "name", "type", "value"], Phrasing),
    ("canvas", &["height", "width"], Flow),
    ("caption", &["align"], Phrasing),
    ("center", &[], Flow),
    ("cite", &[], Phrasing),
    ("code", &[], Phrasing),
    ("col", &["align", "char", "charoff", "span", "valign", "width"], Empty),
    ("colgroup", &["align", "char", "charoff", "span", "valign", "width"], Only(&["col"])),
    ("data", &["value"], Phrasing),
    ("dd", &[], Flow),
    ("del", &["cite", "datetime"], Flow),
    ("details", &["open"], Flow),
    ("dfn", &[], Phrasing),
    ("div", &["align"], Flow),
    ("dl", &[], Only(&["dt", "dd"])),
    ("dt", &[], Phrasing),
    ("em", &[], Phrasing),
    ("embed", &["height", "src", "type", "width"], Empty),
    ("fieldset", &["disabled", "name"], Flow),
    ("figcaption", &[], Flow),
    ("figure", &[], Flow),
    ("footer", &[], Flow),
    ("form", &["accept-charset", "action", "enctype", "method", "name", "onreset", "onsubmit", "target"], Flow),
    ("h1", &["align"], Phrasing),
    ("h2", &["align"], Phrasing),
    ("h3", &["align"], Phrasing),
    ("h4", &["align"], Phrasing),
    ("h5", &["align"], Phrasing),
    ("h6", &["align"], Phrasing),
    ("head", &["profile"], Only(&["base", "link", "meta", "script", "style", "title"])),
    ("header", &[], Flow),
    ("hr", &["align", "noshade", "size", "width"], Empty),
    ("html", &["xmlns"], Only(&["body", "head"])),
    ("i", &[], Phrasing),
    ("iframe", &["allowfullscreen", "frameborder", "height", "name", "scrolling", "src", "width"], Flow),
    ("img", &["align", "alt", "border", "height", "hspace", "ismap", "longdesc", "src", "usemap", "vspace", "width"], Empty),
    ("input", &["accept", "align", "alt", "checked", "disabled", "ismap", "maxlength", "name", "readonly", "size", "src", "type", "usemap", "value"], Empty),
    ("ins", &["cite", "datetime"], Flow),
    ("kbd", &[], Phrasing),
    ("label", &["for"], Phrasing),
    ("legend", &["align"], Phrasing),
    ("li", &["type", "value"], Flow),
    ("link", &["charset", "href", "hreflang", "media", "rel", "rev", "target", "type"], Empty),
    ("main", &[], Flow),
    ("map", &["name"], Flow),
    ("mark", &[], Phrasing),
    ("meta", &["content", "http-equiv", "name", "scheme"], Empty),
    ("meter", &["high", "low", "max", "min", "optimum", "value"], Phrasing),
    ("nav", &[], Flow),
    ("noscript", &[], Flow),
    ("object", &["archive", "classid", "codebase", "codetype", "data", "declare", "height", "name", "standby", "type", "usemap", "width"], Flow),
    ("ol", &["compact", "reversed", "start", "type"], Only(&["li"])),
    ("optgroup", &["disabled", "label"], Only(&["option"])),
    ("option", &["disabled", "label", "selected", "value"], Only(&[])),
    ("output", &["for", "name"], Phrasing),
    ("p", &["align"], Phrasing),
    ("param", &["name", "type", "value", "valuetype"], Empty),
    ("pre", &["width"], Phrasing),
    ("progress", &["max", "value"], Phrasing),
    ("q", &["cite"], Phrasing),
    ("s", &[], Phrasing),
    ("samp", &[], Phrasing),
    ("script", &["charset", "defer", "language", "src", "type"], Only(&[])),
    ("section", &[], Flow),
    ("select", &["disabled", "multiple", "name", "size"], Only(&["optgroup", "option"])),
    ("small", &[], Phrasing),
    ("source", &["media", "src", "type"], Empty),
    ("span", &[], Phrasing),
    ("strike", &[], Phrasing),
    ("strong", &[], Phrasing),
    ("style", &["media", "type"], Only(&[])),
    ("sub", &[], Phrasing),
    ("summary", &[], Phrasing),
    ("sup", &[], Phrasing),
    ("table", &["align", "bgcolor", "border", "cellpadding", "cellspacing", "frame", "rules", "summary", "width"], Only(&["caption", "col", "colgroup", "tbody", "tfoot", "thead", "tr"])),
    ("tbody", &["align", "char", "charoff", "valign"], Only(&["tr"])),
    ("td", &["abbr", "align", "axis", "bgcolor", "char", "charoff", "colspan", "headers", "height", "nowrap", "rowspan", "scope", "valign", "width"], Flow),
    ("textarea", &["cols", "disabled", "name", "readonly", "rows"], Only(&[])),
    ("tfoot", &["align", "char", "charoff", "valign"], Only(&["tr"])),
    ("th", &["abbr", "align", "axis", "bgcolor", "char", "charoff", "colspan", "headers", "height", "nowrap", "rowspan", "scope", "valign", "width"], Flow),
    ("thead", &["align", "char", "charoff", "valign"], Only(&["tr"])),
    ("time", &["datetime"], Phrasing),
    ("title", &[], Only(&[])),
    ("tr", &["align", "bgcolor", "char", "charoff", "valign"], Only(&["td", "th"])),
    ("track", &["default", "kind", "label", "src", "srclang"], Empty),
    ("tt", &[], Phrasing),
    ("u", &[], Phrasing),
    ("ul", &["compact", "type"], Only(&["li"])),
    ("var", &[], Phrasing),
    ("video", &["autoplay", "controls", "height", "loop", "muted", "poster", "preload", "src", "width"], Flow),
    ("wbr", &[], Empty),
];

static MODELS: Lazy<HashMap<&'static str, ElementModel>> = Lazy::new(|| {
    TABLE
        .iter()
        .map(|&(name, attributes, children)| {
            let content_type = if REPLACED.contains(&name) {
                ContentType::Replaced
            } else if PHRASING.contains(&name) {
                ContentType::Markup
            } else {
                ContentType::Block
            };
            (
                name,
                ElementModel {
                    attributes,
                    children,
                    content_type,
                },
            )
        })
        .collect()
});

/// Looks up the model of a tag (case-insensitive).
pub fn model(name: &str) -> Option<&'static ElementModel> {
    MODELS
        .get(name)
        .or_else(|| MODELS.get(name.to_ascii_lowercase().as_str()))
}

/// Is `name` a tag the table knows about?
pub fn is_known(name: &str) -> bool {
    model(name).is_some()
}

/// Is `name` a void element (`br`, `img`, ...)?
pub fn is_empty_element(name: &str) -> bool {
    model(name).is_some_and(|m| m.children == ChildModel::Empty)
}

/// Is `name` a phrasing (inline) element?
pub fn is_phrasing(name: &str) -> bool {
    PHRASING.contains(&name)
}

/// Content type of an element; nameless fragments are [`ContentType::None`] and
/// unknown tags count as block-level.
pub fn content_type_of(name: Option<&str>) -> ContentType {
    match name {
        None => ContentType::None,
        Some(name) => model(name).map_or(ContentType::Block, |m| m.content_type),
    }
}

/// May `attribute` appear on `tag`? Unknown tags accept everything.
pub fn allows_attribute(tag: &str, attribute: &str) -> bool {
    let Some(model) = model(tag) else {
        return true;
    };
    let attribute = attribute.to_ascii_lowercase();
    attribute.starts_with("data-")
        || attribute.starts_with("aria-")
        || GLOBAL_ATTRIBUTES.contains(&attribute.as_str())
        || model.attributes.contains(&attribute.as_str())
}

/// May `child` be nested directly in `parent`? Unknown tags on either side are allowed.
pub fn allows_child(parent: &str, child: &str) -> bool {
    let (Some(parent_model), true) = (model(parent), is_known(child)) else {
        return true;
    };
    let child = child.to_ascii_lowercase();
    match parent_model.children {
        ChildModel::Empty => false,
        ChildModel::Flow => true,
        ChildModel::Phrasing => is_phrasing(&child),
        ChildModel::Only(list) => list.contains(&child.as_str()),
    }
}
