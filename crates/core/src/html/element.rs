//! Output node tree.

use super::dtd;
use super::escape::{escape_attribute, escape_text};
use crate::error::QuillError;
use crate::mark::ContentType;
use crate::options::OutputOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

static ELEMENT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_:.-]*$").expect("element name regex is valid")
});

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Plain string value
    Text(String),
    /// Boolean presence attribute (`checked`); `false` is not rendered
    Flag(bool),
    /// Space separated list (`class`)
    List(Vec<String>),
    /// Ordered `key:value` pairs (`style`)
    Map(Vec<(String, String)>),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

impl From<Vec<(String, String)>> for AttrValue {
    fn from(value: Vec<(String, String)>) -> Self {
        AttrValue::Map(value)
    }
}

impl AttrValue {
    fn render(&self, name: &str, output: OutputOptions) -> Option<String> {
        let value = match self {
            AttrValue::Text(text) => text.clone(),
            AttrValue::Flag(false) => return None,
            AttrValue::Flag(true) if output.xhtml => name.to_string(),
            AttrValue::Flag(true) => return Some(format!(" {name}")),
            AttrValue::List(items) => {
                let items: Vec<&str> = items
                    .iter()
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .collect();
                if items.is_empty() {
                    return None;
                }
                items.join(" ")
            }
            AttrValue::Map(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .filter(|(key, value)| !key.is_empty() && !value.is_empty())
                    .map(|(key, value)| format!("{key}:{value}"))
                    .collect();
                if pairs.is_empty() {
                    return None;
                }
                pairs.join(";")
            }
        };
        Some(format!(" {}=\"{}\"", name, escape_attribute(&value)))
    }
}

/// A child of an element: raw text (escaped on output) or a nested element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// Literal text, possibly containing placeholder tokens
    Text(String),
    /// Nested element
    Element(HtmlElement),
}

/// Opaque handle for finding an element again after it was moved into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    /// Wrap a raw handle value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Returned by [`HtmlElement::to_plain_text`] when an element child is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("element has non-text content")]
pub struct NonTextContent;

/// An output node: optional tag name, attributes and ordered children.
///
/// A nameless element is a fragment carrier and renders only its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlElement {
    name: Option<String>,
    attrs: BTreeMap<String, AttrValue>,
    children: Vec<Child>,
    void: bool,
    node_ref: Option<NodeRef>,
}

impl HtmlElement {
    /// Creates an element, rejecting names that are not valid tag names.
    pub fn new(name: &str) -> Result<Self, QuillError> {
        let mut el = Self::default();
        el.set_name(name)?;
        Ok(el)
    }

    /// Creates a nameless fragment.
    pub fn fragment() -> Self {
        Self::default()
    }

    /// Builder: sets an attribute.
    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: sets the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Tag name, `None` for fragments.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Renames the element; the void flag follows the new name.
    pub fn set_name(&mut self, name: &str) -> Result<(), QuillError> {
        if !ELEMENT_NAME.is_match(name) {
            return Err(QuillError::InvalidElementName {
                name: name.to_string(),
            });
        }
        self.void = dtd::is_empty_element(name);
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Is this a void element rendered without an end tag?
    pub fn is_void(&self) -> bool {
        self.void
    }

    /// Forces the void flag (used for `<custom/>` in trust-all mode).
    pub fn set_void(&mut self, void: bool) {
        self.void = void;
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Attribute value as a string, if it is a plain text value.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(AttrValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Is the attribute present (and not a `false` flag)?
    pub fn has_attr(&self, name: &str) -> bool {
        !matches!(self.attrs.get(name), None | Some(AttrValue::Flag(false)))
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.attrs.remove(name)
    }

    /// Iterates attributes in rendering order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Appends a class, converting a plain `class` value into a list first.
    pub fn add_class(&mut self, class: &str) {
        let entry = self
            .attrs
            .entry("class".to_string())
            .or_insert_with(|| AttrValue::List(Vec::new()));
        if let AttrValue::Text(text) = entry {
            *entry = AttrValue::List(text.split_whitespace().map(str::to_string).collect());
        }
        if let AttrValue::List(list) = entry
            && !list.iter().any(|c| c == class)
        {
            list.push(class.to_string());
        }
    }

    /// Sets one CSS property, keeping the order of the others.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let entry = self
            .attrs
            .entry("style".to_string())
            .or_insert_with(|| AttrValue::Map(Vec::new()));
        if !matches!(entry, AttrValue::Map(_)) {
            *entry = AttrValue::Map(Vec::new());
        }
        if let AttrValue::Map(pairs) = entry {
            match pairs.iter().position(|(key, _)| key == property) {
                Some(index) => pairs[index].1 = value.to_string(),
                None => pairs.push((property.to_string(), value.to_string())),
            }
        }
    }

    /// Replaces all children with a single text child.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Child::Text(text.into()));
    }

    /// Appends a text child.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.children.push(Child::Text(text.into()));
    }

    /// Appends an element child.
    pub fn add_child(&mut self, child: HtmlElement) {
        self.children.push(Child::Element(child));
    }

    /// Children in order.
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Mutable children.
    pub fn children_mut(&mut self) -> &mut Vec<Child> {
        &mut self.children
    }

    /// Handle assigned by the parser, if any.
    pub fn node_ref(&self) -> Option<NodeRef> {
        self.node_ref
    }

    /// Tags this element with a handle.
    pub fn set_node_ref(&mut self, node_ref: NodeRef) {
        self.node_ref = Some(node_ref);
    }

    /// Depth-first search for the element carrying `node_ref`.
    pub fn find_mut(&mut self, node_ref: NodeRef) -> Option<&mut HtmlElement> {
        if self.node_ref == Some(node_ref) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Child::Element(el) => el.find_mut(node_ref),
            Child::Text(_) => None,
        })
    }

    /// Content type derived from the tag name.
    pub fn content_type(&self) -> ContentType {
        dtd::content_type_of(self.name())
    }

    /// Start tag with attributes; empty for fragments.
    pub fn start_tag(&self, output: OutputOptions) -> String {
        let Some(name) = &self.name else {
            return String::new();
        };
        let mut tag = format!("<{name}");
        for (attr, value) in &self.attrs {
            if let Some(rendered) = value.render(attr, output) {
                tag.push_str(&rendered);
            }
        }
        if self.void && output.xhtml {
            tag.push_str(" />");
        } else {
            tag.push('>');
        }
        tag
    }

    /// End tag; empty for fragments and void elements.
    pub fn end_tag(&self) -> String {
        match &self.name {
            Some(name) if !self.void => format!("</{name}>"),
            _ => String::new(),
        }
    }

    /// Serializes the subtree. Text children are escaped, placeholder tokens survive.
    pub fn to_html(&self, output: OutputOptions) -> String {
        let mut html = self.start_tag(output);
        if !self.void {
            for child in &self.children {
                match child {
                    Child::Text(text) => html.push_str(&escape_text(text)),
                    Child::Element(el) => html.push_str(&el.to_html(output)),
                }
            }
        }
        html.push_str(&self.end_tag());
        html
    }

    /// Concatenated text, provided every child is text.
    pub fn to_plain_text(&self) -> Result<String, NonTextContent> {
        self.children
            .iter()
            .map(|child| match child {
                Child::Text(text) => Ok(text.as_str()),
                Child::Element(_) => Err(NonTextContent),
            })
            .collect()
    }

    /// Drops attributes the content model does not allow; returns their names.
    pub fn validate_attributes(&mut self) -> Vec<String> {
        let Some(name) = self.name.clone() else {
            return Vec::new();
        };
        let mut dropped = Vec::new();
        self.attrs.retain(|attr, _| {
            let keep = dtd::allows_attribute(&name, attr);
            if !keep {
                dropped.push(attr.clone());
            }
            keep
        });
        dropped
    }

    /// May `child` be nested directly inside this element?
    pub fn validate_child(&self, child: &Child) -> bool {
        let Some(name) = self.name() else {
            return true;
        };
        match child {
            Child::Text(_) => !self.void,
            Child::Element(el) => match el.name() {
                Some(child_name) => !self.void && dtd::allows_child(name, child_name),
                None => !self.void,
            },
        }
    }
}
