//! Minimal immutable XML tree used by the XML-based adapters.
//!
//! Adapters walk foreign XML documents read-only; derived state lives in
//! their own context structs, never on the parsed nodes. This tree keeps
//! element names, attributes in document order, child elements and
//! character data, which is all the supported formats need.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::FormatError;

/// One parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<XmlNode>,
    /// Concatenated character data directly inside this element.
    pub text: String,
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| FormatError::xml(format!("invalid tag name: {e}")))?
            .to_string();

        let mut attributes = IndexMap::new();
        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|e| FormatError::xml(format!("invalid attribute: {e}")))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| FormatError::xml(format!("invalid attribute name: {e}")))?
                .to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| FormatError::xml(format!("invalid attribute value: {e}")))?
                .into_owned();
            attributes.insert(key, value);
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Parse a whole document into its root element.
    pub fn parse(input: &[u8]) -> Result<XmlNode, FormatError> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref start)) => {
                    stack.push(XmlNode::from_start(start)?);
                }
                Ok(Event::Empty(ref start)) => {
                    let node = XmlNode::from_start(start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(node),
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| FormatError::xml(format!("invalid text: {e}")))?;
                        parent.text.push_str(&text);
                    }
                }
                Ok(Event::End(_)) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| FormatError::xml("unbalanced end tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(node),
                    }
                }
                Ok(Event::Eof) => {
                    return Err(if stack.is_empty() {
                        FormatError::xml("document has no root element")
                    } else {
                        FormatError::xml("unexpected end of document")
                    });
                }
                Err(e) => {
                    return Err(FormatError::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, or a missing-attribute error naming it.
    pub fn require_attr(&self, name: &str) -> Result<&str, FormatError> {
        self.attr(name)
            .ok_or_else(|| FormatError::missing_attribute(format!("{}@{name}", self.name)))
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// First child element, or a missing-element error naming it.
    pub fn require_child(&self, name: &str) -> Result<&XmlNode, FormatError> {
        self.child(name)
            .ok_or_else(|| FormatError::missing_element(format!("{}/{name}", self.name)))
    }

    /// All child elements with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Walk a path of child element names.
    pub fn descendant(&self, path: &[&str]) -> Option<&XmlNode> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &[u8] = br#"<?xml version="1.0"?>
        <Root Version="1.2">
            <Child Name="first">hello</Child>
            <Child Name="second"/>
            <Nested><Inner Value="42"/></Nested>
        </Root>"#;

    #[test]
    fn test_parse_structure() {
        let root = XmlNode::parse(DOC).unwrap();
        assert_eq!(root.name, "Root");
        assert_eq!(root.attr("Version"), Some("1.2"));
        assert_eq!(root.children_named("Child").count(), 2);
    }

    #[test]
    fn test_text_content() {
        let root = XmlNode::parse(DOC).unwrap();
        assert_eq!(root.child("Child").unwrap().text, "hello");
    }

    #[test]
    fn test_descendant_path() {
        let root = XmlNode::parse(DOC).unwrap();
        let inner = root.descendant(&["Nested", "Inner"]).unwrap();
        assert_eq!(inner.attr("Value"), Some("42"));
    }

    #[test]
    fn test_require_attr_names_element() {
        let root = XmlNode::parse(DOC).unwrap();
        let error = root.require_attr("Missing").unwrap_err();
        assert!(error.to_string().contains("Root@Missing"));
    }

    #[test]
    fn test_malformed_document() {
        assert!(XmlNode::parse(b"<open>").is_err());
        assert!(XmlNode::parse(b"").is_err());
    }
}
