//! Serializers for bound objects
//!
//! - [`XmlSerializer`]: renders objects back to XML through the same
//!   metadata the parsers bind with
//! - [`JsonSerializer`]: renders objects as JSON values

mod json;
mod xml;

pub use json::JsonSerializer;
pub use xml::XmlSerializer;

use indexmap::IndexMap;
use serde::Deserialize;

/// Options controlling XML output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SerializerConfig {
    /// Emit the `<?xml ...?>` declaration
    pub xml_declaration: bool,
    /// Encoding named in the declaration
    pub encoding: String,
    /// Indent nested elements; alters whitespace of mixed content
    pub pretty_print: bool,
    /// Spaces per indentation level
    pub indent: usize,
    /// Preferred prefix per namespace URI, keyed by prefix
    pub namespaces: IndexMap<String, String>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            encoding: "UTF-8".to_string(),
            pretty_print: false,
            indent: 2,
            namespaces: IndexMap::new(),
        }
    }
}

impl SerializerConfig {
    /// Set whether the declaration is emitted
    pub fn with_xml_declaration(mut self, xml_declaration: bool) -> Self {
        self.xml_declaration = xml_declaration;
        self
    }

    /// Indent the output
    pub fn with_pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = pretty_print;
        self
    }

    /// Prefer `prefix` for `uri`
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }
}
