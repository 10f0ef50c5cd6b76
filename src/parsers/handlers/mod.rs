//! Parsing handlers
//!
//! A handler reads a concrete XML source and drives a
//! [`ParseSink`](super::ParseSink):
//!
//! - [`EventHandler`] walks a parsed `roxmltree` document as a list of
//!   `start`, `end` and `start-ns` events, and expands `xi:include`
//! - [`SaxHandler`] streams a `quick-xml` reader and buffers character
//!   data per element until it knows whether it is text or tail

mod event;
mod sax;

pub use event::{document_events, EventHandler};
pub use sax::SaxHandler;

use super::nodes::Attributes;
use crate::namespaces::{NamespaceMap, QName};
use serde::Deserialize;
use std::path::Path;

/// Start-element event kind
pub const EVENT_START: &str = "start";
/// End-element event kind
pub const EVENT_END: &str = "end";
/// Namespace declaration event kind
pub const EVENT_START_NS: &str = "start-ns";

/// Element payload of a `start` or `end` event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementEvent {
    /// Element name
    pub qname: QName,
    /// Attributes; empty on `end`
    pub attrs: Attributes,
    /// Namespaces in scope; empty on `end`
    pub ns_map: NamespaceMap,
    /// Text before the first child; unset on `start`
    pub text: Option<String>,
    /// Text after the closing tag; unset on `start`
    pub tail: Option<String>,
}

impl ElementEvent {
    /// Payload of a start event
    pub fn start(qname: QName, attrs: Attributes, ns_map: NamespaceMap) -> Self {
        Self {
            qname,
            attrs,
            ns_map,
            ..Default::default()
        }
    }

    /// Payload of an end event
    pub fn end(qname: QName, text: Option<String>, tail: Option<String>) -> Self {
        Self {
            qname,
            text,
            tail,
            ..Default::default()
        }
    }
}

/// Payload of one event
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// Element payload
    Element(ElementEvent),
    /// Namespace declaration
    Namespace {
        /// Prefix; `None` is the default namespace
        prefix: Option<String>,
        /// Namespace URI
        uri: String,
    },
    /// No payload
    Empty,
}

/// Event kind paired with its payload
pub type ContextEvent = (&'static str, EventData);

/// Input of a handler
#[derive(Debug, Clone, Copy)]
pub enum XmlSource<'a> {
    /// File on disk
    Path(&'a Path),
    /// In-memory document
    Bytes(&'a [u8]),
}

/// Which handler parses a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Tree-walking handler with `xi:include` support
    #[default]
    Event,
    /// Streaming handler
    Sax,
}

impl std::str::FromStr for HandlerKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "event" => Ok(Self::Event),
            "sax" => Ok(Self::Sax),
            other => Err(crate::error::Error::Handler(format!(
                "Unknown handler `{}`, expected `event` or `sax`.",
                other
            ))),
        }
    }
}
