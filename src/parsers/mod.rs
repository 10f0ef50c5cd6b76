//! Document parsers
//!
//! [`XmlParser`] binds a document to a registered root class:
//!
//! ```text
//! source ──▶ handler (event | sax) ──▶ ParseSink ──▶ XmlNode stack ──▶ DataObject
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use xmlbind::converters::DataType;
//! use xmlbind::models::{ClassDescriptor, FieldDescriptor};
//! use xmlbind::{XmlContext, XmlParser};
//!
//! let context = Arc::new(XmlContext::new());
//! let item = context
//!     .register(
//!         ClassDescriptor::new("Item")
//!             .with_local_name("item")
//!             .with_field(FieldDescriptor::element("name", DataType::String)),
//!     )
//!     .unwrap();
//!
//! let mut parser = XmlParser::new(context);
//! let obj = parser.from_str("<item><name>pen</name></item>", item).unwrap();
//! assert_eq!(obj.get("name").and_then(|v| v.as_str()), Some("pen"));
//! ```

mod bases;
mod config;
mod handlers;
mod nodes;

pub use bases::{NodeParser, ParseSink, RecordParser, RecordedEvent};
pub use config::ParserConfig;
pub use handlers::{
    document_events, ContextEvent, ElementEvent, EventData, EventHandler, HandlerKind,
    SaxHandler, XmlSource, EVENT_END, EVENT_START, EVENT_START_NS,
};
pub use nodes::{Attributes, ElementNode, PrimitiveNode, WildcardNode, XmlNode};

use crate::context::XmlContext;
use crate::dataobjects::{DataObject, Value};
use crate::error::{Error, Result};
use crate::models::ClassId;
use crate::namespaces::NamespaceMap;
use std::path::Path;
use std::sync::Arc;

enum Input<'a, 'input> {
    Source(XmlSource<'a>),
    Tree(roxmltree::Node<'a, 'input>),
}

/// Binds XML documents to model classes
#[derive(Debug)]
pub struct XmlParser {
    context: Arc<XmlContext>,
    config: ParserConfig,
    handler: HandlerKind,
    record_events: bool,
    ns_map: NamespaceMap,
    events: Vec<RecordedEvent>,
}

impl XmlParser {
    /// Create a parser with the default configuration and handler
    pub fn new(context: Arc<XmlContext>) -> Self {
        Self {
            context,
            config: ParserConfig::default(),
            handler: HandlerKind::default(),
            record_events: false,
            ns_map: NamespaceMap::new(),
            events: Vec::new(),
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Select the handler
    pub fn with_handler(mut self, handler: HandlerKind) -> Self {
        self.handler = handler;
        self
    }

    /// Keep a log of every sink call of the next parses
    pub fn with_event_recording(mut self, record_events: bool) -> Self {
        self.record_events = record_events;
        self
    }

    /// The configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Mutable configuration
    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    /// The shared context
    pub fn context(&self) -> &Arc<XmlContext> {
        &self.context
    }

    /// Prefixes declared by the last parsed document
    pub fn ns_map(&self) -> &NamespaceMap {
        &self.ns_map
    }

    /// Sink calls of the last parse, when recording is enabled
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Parse a file
    pub fn from_path(&mut self, path: impl AsRef<Path>, clazz: ClassId) -> Result<DataObject> {
        self.run(clazz, Input::Source(XmlSource::Path(path.as_ref())))
    }

    /// Parse an in-memory document
    pub fn from_bytes(&mut self, bytes: &[u8], clazz: ClassId) -> Result<DataObject> {
        self.run(clazz, Input::Source(XmlSource::Bytes(bytes)))
    }

    /// Parse a document held in a string
    pub fn from_str(&mut self, xml: &str, clazz: ClassId) -> Result<DataObject> {
        self.from_bytes(xml.as_bytes(), clazz)
    }

    /// Parse a subtree of an already loaded document. Always walks the
    /// tree, whatever the selected handler.
    pub fn parse_tree(&mut self, node: roxmltree::Node<'_, '_>, clazz: ClassId) -> Result<DataObject> {
        self.run(clazz, Input::Tree(node))
    }

    fn run(&mut self, clazz: ClassId, input: Input<'_, '_>) -> Result<DataObject> {
        tracing::debug!(class = %clazz, handler = ?self.handler, "parsing document");

        let (result, ns_map, events) = {
            let parser = NodeParser::new(&self.context, &self.config, clazz);
            if self.record_events {
                let mut sink = RecordParser::new(parser);
                let result = drive(&mut sink, self.handler, &self.config, input);
                let ns_map = sink.ns_map().clone();
                (result, ns_map, sink.into_events())
            } else {
                let mut sink = parser;
                let result = drive(&mut sink, self.handler, &self.config, input);
                (result, sink.ns_map().clone(), Vec::new())
            }
        };

        self.ns_map = ns_map;
        self.events = events;

        let value = result?.ok_or_else(|| Error::Parser("Document has no root element".into()))?;
        into_object(value)
    }
}

fn drive<P: ParseSink>(
    sink: &mut P,
    handler: HandlerKind,
    config: &ParserConfig,
    input: Input<'_, '_>,
) -> Result<Option<Value>> {
    match (handler, input) {
        (_, Input::Tree(node)) => EventHandler::new(sink, config).parse_node(node),
        (HandlerKind::Event, Input::Source(source)) => EventHandler::new(sink, config).parse(source),
        (HandlerKind::Sax, Input::Source(source)) => SaxHandler::new(sink, config).parse(source),
    }
}

fn into_object(value: Value) -> Result<DataObject> {
    match value {
        Value::Object(obj) => Ok(*obj),
        Value::Derived(derived) => into_object(derived.value),
        Value::Null => Err(Error::Parser("Root element is nil".into())),
        other => Err(Error::Parser(format!("Root element bound to {:?}", other))),
    }
}
