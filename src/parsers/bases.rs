//! Event sinks
//!
//! Handlers translate a concrete XML source into three calls on a
//! [`ParseSink`]: `start`, `end` and `register_namespace`. The
//! [`NodeParser`] sink builds bound objects from them; the
//! [`RecordParser`] wraps another sink and keeps a log of every call.

use super::config::ParserConfig;
use super::nodes::{self, Attributes, ElementNode, Objects, XmlNode};
use crate::context::XmlContext;
use crate::dataobjects::Value;
use crate::error::{Error, Result};
use crate::models::ClassId;
use crate::namespaces::{NamespaceMap, QName};
use std::fmt;

/// Receiver of normalized parse events
pub trait ParseSink {
    /// An element opened; `ns_map` holds the namespaces in scope for it
    fn start(&mut self, qname: &QName, attrs: Attributes, ns_map: NamespaceMap) -> Result<()>;

    /// An element closed. Returns the root value once the root closes.
    fn end(&mut self, qname: &QName, text: Option<String>, tail: Option<String>)
        -> Result<Option<Value>>;

    /// A namespace prefix was declared
    fn register_namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<()>;

    /// Every prefix declared during the parse, first declaration wins
    fn ns_map(&self) -> &NamespaceMap;
}

/// Sink building bound objects for a root class
#[derive(Debug)]
pub struct NodeParser<'a> {
    context: &'a XmlContext,
    config: &'a ParserConfig,
    clazz: ClassId,
    queue: Vec<XmlNode>,
    objects: Objects,
    ns_map: NamespaceMap,
    done: bool,
}

impl<'a> NodeParser<'a> {
    /// Create a sink binding the root element to `clazz`
    pub fn new(context: &'a XmlContext, config: &'a ParserConfig, clazz: ClassId) -> Self {
        Self {
            context,
            config,
            clazz,
            queue: Vec::new(),
            objects: Vec::new(),
            ns_map: NamespaceMap::new(),
            done: false,
        }
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.queue.len()
    }
}

impl ParseSink for NodeParser<'_> {
    fn start(&mut self, qname: &QName, attrs: Attributes, ns_map: NamespaceMap) -> Result<()> {
        if self.done {
            return Err(Error::Structure(format!(
                "start of `{}` after the root element closed",
                qname
            )));
        }
        self.config.limits.check_depth(self.queue.len() + 1)?;
        self.config.limits.check_attributes(attrs.len())?;

        let position = self.objects.len();
        let node = match self.queue.last() {
            Some(parent) => parent.child(self.context, self.config, qname, attrs, ns_map, position)?,
            None => {
                let xsi_type = nodes::xsi_type(&attrs, &ns_map)?;
                let meta = self.context.fetch(self.clazz, None, xsi_type.as_ref())?;
                XmlNode::Element(ElementNode::new(meta, attrs, ns_map, position))
            }
        };

        tracing::trace!(qname = %qname, depth = self.queue.len(), "start element");
        self.queue.push(node);
        Ok(())
    }

    fn end(
        &mut self,
        qname: &QName,
        text: Option<String>,
        tail: Option<String>,
    ) -> Result<Option<Value>> {
        let node = self.queue.pop().ok_or_else(|| {
            Error::Structure(format!("end of `{}` without a matching start", qname))
        })?;
        node.bind(self.config, qname, text, tail, &mut self.objects)?;

        if !self.queue.is_empty() {
            return Ok(None);
        }
        self.done = true;
        Ok(self.objects.pop().map(|(_, value)| value))
    }

    fn register_namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<()> {
        let key = prefix.map(String::from);
        if !self.ns_map.contains_key(&key) {
            self.config.limits.check_namespaces(self.ns_map.len() + 1)?;
            self.ns_map.insert(key, uri.to_string());
        }
        Ok(())
    }

    fn ns_map(&self) -> &NamespaceMap {
        &self.ns_map
    }
}

/// A sink call captured by [`RecordParser`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    /// Element opened
    Start {
        /// Element name
        qname: QName,
        /// Attributes
        attrs: Attributes,
        /// Namespaces in scope
        ns_map: NamespaceMap,
    },
    /// Element closed
    End {
        /// Element name
        qname: QName,
        /// Text before the first child
        text: Option<String>,
        /// Text after the closing tag
        tail: Option<String>,
    },
    /// Namespace declared
    StartNs {
        /// Prefix; `None` is the default namespace
        prefix: Option<String>,
        /// Namespace URI
        uri: String,
    },
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedEvent::Start { qname, attrs, .. } => {
                write!(f, "start {}", qname)?;
                for (name, value) in attrs {
                    write!(f, " {}={:?}", name, value)?;
                }
                Ok(())
            }
            RecordedEvent::End { qname, text, tail } => {
                write!(f, "end {} text={:?} tail={:?}", qname, text, tail)
            }
            RecordedEvent::StartNs { prefix, uri } => {
                write!(f, "start-ns {} {}", prefix.as_deref().unwrap_or(""), uri)
            }
        }
    }
}

/// Sink wrapper logging every call before delegating
#[derive(Debug)]
pub struct RecordParser<P> {
    inner: P,
    events: Vec<RecordedEvent>,
}

impl<P: ParseSink> RecordParser<P> {
    /// Wrap a sink
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            events: Vec::new(),
        }
    }

    /// Calls seen so far
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Take the log, dropping the wrapped sink
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }
}

impl<P: ParseSink> ParseSink for RecordParser<P> {
    fn start(&mut self, qname: &QName, attrs: Attributes, ns_map: NamespaceMap) -> Result<()> {
        self.events.push(RecordedEvent::Start {
            qname: qname.clone(),
            attrs: attrs.clone(),
            ns_map: ns_map.clone(),
        });
        self.inner.start(qname, attrs, ns_map)
    }

    fn end(
        &mut self,
        qname: &QName,
        text: Option<String>,
        tail: Option<String>,
    ) -> Result<Option<Value>> {
        self.events.push(RecordedEvent::End {
            qname: qname.clone(),
            text: text.clone(),
            tail: tail.clone(),
        });
        self.inner.end(qname, text, tail)
    }

    fn register_namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<()> {
        self.events.push(RecordedEvent::StartNs {
            prefix: prefix.map(String::from),
            uri: uri.to_string(),
        });
        self.inner.register_namespace(prefix, uri)
    }

    fn ns_map(&self) -> &NamespaceMap {
        self.inner.ns_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::DataType;
    use crate::models::{ClassDescriptor, FieldDescriptor};

    fn item_context() -> (XmlContext, ClassId) {
        let context = XmlContext::new();
        let clazz = context
            .register(
                ClassDescriptor::new("Item")
                    .with_field(FieldDescriptor::element("name", DataType::String))
                    .with_field(FieldDescriptor::attribute("id", DataType::Int)),
            )
            .unwrap();
        (context, clazz)
    }

    #[test]
    fn test_end_without_start() {
        let (context, clazz) = item_context();
        let config = ParserConfig::default();
        let mut parser = NodeParser::new(&context, &config, clazz);
        let result = parser.end(&QName::local("Item"), None, None);
        assert!(matches!(result, Err(Error::Structure(_))));
    }

    #[test]
    fn test_builds_root_value() {
        let (context, clazz) = item_context();
        let config = ParserConfig::default();
        let mut parser = NodeParser::new(&context, &config, clazz);

        let mut attrs = Attributes::new();
        attrs.insert(QName::local("id"), "7".into());
        parser.start(&QName::local("Item"), attrs, NamespaceMap::new()).unwrap();
        parser.start(&QName::local("name"), Attributes::new(), NamespaceMap::new()).unwrap();
        assert_eq!(parser.depth(), 2);
        assert_eq!(parser.end(&QName::local("name"), Some("pen".into()), None).unwrap(), None);

        let value = parser.end(&QName::local("Item"), None, None).unwrap().unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("name"), Some(&Value::from("pen")));
        assert_eq!(obj.get("id"), Some(&Value::Int(7)));

        let again = parser.start(&QName::local("Item"), Attributes::new(), NamespaceMap::new());
        assert!(matches!(again, Err(Error::Structure(_))));
    }

    #[test]
    fn test_first_prefix_declaration_wins() {
        let (context, clazz) = item_context();
        let config = ParserConfig::default();
        let mut parser = RecordParser::new(NodeParser::new(&context, &config, clazz));
        parser.register_namespace(Some("a"), "urn:one").unwrap();
        parser.register_namespace(Some("a"), "urn:two").unwrap();
        parser.register_namespace(None, "urn:default").unwrap();

        assert_eq!(parser.ns_map().get(&Some("a".to_string())).map(String::as_str), Some("urn:one"));
        assert_eq!(parser.ns_map().get(&None).map(String::as_str), Some("urn:default"));
        assert_eq!(parser.events().len(), 3);
        assert_eq!(parser.events()[0].to_string(), "start-ns a urn:one");
    }
}
