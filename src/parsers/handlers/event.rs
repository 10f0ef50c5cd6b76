//! Tree-walking handler

use super::{ContextEvent, EventData, XmlSource, EVENT_END, EVENT_START, EVENT_START_NS};
use crate::dataobjects::Value;
use crate::documents::{parse_document, DocumentEvents};
use crate::error::{Error, Result};
use crate::loaders::Loader;
use crate::locations::Location;
use crate::parsers::{ParseSink, ParserConfig};

/// Handler parsing a whole document with `roxmltree` and replaying it as
/// `start`, `end` and `start-ns` events
pub struct EventHandler<'p, P> {
    parser: &'p mut P,
    config: &'p ParserConfig,
    loader: Loader,
}

impl<'p, P: ParseSink> EventHandler<'p, P> {
    /// Create a handler feeding `parser`
    pub fn new(parser: &'p mut P, config: &'p ParserConfig) -> Self {
        Self {
            parser,
            config,
            loader: Loader::new().with_limits(config.limits.clone()),
        }
    }

    /// Parse a file or an in-memory document
    pub fn parse(&mut self, source: XmlSource<'_>) -> Result<Option<Value>> {
        let (text, base) = match source {
            XmlSource::Path(path) => {
                let location = Location::Path(path.to_path_buf());
                (self.loader.load(&location)?, Some(location))
            }
            XmlSource::Bytes(bytes) => {
                self.config.limits.check_document_size(bytes.len())?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| Error::Xml(format!("Document is not valid UTF-8: {}", e)))?
                    .to_string();
                let base = self.config.base_url.as_deref().map(Location::parse).transpose()?;
                (text, base)
            }
        };

        let document = parse_document(&text)?;
        let events = DocumentEvents::new(&self.loader, self.config.process_xinclude)
            .collect(document.root_element(), base.as_ref())?;
        self.process_context(events)
    }

    /// Parse an already loaded tree, starting at `node`
    pub fn parse_node(&mut self, node: roxmltree::Node<'_, '_>) -> Result<Option<Value>> {
        let base = self.config.base_url.as_deref().map(Location::parse).transpose()?;
        let events = DocumentEvents::new(&self.loader, self.config.process_xinclude)
            .collect(node, base.as_ref())?;
        self.process_context(events)
    }

    /// Replay events into the sink; returns the root value
    pub fn process_context<I, S>(&mut self, events: I) -> Result<Option<Value>>
    where
        I: IntoIterator<Item = (S, EventData)>,
        S: AsRef<str>,
    {
        let mut result = None;
        for (kind, data) in events {
            match (kind.as_ref(), data) {
                (EVENT_START, EventData::Element(element)) => {
                    self.parser.start(&element.qname, element.attrs, element.ns_map)?;
                }
                (EVENT_END, EventData::Element(element)) => {
                    if let Some(value) = self.parser.end(&element.qname, element.text, element.tail)? {
                        result = Some(value);
                    }
                }
                (EVENT_START_NS, EventData::Namespace { prefix, uri }) => {
                    self.parser.register_namespace(prefix.as_deref(), &uri)?;
                }
                (kind, _) => {
                    return Err(Error::Handler(format!("Unhandled event: `{}`.", kind)));
                }
            }
        }
        Ok(result)
    }
}

/// Events of a document, without binding them
pub fn document_events(text: &str, config: &ParserConfig, base: Option<&Location>) -> Result<Vec<ContextEvent>> {
    let loader = Loader::new().with_limits(config.limits.clone());
    let document = parse_document(text)?;
    DocumentEvents::new(&loader, config.process_xinclude).collect(document.root_element(), base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::XmlContext;
    use crate::converters::DataType;
    use crate::models::{ClassDescriptor, FieldDescriptor};
    use crate::parsers::NodeParser;

    #[test]
    fn test_unhandled_event() {
        let context = XmlContext::new();
        let clazz = context
            .register(
                ClassDescriptor::new("Item").with_field(FieldDescriptor::element("name", DataType::String)),
            )
            .unwrap();
        let config = ParserConfig::default();
        let mut parser = NodeParser::new(&context, &config, clazz);
        let mut handler = EventHandler::new(&mut parser, &config);

        let result = handler.process_context(vec![("reverse", EventData::Empty)]);
        match result {
            Err(e) => assert_eq!(e.to_string(), "Unhandled event: `reverse`."),
            Ok(_) => panic!("expected a handler error"),
        }
    }

    #[test]
    fn test_document_events() {
        let events = document_events("<a><b>1</b></a>", &ParserConfig::default(), None).unwrap();
        let kinds: Vec<_> = events.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, vec!["start", "start", "end", "end"]);
    }
}
