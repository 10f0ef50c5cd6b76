//! Streaming handler
//!
//! Character data arrives before the handler knows where it belongs: text
//! inside an element before its first child is the element text, text
//! after a closing tag is that element's tail. Each open element gets a
//! data frame of (text, tail) fragments, and the end of an element is
//! deferred until the next start, end or close flushes it.

use super::XmlSource;
use crate::dataobjects::Value;
use crate::error::{Error, Result};
use crate::namespaces::{NamespaceContext, QName};
use crate::parsers::{Attributes, ParseSink, ParserConfig};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Handler streaming a document with `quick-xml`
pub struct SaxHandler<'p, P> {
    parser: &'p mut P,
    config: &'p ParserConfig,
    namespaces: NamespaceContext,
    pub(crate) data_frames: Vec<(Vec<String>, Vec<String>)>,
    pub(crate) flush_next: Option<QName>,
    result: Option<Value>,
}

impl<'p, P: ParseSink> SaxHandler<'p, P> {
    /// Create a handler feeding `parser`
    pub fn new(parser: &'p mut P, config: &'p ParserConfig) -> Self {
        Self {
            parser,
            config,
            namespaces: NamespaceContext::new(),
            data_frames: Vec::new(),
            flush_next: None,
            result: None,
        }
    }

    /// Parse a file or an in-memory document
    pub fn parse(&mut self, source: XmlSource<'_>) -> Result<Option<Value>> {
        if self.config.process_xinclude {
            return Err(Error::Handler(
                "SaxHandler doesn't support xinclude elements.".to_string(),
            ));
        }

        match source {
            XmlSource::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;
                let size = file.metadata()?.len();
                self.config
                    .limits
                    .check_document_size(usize::try_from(size).unwrap_or(usize::MAX))?;
                self.feed(Reader::from_reader(BufReader::new(file)))
            }
            XmlSource::Bytes(bytes) => {
                self.config.limits.check_document_size(bytes.len())?;
                self.feed(Reader::from_reader(bytes))
            }
        }
    }

    fn feed<R: BufRead>(&mut self, mut reader: Reader<R>) -> Result<Option<Value>> {
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    self.start_element(&e)?;
                }
                Ok(Event::Empty(e)) => {
                    let qname = self.start_element(&e)?;
                    self.end(qname)?;
                }
                Ok(Event::End(e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())
                        .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
                        .to_string();
                    let qname = self.namespaces.resolve(&name)?;
                    self.end(qname)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    self.data(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| Error::Xml(format!("Invalid CDATA section: {}", e)))?;
                    self.data(&text);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }
        self.close()
    }

    fn start_element(&mut self, start: &BytesStart<'_>) -> Result<QName> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut declarations = Vec::new();
        let mut raw_attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .into_owned();

            if key == "xmlns" {
                declarations.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((Some(prefix.to_string()), value));
            } else {
                raw_attrs.push((key, value));
            }
        }

        self.namespaces.push_scope();
        for (prefix, uri) in &declarations {
            self.namespaces.declare(prefix.as_deref(), uri.clone());
        }

        let qname = self.namespaces.resolve(&name)?;
        let mut attrs = Attributes::with_capacity(raw_attrs.len());
        for (key, value) in raw_attrs {
            attrs.insert(self.namespaces.resolve_attribute(&key)?, value);
        }

        self.start(qname.clone(), attrs, declarations)?;
        Ok(qname)
    }

    /// An element opened with the namespaces it declares
    pub fn start(
        &mut self,
        qname: QName,
        attrs: Attributes,
        declarations: Vec<(Option<String>, String)>,
    ) -> Result<()> {
        if self.flush_next.is_some() {
            self.flush()?;
        }
        for (prefix, uri) in &declarations {
            self.parser.register_namespace(prefix.as_deref(), uri)?;
        }
        self.parser.start(&qname, attrs, self.namespaces.in_scope())?;
        self.data_frames.push((Vec::new(), Vec::new()));
        Ok(())
    }

    /// An element closed; binding waits for its tail
    pub fn end(&mut self, qname: QName) -> Result<()> {
        if self.flush_next.is_some() {
            self.flush()?;
        }
        self.flush_next = Some(qname);
        self.namespaces.pop_scope();
        Ok(())
    }

    /// Character data for the innermost frame
    pub fn data(&mut self, data: &str) {
        let tail = self.flush_next.is_some();
        // the root element has no tail
        if tail && self.data_frames.len() == 1 {
            return;
        }
        if let Some((text, tails)) = self.data_frames.last_mut() {
            if tail {
                tails.push(data.to_string());
            } else {
                text.push(data.to_string());
            }
        }
    }

    /// Bind the pending element with its buffered text and tail
    pub fn flush(&mut self) -> Result<()> {
        let (text, tail) = self.data_frames.pop().unwrap_or_default();
        let text = (!text.is_empty()).then(|| text.concat());
        let tail = (!tail.is_empty()).then(|| tail.concat());

        if let Some(qname) = self.flush_next.take() {
            if let Some(value) = self.parser.end(&qname, text, tail)? {
                self.result = Some(value);
            }
        }
        Ok(())
    }

    /// Flush the last pending element; returns the root value, if any
    pub fn close(&mut self) -> Result<Option<Value>> {
        if self.flush_next.is_some() {
            self.flush()?;
        }
        Ok(self.result.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    #[derive(Default)]
    struct EndRecorder {
        ends: Vec<(QName, Option<String>, Option<String>)>,
        ns_map: NamespaceMap,
    }

    impl ParseSink for EndRecorder {
        fn start(&mut self, _: &QName, _: Attributes, _: NamespaceMap) -> Result<()> {
            Ok(())
        }

        fn end(
            &mut self,
            qname: &QName,
            text: Option<String>,
            tail: Option<String>,
        ) -> Result<Option<Value>> {
            self.ends.push((qname.clone(), text, tail));
            Ok(None)
        }

        fn register_namespace(&mut self, _: Option<&str>, _: &str) -> Result<()> {
            Ok(())
        }

        fn ns_map(&self) -> &NamespaceMap {
            &self.ns_map
        }
    }

    #[test]
    fn test_flush() {
        let config = ParserConfig::default();
        let mut recorder = EndRecorder::default();
        let mut handler = SaxHandler::new(&mut recorder, &config);
        let value = QName::local("value");

        handler.data_frames.push((Vec::new(), Vec::new()));
        handler.flush_next = Some(value.clone());
        handler.flush().unwrap();
        assert!(handler.flush_next.is_none());

        handler
            .data_frames
            .push((vec!["a".to_string(), "b".to_string()], vec![String::new()]));
        handler.flush_next = Some(value.clone());
        handler.flush().unwrap();

        assert_eq!(
            recorder.ends,
            vec![
                (value.clone(), None, None),
                (value, Some("ab".to_string()), Some(String::new())),
            ]
        );
    }

    #[test]
    fn test_text_and_tail_routing() {
        let config = ParserConfig::default();
        let mut recorder = EndRecorder::default();
        let mut handler = SaxHandler::new(&mut recorder, &config);
        let result = handler
            .parse(XmlSource::Bytes(b"<a>x<b>y</b>z</a>"))
            .unwrap();
        assert!(result.is_none());

        assert_eq!(
            recorder.ends,
            vec![
                (QName::local("b"), Some("y".into()), Some("z".into())),
                (QName::local("a"), Some("x".into()), None),
            ]
        );
    }

    #[test]
    fn test_close_without_elements() {
        let config = ParserConfig::default();
        let mut recorder = EndRecorder::default();
        let mut handler = SaxHandler::new(&mut recorder, &config);
        assert!(handler.close().unwrap().is_none());
    }

    #[test]
    fn test_rejects_xinclude() {
        let config = ParserConfig::default().with_xinclude(true);
        let mut recorder = EndRecorder::default();
        let mut handler = SaxHandler::new(&mut recorder, &config);
        let err = handler.parse(XmlSource::Bytes(b"<a/>")).unwrap_err();
        assert_eq!(err.to_string(), "SaxHandler doesn't support xinclude elements.");
    }
}
