//! Document trees as parse events
//!
//! Walks a `roxmltree` document and flattens it into the `start`,
//! `end` and `start-ns` events the [`EventHandler`] replays. When asked
//! to, `xi:include` elements are expanded in place while walking:
//!
//! - `parse="xml"` (the default) splices the root element of the target
//!   document; the include's tail becomes the tail of that root
//! - `parse="text"` splices the target as character data into the text
//!   or tail it falls into
//! - a failed load falls back to the children of `xi:fallback`, or fails
//!   the parse when there is none
//!
//! [`EventHandler`]: crate::parsers::EventHandler

use crate::error::{Error, Result};
use crate::loaders::Loader;
use crate::locations::Location;
use crate::namespaces::{NamespaceMap, QName, XINCLUDE_NAMESPACE};
use crate::parsers::{Attributes, ContextEvent, ElementEvent, EventData, EVENT_END, EVENT_START, EVENT_START_NS};
use roxmltree::{Document, Node, ParsingOptions};

/// Parse text into a `roxmltree` document
pub fn parse_document(text: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
        .map_err(|e| Error::Xml(format!("Error parsing XML: {}", e)))
}

/// Flattens document trees into parse events
#[derive(Debug, Clone)]
pub struct DocumentEvents<'l> {
    loader: &'l Loader,
    process_xinclude: bool,
}

/// Character data produced while walking, before it is attached to a
/// text or tail slot
#[derive(Debug, Default)]
struct Pending(Option<String>);

impl Pending {
    fn push(&mut self, text: &str) {
        self.0.get_or_insert_with(String::new).push_str(text);
    }
}

impl<'l> DocumentEvents<'l> {
    /// Create a walker loading include targets through `loader`
    pub fn new(loader: &'l Loader, process_xinclude: bool) -> Self {
        Self {
            loader,
            process_xinclude,
        }
    }

    /// Events for the subtree rooted at `node`.
    ///
    /// Every namespace in scope at `node` is announced before its start
    /// event, so a subtree parses the same as a whole document.
    pub fn collect(&self, node: Node<'_, '_>, base: Option<&Location>) -> Result<Vec<ContextEvent>> {
        let mut events = Vec::new();
        let mut stack = Vec::new();
        self.walk(node, None, base, &NamespaceMap::new(), &mut events, &mut stack)?;
        Ok(events)
    }

    fn walk(
        &self,
        node: Node<'_, '_>,
        tail: Option<String>,
        base: Option<&Location>,
        parent_scope: &NamespaceMap,
        events: &mut Vec<ContextEvent>,
        stack: &mut Vec<Location>,
    ) -> Result<()> {
        let scope = namespaces_in_scope(node);
        for (prefix, uri) in &scope {
            if parent_scope.get(prefix) != Some(uri) {
                events.push((
                    EVENT_START_NS,
                    EventData::Namespace {
                        prefix: prefix.clone(),
                        uri: uri.clone(),
                    },
                ));
            }
        }

        let qname = QName::new(node.tag_name().namespace(), node.tag_name().name());
        let attrs: Attributes = node
            .attributes()
            .map(|attr| (QName::new(attr.namespace(), attr.name()), attr.value().to_string()))
            .collect();
        events.push((
            EVENT_START,
            EventData::Element(ElementEvent::start(qname.clone(), attrs, scope.clone())),
        ));

        // Text runs are attached to the element text until the first child
        // element, then to the tail of the latest child.
        let mut text = Pending::default();
        let mut open: Option<(Node<'_, '_>, Pending)> = None;
        for child in node.children() {
            if child.is_text() {
                let target = match open.as_mut() {
                    Some((_, child_tail)) => child_tail,
                    None => &mut text,
                };
                target.push(child.text().unwrap_or_default());
            } else if self.is_text_include(child) {
                let target = match open.as_mut() {
                    Some((_, child_tail)) => child_tail,
                    None => &mut text,
                };
                self.include_text(child, base, target)?;
            } else if child.is_element() {
                if let Some((previous, previous_tail)) = open.take() {
                    self.element(previous, previous_tail.0, base, &scope, events, stack)?;
                }
                open = Some((child, Pending::default()));
            }
        }
        if let Some((last, last_tail)) = open.take() {
            self.element(last, last_tail.0, base, &scope, events, stack)?;
        }

        events.push((EVENT_END, EventData::Element(ElementEvent::end(qname, text.0, tail))));
        Ok(())
    }

    /// Emit a child element, expanding it when it is an include
    fn element(
        &self,
        node: Node<'_, '_>,
        tail: Option<String>,
        base: Option<&Location>,
        parent_scope: &NamespaceMap,
        events: &mut Vec<ContextEvent>,
        stack: &mut Vec<Location>,
    ) -> Result<()> {
        if self.process_xinclude && is_xinclude(node, "include") {
            self.include_xml(node, tail, base, parent_scope, events, stack)
        } else {
            self.walk(node, tail, base, parent_scope, events, stack)
        }
    }

    fn include_xml(
        &self,
        node: Node<'_, '_>,
        tail: Option<String>,
        base: Option<&Location>,
        parent_scope: &NamespaceMap,
        events: &mut Vec<ContextEvent>,
        stack: &mut Vec<Location>,
    ) -> Result<()> {
        let loaded = self.resolve(node, base).and_then(|target| {
            let content = self.loader.load(&target)?;
            Ok((target, content))
        });

        let (target, content) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => return self.fallback(node, e, tail, base, parent_scope, events, stack),
        };

        if stack.contains(&target) {
            return Err(Error::Resource(format!(
                "Recursive xi:include of '{}'",
                target.as_str()
            )));
        }

        self.loader.limits().check_include_depth(stack.len() + 1)?;
        tracing::debug!(href = %target.as_str(), "including document");
        let document = parse_document(&content)?;
        stack.push(target.clone());
        let result = self.element(
            document.root_element(),
            tail,
            Some(&target),
            parent_scope,
            events,
            stack,
        );
        stack.pop();
        result
    }

    fn include_text(&self, node: Node<'_, '_>, base: Option<&Location>, target: &mut Pending) -> Result<()> {
        let content = self.resolve(node, base).and_then(|location| self.loader.load(&location));
        match content {
            Ok(content) => {
                target.push(&content);
                Ok(())
            }
            Err(e) => {
                let fallback = fallback_node(node).ok_or(e)?;
                if let Some(text) = fallback.text() {
                    target.push(text);
                }
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fallback(
        &self,
        node: Node<'_, '_>,
        error: Error,
        tail: Option<String>,
        base: Option<&Location>,
        parent_scope: &NamespaceMap,
        events: &mut Vec<ContextEvent>,
        stack: &mut Vec<Location>,
    ) -> Result<()> {
        let fallback = fallback_node(node).ok_or(error)?;
        tracing::debug!("xi:include failed, using fallback content");

        let children: Vec<_> = fallback.children().filter(|c| c.is_element()).collect();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let child_tail = if i == last {
                tail.clone()
            } else {
                child.tail().map(String::from)
            };
            self.element(child, child_tail, base, parent_scope, events, stack)?;
        }
        Ok(())
    }

    fn resolve(&self, node: Node<'_, '_>, base: Option<&Location>) -> Result<Location> {
        let href = node
            .attribute("href")
            .ok_or_else(|| Error::Resource("xi:include without an href attribute".into()))?;
        let target = match base {
            Some(base) => base.join(href)?,
            None => Location::parse(href)?,
        };
        match target {
            Location::String(_) => Err(Error::Resource(format!(
                "Cannot resolve xi:include target '{}' without a base location",
                href
            ))),
            target => Ok(target),
        }
    }

    fn is_text_include(&self, node: Node<'_, '_>) -> bool {
        self.process_xinclude
            && is_xinclude(node, "include")
            && node.attribute("parse") == Some("text")
    }
}

fn is_xinclude(node: Node<'_, '_>, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XINCLUDE_NAMESPACE)
        && node.tag_name().name() == local_name
}

fn fallback_node<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_xinclude(*child, "fallback"))
}

/// Namespaces in scope at `node`, without the implicit `xml` prefix
fn namespaces_in_scope(node: Node<'_, '_>) -> NamespaceMap {
    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| (ns.name().map(String::from), ns.uri().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(events: &[ContextEvent]) -> Vec<&'static str> {
        events.iter().map(|(kind, _)| *kind).collect()
    }

    #[test]
    fn test_text_and_tail() {
        let doc = parse_document("<a xmlns:p=\"urn:p\">x<b/>y<p:c>z</p:c></a>").unwrap();
        let loader = Loader::new();
        let events = DocumentEvents::new(&loader, false)
            .collect(doc.root_element(), None)
            .unwrap();

        assert_eq!(kinds(&events), vec!["start-ns", "start", "start", "end", "start", "end", "end"]);
        match &events[3].1 {
            EventData::Element(end) => {
                assert_eq!(end.qname, QName::local("b"));
                assert_eq!(end.tail.as_deref(), Some("y"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &events[6].1 {
            EventData::Element(end) => assert_eq!(end.text.as_deref(), Some("x")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_subtree_announces_namespaces() {
        let doc = parse_document("<a xmlns:p=\"urn:p\"><p:b/></a>").unwrap();
        let child = doc.root_element().first_element_child().unwrap();
        let loader = Loader::new();
        let events = DocumentEvents::new(&loader, false).collect(child, None).unwrap();
        assert_eq!(
            events[0].1,
            EventData::Namespace {
                prefix: Some("p".into()),
                uri: "urn:p".into()
            }
        );
    }

    #[test]
    fn test_include_fallback() {
        let xml = r#"<a xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="/nonexistent/missing.xml"><xi:fallback><b/></xi:fallback></xi:include></a>"#;
        let doc = parse_document(xml).unwrap();
        let loader = Loader::new();
        let events = DocumentEvents::new(&loader, true)
            .collect(doc.root_element(), None)
            .unwrap();
        let names: Vec<_> = events
            .iter()
            .filter_map(|(kind, data)| match data {
                EventData::Element(e) if *kind == EVENT_START => Some(e.qname.local_name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_include_without_fallback_fails() {
        let xml = r#"<a xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="/nonexistent/missing.xml"/></a>"#;
        let doc = parse_document(xml).unwrap();
        let loader = Loader::new();
        let result = DocumentEvents::new(&loader, true).collect(doc.root_element(), None);
        assert!(matches!(result, Err(Error::Resource(_))));
    }
}
