//! XML serializer
//!
//! Rendering happens in two passes. The object is first lowered into an
//! element tree while every namespace it uses is collected, including
//! namespaces of QName values. Prefixes are then assigned (preferred
//! ones first, then `ns0`, `ns1`, ...) and declared on the root element
//! while the tree is written out with `quick-xml`.

use super::SerializerConfig;
use crate::context::XmlContext;
use crate::converters::{self, DataType};
use crate::dataobjects::{AnyElement, DataObject, Value};
use crate::error::{Error, Result};
use crate::models::{ClassId, FieldTag, XmlMeta, XmlVar};
use crate::namespaces::{NamespaceMap, QName, XML_NAMESPACE, XSI_NAMESPACE};
use indexmap::{IndexMap, IndexSet};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::sync::Arc;

enum Text {
    Raw(String),
    Typed(Value, Vec<DataType>),
}

enum Content {
    Element(Element),
    Text(Text),
}

struct Element {
    qname: QName,
    attrs: Vec<(QName, Text)>,
    content: Vec<Content>,
}

impl Element {
    fn new(qname: QName) -> Self {
        Self {
            qname,
            attrs: Vec::new(),
            content: Vec::new(),
        }
    }

    fn collect_namespaces(&self, namespaces: &mut IndexSet<String>) {
        let mut add = |namespace: Option<&str>| {
            if let Some(namespace) = namespace {
                if namespace != XML_NAMESPACE {
                    namespaces.insert(namespace.to_string());
                }
            }
        };
        add(self.qname.namespace());
        for (qname, text) in &self.attrs {
            add(qname.namespace());
            if let Text::Typed(Value::QName(value), _) = text {
                add(value.namespace());
            }
        }
        for content in &self.content {
            match content {
                Content::Element(child) => child.collect_namespaces(namespaces),
                Content::Text(Text::Typed(Value::QName(value), _)) => {
                    if let Some(namespace) = value.namespace() {
                        if namespace != XML_NAMESPACE {
                            namespaces.insert(namespace.to_string());
                        }
                    }
                }
                Content::Text(_) => {}
            }
        }
    }
}

/// Renders bound objects as XML
#[derive(Debug, Clone)]
pub struct XmlSerializer {
    context: Arc<XmlContext>,
    config: SerializerConfig,
}

impl XmlSerializer {
    /// Create a serializer with the default configuration
    pub fn new(context: Arc<XmlContext>) -> Self {
        Self {
            context,
            config: SerializerConfig::default(),
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: SerializerConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Render an object as an XML document
    pub fn render(&self, obj: &DataObject) -> Result<String> {
        let meta = self.context.fetch(obj.class(), None, None)?;
        let root = self.build_object(obj, meta.qname.clone(), None, None)?;

        let mut namespaces = IndexSet::new();
        root.collect_namespaces(&mut namespaces);
        let prefixes = self.assign_prefixes(namespaces);
        let ns_map: NamespaceMap = prefixes
            .iter()
            .map(|(uri, prefix)| (Some(prefix.clone()), uri.clone()))
            .collect();

        let mut writer = if self.config.pretty_print {
            Writer::new_with_indent(Vec::new(), b' ', self.config.indent)
        } else {
            Writer::new(Vec::new())
        };
        if self.config.xml_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some(self.config.encoding.as_str()), None)))
                .map_err(write_error)?;
        }
        write_element(&mut writer, &root, &prefixes, &ns_map, true)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("Serialized output is not valid UTF-8: {}", e)))
    }

    fn assign_prefixes(&self, namespaces: IndexSet<String>) -> IndexMap<String, String> {
        let mut prefixes: IndexMap<String, String> = IndexMap::new();
        let mut counter = 0;
        for uri in namespaces {
            let preferred = self
                .config
                .namespaces
                .iter()
                .find(|(prefix, candidate)| {
                    **candidate == uri && !prefixes.values().any(|used| used == *prefix)
                })
                .map(|(prefix, _)| prefix.clone());
            let prefix = match preferred {
                Some(prefix) => prefix,
                None if uri == XSI_NAMESPACE && !prefixes.values().any(|p| p == "xsi") => {
                    "xsi".to_string()
                }
                None => loop {
                    let candidate = format!("ns{}", counter);
                    counter += 1;
                    if !prefixes.values().any(|used| *used == candidate) {
                        break candidate;
                    }
                },
            };
            prefixes.insert(uri, prefix);
        }
        prefixes
    }

    fn build_object(
        &self,
        obj: &DataObject,
        qname: QName,
        parent_ns: Option<&str>,
        declared: Option<ClassId>,
    ) -> Result<Element> {
        let meta = self.context.fetch(obj.class(), parent_ns, None)?;
        let mut element = Element::new(qname);

        if let Some(declared) = declared.filter(|declared| *declared != obj.class()) {
            if !self.context.is_derived(obj, declared) {
                return Err(Error::Context(format!(
                    "`{}` cannot be assigned to `{}`",
                    obj.class_name(),
                    element.qname
                )));
            }
            element.attrs.push((
                QName::namespaced(XSI_NAMESPACE, "type"),
                Text::Typed(Value::QName(meta.source_qname.clone()), vec![DataType::QName]),
            ));
        }

        for var in meta.vars() {
            let value = obj.get(&var.name).unwrap_or(&Value::Null);
            match var.tag {
                FieldTag::Attribute => {
                    if !value.is_null() {
                        element
                            .attrs
                            .push((var.qname.clone(), Text::Typed(value.clone(), var.native_types())));
                    }
                }
                FieldTag::Attributes => {
                    if let Value::Attributes(captured) = value {
                        for (name, text) in captured {
                            element.attrs.push((name.clone(), Text::Raw(text.clone())));
                        }
                    }
                }
                FieldTag::Text => {
                    if !value.is_null() {
                        element
                            .content
                            .push(Content::Text(Text::Typed(value.clone(), var.native_types())));
                    }
                }
                FieldTag::Element | FieldTag::Wildcard => {
                    self.build_value(&mut element, &meta, var, value)?;
                }
            }
        }
        Ok(element)
    }

    fn build_value(&self, parent: &mut Element, meta: &XmlMeta, var: &XmlVar, value: &Value) -> Result<()> {
        match value {
            Value::Null => {}
            Value::List(items) => {
                for item in items {
                    self.build_value(parent, meta, var, item)?;
                }
            }
            Value::Object(obj) => {
                let child = if var.is_wildcard() {
                    let qname = self.context.fetch(obj.class(), meta.namespace(), None)?.qname.clone();
                    self.build_object(obj, qname, meta.namespace(), None)?
                } else {
                    self.build_object(obj, var.qname.clone(), meta.namespace(), var.clazz())?
                };
                parent.content.push(Content::Element(child));
            }
            Value::Derived(derived) => {
                let mut child = match &derived.value {
                    Value::Object(obj) => {
                        self.build_object(obj, derived.qname.clone(), meta.namespace(), None)?
                    }
                    Value::Null => Element::new(derived.qname.clone()),
                    scalar => {
                        let mut element = Element::new(derived.qname.clone());
                        element.content.push(Content::Text(Text::Typed(scalar.clone(), Vec::new())));
                        element
                    }
                };
                if let Some(xsi_type) = &derived.xsi_type {
                    child.attrs.insert(
                        0,
                        (
                            QName::namespaced(XSI_NAMESPACE, "type"),
                            Text::Typed(Value::QName(xsi_type.clone()), vec![DataType::QName]),
                        ),
                    );
                }
                parent.content.push(Content::Element(child));
            }
            Value::Any(any) => self.build_any(parent, any, meta.namespace())?,
            Value::String(text) if var.is_wildcard() => {
                parent.content.push(Content::Text(Text::Raw(text.clone())));
            }
            Value::Attributes(_) => {
                return Err(Error::Context(format!(
                    "field `{}` cannot hold captured attributes",
                    var.name
                )))
            }
            scalar => {
                let mut child = Element::new(var.qname.clone());
                child
                    .content
                    .push(Content::Text(Text::Typed(scalar.clone(), var.native_types())));
                parent.content.push(Content::Element(child));
            }
        }
        Ok(())
    }

    fn build_any(&self, parent: &mut Element, any: &AnyElement, parent_ns: Option<&str>) -> Result<()> {
        match &any.qname {
            Some(qname) => {
                let mut element = Element::new(qname.clone());
                for (name, value) in &any.attributes {
                    element.attrs.push((name.clone(), Text::Raw(value.clone())));
                }
                if let Some(text) = &any.text {
                    element.content.push(Content::Text(Text::Raw(text.clone())));
                }
                for child in &any.children {
                    match child {
                        Value::Any(nested) => self.build_any(&mut element, nested, qname.namespace())?,
                        Value::Object(obj) => {
                            let child_qname = self.context.fetch(obj.class(), qname.namespace(), None)?.qname.clone();
                            let built = self.build_object(obj, child_qname, qname.namespace(), None)?;
                            element.content.push(Content::Element(built));
                        }
                        Value::String(text) => element.content.push(Content::Text(Text::Raw(text.clone()))),
                        other => element
                            .content
                            .push(Content::Text(Text::Typed(other.clone(), Vec::new()))),
                    }
                }
                parent.content.push(Content::Element(element));
            }
            None => {
                if let Some(text) = &any.text {
                    parent.content.push(Content::Text(Text::Raw(text.clone())));
                }
                for child in &any.children {
                    if let Value::Any(nested) = child {
                        self.build_any(parent, nested, parent_ns)?;
                    }
                }
            }
        }
        if let Some(tail) = &any.tail {
            parent.content.push(Content::Text(Text::Raw(tail.clone())));
        }
        Ok(())
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    prefixes: &IndexMap<String, String>,
    ns_map: &NamespaceMap,
    root: bool,
) -> Result<()> {
    let name = prefixed(&element.qname, prefixes);
    let mut start = BytesStart::new(name.as_str());
    if root {
        for (uri, prefix) in prefixes {
            let key = format!("xmlns:{}", prefix);
            start.push_attribute((key.as_str(), uri.as_str()));
        }
    }
    for (qname, text) in &element.attrs {
        let key = prefixed(qname, prefixes);
        let value = render_text(text, ns_map)?;
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.content.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for content in &element.content {
        match content {
            Content::Element(child) => write_element(writer, child, prefixes, ns_map, false)?,
            Content::Text(text) => {
                let text = render_text(text, ns_map)?;
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(write_error)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_error)
}

fn prefixed(qname: &QName, prefixes: &IndexMap<String, String>) -> String {
    match qname.namespace() {
        None => qname.local_name.clone(),
        Some(XML_NAMESPACE) => format!("xml:{}", qname.local_name),
        Some(uri) => match prefixes.get(uri) {
            Some(prefix) => format!("{}:{}", prefix, qname.local_name),
            None => qname.local_name.clone(),
        },
    }
}

fn render_text(text: &Text, ns_map: &NamespaceMap) -> Result<String> {
    match text {
        Text::Raw(raw) => Ok(raw.clone()),
        Text::Typed(Value::List(items), types) => Ok(items
            .iter()
            .map(|item| converters::serialize(item, types, ns_map))
            .collect::<Result<Vec<_>>>()?
            .join(" ")),
        Text::Typed(value, types) => converters::serialize(value, types, ns_map),
    }
}

fn write_error(e: quick_xml::Error) -> Error {
    Error::Xml(format!("Failed to write XML: {}", e))
}
