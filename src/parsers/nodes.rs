//! Element node parsers
//!
//! One [`XmlNode`] is opened per start-element. A node decides how its
//! children are parsed and, when its element closes, binds itself into
//! the shared object stack. Values produced by the children of a node
//! sit on the stack above the position recorded when the node opened.

use super::config::ParserConfig;
use crate::context::XmlContext;
use crate::converters::{self, DataType};
use crate::dataobjects::{AnyElement, DataObject, DerivedElement, Value};
use crate::error::{Error, Result};
use crate::models::{XmlMeta, XmlVar};
use crate::namespaces::{resolve_prefixed, NamespaceMap, QName, XSI_NAMESPACE};
use indexmap::IndexMap;
use std::sync::Arc;

/// Attributes of an element by qualified name
pub type Attributes = IndexMap<QName, String>;

/// Bound values waiting for their parent, with the element name that
/// produced them; `None` marks mixed-content text
pub(crate) type Objects = Vec<(Option<QName>, Value)>;

/// Per-element parser state
#[derive(Debug)]
pub enum XmlNode {
    /// Element bound to a model class
    Element(ElementNode),
    /// Element bound to a scalar field
    Primitive(PrimitiveNode),
    /// Element captured by a wildcard field
    Wildcard(WildcardNode),
    /// Ignored element and its subtree
    Skip,
}

impl XmlNode {
    /// Open the node for a child element
    pub(crate) fn child(
        &self,
        context: &XmlContext,
        config: &ParserConfig,
        qname: &QName,
        attrs: Attributes,
        ns_map: NamespaceMap,
        position: usize,
    ) -> Result<XmlNode> {
        match self {
            XmlNode::Element(node) => node.child(context, config, qname, attrs, ns_map, position),
            XmlNode::Primitive(node) => Err(Error::Context(format!(
                "Primitive node `{}` doesn't support child nodes, got `{}`",
                node.var.name, qname
            ))),
            XmlNode::Wildcard(_) => Ok(XmlNode::Wildcard(WildcardNode::new(
                attrs, position, false,
            ))),
            XmlNode::Skip => Ok(XmlNode::Skip),
        }
    }

    /// Close the node and push its value
    pub(crate) fn bind(
        self,
        config: &ParserConfig,
        qname: &QName,
        text: Option<String>,
        tail: Option<String>,
        objects: &mut Objects,
    ) -> Result<()> {
        match self {
            XmlNode::Element(node) => node.bind(config, qname, text, tail, objects),
            XmlNode::Primitive(node) => node.bind(config, qname, text, tail, objects),
            XmlNode::Wildcard(node) => node.bind(qname, text, tail, objects),
            XmlNode::Skip => Ok(()),
        }
    }
}

/// Node of an element bound to a model class
#[derive(Debug)]
pub struct ElementNode {
    meta: Arc<XmlMeta>,
    attrs: Attributes,
    ns_map: NamespaceMap,
    position: usize,
    mixed: bool,
    derived: bool,
    xsi_type: Option<QName>,
    xsi_nil: bool,
}

impl ElementNode {
    pub(crate) fn new(
        meta: Arc<XmlMeta>,
        attrs: Attributes,
        ns_map: NamespaceMap,
        position: usize,
    ) -> Self {
        let xsi_nil = attrs
            .get(&QName::namespaced(XSI_NAMESPACE, "nil"))
            .map_or(false, |value| is_true(value));
        Self {
            meta,
            attrs,
            ns_map,
            position,
            mixed: false,
            derived: false,
            xsi_type: None,
            xsi_nil,
        }
    }

    /// Metadata of the bound class
    pub fn meta(&self) -> &XmlMeta {
        &self.meta
    }

    fn child(
        &self,
        context: &XmlContext,
        config: &ParserConfig,
        qname: &QName,
        attrs: Attributes,
        ns_map: NamespaceMap,
        position: usize,
    ) -> Result<XmlNode> {
        let Some(var) = self.meta.find_children(qname) else {
            if config.fail_on_unknown_properties {
                return Err(Error::Parser(format!(
                    "Unknown property {}:{}",
                    self.meta.qname, qname
                )));
            }
            tracing::debug!(parent = %self.meta.qname, child = %qname, "skipping unknown element");
            return Ok(XmlNode::Skip);
        };

        let xsi_type = xsi_type(&attrs, &ns_map)?;
        let mixed = self.meta.mixed_content;

        if var.is_wildcard() {
            if let Some(type_name) = &xsi_type {
                if let Some(clazz) = context.find_type(type_name) {
                    let meta = context.fetch(clazz, self.meta.namespace(), None)?;
                    let mut node = ElementNode::new(meta, attrs, ns_map, position);
                    node.mixed = mixed;
                    node.derived = true;
                    node.xsi_type = xsi_type;
                    return Ok(XmlNode::Element(node));
                }
            }
            return Ok(XmlNode::Wildcard(WildcardNode::new(attrs, position, mixed)));
        }

        match var.clazz() {
            Some(clazz) => {
                let meta = context.fetch(clazz, self.meta.namespace(), xsi_type.as_ref())?;
                let mut node = ElementNode::new(meta, attrs, ns_map, position);
                node.mixed = mixed;
                node.xsi_type = xsi_type;
                Ok(XmlNode::Element(node))
            }
            None => Ok(XmlNode::Primitive(PrimitiveNode::new(
                var.clone(),
                &attrs,
                ns_map,
                mixed,
            ))),
        }
    }

    fn bind(
        self,
        config: &ParserConfig,
        qname: &QName,
        text: Option<String>,
        tail: Option<String>,
        objects: &mut Objects,
    ) -> Result<()> {
        let children = objects.split_off(self.position.min(objects.len()));
        let value = if self.xsi_nil && !self.meta.nillable {
            Value::Null
        } else {
            Value::Object(Box::new(self.build_object(config, text, children)?))
        };

        let value = if self.derived {
            Value::Derived(Box::new(DerivedElement {
                qname: qname.clone(),
                value,
                xsi_type: self.xsi_type,
            }))
        } else {
            value
        };

        objects.push((Some(qname.clone()), value));
        push_tail(objects, self.mixed, tail);
        Ok(())
    }

    fn build_object(
        &self,
        config: &ParserConfig,
        text: Option<String>,
        children: Objects,
    ) -> Result<DataObject> {
        let mut params: IndexMap<String, Value> = IndexMap::new();
        self.bind_attrs(&mut params, config)?;

        if self.meta.mixed_content {
            self.bind_mixed_content(&mut params, text, children);
        } else {
            self.bind_content(&mut params, config, text, children)?;
        }

        let mut obj = DataObject::new(self.meta.clazz, &self.meta.class_name);
        for var in self.meta.vars() {
            let value = match params.shift_remove(&var.name) {
                Some(value) => value,
                None => self.default_value(var, config)?,
            };
            obj.set(var.name.clone(), value);
        }
        Ok(obj)
    }

    fn bind_attrs(&self, params: &mut IndexMap<String, Value>, config: &ParserConfig) -> Result<()> {
        let strict = config.fail_on_converter_warnings;
        for (qname, value) in &self.attrs {
            if let Some(var) = self.meta.find_attribute(qname) {
                let types = var.native_types();
                let converted = if var.list {
                    Value::List(
                        value
                            .split_whitespace()
                            .map(|token| converters::deserialize(token, &types, &self.ns_map, strict))
                            .collect::<Result<_>>()?,
                    )
                } else {
                    converters::deserialize(value, &types, &self.ns_map, strict)?
                };
                params.insert(var.name.clone(), converted);
            } else if qname.is_xsi("type") || qname.is_xsi("nil") {
                continue;
            } else if let Some(var) = self
                .meta
                .find_any_attributes()
                .filter(|var| var.accepts_namespace(qname.namespace()))
            {
                if let Value::Attributes(captured) = params
                    .entry(var.name.clone())
                    .or_insert_with(|| Value::Attributes(IndexMap::new()))
                {
                    captured.insert(qname.clone(), value.clone());
                }
            } else if config.fail_on_unknown_attributes {
                return Err(Error::Parser(format!(
                    "Unknown attribute {}:{}",
                    self.meta.qname, qname
                )));
            } else {
                tracing::debug!(element = %self.meta.qname, attribute = %qname, "dropping unknown attribute");
            }
        }
        Ok(())
    }

    fn bind_content(
        &self,
        params: &mut IndexMap<String, Value>,
        config: &ParserConfig,
        text: Option<String>,
        children: Objects,
    ) -> Result<()> {
        if let Some(var) = self.meta.text() {
            if let Some(text) = text {
                let value = converters::deserialize(
                    &text,
                    &var.native_types(),
                    &self.ns_map,
                    config.fail_on_converter_warnings,
                )?;
                params.insert(var.name.clone(), value);
            }
        } else if let Some(text) = normalize_content(text.as_deref()) {
            if let Some(wildcard) = self.meta.any_wildcard() {
                bind_var(params, wildcard, Value::String(text));
            }
        }

        for (qname, value) in children {
            let Some(qname) = qname else {
                continue;
            };
            let Some(var) = self.meta.find_children(&qname) else {
                continue;
            };
            let Some(value) = bind_var(params, var, value) else {
                continue;
            };

            let rejected = match self
                .meta
                .find_wildcard(&qname)
                .filter(|wildcard| wildcard.name != var.name)
            {
                Some(wildcard) => bind_var(params, wildcard, value),
                None => Some(value),
            };
            if rejected.is_some() {
                tracing::warn!(
                    element = %self.meta.qname,
                    child = %qname,
                    field = %var.name,
                    "dropping repeated value for a single-valued field"
                );
            }
        }
        Ok(())
    }

    fn bind_mixed_content(
        &self,
        params: &mut IndexMap<String, Value>,
        text: Option<String>,
        children: Objects,
    ) {
        let Some(wildcard) = self.meta.any_wildcard() else {
            return;
        };

        let mut items = Vec::new();
        if let Some(text) = normalize_content(text.as_deref()) {
            items.push(Value::String(text));
        }
        for (qname, value) in children {
            let var = qname.as_ref().and_then(|q| self.meta.find_element(q));
            match var {
                Some(var) => items.extend(bind_var(params, var, value)),
                None => items.push(value),
            }
        }

        if items.is_empty() {
            return;
        }
        if wildcard.list {
            params.insert(wildcard.name.clone(), Value::List(items));
        } else if let Some(first) = items.into_iter().next() {
            params.insert(wildcard.name.clone(), first);
        }
    }

    fn default_value(&self, var: &XmlVar, config: &ParserConfig) -> Result<Value> {
        if var.required && !self.xsi_nil {
            return Err(Error::MissingField {
                class: self.meta.class_name.clone(),
                field: var.name.clone(),
            });
        }
        if var.list {
            return Ok(Value::List(Vec::new()));
        }
        if var.is_attributes() {
            return Ok(Value::Attributes(IndexMap::new()));
        }
        match &var.default {
            Some(default) => converters::deserialize(
                default,
                &var.native_types(),
                &self.ns_map,
                config.fail_on_converter_warnings,
            ),
            None => Ok(Value::Null),
        }
    }
}

/// Node of an element bound to a scalar field
#[derive(Debug)]
pub struct PrimitiveNode {
    var: XmlVar,
    ns_map: NamespaceMap,
    mixed: bool,
    xsi_nil: bool,
}

impl PrimitiveNode {
    pub(crate) fn new(var: XmlVar, attrs: &Attributes, ns_map: NamespaceMap, mixed: bool) -> Self {
        let xsi_nil = attrs
            .get(&QName::namespaced(XSI_NAMESPACE, "nil"))
            .map_or(false, |value| is_true(value));
        Self {
            var,
            ns_map,
            mixed,
            xsi_nil,
        }
    }

    fn bind(
        self,
        config: &ParserConfig,
        qname: &QName,
        text: Option<String>,
        tail: Option<String>,
        objects: &mut Objects,
    ) -> Result<()> {
        let strict = config.fail_on_converter_warnings;
        let types = self.var.native_types();
        let value = match (text, &self.var.default) {
            _ if self.xsi_nil => Value::Null,
            (Some(text), _) => converters::deserialize(&text, &types, &self.ns_map, strict)?,
            (None, Some(default)) => converters::deserialize(default, &types, &self.ns_map, strict)?,
            (None, None) if is_string_like(&types) => Value::String(String::new()),
            (None, None) => Value::Null,
        };

        objects.push((Some(qname.clone()), value));
        push_tail(objects, self.mixed, tail);
        Ok(())
    }
}

/// Node of an element captured by a wildcard field
#[derive(Debug)]
pub struct WildcardNode {
    attrs: Attributes,
    position: usize,
    mixed: bool,
}

impl WildcardNode {
    pub(crate) fn new(attrs: Attributes, position: usize, mixed: bool) -> Self {
        Self {
            attrs,
            position,
            mixed,
        }
    }

    fn bind(
        self,
        qname: &QName,
        text: Option<String>,
        tail: Option<String>,
        objects: &mut Objects,
    ) -> Result<()> {
        let children = objects
            .split_off(self.position.min(objects.len()))
            .into_iter()
            .map(|(_, value)| value)
            .collect();

        let element = AnyElement {
            qname: Some(qname.clone()),
            text,
            tail: if self.mixed { None } else { tail.clone() },
            children,
            attributes: self.attrs,
        };

        objects.push((Some(qname.clone()), Value::Any(Box::new(element))));
        push_tail(objects, self.mixed, tail);
        Ok(())
    }
}

/// The `xsi:type` of an element, resolved against its namespaces
pub(crate) fn xsi_type(attrs: &Attributes, ns_map: &NamespaceMap) -> Result<Option<QName>> {
    attrs
        .get(&QName::namespaced(XSI_NAMESPACE, "type"))
        .map(|value| resolve_prefixed(ns_map, value))
        .transpose()
}

/// Text with at least one non-whitespace character
pub(crate) fn normalize_content(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(String::from)
}

fn push_tail(objects: &mut Objects, mixed: bool, tail: Option<String>) {
    if mixed {
        if let Some(tail) = normalize_content(tail.as_deref()) {
            objects.push((None, Value::String(tail)));
        }
    }
}

fn bind_var(params: &mut IndexMap<String, Value>, var: &XmlVar, value: Value) -> Option<Value> {
    if var.list {
        match params
            .entry(var.name.clone())
            .or_insert_with(|| Value::List(Vec::new()))
        {
            Value::List(items) => {
                items.push(value);
                None
            }
            _ => Some(value),
        }
    } else if params.contains_key(&var.name) {
        Some(value)
    } else {
        params.insert(var.name.clone(), value);
        None
    }
}

fn is_true(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

fn is_string_like(types: &[DataType]) -> bool {
    types.iter().any(|t| {
        matches!(
            t,
            DataType::String
                | DataType::NormalizedString
                | DataType::Token
                | DataType::AnySimpleType
                | DataType::AnyType
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassDescriptor, FieldDescriptor};

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content(Some("  \n ")), None);
        assert_eq!(normalize_content(None), None);
        assert_eq!(normalize_content(Some(" a ")), Some(" a ".to_string()));
    }

    #[test]
    fn test_xsi_type_resolution() {
        let mut ns_map = NamespaceMap::new();
        ns_map.insert(Some("s".into()), "urn:shapes".into());
        let mut attrs = Attributes::new();
        attrs.insert(QName::namespaced(XSI_NAMESPACE, "type"), "s:Circle".into());

        assert_eq!(
            xsi_type(&attrs, &ns_map).unwrap(),
            Some(QName::namespaced("urn:shapes", "Circle"))
        );
        assert_eq!(xsi_type(&Attributes::new(), &ns_map).unwrap(), None);
        attrs.insert(QName::namespaced(XSI_NAMESPACE, "type"), "x:Circle".into());
        assert!(xsi_type(&attrs, &ns_map).is_err());
    }

    #[test]
    fn test_primitive_node_rejects_children() {
        let context = XmlContext::new();
        let clazz = context
            .register(
                ClassDescriptor::new("Item")
                    .with_field(FieldDescriptor::element("name", DataType::String)),
            )
            .unwrap();
        let meta = context.build(clazz, None).unwrap();
        let config = ParserConfig::default();

        let root = XmlNode::Element(ElementNode::new(meta, Attributes::new(), NamespaceMap::new(), 0));
        let name = root
            .child(&context, &config, &QName::local("name"), Attributes::new(), NamespaceMap::new(), 0)
            .unwrap();
        assert!(matches!(name, XmlNode::Primitive(_)));

        let result = name.child(
            &context,
            &config,
            &QName::local("nested"),
            Attributes::new(),
            NamespaceMap::new(),
            0,
        );
        assert!(matches!(result, Err(Error::Context(_))));
    }

    #[test]
    fn test_repeated_single_value_goes_to_wildcard() {
        let context = XmlContext::new();
        let clazz = context
            .register(
                ClassDescriptor::new("Item")
                    .with_field(FieldDescriptor::element("name", DataType::String))
                    .with_field(FieldDescriptor::wildcard("other")),
            )
            .unwrap();
        let meta = context.build(clazz, None).unwrap();
        let node = ElementNode::new(meta, Attributes::new(), NamespaceMap::new(), 0);

        let mut objects: Objects = vec![
            (Some(QName::local("name")), Value::from("first")),
            (Some(QName::local("name")), Value::from("second")),
        ];
        XmlNode::Element(node)
            .bind(&ParserConfig::default(), &QName::local("Item"), None, None, &mut objects)
            .unwrap();

        let (_, value) = objects.pop().unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("name"), Some(&Value::from("first")));
        assert_eq!(obj.get("other"), Some(&Value::List(vec![Value::from("second")])));
    }
}
