//! Binding metadata
//!
//! [`XmlMeta`] is the immutable, per-class binding metadata the parsers
//! consult for every element. It is produced by the
//! [`XmlMetaBuilder`](super::XmlMetaBuilder) and shared through the
//! context caches.

use super::descriptors::FieldTag;
use super::registry::ClassId;
use crate::converters::DataType;
use crate::namespaces::{NamespaceConstraint, QName};
use indexmap::IndexMap;

/// Resolved type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    /// XSD built-in scalar
    Native(DataType),
    /// Registered model class
    Class(ClassId),
}

/// Binding metadata of one field
#[derive(Debug, Clone, PartialEq)]
pub struct XmlVar {
    /// Position among the class fields
    pub index: usize,
    /// Field name
    pub name: String,
    /// Serialized name; meaningless for text and catch-all fields
    pub qname: QName,
    /// Serialization role
    pub tag: FieldTag,
    /// Candidate types, in order
    pub types: Vec<VarType>,
    /// Whether values collect into a sequence
    pub list: bool,
    /// Whether binding fails when the field is left unpopulated
    pub required: bool,
    /// Whether `xsi:nil` is accepted
    pub nillable: bool,
    /// Lexical default value
    pub default: Option<String>,
    /// Accepted namespaces of wildcard and catch-all attribute fields
    pub namespace_constraint: Option<NamespaceConstraint>,
}

impl XmlVar {
    /// Attribute field
    pub fn is_attribute(&self) -> bool {
        self.tag == FieldTag::Attribute
    }

    /// Catch-all attributes field
    pub fn is_attributes(&self) -> bool {
        self.tag == FieldTag::Attributes
    }

    /// Child element field
    pub fn is_element(&self) -> bool {
        self.tag == FieldTag::Element
    }

    /// Text content field
    pub fn is_text(&self) -> bool {
        self.tag == FieldTag::Text
    }

    /// Wildcard field
    pub fn is_wildcard(&self) -> bool {
        self.tag == FieldTag::Wildcard
    }

    /// First model class among the candidate types
    pub fn clazz(&self) -> Option<ClassId> {
        self.types.iter().find_map(|t| match t {
            VarType::Class(id) => Some(*id),
            VarType::Native(_) => None,
        })
    }

    /// Scalar candidate types, in order
    pub fn native_types(&self) -> Vec<DataType> {
        self.types
            .iter()
            .filter_map(|t| match t {
                VarType::Native(dt) => Some(*dt),
                VarType::Class(_) => None,
            })
            .collect()
    }

    /// Whether the namespace constraint admits `namespace`
    pub fn accepts_namespace(&self, namespace: Option<&str>) -> bool {
        self.namespace_constraint
            .as_ref()
            .map_or(false, |constraint| constraint.is_allowed(namespace))
    }
}

/// Binding metadata of one model class
#[derive(Debug, Clone, PartialEq)]
pub struct XmlMeta {
    /// Model class
    pub clazz: ClassId,
    /// Model class name
    pub class_name: String,
    /// Element name, with the namespace resolved against the parent
    pub qname: QName,
    /// Element name in the class namespace, used for `xsi:type` lookups
    pub source_qname: QName,
    /// Whether `xsi:nil` still builds an instance
    pub nillable: bool,
    /// Whether text interleaves with child elements
    pub mixed_content: bool,
    vars: Vec<XmlVar>,
    text: Option<usize>,
    attributes: IndexMap<QName, usize>,
    any_attributes: Option<usize>,
    elements: IndexMap<QName, usize>,
    wildcards: Vec<usize>,
    by_name: IndexMap<String, usize>,
}

impl XmlMeta {
    pub(crate) fn new(
        clazz: ClassId,
        class_name: impl Into<String>,
        qname: QName,
        source_qname: QName,
    ) -> Self {
        Self {
            clazz,
            class_name: class_name.into(),
            qname,
            source_qname,
            nillable: false,
            mixed_content: false,
            vars: Vec::new(),
            text: None,
            attributes: IndexMap::new(),
            any_attributes: None,
            elements: IndexMap::new(),
            wildcards: Vec::new(),
            by_name: IndexMap::new(),
        }
    }

    /// Index a variable; the builder has already rejected collisions
    pub(crate) fn push_var(&mut self, var: XmlVar) {
        let position = self.vars.len();
        match var.tag {
            FieldTag::Attribute => {
                self.attributes.insert(var.qname.clone(), position);
            }
            FieldTag::Attributes => self.any_attributes = Some(position),
            FieldTag::Element => {
                self.elements.insert(var.qname.clone(), position);
            }
            FieldTag::Text => self.text = Some(position),
            FieldTag::Wildcard => self.wildcards.push(position),
        }
        self.by_name.insert(var.name.clone(), position);
        self.vars.push(var);
    }

    /// All variables in field order
    pub fn vars(&self) -> &[XmlVar] {
        &self.vars
    }

    /// Text content variable
    pub fn text(&self) -> Option<&XmlVar> {
        self.text.map(|i| &self.vars[i])
    }

    /// Attribute variable by qualified name
    pub fn find_attribute(&self, qname: &QName) -> Option<&XmlVar> {
        self.attributes.get(qname).map(|&i| &self.vars[i])
    }

    /// Catch-all attributes variable
    pub fn find_any_attributes(&self) -> Option<&XmlVar> {
        self.any_attributes.map(|i| &self.vars[i])
    }

    /// Element variable by exact qualified name
    pub fn find_element(&self, qname: &QName) -> Option<&XmlVar> {
        self.elements.get(qname).map(|&i| &self.vars[i])
    }

    /// First wildcard variable admitting the element's namespace
    pub fn find_wildcard(&self, qname: &QName) -> Option<&XmlVar> {
        self.wildcards
            .iter()
            .map(|&i| &self.vars[i])
            .find(|var| var.accepts_namespace(qname.namespace()))
    }

    /// Variable receiving a child element: exact element match first,
    /// then a matching wildcard
    pub fn find_children(&self, qname: &QName) -> Option<&XmlVar> {
        self.find_element(qname).or_else(|| self.find_wildcard(qname))
    }

    /// First wildcard variable, regardless of namespace
    pub fn any_wildcard(&self) -> Option<&XmlVar> {
        self.wildcards.first().map(|&i| &self.vars[i])
    }

    /// Variable by field name
    pub fn find_var_by_name(&self, name: &str) -> Option<&XmlVar> {
        self.by_name.get(name).map(|&i| &self.vars[i])
    }

    /// Qualified names of the element variables, in field order
    pub fn element_names(&self) -> impl Iterator<Item = &QName> {
        self.elements.keys()
    }

    /// Namespace of the bound element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace()
    }
}
