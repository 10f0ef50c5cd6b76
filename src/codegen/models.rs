//! Intermediate class model
//!
//! Schema components are lowered into [`Class`]es holding [`Attr`]s
//! before any model class exists. Handlers rewrite this model; the
//! result is turned into class descriptors at the end.

use crate::converters::DataType;
use crate::namespaces::QName;
use std::fmt;

/// Schema component a class or attribute was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// xs:attribute
    Attribute,
    /// xs:anyAttribute
    AnyAttribute,
    /// xs:element
    Element,
    /// xs:any
    Any,
    /// xs:enumeration facet
    Enumeration,
    /// xs:extension of simple content
    Extension,
    /// xs:restriction of simple content
    Restriction,
    /// xs:union
    Union,
    /// xs:simpleType
    SimpleType,
    /// xs:complexType
    ComplexType,
}

impl Tag {
    /// Tags of classes wrapping a simple value
    pub fn is_simple_type(&self) -> bool {
        matches!(self, Tag::SimpleType | Tag::Union | Tag::Restriction)
    }
}

/// Type reference of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// XSD built-in
    Native(DataType),
    /// Inner class of the owning class, by name
    Forward(String),
    /// Top-level class, by qualified name
    Reference(QName),
}

impl AttrType {
    /// Whether this is a built-in type
    pub fn is_native(&self) -> bool {
        matches!(self, AttrType::Native(_))
    }

    /// Whether this points at an inner class
    pub fn is_forward(&self) -> bool {
        matches!(self, AttrType::Forward(_))
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Native(dt) => write!(f, "{}", dt),
            AttrType::Forward(name) => write!(f, "{}", name),
            AttrType::Reference(qname) => write!(f, "{}", qname),
        }
    }
}

/// Occurrence and facet restrictions of an attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restrictions {
    /// Minimum occurrences
    pub min_occurs: u32,
    /// Maximum occurrences; `None` is unbounded
    pub max_occurs: Option<u32>,
    /// Whether the attribute must be present
    pub required: bool,
    /// Whether `xsi:nil` is accepted
    pub nillable: bool,
    /// xs:pattern facet
    pub pattern: Option<String>,
    /// xs:minLength facet
    pub min_length: Option<usize>,
    /// xs:maxLength facet
    pub max_length: Option<usize>,
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            min_occurs: 1,
            max_occurs: Some(1),
            required: false,
            nillable: false,
            pattern: None,
            min_length: None,
            max_length: None,
        }
    }
}

impl Restrictions {
    /// Whether values collect into a sequence
    pub fn is_list(&self) -> bool {
        self.max_occurs.map_or(true, |max| max > 1)
    }
}

/// One member of a class
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Field name
    pub name: String,
    /// Serialized name
    pub local_name: String,
    /// Position in the class
    pub index: usize,
    /// Schema component
    pub tag: Tag,
    /// Candidate types
    pub types: Vec<AttrType>,
    /// Namespace, or a wildcard constraint such as `##any`
    pub namespace: Option<String>,
    /// Default value, or the value of an enumeration member
    pub default: Option<String>,
    /// Whether the value is fixed
    pub fixed: bool,
    /// Restrictions
    pub restrictions: Restrictions,
}

impl Attr {
    /// Create an attribute named `name`
    pub fn new(tag: Tag, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            local_name: name.clone(),
            name,
            index: 0,
            tag,
            types: Vec::new(),
            namespace: None,
            default: None,
            fixed: false,
            restrictions: Restrictions::default(),
        }
    }

    /// Enumeration member with its literal value
    pub fn enumeration(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut attr = Self::new(Tag::Enumeration, name).with_type(AttrType::Native(DataType::String));
        attr.default = Some(value.into());
        attr.fixed = true;
        attr
    }

    /// Set the serialized name
    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = local_name.into();
        self
    }

    /// Set the position
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Add a candidate type
    pub fn with_type(mut self, attr_type: AttrType) -> Self {
        self.types.push(attr_type);
        self
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the restrictions
    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Member of an enumeration
    pub fn is_enumeration(&self) -> bool {
        self.tag == Tag::Enumeration
    }

    /// xs:any or xs:anyAttribute
    pub fn is_wildcard(&self) -> bool {
        matches!(self.tag, Tag::Any | Tag::AnyAttribute)
    }
}

/// A class of the intermediate model
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// Qualified name
    pub qname: QName,
    /// Schema component
    pub tag: Tag,
    /// Members, in order
    pub attrs: Vec<Attr>,
    /// Nested anonymous classes
    pub inner: Vec<Class>,
    /// Base types
    pub extensions: Vec<AttrType>,
    /// Whether text interleaves with child elements
    pub mixed: bool,
    /// Whether the class is abstract
    pub is_abstract: bool,
    /// Whether `xsi:nil` still builds an instance
    pub nillable: bool,
}

impl Class {
    /// Create an empty class
    pub fn new(qname: QName, tag: Tag) -> Self {
        Self {
            qname,
            tag,
            attrs: Vec::new(),
            inner: Vec::new(),
            extensions: Vec::new(),
            mixed: false,
            is_abstract: false,
            nillable: false,
        }
    }

    /// Local name of the class
    pub fn name(&self) -> &str {
        &self.qname.local_name
    }

    /// Add a member, numbering it after the existing ones
    pub fn with_attr(mut self, attr: Attr) -> Self {
        let index = self.attrs.len();
        self.attrs.push(attr.with_index(index));
        self
    }

    /// Add an inner class
    pub fn with_inner(mut self, inner: Class) -> Self {
        self.inner.push(inner);
        self
    }

    /// Add a base type
    pub fn with_extension(mut self, extension: AttrType) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Declare mixed content
    pub fn mixed(mut self) -> Self {
        self.mixed = true;
        self
    }

    /// Non-empty class whose members are all enumeration members
    pub fn is_enumeration(&self) -> bool {
        !self.attrs.is_empty() && self.attrs.iter().all(Attr::is_enumeration)
    }

    /// Class wrapping a simple value, other than an enumeration
    pub fn is_simple(&self) -> bool {
        self.tag.is_simple_type() && !self.is_enumeration()
    }

    /// Whether any member is a wildcard
    pub fn has_wild_attr(&self) -> bool {
        self.attrs.iter().any(Attr::is_wildcard)
    }

    /// Inner class by name
    pub fn find_inner(&self, name: &str) -> Option<&Class> {
        self.inner.iter().find(|inner| inner.name() == name)
    }
}
