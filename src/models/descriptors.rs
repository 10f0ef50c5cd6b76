//! Model class descriptors
//!
//! Model classes are declared as data: a [`ClassDescriptor`] lists the
//! fields of one class together with the serialization role of each
//! field. Descriptors are what the metadata builder introspects.

use crate::converters::DataType;
use crate::namespaces::NAMESPACE_ANY;

/// Serialization role of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    /// Element attribute
    Attribute,
    /// Catch-all for attributes without a dedicated field
    Attributes,
    /// Child element
    Element,
    /// Character content of the element itself
    Text,
    /// Catch-all for child elements and, in mixed classes, text
    Wildcard,
}

/// Type reference of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// XSD built-in scalar
    Native(DataType),
    /// Registered model class, by name
    Class(String),
}

impl FieldType {
    /// Reference a model class by name
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }
}

impl From<DataType> for FieldType {
    fn from(value: DataType) -> Self {
        Self::Native(value)
    }
}

/// Cardinality of a field; `max == None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum occurrences
    pub min: u32,
    /// Maximum occurrences
    pub max: Option<u32>,
}

impl Occurs {
    /// Exactly one
    pub const ONE: Occurs = Occurs { min: 1, max: Some(1) };
    /// Zero or one
    pub const OPTIONAL: Occurs = Occurs { min: 0, max: Some(1) };
    /// Zero or more
    pub const UNBOUNDED: Occurs = Occurs { min: 0, max: None };

    /// Whether values collect into a sequence
    pub fn is_list(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONE
    }
}

/// One field of a model class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Source field name
    pub name: String,
    /// Serialized name, derived from `name` when absent
    pub local_name: Option<String>,
    /// Serialization role
    pub tag: FieldTag,
    /// `None` inherits, `Some("")` forces no namespace; wildcards take a
    /// namespace constraint such as `##any` or `##other`
    pub namespace: Option<String>,
    /// Candidate types, in order
    pub types: Vec<FieldType>,
    /// Cardinality
    pub occurs: Occurs,
    /// Lexical default value
    pub default: Option<String>,
    /// Whether binding fails when the field is left unpopulated
    pub required: bool,
    /// Whether `xsi:nil` is accepted
    pub nillable: bool,
}

impl FieldDescriptor {
    /// Create a field with the given role
    pub fn new(name: impl Into<String>, tag: FieldTag) -> Self {
        Self {
            name: name.into(),
            local_name: None,
            tag,
            namespace: None,
            types: Vec::new(),
            occurs: Occurs::ONE,
            default: None,
            required: false,
            nillable: false,
        }
    }

    /// Attribute field
    pub fn attribute(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self::new(name, FieldTag::Attribute).with_type(ty)
    }

    /// Catch-all attributes field
    pub fn attributes(name: impl Into<String>) -> Self {
        Self::new(name, FieldTag::Attributes).with_namespace(NAMESPACE_ANY)
    }

    /// Child element field
    pub fn element(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self::new(name, FieldTag::Element).with_type(ty)
    }

    /// Text content field
    pub fn text(name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Self::new(name, FieldTag::Text).with_type(ty)
    }

    /// Wildcard field accepting any namespace, as a sequence
    pub fn wildcard(name: impl Into<String>) -> Self {
        Self::new(name, FieldTag::Wildcard)
            .with_type(DataType::AnyType)
            .with_namespace(NAMESPACE_ANY)
            .with_occurs(Occurs::UNBOUNDED)
    }

    /// Set the serialized name
    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a candidate type
    pub fn with_type(mut self, ty: impl Into<FieldType>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Set the cardinality
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Collect repeated values into a sequence
    pub fn list(self) -> Self {
        self.with_occurs(Occurs::UNBOUNDED)
    }

    /// Allow the field to be absent
    pub fn optional(self) -> Self {
        self.with_occurs(Occurs::OPTIONAL)
    }

    /// Fail binding when the field is absent
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Accept `xsi:nil`
    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    /// Set the lexical default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Declaration of a model class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    /// Unique type path, e.g. `books.BookForm`
    pub name: String,
    /// Serialized name, derived from the last path segment when absent
    pub local_name: Option<String>,
    /// Target namespace
    pub namespace: Option<String>,
    /// Parent class name
    pub extends: Option<String>,
    /// Whether text may interleave with child elements
    pub mixed: bool,
    /// Whether `xsi:nil` still builds an instance
    pub nillable: bool,
    /// Own fields, in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl ClassDescriptor {
    /// Create an empty class declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_name: None,
            namespace: None,
            extends: None,
            mixed: false,
            nillable: false,
            fields: Vec::new(),
        }
    }

    /// Set the serialized name
    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    /// Set the target namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Inherit from a registered class
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Declare mixed content
    pub fn mixed(mut self) -> Self {
        self.mixed = true;
        self
    }

    /// Declare the class nillable
    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    /// Add a field
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Last segment of the type path
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}
