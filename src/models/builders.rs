//! Metadata builder
//!
//! Turns a registered [`ClassDescriptor`] into [`XmlMeta`]. The result
//! depends only on the registry contents, the class, the parent namespace
//! and the naming conventions, so building twice yields equal metadata.
//!
//! ## Namespace rules
//!
//! - Class: its own namespace, else the parent namespace
//! - Element fields: declared namespace, else the class namespace, else the
//!   parent namespace; an empty declared namespace means none
//! - Attribute fields: declared namespace or none
//! - Wildcards and catch-all attributes: a namespace constraint, `##any`
//!   unless declared

use super::descriptors::{ClassDescriptor, FieldDescriptor, FieldTag, FieldType};
use super::elements::{VarType, XmlMeta, XmlVar};
use super::registry::{ClassId, ClassRegistry};
use crate::converters::DataType;
use crate::error::{DefinitionError, Error, Result};
use crate::names::{is_valid_ncname, NameConvention};
use crate::namespaces::{NamespaceConstraint, QName, NAMESPACE_ANY};
use std::collections::HashSet;

/// Builds [`XmlMeta`] for registered classes
#[derive(Debug, Clone, Copy)]
pub struct XmlMetaBuilder<'a> {
    registry: &'a ClassRegistry,
    element_name_generator: NameConvention,
    attribute_name_generator: NameConvention,
}

impl<'a> XmlMetaBuilder<'a> {
    /// Create a builder with the original-name convention
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self {
            registry,
            element_name_generator: NameConvention::Original,
            attribute_name_generator: NameConvention::Original,
        }
    }

    /// Set the convention for class and element names
    pub fn with_element_name_generator(mut self, convention: NameConvention) -> Self {
        self.element_name_generator = convention;
        self
    }

    /// Set the convention for attribute names
    pub fn with_attribute_name_generator(mut self, convention: NameConvention) -> Self {
        self.attribute_name_generator = convention;
        self
    }

    /// Element name of a class in its own namespace
    pub fn build_source_qname(
        descriptor: &ClassDescriptor,
        element_name_generator: NameConvention,
    ) -> QName {
        let local_name = match &descriptor.local_name {
            Some(name) => name.clone(),
            None => element_name_generator.apply(descriptor.simple_name()),
        };
        QName::new(descriptor.namespace.as_deref(), local_name)
    }

    /// Build the metadata of `clazz` as seen under `parent_ns`
    pub fn build(&self, clazz: ClassId, parent_ns: Option<&str>) -> Result<XmlMeta> {
        let descriptor = self
            .registry
            .get(clazz)
            .ok_or_else(|| Error::Context(format!("class {} is not registered", clazz)))?;

        let source_qname = Self::build_source_qname(descriptor, self.element_name_generator);
        if !is_valid_ncname(&source_qname.local_name) {
            return Err(DefinitionError::new(format!(
                "invalid element name `{}`",
                source_qname.local_name
            ))
            .with_class(&descriptor.name)
            .into());
        }

        let class_ns = descriptor
            .namespace
            .as_deref()
            .or(parent_ns)
            .filter(|ns| !ns.is_empty());
        let qname = QName::new(class_ns, source_qname.local_name.clone());

        let mut meta = XmlMeta::new(clazz, &descriptor.name, qname, source_qname);
        meta.nillable = descriptor.nillable;
        meta.mixed_content = descriptor.mixed;

        let mut seen_elements = HashSet::new();
        let mut seen_attributes = HashSet::new();
        let mut has_text = false;
        let mut has_any_attributes = false;
        let mut has_wildcard = false;

        for (index, field) in self.registry.fields(clazz).iter().enumerate() {
            let var = self.build_var(descriptor, field, index, class_ns)?;
            let error = |message: String| -> Error {
                DefinitionError::new(message)
                    .with_class(&descriptor.name)
                    .with_field(&field.name)
                    .into()
            };

            match var.tag {
                FieldTag::Text => {
                    if has_text {
                        return Err(error("class declares more than one text field".into()));
                    }
                    has_text = true;
                }
                FieldTag::Attributes => {
                    if has_any_attributes {
                        return Err(error(
                            "class declares more than one catch-all attributes field".into(),
                        ));
                    }
                    has_any_attributes = true;
                }
                FieldTag::Attribute => {
                    if !seen_attributes.insert(var.qname.clone()) {
                        return Err(error(format!("duplicate attribute name `{}`", var.qname)));
                    }
                }
                FieldTag::Element => {
                    if !seen_elements.insert(var.qname.clone()) {
                        return Err(error(format!("duplicate element name `{}`", var.qname)));
                    }
                }
                FieldTag::Wildcard => has_wildcard = true,
            }

            meta.push_var(var);
        }

        if descriptor.mixed && !has_wildcard {
            return Err(DefinitionError::new("mixed content requires a wildcard field")
                .with_class(&descriptor.name)
                .into());
        }

        tracing::trace!(class = %descriptor.name, qname = %meta.qname, "built class metadata");
        Ok(meta)
    }

    fn build_var(
        &self,
        descriptor: &ClassDescriptor,
        field: &FieldDescriptor,
        index: usize,
        class_ns: Option<&str>,
    ) -> Result<XmlVar> {
        let definition_error = |message: String| -> Error {
            DefinitionError::new(message)
                .with_class(&descriptor.name)
                .with_field(&field.name)
                .into()
        };

        let local_name = match &field.local_name {
            Some(name) => name.clone(),
            None => match field.tag {
                FieldTag::Attribute => self.attribute_name_generator.apply(&field.name),
                _ => self.element_name_generator.apply(&field.name),
            },
        };

        let named = matches!(field.tag, FieldTag::Attribute | FieldTag::Element);
        if named && !is_valid_ncname(&local_name) {
            return Err(definition_error(format!("invalid XML name `{}`", local_name)));
        }

        let declared = field.namespace.as_deref();
        let (namespace, namespace_constraint) = match field.tag {
            FieldTag::Element => (declared.or(class_ns), None),
            FieldTag::Attribute => (declared, None),
            FieldTag::Text => (None, None),
            FieldTag::Wildcard | FieldTag::Attributes => {
                let constraint = NamespaceConstraint::from_namespace_attr(
                    declared.unwrap_or(NAMESPACE_ANY),
                    class_ns,
                )
                .map_err(|e| definition_error(e.to_string()))?;
                (None, Some(constraint))
            }
        };

        let mut types = Vec::with_capacity(field.types.len());
        for ty in &field.types {
            types.push(match ty {
                FieldType::Native(dt) => VarType::Native(*dt),
                FieldType::Class(name) => {
                    let id = self.registry.id(name).ok_or_else(|| {
                        definition_error(format!("references unknown class `{}`", name))
                    })?;
                    VarType::Class(id)
                }
            });
        }
        if types.is_empty() {
            types.push(VarType::Native(match field.tag {
                FieldTag::Wildcard => DataType::AnyType,
                _ => DataType::String,
            }));
        }

        if field.tag == FieldTag::Text && types.iter().any(|t| matches!(t, VarType::Class(_))) {
            return Err(definition_error("text fields only accept scalar types".into()));
        }

        Ok(XmlVar {
            index,
            name: field.name.clone(),
            qname: QName::new(namespace, local_name),
            tag: field.tag,
            types,
            list: field.occurs.is_list() && field.tag != FieldTag::Attributes,
            required: field.required,
            nillable: field.nillable,
            default: field.default.clone(),
            namespace_constraint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::descriptors::FieldDescriptor;

    fn books_registry() -> (ClassRegistry, ClassId, ClassId) {
        let mut registry = ClassRegistry::new();
        let book = registry
            .register(
                ClassDescriptor::new("BookForm")
                    .with_field(FieldDescriptor::element("author", DataType::String))
                    .with_field(FieldDescriptor::element("pub_date", DataType::Date).optional())
                    .with_field(FieldDescriptor::attribute("id", DataType::String)),
            )
            .unwrap();
        let books = registry
            .register(
                ClassDescriptor::new("Books")
                    .with_local_name("books")
                    .with_namespace("urn:books")
                    .with_field(
                        FieldDescriptor::element("book", FieldType::class("BookForm"))
                            .with_namespace("")
                            .list(),
                    ),
            )
            .unwrap();
        (registry, book, books)
    }

    #[test]
    fn test_build_namespaces() {
        let (registry, book, books) = books_registry();
        let builder = XmlMetaBuilder::new(&registry);

        let meta = builder.build(books, None).unwrap();
        assert_eq!(meta.qname, QName::namespaced("urn:books", "books"));
        let var = meta.find_var_by_name("book").unwrap();
        assert_eq!(var.qname, QName::local("book"));
        assert!(var.list);
        assert_eq!(var.clazz(), Some(book));

        let meta = builder.build(book, Some("urn:books")).unwrap();
        assert_eq!(meta.qname, QName::namespaced("urn:books", "BookForm"));
        assert_eq!(meta.source_qname, QName::local("BookForm"));
        assert!(meta.find_element(&QName::namespaced("urn:books", "author")).is_some());
        assert!(meta.find_attribute(&QName::local("id")).is_some());
    }

    #[test]
    fn test_build_is_deterministic() {
        let (registry, book, _) = books_registry();
        let builder = XmlMetaBuilder::new(&registry);
        assert_eq!(builder.build(book, None).unwrap(), builder.build(book, None).unwrap());
    }

    #[test]
    fn test_name_conventions() {
        let (registry, book, _) = books_registry();
        let meta = XmlMetaBuilder::new(&registry)
            .with_element_name_generator(NameConvention::KebabCase)
            .build(book, None)
            .unwrap();
        assert_eq!(meta.qname.local_name, "book-form");
        assert!(meta.find_element(&QName::local("pub-date")).is_some());
    }

    #[test]
    fn test_definition_errors() {
        let mut registry = ClassRegistry::new();
        let two_texts = registry
            .register(
                ClassDescriptor::new("TwoTexts")
                    .with_field(FieldDescriptor::text("a", DataType::String))
                    .with_field(FieldDescriptor::text("b", DataType::String)),
            )
            .unwrap();
        let collision = registry
            .register(
                ClassDescriptor::new("Collision")
                    .with_field(FieldDescriptor::element("a", DataType::String))
                    .with_field(
                        FieldDescriptor::element("b", DataType::String).with_local_name("a"),
                    ),
            )
            .unwrap();
        let mixed = registry
            .register(ClassDescriptor::new("Mixed").mixed())
            .unwrap();
        let unknown = registry
            .register(
                ClassDescriptor::new("Unknown")
                    .with_field(FieldDescriptor::element("a", FieldType::class("Nope"))),
            )
            .unwrap();
        let bad_name = registry
            .register(
                ClassDescriptor::new("BadName").with_field(
                    FieldDescriptor::element("a", DataType::String).with_local_name("1a"),
                ),
            )
            .unwrap();

        let builder = XmlMetaBuilder::new(&registry);
        for clazz in [two_texts, collision, mixed, unknown, bad_name] {
            assert!(
                matches!(builder.build(clazz, None), Err(Error::Definition(_))),
                "expected a definition error for {}",
                clazz
            );
        }
    }

    #[test]
    fn test_inherited_fields_come_first() {
        let mut registry = ClassRegistry::new();
        registry
            .register(
                ClassDescriptor::new("Base")
                    .with_field(FieldDescriptor::element("a", DataType::String)),
            )
            .unwrap();
        let derived = registry
            .register(
                ClassDescriptor::new("Derived")
                    .extends("Base")
                    .with_field(FieldDescriptor::element("b", DataType::String)),
            )
            .unwrap();

        let meta = XmlMetaBuilder::new(&registry).build(derived, None).unwrap();
        let names: Vec<_> = meta.vars().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(meta.vars()[1].index, 1);
    }
}
