//! Lowering of processed classes into model class descriptors

use super::container::ClassContainer;
use super::models::{Attr, AttrType, Class, Tag};
use crate::converters::DataType;
use crate::error::{DefinitionError, Result};
use crate::models::{ClassDescriptor, FieldDescriptor, FieldTag, FieldType, Occurs};
use std::collections::HashSet;

impl ClassContainer {
    /// Descriptors for every non-enumeration class, inner classes
    /// included, ordered so that parents precede their subclasses.
    ///
    /// Enumerations have no model class; references to them bind as
    /// strings.
    pub fn to_descriptors(&self) -> Result<Vec<ClassDescriptor>> {
        let mut lowered = Vec::new();
        for class in self.classes() {
            if !class.is_enumeration() {
                self.lower(class, None, &mut lowered)?;
            }
        }
        order_by_extension(lowered)
    }

    fn lower(&self, class: &Class, outer: Option<&str>, out: &mut Vec<ClassDescriptor>) -> Result<()> {
        let name = match outer {
            Some(outer) => format!("{}.{}", outer, class.name()),
            None => class.name().to_string(),
        };

        let mut descriptor = ClassDescriptor::new(&name).with_local_name(class.name());
        if let Some(namespace) = class.qname.namespace() {
            descriptor = descriptor.with_namespace(namespace);
        }
        descriptor.mixed = class.mixed;
        descriptor.nillable = class.nillable;

        for extension in &class.extensions {
            if let AttrType::Reference(qname) = extension {
                if let Some(parent) = self.find(qname).filter(|p| !p.is_simple() && !p.is_enumeration()) {
                    descriptor.extends = Some(parent.name().to_string());
                    break;
                }
            }
        }

        for attr in &class.attrs {
            descriptor.fields.push(self.lower_attr(class, &name, attr)?);
        }
        out.push(descriptor);

        for inner in &class.inner {
            if !inner.is_enumeration() {
                self.lower(inner, Some(&name), out)?;
            }
        }
        Ok(())
    }

    fn lower_attr(&self, class: &Class, class_name: &str, attr: &Attr) -> Result<FieldDescriptor> {
        let error = |message: String| DefinitionError::new(message).with_class(class_name).with_field(&attr.name);

        let tag = match attr.tag {
            Tag::Attribute => FieldTag::Attribute,
            Tag::AnyAttribute => FieldTag::Attributes,
            Tag::Element => FieldTag::Element,
            Tag::Any => FieldTag::Wildcard,
            Tag::Extension | Tag::Restriction | Tag::Union | Tag::SimpleType => FieldTag::Text,
            Tag::Enumeration | Tag::ComplexType => {
                return Err(error(format!("{:?} members cannot become fields", attr.tag)).into())
            }
        };

        let mut field = FieldDescriptor::new(&attr.name, tag).with_local_name(&attr.local_name);
        if let Some(namespace) = &attr.namespace {
            field = field.with_namespace(namespace);
        }

        for attr_type in &attr.types {
            let field_type = match attr_type {
                AttrType::Native(dt) => FieldType::Native(*dt),
                AttrType::Forward(name) => match class.find_inner(name) {
                    Some(inner) if inner.is_enumeration() => FieldType::Native(DataType::String),
                    Some(_) => FieldType::Class(format!("{}.{}", class_name, name)),
                    None => return Err(error(format!("unknown inner class `{}`", name)).into()),
                },
                AttrType::Reference(qname) => match self.find(qname) {
                    Some(target) if target.is_enumeration() || target.is_simple() => {
                        FieldType::Native(DataType::String)
                    }
                    Some(target) => FieldType::Class(target.name().to_string()),
                    None => return Err(error(format!("unknown class `{}`", qname)).into()),
                },
            };
            if !field.types.contains(&field_type) {
                field.types.push(field_type);
            }
        }

        field.occurs = Occurs {
            min: attr.restrictions.min_occurs,
            max: attr.restrictions.max_occurs,
        };
        field.required = attr.restrictions.required;
        field.nillable = attr.restrictions.nillable;
        if !attr.is_enumeration() {
            field.default = attr.default.clone();
        }
        Ok(field)
    }
}

fn order_by_extension(mut pending: Vec<ClassDescriptor>) -> Result<Vec<ClassDescriptor>> {
    let mut ordered = Vec::with_capacity(pending.len());
    let mut emitted: HashSet<String> = HashSet::new();

    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::new();
        for descriptor in pending {
            let ready = descriptor
                .extends
                .as_ref()
                .map_or(true, |parent| emitted.contains(parent));
            if ready {
                emitted.insert(descriptor.name.clone());
                ordered.push(descriptor);
            } else {
                waiting.push(descriptor);
            }
        }
        if waiting.len() == before {
            let names: Vec<_> = waiting.iter().map(|d| d.name.as_str()).collect();
            return Err(DefinitionError::new(format!(
                "unresolvable base classes for {}",
                names.join(", ")
            ))
            .into());
        }
        pending = waiting;
    }
    Ok(ordered)
}
