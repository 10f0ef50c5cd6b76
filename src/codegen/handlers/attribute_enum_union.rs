use super::ClassHandler;
use crate::codegen::container::ClassContainer;
use crate::codegen::models::{AttrType, Class};

/// Collapses a simple type whose single member is a union of
/// enumerations into one enumeration.
///
/// Union members are resolved as inner classes for forward references
/// and as container classes otherwise. The class is left untouched unless
/// every member resolves to an enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeEnumUnionHandler;

impl ClassHandler for AttributeEnumUnionHandler {
    fn process(&self, target: &Class, container: &ClassContainer) -> Class {
        if target.attrs.len() != 1 || !target.is_simple() {
            return target.clone();
        }

        let mut members = Vec::with_capacity(target.attrs[0].types.len());
        for attr_type in &target.attrs[0].types {
            let member = match attr_type {
                AttrType::Forward(name) => target.find_inner(name),
                AttrType::Reference(qname) => container.find(qname),
                AttrType::Native(_) => None,
            };
            match member {
                Some(class) if class.is_enumeration() => members.push(class),
                _ => return target.clone(),
            }
        }
        if members.is_empty() {
            return target.clone();
        }

        let mut merged = target.clone();
        merged.attrs = members
            .iter()
            .flat_map(|member| member.attrs.iter().cloned())
            .enumerate()
            .map(|(index, attr)| attr.with_index(index))
            .collect();
        merged.inner.clear();

        tracing::debug!(class = %target.qname, members = merged.attrs.len(), "collapsed enumeration union");
        merged
    }
}
