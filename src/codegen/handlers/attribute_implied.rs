use super::ClassHandler;
use crate::codegen::container::ClassContainer;
use crate::codegen::models::{Attr, AttrType, Class, Restrictions, Tag};
use crate::converters::DataType;
use crate::namespaces::NAMESPACE_ANY;

/// Gives mixed classes without a wildcard member an implied `content`
/// wildcard in first position, so interleaved text has somewhere to go.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeImpliedHandler;

impl AttributeImpliedHandler {
    /// The implied wildcard member
    pub fn implied_attr() -> Attr {
        Attr::new(Tag::Any, "content")
            .with_type(AttrType::Native(DataType::AnyType))
            .with_namespace(NAMESPACE_ANY)
            .with_restrictions(Restrictions {
                min_occurs: 0,
                max_occurs: None,
                ..Restrictions::default()
            })
    }
}

impl ClassHandler for AttributeImpliedHandler {
    fn process(&self, target: &Class, _container: &ClassContainer) -> Class {
        if !target.mixed || target.has_wild_attr() {
            return target.clone();
        }

        let mut patched = target.clone();
        patched.attrs.insert(0, Self::implied_attr());
        for (index, attr) in patched.attrs.iter_mut().enumerate() {
            attr.index = index;
        }
        patched
    }
}
