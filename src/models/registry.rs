//! Explicit model class registry
//!
//! Every model class is registered once and addressed by its [`ClassId`]
//! afterwards. The registry generation moves on each registration, which
//! is how the context service knows its type index went stale.

use super::descriptors::{ClassDescriptor, FieldDescriptor};
use crate::error::{DefinitionError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handle of a registered model class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry of model classes in registration order
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<Arc<ClassDescriptor>>,
    by_name: HashMap<String, ClassId>,
    generation: u64,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class; its parent must already be registered
    pub fn register(&mut self, descriptor: ClassDescriptor) -> Result<ClassId> {
        if self.by_name.contains_key(&descriptor.name) {
            return Err(DefinitionError::new("class is already registered")
                .with_class(&descriptor.name)
                .into());
        }

        if let Some(parent) = &descriptor.extends {
            if !self.by_name.contains_key(parent) {
                return Err(
                    DefinitionError::new(format!("parent class `{}` is not registered", parent))
                        .with_class(&descriptor.name)
                        .into(),
                );
            }
        }

        let id = ClassId::new(self.classes.len());
        self.by_name.insert(descriptor.name.clone(), id);
        self.classes.push(Arc::new(descriptor));
        self.generation += 1;
        Ok(id)
    }

    /// Get a class by id
    pub fn get(&self, id: ClassId) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(id.0)
    }

    /// Get a class id by name
    pub fn id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registration counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registered classes in registration order
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &Arc<ClassDescriptor>)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, class)| (ClassId::new(i), class))
    }

    /// The class followed by its ancestors, nearest first
    pub fn mro(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(class_id) = current {
            chain.push(class_id);
            current = self
                .get(class_id)
                .and_then(|class| class.extends.as_deref())
                .and_then(|parent| self.id(parent));
        }
        chain
    }

    /// All fields of a class, inherited ones first.
    ///
    /// A field redeclared by a subclass keeps its inherited position.
    pub fn fields(&self, id: ClassId) -> Vec<FieldDescriptor> {
        let mut fields: IndexMap<&str, &FieldDescriptor> = IndexMap::new();
        for class_id in self.mro(id).into_iter().rev() {
            if let Some(class) = self.get(class_id) {
                for field in &class.fields {
                    fields.insert(field.name.as_str(), field);
                }
            }
        }
        fields.into_values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::DataType;

    fn registry() -> (ClassRegistry, ClassId, ClassId) {
        let mut registry = ClassRegistry::new();
        let base = registry
            .register(
                ClassDescriptor::new("Base")
                    .with_field(FieldDescriptor::element("a", DataType::String))
                    .with_field(FieldDescriptor::element("b", DataType::String)),
            )
            .unwrap();
        let derived = registry
            .register(
                ClassDescriptor::new("Derived")
                    .extends("Base")
                    .with_field(FieldDescriptor::element("c", DataType::String))
                    .with_field(FieldDescriptor::element("a", DataType::Int)),
            )
            .unwrap();
        (registry, base, derived)
    }

    #[test]
    fn test_register_and_lookup() {
        let (registry, base, derived) = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.generation(), 2);
        assert_eq!(registry.id("Derived"), Some(derived));
        assert_eq!(registry.get(base).map(|c| c.name.as_str()), Some("Base"));
    }

    #[test]
    fn test_duplicate_and_missing_parent() {
        let (mut registry, _, _) = registry();
        assert!(registry.register(ClassDescriptor::new("Base")).is_err());
        assert!(registry
            .register(ClassDescriptor::new("Orphan").extends("Missing"))
            .is_err());
        assert_eq!(registry.generation(), 2);
    }

    #[test]
    fn test_mro_and_inherited_fields() {
        let (registry, base, derived) = registry();
        assert_eq!(registry.mro(derived), vec![derived, base]);

        let fields = registry.fields(derived);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(fields[0].types, vec![DataType::Int.into()]);
    }
}
