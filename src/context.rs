//! Binding context service
//!
//! [`XmlContext`] owns the class registry and memoizes metadata per
//! (class, parent namespace). It also keeps an index from element names
//! to classes which drives `xsi:type` polymorphism. The index is rebuilt
//! lazily whenever the registry generation moves.
//!
//! A context is shared as `Arc<XmlContext>`. Caches sit behind
//! `parking_lot` locks and no write lock is taken while another lock is
//! held. Concurrent builders of the same key may both build; the first
//! inserted metadata is kept.

use crate::converters::DataType;
use crate::dataobjects::DataObject;
use crate::error::{Error, Result};
use crate::models::{ClassDescriptor, ClassId, ClassRegistry, XmlMeta, XmlMetaBuilder};
use crate::names::NameConvention;
use crate::namespaces::QName;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Naming configuration of a context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ContextConfig {
    /// Convention deriving class and element names
    pub element_name_generator: NameConvention,
    /// Convention deriving attribute names
    pub attribute_name_generator: NameConvention,
}

impl ContextConfig {
    /// Set the element naming convention
    pub fn with_element_name_generator(mut self, convention: NameConvention) -> Self {
        self.element_name_generator = convention;
        self
    }

    /// Set the attribute naming convention
    pub fn with_attribute_name_generator(mut self, convention: NameConvention) -> Self {
        self.attribute_name_generator = convention;
        self
    }
}

type MetaKey = (ClassId, Option<String>);

#[derive(Debug, Default)]
struct XsiCache {
    generation: Option<u64>,
    types: IndexMap<QName, Vec<ClassId>>,
}

/// Shared binding context
#[derive(Debug, Default)]
pub struct XmlContext {
    config: ContextConfig,
    registry: RwLock<ClassRegistry>,
    cache: RwLock<HashMap<MetaKey, Arc<XmlMeta>>>,
    xsi_cache: RwLock<XsiCache>,
}

impl XmlContext {
    /// Create a context with default naming
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the given naming configuration
    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Naming configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Register a model class
    pub fn register(&self, descriptor: ClassDescriptor) -> Result<ClassId> {
        let name = descriptor.name.clone();
        let id = self.registry.write().register(descriptor)?;
        tracing::debug!(class = %name, id = %id, "registered class");
        Ok(id)
    }

    /// Descriptor of a registered class
    pub fn class(&self, clazz: ClassId) -> Result<Arc<ClassDescriptor>> {
        self.registry
            .read()
            .get(clazz)
            .cloned()
            .ok_or_else(|| Error::Context(format!("class {} is not registered", clazz)))
    }

    /// Id of a registered class by name
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.registry.read().id(name)
    }

    /// The class followed by its ancestors
    pub fn mro(&self, clazz: ClassId) -> Vec<ClassId> {
        self.registry.read().mro(clazz)
    }

    /// Number of memoized metadata entries
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Metadata of `clazz`, switched to a subclass matching `xsi_type`
    /// when one is given and compatible
    pub fn fetch(
        &self,
        clazz: ClassId,
        parent_ns: Option<&str>,
        xsi_type: Option<&QName>,
    ) -> Result<Arc<XmlMeta>> {
        let meta = self.build(clazz, parent_ns)?;
        let Some(xsi_type) = xsi_type else {
            return Ok(meta);
        };
        if meta.source_qname == *xsi_type {
            return Ok(meta);
        }

        match self.find_subclass(clazz, xsi_type) {
            Some(subclass) => {
                tracing::debug!(class = %meta.class_name, xsi_type = %xsi_type, "switching to subclass");
                self.build(subclass, parent_ns)
            }
            None => {
                tracing::debug!(
                    class = %meta.class_name,
                    xsi_type = %xsi_type,
                    "no compatible subclass, keeping the declared class"
                );
                Ok(meta)
            }
        }
    }

    /// Memoized metadata of `clazz` under `parent_ns`
    pub fn build(&self, clazz: ClassId, parent_ns: Option<&str>) -> Result<Arc<XmlMeta>> {
        let key = (clazz, parent_ns.map(String::from));
        if let Some(meta) = self.cache.read().get(&key) {
            return Ok(Arc::clone(meta));
        }

        let meta = {
            let registry = self.registry.read();
            XmlMetaBuilder::new(&registry)
                .with_element_name_generator(self.config.element_name_generator)
                .with_attribute_name_generator(self.config.attribute_name_generator)
                .build(clazz, parent_ns)?
        };

        let mut cache = self.cache.write();
        let entry = cache.entry(key).or_insert_with(|| Arc::new(meta));
        Ok(Arc::clone(entry))
    }

    /// Rebuild the element-name index if the registry changed since the
    /// last build. Returns whether a rebuild happened.
    pub fn build_xsi_cache(&self) -> bool {
        let (generation, types) = {
            let registry = self.registry.read();
            if self.xsi_cache.read().generation == Some(registry.generation()) {
                return false;
            }

            let mut types: IndexMap<QName, Vec<ClassId>> = IndexMap::new();
            for (id, descriptor) in registry.iter() {
                let qname = XmlMetaBuilder::build_source_qname(
                    descriptor,
                    self.config.element_name_generator,
                );
                types.entry(qname).or_default().push(id);
            }
            (registry.generation(), types)
        };

        tracing::debug!(generation, entries = types.len(), "rebuilt xsi type index");
        let mut cache = self.xsi_cache.write();
        cache.generation = Some(generation);
        cache.types = types;
        true
    }

    /// Classes whose element name is `qname`, in registration order.
    ///
    /// Names of XSD built-in types never resolve to classes.
    pub fn find_types(&self, qname: &QName) -> Vec<ClassId> {
        if DataType::from_qname(qname).is_some() {
            return Vec::new();
        }
        self.build_xsi_cache();
        self.xsi_cache
            .read()
            .types
            .get(qname)
            .cloned()
            .unwrap_or_default()
    }

    /// Most recently registered class named `qname`
    pub fn find_type(&self, qname: &QName) -> Option<ClassId> {
        self.find_types(qname).last().copied()
    }

    /// First class, in registration order, declaring every given field name
    pub fn find_type_by_fields(&self, field_names: &HashSet<String>) -> Option<ClassId> {
        let registry = self.registry.read();
        let found = registry.iter().map(|(id, _)| id).find(|&id| {
            let fields: HashSet<String> =
                registry.fields(id).into_iter().map(|f| f.name).collect();
            field_names.is_subset(&fields)
        });
        found
    }

    /// First class, in registration order, named `qname` that shares an
    /// ancestor with `clazz`
    pub fn find_subclass(&self, clazz: ClassId, qname: &QName) -> Option<ClassId> {
        let candidates = self.find_types(qname);
        let registry = self.registry.read();
        let clazz_mro = registry.mro(clazz);
        let found = candidates.into_iter().find(|&candidate| {
            registry
                .mro(candidate)
                .iter()
                .any(|ancestor| clazz_mro.contains(ancestor))
        });
        found
    }

    /// Whether `obj` is an instance of `clazz`, of one of its subclasses or
    /// of the class `clazz` directly extends
    pub fn is_derived(&self, obj: &DataObject, clazz: ClassId) -> bool {
        let registry = self.registry.read();
        let obj_mro = registry.mro(obj.class());
        if obj_mro.contains(&clazz) {
            return true;
        }
        let parent = registry
            .get(clazz)
            .and_then(|descriptor| descriptor.extends.as_deref())
            .and_then(|parent| registry.id(parent));
        parent.map_or(false, |parent| obj_mro.contains(&parent))
    }
}
