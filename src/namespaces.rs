//! XML namespace handling
//!
//! This module provides utilities for working with XML namespaces,
//! qualified names (QNames), scoped prefix mappings and the namespace
//! constraints attached to wildcard fields.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace (`xsi:type`, `xsi:nil`)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XInclude namespace
pub const XINCLUDE_NAMESPACE: &str = "http://www.w3.org/2001/XInclude";

/// Wildcard namespace sentinel matching any namespace
pub const NAMESPACE_ANY: &str = "##any";

/// Prefix to namespace URI mapping; the `None` key is the default namespace
pub type NamespaceMap = IndexMap<Option<String>, String>;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.map(|s| s.into()).filter(|s| !s.is_empty());
        Self {
            namespace,
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// Namespace URI as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether this is `xsi:<local_name>`
    pub fn is_xsi(&self, local_name: &str) -> bool {
        self.namespace() == Some(XSI_NAMESPACE) && self.local_name == local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

impl FromStr for QName {
    type Err = Error;

    /// Parse Clark notation: `{namespace}local` or `local`
    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix('{') {
            Some(rest) => {
                let (ns, local) = rest
                    .split_once('}')
                    .ok_or_else(|| Error::Namespace(format!("Malformed qualified name: {}", s)))?;
                Ok(QName::new(Some(ns), local))
            }
            None => Ok(QName::local(s)),
        }
    }
}

/// Resolve a `prefix:local` value against a namespace map.
///
/// Unprefixed names take the default namespace.
pub fn resolve_prefixed(ns_map: &NamespaceMap, prefixed_name: &str) -> Result<QName> {
    let prefixed_name = prefixed_name.trim();
    if let Some((prefix, local)) = prefixed_name.split_once(':') {
        if prefix == "xml" {
            return Ok(QName::namespaced(XML_NAMESPACE, local));
        }
        let namespace = ns_map
            .get(&Some(prefix.to_string()))
            .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
        Ok(QName::new(Some(namespace.as_str()), local))
    } else {
        Ok(QName::new(ns_map.get(&None).map(|s| s.as_str()), prefixed_name))
    }
}

/// Scoped namespace context for resolving prefixes while streaming
#[derive(Debug, Clone)]
pub struct NamespaceContext {
    /// One frame of declarations per open element
    scopes: Vec<NamespaceMap>,
}

impl NamespaceContext {
    /// Create a new namespace context with an empty base scope
    pub fn new() -> Self {
        Self {
            scopes: vec![NamespaceMap::new()],
        }
    }

    /// Open a scope for a new element
    pub fn push_scope(&mut self) {
        self.scopes.push(NamespaceMap::new());
    }

    /// Close the innermost scope
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a prefix in the innermost scope; `None` is the default namespace
    pub fn declare(&mut self, prefix: Option<&str>, namespace: impl Into<String>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(prefix.map(String::from), namespace.into());
        }
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.lookup(&Some(prefix.to_string()))
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.lookup(&None)
    }

    fn lookup(&self, key: &Option<String>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(key))
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Resolve a prefixed element name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            if prefix == "xml" {
                return Ok(QName::namespaced(XML_NAMESPACE, local));
            }
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.get_default_namespace(), prefixed_name))
        }
    }

    /// Resolve a prefixed attribute name; unprefixed attributes have no namespace
    pub fn resolve_attribute(&self, prefixed_name: &str) -> Result<QName> {
        if prefixed_name.contains(':') {
            self.resolve(prefixed_name)
        } else {
            Ok(QName::local(prefixed_name))
        }
    }

    /// Flattened view of every prefix currently in scope
    pub fn in_scope(&self) -> NamespaceMap {
        let mut merged = NamespaceMap::new();
        for scope in &self.scopes {
            for (prefix, uri) in scope {
                if uri.is_empty() {
                    merged.shift_remove(prefix);
                } else {
                    merged.insert(prefix.clone(), uri.clone());
                }
            }
        }
        merged
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace constraint for wildcard fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces; the empty string is "no namespace"
    Enumeration(HashSet<String>),
}

impl NamespaceConstraint {
    /// Create from a wildcard namespace declaration
    pub fn from_namespace_attr(value: &str, target_namespace: Option<&str>) -> Result<Self> {
        let value = value.trim();

        match value {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            _ => {
                let mut namespaces = HashSet::new();
                for ns in value.split_whitespace() {
                    match ns {
                        "##local" => {
                            namespaces.insert(String::new());
                        }
                        "##targetNamespace" => {
                            namespaces.insert(target_namespace.unwrap_or_default().to_string());
                        }
                        s if s.starts_with("##") => {
                            return Err(Error::Namespace(format!(
                                "wrong value '{}' in wildcard namespace",
                                s
                            )));
                        }
                        uri => {
                            namespaces.insert(uri.to_string());
                        }
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Check if a namespace is allowed by this constraint
    pub fn is_allowed(&self, namespace: Option<&str>) -> bool {
        let namespace = namespace.unwrap_or_default();
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                !namespace.is_empty() && target_namespace.as_deref() != Some(namespace)
            }
            Self::Enumeration(set) => set.contains(namespace),
        }
    }
}
