//! XML name validation and naming conventions
//!
//! This module validates the serialized names of classes and fields and
//! derives them from source identifiers through configurable naming
//! conventions.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\-\.0-9\u{B7}]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid NCName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Naming convention used to derive serialized names from identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameConvention {
    /// Keep the identifier as is
    #[default]
    Original,
    /// `camelCase`
    CamelCase,
    /// `PascalCase`
    PascalCase,
    /// `snake_case`
    SnakeCase,
    /// `kebab-case`
    KebabCase,
}

impl NameConvention {
    /// Apply the convention to an identifier
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Original => name.to_string(),
            Self::CamelCase => {
                let mut out = String::new();
                for (i, word) in split_words(name).iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            Self::PascalCase => split_words(name).iter().map(|w| capitalize(w)).collect(),
            Self::SnakeCase => join_lower(name, "_"),
            Self::KebabCase => join_lower(name, "-"),
        }
    }
}

fn join_lower(name: &str, sep: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Split an identifier into words on separators and case boundaries.
///
/// `HTTPServer_name` splits into `HTTP`, `Server`, `name`. Digits never
/// start a word.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let boundary = match current.chars().last() {
            Some(prev) if c.is_uppercase() => {
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                !prev.is_uppercase() || next_is_lower
            }
            _ => false,
        };

        if boundary {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}
