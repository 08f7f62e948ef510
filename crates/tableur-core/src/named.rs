//! Named constants
//!
//! A named constant binds an identifier to a raw text value, for instance
//! `TVA = 0,2`. Formulas can then use `=A1*(1+TVA)`.
//!
//! Names are case-insensitive. When several entries differ only by case, the
//! first one defined wins on lookup.

use crate::error::{Error, Result};

/// A single name → raw text binding
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedConstant {
    /// The name as the user typed it
    pub name: String,
    /// Raw text value, coerced like a cell when used in a formula
    pub value: String,
}

/// An ordered set of named constants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedConstants {
    entries: Vec<NamedConstant>,
}

impl NamedConstants {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a constant. Redefining an identical name replaces its value;
    /// names differing only by case are kept in definition order.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidName("name must not be empty".into()));
        }
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.value = value,
            None => self.entries.push(NamedConstant { name, value }),
        }
        Ok(())
    }

    /// Build a set from `(name, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut names = Self::new();
        for (name, value) in pairs {
            names.define(name, value)?;
        }
        Ok(names)
    }

    /// Case-insensitive lookup of the first matching entry
    pub fn find(&self, name: &str) -> Option<&NamedConstant> {
        self.entries
            .iter()
            .find(|entry| entry.name.to_lowercase() == name.to_lowercase())
    }

    /// Case-insensitive lookup of a value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|entry| entry.value.as_str())
    }

    /// Whether a name is defined (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Iterate over entries in definition order
    pub fn iter(&self) -> impl Iterator<Item = &NamedConstant> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no constant is defined
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let names = NamedConstants::from_pairs([("TauxTVA", "0,2")]).unwrap();
        assert_eq!(names.get("tauxtva"), Some("0,2"));
        assert_eq!(names.get("TAUXTVA"), Some("0,2"));
        assert!(names.contains("TauxTva"));
        assert_eq!(names.get("Remise"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let names = NamedConstants::from_pairs([("tva", "0,2"), ("TVA", "0,055")]).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("Tva"), Some("0,2"));
    }

    #[test]
    fn test_redefine_replaces() {
        let mut names = NamedConstants::new();
        names.define("Seuil", "10").unwrap();
        names.define("Seuil", "12").unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names.get("seuil"), Some("12"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut names = NamedConstants::new();
        assert!(names.define("  ", "1").is_err());
        assert!(names.is_empty());
    }
}
