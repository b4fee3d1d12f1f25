//! Spec table keyed by ident

use crate::model::{ClassSpec, ElementSpec, MacroSpec, Spec};
use std::collections::BTreeMap;

/// Flat table of loaded specs. A key is written at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecTable {
    specs: BTreeMap<String, Spec>,
}

impl SpecTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    /// Register a spec under its own ident.
    ///
    /// Returns `false` and leaves the table untouched when the ident is
    /// already present.
    pub fn register(&mut self, spec: Spec) -> bool {
        if self.specs.contains_key(spec.ident()) {
            return false;
        }
        self.specs.insert(spec.ident().to_string(), spec);
        true
    }

    /// Get a spec by ident
    pub fn get(&self, ident: &str) -> Option<&Spec> {
        self.specs.get(ident)
    }

    pub(crate) fn get_mut(&mut self, ident: &str) -> Option<&mut Spec> {
        self.specs.get_mut(ident)
    }

    /// Check if a spec exists
    pub fn contains(&self, ident: &str) -> bool {
        self.specs.contains_key(ident)
    }

    pub fn element(&self, ident: &str) -> Option<&ElementSpec> {
        match self.specs.get(ident) {
            Some(Spec::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn class(&self, ident: &str) -> Option<&ClassSpec> {
        match self.specs.get(ident) {
            Some(Spec::Class(c)) => Some(c),
            _ => None,
        }
    }

    pub fn macro_spec(&self, ident: &str) -> Option<&MacroSpec> {
        match self.specs.get(ident) {
            Some(Spec::Macro(m)) => Some(m),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spec> {
        self.specs.values()
    }
}

impl FromIterator<Spec> for SpecTable {
    fn from_iter<I: IntoIterator<Item = Spec>>(iter: I) -> Self {
        let mut table = SpecTable::new();
        for spec in iter {
            table.register(spec);
        }
        table
    }
}
