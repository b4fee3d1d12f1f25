//! Element classification and auxiliary lookup tables

use crate::config::read_structured;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Editor category of a TEI element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Block structural container
    Hard,
    /// Text-bearing container
    Soft,
    /// Childless span element
    Inline,
    /// Floating annotation point
    Aside,
    /// Both block container and inline span
    Inter,
    /// Pure character formatting
    Mark,
}

impl Category {
    /// Elaboration order
    pub const ALL: [Category; 6] = [
        Category::Hard,
        Category::Soft,
        Category::Inter,
        Category::Aside,
        Category::Inline,
        Category::Mark,
    ];

    /// Key of this category in the classification file
    pub fn key(self) -> &'static str {
        match self {
            Category::Hard => "hard",
            Category::Soft => "soft",
            Category::Inline => "inlines",
            Category::Aside => "asides",
            Category::Inter => "inter",
            Category::Mark => "marks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Partition of element idents into editor categories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    pub hard: Vec<String>,
    pub soft: Vec<String>,
    pub inlines: Vec<String>,
    pub asides: Vec<String>,
    pub inter: Vec<String>,
    pub marks: Vec<String>,
    /// Not used by the compiler
    pub exclude: Vec<String>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add idents to a category
    pub fn with<I, T>(mut self, category: Category, idents: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.list_mut(category)
            .extend(idents.into_iter().map(Into::into));
        self
    }

    pub fn idents(&self, category: Category) -> &[String] {
        match category {
            Category::Hard => &self.hard,
            Category::Soft => &self.soft,
            Category::Inline => &self.inlines,
            Category::Aside => &self.asides,
            Category::Inter => &self.inter,
            Category::Mark => &self.marks,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Hard => &mut self.hard,
            Category::Soft => &mut self.soft,
            Category::Inline => &mut self.inlines,
            Category::Aside => &mut self.asides,
            Category::Inter => &mut self.inter,
            Category::Mark => &mut self.marks,
        }
    }

    /// Every classified ident with its category, in elaboration order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        Category::ALL.into_iter().flat_map(move |category| {
            self.idents(category)
                .iter()
                .map(move |ident| (category, ident.as_str()))
        })
    }

    /// Idents the loader starts from
    pub fn seeds(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(_, ident)| ident)
    }

    /// Check that no ident sits in two categories
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, Category> = HashMap::new();
        for (category, ident) in self.iter() {
            if let Some(previous) = seen.insert(ident, category) {
                return Err(Error::Config(format!(
                    "'{ident}' is classified as both {previous} and {category}"
                )));
            }
        }
        Ok(())
    }

    /// Load a classification from a JSON or YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let classification: Classification = read_structured(path)?;
        classification.validate()?;
        Ok(classification)
    }
}

/// Per-ident decoration passed through onto element records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxTables {
    pub icons: BTreeMap<String, String>,
    pub default_nodes: BTreeMap<String, Vec<String>>,
}

impl AuxTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_icon(mut self, ident: impl Into<String>, icon: impl Into<String>) -> Self {
        self.icons.insert(ident.into(), icon.into());
        self
    }

    pub fn with_default_nodes<I, T>(mut self, ident: impl Into<String>, nodes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.default_nodes
            .insert(ident.into(), nodes.into_iter().map(Into::into).collect());
        self
    }

    /// Read the icon table (`{ident: icon}`) from a JSON or YAML file
    pub fn load_icons(mut self, path: &Path) -> Result<Self> {
        self.icons = read_structured(path)?;
        Ok(self)
    }

    /// Read the default-child table (`{ident: [node, ...]}`) from a JSON or YAML file
    pub fn load_default_nodes(mut self, path: &Path) -> Result<Self> {
        self.default_nodes = read_structured(path)?;
        Ok(self)
    }

    pub fn icon(&self, ident: &str) -> Option<String> {
        self.icons.get(ident).cloned()
    }

    pub fn default_nodes(&self, ident: &str) -> Option<Vec<String>> {
        self.default_nodes.get(ident).cloned()
    }
}
