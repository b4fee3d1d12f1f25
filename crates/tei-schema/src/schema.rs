//! Schema description and the compilation pipeline

use crate::attributes::{AttrDict, AttributeResolver};
use crate::classification::{AuxTables, Classification};
use crate::config::CompilerConfig;
use crate::elaborate::Elaborator;
use crate::record::ElementRecord;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tei_odd::{DirSource, Spec, SpecLoader, SpecSource, SpecTable};
use tracing::info;

/// Everything an editor needs to build its schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescription {
    pub elements: Vec<ElementRecord>,
    pub attrs: AttrDict,
    /// Content-group name to the records carrying it
    pub element_groups: BTreeMap<String, Vec<String>>,
    /// ODD module to the element idents it defines
    pub modules: BTreeMap<String, Vec<String>>,
}

impl SchemaDescription {
    pub fn new(elements: Vec<ElementRecord>, attrs: AttrDict, table: &SpecTable) -> Self {
        let mut element_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in &elements {
            for group in record.groups() {
                element_groups
                    .entry(group.to_string())
                    .or_default()
                    .push(record.name.clone());
            }
        }

        let mut modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for spec in table.iter() {
            let Spec::Element(element) = spec else {
                continue;
            };
            if let Some(module) = &element.module {
                modules
                    .entry(module.clone())
                    .or_default()
                    .push(element.ident.clone());
            }
        }

        Self {
            elements,
            attrs,
            element_groups,
            modules,
        }
    }

    pub fn element(&self, name: &str) -> Option<&ElementRecord> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Runs load, elaboration and attribute resolution
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    config: CompilerConfig,
}

impl SchemaCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile from a directory of `<ident>.xml` spec files
    pub fn compile(
        &self,
        spec_dir: impl AsRef<Path>,
        classification: &Classification,
        aux: &AuxTables,
    ) -> Result<SchemaDescription> {
        info!("Compiling schema from {:?}", spec_dir.as_ref());
        self.compile_from(DirSource::new(spec_dir.as_ref()), classification, aux)
    }

    /// Compile reading specs through any source
    pub fn compile_from<S: SpecSource>(
        &self,
        source: S,
        classification: &Classification,
        aux: &AuxTables,
    ) -> Result<SchemaDescription> {
        classification.validate()?;

        let mut loader = SpecLoader::new(source).with_config(self.config.loader.clone());
        loader.load_all(classification.seeds())?;
        let table = loader.finish()?;

        self.compile_table(&table, classification, aux)
    }

    /// Compile from an already loaded table
    pub fn compile_table(
        &self,
        table: &SpecTable,
        classification: &Classification,
        aux: &AuxTables,
    ) -> Result<SchemaDescription> {
        let mut elements = Elaborator::new(classification, table, aux)?.elaborate()?;
        info!("Elaborated {} element records", elements.len());

        let attrs = AttributeResolver::new(table)
            .with_hidden(self.config.hidden_attrs.iter().cloned())
            .resolve(&mut elements)?;

        Ok(SchemaDescription::new(elements, attrs, table))
    }
}
