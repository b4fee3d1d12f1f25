//! Where spec files come from

use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Supplies the raw XML backing a spec ident
pub trait SpecSource {
    fn read(&self, ident: &str) -> Result<String>;
}

/// Reads `<root>/<ident>.<extension>`
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    extension: String,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "xml".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `ident`
    pub fn path_for(&self, ident: &str) -> PathBuf {
        self.root.join(format!("{ident}.{}", self.extension))
    }
}

impl SpecSource for DirSource {
    fn read(&self, ident: &str) -> Result<String> {
        let path = self.path_for(ident);
        trace!("Reading spec file: {:?}", path);
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(ident, path.display().to_string()),
            _ => Error::Io(e),
        })
    }
}

/// In-memory spec files keyed by ident. Counts reads per ident.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
    reads: RefCell<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, ident: impl Into<String>, xml: impl Into<String>) -> Self {
        self.insert(ident, xml);
        self
    }

    pub fn insert(&mut self, ident: impl Into<String>, xml: impl Into<String>) {
        self.files.insert(ident.into(), xml.into());
    }

    /// How many times `ident` has been read
    pub fn read_count(&self, ident: &str) -> usize {
        self.reads.borrow().get(ident).copied().unwrap_or(0)
    }
}

impl SpecSource for MemorySource {
    fn read(&self, ident: &str) -> Result<String> {
        *self.reads.borrow_mut().entry(ident.to_string()).or_insert(0) += 1;
        self.files
            .get(ident)
            .cloned()
            .ok_or_else(|| Error::not_found(ident, "<memory>"))
    }
}

impl<S: SpecSource + ?Sized> SpecSource for &S {
    fn read(&self, ident: &str) -> Result<String> {
        (**self).read(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
    }

    #[test]
    fn test_dir_source_reads_file() {
        let source = DirSource::new(data_dir());
        let xml = source.read("att.global").unwrap();
        assert!(xml.contains("classSpec"));
    }

    #[test]
    fn test_dir_source_missing_file() {
        let source = DirSource::new(data_dir());
        match source.read("nonexistent").unwrap_err() {
            Error::NotFound { ident, path } => {
                assert_eq!(ident, "nonexistent");
                assert!(path.ends_with("nonexistent.xml"));
            }
            e => panic!("Expected NotFound error, got {:?}", e),
        }
    }

    #[test]
    fn test_memory_source_counts_reads() {
        let source = MemorySource::new().with_file("p", "<elementSpec ident=\"p\"/>");
        assert_eq!(source.read_count("p"), 0);
        source.read("p").unwrap();
        source.read("p").unwrap();
        assert_eq!(source.read_count("p"), 2);
        assert!(source.read("q").is_err());
        assert_eq!(source.read_count("q"), 1);
    }
}
