//! # tei-odd
//!
//! ODD specification model, loader, and content-model compiler.
//!
//! This crate reads TEI ODD spec files (class, element, macro and data specs),
//! resolves class-membership and macro dependencies into a flat [`SpecTable`],
//! and turns ODD content models into compact grammar expressions.

pub mod content;
pub mod inheritance;
pub mod loader;
pub mod model;
pub mod registry;
pub mod source;

pub use content::{Content, ContentNode, GroupSet, TEXT_PLACEHOLDER};
pub use loader::{LoaderConfig, SpecLoader, load};
pub use model::{
    AttrDef, AttrEntry, AttrRef, ClassKind, ClassSpec, DataSpec, ElementSpec, MacroSpec, Mode,
    Spec, Usage, ValItem, ValListType,
};
pub use registry::SpecTable;
pub use source::{DirSource, MemorySource, SpecSource};

use thiserror::Error;

/// Errors that can occur when loading ODD specifications
#[derive(Error, Debug)]
pub enum Error {
    #[error("Spec '{ident}' not found at {path}")]
    NotFound { ident: String, path: String },

    #[error("Malformed XML in spec '{ident}': {message}")]
    Xml { ident: String, message: String },

    #[error("Invalid spec format: {0}")]
    InvalidFormat(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a not-found error for an ident and the location that was tried.
    pub fn not_found(ident: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NotFound {
            ident: ident.into(),
            path: path.into(),
        }
    }

    /// Build a malformed-XML error for the spec file backing `ident`.
    pub fn xml(ident: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Xml {
            ident: ident.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
