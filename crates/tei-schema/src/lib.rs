//! # tei-schema
//!
//! Compiles a resolved ODD spec table into an editor schema description.
//!
//! The pipeline elaborates classified TEI elements into node and mark
//! records (adding synthetic text leaves, wrappers and document roots) and
//! then resolves which attributes are legal and required on each record.

pub mod attributes;
pub mod classification;
pub mod config;
pub mod elaborate;
pub mod groups;
pub mod record;
pub mod schema;
pub mod synthetic;

pub use attributes::{AttrDict, AttributeResolver, DEFAULT_HIDDEN_ATTRS};
pub use classification::{AuxTables, Category, Classification};
pub use config::CompilerConfig;
pub use elaborate::{Elaborator, elaborate};
pub use groups::GroupIndex;
pub use record::{ElementRecord, FcType, PmType};
pub use schema::{SchemaCompiler, SchemaDescription};

use thiserror::Error;

/// Errors that can occur while compiling a schema
#[derive(Error, Debug)]
pub enum Error {
    #[error("No element spec for '{ident}' classified as {category}")]
    MissingSpec { ident: String, category: String },

    #[error("Spec '{ident}' referenced by '{referrer}' is not loaded")]
    Lookup { ident: String, referrer: String },

    #[error(
        "Attribute '{attr}' on element '{element}' changes a definition that was never added"
    )]
    ChangeWithoutBase { attr: String, element: String },

    #[error("Circular class membership: {0}")]
    CircularMembership(String),

    #[error("Duplicate schema element name: {0}")]
    DuplicateName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid format in {path}: {message}")]
    InvalidFormat { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Spec(#[from] tei_odd::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn missing_spec(ident: impl Into<String>, category: impl Into<String>) -> Self {
        Self::MissingSpec {
            ident: ident.into(),
            category: category.into(),
        }
    }

    pub fn lookup(ident: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::Lookup {
            ident: ident.into(),
            referrer: referrer.into(),
        }
    }

    pub fn change_without_base(attr: impl Into<String>, element: impl Into<String>) -> Self {
        Self::ChangeWithoutBase {
            attr: attr.into(),
            element: element.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
