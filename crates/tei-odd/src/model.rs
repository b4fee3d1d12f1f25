//! ODD spec model definitions

use crate::content::Content;
use crate::{Error, Result};
use serde::Serialize;
use std::str::FromStr;

/// One spec record, keyed by its ident in a [`crate::SpecTable`]
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Class(ClassSpec),
    Element(ElementSpec),
    Macro(MacroSpec),
    Data(DataSpec),
}

/// Whether a class bundles content-model membership or attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Model,
    Atts,
}

/// An inheritable bundle of attributes and group memberships
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSpec {
    pub ident: String,
    pub kind: ClassKind,
    pub module: Option<String>,
    pub memberships: Vec<String>,
    pub description: Option<String>,
    pub attrs: Vec<AttrEntry>,
}

/// Definition of a TEI element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub ident: String,
    pub module: Option<String>,
    pub memberships: Vec<String>,
    pub description: Option<String>,
    pub gloss: Option<String>,
    pub attrs: Vec<AttrEntry>,
    pub content: Content,
}

/// A named, reusable content model
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSpec {
    pub ident: String,
    pub content: Content,
}

/// Primitive datatype placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct DataSpec {
    pub ident: String,
}

/// An entry of an `attList`
#[derive(Debug, Clone, PartialEq)]
pub enum AttrEntry {
    Def(AttrDef),
    Ref(AttrRef),
}

/// Pointer to an attribute defined on another class. Never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRef {
    pub att_class: Option<String>,
    pub name: Option<String>,
}

/// Attribute definition.
///
/// Every field apart from `ident` is optional so that a `mode="change"`
/// redefinition can be overlaid onto an inherited one field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttrDef {
    pub ident: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_occurs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_occurs: Option<String>,
    pub val_list: Option<Vec<ValItem>>,
    pub val_list_type: Option<ValListType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

/// One enumerated value of a `valList`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValItem {
    pub ident: String,
    pub desc: Option<String>,
}

/// Whether values outside a `valList` are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValListType {
    #[default]
    Open,
    Closed,
    Semi,
}

/// Attribute usage as declared in ODD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    Req,
    Rec,
    Opt,
    Mwa,
    Rwa,
}

/// How a definition relates to a same-ident definition inherited earlier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Add,
    Change,
    Delete,
    Replace,
}

impl Spec {
    pub fn ident(&self) -> &str {
        match self {
            Spec::Class(c) => &c.ident,
            Spec::Element(e) => &e.ident,
            Spec::Macro(m) => &m.ident,
            Spec::Data(d) => &d.ident,
        }
    }

    /// Classes this spec is a direct member of
    pub fn memberships(&self) -> &[String] {
        match self {
            Spec::Class(c) => &c.memberships,
            Spec::Element(e) => &e.memberships,
            Spec::Macro(_) | Spec::Data(_) => &[],
        }
    }

    /// Directly declared attribute entries
    pub fn attrs(&self) -> &[AttrEntry] {
        match self {
            Spec::Class(c) => &c.attrs,
            Spec::Element(e) => &e.attrs,
            Spec::Macro(_) | Spec::Data(_) => &[],
        }
    }

    pub fn content(&self) -> Option<&Content> {
        match self {
            Spec::Element(e) => Some(&e.content),
            Spec::Macro(m) => Some(&m.content),
            Spec::Class(_) | Spec::Data(_) => None,
        }
    }

    pub(crate) fn content_mut(&mut self) -> Option<&mut Content> {
        match self {
            Spec::Element(e) => Some(&mut e.content),
            Spec::Macro(m) => Some(&mut m.content),
            Spec::Class(_) | Spec::Data(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Spec::Class(_) => "classSpec",
            Spec::Element(_) => "elementSpec",
            Spec::Macro(_) => "macroSpec",
            Spec::Data(_) => "dataSpec",
        }
    }
}

impl ClassKind {
    /// Kind from the ODD `type` attribute, falling back to the ident prefix
    pub fn from_type(class_type: Option<&str>, ident: &str) -> Result<Self> {
        match class_type {
            Some("model") => Ok(ClassKind::Model),
            Some("atts") => Ok(ClassKind::Atts),
            Some(other) => Err(Error::InvalidFormat(format!(
                "Unknown classSpec type '{other}' on '{ident}'"
            ))),
            None if ident.starts_with("att.") => Ok(ClassKind::Atts),
            None => Ok(ClassKind::Model),
        }
    }
}

impl ElementSpec {
    /// Description, falling back to the gloss
    pub fn summary(&self) -> Option<&str> {
        self.description.as_deref().or(self.gloss.as_deref())
    }
}

impl AttrDef {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode.unwrap_or_default()
    }

    pub fn is_required(&self) -> bool {
        self.usage == Some(Usage::Req)
    }

    /// Copy of `self` with every non-null field of `other` laid over it
    pub fn overlay(&self, other: &AttrDef) -> AttrDef {
        AttrDef {
            ident: self.ident.clone(),
            description: other.description.clone().or_else(|| self.description.clone()),
            data_type: other.data_type.clone().or_else(|| self.data_type.clone()),
            min_occurs: other.min_occurs.clone().or_else(|| self.min_occurs.clone()),
            max_occurs: other.max_occurs.clone().or_else(|| self.max_occurs.clone()),
            val_list: other.val_list.clone().or_else(|| self.val_list.clone()),
            val_list_type: other.val_list_type.or(self.val_list_type),
            usage: other.usage.or(self.usage),
            mode: other.mode.or(self.mode),
            hidden: self.hidden,
        }
    }
}

impl FromStr for Usage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "req" => Ok(Usage::Req),
            "rec" => Ok(Usage::Rec),
            "opt" => Ok(Usage::Opt),
            "mwa" => Ok(Usage::Mwa),
            "rwa" => Ok(Usage::Rwa),
            other => Err(Error::InvalidFormat(format!("Unknown attribute usage '{other}'"))),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(Mode::Add),
            "change" => Ok(Mode::Change),
            "delete" => Ok(Mode::Delete),
            "replace" => Ok(Mode::Replace),
            other => Err(Error::InvalidFormat(format!("Unknown attribute mode '{other}'"))),
        }
    }
}

impl FromStr for ValListType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(ValListType::Open),
            "closed" => Ok(ValListType::Closed),
            "semi" => Ok(ValListType::Semi),
            other => Err(Error::InvalidFormat(format!("Unknown valList type '{other}'"))),
        }
    }
}
