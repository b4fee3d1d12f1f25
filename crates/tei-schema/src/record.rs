//! Schema element records

use serde::Serialize;

/// Kind of editor type a record becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PmType {
    Node,
    Mark,
    InlineNode,
}

/// Category tag of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FcType {
    Hard,
    Soft,
    Inlines,
    Asides,
    Inters,
    Marks,
    TextNodes,
    GlobalNodes,
    DocNodes,
}

/// One node or mark type of the editor schema.
///
/// Content fields hold grammar expressions over group and element names.
/// `valid_attrs`/`required_attrs` stay empty until attribute resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub name: String,
    pub pm_type: PmType,
    pub fc_type: FcType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_nodes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "is_false")]
    pub atom: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub inline: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub isolating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    pub valid_attrs: Vec<String>,
    pub required_attrs: Vec<String>,
    pub synth: bool,
    /// Spec the record was elaborated from, used for attribute resolution
    #[serde(skip)]
    pub source: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ElementRecord {
    pub fn new(name: impl Into<String>, pm_type: PmType, fc_type: FcType) -> Self {
        Self {
            name: name.into(),
            pm_type,
            fc_type,
            content: None,
            mark_content: None,
            inline_content: None,
            all_content: None,
            group: None,
            desc: None,
            icon: None,
            default_nodes: None,
            atom: false,
            inline: false,
            isolating: false,
            selectable: None,
            valid_attrs: Vec::new(),
            required_attrs: Vec::new(),
            synth: false,
            source: None,
        }
    }

    /// Synthetic record with no spec behind it
    pub fn synthetic(name: impl Into<String>, pm_type: PmType, fc_type: FcType) -> Self {
        Self {
            synth: true,
            ..Self::new(name, pm_type, fc_type)
        }
    }

    pub fn content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    pub fn mark_content(mut self, mark_content: Option<String>) -> Self {
        self.mark_content = mark_content;
        self
    }

    pub fn inline_content(mut self, inline_content: Option<String>) -> Self {
        self.inline_content = inline_content;
        self
    }

    pub fn all_content(mut self, all_content: Option<String>) -> Self {
        self.all_content = all_content;
        self
    }

    pub fn group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn desc(mut self, desc: Option<String>) -> Self {
        self.desc = desc;
        self
    }

    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    pub fn default_nodes(mut self, nodes: Option<Vec<String>>) -> Self {
        self.default_nodes = nodes;
        self
    }

    pub fn source(mut self, ident: impl Into<String>) -> Self {
        self.source = Some(ident.into());
        self
    }

    /// Inline leaf edited as a unit
    pub fn inline_atom(mut self) -> Self {
        self.atom = true;
        self.inline = true;
        self
    }

    pub fn isolating(mut self) -> Self {
        self.isolating = true;
        self
    }

    pub fn unselectable_atom(mut self) -> Self {
        self.atom = true;
        self.selectable = Some(false);
        self
    }

    /// Content-group names this record carries
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.group.as_deref().unwrap_or_default().split_whitespace()
    }
}
