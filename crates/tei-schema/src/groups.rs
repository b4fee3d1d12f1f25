//! Content-group membership of classified elements

use crate::classification::{Category, Classification};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use tei_odd::{ClassKind, GroupSet, SpecTable, TEXT_PLACEHOLDER};

/// Group names per element plus the reference sets content filters keep.
///
/// A "ref" is anything a content model may name: an element ident or one
/// of the model classes it belongs to.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    groups: HashMap<String, Vec<String>>,
    /// Refs that produce block nodes (hard, soft, inter)
    pub node_refs: GroupSet,
    /// Refs that produce inline nodes (inlines, asides)
    pub inline_refs: GroupSet,
    /// Refs that produce marks (marks, inter)
    pub mark_refs: GroupSet,
    /// Every ref plus the text placeholder
    pub all_refs: GroupSet,
    /// Refs kept in structural content
    pub structural_refs: GroupSet,
    /// Content groups of inline and aside elements, first-seen order
    pub inline_groups: Vec<String>,
    /// Inline and aside idents, classification order
    pub inline_idents: Vec<String>,
    /// Inter idents, whose mark form is named `mark<ident>`
    pub inter_idents: GroupSet,
}

impl GroupIndex {
    pub fn build(classification: &Classification, table: &SpecTable) -> Result<Self> {
        let mut index = GroupIndex::default();

        for (category, ident) in classification.iter() {
            let spec = table
                .element(ident)
                .ok_or_else(|| Error::missing_spec(ident, category.key()))?;
            let groups = model_groups(table, ident, &spec.memberships)?;

            let refs = std::iter::once(ident.to_string()).chain(groups.iter().cloned());
            match category {
                Category::Hard | Category::Soft => index.node_refs.extend(refs),
                Category::Inter => {
                    let refs: Vec<String> = refs.collect();
                    index.node_refs.extend(refs.iter().cloned());
                    index.mark_refs.extend(refs);
                    index.inter_idents.insert(ident.to_string());
                }
                Category::Inline | Category::Aside => {
                    index.inline_refs.extend(refs);
                    for group in &groups {
                        if !index.inline_groups.contains(group) {
                            index.inline_groups.push(group.clone());
                        }
                    }
                    index.inline_idents.push(ident.to_string());
                }
                Category::Mark => index.mark_refs.extend(refs),
            }

            index.groups.insert(ident.to_string(), groups);
        }

        index.all_refs = index
            .node_refs
            .iter()
            .chain(&index.inline_refs)
            .chain(&index.mark_refs)
            .cloned()
            .chain(std::iter::once(TEXT_PLACEHOLDER.to_string()))
            .collect();
        index.structural_refs = index
            .node_refs
            .iter()
            .chain(&index.inline_refs)
            .cloned()
            .chain(std::iter::once(TEXT_PLACEHOLDER.to_string()))
            .collect();

        Ok(index)
    }

    /// Model classes `ident` belongs to, directly or through other classes
    pub fn groups_of(&self, ident: &str) -> &[String] {
        self.groups.get(ident).map(Vec::as_slice).unwrap_or_default()
    }

    /// Space-joined groups, `None` when there are none
    pub fn group_string(&self, ident: &str, suffix: &str) -> Option<String> {
        let groups = self.groups_of(ident);
        (!groups.is_empty()).then(|| {
            groups
                .iter()
                .map(|g| format!("{g}{suffix}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    /// Inline ref that no block node answers to
    pub fn is_inline_only(&self, name: &str) -> bool {
        self.inline_refs.contains(name) && !self.node_refs.contains(name)
    }

    pub fn is_inline_group(&self, name: &str) -> bool {
        self.inline_groups.iter().any(|g| g == name)
    }
}

/// Depth-first closure of memberships, keeping model classes only
fn model_groups(table: &SpecTable, ident: &str, memberships: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    walk_memberships(table, ident, memberships, &mut visited, &mut out)?;
    Ok(out)
}

fn walk_memberships(
    table: &SpecTable,
    referrer: &str,
    memberships: &[String],
    visited: &mut HashSet<String>,
    out: &mut Vec<String>,
) -> Result<()> {
    for membership in memberships {
        if !visited.insert(membership.clone()) {
            continue;
        }
        let class = table
            .class(membership)
            .ok_or_else(|| Error::lookup(membership, referrer))?;
        if class.kind == ClassKind::Model {
            out.push(membership.clone());
        }
        walk_memberships(table, membership, &class.memberships, visited, out)?;
    }
    Ok(())
}
