//! Element elaboration
//!
//! Turns each classified element spec into one or more schema records,
//! splitting its content model into the structural, mark and inline views
//! the editor needs, then appends the synthetic records those views rely on.

use crate::classification::{AuxTables, Category, Classification};
use crate::groups::GroupIndex;
use crate::record::{ElementRecord, FcType, PmType};
use crate::synthetic::{dedupe_text_nodes, document_roots, global_wrappers};
use crate::{Error, Result};
use std::collections::HashSet;
use tei_odd::content::filter_by_groups;
use tei_odd::{ContentNode, ElementSpec, GroupSet, SpecTable};
use tracing::{debug, info};

/// Elaborates one classification against a loaded spec table
pub struct Elaborator<'a> {
    table: &'a SpecTable,
    aux: &'a AuxTables,
    classification: &'a Classification,
    index: GroupIndex,
}

impl<'a> Elaborator<'a> {
    pub fn new(
        classification: &'a Classification,
        table: &'a SpecTable,
        aux: &'a AuxTables,
    ) -> Result<Self> {
        let index = GroupIndex::build(classification, table)?;
        Ok(Self {
            table,
            aux,
            classification,
            index,
        })
    }

    pub fn index(&self) -> &GroupIndex {
        &self.index
    }

    /// Produce every record: roots, classified elements, text leaves, wrappers
    pub fn elaborate(&self) -> Result<Vec<ElementRecord>> {
        let mut records = document_roots();

        for (category, ident) in self.classification.iter() {
            let spec = self
                .table
                .element(ident)
                .ok_or_else(|| Error::missing_spec(ident, category.key()))?;
            let before = records.len();
            self.elaborate_one(category, spec, &mut records);
            debug!(
                "Elaborated {} '{}' into {} record(s)",
                category,
                ident,
                records.len() - before
            );
        }

        let leaves = dedupe_text_nodes(&mut records);
        info!("Generated {} text leaf record(s)", leaves.len());
        records.extend(leaves);
        records.extend(global_wrappers(&self.index));

        check_unique(&records)?;
        Ok(records)
    }

    fn elaborate_one(&self, category: Category, spec: &ElementSpec, out: &mut Vec<ElementRecord>) {
        let ident = spec.ident.as_str();
        let ast = spec.content.model();
        let desc = spec.summary().map(str::to_string);
        let group = self.index.group_string(ident, "");

        match category {
            Category::Hard => out.push(
                ElementRecord::new(ident, PmType::Node, FcType::Hard)
                    .content(self.structural(ast))
                    .all_content(self.all_content(ast))
                    .group(group)
                    .desc(desc)
                    .default_nodes(self.aux.default_nodes(ident))
                    .source(ident),
            ),
            Category::Soft => out.push(
                ElementRecord::new(ident, PmType::Node, FcType::Soft)
                    .content(self.structural(ast))
                    .mark_content(self.mark_content(ast))
                    .inline_content(self.inline_content(ast))
                    .all_content(self.all_content(ast))
                    .group(group)
                    .desc(desc)
                    .default_nodes(self.aux.default_nodes(ident))
                    .source(ident),
            ),
            Category::Inter => {
                out.push(
                    ElementRecord::synthetic(format!("mark{ident}"), PmType::Mark, FcType::Inters)
                        .all_content(self.all_content(ast))
                        .group(group.clone())
                        .desc(desc.clone())
                        .source(ident),
                );
                out.push(
                    ElementRecord::new(ident, PmType::Node, FcType::Inters)
                        .content(self.structural(ast))
                        .mark_content(self.mark_content(ast))
                        .inline_content(self.inline_content(ast))
                        .all_content(self.all_content(ast))
                        .group(group)
                        .desc(desc)
                        .default_nodes(self.aux.default_nodes(ident))
                        .source(ident),
                );
            }
            Category::Aside => {
                let container = format!("{ident}X");
                out.push(
                    ElementRecord::new(ident, PmType::InlineNode, FcType::Asides)
                        .all_content(self.all_content(ast))
                        .group(self.index.group_string(ident, "_i"))
                        .desc(desc)
                        .icon(self.aux.icon(ident))
                        .inline_atom()
                        .source(ident),
                );
                out.push(
                    ElementRecord::synthetic(container.clone(), PmType::Node, FcType::Asides)
                        .content(self.structural(ast))
                        .mark_content(self.mark_content(ast))
                        .isolating(),
                );
                out.push(
                    ElementRecord::synthetic(format!("{ident}Doc"), PmType::Node, FcType::DocNodes)
                        .content(Some(container))
                        .isolating(),
                );
            }
            Category::Inline => out.push(
                ElementRecord::new(ident, PmType::InlineNode, FcType::Inlines)
                    .all_content(self.all_content(ast))
                    .group(self.index.group_string(ident, "_i"))
                    .desc(desc)
                    .icon(self.aux.icon(ident))
                    .inline_atom()
                    .source(ident),
            ),
            Category::Mark => out.push(
                ElementRecord::new(ident, PmType::Mark, FcType::Marks)
                    .all_content(self.all_content(ast))
                    .group(group)
                    .desc(desc)
                    .icon(self.aux.icon(ident))
                    .source(ident),
            ),
        }
    }

    /// Everything the schema knows about, for reporting
    fn all_content(&self, ast: Option<&ContentNode>) -> Option<String> {
        filtered(ast, &self.index.all_refs).map(|node| node.encode())
    }

    /// Block children and text, inline refs redirected to their `_g` wrappers
    fn structural(&self, ast: Option<&ContentNode>) -> Option<String> {
        filtered(ast, &self.index.structural_refs).map(|node| {
            node.rename(&|leaf| {
                if self.index.is_inline_only(leaf) {
                    format!("{leaf}_g")
                } else {
                    leaf.to_string()
                }
            })
            .encode()
        })
    }

    /// Flat, de-duplicated list of allowed marks
    fn mark_content(&self, ast: Option<&ContentNode>) -> Option<String> {
        let node = filtered(ast, &self.index.mark_refs)?;
        let mut seen = HashSet::new();
        let marks: Vec<String> = node
            .leaves()
            .into_iter()
            .map(|leaf| {
                if self.index.inter_idents.contains(leaf) {
                    format!("mark{leaf}")
                } else {
                    leaf.to_string()
                }
            })
            .filter(|mark| seen.insert(mark.clone()))
            .collect();
        Some(marks.join(" "))
    }

    /// Inline and aside refs, groups renamed into the `_i` namespace
    fn inline_content(&self, ast: Option<&ContentNode>) -> Option<String> {
        filtered(ast, &self.index.inline_refs).map(|node| {
            node.rename(&|leaf| {
                if self.index.is_inline_group(leaf) {
                    format!("{leaf}_i")
                } else {
                    leaf.to_string()
                }
            })
            .encode()
        })
    }
}

fn filtered(ast: Option<&ContentNode>, targets: &GroupSet) -> Option<ContentNode> {
    ast.and_then(|node| filter_by_groups(node, targets, false))
}

fn check_unique(records: &[ElementRecord]) -> Result<()> {
    let mut names = HashSet::new();
    for record in records {
        if !names.insert(record.name.as_str()) {
            return Err(Error::DuplicateName(record.name.clone()));
        }
    }
    Ok(())
}

/// Elaborate `classification` into schema records
pub fn elaborate(
    classification: &Classification,
    table: &SpecTable,
    aux: &AuxTables,
) -> Result<Vec<ElementRecord>> {
    Elaborator::new(classification, table, aux)?.elaborate()
}
