//! Attribute resolution
//!
//! Walks each record's class ancestry in declaration order and folds the
//! attribute definitions it meets into a shared dictionary. Per-element
//! redefinitions (`mode="change"`/`"replace"`) are stored under
//! `<ident>-<element>` so the global definition stays untouched for others.
//! A redefinition needs an earlier definition of the same ident within that
//! element's own ancestry.

use crate::record::ElementRecord;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use tei_odd::{AttrDef, AttrEntry, Mode, Spec, SpecTable};
use tracing::{debug, info, trace};

/// Identity attributes hidden from editing by default
pub const DEFAULT_HIDDEN_ATTRS: &[&str] = &["xml:id", "n"];

/// Attribute definitions keyed by bare ident or `<ident>-<element>`
pub type AttrDict = BTreeMap<String, AttrDef>;

/// Resolves legal and required attributes for elaborated records
pub struct AttributeResolver<'a> {
    table: &'a SpecTable,
    hidden: Vec<String>,
    dict: AttrDict,
}

/// Attribute lists of one record while it is being resolved
#[derive(Default)]
struct AttrLists {
    valid: Vec<String>,
    required: Vec<String>,
}

impl AttrLists {
    fn add(&mut self, key: &str, required: bool) {
        self.valid.push(key.to_string());
        if required {
            self.required.push(key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        self.valid.retain(|k| k != key);
        self.required.retain(|k| k != key);
    }

    fn finish(mut self) -> (Vec<String>, Vec<String>) {
        for list in [&mut self.valid, &mut self.required] {
            list.sort();
            list.dedup();
        }
        (self.valid, self.required)
    }
}

impl<'a> AttributeResolver<'a> {
    pub fn new(table: &'a SpecTable) -> Self {
        Self {
            table,
            hidden: DEFAULT_HIDDEN_ATTRS.iter().map(|s| s.to_string()).collect(),
            dict: AttrDict::new(),
        }
    }

    /// Replace the attributes flagged hidden once resolution is done
    pub fn with_hidden<I, T>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.hidden = attrs.into_iter().map(Into::into).collect();
        self
    }

    /// Fill `validAttrs`/`requiredAttrs` on every record with a source spec
    /// and return the attribute dictionary.
    pub fn resolve(mut self, records: &mut [ElementRecord]) -> Result<AttrDict> {
        for record in records.iter_mut() {
            let Some(source) = record.source.clone() else {
                continue;
            };
            let (valid, required) = self.resolve_record(&record.name, &source)?;
            debug!(
                "Resolved {} valid and {} required attribute(s) for '{}'",
                valid.len(),
                required.len(),
                record.name
            );
            record.valid_attrs = valid;
            record.required_attrs = required;
        }

        for ident in &self.hidden {
            if let Some(def) = self.dict.get_mut(ident) {
                def.hidden = true;
            }
        }

        info!("Attribute dictionary holds {} definition(s)", self.dict.len());
        Ok(self.dict)
    }

    fn resolve_record(&mut self, name: &str, source: &str) -> Result<(Vec<String>, Vec<String>)> {
        let spec = self
            .table
            .get(source)
            .ok_or_else(|| Error::lookup(source, name))?;

        let mut defs = Vec::new();
        let mut path = Vec::new();
        self.collect(spec, &mut path, &mut defs)?;

        let mut seen = HashSet::new();
        let mut lists = AttrLists::default();
        for def in defs {
            self.apply(name, def, &mut seen, &mut lists)?;
        }
        Ok(lists.finish())
    }

    /// Depth-first: every membership's attributes, then the spec's own
    fn collect(
        &self,
        spec: &'a Spec,
        path: &mut Vec<String>,
        out: &mut Vec<&'a AttrDef>,
    ) -> Result<()> {
        path.push(spec.ident().to_string());

        for membership in spec.memberships() {
            if path.contains(membership) {
                return Err(Error::CircularMembership(format!(
                    "{} -> {}",
                    path.join(" -> "),
                    membership
                )));
            }
            let class = self
                .table
                .get(membership)
                .ok_or_else(|| Error::lookup(membership, spec.ident()))?;
            self.collect(class, path, out)?;
        }

        for entry in spec.attrs() {
            match entry {
                AttrEntry::Def(def) => out.push(def),
                AttrEntry::Ref(r) => trace!("Ignoring attRef {:?} on '{}'", r, spec.ident()),
            }
        }

        path.pop();
        Ok(())
    }

    /// `seen` holds the idents already met while resolving `element`
    fn apply(
        &mut self,
        element: &str,
        def: &AttrDef,
        seen: &mut HashSet<String>,
        lists: &mut AttrLists,
    ) -> Result<()> {
        let ident = def.ident.as_str();
        let compound = format!("{ident}-{element}");

        if seen.insert(ident.to_string()) {
            if matches!(def.mode(), Mode::Change | Mode::Replace) {
                return Err(Error::change_without_base(ident, element));
            }
            if !self.dict.contains_key(ident) {
                self.dict.insert(ident.to_string(), def.clone());
            }
            lists.add(ident, def.is_required());
            return Ok(());
        }

        match def.mode() {
            Mode::Change => {
                let base = self
                    .dict
                    .get(ident)
                    .ok_or_else(|| Error::change_without_base(ident, element))?;
                let merged = base.overlay(def);
                let required = merged.is_required() || base.is_required();
                lists.remove(ident);
                lists.add(&compound, required);
                debug!("Overriding '{}' on '{}'", ident, element);
                self.dict.insert(compound, merged);
            }
            Mode::Replace => {
                lists.remove(ident);
                lists.add(&compound, def.is_required());
                debug!("Replacing '{}' on '{}'", ident, element);
                self.dict.insert(compound, def.clone());
            }
            Mode::Delete => {
                lists.remove(ident);
                lists.remove(&compound);
            }
            Mode::Add => lists.add(ident, def.is_required()),
        }
        Ok(())
    }
}
