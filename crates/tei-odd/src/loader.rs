//! Spec loader with class-membership and macro resolution

use crate::content::{self, Content, ContentNode};
use crate::inheritance::InheritanceGraph;
use crate::model::{
    AttrDef, AttrEntry, AttrRef, ClassKind, ClassSpec, DataSpec, ElementSpec, MacroSpec, Mode,
    Spec, Usage, ValItem, ValListType,
};
use crate::registry::SpecTable;
use crate::source::{DirSource, SpecSource};
use crate::{Error, Result};
use roxmltree::{Document, Node};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, trace, warn};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const SPEC_ELEMENTS: [&str; 4] = ["classSpec", "elementSpec", "macroSpec", "dataSpec"];

/// Loader options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Preferred `xml:lang` for `desc` and `gloss` text
    pub language: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// A spec parsed from a file, with the macros its content mentions
struct ParsedSpec {
    spec: Spec,
    macro_refs: Vec<String>,
}

/// Loads specs by ident, pulling in every class and macro they depend on
pub struct SpecLoader<S> {
    source: S,
    config: LoaderConfig,
    table: SpecTable,
    read: HashSet<String>,
    graph: InheritanceGraph,
    macro_refs: BTreeMap<String, Vec<String>>,
}

impl<S: SpecSource> SpecLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: LoaderConfig::default(),
            table: SpecTable::new(),
            read: HashSet::new(),
            graph: InheritanceGraph::new(),
            macro_refs: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Load every seed ident and its dependencies
    pub fn load_all<I, T>(&mut self, idents: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for ident in idents {
            self.load(ident.as_ref())?;
        }
        Ok(())
    }

    /// Load one ident and, recursively, its memberships and macros.
    ///
    /// An ident already in the table, or whose file was already read, is
    /// not read again.
    pub fn load(&mut self, ident: &str) -> Result<()> {
        if self.table.contains(ident) || self.read.contains(ident) {
            debug!("Cache hit for spec: {}", ident);
            return Ok(());
        }
        self.read.insert(ident.to_string());

        let xml = self.source.read(ident)?;
        let parsed = parse_spec_file(ident, &xml, &self.config)?;

        if !parsed.iter().any(|p| p.spec.ident() == ident) {
            warn!("Spec file for '{}' does not define '{}'", ident, ident);
        }

        let mut registered = Vec::new();
        for ParsedSpec { spec, macro_refs } in parsed {
            let spec_ident = spec.ident().to_string();
            trace!("Registering {} '{}'", spec.kind_name(), spec_ident);
            if !self.table.register(spec) {
                warn!(
                    "Ignoring duplicate definition of '{}' in spec file for '{}'",
                    spec_ident, ident
                );
                continue;
            }
            if !macro_refs.is_empty() {
                self.macro_refs.insert(spec_ident.clone(), macro_refs);
            }
            registered.push(spec_ident);
        }

        for spec_ident in registered {
            let memberships = self
                .table
                .get(&spec_ident)
                .map(|s| s.memberships().to_vec())
                .unwrap_or_default();

            for class in memberships {
                if self.graph.would_create_cycle(&spec_ident, &class) {
                    return Err(Error::CircularDependency(format!(
                        "{spec_ident} is a member of {class}, which already reaches {spec_ident}"
                    )));
                }
                self.graph.add_edge(&spec_ident, &class);
                self.load(&class)?;
            }

            let macros = self.macro_refs.get(&spec_ident).cloned().unwrap_or_default();
            for macro_ident in macros {
                self.load(&macro_ident)?;
            }
        }

        Ok(())
    }

    /// Specs loaded so far, macros not yet substituted
    pub fn table(&self) -> &SpecTable {
        &self.table
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Substitute macro references and return the resolved table
    pub fn finish(self) -> Result<SpecTable> {
        let resolved = resolve_macros(&self.table)?;
        info!("Loaded {} specs", resolved.len());
        Ok(resolved)
    }
}

/// Load `seeds` from `<spec_dir>/<ident>.xml` and resolve their dependencies
pub fn load<I, T>(spec_dir: impl AsRef<Path>, seeds: I) -> Result<SpecTable>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut loader = SpecLoader::new(DirSource::new(spec_dir.as_ref()));
    loader.load_all(seeds)?;
    loader.finish()
}

/// Replace every macro reference with the macro's own resolved content
fn resolve_macros(table: &SpecTable) -> Result<SpecTable> {
    let mut cache = HashMap::new();
    let mut out = table.clone();

    for spec in table.iter() {
        let Some(content) = spec.content() else {
            continue;
        };
        let resolved = resolve_content(table, content, &mut cache, &mut Vec::new())?;
        if let Some(slot) = out.get_mut(spec.ident()).and_then(Spec::content_mut) {
            *slot = resolved;
        }
    }

    Ok(out)
}

fn resolve_content(
    table: &SpecTable,
    content: &Content,
    cache: &mut HashMap<String, Content>,
    stack: &mut Vec<String>,
) -> Result<Content> {
    match content {
        Content::Empty => Ok(Content::Empty),
        Content::Macro(ident) => resolve_macro(table, ident, cache, stack),
        Content::Model(node) => Ok(match expand(table, node, cache, stack)? {
            Some(node) => Content::Model(node),
            None => Content::Empty,
        }),
    }
}

fn resolve_macro(
    table: &SpecTable,
    ident: &str,
    cache: &mut HashMap<String, Content>,
    stack: &mut Vec<String>,
) -> Result<Content> {
    if let Some(content) = cache.get(ident) {
        return Ok(content.clone());
    }
    if stack.iter().any(|s| s == ident) {
        return Err(Error::CircularDependency(format!(
            "{} -> {}",
            stack.join(" -> "),
            ident
        )));
    }
    let spec = table
        .macro_spec(ident)
        .ok_or_else(|| Error::not_found(ident, "spec table"))?;

    stack.push(ident.to_string());
    let resolved = resolve_content(table, &spec.content, cache, stack)?;
    stack.pop();

    trace!("Resolved macro '{}' to '{}'", ident, resolved.encode());
    cache.insert(ident.to_string(), resolved.clone());
    Ok(resolved)
}

/// Splice macro content into group leaves that name a macro
fn expand(
    table: &SpecTable,
    node: &ContentNode,
    cache: &mut HashMap<String, Content>,
    stack: &mut Vec<String>,
) -> Result<Option<ContentNode>> {
    match node {
        ContentNode::Group(ident) if table.macro_spec(ident).is_some() => {
            Ok(resolve_macro(table, ident, cache, stack)?.model().cloned())
        }
        ContentNode::Group(_) => Ok(Some(node.clone())),
        ContentNode::Sequence(children) => {
            Ok(expand_children(table, children, cache, stack)?.map(ContentNode::Sequence))
        }
        ContentNode::Alternate(children) => {
            Ok(expand_children(table, children, cache, stack)?.map(ContentNode::Alternate))
        }
    }
}

fn expand_children(
    table: &SpecTable,
    children: &[ContentNode],
    cache: &mut HashMap<String, Content>,
    stack: &mut Vec<String>,
) -> Result<Option<Vec<ContentNode>>> {
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        if let Some(child) = expand(table, child, cache, stack)? {
            kept.push(child);
        }
    }
    Ok((!kept.is_empty()).then_some(kept))
}

/// Parse every spec element in one file
fn parse_spec_file(ident: &str, xml: &str, config: &LoaderConfig) -> Result<Vec<ParsedSpec>> {
    let doc = Document::parse(xml).map_err(|e| Error::xml(ident, e.to_string()))?;

    let mut nodes = Vec::new();
    collect_spec_nodes(doc.root_element(), &mut nodes);

    nodes
        .into_iter()
        .map(|node| parse_spec(node, &config.language))
        .collect()
}

fn collect_spec_nodes<'a, 'input>(node: Node<'a, 'input>, out: &mut Vec<Node<'a, 'input>>) {
    if SPEC_ELEMENTS.contains(&node.tag_name().name()) {
        out.push(node);
        return;
    }
    for child in node.children().filter(Node::is_element) {
        collect_spec_nodes(child, out);
    }
}

fn parse_spec(node: Node<'_, '_>, lang: &str) -> Result<ParsedSpec> {
    let kind = node.tag_name().name();
    let ident = node
        .attribute("ident")
        .ok_or_else(|| Error::InvalidFormat(format!("<{kind}> without an ident")))?
        .to_string();

    let content_node = child(node, "content");
    let content = content_node.map(content::decode).unwrap_or_default();
    let macro_refs = content_node
        .map(|c| {
            c.descendants()
                .filter(|d| d.tag_name().name() == "macroRef")
                .filter_map(|d| d.attribute("key"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let spec = match kind {
        "classSpec" => Spec::Class(ClassSpec {
            kind: ClassKind::from_type(node.attribute("type"), &ident)?,
            module: node.attribute("module").map(str::to_string),
            memberships: memberships(node),
            description: localized(node, "desc", lang),
            attrs: attr_entries(node, lang)?,
            ident,
        }),
        "elementSpec" => Spec::Element(ElementSpec {
            module: node.attribute("module").map(str::to_string),
            memberships: memberships(node),
            description: localized(node, "desc", lang),
            gloss: localized(node, "gloss", lang),
            attrs: attr_entries(node, lang)?,
            content,
            ident,
        }),
        "macroSpec" => Spec::Macro(MacroSpec { ident, content }),
        _ => Spec::Data(DataSpec { ident }),
    };

    Ok(ParsedSpec { spec, macro_refs })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

fn memberships(node: Node<'_, '_>) -> Vec<String> {
    child(node, "classes")
        .map(|classes| {
            children(classes, "memberOf")
                .filter_map(|m| m.attribute("key"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Text of the `name` child in `lang`, else an untagged one, else the first
fn localized(node: Node<'_, '_>, name: &'static str, lang: &str) -> Option<String> {
    let candidates: Vec<Node<'_, '_>> = children(node, name).collect();

    candidates
        .iter()
        .find(|n| lang_of(n) == Some(lang))
        .or_else(|| candidates.iter().find(|n| lang_of(n).is_none()))
        .or_else(|| candidates.first())
        .map(|n| normalize_text(*n))
        .filter(|text| !text.is_empty())
}

fn lang_of<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.attribute((XML_NS, "lang"))
}

fn normalize_text(node: Node<'_, '_>) -> String {
    let raw: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|t| t.text())
        .collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn attr_entries(node: Node<'_, '_>, lang: &str) -> Result<Vec<AttrEntry>> {
    let mut entries = Vec::new();
    for list in children(node, "attList") {
        collect_att_list(list, lang, &mut entries)?;
    }
    Ok(entries)
}

fn collect_att_list(list: Node<'_, '_>, lang: &str, out: &mut Vec<AttrEntry>) -> Result<()> {
    for item in list.children().filter(Node::is_element) {
        match item.tag_name().name() {
            "attDef" => out.push(AttrEntry::Def(parse_att_def(item, lang)?)),
            "attRef" => out.push(AttrEntry::Ref(AttrRef {
                att_class: item.attribute("class").map(str::to_string),
                name: item.attribute("name").map(str::to_string),
            })),
            "attList" => collect_att_list(item, lang, out)?,
            other => trace!("Skipping <{}> in attList", other),
        }
    }
    Ok(())
}

fn parse_att_def(node: Node<'_, '_>, lang: &str) -> Result<AttrDef> {
    let ident = node
        .attribute("ident")
        .ok_or_else(|| Error::InvalidFormat("<attDef> without an ident".to_string()))?;

    let datatype = child(node, "datatype");
    let val_list = child(node, "valList");

    Ok(AttrDef {
        ident: ident.to_string(),
        description: localized(node, "desc", lang),
        data_type: datatype.and_then(|d| {
            d.descendants()
                .filter(|r| matches!(r.tag_name().name(), "dataRef" | "ref"))
                .find_map(|r| r.attribute("key").or_else(|| r.attribute("name")))
                .map(str::to_string)
        }),
        min_occurs: datatype
            .and_then(|d| d.attribute("minOccurs"))
            .map(str::to_string),
        max_occurs: datatype
            .and_then(|d| d.attribute("maxOccurs"))
            .map(str::to_string),
        val_list: val_list.map(|list| {
            children(list, "valItem")
                .filter_map(|item| {
                    item.attribute("ident").map(|ident| ValItem {
                        ident: ident.to_string(),
                        desc: localized(item, "desc", lang),
                    })
                })
                .collect()
        }),
        val_list_type: match val_list {
            Some(list) => Some(list.attribute("type").unwrap_or("open").parse::<ValListType>()?),
            None => None,
        },
        usage: node.attribute("usage").map(str::parse::<Usage>).transpose()?,
        mode: node.attribute("mode").map(str::parse::<Mode>).transpose()?,
        hidden: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    const ATT_GLOBAL: &str = r#"
        <specGrp xmlns="http://www.tei-c.org/ns/1.0">
          <classSpec ident="att.global" type="atts" module="tei">
            <desc xml:lang="de">globale Attribute</desc>
            <desc xml:lang="en">global attributes</desc>
            <attList>
              <attDef ident="xml:id" usage="opt">
                <datatype><dataRef key="teidata.xmlid"/></datatype>
              </attDef>
              <attList org="choice">
                <attDef ident="n"/>
              </attList>
              <attRef class="att.global.rendition" name="rend"/>
            </attList>
          </classSpec>
          <classSpec ident="att.global.linking" type="atts">
            <classes><memberOf key="att.global"/></classes>
          </classSpec>
        </specGrp>"#;

    const MODEL_PLIKE: &str = r#"<classSpec ident="model.pLike" type="model"/>"#;

    const PARA_CONTENT: &str = r#"
        <macroSpec ident="macro.paraContent">
          <content>
            <alternate minOccurs="0" maxOccurs="unbounded">
              <textNode/>
              <classRef key="model.phrase"/>
            </alternate>
          </content>
        </macroSpec>"#;

    const P: &str = r#"
        <elementSpec ident="p" module="core">
          <gloss>paragraph</gloss>
          <desc>marks paragraphs in prose.</desc>
          <classes>
            <memberOf key="att.global"/>
            <memberOf key="model.pLike"/>
          </classes>
          <content><macroRef key="macro.paraContent"/></content>
          <attList>
            <attDef ident="type" usage="req" mode="change">
              <desc>kind of paragraph</desc>
              <datatype minOccurs="1" maxOccurs="unbounded"><dataRef key="teidata.enumerated"/></datatype>
              <valList type="closed">
                <valItem ident="intro"><desc>introductory</desc></valItem>
                <valItem ident="body"/>
              </valList>
            </attDef>
          </attList>
        </elementSpec>"#;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_file("att.global", ATT_GLOBAL)
            .with_file("model.pLike", MODEL_PLIKE)
            .with_file("macro.paraContent", PARA_CONTENT)
            .with_file("p", P)
    }

    #[test]
    fn test_load_element_with_dependencies() {
        let mut loader = SpecLoader::new(source());
        loader.load("p").unwrap();
        let table = loader.finish().unwrap();

        assert!(table.contains("att.global"));
        assert!(table.contains("att.global.linking"));
        assert!(table.contains("model.pLike"));
        assert!(table.contains("macro.paraContent"));

        let p = table.element("p").unwrap();
        assert_eq!(p.module.as_deref(), Some("core"));
        assert_eq!(p.memberships, vec!["att.global", "model.pLike"]);
        assert_eq!(p.gloss.as_deref(), Some("paragraph"));
        assert_eq!(p.description.as_deref(), Some("marks paragraphs in prose."));
        assert_eq!(p.content.encode(), "(textNode|model.phrase)");
    }

    #[test]
    fn test_parse_attribute_definitions() {
        let mut loader = SpecLoader::new(source());
        loader.load("p").unwrap();
        let table = loader.finish().unwrap();

        let p = table.element("p").unwrap();
        let AttrEntry::Def(def) = &p.attrs[0] else {
            panic!("expected attDef");
        };
        assert_eq!(def.ident, "type");
        assert_eq!(def.usage, Some(Usage::Req));
        assert_eq!(def.mode, Some(Mode::Change));
        assert_eq!(def.data_type.as_deref(), Some("teidata.enumerated"));
        assert_eq!(def.min_occurs.as_deref(), Some("1"));
        assert_eq!(def.max_occurs.as_deref(), Some("unbounded"));
        assert_eq!(def.val_list_type, Some(ValListType::Closed));
        let items = def.val_list.as_ref().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].desc.as_deref(), Some("introductory"));
        assert_eq!(items[1].desc, None);

        let global = table.class("att.global").unwrap();
        assert_eq!(global.kind, ClassKind::Atts);
        assert_eq!(global.description.as_deref(), Some("global attributes"));
        assert_eq!(global.attrs.len(), 3);
        assert!(matches!(&global.attrs[1], AttrEntry::Def(d) if d.ident == "n"));
        assert!(matches!(
            &global.attrs[2],
            AttrEntry::Ref(r) if r.name.as_deref() == Some("rend")
        ));
    }

    #[test]
    fn test_load_is_memoized() {
        let source = source();
        let mut loader = SpecLoader::new(&source);
        loader.load("p").unwrap();
        loader.load("p").unwrap();
        // att.global.linking came with att.global's file
        loader.load("att.global.linking").unwrap();
        let table = loader.finish().unwrap();

        assert_eq!(source.read_count("p"), 1);
        assert_eq!(source.read_count("att.global"), 1);
        assert_eq!(source.read_count("att.global.linking"), 0);
        assert_eq!(table.iter().filter(|s| s.ident() == "p").count(), 1);
    }

    #[test]
    fn test_nested_macro_is_spliced() {
        let source = MemorySource::new()
            .with_file(
                "macro.phraseSeq",
                r#"<macroSpec ident="macro.phraseSeq"><content>
                     <alternate><classRef key="model.hiLike"/><textNode/></alternate>
                   </content></macroSpec>"#,
            )
            .with_file(
                "head",
                r#"<elementSpec ident="head"><content>
                     <alternate>
                       <classRef key="model.lLike"/>
                       <macroRef key="macro.phraseSeq"/>
                     </alternate>
                   </content></elementSpec>"#,
            );
        let mut loader = SpecLoader::new(source);
        loader.load("head").unwrap();
        let table = loader.finish().unwrap();

        assert_eq!(
            table.element("head").unwrap().content.encode(),
            "(model.lLike|(model.hiLike|textNode))"
        );
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let source = MemorySource::new().with_file(
            "p",
            r#"<elementSpec ident="p"><classes><memberOf key="att.missing"/></classes></elementSpec>"#,
        );
        let mut loader = SpecLoader::new(source);
        match loader.load("p").unwrap_err() {
            Error::NotFound { ident, .. } => assert_eq!(ident, "att.missing"),
            e => panic!("Expected NotFound error, got {:?}", e),
        }
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        let source = MemorySource::new().with_file("p", "<elementSpec ident=\"p\">");
        let mut loader = SpecLoader::new(source);
        assert!(matches!(loader.load("p"), Err(Error::Xml { .. })));
    }

    #[test]
    fn test_circular_membership_rejected() {
        let source = MemorySource::new()
            .with_file(
                "att.a",
                r#"<classSpec ident="att.a"><classes><memberOf key="att.b"/></classes></classSpec>"#,
            )
            .with_file(
                "att.b",
                r#"<classSpec ident="att.b"><classes><memberOf key="att.a"/></classes></classSpec>"#,
            );
        let mut loader = SpecLoader::new(source);
        let err = loader.load("att.a").unwrap_err();
        assert!(err.to_string().contains("Circular dependency"));
    }

    #[test]
    fn test_circular_macro_rejected() {
        let source = MemorySource::new()
            .with_file(
                "macro.a",
                r#"<macroSpec ident="macro.a"><content><macroRef key="macro.b"/></content></macroSpec>"#,
            )
            .with_file(
                "macro.b",
                r#"<macroSpec ident="macro.b"><content>
                     <alternate><textNode/><macroRef key="macro.a"/></alternate>
                   </content></macroSpec>"#,
            );
        let mut loader = SpecLoader::new(source);
        loader.load("macro.a").unwrap();
        assert!(matches!(
            loader.finish(),
            Err(Error::CircularDependency(_))
        ));
    }

    #[test]
    fn test_file_without_requested_spec_is_not_fatal() {
        let source = MemorySource::new().with_file("p", MODEL_PLIKE);
        let mut loader = SpecLoader::new(source);
        loader.load("p").unwrap();
        let table = loader.finish().unwrap();
        assert!(!table.contains("p"));
        assert!(table.contains("model.pLike"));
    }

    #[test]
    fn test_language_preference() {
        let source = MemorySource::new().with_file("att.global", ATT_GLOBAL);
        let mut loader = SpecLoader::new(source).with_config(LoaderConfig::new().language("de"));
        loader.load("att.global").unwrap();
        let table = loader.finish().unwrap();
        assert_eq!(
            table.class("att.global").unwrap().description.as_deref(),
            Some("globale Attribute")
        );
    }

    #[test]
    fn test_invalid_usage_rejected() {
        let source = MemorySource::new().with_file(
            "p",
            r#"<elementSpec ident="p"><attList><attDef ident="x" usage="often"/></attList></elementSpec>"#,
        );
        let mut loader = SpecLoader::new(source);
        assert!(matches!(loader.load("p"), Err(Error::InvalidFormat(_))));
    }
}
