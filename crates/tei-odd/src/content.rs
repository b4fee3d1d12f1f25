//! Content-model compiler
//!
//! Decodes ODD `<content>` fragments into a small sequence/alternate/group
//! tree, prunes that tree down to the groups a consumer cares about, and
//! encodes it back into a grammar expression such as `head (p|list) note`.

use crate::{Error, Result};
use roxmltree::{Document, Node};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Group name standing in for character data (`textNode`, `dataRef`)
pub const TEXT_PLACEHOLDER: &str = "textNode";

/// Set of group names a filter keeps (or drops)
pub type GroupSet = BTreeSet<String>;

/// Decoded content of an element or macro spec
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Content {
    #[default]
    Empty,
    Model(ContentNode),
    /// Reference to a macro whose content has not been substituted yet
    Macro(String),
}

/// Content-model tree. A group leaf always names exactly one class or element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Sequence(Vec<ContentNode>),
    Alternate(Vec<ContentNode>),
    Group(String),
}

/// Decode an ODD content-model element (normally `<content>`).
///
/// Only a content element with exactly one element child yields a model;
/// anything else is [`Content::Empty`].
pub fn decode(content: Node<'_, '_>) -> Content {
    let mut children = content.children().filter(Node::is_element);
    let (Some(child), None) = (children.next(), children.next()) else {
        return Content::Empty;
    };

    if child.tag_name().name() == "macroRef" {
        return match child.attribute("key") {
            Some(key) => Content::Macro(key.to_string()),
            None => Content::Empty,
        };
    }

    match decode_particle(child) {
        Some(node) => Content::Model(node),
        None => Content::Empty,
    }
}

fn decode_particle(node: Node<'_, '_>) -> Option<ContentNode> {
    match node.tag_name().name() {
        "classRef" | "elementRef" | "macroRef" => {
            node.attribute("key").map(|key| ContentNode::Group(key.to_string()))
        }
        "textNode" | "dataRef" => Some(ContentNode::Group(TEXT_PLACEHOLDER.to_string())),
        "sequence" => Some(ContentNode::Sequence(decode_children(node))),
        "alternate" => Some(ContentNode::Alternate(decode_children(node))),
        _ => None,
    }
}

fn decode_children(node: Node<'_, '_>) -> Vec<ContentNode> {
    node.children()
        .filter(Node::is_element)
        .filter_map(decode_particle)
        .collect()
}

/// Decode a standalone `<content>` fragment
pub fn parse_content(xml: &str) -> Result<Content> {
    let doc = Document::parse(xml).map_err(|e| Error::xml("<content>", e.to_string()))?;
    Ok(decode(doc.root_element()))
}

/// Render a tree as a grammar expression; `None` renders as the empty string
pub fn encode(node: Option<&ContentNode>) -> String {
    node.map(ContentNode::encode).unwrap_or_default()
}

/// Keep only group leaves whose membership in `targets` equals `!exclude`.
///
/// Sequences and alternates keep their surviving children; one that loses
/// every child is dropped, which may in turn empty its parent. A node left
/// with a single child is replaced by that child.
pub fn filter_by_groups(
    node: &ContentNode,
    targets: &GroupSet,
    exclude: bool,
) -> Option<ContentNode> {
    match node {
        ContentNode::Group(ident) => {
            (targets.contains(ident) != exclude).then(|| node.clone())
        }
        ContentNode::Sequence(children) => {
            collapse(filter_children(children, targets, exclude), ContentNode::Sequence)
        }
        ContentNode::Alternate(children) => {
            collapse(filter_children(children, targets, exclude), ContentNode::Alternate)
        }
    }
}

fn filter_children(children: &[ContentNode], targets: &GroupSet, exclude: bool) -> Vec<ContentNode> {
    children
        .iter()
        .filter_map(|child| filter_by_groups(child, targets, exclude))
        .collect()
}

fn collapse(
    mut children: Vec<ContentNode>,
    wrap: fn(Vec<ContentNode>) -> ContentNode,
) -> Option<ContentNode> {
    match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(wrap(children)),
    }
}

impl Content {
    pub fn model(&self) -> Option<&ContentNode> {
        match self {
            Content::Model(node) => Some(node),
            Content::Empty | Content::Macro(_) => None,
        }
    }

    pub fn encode(&self) -> String {
        encode(self.model())
    }
}

impl ContentNode {
    pub fn group(ident: impl Into<String>) -> Self {
        ContentNode::Group(ident.into())
    }

    pub fn encode(&self) -> String {
        match self {
            ContentNode::Sequence(children) => children
                .iter()
                .map(ContentNode::encode)
                .collect::<Vec<_>>()
                .join(" "),
            ContentNode::Alternate(children) => format!(
                "({})",
                children
                    .iter()
                    .map(ContentNode::encode)
                    .collect::<Vec<_>>()
                    .join("|")
            ),
            ContentNode::Group(ident) => ident.clone(),
        }
    }

    /// Group idents in document order, duplicates included
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ContentNode::Group(ident) => out.push(ident),
            ContentNode::Sequence(children) | ContentNode::Alternate(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Same shape with every group ident passed through `f`
    pub fn rename(&self, f: &impl Fn(&str) -> String) -> ContentNode {
        match self {
            ContentNode::Group(ident) => ContentNode::Group(f(ident)),
            ContentNode::Sequence(children) => {
                ContentNode::Sequence(children.iter().map(|c| c.rename(f)).collect())
            }
            ContentNode::Alternate(children) => {
                ContentNode::Alternate(children.iter().map(|c| c.rename(f)).collect())
            }
        }
    }
}

/// Parses the expressions produced by [`ContentNode::encode`]
impl FromStr for ContentNode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s);
        let mut pos = 0;
        let node = parse_choice(&tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(Error::InvalidFormat(format!(
                "Unexpected '{}' in content expression '{s}'",
                tokens[pos]
            )));
        }
        Ok(node)
    }
}

fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '(' | ')' | '|' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_choice(tokens: &[String], pos: &mut usize) -> Result<ContentNode> {
    let mut branches = vec![parse_seq(tokens, pos)?];
    while tokens.get(*pos).is_some_and(|t| t == "|") {
        *pos += 1;
        branches.push(parse_seq(tokens, pos)?);
    }
    Ok(if branches.len() == 1 {
        branches.remove(0)
    } else {
        ContentNode::Alternate(branches)
    })
}

fn parse_seq(tokens: &[String], pos: &mut usize) -> Result<ContentNode> {
    let mut items = Vec::new();
    while let Some(token) = tokens.get(*pos) {
        match token.as_str() {
            "|" | ")" => break,
            "(" => {
                *pos += 1;
                let inner = parse_choice(tokens, pos)?;
                if tokens.get(*pos).map(String::as_str) != Some(")") {
                    return Err(Error::InvalidFormat(
                        "Unclosed '(' in content expression".to_string(),
                    ));
                }
                *pos += 1;
                // A parenthesised single item is still an alternate
                items.push(match inner {
                    ContentNode::Alternate(_) => inner,
                    other => ContentNode::Alternate(vec![other]),
                });
            }
            ident => {
                items.push(ContentNode::Group(ident.to_string()));
                *pos += 1;
            }
        }
    }
    match items.len() {
        0 => Err(Error::InvalidFormat("Empty content expression".to_string())),
        1 => Ok(items.remove(0)),
        _ => Ok(ContentNode::Sequence(items)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> GroupSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn g(ident: &str) -> ContentNode {
        ContentNode::group(ident)
    }

    #[test]
    fn test_decode_nested_model() {
        let content = parse_content(
            r#"<content xmlns="http://www.tei-c.org/ns/1.0">
                 <sequence>
                   <elementRef key="head" minOccurs="0"/>
                   <alternate minOccurs="1" maxOccurs="unbounded">
                     <classRef key="model.pLike"/>
                     <textNode/>
                   </alternate>
                 </sequence>
               </content>"#,
        )
        .unwrap();

        assert_eq!(
            content,
            Content::Model(ContentNode::Sequence(vec![
                g("head"),
                ContentNode::Alternate(vec![g("model.pLike"), g(TEXT_PLACEHOLDER)]),
            ]))
        );
        assert_eq!(content.encode(), "head (model.pLike|textNode)");
    }

    #[test]
    fn test_decode_class_ref_leaf() {
        let content = parse_content(r#"<content><classRef key="model.divLike"/></content>"#).unwrap();
        assert_eq!(content, Content::Model(g("model.divLike")));
    }

    #[test]
    fn test_decode_macro_reference() {
        let content =
            parse_content(r#"<content><macroRef key="macro.paraContent"/></content>"#).unwrap();
        assert_eq!(content, Content::Macro("macro.paraContent".to_string()));
        assert_eq!(content.encode(), "");
    }

    #[test]
    fn test_decode_wrong_child_count_is_empty() {
        assert_eq!(parse_content("<content/>").unwrap(), Content::Empty);
        assert_eq!(
            parse_content(r#"<content><classRef key="a"/><classRef key="b"/></content>"#).unwrap(),
            Content::Empty
        );
        assert_eq!(parse_content("<content><empty/></content>").unwrap(), Content::Empty);
    }

    #[test]
    fn test_decode_malformed_xml() {
        assert!(matches!(
            parse_content("<content><sequence></content>"),
            Err(Error::Xml { .. })
        ));
    }

    #[test]
    fn test_encode() {
        let tree = ContentNode::Sequence(vec![
            g("head"),
            ContentNode::Alternate(vec![g("p"), g("list")]),
            g("note"),
        ]);
        assert_eq!(tree.encode(), "head (p|list) note");
        assert_eq!(encode(None), "");
    }

    #[test]
    fn test_filter_prunes_transitively() {
        // (A|B) C filtered to {A} collapses all the way down to A
        let tree = ContentNode::Sequence(vec![ContentNode::Alternate(vec![g("A"), g("B")]), g("C")]);
        let filtered = filter_by_groups(&tree, &set(&["A"]), false).unwrap();
        assert_eq!(filtered, g("A"));
        assert_eq!(filtered.encode(), "A");
    }

    #[test]
    fn test_filter_drops_empty_branches() {
        let tree = ContentNode::Sequence(vec![
            ContentNode::Alternate(vec![g("x"), g("y")]),
            ContentNode::Alternate(vec![g("A"), g("B"), g("z")]),
        ]);
        let filtered = filter_by_groups(&tree, &set(&["A", "B"]), false).unwrap();
        assert_eq!(filtered.encode(), "(A|B)");
        assert!(filter_by_groups(&tree, &set(&["nothing"]), false).is_none());
    }

    #[test]
    fn test_filter_exclude() {
        let tree = ContentNode::Alternate(vec![g("A"), g("B"), g("C")]);
        let filtered = filter_by_groups(&tree, &set(&["B"]), true).unwrap();
        assert_eq!(filtered.encode(), "(A|C)");
    }

    #[test]
    fn test_leaves_and_rename() {
        let tree = ContentNode::Sequence(vec![g("a"), ContentNode::Alternate(vec![g("b"), g("a")])]);
        assert_eq!(tree.leaves(), vec!["a", "b", "a"]);
        let renamed = tree.rename(&|ident: &str| format!("{ident}_g"));
        assert_eq!(renamed.encode(), "a_g (b_g|a_g)");
    }

    #[test]
    fn test_expression_reparses_to_same_shape() {
        let trees = vec![
            g("p"),
            ContentNode::Alternate(vec![g("p"), g("list")]),
            ContentNode::Sequence(vec![
                g("head"),
                ContentNode::Alternate(vec![
                    ContentNode::Alternate(vec![g("a"), g("b")]),
                    ContentNode::Sequence(vec![g("c"), g("d")]),
                ]),
            ]),
        ];
        for tree in trees {
            let reparsed: ContentNode = tree.encode().parse().unwrap();
            assert_eq!(reparsed, tree, "round trip of {}", tree.encode());
        }
    }

    #[test]
    fn test_expression_parse_errors() {
        assert!("(a|b".parse::<ContentNode>().is_err());
        assert!("a )".parse::<ContentNode>().is_err());
        assert!("".parse::<ContentNode>().is_err());
    }
}
