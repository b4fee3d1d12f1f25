//! Synthetic records: shared text leaves, global wrappers and document roots

use crate::groups::GroupIndex;
use crate::record::{ElementRecord, FcType, PmType};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use tei_odd::TEXT_PLACEHOLDER;
use tracing::debug;

/// A name inside a grammar expression
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s()|?*+]+").expect("token pattern is valid"));

/// Document roots every schema starts with
pub fn document_roots() -> Vec<ElementRecord> {
    [
        ("doc", "front? body back?"),
        ("headerDoc", "fileDesc model.teiHeaderPart* revisionDesc?"),
    ]
    .into_iter()
    .map(|(name, content)| {
        ElementRecord::synthetic(name, PmType::Node, FcType::DocNodes)
            .content(Some(content.to_string()))
            .isolating()
    })
    .collect()
}

/// Bind every record whose content names the text placeholder to a shared
/// text leaf, one leaf per distinct `(inlineContent, markContent)` pair.
///
/// Rewrites the placeholder in place and returns the new leaves in
/// first-seen order.
pub fn dedupe_text_nodes(records: &mut [ElementRecord]) -> Vec<ElementRecord> {
    let mut leaves: Vec<ElementRecord> = Vec::new();
    let mut by_signature: HashMap<(Option<String>, Option<String>), String> = HashMap::new();

    for record in records.iter_mut() {
        let Some(content) = record.content.as_deref() else {
            continue;
        };
        if !mentions(content, TEXT_PLACEHOLDER) {
            continue;
        }

        let signature = (record.inline_content.clone(), record.mark_content.clone());
        let leaf = match by_signature.get(&signature) {
            Some(name) => name.clone(),
            None => {
                let name = format!("{}{}", TEXT_PLACEHOLDER, leaves.len());
                debug!("New text leaf {} for '{}'", name, record.name);
                leaves.push(text_leaf(&name, &signature.0, &signature.1));
                by_signature.insert(signature, name.clone());
                name
            }
        };

        let rewritten = rename_token(content, TEXT_PLACEHOLDER, &leaf);
        record.content = Some(rewritten);
    }

    leaves
}

fn text_leaf(name: &str, inline: &Option<String>, marks: &Option<String>) -> ElementRecord {
    let content = match inline {
        Some(inline) => format!("({inline}|text)*"),
        None => "text*".to_string(),
    };
    ElementRecord::synthetic(name, PmType::Node, FcType::TextNodes)
        .content(Some(content))
        .mark_content(marks.clone())
}

/// Wrappers letting inline content sit where only block nodes are allowed:
/// `<group>_g` around every inline group and `<ident>_g` around every
/// inline or aside element.
pub fn global_wrappers(index: &GroupIndex) -> Vec<ElementRecord> {
    let groups = index
        .inline_groups
        .iter()
        .map(|group| (format!("{group}_g"), format!("{group}_i")));
    let idents = index
        .inline_idents
        .iter()
        .map(|ident| (format!("{ident}_g"), ident.clone()));

    groups
        .chain(idents)
        .map(|(name, content)| {
            ElementRecord::synthetic(name, PmType::Node, FcType::GlobalNodes)
                .content(Some(content))
                .unselectable_atom()
        })
        .collect()
}

fn mentions(expr: &str, name: &str) -> bool {
    TOKEN.find_iter(expr).any(|m| m.as_str() == name)
}

/// Replace whole-token occurrences of `from` in a grammar expression
pub fn rename_token(expr: &str, from: &str, to: &str) -> String {
    TOKEN
        .replace_all(expr, |caps: &Captures<'_>| {
            if &caps[0] == from {
                to.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, content: &str, inline: Option<&str>, marks: Option<&str>) -> ElementRecord {
        ElementRecord::new(name, PmType::Node, FcType::Soft)
            .content(Some(content.to_string()))
            .inline_content(inline.map(str::to_string))
            .mark_content(marks.map(str::to_string))
    }

    #[test]
    fn test_same_signature_shares_leaf() {
        let mut records = vec![
            node("p", "textNode", Some("(ptr|note)"), Some("hi")),
            node("head", "textNode", Some("(ptr|note)"), Some("hi")),
            node("div", "head (p|div)", None, None),
        ];
        let leaves = dedupe_text_nodes(&mut records);

        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].name, "textNode0");
        assert_eq!(leaves[0].content.as_deref(), Some("((ptr|note)|text)*"));
        assert_eq!(leaves[0].mark_content.as_deref(), Some("hi"));
        assert_eq!(leaves[0].fc_type, FcType::TextNodes);
        assert!(leaves[0].synth);
        assert_eq!(records[0].content.as_deref(), Some("textNode0"));
        assert_eq!(records[1].content.as_deref(), Some("textNode0"));
        assert_eq!(records[2].content.as_deref(), Some("head (p|div)"));
    }

    #[test]
    fn test_different_marks_get_different_leaves() {
        let mut records = vec![
            node("p", "textNode", None, Some("hi")),
            node("head", "(textNode|list)", None, Some("hi emph")),
        ];
        let leaves = dedupe_text_nodes(&mut records);

        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[1].content.as_deref(), Some("text*"));
        assert_eq!(records[0].content.as_deref(), Some("textNode0"));
        assert_eq!(records[1].content.as_deref(), Some("(textNode1|list)"));
    }

    #[test]
    fn test_rename_token_matches_whole_names() {
        assert_eq!(
            rename_token("textNode textNodes (textNode|x)", "textNode", "textNode3"),
            "textNode3 textNodes (textNode3|x)"
        );
        assert_eq!(rename_token("fileDesc model.x* y?", "model.x", "z"), "fileDesc z* y?");
    }

    #[test]
    fn test_document_roots() {
        let roots = document_roots();
        let names: Vec<&str> = roots.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["doc", "headerDoc"]);
        assert!(roots.iter().all(|r| r.synth && r.isolating));
        assert_eq!(roots[0].content.as_deref(), Some("front? body back?"));
    }
}
