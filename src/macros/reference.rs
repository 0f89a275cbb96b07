//! The `reference` macro.
//!
//! Each `{{reference}}...{{/reference}}` is one footnote occurrence. Running
//! the macro does nothing to the occurrence itself; it only makes sure the
//! document has a place where the list of references will be rendered.

use crate::macros::references::{is_collection_point, REFERENCES_MACRO};
use crate::macros::{Macro, MacroContext};
use crate::tree::{Block, MacroCall, NodeKind, Tree};
use slog::debug;
use std::collections::BTreeMap;

pub const REFERENCE_MACRO: &str = "reference";

/// Runs before ordinary macros so the collection point exists when the
/// references are rendered.
pub const REFERENCE_PRIORITY: i32 = 500;

/// Append a pending `references` macro to the root unless the tree already
/// has one. Returns whether a macro was added.
pub fn ensure_collection_point(tree: &mut Tree) -> bool {
    let root = tree.root();
    if tree.find_first(root, is_collection_point).is_some() {
        return false;
    }

    debug!(slog_scope::logger(), "Adding a references macro to the document");
    let marker = tree.graft(Block::new(NodeKind::Macro(MacroCall::new(
        REFERENCES_MACRO,
        None,
        false,
    ))));
    tree.append_child(root, marker);
    true
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceMacro;

impl Macro for ReferenceMacro {
    fn name(&self) -> &'static str {
        REFERENCE_MACRO
    }

    fn priority(&self) -> i32 {
        REFERENCE_PRIORITY
    }

    fn supports_inline_mode(&self) -> bool {
        true
    }

    fn execute(
        &self,
        _params: &BTreeMap<String, String>,
        _content: Option<&str>,
        context: &mut MacroContext,
    ) -> Result<Vec<Block>, String> {
        ensure_collection_point(context.tree);
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::MarkupParser;

    fn count_collection_points(tree: &Tree) -> usize {
        tree.find_all(tree.root(), is_collection_point).len()
    }

    #[test]
    fn adds_to_end_of_root() {
        let mut tree = Tree::from_block(
            Block::new(NodeKind::Document)
                .with_children(vec![Block::new(NodeKind::Paragraph)]),
        );

        assert!(ensure_collection_point(&mut tree));

        let last = *tree.get(tree.root()).children().last().unwrap();
        assert_eq!(
            tree.get(last).kind,
            NodeKind::Macro(MacroCall::new(REFERENCES_MACRO, None, false))
        );
        assert_eq!(tree.get(tree.root()).children().len(), 2);
    }

    #[test]
    fn idempotent() {
        let mut tree = Tree::new();

        assert!(ensure_collection_point(&mut tree));
        assert!(!ensure_collection_point(&mut tree));
        assert_eq!(count_collection_points(&tree), 1);
    }

    #[test]
    fn existing_nested_marker() {
        let mut tree = Tree::from_block(Block::new(NodeKind::Document).with_children(vec![
            Block::new(NodeKind::Group).with_children(vec![Block::new(NodeKind::MacroMarker(
                MacroCall::new(REFERENCES_MACRO, None, false),
            ))]),
        ]));

        assert!(!ensure_collection_point(&mut tree));
        assert_eq!(count_collection_points(&tree), 1);
    }

    #[test]
    fn execute_returns_nothing() {
        let mut tree = Tree::new();
        let site = tree.root();
        let mut context = MacroContext {
            tree: &mut tree,
            site,
            parser: &MarkupParser,
        };

        let output = ReferenceMacro
            .execute(&BTreeMap::new(), Some("note"), &mut context)
            .unwrap();

        assert!(output.is_empty());
        assert_eq!(count_collection_points(&tree), 1);
    }
}
