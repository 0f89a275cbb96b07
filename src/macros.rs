//! Macros and the interface they are run through.
//!
//! A macro receives its parameters, its raw content, and a [`MacroContext`]
//! giving it the whole tree. It returns the blocks that take its place.

pub mod reference;
pub mod references;

use crate::tree::{Block, NodeId, Tree};
use phf::phf_map;
use reference::ReferenceMacro;
use references::ReferencesMacro;
use std::collections::BTreeMap;

pub use reference::ensure_collection_point;
pub use references::{collect_references, render_references, Collection, Label};

/// Priority of macros that don't ask for another one. Lower runs earlier.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Parses raw macro content into blocks.
pub trait ContentParser {
    fn parse(&self, content: &str, inline: bool, trim_leading: bool) -> Result<Vec<Block>, String>;
}

/// What a macro gets to see while it runs.
pub struct MacroContext<'a> {
    pub tree: &'a mut Tree,
    /// The node of the macro being executed.
    pub site: NodeId,
    pub parser: &'a dyn ContentParser,
}

pub trait Macro {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn supports_inline_mode(&self) -> bool;

    fn execute(
        &self,
        params: &BTreeMap<String, String>,
        content: Option<&str>,
        context: &mut MacroContext,
    ) -> Result<Vec<Block>, String>;
}

/// The known macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    Reference,
    References,
}

impl MacroKind {
    pub fn implementation(self) -> &'static dyn Macro {
        match self {
            MacroKind::Reference => &ReferenceMacro,
            MacroKind::References => &ReferencesMacro,
        }
    }
}

static MACROS: phf::Map<&'static str, MacroKind> = phf_map! {
    "reference" => MacroKind::Reference,
    "references" => MacroKind::References,
};

/// Find a macro by name.
pub fn lookup(name: &str) -> Option<&'static dyn Macro> {
    MACROS.get(name).map(|kind| kind.implementation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry() {
        let ensurer = lookup("reference").unwrap();
        let collector = lookup("references").unwrap();

        assert_eq!(ensurer.name(), reference::REFERENCE_MACRO);
        assert_eq!(collector.name(), references::REFERENCES_MACRO);
        assert!(ensurer.priority() < DEFAULT_PRIORITY);
        assert_eq!(collector.priority(), DEFAULT_PRIORITY);
        assert!(ensurer.supports_inline_mode());
        assert!(!collector.supports_inline_mode());
        assert!(lookup("footnote").is_none());
    }
}
