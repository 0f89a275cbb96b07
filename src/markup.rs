//! The wiki markup reader.
//!
//! Supports paragraphs, the inline formats `**bold**`, `//italic//`,
//! `__underline__`, `^^superscript^^` and `,,subscript,,`, and macros written
//! as `{{name key="value"}}content{{/name}}` or `{{name/}}`.

mod lexer;
mod parser;

use crate::macros::ContentParser;
use crate::tree::{Block, NodeKind};
use slog::{debug, o};

/// Parse markup into a list of blocks.
pub fn parse(input: &str, inline: bool, trim_leading: bool) -> Result<Vec<Block>, String> {
    let input = input.replace("\r\n", "\n");

    let tokens = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "lexer()")), || {
        lexer::lexer(&input)
    })?;

    slog_scope::scope(&slog_scope::logger().new(o!("fn" => "parser()")), || {
        parser::parser(&tokens, inline, trim_leading)
    })
}

/// Parse a whole document.
pub fn parse_document(input: &str) -> Result<Block, String> {
    debug!(slog_scope::logger(), "Parsing document...");
    let blocks = parse(input, false, true)?;
    debug!(
        slog_scope::logger(),
        "Document parsed into {} block(s).",
        blocks.len()
    );
    Ok(Block::new(NodeKind::Document).with_children(blocks))
}

/// The markup reader, as handed to macros for parsing their content.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupParser;

impl ContentParser for MarkupParser {
    fn parse(&self, content: &str, inline: bool, trim_leading: bool) -> Result<Vec<Block>, String> {
        parse(content, inline, trim_leading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MacroCall;

    #[test]
    fn document() {
        let document =
            parse_document("Hello{{reference}}World{{/reference}}.\r\n\r\n{{references/}}")
                .unwrap();

        assert_eq!(document.kind, NodeKind::Document);
        assert_eq!(document.children.len(), 2);
        assert_eq!(
            document.children[0].children[1].kind,
            NodeKind::Macro(MacroCall::new("reference", Some("World"), true))
        );
        assert_eq!(document.children[0].children[2], Block::word("."));
    }

    #[test]
    fn url_in_document() {
        let document =
            parse_document("See http://example.com for details.{{reference}}x{{/reference}}")
                .unwrap();
        let paragraph = &document.children[0];

        assert_eq!(paragraph.children[3], Block::word("//"));
        assert_eq!(
            paragraph.children.last().map(|b| &b.kind),
            Some(&NodeKind::Macro(MacroCall::new("reference", Some("x"), true)))
        );
    }

    #[test]
    fn empty_document() {
        let document = parse_document("").unwrap();

        assert!(document.children.is_empty());
    }

    #[test]
    fn content_parser() {
        let blocks = MarkupParser.parse(" **x**", true, true).unwrap();

        assert_eq!(blocks.len(), 1);
        assert!(MarkupParser.parse("**x", true, true).is_err());
    }
}
