//! This module contains the markup parser. It converts a collection of tokens
//! into blocks.

use crate::markup::lexer::{Token, TokenType, MACRO_CLOSE, MACRO_OPEN};
use crate::tree::{Block, Format, MacroCall, NodeKind};
use lazy_static::lazy_static;
use regex::Regex;
use slog::{debug, o, trace};

lazy_static! {
    /// A single `key="value"` macro parameter.
    static ref MACRO_PARAM: Regex =
        Regex::new(r#"(?P<key>[A-Za-z][A-Za-z0-9_-]*)="(?P<value>[^"]*)""#).unwrap();
}

/// The main parser.
///
/// In block mode the tokens are split into paragraphs. In inline mode the
/// result is a flat list of inline blocks.
pub fn parser(tokens: &[Token], inline: bool, trim_leading: bool) -> Result<Vec<Block>, String> {
    debug!(slog_scope::logger(), "Starting parser...");

    let tokens = if trim_leading {
        trim_start(tokens)
    } else {
        tokens
    };

    let output = match inline {
        true => slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "inline_parser()")),
            || inline_parser(tokens, true),
        ),
        false => slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "block_parser()")),
            || block_parser(tokens),
        ),
    };
    let output = output?;

    debug!(slog_scope::logger(), "Parsing completed.");
    Ok(output)
}

/// Split tokens into paragraphs.
///
/// A paragraph holding nothing but one macro becomes a standalone macro
/// rather than a paragraph. Unmatched format markers in a paragraph are kept
/// as text.
fn block_parser(tokens: &[Token]) -> Result<Vec<Block>, String> {
    trace!(slog_scope::logger(), "Starting block parser...");
    let mut blocks = Vec::new();

    for paragraph in tokens.split(|t| t.token_type == TokenType::ParagraphBreak) {
        let paragraph = trim_end(trim_start(paragraph));
        if paragraph.is_empty() {
            continue;
        }

        if paragraph.len() == 1 && paragraph[0].token_type == TokenType::Macro {
            trace!(
                slog_scope::logger(),
                "Pushing standalone macro {:?}",
                paragraph[0].contents
            );
            blocks.push(macro_parser(paragraph[0].contents, false)?);
        } else {
            blocks.push(Block::new(NodeKind::Paragraph).with_children(inline_parser(paragraph, false)?));
        }
    }

    trace!(slog_scope::logger(), "Block parsing completed.");
    Ok(blocks)
}

/// Parse inline tokens, nesting formatted runs.
///
/// When `strict`, a format marker that is never closed, or one closed across
/// another format, is an error. Otherwise such markers are kept as literal
/// text, so `http://example.com` in a paragraph stays a plain word.
fn inline_parser(tokens: &[Token], strict: bool) -> Result<Vec<Block>, String> {
    trace!(slog_scope::logger(), "Starting inline parser...");

    // Each open format keeps the blocks collected since it opened
    let mut open: Vec<(Format, &str, Vec<Block>)> = Vec::new();
    let mut output: Vec<Block> = Vec::new();

    for token in tokens {
        let block = match token.token_type {
            TokenType::Word => Block::word(token.contents),
            TokenType::Space => Block::space(),
            TokenType::NewLine | TokenType::ParagraphBreak => Block::new(NodeKind::NewLine),
            TokenType::Macro => macro_parser(token.contents, true)?,
            TokenType::FormatMarker => {
                let format = format_for(token.contents)?;
                let index = match open.iter().rposition(|(f, _, _)| *f == format) {
                    Some(i) => i,
                    None => {
                        open.push((format, token.contents, Vec::new()));
                        continue;
                    }
                };

                if index + 1 < open.len() {
                    if strict {
                        return Err(format!(
                            "format marker \"{}\" closed across another format",
                            token.contents
                        ));
                    }
                    // Formats opened inside this one fall back to text
                    while open.len() > index + 1 {
                        close_as_text(&mut open, &mut output);
                    }
                }

                let children = open.pop().map(|(_, _, c)| c).unwrap_or_default();
                Block::new(NodeKind::Format { format }).with_children(children)
            }
        };

        match open.last_mut() {
            Some((_, _, children)) => children.push(block),
            None => output.push(block),
        }
    }

    if strict {
        if let Some((_, marker, _)) = open.last() {
            return Err(format!("format marker \"{}\" is never closed", marker));
        }
    }
    while !open.is_empty() {
        close_as_text(&mut open, &mut output);
    }

    trace!(slog_scope::logger(), "Inline parsing completed.");
    Ok(output)
}

/// Pop the innermost open format, handing its marker and collected blocks to
/// the enclosing format (or the output) as plain content.
fn close_as_text(open: &mut Vec<(Format, &str, Vec<Block>)>, output: &mut Vec<Block>) {
    if let Some((_, marker, children)) = open.pop() {
        trace!(
            slog_scope::logger(),
            "Keeping unmatched format marker {:?} as text",
            marker
        );
        let target = match open.last_mut() {
            Some((_, _, c)) => c,
            None => output,
        };
        target.push(Block::word(marker));
        target.extend(children);
    }
}

/// Parse a whole macro token into a pending macro block.
fn macro_parser(contents: &str, inline: bool) -> Result<Block, String> {
    let open = match MACRO_OPEN.captures(contents) {
        Some(o) => o,
        None => return Err(format!("malformed macro {:?}", contents)),
    };
    let name = &open["name"];
    let open_length = open[0].len();

    let content = if open.name("empty").is_some() {
        None
    } else {
        // The lexer only emits a macro token ending in its own closing tag
        let close_start = match contents.rfind("{{/") {
            Some(c) if c >= open_length && MACRO_CLOSE.is_match(&contents[c..]) => c,
            _ => return Err(format!("macro \"{}\" is never closed", name)),
        };
        Some(&contents[open_length..close_start])
    };

    let mut call = MacroCall::new(name, content, inline);
    for param in MACRO_PARAM.captures_iter(&open["params"]) {
        call.params
            .insert(param["key"].to_string(), param["value"].to_string());
    }

    trace!(
        slog_scope::logger(),
        "Parsed macro {:?} (inline: {}) with content {:?}",
        call.name,
        inline,
        call.content
    );
    Ok(Block::new(NodeKind::Macro(call)))
}

fn format_for(marker: &str) -> Result<Format, String> {
    match marker {
        "**" => Ok(Format::Bold),
        "//" => Ok(Format::Italic),
        "__" => Ok(Format::Underline),
        "^^" => Ok(Format::Superscript),
        ",," => Ok(Format::Subscript),
        _ => Err(format!("unknown format marker {:?}", marker)),
    }
}

fn is_whitespace(token: &Token) -> bool {
    matches!(
        token.token_type,
        TokenType::Space | TokenType::NewLine | TokenType::ParagraphBreak
    )
}

fn trim_start<'a, 'b>(tokens: &'b [Token<'a>]) -> &'b [Token<'a>] {
    let start = tokens
        .iter()
        .position(|t| !is_whitespace(t))
        .unwrap_or(tokens.len());
    &tokens[start..]
}

fn trim_end<'a, 'b>(tokens: &'b [Token<'a>]) -> &'b [Token<'a>] {
    let end = tokens
        .iter()
        .rposition(|t| !is_whitespace(t))
        .map_or(0, |e| e + 1);
    &tokens[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::lexer::lexer;

    fn parse(input: &str, inline: bool) -> Result<Vec<Block>, String> {
        parser(&lexer(input).unwrap(), inline, true)
    }

    mod block_parser {
        use super::*;

        #[test]
        fn paragraphs() {
            let blocks = parse("First one.\n\nSecond\none.\n", false).unwrap();

            assert_eq!(blocks.len(), 2);
            assert_eq!(blocks[0].kind, NodeKind::Paragraph);
            assert_eq!(
                blocks[0].children,
                vec![Block::word("First"), Block::space(), Block::word("one.")]
            );
            assert_eq!(blocks[1].children[1].kind, NodeKind::NewLine);
        }

        #[test]
        fn standalone_macro() {
            let blocks = parse("Text.\n\n{{references/}}\n", false).unwrap();

            assert_eq!(blocks.len(), 2);
            assert_eq!(
                blocks[1].kind,
                NodeKind::Macro(MacroCall::new("references", None, false))
            );
        }

        #[test]
        fn inline_macro_in_paragraph() {
            let blocks = parse("Text.{{reference}}Note{{/reference}}", false).unwrap();

            assert_eq!(blocks[0].kind, NodeKind::Paragraph);
            assert_eq!(
                blocks[0].children[1].kind,
                NodeKind::Macro(MacroCall::new("reference", Some("Note"), true))
            );
        }

        #[test]
        fn url_in_paragraph() {
            let blocks = parse("See http://example.com for details.", false).unwrap();

            assert_eq!(blocks.len(), 1);
            assert_eq!(
                blocks[0].children,
                vec![
                    Block::word("See"),
                    Block::space(),
                    Block::word("http:"),
                    Block::word("//"),
                    Block::word("example.com"),
                    Block::space(),
                    Block::word("for"),
                    Block::space(),
                    Block::word("details."),
                ]
            );
        }

        #[test]
        fn unclosed_inside_closed_format() {
            let blocks = parse("**see http://x.org** now", false).unwrap();

            assert_eq!(
                blocks[0].children,
                vec![
                    Block::new(NodeKind::Format {
                        format: Format::Bold
                    })
                    .with_children(vec![
                        Block::word("see"),
                        Block::space(),
                        Block::word("http:"),
                        Block::word("//"),
                        Block::word("x.org"),
                    ]),
                    Block::space(),
                    Block::word("now"),
                ]
            );
        }

        #[test]
        fn closed_formats_still_parsed() {
            let blocks = parse("a **b** c", false).unwrap();

            assert_eq!(
                blocks[0].children[2],
                Block::new(NodeKind::Format {
                    format: Format::Bold
                })
                .with_children(vec![Block::word("b")])
            );
        }
    }

    mod inline_parser {
        use super::*;

        #[test]
        fn nested_formats() {
            let blocks = parse("**bold //both//**", true).unwrap();

            assert_eq!(blocks.len(), 1);
            assert_eq!(
                blocks[0],
                Block::new(NodeKind::Format {
                    format: Format::Bold
                })
                .with_children(vec![
                    Block::word("bold"),
                    Block::space(),
                    Block::new(NodeKind::Format {
                        format: Format::Italic
                    })
                    .with_children(vec![Block::word("both")]),
                ])
            );
        }

        #[test]
        fn leading_whitespace_trimmed() {
            let blocks = parse("  \n text", true).unwrap();

            assert_eq!(blocks, vec![Block::word("text")]);
        }

        #[test]
        fn paragraph_break_inline() {
            let blocks = parse("a\n\nb", true).unwrap();

            assert_eq!(blocks[1].kind, NodeKind::NewLine);
            assert_eq!(blocks.len(), 3);
        }

        #[test]
        fn unclosed_format() {
            let err = parse("**never closed", true).unwrap_err();

            assert_eq!(err, "format marker \"**\" is never closed");
        }

        #[test]
        fn overlapping_formats() {
            assert!(parse("**a //b** c//", true).is_err());
        }
    }

    mod macro_parser {
        use super::*;

        #[test]
        fn params_and_content() {
            let block =
                macro_parser(r#"{{reference id="a" note="b c"}} x {{/reference}}"#, true).unwrap();
            let call = match block.kind {
                NodeKind::Macro(call) => call,
                _ => panic!("not a macro"),
            };

            assert_eq!(call.name, "reference");
            assert_eq!(call.content.as_deref(), Some(" x "));
            assert_eq!(call.params["id"], "a");
            assert_eq!(call.params["note"], "b c");
            assert!(call.inline);
        }

        #[test]
        fn empty_content() {
            let block = macro_parser("{{reference}}{{/reference}}", true).unwrap();

            assert_eq!(block.kind.content(), Some(""));
        }

        #[test]
        fn nested_content_kept_raw() {
            let block = macro_parser("{{box}}a {{box}}b{{/box}}{{/box}}", false).unwrap();

            assert_eq!(block.kind.content(), Some("a {{box}}b{{/box}}"));
        }
    }
}
