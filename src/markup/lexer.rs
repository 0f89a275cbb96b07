//! This module contains the markup lexer. It converts a string of wiki markup
//! into a collection of tokens.

use lazy_static::lazy_static;
use regex::Regex;
use slog::{debug, o, trace};

lazy_static! {
    /// An opening (or empty) macro tag, anchored at the start of the input.
    pub static ref MACRO_OPEN: Regex = Regex::new(
        r#"^\{\{(?P<name>[A-Za-z][A-Za-z0-9_-]*)(?P<params>(?:\s+[A-Za-z][A-Za-z0-9_-]*="[^"]*")*)\s*(?P<empty>/)?\}\}"#
    )
    .unwrap();
    /// A closing macro tag, anchored at the start of the input.
    pub static ref MACRO_CLOSE: Regex =
        Regex::new(r"^\{\{/(?P<name>[A-Za-z][A-Za-z0-9_-]*)\s*\}\}").unwrap();
}

/// The tokenized parts of the input string.
#[derive(Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub contents: &'a str,
}

impl Token<'_> {
    /// Creates a new [`Token`].
    pub fn new(token_type: TokenType, contents: &str) -> Token {
        Token {
            token_type,
            contents,
        }
    }
}

/// The types of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Word,
    Space,
    NewLine,
    ParagraphBreak,
    FormatMarker,
    Macro,
}

/// The two-character markers that toggle inline formatting.
pub const FORMAT_MARKERS: [&str; 5] = ["**", "//", "__", "^^", ",,"];

/// The main lexer function.
///
/// Expects `\n` line endings.
pub fn lexer(input: &str) -> Result<Vec<Token>, String> {
    debug!(slog_scope::logger(), "Starting lexer...");

    match slog_scope::scope(
        &slog_scope::logger().new(o!("fn" => "text_lexer()")),
        || text_lexer(input),
    ) {
        Ok(output) => {
            debug!(slog_scope::logger(), "Lexing completed");
            Ok(output)
        }
        Err(e) => Err(e),
    }
}

/// The text lexer.
///
/// Walks the input byte by byte. Words run until whitespace, a format marker,
/// or a macro tag. Everything between a macro's opening and closing tags is
/// handed over as part of a single macro token and never lexed here.
fn text_lexer(input: &str) -> Result<Vec<Token>, String> {
    trace!(slog_scope::logger(), "Starting text lexer...");

    let bytes = input.as_bytes();
    let mut lex: Vec<Token> = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &input[i..];

        // Macros
        if rest.starts_with("{{") {
            if let Some(length) = macro_lexer(rest)? {
                push_word(&mut lex, &input[start..i]);
                trace!(
                    slog_scope::logger(),
                    "Pushing token type {:?} containing {:?}",
                    TokenType::Macro,
                    &rest[..length]
                );
                lex.push(Token::new(TokenType::Macro, &rest[..length]));
                i += length;
                start = i;
                continue;
            }
        }

        // Format markers
        if FORMAT_MARKERS.iter().any(|m| rest.starts_with(m)) {
            push_word(&mut lex, &input[start..i]);
            lex.push(Token::new(TokenType::FormatMarker, &rest[..2]));
            i += 2;
            start = i;
            continue;
        }

        match bytes[i] {
            b' ' | b'\t' => {
                push_word(&mut lex, &input[start..i]);
                let end = i + rest
                    .bytes()
                    .take_while(|b| *b == b' ' || *b == b'\t')
                    .count();
                lex.push(Token::new(TokenType::Space, &input[i..end]));
                i = end;
                start = i;
            }
            b'\n' => {
                push_word(&mut lex, &input[start..i]);
                let end = i + newline_run(rest);
                let run = &input[i..end];
                // Two or more line breaks (blank lines may hold whitespace)
                // separate paragraphs.
                if run.matches('\n').count() > 1 {
                    lex.push(Token::new(TokenType::ParagraphBreak, run));
                } else {
                    lex.push(Token::new(TokenType::NewLine, run));
                }
                i = end;
                start = i;
            }
            _ => {
                // Step over whole characters so slices stay on boundaries
                i += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    push_word(&mut lex, &input[start..]);

    trace!(slog_scope::logger(), "Text lexing completed.");
    Ok(lex)
}

/// Push a word token, skipping empty slices.
fn push_word<'a>(lex: &mut Vec<Token<'a>>, word: &'a str) {
    if !word.is_empty() {
        trace!(
            slog_scope::logger(),
            "Pushing token type {:?} containing {:?}",
            TokenType::Word,
            word
        );
        lex.push(Token::new(TokenType::Word, word));
    }
}

/// Length of a run of line breaks starting at the beginning of `input`.
///
/// Whitespace between line breaks belongs to the run, trailing whitespace
/// after the last line break does not.
fn newline_run(input: &str) -> usize {
    let mut end = 0;
    for (i, c) in input.bytes().enumerate() {
        match c {
            b'\n' => end = i + 1,
            b' ' | b'\t' => {}
            _ => break,
        }
    }
    end
}

/// The macro lexer.
///
/// Called when the input starts with `{{`. Returns the length of the whole
/// macro (opening tag, raw content, and closing tag), or `None` if the input
/// isn't a macro tag after all. Nested macros with the same name are
/// balanced.
fn macro_lexer(input: &str) -> Result<Option<usize>, String> {
    if let Some(close) = MACRO_CLOSE.captures(input) {
        return Err(format!(
            "closing tag for macro \"{}\" without an opening tag",
            &close["name"]
        ));
    }

    let open = match MACRO_OPEN.captures(input) {
        Some(o) => o,
        None => return Ok(None),
    };
    let open_length = open[0].len();

    if open.name("empty").is_some() {
        return Ok(Some(open_length));
    }

    let name = &open["name"];
    let mut depth = 1;
    let mut i = open_length;

    while let Some(offset) = input[i..].find("{{") {
        i += offset;
        let rest = &input[i..];

        if let Some(close) = MACRO_CLOSE.captures(rest) {
            let length = close[0].len();
            if &close["name"] == name {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(i + length));
                }
            }
            i += length;
        } else if let Some(inner) = MACRO_OPEN.captures(rest) {
            if &inner["name"] == name && inner.name("empty").is_none() {
                depth += 1;
            }
            i += inner[0].len();
        } else {
            i += 2;
        }
    }

    Err(format!("macro \"{}\" is never closed", name))
}
