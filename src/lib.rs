//! Contains the main refnotes function. Loads a document, runs its macros,
//! and writes the result.
//!
//! The interesting part lives in [`macros`]: the `reference` macro marks a
//! footnote and the `references` macro renders the numbered list of all of
//! them, merging footnotes with identical text.

pub mod config;
mod fs;
pub mod macros;
pub mod markup;
pub mod render;
pub mod transform;
pub mod tree;

use ansi_term::Color;
use config::{Input, Output, RefsConfig};
use fs::{load_document, save_output};
use markup::MarkupParser;
use slog::{debug, o};
use std::path::Path;
use tree::{Block, Tree};

/// The main refnotes function.
pub fn refnotes(config: RefsConfig) -> Result<(), String> {
    eprintln!("{} Starting refnotes...", Color::Green.paint("INFO"));

    // Load the input
    let (input, input_format) =
        slog_scope::scope(&slog_scope::logger().new(o!("fn" => "load_document()")), || {
            load_document(Path::new(config.input))
        })
        .map_err(|e| format!("Input load error: {}", e))?;

    // Read it into a tree
    let document = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "read()")), || {
        read(&input, input_format)
    })?;
    let mut tree = Tree::from_block(document);

    // Run the macros
    if config.transform {
        eprintln!("{} Running macros...", Color::Green.paint("INFO"));
        let executed = slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "transform()")),
            || transform::transform(&mut tree, &MarkupParser),
        )
        .map_err(|e| format!("Transformation error: {}", e))?;
        debug!(slog_scope::logger(), "{} macro(s) executed", executed);
    }

    // Write the output
    let output = slog_scope::scope(&slog_scope::logger().new(o!("fn" => "write()")), || {
        write(&tree.to_block(tree.root()), config.format)
    })?;

    match config.output {
        Some(path) => save_output(Path::new(path), &output, config.format)?,
        None => {
            println!("{}", output);
            eprintln!("{} Done", Color::Green.paint("INFO"));
        }
    }

    Ok(())
}

/// Read a document from markup or from a serialized tree.
pub fn read(input: &str, format: Input) -> Result<Block, String> {
    match format {
        Input::Markup => markup::parse_document(input).map_err(|e| format!("Markup error: {}", e)),
        Input::Json => serde_json::from_str(input)
            .map_err(|e| format!("error deserializing the JSON tree—{}", e)),
    }
}

/// Write a tree in the requested format.
pub fn write(block: &Block, format: Output) -> Result<String, String> {
    debug!(slog_scope::logger(), "Writing output as {:?}", format);
    match format {
        Output::Html => Ok(render::render(block)),
        Output::Json => serde_json::to_string_pretty(block)
            .map_err(|e| format!("error serializing the tree as JSON—{}", e)),
        Output::Yaml => serde_yaml::to_string(block)
            .map_err(|e| format!("error serializing the tree as YAML—{}", e)),
        Output::Ron => ron::ser::to_string_pretty(block, ron::ser::PrettyConfig::default())
            .map_err(|e| format!("error serializing the tree as RON—{}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    const DOCUMENT: &str = r#######"
Footnotes{{reference}}First **note**.{{/reference}} can repeat{{reference}}First **note**.{{/reference}}
and differ.{{reference}}Second note.{{/reference}}

{{references/}}
"#######;

    const DOCUMENT_TARGET: &str = r#######"<p>Footnotes<sup class="footnoteRef" id="x_reference_pre_1a"><a href="#x_reference_1a">1</a></sup> can repeat<sup class="footnoteRef" id="x_reference_pre_1b"><a href="#x_reference_1b">1</a></sup><br/>and differ.<sup class="footnoteRef" id="x_reference_pre_2^"><a href="#x_reference_2^">2</a></sup></p>
<ol class="references"><li class="reference"><sup class="footnoteBackRef" id="x_reference_1a"><a href="#x_reference_pre_1a">a </a></sup><sup class="footnoteBackRef" id="x_reference_1b"><a href="#x_reference_pre_1b">b </a></sup> First <strong>note</strong>.</li>
<li class="reference"><sup class="footnoteBackRef" id="x_reference_2^"><a href="#x_reference_pre_2^">^ </a></sup> Second note.</li>
</ol>
"#######;

    fn run(input: &str) -> Block {
        let mut tree = Tree::from_block(read(input, Input::Markup).unwrap());
        transform::transform(&mut tree, &MarkupParser).unwrap();
        tree.to_block(tree.root())
    }

    #[test]
    fn html() {
        let output = write(&run(DOCUMENT), Output::Html).unwrap();
        let target_lines: Vec<&str> = DOCUMENT_TARGET.lines().collect();

        assert_eq!(output.lines().count(), target_lines.len());
        for (i, line) in output.lines().enumerate() {
            assert_eq!(line, target_lines[i])
        }
    }

    #[test]
    fn json_tree_input() {
        let json = write(&read(DOCUMENT, Input::Markup).unwrap(), Output::Json).unwrap();
        let block = run_json(&json);

        assert_eq!(write(&block, Output::Html).unwrap(), DOCUMENT_TARGET);
    }

    fn run_json(json: &str) -> Block {
        let mut tree = Tree::from_block(read(json, Input::Json).unwrap());
        transform::transform(&mut tree, &MarkupParser).unwrap();
        tree.to_block(tree.root())
    }

    #[test]
    fn other_formats() {
        let block = run(DOCUMENT);

        let yaml = write(&block, Output::Yaml).unwrap();
        assert!(yaml.contains("type: numbered_list"));

        let ron = write(&block, Output::Ron).unwrap();
        assert!(ron.contains("numbered_list"));
    }

    #[test]
    fn bad_json() {
        assert!(read("{", Input::Json).is_err());
    }

    #[test]
    fn bad_markup() {
        let err = read("{{reference}}open", Input::Markup).unwrap_err();

        assert!(err.starts_with("Markup error"));
    }

    #[test]
    fn untransformed() {
        let block = read(DOCUMENT, Input::Markup).unwrap();

        assert_eq!(block.kind, NodeKind::Document);
        assert_eq!(
            write(&block, Output::Html).unwrap(),
            "<p>Footnotes can repeat<br/>and differ.</p>\n"
        );
    }
}
