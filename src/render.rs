//! This module contains functionality for rendering the output as HTML.

use crate::tree::{Block, Format, NodeKind};
use slog::{debug, trace};
use std::collections::BTreeMap;

/// The main render function.
///
/// Sends the block to [`render_block`], which calls itself for the block's
/// children.
pub fn render(block: &Block) -> String {
    debug!(slog_scope::logger(), "Beginning rendering...");

    let mut output = String::new();
    render_block(block, &mut output);

    debug!(slog_scope::logger(), "Rendering complete");
    output
}

/// Renders a block and its children into `output`.
fn render_block(block: &Block, output: &mut String) {
    trace!(slog_scope::logger(), "Rendering block {:?}...", block.kind);

    match &block.kind {
        NodeKind::Document | NodeKind::MacroMarker(_) => render_children(block, output),
        // A macro that never ran has nothing to show
        NodeKind::Macro(_) => {}
        NodeKind::Word { text } => output.push_str(&escape(text)),
        NodeKind::Space => output.push(' '),
        NodeKind::NewLine => output.push_str("<br/>"),
        NodeKind::Paragraph => element("p", block, output, true),
        NodeKind::Format { format } => {
            let tag = match format {
                Format::Bold => "strong",
                Format::Italic => "em",
                Format::Underline => "ins",
                Format::Superscript => "sup",
                Format::Subscript => "sub",
            };
            element(tag, block, output, false);
        }
        NodeKind::Link { anchor } => {
            output.push_str("<a href=\"#");
            output.push_str(&escape(anchor));
            output.push('"');
            push_attributes(&block.attributes, output);
            output.push('>');
            render_children(block, output);
            output.push_str("</a>");
        }
        NodeKind::NumberedList => element("ol", block, output, true),
        NodeKind::ListItem => element("li", block, output, true),
        NodeKind::Group => element("div", block, output, true),
    }
}

fn render_children(block: &Block, output: &mut String) {
    for child in &block.children {
        render_block(child, output);
    }
}

/// Renders a block as an element. Block-level elements end with a newline.
fn element(tag: &str, block: &Block, output: &mut String, block_level: bool) {
    output.push('<');
    output.push_str(tag);
    push_attributes(&block.attributes, output);
    output.push('>');
    render_children(block, output);
    output.push_str("</");
    output.push_str(tag);
    output.push('>');
    if block_level {
        output.push('\n');
    }
}

fn push_attributes(attributes: &BTreeMap<String, String>, output: &mut String) {
    for (key, value) in attributes {
        output.push_str(&format!(" {}=\"{}\"", key, escape(value)));
    }
}

fn escape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
    output
}
