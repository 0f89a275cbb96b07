//! The `references` macro.
//!
//! Collects every footnote occurrence in the document, merges occurrences
//! with the same content into one numbered reference, turns each occurrence
//! into a superscript link to its reference, and renders the numbered list of
//! references (each with links back to its occurrences) at the collection
//! point.

use crate::macros::reference::REFERENCE_MACRO;
use crate::macros::{ContentParser, Macro, MacroContext};
use crate::tree::{Block, Format, Node, NodeId, NodeKind, Tree};
use slog::{debug, o, trace, warn};
use std::collections::BTreeMap;
use std::fmt;

pub const REFERENCES_MACRO: &str = "references";

const ID_ATTRIBUTE: &str = "id";
const CLASS_ATTRIBUTE: &str = "class";

/// Prefix for the ids of the back links in the list.
const FOOTNOTE_ID_PREFIX: &str = "x_reference_";
/// Prefix for the ids of the forward links in the text.
const FOOTNOTE_REFERENCE_ID_PREFIX: &str = "x_reference_pre_";

const LIST_CLASS: &str = "references";
const ITEM_CLASS: &str = "reference";
const FORWARD_LINK_CLASS: &str = "footnoteRef";
const BACK_LINK_CLASS: &str = "footnoteBackRef";

/// An executed `reference` macro.
pub fn is_footnote_occurrence(node: &Node) -> bool {
    matches!(&node.kind, NodeKind::MacroMarker(call) if call.name == REFERENCE_MACRO)
}

/// A `references` macro, pending or executed.
pub fn is_collection_point(node: &Node) -> bool {
    node.kind
        .macro_call()
        .map_or(false, |call| call.name == REFERENCES_MACRO)
}

/// Disambiguates the occurrences of one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// The reference occurs only once.
    Single,
    /// Zero-based position among several occurrences: `a`, `b`, ... `z`,
    /// `aa`, `ab`, ...
    Letter(usize),
}

impl Label {
    /// Labels for `count` occurrences of one reference.
    pub fn for_occurrences(count: usize) -> Vec<Label> {
        match count {
            1 => vec![Label::Single],
            _ => (0..count).map(Label::Letter).collect(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Single => write!(f, "^"),
            Label::Letter(index) => {
                let mut letters = Vec::new();
                let mut n = index + 1;
                while n > 0 {
                    n -= 1;
                    letters.push((b'a' + (n % 26) as u8) as char);
                    n /= 26;
                }
                let letters: String = letters.iter().rev().collect();
                write!(f, "{}", letters)
            }
        }
    }
}

/// Occurrences sharing the same content.
#[derive(Debug, PartialEq, Eq)]
struct Reference {
    id: usize,
    content: String,
    occurrences: Vec<NodeId>,
}

impl Reference {
    fn anchor(&self, prefix: &str, label: Label) -> String {
        format!("{}{}{}", prefix, self.id, label)
    }
}

/// The rendered list and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// The surviving collection point, if the document has one.
    pub collection_point: Option<NodeId>,
    pub list: Block,
}

/// Blank content is kept as a single space.
fn normalize_content(content: Option<&str>) -> String {
    match content {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        _ => " ".to_string(),
    }
}

/// Collect the occurrences, rewrite them into forward links, and build the
/// list of references.
///
/// Extra collection points after the first are removed. Returns `None`, with
/// the occurrences untouched, when the document has no occurrences.
pub fn collect_references(tree: &mut Tree, parser: &dyn ContentParser) -> Option<Collection> {
    debug!(slog_scope::logger(), "Collecting references...");

    // Every edit below goes through this list, never through a live walk
    let matches = tree.find_all(tree.root(), |node| {
        is_footnote_occurrence(node) || is_collection_point(node)
    });

    let mut collection_point = None;
    let mut occurrences = Vec::new();
    for id in matches {
        if is_footnote_occurrence(tree.get(id)) {
            occurrences.push(id);
        } else if collection_point.is_none() {
            collection_point = Some(id);
        } else {
            debug!(
                slog_scope::logger(),
                "Removing extra collection point {:?}", id
            );
            tree.remove(id);
        }
    }

    if occurrences.is_empty() {
        debug!(slog_scope::logger(), "No references found.");
        return None;
    }

    let references = slog_scope::scope(
        &slog_scope::logger().new(o!("fn" => "group_references()")),
        || group_references(tree, &occurrences),
    );
    debug!(
        slog_scope::logger(),
        "{} occurrence(s) grouped into {} reference(s)",
        occurrences.len(),
        references.len()
    );

    for reference in &references {
        add_forward_links(tree, reference);
    }

    let items = references
        .iter()
        .map(|reference| list_item(reference, parser))
        .collect();
    let list = Block::new(NodeKind::NumberedList)
        .with_attribute(CLASS_ATTRIBUTE, LIST_CLASS)
        .with_children(items);

    debug!(slog_scope::logger(), "References collected.");
    Some(Collection {
        collection_point,
        list,
    })
}

/// Collect the references and put the list in place of the collection point.
///
/// Returns the id of the inserted list. Without a collection point the list
/// is dropped, while the occurrences are still rewritten.
pub fn render_references(tree: &mut Tree, parser: &dyn ContentParser) -> Option<NodeId> {
    let collection = collect_references(tree, parser)?;

    match collection.collection_point {
        Some(point) => {
            let list = tree.graft(collection.list);
            tree.replace(point, vec![list]);
            Some(list)
        }
        None => {
            debug!(
                slog_scope::logger(),
                "No collection point; the list of references is not rendered"
            );
            None
        }
    }
}

/// Group occurrences by content, numbering groups by first appearance.
fn group_references(tree: &Tree, occurrences: &[NodeId]) -> Vec<Reference> {
    let mut references: Vec<Reference> = Vec::new();

    for &occurrence in occurrences {
        let content = normalize_content(tree.get(occurrence).kind.content());

        match references.iter().position(|r| r.content == content) {
            Some(index) => references[index].occurrences.push(occurrence),
            None => {
                let id = references.len() + 1;
                trace!(
                    slog_scope::logger(),
                    "New reference {} with content {:?}",
                    id,
                    content
                );
                references.push(Reference {
                    id,
                    content,
                    occurrences: vec![occurrence],
                });
            }
        }
    }

    references
}

/// Replace the children of each occurrence with a link to the reference.
fn add_forward_links(tree: &mut Tree, reference: &Reference) {
    let labels = Label::for_occurrences(reference.occurrences.len());

    for (&occurrence, label) in reference.occurrences.iter().zip(labels) {
        let link = Block::new(NodeKind::Format {
            format: Format::Superscript,
        })
        .with_attribute(
            ID_ATTRIBUTE,
            &reference.anchor(FOOTNOTE_REFERENCE_ID_PREFIX, label),
        )
        .with_attribute(CLASS_ATTRIBUTE, FORWARD_LINK_CLASS)
        .with_children(vec![Block::new(NodeKind::Link {
            anchor: reference.anchor(FOOTNOTE_ID_PREFIX, label),
        })
        .with_children(vec![Block::word(&reference.id.to_string())])]);

        let link = tree.graft(link);
        tree.set_children(occurrence, vec![link]);
    }
}

/// Build the list entry: the back links, a space, then the content.
fn list_item(reference: &Reference, parser: &dyn ContentParser) -> Block {
    let labels = Label::for_occurrences(reference.occurrences.len());

    let mut children: Vec<Block> = labels
        .into_iter()
        .map(|label| {
            Block::new(NodeKind::Format {
                format: Format::Superscript,
            })
            .with_attribute(ID_ATTRIBUTE, &reference.anchor(FOOTNOTE_ID_PREFIX, label))
            .with_attribute(CLASS_ATTRIBUTE, BACK_LINK_CLASS)
            .with_children(vec![Block::new(NodeKind::Link {
                anchor: reference.anchor(FOOTNOTE_REFERENCE_ID_PREFIX, label),
            })
            .with_children(vec![Block::word(&label.to_string()), Block::space()])])
        })
        .collect();

    children.push(Block::space());
    children.extend(parse_content(&reference.content, parser));

    Block::new(NodeKind::ListItem)
        .with_attribute(CLASS_ATTRIBUTE, ITEM_CLASS)
        .with_children(children)
}

/// Parse reference content, falling back to the raw text.
fn parse_content(content: &str, parser: &dyn ContentParser) -> Vec<Block> {
    match parser.parse(content, true, true) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(
                slog_scope::logger(),
                "Could not parse reference {:?}, keeping it as text: {}", content, e
            );
            vec![Block::word(content)]
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferencesMacro;

impl Macro for ReferencesMacro {
    fn name(&self) -> &'static str {
        REFERENCES_MACRO
    }

    fn supports_inline_mode(&self) -> bool {
        false
    }

    fn execute(
        &self,
        _params: &BTreeMap<String, String>,
        _content: Option<&str>,
        context: &mut MacroContext,
    ) -> Result<Vec<Block>, String> {
        let collection = match collect_references(context.tree, context.parser) {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        match collection.collection_point {
            // The usual case: this macro is the first collection point
            Some(point) if point == context.site => Ok(vec![collection.list]),
            Some(point) => {
                let list = context.tree.graft(collection.list);
                context.tree.replace(point, vec![list]);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}
