//! This module contains the document tree.
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`]. A node
//! that is detached from its parent keeps its id, so a list of ids collected
//! before a series of edits stays usable for the whole series. Owned,
//! nested [`Block`]s are used to move subtrees in and out of the arena (the
//! parser produces them, the renderer and the serializers consume them).

use serde::{Deserialize, Serialize};
use slog::trace;
use std::collections::BTreeMap;

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Inline formatting styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Bold,
    Italic,
    Underline,
    Superscript,
    Subscript,
}

/// A macro invocation, either pending or already executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub inline: bool,
}

impl MacroCall {
    pub fn new(name: &str, content: Option<&str>, inline: bool) -> MacroCall {
        MacroCall {
            name: name.to_string(),
            params: BTreeMap::new(),
            content: content.map(str::to_string),
            inline,
        }
    }
}

/// The kinds of nodes in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Paragraph,
    Word { text: String },
    Space,
    NewLine,
    Format { format: Format },
    Link { anchor: String },
    NumberedList,
    ListItem,
    Group,
    /// A macro that has not run yet.
    Macro(MacroCall),
    /// A macro that has run. Its children are whatever it produced.
    MacroMarker(MacroCall),
}

impl NodeKind {
    /// Leaf kinds never hold children.
    pub fn accepts_children(&self) -> bool {
        !matches!(
            self,
            NodeKind::Word { .. } | NodeKind::Space | NodeKind::NewLine
        )
    }

    /// The raw, unparsed content of a macro node.
    pub fn content(&self) -> Option<&str> {
        match self {
            NodeKind::Macro(call) | NodeKind::MacroMarker(call) => call.content.as_deref(),
            _ => None,
        }
    }

    /// The macro call carried by this node, executed or not.
    pub fn macro_call(&self) -> Option<&MacroCall> {
        match self {
            NodeKind::Macro(call) | NodeKind::MacroMarker(call) => Some(call),
            _ => None,
        }
    }
}

/// An owned subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(kind: NodeKind) -> Block {
        Block {
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn word(text: &str) -> Block {
        Block::new(NodeKind::Word {
            text: text.to_string(),
        })
    }

    pub fn space() -> Block {
        Block::new(NodeKind::Space)
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Block {
        self.children = children;
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Block {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

/// A node stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub attributes: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, attributes: BTreeMap<String, String>) -> Node {
        Node {
            kind,
            attributes,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// The document tree.
///
/// Ids handed out by one tree must not be used with another; doing so
/// panics or addresses the wrong node.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}

impl Tree {
    /// Create a tree holding an empty document.
    pub fn new() -> Tree {
        Tree {
            nodes: vec![Node::new(NodeKind::Document, BTreeMap::new())],
            root: NodeId(0),
        }
    }

    /// Build a tree whose root is the given block.
    pub fn from_block(block: Block) -> Tree {
        let mut tree = Tree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.graft(block);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Copy a block into the arena as a detached subtree and return its root.
    pub fn graft(&mut self, block: Block) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(block.kind, block.attributes));
        for child in block.children {
            let child_id = self.graft(child);
            self.append_child(id, child_id);
        }
        id
    }

    /// Export a subtree as an owned block.
    pub fn to_block(&self, id: NodeId) -> Block {
        let node = self.get(id);
        Block {
            kind: node.kind.clone(),
            attributes: node.attributes.clone(),
            children: node
                .children
                .iter()
                .map(|&child| self.to_block(child))
                .collect(),
        }
    }

    /// Add `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Replace `old` inside its parent with `new`, in order.
    ///
    /// Returns `false` (and changes nothing) when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, new: Vec<NodeId>) -> bool {
        let parent = match self.nodes[old.0].parent {
            Some(p) => p,
            None => return false,
        };
        for &id in &new {
            self.detach(id);
        }
        let position = match self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == old)
        {
            Some(p) => p,
            None => return false,
        };
        trace!(
            slog_scope::logger(),
            "Replacing node {:?} with {} node(s)",
            old,
            new.len()
        );
        for &id in &new {
            self.nodes[id.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(position..position + 1, new);
        self.nodes[old.0].parent = None;
        true
    }

    /// Remove a node from its parent. The node itself stays in the arena.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.replace(id, Vec::new())
    }

    /// Replace every child of `parent` with `children`.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for old in std::mem::take(&mut self.nodes[parent.0].children) {
            self.nodes[old.0].parent = None;
        }
        for child in children {
            self.append_child(parent, child);
        }
    }

    /// All descendants of `start` in document (depth-first, pre-) order,
    /// excluding `start` itself.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut output = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[start.0].children.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            output.push(id);
            // Push children in reverse so they come off left to right
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push(child);
            }
        }

        output
    }

    /// First descendant of `start` matching the predicate.
    pub fn find_first<F>(&self, start: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(start)
            .into_iter()
            .find(|&id| predicate(self.get(id)))
    }

    /// Every descendant of `start` matching the predicate, in document order.
    pub fn find_all<F>(&self, start: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(start)
            .into_iter()
            .filter(|&id| predicate(self.get(id)))
            .collect()
    }

    /// Whether the node can be reached from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }
}
