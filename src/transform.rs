//! Runs the macros of a document.
//!
//! Macros are executed one at a time: the pending macro with the lowest
//! priority goes first, ties going to the earliest in the document. After
//! each execution the tree is searched again, since a macro may add, move,
//! or remove other macros.

use crate::macros::{lookup, ContentParser, MacroContext, DEFAULT_PRIORITY};
use crate::tree::{Block, NodeId, NodeKind, Tree};
use slog::{debug, o, trace, warn};

/// Upper bound on expanding executions for one document. An execution is
/// expanding when it leaves at least as many macros pending as before it ran.
pub const MAX_EXPANSIONS: usize = 1000;

const ERROR_CLASS: &str = "macro-error";

/// Execute every macro in the tree. Returns the number of macros executed.
pub fn transform(tree: &mut Tree, parser: &dyn ContentParser) -> Result<usize, String> {
    debug!(slog_scope::logger(), "Starting macro transformation...");

    let mut executed = 0;
    let mut expansions = 0;
    let mut pending = pending_macros(tree);

    while let Some(site) = next_macro(tree, &pending) {
        slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "execute_macro()")),
            || execute_macro(tree, site, parser),
        );
        executed += 1;

        let before = pending.len();
        pending = pending_macros(tree);
        if pending.len() >= before {
            expansions += 1;
            trace!(
                slog_scope::logger(),
                "Expansion {}: {} macro(s) pending",
                expansions,
                pending.len()
            );
            if expansions > MAX_EXPANSIONS {
                return Err(format!(
                    "stopped after {} macro executions; a macro keeps producing macros",
                    executed
                ));
            }
        }
    }

    debug!(
        slog_scope::logger(),
        "Macro transformation completed ({} executed).", executed
    );
    Ok(executed)
}

fn pending_macros(tree: &Tree) -> Vec<NodeId> {
    tree.find_all(tree.root(), |node| matches!(node.kind, NodeKind::Macro(_)))
}

/// The pending macro to run next.
fn next_macro(tree: &Tree, pending: &[NodeId]) -> Option<NodeId> {
    pending.iter().copied().min_by_key(|&id| priority(tree, id))
}

fn priority(tree: &Tree, id: NodeId) -> i32 {
    tree.get(id)
        .kind
        .macro_call()
        .and_then(|call| lookup(&call.name))
        .map_or(DEFAULT_PRIORITY, |m| m.priority())
}

/// Run one macro and turn it into a marker holding its output.
///
/// Failures are shown in the document instead of stopping the
/// transformation.
fn execute_macro(tree: &mut Tree, site: NodeId, parser: &dyn ContentParser) {
    let call = match &tree.get(site).kind {
        NodeKind::Macro(call) => call.clone(),
        _ => return,
    };
    trace!(slog_scope::logger(), "Executing macro {:?}", call.name);

    let output = match lookup(&call.name) {
        None => Err(format!("Unknown macro: {}", call.name)),
        Some(m) if call.inline && !m.supports_inline_mode() => Err(format!(
            "The [{}] macro is a standalone macro and it cannot be used inline",
            call.name
        )),
        Some(m) => {
            let mut context = MacroContext {
                tree: &mut *tree,
                site,
                parser,
            };
            m.execute(&call.params, call.content.as_deref(), &mut context)
        }
    };

    let output = match output {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(slog_scope::logger(), "Macro {:?} failed: {}", call.name, e);
            vec![Block::new(NodeKind::Group)
                .with_attribute("class", ERROR_CLASS)
                .with_children(vec![Block::word(&e)])]
        }
    };

    let children: Vec<NodeId> = output.into_iter().map(|b| tree.graft(b)).collect();
    tree.get_mut(site).kind = NodeKind::MacroMarker(call);
    tree.set_children(site, children);
}
