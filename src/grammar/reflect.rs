//! Walking the grammar tree
//!
//! Help text and completion vocabularies are derived from the grammar itself
//! through these walkers instead of being maintained by hand.

use super::node::{Node, NodeKind};
use crate::error::GrammarError;

/// Visit every node in pre-order.
///
/// Composites are visited but not descended into, so the walk yields the
/// vocabulary of the grammar rather than the recognisers behind it.
/// The first visitor error stops the walk and is returned.
pub fn traverse<E, F>(node: &Node, visit: &mut F) -> Result<(), E>
where
    F: FnMut(&Node) -> Result<(), E>,
{
    visit(node)?;
    match node {
        Node::Alt(nodes) | Node::Seq(nodes) => {
            for child in nodes {
                traverse(child, visit)?;
            }
            Ok(())
        }
        Node::Optional(inner) | Node::Repeat(inner) => traverse(inner, visit),
        Node::Primitive(_) | Node::Composite(_) => Ok(()),
    }
}

/// Collect the labels of every node of the given kind, in tree order.
///
/// # Arguments
/// * `root` - Grammar root
/// * `kind` - Kind to look for
///
/// # Returns
/// * `Result<Vec<&'static str>, GrammarError>` - Labels, or an error for a node of that kind without one
pub fn collect_strings(root: &Node, kind: NodeKind) -> Result<Vec<&'static str>, GrammarError> {
    let mut labels = Vec::new();
    traverse(root, &mut |node: &Node| {
        if node.kind() != kind {
            return Ok(());
        }
        match node {
            Node::Composite(composite) => match composite.label {
                Some(label) => {
                    labels.push(label);
                    Ok(())
                }
                None => Err(GrammarError::MissingLabel(kind.to_string())),
            },
            _ => Err(GrammarError::MissingLabel(kind.to_string())),
        }
    })?;
    Ok(labels)
}
