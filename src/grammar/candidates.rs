//! Completion candidates: what may legally follow a partial input
//!
//! [`Node::candidates`] walks the same tree as [`Node::match_tokens`] and
//! reports a position in the input together with the nodes that could
//! continue it. A sequence reports where its own walk stopped, so members
//! skipped on the way contribute candidates alongside the member that failed.

use std::fmt;

use super::node::{Node, NodeKind};
use super::token::Token;

/// A node that could appear next in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub kind: NodeKind,
    pub label: Option<&'static str>,
}

impl Expected {
    pub fn new(kind: NodeKind, label: Option<&'static str>) -> Self {
        Self { kind, label }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => f.write_str(label),
            None => f.write_str(self.kind.name()),
        }
    }
}

/// Char offset of `tokens[index]`, or of the end of input past the last token
pub(crate) fn position_at(tokens: &[Token], index: usize) -> usize {
    if let Some(token) = tokens.get(index) {
        return token.pos;
    }
    match tokens.last() {
        Some(last) if last.is_end() => last.pos,
        Some(last) => last.pos + last.text.chars().count(),
        None => 0,
    }
}

fn merge(into: &mut Vec<Expected>, from: Vec<Expected>) {
    for expected in from {
        if !into.contains(&expected) {
            into.push(expected);
        }
    }
}

impl Node {
    /// Compute what could follow a prefix of the input.
    ///
    /// # Arguments
    /// * `tokens` - Tokens typed so far
    ///
    /// # Returns
    /// * `(usize, Vec<Expected>)` - Char position where the walk stopped and the nodes expected there
    pub fn candidates(&self, tokens: &[Token]) -> (usize, Vec<Expected>) {
        if self.is_leaf() {
            return self.leaf_candidates(tokens);
        }

        match self {
            Node::Seq(nodes) => {
                let mut index = 0;
                let mut expected = Vec::new();

                for node in nodes {
                    let rest = &tokens[index..];
                    match node.match_tokens(rest) {
                        None => {
                            merge(&mut expected, node.candidates(rest).1);
                            break;
                        }
                        // skipped member: still a valid continuation here
                        Some((_, 0)) => merge(&mut expected, node.candidates(rest).1),
                        Some((_, consumed)) => {
                            expected.clear();
                            index += consumed;
                        }
                    }
                }

                (position_at(tokens, index), expected)
            }
            Node::Alt(nodes) => {
                let mut best = 0;
                let mut expected = Vec::new();
                for node in nodes {
                    let (reached, found) = node.candidates(tokens);
                    if reached > best {
                        best = reached;
                        expected = found;
                    } else if reached == best {
                        merge(&mut expected, found);
                    }
                }
                (best, expected)
            }
            Node::Optional(inner) | Node::Repeat(inner) => inner.candidates(tokens),
            Node::Composite(composite) => composite.inner.candidates(tokens),
            Node::Primitive(_) => self.leaf_candidates(tokens),
        }
    }

    fn leaf_candidates(&self, tokens: &[Token]) -> (usize, Vec<Expected>) {
        match self.match_tokens(tokens) {
            Some((_, consumed)) => (position_at(tokens, consumed), Vec::new()),
            None => (
                position_at(tokens, 0),
                vec![Expected::new(self.kind(), self.label())],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::node::{Matched, Primitive};
    use crate::grammar::token::tokenize;

    fn keyword(word: &'static str) -> Node {
        Node::leaf(NodeKind::Literal, Some(word), Primitive::Word, |c, m| match m {
            Matched::Word(w) if Some(w.as_str()) == c.label => {
                Some(Matched::Keyword(c.kind, c.label.unwrap_or_default()))
            }
            _ => None,
        })
    }

    fn lit(word: &'static str) -> Expected {
        Expected::new(NodeKind::Literal, Some(word))
    }

    #[test]
    fn test_leaf_candidates() {
        let node = keyword("get");
        assert_eq!(node.candidates(&tokenize("")), (0, vec![lit("get")]));
        assert_eq!(node.candidates(&tokenize("get ")), (4, vec![]));
    }

    #[test]
    fn test_seq_stops_at_failing_member() {
        let node = Node::seq(vec![keyword("a"), keyword("b"), keyword("c")]);
        assert_eq!(node.candidates(&tokenize("a ")), (2, vec![lit("b")]));
        assert_eq!(node.candidates(&tokenize("a x")), (2, vec![lit("b")]));
    }

    #[test]
    fn test_seq_skipped_optional_still_suggested() {
        let node = Node::seq(vec![
            keyword("a"),
            Node::optional(keyword("b")),
            keyword("c"),
        ]);
        assert_eq!(
            node.candidates(&tokenize("a ")),
            (2, vec![lit("b"), lit("c")])
        );
    }

    #[test]
    fn test_seq_trailing_optional() {
        let node = Node::seq(vec![keyword("a"), Node::optional(keyword("b"))]);
        assert_eq!(node.candidates(&tokenize("a ")), (2, vec![lit("b")]));
        assert_eq!(node.candidates(&tokenize("a b")), (3, vec![]));
    }

    #[test]
    fn test_seq_reports_walk_position_for_partial_skipped_member() {
        let node = Node::seq(vec![
            keyword("alias"),
            Node::optional(Node::alt(vec![
                Node::seq(vec![keyword("-delete"), keyword("name")]),
                keyword("other"),
            ])),
        ]);
        assert_eq!(
            node.candidates(&tokenize("alias -delete ")),
            (6, vec![lit("name")])
        );
    }

    #[test]
    fn test_seq_unions_skipped_member_with_next() {
        let node = Node::seq(vec![
            keyword("a"),
            Node::optional(Node::seq(vec![keyword("b"), keyword("c")])),
            keyword("d"),
        ]);
        assert_eq!(
            node.candidates(&tokenize("a b ")),
            (2, vec![lit("c"), lit("d")])
        );
    }

    #[test]
    fn test_alt_keeps_furthest() {
        let node = Node::alt(vec![
            Node::seq(vec![keyword("a"), keyword("b")]),
            Node::seq(vec![keyword("x"), keyword("y")]),
        ]);
        assert_eq!(node.candidates(&tokenize("a ")), (2, vec![lit("b")]));
        assert_eq!(
            node.candidates(&tokenize("")),
            (0, vec![lit("a"), lit("x")])
        );
    }

    #[test]
    fn test_alt_union_at_tie() {
        let node = Node::alt(vec![
            Node::seq(vec![keyword("a"), keyword("b")]),
            Node::seq(vec![keyword("a"), keyword("c")]),
        ]);
        assert_eq!(
            node.candidates(&tokenize("a ")),
            (2, vec![lit("b"), lit("c")])
        );
    }

    #[test]
    fn test_alt_union_deduplicates() {
        let node = Node::alt(vec![keyword("a"), keyword("a")]);
        assert_eq!(node.candidates(&tokenize("")), (0, vec![lit("a")]));
    }

    #[test]
    fn test_repeat_delegates() {
        let node = Node::seq(vec![keyword("get"), Node::repeat(keyword("x"))]);
        assert_eq!(node.candidates(&tokenize("get ")), (4, vec![lit("x")]));
        assert_eq!(node.candidates(&tokenize("get x x")), (7, vec![]));
    }

    #[test]
    fn test_composite_over_combinator_delegates() {
        let pair = Node::composite(
            NodeKind::Eoj,
            None,
            Node::seq(vec![keyword("a"), keyword("b")]),
            |_, m| Some(m),
        );
        assert_eq!(pair.candidates(&tokenize("")), (0, vec![lit("a")]));
        assert_eq!(pair.candidates(&tokenize("a ")), (2, vec![lit("b")]));
    }

    #[test]
    fn test_primitive_candidates() {
        let colon = Node::Primitive(Primitive::Colon);
        assert_eq!(
            colon.candidates(&tokenize("x")),
            (0, vec![Expected::new(NodeKind::Colon, None)])
        );
        assert_eq!(colon.candidates(&tokenize(":")), (1, vec![]));
    }

    #[test]
    fn test_position_past_end() {
        let tokens = vec![Token::word(0, "ab")];
        assert_eq!(position_at(&tokens, 1), 2);
        assert_eq!(position_at(&[], 0), 0);
        assert_eq!(position_at(&tokenize("ab  "), 5), 4);
    }

    #[test]
    fn test_expected_display() {
        assert_eq!(lit("get").to_string(), "get");
        assert_eq!(Expected::new(NodeKind::Epc, None).to_string(), "EPC");
    }
}
