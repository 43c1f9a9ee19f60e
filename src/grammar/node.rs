//! Grammar node combinators and the Match contract
//!
//! A grammar is a tree of [`Node`] values built once and never mutated.
//! Structural nodes (`Alt`, `Seq`, `Optional`, `Repeat`) combine other nodes,
//! [`Primitive`] nodes recognise raw tokens, and a [`Composite`] attaches a
//! kind, a label and a conversion to an inner node. A composite over a
//! primitive is a leaf of the command vocabulary (a keyword, an EPC, ...).

use std::fmt;
use std::net::IpAddr;

use super::token::{Token, TokenKind};
use crate::device::{ClassCode, Epc};

/// Kind tag carried by every node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Alt,
    Seq,
    Optional,
    Repeat,
    Word,
    Colon,
    ColonWord,
    Command,
    Literal,
    IpAddress,
    ClassCode,
    InstanceCode,
    Eoj,
    DeviceAlias,
    AliasName,
    GroupName,
    DeviceSpecifier,
    Epc,
    PropertyValue,
    PropertyValueAlias,
    PropertyAlias,
    Property,
    ListOption,
    GroupBy,
    GetOption,
    UpdateOption,
    DeleteOption,
    GroupAction,
    OnOff,
    HelpTopic,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Alt => "Alt",
            NodeKind::Seq => "Seq",
            NodeKind::Optional => "Optional",
            NodeKind::Repeat => "Repeat",
            NodeKind::Word => "Word",
            NodeKind::Colon => "Colon",
            NodeKind::ColonWord => "ColonWord",
            NodeKind::Command => "Command",
            NodeKind::Literal => "Literal",
            NodeKind::IpAddress => "IPAddress",
            NodeKind::ClassCode => "ClassCode",
            NodeKind::InstanceCode => "InstanceCode",
            NodeKind::Eoj => "EOJ",
            NodeKind::DeviceAlias => "DeviceAlias",
            NodeKind::AliasName => "AliasName",
            NodeKind::GroupName => "GroupName",
            NodeKind::DeviceSpecifier => "DeviceSpecifier",
            NodeKind::Epc => "EPC",
            NodeKind::PropertyValue => "PropertyValue",
            NodeKind::PropertyValueAlias => "PropertyValueAlias",
            NodeKind::PropertyAlias => "PropertyAlias",
            NodeKind::Property => "Property",
            NodeKind::ListOption => "ListOption",
            NodeKind::GroupBy => "GroupBy",
            NodeKind::GetOption => "GetOption",
            NodeKind::UpdateOption => "UpdateOption",
            NodeKind::DeleteOption => "DeleteOption",
            NodeKind::GroupAction => "GroupAction",
            NodeKind::OnOff => "OnOff",
            NodeKind::HelpTopic => "HelpTopic",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw token recognisers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Any word token
    Word,
    /// A single colon token
    Colon,
    /// A colon immediately followed by a word
    ColonWord,
}

/// Conversion applied by a composite to its inner match result.
/// Returning `None` turns the match into a non-match.
pub type Build = fn(&Composite, Matched) -> Option<Matched>;

/// A node paired with a kind, a label and a result conversion
#[derive(Clone)]
pub struct Composite {
    pub kind: NodeKind,
    pub label: Option<&'static str>,
    pub inner: Box<Node>,
    pub build: Build,
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Grammar tree node
#[derive(Debug, Clone)]
pub enum Node {
    Alt(Vec<Node>),
    Seq(Vec<Node>),
    Optional(Box<Node>),
    Repeat(Box<Node>),
    Primitive(Primitive),
    Composite(Composite),
}

/// Device address as written on the command line, before any lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceArg {
    Address {
        ip: Option<IpAddr>,
        class_code: Option<ClassCode>,
        instance_code: Option<u16>,
    },
    Alias(String),
    Group(String),
}

/// Property as written on the command line, before any lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyArg {
    /// `EPC:hex`
    Raw { epc: Epc, edt: Vec<u8> },
    /// `EPC:valueAlias`
    ValueAlias { epc: Epc, alias: String },
    /// A property alias such as `on`
    Alias(String),
}

/// Result of a successful match, shaped like the node that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matched {
    Seq(Vec<Matched>),
    Skipped,
    Repeat(Vec<Matched>),
    Word(String),
    Colon,
    Keyword(NodeKind, &'static str),
    Name(NodeKind, String),
    Ip(IpAddr),
    ClassCode(ClassCode),
    /// Raw instance code; range checking happens when a command is built
    InstanceCode(u16),
    Eoj {
        class_code: ClassCode,
        instance_code: Option<u16>,
    },
    Device(DeviceArg),
    Epc(Epc),
    Edt(Vec<u8>),
    Property(PropertyArg),
    GroupBy(Epc),
}

impl Node {
    pub fn alt(nodes: Vec<Node>) -> Self {
        Node::Alt(nodes)
    }

    pub fn seq(nodes: Vec<Node>) -> Self {
        Node::Seq(nodes)
    }

    pub fn optional(node: Node) -> Self {
        Node::Optional(Box::new(node))
    }

    pub fn repeat(node: Node) -> Self {
        Node::Repeat(Box::new(node))
    }

    /// A leaf: a primitive recogniser wrapped with kind, label and conversion
    pub fn leaf(kind: NodeKind, label: Option<&'static str>, inner: Primitive, build: Build) -> Self {
        Self::composite(kind, label, Node::Primitive(inner), build)
    }

    pub fn composite(kind: NodeKind, label: Option<&'static str>, inner: Node, build: Build) -> Self {
        Node::Composite(Composite {
            kind,
            label,
            inner: Box::new(inner),
            build,
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Alt(_) => NodeKind::Alt,
            Node::Seq(_) => NodeKind::Seq,
            Node::Optional(_) => NodeKind::Optional,
            Node::Repeat(_) => NodeKind::Repeat,
            Node::Primitive(Primitive::Word) => NodeKind::Word,
            Node::Primitive(Primitive::Colon) => NodeKind::Colon,
            Node::Primitive(Primitive::ColonWord) => NodeKind::ColonWord,
            Node::Composite(c) => c.kind,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Node::Composite(c) => c.label,
            _ => None,
        }
    }

    /// True for nodes that complete as a single unit
    pub fn is_leaf(&self) -> bool {
        match self {
            Node::Primitive(_) => true,
            Node::Composite(c) => matches!(*c.inner, Node::Primitive(_)),
            _ => false,
        }
    }

    /// Match a prefix of `tokens`.
    ///
    /// # Arguments
    /// * `tokens` - Tokens to match; never modified
    ///
    /// # Returns
    /// * `Option<(Matched, usize)>` - Result and number of consumed tokens, `None` on failure
    pub fn match_tokens(&self, tokens: &[Token]) -> Option<(Matched, usize)> {
        match self {
            Node::Alt(nodes) => nodes.iter().find_map(|node| node.match_tokens(tokens)),
            Node::Seq(nodes) => {
                let mut results = Vec::with_capacity(nodes.len());
                let mut consumed = 0;
                for node in nodes {
                    let (result, n) = node.match_tokens(&tokens[consumed..])?;
                    results.push(result);
                    consumed += n;
                }
                Some((Matched::Seq(results), consumed))
            }
            Node::Optional(node) => {
                Some(node.match_tokens(tokens).unwrap_or((Matched::Skipped, 0)))
            }
            Node::Repeat(node) => {
                let mut results = Vec::new();
                let mut consumed = 0;
                while let Some((result, n)) = node.match_tokens(&tokens[consumed..]) {
                    if n == 0 {
                        break;
                    }
                    results.push(result);
                    consumed += n;
                }
                if results.is_empty() {
                    None
                } else {
                    Some((Matched::Repeat(results), consumed))
                }
            }
            Node::Primitive(primitive) => primitive.match_tokens(tokens),
            Node::Composite(composite) => {
                let (inner, n) = composite.inner.match_tokens(tokens)?;
                let result = (composite.build)(composite, inner)?;
                Some((result, n))
            }
        }
    }
}

impl Primitive {
    fn match_tokens(self, tokens: &[Token]) -> Option<(Matched, usize)> {
        match self {
            Primitive::Word => match tokens.first() {
                Some(token) if token.kind == TokenKind::Word => {
                    Some((Matched::Word(token.text.clone()), 1))
                }
                _ => None,
            },
            Primitive::Colon => match tokens.first() {
                Some(token) if token.kind == TokenKind::Colon => Some((Matched::Colon, 1)),
                _ => None,
            },
            Primitive::ColonWord => match tokens {
                [colon, word, ..]
                    if colon.kind == TokenKind::Colon && word.kind == TokenKind::Word =>
                {
                    Some((Matched::Word(word.text.clone()), 2))
                }
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::token::tokenize;

    fn keyword(word: &'static str) -> Node {
        Node::leaf(NodeKind::Literal, Some(word), Primitive::Word, |c, m| match m {
            Matched::Word(w) if Some(w.as_str()) == c.label => {
                Some(Matched::Keyword(c.kind, c.label.unwrap_or_default()))
            }
            _ => None,
        })
    }

    fn kw(word: &'static str) -> Matched {
        Matched::Keyword(NodeKind::Literal, word)
    }

    #[test]
    fn test_leaf_match() {
        let node = keyword("get");
        assert_eq!(node.match_tokens(&tokenize("get x")), Some((kw("get"), 1)));
        assert_eq!(node.match_tokens(&tokenize("set")), None);
        assert_eq!(node.match_tokens(&tokenize("")), None);
    }

    #[test]
    fn test_seq_match() {
        let node = Node::seq(vec![keyword("a"), keyword("b")]);
        let tokens = tokenize("a b c");
        assert_eq!(
            node.match_tokens(&tokens),
            Some((Matched::Seq(vec![kw("a"), kw("b")]), 2))
        );
        assert_eq!(node.match_tokens(&tokenize("a c")), None);
    }

    #[test]
    fn test_seq_is_composition_of_members() {
        let a = Node::repeat(keyword("a"));
        let b = keyword("b");
        let seq = Node::seq(vec![a.clone(), b.clone()]);
        let tokens = tokenize("a a b");

        let (_, n) = seq.match_tokens(&tokens).unwrap();
        let (_, k) = a.match_tokens(&tokens).unwrap();
        let (_, rest) = b.match_tokens(&tokens[k..]).unwrap();
        assert_eq!(n, k + rest);
    }

    #[test]
    fn test_alt_first_success_wins() {
        let word = Node::leaf(NodeKind::Word, None, Primitive::Word, |_, m| Some(m));
        let node = Node::alt(vec![keyword("get"), word.clone()]);
        assert_eq!(node.match_tokens(&tokenize("get")), Some((kw("get"), 1)));

        let reversed = Node::alt(vec![word, keyword("get")]);
        assert_eq!(
            reversed.match_tokens(&tokenize("get")),
            Some((Matched::Word("get".to_string()), 1))
        );
    }

    #[test]
    fn test_optional_is_total() {
        let node = Node::optional(keyword("a"));
        assert_eq!(node.match_tokens(&tokenize("a")), Some((kw("a"), 1)));
        assert_eq!(node.match_tokens(&tokenize("b")), Some((Matched::Skipped, 0)));
        assert_eq!(node.match_tokens(&[]), Some((Matched::Skipped, 0)));
    }

    #[test]
    fn test_repeat() {
        let node = Node::repeat(keyword("a"));
        assert_eq!(
            node.match_tokens(&tokenize("a a b")),
            Some((Matched::Repeat(vec![kw("a"), kw("a")]), 2))
        );
        assert_eq!(node.match_tokens(&tokenize("b")), None);
    }

    #[test]
    fn test_repeat_stops_on_zero_width() {
        let node = Node::repeat(Node::optional(keyword("a")));
        assert_eq!(
            node.match_tokens(&tokenize("a b")),
            Some((Matched::Repeat(vec![kw("a")]), 1))
        );
        // Only zero-width successes: no repetition counted
        assert_eq!(node.match_tokens(&tokenize("b")), None);
    }

    #[test]
    fn test_repeat_bounded_by_tokens() {
        let node = Node::repeat(Node::Primitive(Primitive::Word));
        let tokens = tokenize("a b c d");
        let (result, n) = node.match_tokens(&tokens).unwrap();
        assert_eq!(n, 4);
        assert!(matches!(result, Matched::Repeat(items) if items.len() <= tokens.len()));
    }

    #[test]
    fn test_colon_word() {
        let node = Node::Primitive(Primitive::ColonWord);
        let tokens = tokenize(":30");
        assert_eq!(
            node.match_tokens(&tokens),
            Some((Matched::Word("30".to_string()), 2))
        );
        assert_eq!(node.match_tokens(&tokenize(":")), None);
        assert_eq!(node.match_tokens(&tokenize("30")), None);
    }

    #[test]
    fn test_composite_rejection_is_no_match() {
        let node = Node::leaf(NodeKind::Epc, None, Primitive::Word, |_, m| match m {
            Matched::Word(w) => Epc::parse_hex(&w).map(Matched::Epc),
            _ => None,
        });
        assert_eq!(
            node.match_tokens(&tokenize("80")),
            Some((Matched::Epc(Epc(0x80)), 1))
        );
        assert_eq!(node.match_tokens(&tokenize("8")), None);
    }

    #[test]
    fn test_match_does_not_mutate_input() {
        let tokens = tokenize("a a");
        let before = tokens.clone();
        let _ = Node::repeat(keyword("a")).match_tokens(&tokens);
        assert_eq!(tokens, before);
    }

    #[test]
    fn test_is_leaf() {
        assert!(keyword("a").is_leaf());
        assert!(Node::Primitive(Primitive::Colon).is_leaf());
        assert!(!Node::seq(vec![]).is_leaf());
        let wrapped = Node::composite(NodeKind::Eoj, None, Node::seq(vec![]), |_, m| Some(m));
        assert!(!wrapped.is_leaf());
    }
}
