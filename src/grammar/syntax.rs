//! The console command language
//!
//! [`Grammar`] owns the root node of the command grammar. It is built once at
//! startup and shared read-only between the parser, the completer and help.
//!
//! ```text
//! discover
//! devices|list [device] [-all|-props|-group-by EPC|property|EPC]...
//! get <device> (EPC|-skip-validation)...
//! set <device> property...
//! update [device] [-force|-f|--force]...
//! alias [name [device [property...]] | -delete name]
//! group (add|remove) @name device... | group delete @name | group list [@name]
//! debug [on|off]
//! help [command]
//! quit
//!
//! device   := IP [EOJ] | EOJ | @group | alias
//! EOJ      := classCode [":" instanceCode]
//! property := EPC ":" (hexValue | valueAlias) | propertyAlias
//! ```

use std::net::IpAddr;

use super::candidates::Expected;
use super::node::{Composite, DeviceArg, Matched, Node, NodeKind, Primitive, PropertyArg};
use super::reflect::collect_strings;
use super::token::Token;
use crate::device::{ClassCode, Epc, parse_edt};
use crate::error::{ParseError, Result};

/// The immutable command grammar
#[derive(Debug, Clone)]
pub struct Grammar {
    root: Node,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    /// Build the command grammar
    pub fn new() -> Self {
        Self {
            root: Node::alt(vec![
                discover_command(),
                devices_command(),
                get_command(),
                set_command(),
                update_command(),
                alias_command(),
                group_command(),
                debug_command(),
                help_command(),
                quit_command(),
            ]),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Match a whole token sequence.
    ///
    /// Every token except the end of input must be consumed.
    ///
    /// # Arguments
    /// * `tokens` - Output of the tokenizer
    ///
    /// # Returns
    /// * `Result<Matched, ParseError>` - Root match result or a grammar mismatch
    pub fn parse_tokens(&self, tokens: &[Token]) -> std::result::Result<Matched, ParseError> {
        if let Some((matched, consumed)) = self.root.match_tokens(tokens) {
            if tokens.get(consumed).is_none_or(Token::is_end) {
                return Ok(matched);
            }
        }
        Err(self.mismatch(tokens))
    }

    /// Nodes that may follow the given tokens
    pub fn candidates(&self, tokens: &[Token]) -> (usize, Vec<Expected>) {
        self.root.candidates(tokens)
    }

    /// Every command keyword, in grammar order
    pub fn command_names(&self) -> Result<Vec<&'static str>> {
        Ok(collect_strings(&self.root, NodeKind::Command)?)
    }

    fn mismatch(&self, tokens: &[Token]) -> ParseError {
        let (position, expected) = self.candidates(tokens);
        let found = tokens
            .iter()
            .find(|token| token.pos >= position && !token.is_end())
            .map(|token| token.text.clone())
            .unwrap_or_default();

        let mut names: Vec<String> = Vec::new();
        for item in expected {
            let name = item.to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }

        ParseError::GrammarMismatch {
            position,
            found,
            expected: names,
        }
    }
}

/* ========================= Conversions ========================= */

fn word(matched: Matched) -> Option<String> {
    match matched {
        Matched::Word(text) => Some(text),
        _ => None,
    }
}

fn keyword(composite: &Composite, matched: Matched) -> Option<Matched> {
    let label = composite.label?;
    match matched {
        Matched::Word(text) if text == label => Some(Matched::Keyword(composite.kind, label)),
        _ => None,
    }
}

fn ip_address(_: &Composite, matched: Matched) -> Option<Matched> {
    word(matched)?.parse::<IpAddr>().ok().map(Matched::Ip)
}

fn class_code(_: &Composite, matched: Matched) -> Option<Matched> {
    ClassCode::parse_hex(&word(matched)?).map(Matched::ClassCode)
}

fn instance_code(_: &Composite, matched: Matched) -> Option<Matched> {
    let text = word(matched)?;
    if text.is_empty() || text.len() > 3 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>().ok().map(Matched::InstanceCode)
}

fn eoj(_: &Composite, matched: Matched) -> Option<Matched> {
    let Matched::Seq(parts) = matched else {
        return None;
    };
    let [class, instance]: [Matched; 2] = parts.try_into().ok()?;
    let Matched::ClassCode(class_code) = class else {
        return None;
    };
    let instance_code = match instance {
        Matched::InstanceCode(code) => Some(code),
        _ => None,
    };
    Some(Matched::Eoj {
        class_code,
        instance_code,
    })
}

fn device_alias(composite: &Composite, matched: Matched) -> Option<Matched> {
    let text = word(matched)?;
    let first = text.chars().next()?;
    if first == '-' || first == '@' || first.is_ascii_digit() {
        return None;
    }
    Some(Matched::Name(composite.kind, text))
}

fn alias_name(composite: &Composite, matched: Matched) -> Option<Matched> {
    let text = word(matched)?;
    if text.starts_with('-') {
        return None;
    }
    Some(Matched::Name(composite.kind, text))
}

fn group_name(composite: &Composite, matched: Matched) -> Option<Matched> {
    let text = word(matched)?;
    text.starts_with('@')
        .then(|| Matched::Name(composite.kind, text))
}

fn device(_: &Composite, matched: Matched) -> Option<Matched> {
    let arg = match matched {
        Matched::Seq(parts) => {
            let mut parts = parts.into_iter();
            let Some(Matched::Ip(ip)) = parts.next() else {
                return None;
            };
            match parts.next() {
                Some(Matched::Eoj {
                    class_code,
                    instance_code,
                }) => DeviceArg::Address {
                    ip: Some(ip),
                    class_code: Some(class_code),
                    instance_code,
                },
                _ => DeviceArg::Address {
                    ip: Some(ip),
                    class_code: None,
                    instance_code: None,
                },
            }
        }
        Matched::Eoj {
            class_code,
            instance_code,
        } => DeviceArg::Address {
            ip: None,
            class_code: Some(class_code),
            instance_code,
        },
        Matched::Name(NodeKind::GroupName, name) => DeviceArg::Group(name),
        Matched::Name(NodeKind::DeviceAlias, name) => DeviceArg::Alias(name),
        _ => return None,
    };
    Some(Matched::Device(arg))
}

fn epc(_: &Composite, matched: Matched) -> Option<Matched> {
    Epc::parse_hex(&word(matched)?).map(Matched::Epc)
}

fn property_value(_: &Composite, matched: Matched) -> Option<Matched> {
    parse_edt(&word(matched)?).map(Matched::Edt)
}

fn any_name(composite: &Composite, matched: Matched) -> Option<Matched> {
    let text = word(matched)?;
    (!text.is_empty()).then(|| Matched::Name(composite.kind, text))
}

fn property_alias(composite: &Composite, matched: Matched) -> Option<Matched> {
    let text = word(matched)?;
    let first = text.chars().next()?;
    if first == '-' || first == '@' || Epc::parse_hex(&text).is_some() {
        return None;
    }
    Some(Matched::Name(composite.kind, text))
}

fn property(_: &Composite, matched: Matched) -> Option<Matched> {
    let arg = match matched {
        Matched::Seq(parts) => {
            let [code, value]: [Matched; 2] = parts.try_into().ok()?;
            let Matched::Epc(epc) = code else {
                return None;
            };
            match value {
                Matched::Edt(edt) => PropertyArg::Raw { epc, edt },
                Matched::Name(NodeKind::PropertyValueAlias, alias) => {
                    PropertyArg::ValueAlias { epc, alias }
                }
                _ => return None,
            }
        }
        Matched::Name(NodeKind::PropertyAlias, alias) => PropertyArg::Alias(alias),
        _ => return None,
    };
    Some(Matched::Property(arg))
}

fn group_by(_: &Composite, matched: Matched) -> Option<Matched> {
    let Matched::Seq(parts) = matched else {
        return None;
    };
    match parts.as_slice() {
        [_, Matched::Epc(epc)] => Some(Matched::GroupBy(*epc)),
        _ => None,
    }
}

/* ========================= Vocabulary nodes ========================= */

fn word_node(kind: NodeKind, label: &'static str) -> Node {
    Node::leaf(kind, Some(label), Primitive::Word, keyword)
}

fn command(label: &'static str) -> Node {
    word_node(NodeKind::Command, label)
}

fn ip_address_node() -> Node {
    Node::leaf(NodeKind::IpAddress, None, Primitive::Word, ip_address)
}

fn eoj_node() -> Node {
    Node::composite(
        NodeKind::Eoj,
        None,
        Node::seq(vec![
            Node::leaf(NodeKind::ClassCode, None, Primitive::Word, class_code),
            Node::optional(Node::leaf(
                NodeKind::InstanceCode,
                None,
                Primitive::ColonWord,
                instance_code,
            )),
        ]),
        eoj,
    )
}

fn group_name_node() -> Node {
    Node::leaf(NodeKind::GroupName, None, Primitive::Word, group_name)
}

fn device_specifier() -> Node {
    Node::composite(
        NodeKind::DeviceSpecifier,
        None,
        Node::alt(vec![
            Node::seq(vec![ip_address_node(), Node::optional(eoj_node())]),
            eoj_node(),
            group_name_node(),
            Node::leaf(NodeKind::DeviceAlias, None, Primitive::Word, device_alias),
        ]),
        device,
    )
}

fn epc_node() -> Node {
    Node::leaf(NodeKind::Epc, None, Primitive::Word, epc)
}

fn property_node() -> Node {
    Node::composite(
        NodeKind::Property,
        None,
        Node::alt(vec![
            Node::seq(vec![
                epc_node(),
                Node::alt(vec![
                    Node::leaf(
                        NodeKind::PropertyValue,
                        None,
                        Primitive::ColonWord,
                        property_value,
                    ),
                    Node::leaf(
                        NodeKind::PropertyValueAlias,
                        None,
                        Primitive::ColonWord,
                        any_name,
                    ),
                ]),
            ]),
            Node::leaf(NodeKind::PropertyAlias, None, Primitive::Word, property_alias),
        ]),
        property,
    )
}

/* ========================= Commands ========================= */

fn discover_command() -> Node {
    Node::seq(vec![command("discover")])
}

fn devices_command() -> Node {
    Node::seq(vec![
        Node::alt(vec![command("devices"), command("list")]),
        Node::optional(device_specifier()),
        Node::optional(Node::repeat(Node::alt(vec![
            word_node(NodeKind::ListOption, "-all"),
            word_node(NodeKind::ListOption, "-props"),
            Node::composite(
                NodeKind::GroupBy,
                None,
                Node::seq(vec![word_node(NodeKind::ListOption, "-group-by"), epc_node()]),
                group_by,
            ),
            property_node(),
            epc_node(),
        ]))),
    ])
}

fn get_command() -> Node {
    Node::seq(vec![
        command("get"),
        device_specifier(),
        Node::repeat(Node::alt(vec![
            epc_node(),
            word_node(NodeKind::GetOption, "-skip-validation"),
        ])),
    ])
}

fn set_command() -> Node {
    Node::seq(vec![
        command("set"),
        device_specifier(),
        Node::repeat(property_node()),
    ])
}

fn update_command() -> Node {
    Node::seq(vec![
        command("update"),
        Node::optional(device_specifier()),
        Node::optional(Node::repeat(Node::alt(vec![
            word_node(NodeKind::UpdateOption, "-force"),
            word_node(NodeKind::UpdateOption, "-f"),
            word_node(NodeKind::UpdateOption, "--force"),
        ]))),
    ])
}

fn alias_command() -> Node {
    let name = || Node::leaf(NodeKind::AliasName, None, Primitive::Word, alias_name);
    Node::seq(vec![
        command("alias"),
        Node::optional(Node::alt(vec![
            Node::seq(vec![word_node(NodeKind::DeleteOption, "-delete"), name()]),
            Node::seq(vec![
                name(),
                Node::optional(Node::seq(vec![
                    device_specifier(),
                    Node::optional(Node::repeat(property_node())),
                ])),
            ]),
        ])),
    ])
}

fn group_command() -> Node {
    let members = |action: &'static str| {
        Node::seq(vec![
            word_node(NodeKind::GroupAction, action),
            group_name_node(),
            Node::repeat(device_specifier()),
        ])
    };
    Node::seq(vec![
        command("group"),
        Node::alt(vec![
            members("add"),
            members("remove"),
            Node::seq(vec![word_node(NodeKind::GroupAction, "delete"), group_name_node()]),
            Node::seq(vec![
                word_node(NodeKind::GroupAction, "list"),
                Node::optional(group_name_node()),
            ]),
        ]),
    ])
}

fn debug_command() -> Node {
    Node::seq(vec![
        command("debug"),
        Node::optional(Node::alt(vec![
            word_node(NodeKind::OnOff, "on"),
            word_node(NodeKind::OnOff, "off"),
        ])),
    ])
}

fn help_command() -> Node {
    Node::seq(vec![
        command("help"),
        Node::optional(Node::leaf(NodeKind::HelpTopic, None, Primitive::Word, any_name)),
    ])
}

fn quit_command() -> Node {
    Node::seq(vec![command("quit")])
}
