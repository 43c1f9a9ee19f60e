//! Completer for reedline - grammar-driven completion suggestions
//!
//! The grammar reports which node kinds may follow the typed tokens; this
//! module turns each kind into concrete words (keywords, alias names, group
//! names, property and value aliases, known EPCs and addresses) and keeps the
//! ones starting with the word under the cursor.

use std::collections::BTreeSet;
use std::sync::Arc;

use reedline::{Completer, Span, Suggestion};

use crate::backend::{AliasManager, DeviceHandler, GroupManager, PropertyDescriptionProvider};
use crate::device::{ClassCode, DeviceSpecifier, Epc};
use crate::grammar::{Expected, Grammar, NodeKind, Token, split_last_word, tokenize};

/// Grammar-driven completer for the console
pub struct ConsoleCompleter {
    grammar: Arc<Grammar>,
    aliases: Arc<dyn AliasManager>,
    groups: Arc<dyn GroupManager>,
    properties: Arc<dyn PropertyDescriptionProvider>,
    devices: Arc<dyn DeviceHandler>,
}

/// One completion word and an optional description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    pub description: Option<String>,
}

impl Candidate {
    fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    fn described(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: Some(description.into()),
        }
    }
}

impl ConsoleCompleter {
    /// Create a new completer
    ///
    /// # Arguments
    /// * `grammar` - Shared command grammar
    /// * `aliases` - Device alias names
    /// * `groups` - Group names
    /// * `properties` - Property and value aliases, EPC names
    /// * `devices` - Known devices, for addresses and class codes
    ///
    /// # Returns
    /// * `Self` - New completer
    pub fn new(
        grammar: Arc<Grammar>,
        aliases: Arc<dyn AliasManager>,
        groups: Arc<dyn GroupManager>,
        properties: Arc<dyn PropertyDescriptionProvider>,
        devices: Arc<dyn DeviceHandler>,
    ) -> Self {
        Self {
            grammar,
            aliases,
            groups,
            properties,
            devices,
        }
    }

    /// Candidates for the text before the cursor
    ///
    /// # Arguments
    /// * `line` - Text up to the cursor
    ///
    /// # Returns
    /// * `(String, Vec<Candidate>)` - The word being completed and the matching candidates
    pub fn candidates(&self, line: &str) -> (String, Vec<Candidate>) {
        let (tokens, word) = split_last_word(tokenize(line));
        let (_, expected) = self.grammar.candidates(&tokens);

        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        for item in &expected {
            for candidate in self.expand(item, &tokens) {
                if starts_with_ignore_case(&candidate.value, &word)
                    && seen.insert(candidate.value.clone())
                {
                    result.push(candidate);
                }
            }
        }
        (word, result)
    }

    /// Concrete words for one expected node
    fn expand(&self, expected: &Expected, tokens: &[Token]) -> Vec<Candidate> {
        if expected.kind == NodeKind::HelpTopic {
            return self
                .grammar
                .command_names()
                .unwrap_or_default()
                .into_iter()
                .map(Candidate::plain)
                .collect();
        }
        if let Some(label) = expected.label {
            return vec![Candidate::plain(label)];
        }

        let class_code = self.class_hint(tokens);
        match expected.kind {
            NodeKind::DeviceAlias | NodeKind::AliasName => self
                .aliases
                .alias_names()
                .into_iter()
                .map(Candidate::plain)
                .collect(),
            NodeKind::GroupName => self
                .groups
                .group_names()
                .into_iter()
                .map(Candidate::plain)
                .collect(),
            NodeKind::PropertyAlias => self
                .properties
                .property_aliases(class_code)
                .into_iter()
                .map(Candidate::plain)
                .collect(),
            NodeKind::PropertyValueAlias => match epc_before_colon(tokens) {
                Some(epc) => self
                    .properties
                    .value_aliases(class_code, epc)
                    .into_iter()
                    .map(Candidate::plain)
                    .collect(),
                None => Vec::new(),
            },
            NodeKind::Epc => match class_code {
                Some(class_code) => self
                    .properties
                    .known_epcs(class_code)
                    .into_iter()
                    .map(|epc| match self.properties.epc_name(class_code, epc) {
                        Some(name) => Candidate::described(epc.to_string(), name),
                        None => Candidate::plain(epc.to_string()),
                    })
                    .collect(),
                None => Vec::new(),
            },
            NodeKind::IpAddress => self
                .known_devices()
                .map(|device| device.ip.to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(Candidate::plain)
                .collect(),
            NodeKind::ClassCode => self
                .known_devices()
                .map(|device| device.eoj.class_code.to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(Candidate::plain)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn known_devices(&self) -> impl Iterator<Item = crate::device::IpAndEoj> {
        self.devices
            .find_devices(&DeviceSpecifier::default())
            .into_iter()
    }

    /// Class code named on the line, directly or through an alias
    fn class_hint(&self, tokens: &[Token]) -> Option<ClassCode> {
        tokens
            .iter()
            .skip(1)
            .filter(|token| token.is_word())
            .find_map(|token| {
                ClassCode::parse_hex(&token.text).or_else(|| {
                    self.aliases
                        .resolve_alias(&token.text)
                        .map(|device| device.eoj.class_code)
                })
            })
    }
}

/// EPC of a trailing `EPC:` pair
fn epc_before_colon(tokens: &[Token]) -> Option<Epc> {
    match tokens {
        [.., epc, colon, end] if epc.is_word() && !colon.is_word() && !colon.is_end() && end.is_end() => {
            Epc::parse_hex(&epc.text)
        }
        _ => None,
    }
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate
        .to_lowercase()
        .starts_with(&prefix.to_lowercase())
}

impl Completer for ConsoleCompleter {
    /// Complete the input at the given cursor position
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - List of completion suggestions
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let before = line.get(..pos).unwrap_or(line);
        let (word, candidates) = self.candidates(before);
        let start = pos.saturating_sub(word.len());

        candidates
            .into_iter()
            .map(|candidate| Suggestion {
                value: candidate.value,
                description: candidate.description,
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
                ..Default::default()
            })
            .collect()
    }
}
