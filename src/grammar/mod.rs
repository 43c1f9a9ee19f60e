//! Command grammar and completion engine
//!
//! One declarative grammar drives both strict parsing and "what comes next"
//! completion:
//! - `token`: line tokenizer
//! - `node`: combinator nodes and the Match contract
//! - `candidates`: the Candidates contract over the same nodes
//! - `reflect`: tree walkers used to derive vocabularies from the grammar
//! - `syntax`: the console command language

pub mod candidates;
pub mod node;
pub mod reflect;
pub mod syntax;
pub mod token;

pub use candidates::Expected;
pub use node::{Composite, DeviceArg, Matched, Node, NodeKind, Primitive, PropertyArg};
pub use reflect::{collect_strings, traverse};
pub use syntax::Grammar;
pub use token::{Token, TokenKind, split_last_word, tokenize};
