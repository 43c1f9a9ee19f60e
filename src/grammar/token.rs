//! Tokenizer for console input lines
//!
//! Splits a line into words and colons. Positions are char offsets into the
//! line so that a consumed-token count maps straight back to a cursor column.

use std::fmt;

/// Token categories produced by [`tokenize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Colon,
    EndOfInput,
}

/// A single token of an input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Char offset of the first character
    pub pos: usize,
    /// Word text, `":"` for colons, trailing whitespace for end of input
    pub text: String,
}

impl Token {
    pub fn word(pos: usize, text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Word,
            pos,
            text: text.into(),
        }
    }

    pub fn colon(pos: usize) -> Self {
        Self {
            kind: TokenKind::Colon,
            pos,
            text: ":".to_string(),
        }
    }

    pub fn end(pos: usize, trailing: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::EndOfInput,
            pos,
            text: trailing.into(),
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Word => write!(f, "Word({:?})@{}", self.text, self.pos),
            TokenKind::Colon => write!(f, "Colon@{}", self.pos),
            TokenKind::EndOfInput => write!(f, "EOF@{}", self.pos),
        }
    }
}

/// Split a line into tokens.
///
/// The result always ends with exactly one [`TokenKind::EndOfInput`] token
/// whose text is the whitespace that followed the last token.
///
/// # Arguments
/// * `line` - Raw input line
///
/// # Returns
/// * `Vec<Token>` - Tokens in input order
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut word_start = 0;
    let mut trailing = String::new();
    let mut len = 0;

    for (pos, ch) in line.chars().enumerate() {
        len = pos + 1;
        match ch {
            ' ' | '\t' => {
                if !word.is_empty() {
                    tokens.push(Token::word(word_start, std::mem::take(&mut word)));
                }
                trailing.push(ch);
            }
            ':' => {
                if !word.is_empty() {
                    tokens.push(Token::word(word_start, std::mem::take(&mut word)));
                }
                tokens.push(Token::colon(pos));
                trailing.clear();
            }
            _ => {
                if word.is_empty() {
                    word_start = pos;
                    trailing.clear();
                }
                word.push(ch);
            }
        }
    }

    if !word.is_empty() {
        tokens.push(Token::word(word_start, word));
        trailing.clear();
    }

    tokens.push(Token::end(len, trailing));
    tokens
}

/// Detach the word under the cursor.
///
/// When the line ends directly after a word, that word is what the user is
/// still typing: it is removed from the token list (the end-of-input token
/// moves to its position) and returned separately so that completion can
/// compute what may appear there and filter by the typed prefix.
///
/// # Arguments
/// * `tokens` - Output of [`tokenize`]
///
/// # Returns
/// * `(Vec<Token>, String)` - Remaining tokens and the detached word (possibly empty)
pub fn split_last_word(mut tokens: Vec<Token>) -> (Vec<Token>, String) {
    let n = tokens.len();
    if n < 2 || !tokens[n - 1].is_end() || !tokens[n - 1].text.is_empty() {
        return (tokens, String::new());
    }
    if !tokens[n - 2].is_word() {
        return (tokens, String::new());
    }

    tokens.pop();
    let last = tokens.pop().map(|token| (token.pos, token.text));
    match last {
        Some((pos, text)) => {
            tokens.push(Token::end(pos, ""));
            (tokens, text)
        }
        None => (tokens, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![Token::end(0, "")]);
    }

    #[test]
    fn test_colon_is_separate_token() {
        assert_eq!(
            tokenize("abc:def"),
            vec![
                Token::word(0, "abc"),
                Token::colon(3),
                Token::word(4, "def"),
                Token::end(7, ""),
            ]
        );
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(
            tokenize("  get\t 0130 : 1"),
            vec![
                Token::word(2, "get"),
                Token::word(7, "0130"),
                Token::colon(12),
                Token::word(14, "1"),
                Token::end(15, ""),
            ]
        );
    }

    #[test]
    fn test_trailing_whitespace_kept() {
        let tokens = tokenize("get  ");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1], Token::end(5, "  "));
    }

    #[test]
    fn test_only_whitespace() {
        assert_eq!(tokenize(" \t"), vec![Token::end(2, " \t")]);
    }

    #[test]
    fn test_trailing_colon() {
        assert_eq!(
            tokenize("80:"),
            vec![Token::word(0, "80"), Token::colon(2), Token::end(3, "")]
        );
    }

    #[test]
    fn test_positions_are_char_offsets() {
        let tokens = tokenize("alias エアコン 0130");
        assert_eq!(tokens[1], Token::word(6, "エアコン"));
        assert_eq!(tokens[2], Token::word(11, "0130"));
        assert_eq!(tokens[3], Token::end(15, ""));
    }

    #[test]
    fn test_split_last_word() {
        let (tokens, word) = split_last_word(tokenize("get ac"));
        assert_eq!(word, "ac");
        assert_eq!(tokens, vec![Token::word(0, "get"), Token::end(4, "")]);
    }

    #[test]
    fn test_split_last_word_after_space() {
        let (tokens, word) = split_last_word(tokenize("get "));
        assert_eq!(word, "");
        assert_eq!(tokens, vec![Token::word(0, "get"), Token::end(4, " ")]);
    }

    #[test]
    fn test_split_last_word_after_colon() {
        let (tokens, word) = split_last_word(tokenize("set ac 80:"));
        assert_eq!(word, "");
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_split_last_word_empty() {
        let (tokens, word) = split_last_word(tokenize(""));
        assert_eq!(word, "");
        assert_eq!(tokens, vec![Token::end(0, "")]);
    }
}
