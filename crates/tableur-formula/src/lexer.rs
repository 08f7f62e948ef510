//! Formula tokenizer
//!
//! Turns a formula body (the text after `=`) into a flat token stream in a
//! single left-to-right scan. Every token keeps the exact source text it was
//! read from, so the concatenation of the `raw` fields reproduces the body
//! minus the whitespace and unrecognized characters that were skipped.
//!
//! Unrecognized characters do not stop the scan. They are recorded and can be
//! read back with [`Lexer::skipped`], which the linter reports as warnings.

use lazy_regex::regex_is_match;
use std::fmt;
use tableur_core::{CellRange, NamedConstants};
use tracing::trace;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Source form of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token kinds with their decoded values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    /// Numeric literal (decimal comma accepted, sign folded in)
    Number(f64),
    /// String literal, without the quotes
    String(String),
    /// `VRAI`/`TRUE`/`FAUX`/`FALSE`
    Bool(bool),
    /// Cell reference, anchors removed (e.g. `B3`)
    Cell(String),
    /// Range reference, anchors removed (e.g. `A1:B4`)
    Range(String),
    /// Known named constant, as written
    Name(String),
    /// Function name, uppercased
    Func(String),
    /// One of `+ - * / ^ &`
    Op(char),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `;` or `,`
    Sep,
    /// Comparison operator
    Compare(CompareOp),
}

impl TokenKind {
    /// Short description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "number",
            TokenKind::String(_) => "string",
            TokenKind::Bool(_) => "boolean",
            TokenKind::Cell(_) => "cell reference",
            TokenKind::Range(_) => "range",
            TokenKind::Name(_) => "name",
            TokenKind::Func(_) => "function name",
            TokenKind::Op(_) => "operator",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Sep => "separator",
            TokenKind::Compare(_) => "comparison",
        }
    }
}

/// A token and the source text it came from
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    /// Kind and decoded value
    pub kind: TokenKind,
    /// Exact source substring
    pub raw: String,
    /// Byte offset of the token in the formula body
    pub offset: usize,
}

/// A character the tokenizer could not classify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkippedChar {
    /// The character
    pub ch: char,
    /// Byte offset in the formula body
    pub offset: usize,
}

/// Formula tokenizer
pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    names: &'a NamedConstants,
    tokens: Vec<Token>,
    skipped: Vec<SkippedChar>,
}

impl<'a> Lexer<'a> {
    /// Create a tokenizer over a formula body. `names` decides which bare
    /// identifiers are named constants.
    pub fn new(input: &'a str, names: &'a NamedConstants) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
            names,
            tokens: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Scan the whole input and return the tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.pos = 0;
        self.tokens.clear();
        self.skipped.clear();

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            if !self.scan_token(c) {
                self.skipped.push(SkippedChar {
                    ch: c,
                    offset: self.byte_offset(self.pos),
                });
                self.pos += 1;
            }
        }

        trace!(
            tokens = self.tokens.len(),
            skipped = self.skipped.len(),
            "tokenized formula"
        );
        self.tokens.clone()
    }

    /// Characters dropped by the last [`tokenize`](Self::tokenize) call
    pub fn skipped(&self) -> &[SkippedChar] {
        &self.skipped
    }

    /// Try to read one token starting with `c`. Returns false when `c` starts
    /// nothing the grammar knows.
    fn scan_token(&mut self, c: char) -> bool {
        let start = self.pos;
        match c {
            '"' => {
                self.scan_string();
                true
            }
            ';' | ',' => {
                self.pos += 1;
                self.push(TokenKind::Sep, start);
                true
            }
            '(' => {
                self.pos += 1;
                self.push(TokenKind::LParen, start);
                true
            }
            ')' => {
                self.pos += 1;
                self.push(TokenKind::RParen, start);
                true
            }
            '<' | '>' | '=' => self.scan_comparison(c),
            '-' if self.minus_starts_number() => {
                self.scan_number();
                true
            }
            '+' | '-' | '*' | '/' | '^' | '&' => {
                self.pos += 1;
                self.push(TokenKind::Op(c), start);
                true
            }
            c if c.is_ascii_digit() => {
                self.scan_number();
                true
            }
            c if is_identifier_start(c) => {
                self.scan_identifier();
                true
            }
            _ => false,
        }
    }

    /// Quoted string. No escapes: the first closing quote ends it, and a
    /// missing one runs the string to the end of input.
    fn scan_string(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '"' {
                break;
            }
            self.pos += 1;
        }
        let content = self.slice(content_start, self.pos).to_string();
        if self.peek_char() == Some('"') {
            self.pos += 1;
        }
        self.push(TokenKind::String(content), start);
    }

    fn scan_comparison(&mut self, c: char) -> bool {
        let start = self.pos;
        let next = self.peek_char_at(1);
        let (op, len) = match (c, next) {
            ('<', Some('>')) => (CompareOp::Ne, 2),
            ('<', Some('=')) => (CompareOp::Le, 2),
            ('>', Some('=')) => (CompareOp::Ge, 2),
            ('<', _) => (CompareOp::Lt, 1),
            ('>', _) => (CompareOp::Gt, 1),
            // the first '=' of '==' is dropped, the second one is read next
            ('=', Some('=')) => {
                self.pos += 1;
                return true;
            }
            _ => (CompareOp::Eq, 1),
        };
        self.pos += len;
        self.push(TokenKind::Compare(op), start);
        true
    }

    /// A '-' is part of a number literal when a digit follows and the previous
    /// token cannot end an operand.
    fn minus_starts_number(&self) -> bool {
        if !self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        match self.tokens.last().map(|t| &t.kind) {
            None => true,
            Some(TokenKind::LParen)
            | Some(TokenKind::Sep)
            | Some(TokenKind::Op(_))
            | Some(TokenKind::Compare(_)) => true,
            Some(_) => false,
        }
    }

    /// `[-]digits[(.|,)digits]`
    fn scan_number(&mut self) {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.pos += 1;
        }
        self.skip_digits();
        if matches!(self.peek_char(), Some('.') | Some(','))
            && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.pos += 1;
            self.skip_digits();
        }
        let raw = self.slice(start, self.pos);
        let value = raw.replace(',', ".").parse::<f64>().unwrap_or(f64::NAN);
        self.push(TokenKind::Number(value), start);
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    /// Identifier, then classified as range, boolean, cell, name or function
    fn scan_identifier(&mut self) {
        let start = self.pos;
        while self.peek_char().is_some_and(is_identifier_char) {
            self.pos += 1;
        }
        let word_end = self.pos;

        if self.peek_char() == Some(':') {
            let mut end = word_end + 1;
            while self
                .chars
                .get(end)
                .is_some_and(|(_, c)| c.is_ascii_alphanumeric() || *c == '$')
            {
                end += 1;
            }
            let candidate = self.slice(start, end);
            if is_range_reference(candidate) {
                let value = candidate.replace('$', "").to_uppercase();
                self.pos = end;
                self.push(TokenKind::Range(value), start);
                return;
            }
        }

        let word = self.slice(start, word_end).to_string();
        let before_paren = self.peek_char() == Some('(');

        let kind = if word.eq_ignore_ascii_case("VRAI") || word.eq_ignore_ascii_case("TRUE") {
            TokenKind::Bool(true)
        } else if word.eq_ignore_ascii_case("FAUX") || word.eq_ignore_ascii_case("FALSE") {
            TokenKind::Bool(false)
        } else if !before_paren && is_cell_reference(&word) {
            TokenKind::Cell(word.replace('$', "").to_uppercase())
        } else if !before_paren && self.names.contains(&word) {
            TokenKind::Name(word)
        } else {
            TokenKind::Func(word.to_uppercase())
        };
        self.push(kind, start);
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let raw = self.slice(start, self.pos).to_string();
        let offset = self.byte_offset(start);
        self.tokens.push(Token { kind, raw, offset });
    }

    fn peek_char(&self) -> Option<char> {
        self.peek_char_at(0)
    }

    fn peek_char_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn byte_offset(&self, pos: usize) -> usize {
        self.chars
            .get(pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.input.len())
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[self.byte_offset(start)..self.byte_offset(end)]
    }
}

/// Tokenize a formula body
pub fn tokenize(input: &str, names: &NamedConstants) -> Vec<Token> {
    Lexer::new(input, names).tokenize()
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '.' || c == '_' || c == '$'
}

/// `[$]Letter[$]Digit{1,2}`
pub fn is_cell_reference(word: &str) -> bool {
    regex_is_match!(r"^\$?[A-Za-z]\$?[0-9]{1,2}$", word)
}

/// Two cell references joined by `:`
pub fn is_range_reference(text: &str) -> bool {
    regex_is_match!(
        r"^\$?[A-Za-z]\$?[0-9]{1,2}:\$?[A-Za-z]\$?[0-9]{1,2}$",
        text
    ) && CellRange::parse(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input, &NamedConstants::new())
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Number(42.0)]);
        assert_eq!(kinds("3,5"), vec![TokenKind::Number(3.5)]);
        assert_eq!(kinds("3.25"), vec![TokenKind::Number(3.25)]);
        assert_eq!(
            kinds("1;2"),
            vec![TokenKind::Number(1.0), TokenKind::Sep, TokenKind::Number(2.0)]
        );
    }

    #[test]
    fn test_decimal_mark_needs_a_digit() {
        assert_eq!(
            kinds("5,A1"),
            vec![
                TokenKind::Number(5.0),
                TokenKind::Sep,
                TokenKind::Cell("A1".into())
            ]
        );
    }

    #[test]
    fn test_minus_folding() {
        assert_eq!(kinds("-2"), vec![TokenKind::Number(-2.0)]);
        assert_eq!(
            kinds("3*-2"),
            vec![
                TokenKind::Number(3.0),
                TokenKind::Op('*'),
                TokenKind::Number(-2.0)
            ]
        );
        assert_eq!(
            kinds("5-2"),
            vec![
                TokenKind::Number(5.0),
                TokenKind::Op('-'),
                TokenKind::Number(2.0)
            ]
        );
        assert_eq!(
            kinds("A1-2"),
            vec![
                TokenKind::Cell("A1".into()),
                TokenKind::Op('-'),
                TokenKind::Number(2.0)
            ]
        );
        assert_eq!(
            kinds("-A1"),
            vec![TokenKind::Op('-'), TokenKind::Cell("A1".into())]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r#""Bonjour le monde""#, &NamedConstants::new());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String("Bonjour le monde".into()));
        assert_eq!(tokens[0].raw, r#""Bonjour le monde""#);

        let unterminated = tokenize(r#""abc"#, &NamedConstants::new());
        assert_eq!(unterminated[0].kind, TokenKind::String("abc".into()));
        assert_eq!(unterminated[0].raw, r#""abc"#);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            kinds("A1<>B1"),
            vec![
                TokenKind::Cell("A1".into()),
                TokenKind::Compare(CompareOp::Ne),
                TokenKind::Cell("B1".into())
            ]
        );
        assert_eq!(kinds(">="), vec![TokenKind::Compare(CompareOp::Ge)]);
        assert_eq!(kinds("<="), vec![TokenKind::Compare(CompareOp::Le)]);
        assert_eq!(kinds("=="), vec![TokenKind::Compare(CompareOp::Eq)]);

        let names = NamedConstants::new();
        let mut lexer = Lexer::new("A1==2", &names);
        let tokens = lexer.tokenize();
        assert_eq!(tokens[1].raw, "=");
        assert!(lexer.skipped().is_empty());
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            kinds("SOMME(A1:B4)"),
            vec![
                TokenKind::Func("SOMME".into()),
                TokenKind::LParen,
                TokenKind::Range("A1:B4".into()),
                TokenKind::RParen
            ]
        );
        assert_eq!(kinds("$B$3"), vec![TokenKind::Cell("B3".into())]);
        assert_eq!(kinds("$a$1:$b$2"), vec![TokenKind::Range("A1:B2".into())]);
        assert_eq!(kinds("vrai"), vec![TokenKind::Bool(true)]);
        assert_eq!(kinds("FALSE"), vec![TokenKind::Bool(false)]);
        assert_eq!(kinds("nb.si"), vec![TokenKind::Func("NB.SI".into())]);
        assert_eq!(kinds("Prénom"), vec![TokenKind::Func("PRÉNOM".into())]);
    }

    #[test]
    fn test_cell_followed_by_paren_is_a_function() {
        assert_eq!(
            kinds("A1("),
            vec![TokenKind::Func("A1".into()), TokenKind::LParen]
        );
    }

    #[test]
    fn test_named_constants() {
        let mut names = NamedConstants::new();
        names.define("TauxTVA", "0,2").unwrap();
        let tokens = tokenize("A1*tauxtva", &names);
        assert_eq!(tokens[2].kind, TokenKind::Name("tauxtva".into()));
        assert_eq!(tokens[2].raw, "tauxtva");

        let call = tokenize("TauxTVA(1)", &names);
        assert_eq!(call[0].kind, TokenKind::Func("TAUXTVA".into()));
    }

    #[test]
    fn test_raw_and_offsets() {
        let tokens = tokenize("SI( A1 >= 10 ; \"ok\" )", &NamedConstants::new());
        let raws: Vec<&str> = tokens.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(raws, vec!["SI", "(", "A1", ">=", "10", ";", "\"ok\"", ")"]);
        assert_eq!(tokens[2].offset, 4);
        assert_eq!(tokens[3].offset, 7);
    }

    #[test]
    fn test_skipped_characters() {
        let names = NamedConstants::new();
        let mut lexer = Lexer::new("1 # 2 @", &names);
        let tokens = lexer.tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            lexer.skipped(),
            &[
                SkippedChar { ch: '#', offset: 2 },
                SkippedChar { ch: '@', offset: 6 }
            ]
        );
    }

    #[test]
    fn test_invalid_range_is_not_a_range() {
        // 'A0' cannot be addressed, so the compound is not a range
        let k = kinds("A0:B2");
        assert!(!k.iter().any(|t| matches!(t, TokenKind::Range(_))));
    }

    proptest::proptest! {
        /// Every token is a slice of the input at its offset, in order and
        /// without overlap
        #[test]
        fn prop_tokens_cover_their_source(input in "[ -~éà]{0,40}") {
            let tokens = tokenize(&input, &NamedConstants::new());
            let mut end = 0;
            for token in &tokens {
                proptest::prop_assert!(token.offset >= end);
                proptest::prop_assert!(!token.raw.is_empty());
                let slice = input.get(token.offset..token.offset + token.raw.len());
                proptest::prop_assert_eq!(slice, Some(token.raw.as_str()));
                end = token.offset + token.raw.len();
            }
        }
    }
}
