use std::collections::HashSet;

use lazy_static::lazy_static;

use crate::lang::error::{Error, Result};
use crate::lang::token::{Token, TokenKind};

lazy_static! {
    static ref KEYWORDS: HashSet<&'static str> = ["if", "else", "while", "true", "false", "print"]
        .iter()
        .copied()
        .collect();
    static ref OPERATORS: HashSet<&'static str> = [
        "+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "&&", "||", "!",
    ]
    .iter()
    .copied()
    .collect();
    static ref SYMBOLS: HashSet<&'static str> =
        ["=", ";", "(", ")", "{", "}"].iter().copied().collect();
}

/// Longest operator/symbol lexeme the scanner will attempt
const MAX_LEXEME_LEN: usize = 3;

/// Convert `input` into tokens, ending with exactly one `Eof` token
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).tokenize()
}

struct Lexer {
    src: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Lexer {
            src: input.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace() {
                self.advance();
            } else if c == '"' {
                self.string()?;
            } else if c.is_ascii_digit() {
                self.number();
            } else if c.is_alphabetic() || c == '_' {
                self.identifier_or_keyword();
            } else {
                self.operator_or_symbol()?;
            }
        }

        self.tokens.push(Token::new(TokenKind::Eof, ""));
        Ok(self.tokens)
    }

    /// String literals carry their raw content; there are no escape sequences
    fn string(&mut self) -> Result<()> {
        self.advance(); // opening quote
        let start = self.pos;
        while !self.is_at_end() && self.peek() != '"' {
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::Lex("unterminated string literal".to_string()));
        }

        let text = self.lexeme(start, self.pos);
        self.advance(); // closing quote
        self.tokens.push(Token::new(TokenKind::String, &text));

        Ok(())
    }

    /// A number is a maximal run of digits and dots
    ///
    /// Nothing stops a second dot here; the parser rejects the literal when it
    /// fails to convert.
    fn number(&mut self) {
        let start = self.pos;
        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            self.advance();
        }

        let text = self.lexeme(start, self.pos);
        self.tokens.push(Token::new(TokenKind::Number, &text));
    }

    fn identifier_or_keyword(&mut self) {
        let start = self.pos;
        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            self.advance();
        }

        let text = self.lexeme(start, self.pos);
        let kind = if KEYWORDS.contains(text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.tokens.push(Token::new(kind, &text));
    }

    /// Longest-match scan over the fixed operator and symbol sets
    fn operator_or_symbol(&mut self) -> Result<()> {
        for len in (1..=MAX_LEXEME_LEN).rev() {
            if self.pos + len > self.src.len() {
                continue;
            }

            let text = self.lexeme(self.pos, self.pos + len);
            let kind = if OPERATORS.contains(text.as_str()) {
                TokenKind::Operator
            } else if SYMBOLS.contains(text.as_str()) {
                TokenKind::Symbol
            } else {
                continue;
            };

            self.pos += len;
            self.tokens.push(Token::new(kind, &text));
            return Ok(());
        }

        Err(Error::Lex(format!("unexpected character: '{}'", self.peek())))
    }

    fn lexeme(&self, start: usize, end: usize) -> String {
        self.src[start..end].iter().collect()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> char {
        self.src[self.pos]
    }

    fn advance(&mut self) -> char {
        let c = self.src[self.pos];
        self.pos += 1;
        c
    }
}

#[test]
fn test_tokenize() {
    let tokens = tokenize(r#"if (x >= 10) { print "big"; } else { y = y + 1.5; }"#)
        .expect("Failed to tokenize");

    let expected = vec![
        (TokenKind::Keyword, "if"),
        (TokenKind::Symbol, "("),
        (TokenKind::Identifier, "x"),
        (TokenKind::Operator, ">="),
        (TokenKind::Number, "10"),
        (TokenKind::Symbol, ")"),
        (TokenKind::Symbol, "{"),
        (TokenKind::Keyword, "print"),
        (TokenKind::String, "big"),
        (TokenKind::Symbol, ";"),
        (TokenKind::Symbol, "}"),
        (TokenKind::Keyword, "else"),
        (TokenKind::Symbol, "{"),
        (TokenKind::Identifier, "y"),
        (TokenKind::Symbol, "="),
        (TokenKind::Identifier, "y"),
        (TokenKind::Operator, "+"),
        (TokenKind::Number, "1.5"),
        (TokenKind::Symbol, ";"),
        (TokenKind::Symbol, "}"),
        (TokenKind::Eof, ""),
    ];

    assert_eq!(tokens.len(), expected.len());
    for (token, (kind, text)) in tokens.iter().zip(expected) {
        assert_eq!(token.kind, kind);
        assert_eq!(token.text, text);
    }
}

#[test]
fn test_longest_match() {
    let tests = vec![
        ("<=", vec!["<="]),
        ("< =", vec!["<", "="]),
        ("===", vec!["==", "="]),
        ("!!=", vec!["!", "!="]),
        ("a&&b", vec!["a", "&&", "b"]),
        ("x<1", vec!["x", "<", "1"]),
    ];

    for (input, expected) in tests {
        let tokens = tokenize(input).expect("Failed to tokenize");
        let texts: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, expected);
    }
}

#[test]
fn test_keywords_vs_identifiers() {
    let tokens = tokenize("while whiles _while print printx iffy").expect("Failed to tokenize");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_permissive_numbers() {
    let tokens = tokenize("1.2.3;").expect("Failed to tokenize");
    assert_eq!(tokens[0], Token::new(TokenKind::Number, "1.2.3"));
    assert_eq!(tokens[1], Token::new(TokenKind::Symbol, ";"));
}

#[test]
fn test_strings() {
    let tokens = tokenize(r#"x = "hello world";"#).expect("Failed to tokenize");
    assert_eq!(tokens[2], Token::new(TokenKind::String, "hello world"));

    let tokens = tokenize(r#""""#).expect("Failed to tokenize");
    assert_eq!(tokens[0], Token::new(TokenKind::String, ""));

    match tokenize(r#"print "oops;"#) {
        Err(Error::Lex(msg)) => assert!(msg.contains("unterminated")),
        _ => assert!(false),
    }
}

#[test]
fn test_unexpected_character() {
    match tokenize("x = 1 @ 2;") {
        Err(Error::Lex(msg)) => assert!(msg.contains("unexpected character")),
        _ => assert!(false),
    }
}

#[test]
fn test_round_trip() {
    let input = r#"x = 1; while (x < 10) { print "x=" + x; x = x + 1; }"#;
    let tokens = tokenize(input).expect("Failed to tokenize");

    let joined = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| {
            if t.kind == TokenKind::String {
                format!("\"{}\"", t.text)
            } else {
                t.text.clone()
            }
        })
        .collect::<Vec<String>>()
        .join(" ");

    let relexed = tokenize(&joined).expect("Failed to tokenize joined output");
    assert_eq!(tokens, relexed);
}
