use thiserror::Error;

use crate::ast::{POSTFIX_PRECEDENCE, Token, TokenKind, precedence};

/// Errors raised while turning source text into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    /// Input ended before the closing quote
    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    /// Character that cannot start any token
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },
}

/// Pull-based tokenizer.
///
/// Holds nothing but the source and a cursor; every call to
/// [`Lexer::next_token`] scans exactly one token.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

const TRIPLE_OPERATORS: [&str; 2] = ["===", "!=="];
const DOUBLE_OPERATORS: [&str; 7] = ["==", "!=", "<=", ">=", "||", "&&", "??"];

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

fn is_operator(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '%' | '!' | '<' | '>' | '=' | '?' | '^' | '|' | '&'
    )
}

fn is_grouper(ch: char) -> bool {
    matches!(ch, '(' | ')' | '[' | ']' | '{' | '}')
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Character offset of the cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(is_whitespace) {
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while self.current_char().is_some_and(is_identifier_part) {
            self.advance();
        }
        let value = self.slice(start);
        let kind = if value == "this" {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, value, 0, start)
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening quote

        loop {
            match self.current_char() {
                None => return Err(LexError::UnterminatedString { position: start }),
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(Token::new(TokenKind::String, result, 0, start));
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self
                        .current_char()
                        .ok_or(LexError::UnterminatedString { position: start })?;
                    result.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        other => other,
                    });
                    self.advance();
                }
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_digits(&mut self) {
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Integer or decimal starting at the cursor, which sits on a digit or on
    /// a dot that is followed by a digit.
    fn read_number(&mut self) -> Token {
        let start = self.position;
        self.read_digits();

        let is_fraction = self.current_char() == Some('.')
            && self.peek_char(1).is_some_and(|c| c.is_ascii_digit());
        if is_fraction {
            self.advance(); // '.'
            self.read_digits();
            Token::new(TokenKind::Decimal, self.slice(start), 0, start)
        } else {
            Token::new(TokenKind::Integer, self.slice(start), 0, start)
        }
    }

    fn read_operator(&mut self) -> Token {
        let start = self.position;
        let lookahead = |len: usize| -> String {
            self.input[start..(start + len).min(self.input.len())]
                .iter()
                .collect()
        };

        let three = lookahead(3);
        let two = lookahead(2);
        let (value, kind) = if TRIPLE_OPERATORS.contains(&three.as_str()) {
            (three, TokenKind::Operator)
        } else if two == "=>" {
            (two, TokenKind::Arrow)
        } else if DOUBLE_OPERATORS.contains(&two.as_str()) {
            (two, TokenKind::Operator)
        } else {
            (lookahead(1), TokenKind::Operator)
        };

        self.position += value.chars().count();
        let precedence = match kind {
            TokenKind::Arrow => 0,
            _ => precedence(&value),
        };
        Token::new(kind, value, precedence, start)
    }

    fn single(&mut self, kind: TokenKind, ch: char, precedence: u8) -> Token {
        let start = self.position;
        self.advance();
        Token::new(kind, ch, precedence, start)
    }

    /// Scans the next token, or returns `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(ch) = self.current_char() else {
            return Ok(None);
        };

        let token = match ch {
            '"' | '\'' => self.read_string(ch)?,
            c if is_identifier_start(c) => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            '.' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            '.' => self.single(TokenKind::Dot, ch, POSTFIX_PRECEDENCE),
            ',' => self.single(TokenKind::Comma, ch, 0),
            ':' => self.single(TokenKind::Colon, ch, 0),
            c if is_operator(c) => self.read_operator(),
            c if is_grouper(c) => self.single(TokenKind::Grouper, ch, precedence(&c.to_string())),
            c => {
                return Err(LexError::UnexpectedCharacter {
                    ch: c,
                    position: self.position,
                });
            }
        };

        Ok(Some(token))
    }

    /// Drains the remaining input into a token list.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[test]
fn test_keyword_and_identifiers() {
    let mut lexer = Lexer::new("this true $el");
    let this = lexer.next_token().unwrap().unwrap();
    assert_eq!(this.kind, TokenKind::Keyword);
    let t = lexer.next_token().unwrap().unwrap();
    assert_eq!((t.kind, t.value.as_str()), (TokenKind::Identifier, "true"));
    let el = lexer.next_token().unwrap().unwrap();
    assert_eq!((el.kind, el.value.as_str()), (TokenKind::Identifier, "$el"));
    assert_eq!(lexer.next_token().unwrap(), None);
}

#[test]
fn test_call_chain() {
    let kinds: Vec<TokenKind> = Lexer::new("a.b(1, 'x')")
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Grouper,
            TokenKind::Integer,
            TokenKind::Comma,
            TokenKind::String,
            TokenKind::Grouper,
        ]
    );
}
