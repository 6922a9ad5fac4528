/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Quoted string literal, already unescaped
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// "tab\there"
    /// ```
    String,

    /// Name made of letters, digits, `_` and `$`
    ///
    /// `true`, `false`, `null` and `undefined` are identifiers at this level;
    /// the parser turns them into literals.
    Identifier,

    /// Member access dot
    Dot,

    /// Argument, element and entry separator
    Comma,

    /// Map entry and ternary separator
    Colon,

    /// Run of decimal digits
    Integer,

    /// Digits with a fractional part, or a fraction with a leading dot
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// .5
    /// ```
    Decimal,

    /// Prefix or infix operator
    Operator,

    /// One of `( ) [ ] { }`
    Grouper,

    /// The `this` keyword
    Keyword,

    /// Arrow function separator (`=>`)
    Arrow,
}

/// A single token pulled from the [`Lexer`](crate::lexer::Lexer).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Binding power used by the parser; zero for anything that does not chain.
    pub precedence: u8,
    /// Character offset of the first character of the token.
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, precedence: u8, position: usize) -> Self {
        Token {
            kind,
            value: value.into(),
            precedence,
            position,
        }
    }

    /// True when the token has the given kind and text.
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_grouper(&self, value: &str) -> bool {
        self.is(TokenKind::Grouper, value)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "{:?}", self.value),
            _ => write!(f, "{}", self.value),
        }
    }
}
