use thiserror::Error;

use crate::{
    ast::{
        AstFactory, BinOp, EvalFactory, Expr, Literal, POSTFIX_PRECEDENCE, Token, TokenKind,
        UnaryOp,
    },
    lexer::{LexError, Lexer},
};

/// Errors raised while building a tree. No partial tree is ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Token that does not fit the grammar at this point
    #[error("Unexpected token '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    /// Specific token required but something else (or nothing) was found
    #[error("Expected {expected}, got {found}")]
    Expected { expected: String, found: String },

    /// Operator token outside the binary operator set
    #[error("Unknown operator '{operator}' at position {position}")]
    UnknownOperator { operator: String, position: usize },

    /// An operand was required but none could be parsed
    #[error("Expected expression, got {found}")]
    ExpectedExpression { found: String },

    /// Member access without a name after the dot
    #[error("Expected identifier after '.', got {found}")]
    ExpectedIdentifier { found: String },

    /// Arrow function parameter that is not a bare name
    #[error("Arrow function parameters must be identifiers (position {position})")]
    InvalidParameter { position: usize },

    /// `()` not followed by `=>`
    #[error("Empty parentheses at position {position}")]
    EmptyGroup { position: usize },
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(t) => format!("'{}' at position {}", t, t.position),
        None => "end of input".to_string(),
    }
}

/// Precedence-climbing parser over a pull-based [`Lexer`].
///
/// Keeps a single token of lookahead and builds nodes through the supplied
/// [`AstFactory`].
pub struct Parser<'f, F: AstFactory> {
    lexer: Lexer,
    factory: &'f F,
    current_token: Option<Token>,
}

impl<'f, F: AstFactory> Parser<'f, F> {
    /// Creates a parser and reads the first token.
    pub fn new(mut lexer: Lexer, factory: &'f F) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            factory,
            current_token,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_token.as_ref().is_some_and(|t| t.kind == kind)
    }

    fn check_grouper(&self, value: &str) -> bool {
        self.current_token.as_ref().is_some_and(|t| t.is_grouper(value))
    }

    fn expect(&mut self, kind: TokenKind, value: &str) -> Result<(), ParseError> {
        if self.current_token.as_ref().is_some_and(|t| t.is(kind, value)) {
            return self.advance();
        }
        Err(ParseError::Expected {
            expected: format!("'{}'", value),
            found: describe(self.current_token.as_ref()),
        })
    }

    /// Parses the whole input. Blank input yields the factory's empty node.
    pub fn parse(&mut self) -> Result<F::Node, ParseError> {
        if self.current_token.is_none() {
            return Ok(self.factory.empty());
        }
        let expr = self.parse_expression()?;
        match &self.current_token {
            None => Ok(expr),
            Some(t) => Err(ParseError::UnexpectedToken {
                found: t.to_string(),
                position: t.position,
            }),
        }
    }

    /// Full expression: a unary term followed by everything that binds to it.
    pub fn parse_expression(&mut self) -> Result<F::Node, ParseError> {
        let left = self.parse_required_unary()?;
        self.parse_precedence(left, 0)
    }

    fn parse_required_unary(&mut self) -> Result<F::Node, ParseError> {
        match self.parse_unary()? {
            Some(node) => Ok(node),
            None => Err(ParseError::ExpectedExpression {
                found: describe(self.current_token.as_ref()),
            }),
        }
    }

    fn parse_precedence(
        &mut self,
        mut left: F::Node,
        precedence: u8,
    ) -> Result<F::Node, ParseError> {
        while let Some(token) = self.current_token.clone() {
            left = match token.kind {
                TokenKind::Grouper if token.value == "(" => {
                    let args = self.parse_arguments()?;
                    self.factory.invoke(left, None, args)
                }
                TokenKind::Grouper if token.value == "[" => {
                    let argument = self.parse_index()?;
                    self.factory.index(left, argument)
                }
                TokenKind::Dot => {
                    self.advance()?;
                    self.parse_member(left)?
                }
                TokenKind::Operator if token.precedence >= precedence => {
                    if token.value == "?" {
                        self.parse_ternary(left)?
                    } else {
                        self.parse_binary(left, token)?
                    }
                }
                _ => break,
            };
        }
        Ok(left)
    }

    /// Name after a dot, merged into the receiver as a getter or a method call.
    fn parse_member(&mut self, receiver: F::Node) -> Result<F::Node, ParseError> {
        let name = match &self.current_token {
            Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                t.value.clone()
            }
            other => {
                return Err(ParseError::ExpectedIdentifier {
                    found: describe(other.as_ref()),
                });
            }
        };
        self.advance()?;

        if self.check_grouper("(") {
            let args = self.parse_arguments()?;
            Ok(self.factory.invoke(receiver, Some(&name), args))
        } else {
            Ok(self.factory.getter(receiver, &name))
        }
    }

    fn parse_binary(&mut self, left: F::Node, op_token: Token) -> Result<F::Node, ParseError> {
        let op = BinOp::from_symbol(&op_token.value).ok_or_else(|| ParseError::UnknownOperator {
            operator: op_token.value.clone(),
            position: op_token.position,
        })?;
        self.advance()?;

        let mut right = self.parse_required_unary()?;
        while let Some(next) = &self.current_token {
            let binds = match next.kind {
                TokenKind::Operator | TokenKind::Dot => true,
                TokenKind::Grouper => next.value == "(" || next.value == "[",
                _ => false,
            };
            if !binds || next.precedence <= op_token.precedence {
                break;
            }
            let floor = next.precedence;
            right = self.parse_precedence(right, floor)?;
        }

        Ok(self.factory.binary(left, op, right))
    }

    fn parse_unary(&mut self) -> Result<Option<F::Node>, ParseError> {
        let Some(token) = self.current_token.as_ref().filter(|t| t.kind == TokenKind::Operator)
        else {
            return self.parse_primary();
        };
        let symbol = token.value.clone();
        let position = token.position;
        self.advance()?;

        if symbol == "+" || symbol == "-" {
            if self.check(TokenKind::Integer) {
                return self.parse_integer(&symbol).map(Some);
            }
            if self.check(TokenKind::Decimal) {
                return self.parse_decimal(&symbol).map(Some);
            }
        }

        let op = UnaryOp::from_symbol(&symbol).ok_or(ParseError::UnexpectedToken {
            found: symbol,
            position,
        })?;
        // Nested prefixes (`!!flag`) recurse; anything else is a primary
        let primary = match self.parse_unary()? {
            Some(node) => node,
            None => {
                return Err(ParseError::ExpectedExpression {
                    found: describe(self.current_token.as_ref()),
                });
            }
        };
        let operand = self.parse_precedence(primary, POSTFIX_PRECEDENCE)?;
        Ok(Some(self.factory.unary(op, operand)))
    }

    fn parse_ternary(&mut self, condition: F::Node) -> Result<F::Node, ParseError> {
        self.expect(TokenKind::Operator, "?")?;
        let then_branch = self.parse_expression()?;
        self.expect(TokenKind::Colon, ":")?;
        let else_branch = self.parse_expression()?;
        Ok(self.factory.ternary(condition, then_branch, else_branch))
    }

    /// Parse primary expressions (atoms). `None` means the current token
    /// cannot start an operand; callers decide whether that is an error.
    fn parse_primary(&mut self) -> Result<Option<F::Node>, ParseError> {
        let Some(token) = self.current_token.clone() else {
            return Ok(None);
        };

        let node = match token.kind {
            TokenKind::Keyword => {
                self.advance()?;
                self.factory.identifier(&token.value)
            }
            TokenKind::Identifier => self.parse_invoke_or_identifier()?,
            TokenKind::String => {
                self.advance()?;
                self.factory.literal(Literal::String(token.value))
            }
            TokenKind::Integer => self.parse_integer("")?,
            TokenKind::Decimal => self.parse_decimal("")?,
            TokenKind::Grouper => match token.value.as_str() {
                "(" => self.parse_paren_or_function()?,
                "{" => self.parse_map()?,
                "[" => self.parse_list()?,
                _ => return Ok(None),
            },
            TokenKind::Colon => {
                return Err(ParseError::UnexpectedToken {
                    found: ":".to_string(),
                    position: token.position,
                });
            }
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    fn parse_list(&mut self) -> Result<F::Node, ParseError> {
        let mut items = vec![];
        loop {
            self.advance()?; // '[' or ','
            if self.check_grouper("]") {
                break;
            }
            items.push(self.parse_expression()?);
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Grouper, "]")?;
        Ok(self.factory.list(items))
    }

    fn parse_map(&mut self) -> Result<F::Node, ParseError> {
        let mut entries = vec![];
        loop {
            self.advance()?; // '{' or ','
            if self.check_grouper("}") {
                break;
            }
            let key = match &self.current_token {
                Some(t) if matches!(t.kind, TokenKind::String | TokenKind::Identifier) => {
                    t.value.clone()
                }
                other => {
                    return Err(ParseError::Expected {
                        expected: "object key".to_string(),
                        found: describe(other.as_ref()),
                    });
                }
            };
            self.advance()?;
            self.expect(TokenKind::Colon, ":")?;
            entries.push((key, self.parse_expression()?));
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Grouper, "}")?;
        Ok(self.factory.map(entries))
    }

    fn parse_invoke_or_identifier(&mut self) -> Result<F::Node, ParseError> {
        let name = match &self.current_token {
            Some(t) => t.value.clone(),
            None => return Err(ParseError::ExpectedExpression { found: describe(None) }),
        };
        self.advance()?;

        let literal = match name.as_str() {
            "true" => Some(Literal::Boolean(true)),
            "false" => Some(Literal::Boolean(false)),
            "null" => Some(Literal::Null),
            "undefined" => Some(Literal::Undefined),
            _ => None,
        };
        if let Some(literal) = literal {
            return Ok(self.factory.literal(literal));
        }

        // Bare single-parameter arrow: `item => ...`
        if self.check(TokenKind::Arrow) {
            self.advance()?;
            let body = self.parse_expression()?;
            return Ok(self.factory.arrow_function(vec![name], body));
        }

        let identifier = self.factory.identifier(&name);
        if self.check_grouper("(") {
            let args = self.parse_arguments()?;
            Ok(self.factory.invoke(identifier, None, args))
        } else {
            Ok(identifier)
        }
    }

    /// Comma separated expressions between `(` and `)`, the cursor sitting on `(`.
    fn parse_arguments(&mut self) -> Result<Vec<F::Node>, ParseError> {
        let mut args = vec![];
        loop {
            self.advance()?; // '(' or ','
            if self.check_grouper(")") {
                break;
            }
            args.push(self.parse_expression()?);
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Grouper, ")")?;
        Ok(args)
    }

    fn parse_index(&mut self) -> Result<F::Node, ParseError> {
        self.advance()?; // '['
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Grouper, "]")?;
        Ok(expr)
    }

    /// `(a, b) => body` when an arrow follows the closing paren, otherwise a
    /// plain group keeping only its first element.
    fn parse_paren_or_function(&mut self) -> Result<F::Node, ParseError> {
        let position = self.current_token.as_ref().map_or(0, |t| t.position);
        let expressions = self.parse_arguments()?;

        if self.check(TokenKind::Arrow) {
            self.advance()?;
            let body = self.parse_expression()?;
            let params = expressions
                .iter()
                .map(|e| self.factory.parameter_name(e))
                .collect::<Option<Vec<_>>>()
                .ok_or(ParseError::InvalidParameter { position })?;
            return Ok(self.factory.arrow_function(params, body));
        }

        match expressions.into_iter().next() {
            Some(first) => Ok(self.factory.paren(first)),
            None => Err(ParseError::EmptyGroup { position }),
        }
    }

    fn parse_integer(&mut self, prefix: &str) -> Result<F::Node, ParseError> {
        let text = format!("{}{}", prefix, self.current_token.as_ref().map_or("", |t| t.value.as_str()));
        let literal = match text.parse::<i64>() {
            Ok(n) => Literal::Integer(n),
            // Beyond i64: keep the magnitude as a float
            Err(_) => Literal::Float(text.parse::<f64>().unwrap_or(f64::NAN)),
        };
        self.advance()?;
        Ok(self.factory.literal(literal))
    }

    fn parse_decimal(&mut self, prefix: &str) -> Result<F::Node, ParseError> {
        let text = format!("{}{}", prefix, self.current_token.as_ref().map_or("", |t| t.value.as_str()));
        let value = text.parse::<f64>().unwrap_or(f64::NAN);
        self.advance()?;
        Ok(self.factory.literal(Literal::Float(value)))
    }
}

/// Parses `source` with the given factory.
pub fn parse<F: AstFactory>(source: &str, factory: &F) -> Result<F::Node, ParseError> {
    Parser::new(Lexer::new(source), factory)?.parse()
}

/// Parses `source` into an evaluable [`Expr`].
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    parse(source, &EvalFactory)
}
