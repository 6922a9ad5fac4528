/// Binding power of postfix access: `(`, `[`, `.` and `{`.
pub const POSTFIX_PRECEDENCE: u8 = 13;

/// Precedence of an operator or grouper symbol.
///
/// Symbols missing from the table (`=`, `^`, `|`, `&`) bind at zero, the same
/// as the closing groupers and separators.
pub fn precedence(symbol: &str) -> u8 {
    match symbol {
        "!" | ":" | "," | ")" | "]" | "}" => 0,
        "?" => 2,
        "??" => 3,
        "||" => 4,
        "&&" => 5,
        "==" | "!=" | "===" | "!==" => 9,
        ">=" | ">" | "<=" | "<" => 10,
        "+" | "-" => 11,
        "%" | "/" | "*" => 12,
        "(" | "[" | "." | "{" => POSTFIX_PRECEDENCE,
        _ => 0,
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// Assignment (`=`)
    Assign,

    // Arithmetic
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Remainder (`%`)
    Modulo,

    // Comparison
    /// Loose equality (`==`)
    Equal,
    /// Loose inequality (`!=`)
    NotEqual,
    /// Strict equality (`===`)
    StrictEqual,
    /// Strict inequality (`!==`)
    StrictNotEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than (`<`)
    LessThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Less than or equal (`<=`)
    LessEqual,

    // Logical
    /// Short-circuit OR (`||`)
    Or,
    /// Short-circuit AND (`&&`)
    And,

    /// Nullish coalescing (`??`)
    NullCoalesce,
}

impl BinOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinOp::*;
        Some(match symbol {
            "=" => Assign,
            "+" => Add,
            "-" => Subtract,
            "*" => Multiply,
            "/" => Divide,
            "%" => Modulo,
            "==" => Equal,
            "!=" => NotEqual,
            "===" => StrictEqual,
            "!==" => StrictNotEqual,
            ">" => GreaterThan,
            "<" => LessThan,
            ">=" => GreaterEqual,
            "<=" => LessEqual,
            "||" => Or,
            "&&" => And,
            "??" => NullCoalesce,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        use BinOp::*;
        match self {
            Assign => "=",
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Equal => "==",
            NotEqual => "!=",
            StrictEqual => "===",
            StrictNotEqual => "!==",
            GreaterThan => ">",
            LessThan => "<",
            GreaterEqual => ">=",
            LessEqual => "<=",
            Or => "||",
            And => "&&",
            NullCoalesce => "??",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Numeric identity (`+`)
    Plus,
    /// Numeric negation (`-`)
    Minus,
    /// Logical not (`!`)
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(UnaryOp::Plus),
            "-" => Some(UnaryOp::Minus),
            "!" => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        }
    }
}
