use std::fmt;

#[derive(Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
}

impl Token {
    pub fn new(kind: TokenKind, range: Range) -> Token {
        Token { kind, range }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.range)
    }
}

/// A point in the source text.
///
/// Lines and columns are 1-based and count characters; `index` is the 0-based
/// byte offset into the source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub index: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        index: 0,
    };

    pub const fn new(line: u32, column: u32, index: usize) -> Position {
        Position {
            line,
            column,
            index,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source range. `end` is the position of the first character *after* the
/// ranged text.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Range {
        Range { start, end }
    }

    /// An empty range at the provided position.
    pub const fn empty_at(pos: Position) -> Range {
        Range {
            start: pos,
            end: pos,
        }
    }

    /// Returns the range starting at `self` and ending at `other`.
    pub fn to(self, other: Range) -> Range {
        Range {
            start: self.start,
            end: other.end,
        }
    }

    pub fn contains(&self, other: &Range) -> bool {
        self.start.index <= other.start.index && other.end.index <= self.end.index
    }

    pub fn is_multiline(&self) -> bool {
        self.start.line != self.end.line
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Range({self})")
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// `(` or `[`
    LParen,
    /// `)` or `]`
    RParen,

    Define,
    DefineStruct,
    If,
    Cond,
    Else,
    Lambda,
    Local,
    Let,
    LetRec,
    LetStar,
    Require,

    Integer(i64),
    /// An exact fraction, such as `2/3`.
    Fraction {
        numerator: i64,
        denominator: i64,
    },
    /// An inexact number, such as `2.5`.
    Decimal(f64),
    String(Box<str>),
    Boolean(bool),
    Identifier(Box<str>),
    /// A quoted symbol. The value excludes the quote.
    Symbol(Box<str>),

    /// `:`
    Colon,
    /// `&`
    Ampersand,
    /// `->`
    Arrow,
    /// Free text captured from a `;;@` comment line.
    Docstring(Box<str>),
}

impl TokenKind {
    /// Tokens which the parser skips over.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Docstring(_))
    }

    /// A short human-readable name of the token kind, used in diagnostics.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            LParen => "`(`",
            RParen => "`)`",
            Define => "`define`",
            DefineStruct => "`define-struct`",
            If => "`if`",
            Cond => "`cond`",
            Else => "`else`",
            Lambda => "`lambda`",
            Local => "`local`",
            Let => "`let`",
            LetRec => "`letrec`",
            LetStar => "`let*`",
            Require => "`require`",
            Integer(_) => "number",
            Fraction { .. } => "exact number",
            Decimal(_) => "inexact number",
            String(_) => "string",
            Boolean(_) => "boolean",
            Identifier(_) => "identifier",
            Symbol(_) => "symbol",
            Colon => "`:`",
            Ampersand => "`&`",
            Arrow => "`->`",
            Docstring(_) => "docstring",
        }
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "define" => TokenKind::Define,
    "define-struct" => TokenKind::DefineStruct,
    "if" => TokenKind::If,
    "cond" => TokenKind::Cond,
    "else" => TokenKind::Else,
    "lambda" => TokenKind::Lambda,
    "local" => TokenKind::Local,
    "let" => TokenKind::Let,
    "letrec" => TokenKind::LetRec,
    "let*" => TokenKind::LetStar,
    "require" => TokenKind::Require,
    "true" => TokenKind::Boolean(true),
    "false" => TokenKind::Boolean(false),
};
