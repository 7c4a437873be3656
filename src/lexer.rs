use std::str::Chars;

use crate::token::{Position, Range, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

/// Characters, besides ASCII letters, which may start an identifier. Digits
/// may only appear after the first character.
const EXTRA_IDENTIFIER_CHARS: &[char] = &['-', '_', '?', '!', '=', '<', '>', '+', '*', '/'];

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// Lexing stops at the first fatal error. In that case the buffer holds every
/// token produced before the failure.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<(), Error> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens)?;
    Ok(tokens)
}

struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Chars<'src>,
    cursor: usize,
    line: u32,
    column: u32,
    /// Start position of the token being scanned.
    start: Position,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) -> Result<(), Error> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let current = self.mark_advance();
            if current == '\0' && self.cursor == self.start.index {
                break;
            }
            if let Some(kind) = self.scan_token_kind(current)? {
                self.produce(kind);
            }
        }
        tracing::trace!(tokens = self.tokens.len(), "finished lexing");
        Ok(())
    }

    /// Tries to scan a token which starts with the provided character. Returns
    /// `None` for whitespace and comments.
    fn scan_token_kind(&mut self, current: char) -> Result<Option<TokenKind>, Error> {
        use TokenKind::*;
        let kind = match current {
            ' ' | '\t' | '\n' | '\r' => return Ok(None),
            '(' | '[' => LParen,
            ')' | ']' => RParen,
            ':' => Colon,
            '&' => Ampersand,
            '-' if self.peek() == '>' => self.advance_with(Arrow),
            '"' => self.string()?,
            '\'' => self.symbol(),
            ';' => return Ok(self.comment()),
            '#' => match self.peek() {
                '|' => return self.block_comment().map(|()| None),
                _ => self.hash_boolean()?,
            },
            c if c.is_ascii_digit() => self.number()?,
            c if is_identifier_start(c) => self.identifier_or_keyword(),
            c => {
                tracing::trace!(char = ?c, at = %self.start, "skipping unexpected character");
                return Ok(None);
            }
        };
        Ok(Some(kind))
    }

    /// Lexes a string literal. Only `\"` and `\\` are valid escapes.
    ///
    /// An unterminated string runs silently to the end of the input.
    fn string(&mut self) -> Result<TokenKind, Error> {
        let mut value = String::new();
        loop {
            match self.advance() {
                '\0' if self.is_at_end() => break,
                '"' => break,
                '\\' => match self.peek() {
                    c @ ('"' | '\\') => {
                        self.advance();
                        value.push(c);
                    }
                    c => return Err(self.error(ErrorKind::InvalidEscape(c))),
                },
                c => value.push(c),
            }
        }
        Ok(TokenKind::String(value.into_boxed_str()))
    }

    fn symbol(&mut self) -> TokenKind {
        let lo = self.cursor;
        self.eat_identifier_chars();
        TokenKind::Symbol(Box::from(&self.src[lo..self.cursor]))
    }

    /// Skips a line comment, or captures its text as a docstring if it starts
    /// with the `;;@` marker.
    fn comment(&mut self) -> Option<TokenKind> {
        let is_docstring = self.rest().starts_with(";@");
        if is_docstring {
            self.advance();
            self.advance();
            if self.peek() == ' ' {
                self.advance();
            }
        }
        let lo = self.cursor;
        while !matches!(self.peek(), '\n' | '\0') {
            self.advance();
        }
        let text = &self.src[lo..self.cursor];
        is_docstring.then(|| TokenKind::Docstring(Box::from(text.trim_end_matches('\r'))))
    }

    fn block_comment(&mut self) -> Result<(), Error> {
        assert_eq!(self.advance(), '|');
        loop {
            if self.rest().starts_with("|#") {
                self.advance();
                self.advance();
                return Ok(());
            }
            if self.is_at_end() {
                return Err(self.error(ErrorKind::UnterminatedBlockComment));
            }
            self.advance();
        }
    }

    /// Lexes `#true` or `#false`. Only the keyword prefix is checked.
    fn hash_boolean(&mut self) -> Result<TokenKind, Error> {
        for (word, value) in [("true", true), ("false", false)] {
            if self.rest().starts_with(word) {
                for _ in 0..word.len() {
                    self.advance();
                }
                return Ok(TokenKind::Boolean(value));
            }
        }
        Err(self.error(ErrorKind::InvalidHashLiteral))
    }

    fn number(&mut self) -> Result<TokenKind, Error> {
        self.eat_digits();
        let followed_by_digit = |this: &Self| this.peek_second().is_ascii_digit();

        if self.peek() == '.' && followed_by_digit(self) {
            self.advance();
            self.eat_digits();
            let value = self
                .substr()
                .parse::<f64>()
                .map_err(|_| self.error(ErrorKind::InvalidNumber))?;
            return Ok(TokenKind::Decimal(value));
        }

        if self.peek() == '/' && followed_by_digit(self) {
            self.advance();
            self.eat_digits();
            let parts: Vec<_> = self.substr().split('/').collect();
            let [numerator, denominator] = parts.as_slice() else {
                return Err(self.error(ErrorKind::InvalidFraction));
            };
            let numerator: i64 = numerator
                .parse()
                .map_err(|_| self.error(ErrorKind::InvalidFraction))?;
            let denominator: i64 = denominator
                .parse()
                .map_err(|_| self.error(ErrorKind::InvalidFraction))?;
            if denominator == 0 {
                return Err(self.error(ErrorKind::InvalidFraction));
            }
            return Ok(TokenKind::Fraction {
                numerator,
                denominator,
            });
        }

        let value = self
            .substr()
            .parse()
            .map_err(|_| self.error(ErrorKind::InvalidNumber))?;
        Ok(TokenKind::Integer(value))
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        self.eat_identifier_chars();
        let substr = self.substr();
        match KEYWORDS.get(substr) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Identifier(Box::from(substr)),
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    fn eat_identifier_chars(&mut self) {
        while is_identifier_continue(self.peek()) {
            self.advance();
        }
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars(),
            cursor: 0,
            line: 1,
            column: 1,
            start: Position::START,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.start = self.position();
        self.advance()
    }

    /// Returns the next character and advances the iterator. Returns `'\0'`
    /// once the input is exhausted.
    fn advance(&mut self) -> char {
        let Some(c) = self.iter.next() else {
            return '\0';
        };
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&self) -> char {
        self.iter.clone().next().unwrap_or('\0')
    }

    /// Returns the character after the next one without advancing.
    fn peek_second(&self) -> char {
        self.iter.clone().nth(1).unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.src.len()
    }

    /// The not yet consumed input.
    fn rest(&self) -> &str {
        &self.src[self.cursor..]
    }

    /// Returns the current position, that is, the position of the next
    /// character.
    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.cursor)
    }

    /// Returns the range of the token being scanned.
    fn range(&self) -> Range {
        Range::new(self.start, self.position())
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        &self.src[self.start.index..self.cursor]
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        let range = self.range();
        self.tokens.push(Token::new(kind, range));
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            kind,
            range: self.range(),
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || EXTRA_IDENTIFIER_CHARS.contains(&c)
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || EXTRA_IDENTIFIER_CHARS.contains(&c)
}

/// A fatal lexical error. Lexing can't continue past it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {}", .range.start)]
pub struct Error {
    pub kind: ErrorKind,
    pub range: Range,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("unterminated block comment")]
    UnterminatedBlockComment,
    #[error("invalid character after `#`, expected `true`, `false` or `|`")]
    InvalidHashLiteral,
    #[error("invalid fraction literal")]
    InvalidFraction,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(char),
}
