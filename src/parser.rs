use std::mem;

use crate::{
    ast::{
        CondClause, Define, DefineKind, DefineStruct, Expr, FunctionValue, FunctionValueKind,
        Ident, LetKind, Parameters, Program, TypeAnnotation, TypeAnnotationKind, TypedParameter,
        TypedParameters, UntypedParameters, ValuePair,
    },
    token::{Position, Range, Token, TokenKind},
    util::intern::Interner,
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses a whole program out of the provided tokens.
///
/// Parsing aborts on the first unexpected token.
pub fn parse_program(tokens: &[Token], ident_interner: &mut Interner<str>) -> Result<Program> {
    Parser::new(tokens, ident_interner).parse_program()
}

/// Parses a single value expression, requiring the input to be exhausted after
/// it.
pub fn parse_value(tokens: &[Token], ident_interner: &mut Interner<str>) -> Result<FunctionValue> {
    let mut p = Parser::new(tokens, ident_interner);
    let value = p.parse_value()?;
    if p.peek().is_some() {
        return Err(p.error("end of input"));
    }
    Ok(value)
}

struct Parser<'tok, 'ident> {
    tokens: &'tok [Token],
    ident_interner: &'ident mut Interner<str>,
    cursor: usize,
    /// End position of the last consumed token.
    prev_end: Position,
}

impl<'tok> Parser<'tok, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut exprs = Vec::with_capacity(16);
        while self.peek().is_some() {
            exprs.push(self.parse_expr()?);
        }
        tracing::debug!(exprs = exprs.len(), "parsed program");
        Ok(Program { exprs })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.form_keyword() {
            Some(TokenKind::Define) => self.parse_define().map(Expr::Define),
            Some(TokenKind::DefineStruct) => self.parse_define_struct().map(Expr::DefineStruct),
            _ => self.parse_value().map(Expr::Value),
        }
    }

    fn parse_define(&mut self) -> Result<Define> {
        let docs = self.docs_before_cursor();
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::Define)?;

        let (name, kind) = if self.is(&TokenKind::LParen) {
            self.advance();
            let name = self.parse_ident()?;
            let params = self.parse_parameters()?;
            self.consume(&TokenKind::RParen)?;
            let body = self.parse_value()?;
            let kind = DefineKind::Function {
                params,
                body: Box::new(body),
            };
            (name, kind)
        } else {
            let name = self.parse_ident()?;
            let value = self.parse_value()?;
            let kind = DefineKind::Constant {
                value: Box::new(value),
            };
            (name, kind)
        };

        let close = self.consume(&TokenKind::RParen)?;
        Ok(Define {
            docs,
            name,
            kind,
            range: open.range.to(close.range),
        })
    }

    fn parse_define_struct(&mut self) -> Result<DefineStruct> {
        let docs = self.docs_before_cursor();
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::DefineStruct)?;
        let name = self.parse_ident()?;
        self.consume(&TokenKind::LParen)?;
        let fields = self.parse_parameters()?;
        self.consume(&TokenKind::RParen)?;
        let close = self.consume(&TokenKind::RParen)?;
        Ok(DefineStruct {
            docs,
            name,
            fields,
            range: open.range.to(close.range),
        })
    }

    /// Parses a parameter list, up to (but not including) its closing
    /// parenthesis.
    ///
    /// The list is typed iff its first name is followed by a `:`.
    fn parse_parameters(&mut self) -> Result<Parameters> {
        let is_typed = matches!(self.peek_kind(), Some(TokenKind::Identifier(_)))
            && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::Colon));

        if !is_typed {
            let mut names = Vec::new();
            while !self.is(&TokenKind::RParen) {
                names.push(self.parse_ident()?);
            }
            let range = match (names.first(), names.last()) {
                (Some(first), Some(last)) => first.range.to(last.range),
                _ => Range::empty_at(self.current_start()),
            };
            return Ok(Parameters::Untyped(UntypedParameters { names, range }));
        }

        let start = self.current_start();
        let mut params = Vec::new();
        loop {
            let name = self.parse_ident()?;
            self.consume(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(TypedParameter { name, ty });
            if !self.take(&TokenKind::Ampersand) {
                break;
            }
        }
        let return_ty = if self.take(&TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        Ok(Parameters::Typed(TypedParameters {
            params,
            return_ty,
            range: Range::new(start, self.prev_end),
        }))
    }

    fn parse_type(&mut self) -> Result<TypeAnnotation> {
        if !self.is(&TokenKind::LParen) {
            let name = self.parse_ident().map_err(|e| e.expecting("type"))?;
            return Ok(TypeAnnotation {
                kind: TypeAnnotationKind::Literal(name),
                range: name.range,
            });
        }
        let open = self.consume(&TokenKind::LParen)?;
        let name = self.parse_ident()?;
        let mut args = Vec::new();
        while !self.is(&TokenKind::RParen) {
            args.push(self.parse_type()?);
        }
        let close = self.consume(&TokenKind::RParen)?;
        Ok(TypeAnnotation {
            kind: TypeAnnotationKind::Function { name, args },
            range: open.range.to(close.range),
        })
    }

    fn parse_value(&mut self) -> Result<FunctionValue> {
        if !self.is(&TokenKind::LParen) {
            return self.parse_atom();
        }
        match self.form_keyword() {
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::Cond) => self.parse_cond(),
            Some(TokenKind::Lambda) => self.parse_lambda(),
            Some(TokenKind::Local) => self.parse_local(),
            Some(TokenKind::Let) => self.parse_let(LetKind::Let),
            Some(TokenKind::LetRec) => self.parse_let(LetKind::LetRec),
            Some(TokenKind::LetStar) => self.parse_let(LetKind::LetStar),
            Some(TokenKind::Require) => self.parse_require(),
            _ => self.parse_call(),
        }
    }

    fn parse_if(&mut self) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::If)?;
        let condition = self.parse_value()?;
        let then_arm = self.parse_value()?;
        let else_arm = self.parse_value()?;
        let close = self.consume(&TokenKind::RParen)?;
        let kind = FunctionValueKind::If {
            condition: Box::new(condition),
            then_arm: Box::new(then_arm),
            else_arm: Box::new(else_arm),
        };
        Ok(self.wrap(kind, open, close))
    }

    fn parse_cond(&mut self) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::Cond)?;

        let mut clauses = Vec::new();
        while self.is(&TokenKind::LParen) && self.form_keyword() != Some(&TokenKind::Else) {
            let clause_open = self.consume(&TokenKind::LParen)?;
            let condition = self.parse_value()?;
            let body = self.parse_value()?;
            let clause_close = self.consume(&TokenKind::RParen)?;
            clauses.push(CondClause {
                condition,
                body,
                range: clause_open.range.to(clause_close.range),
            });
        }
        if clauses.is_empty() {
            return Err(self.error("cond clause"));
        }

        let else_arm = if self.is(&TokenKind::LParen) {
            self.consume(&TokenKind::LParen)?;
            self.consume(&TokenKind::Else)?;
            let else_arm = self.parse_value()?;
            self.consume(&TokenKind::RParen)?;
            Some(Box::new(else_arm))
        } else {
            None
        };

        let close = self.consume(&TokenKind::RParen)?;
        let kind = FunctionValueKind::Cond { clauses, else_arm };
        Ok(self.wrap(kind, open, close))
    }

    fn parse_lambda(&mut self) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::Lambda)?;
        self.consume(&TokenKind::LParen)?;
        let params = self.parse_parameters()?;
        self.consume(&TokenKind::RParen)?;
        let body = self.parse_value()?;
        let close = self.consume(&TokenKind::RParen)?;
        let kind = FunctionValueKind::Lambda {
            params,
            body: Box::new(body),
        };
        Ok(self.wrap(kind, open, close))
    }

    fn parse_local(&mut self) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::Local)?;
        self.consume(&TokenKind::LParen)?;
        let mut definitions = Vec::new();
        while !self.is(&TokenKind::RParen) {
            definitions.push(self.parse_define()?);
        }
        self.consume(&TokenKind::RParen)?;
        let body = self.parse_value()?;
        let close = self.consume(&TokenKind::RParen)?;
        let kind = FunctionValueKind::Local {
            definitions,
            body: Box::new(body),
        };
        Ok(self.wrap(kind, open, close))
    }

    fn parse_let(&mut self, let_kind: LetKind) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        self.advance(); // let keyword, already checked by the caller
        self.consume(&TokenKind::LParen)?;
        let mut bindings = Vec::new();
        while !self.is(&TokenKind::RParen) {
            let pair_open = self.consume(&TokenKind::LParen)?;
            let name = self.parse_ident()?;
            let value = self.parse_value()?;
            let pair_close = self.consume(&TokenKind::RParen)?;
            bindings.push(ValuePair {
                name,
                value,
                range: pair_open.range.to(pair_close.range),
            });
        }
        self.consume(&TokenKind::RParen)?;
        let body = self.parse_value()?;
        let close = self.consume(&TokenKind::RParen)?;
        let kind = FunctionValueKind::Let {
            kind: let_kind,
            bindings,
            body: Box::new(body),
        };
        Ok(self.wrap(kind, open, close))
    }

    fn parse_require(&mut self) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        self.consume(&TokenKind::Require)?;
        let module = self.parse_ident()?;
        let close = self.consume(&TokenKind::RParen)?;
        Ok(self.wrap(FunctionValueKind::Require { module }, open, close))
    }

    /// A generic call. The callee may itself be any value expression.
    fn parse_call(&mut self) -> Result<FunctionValue> {
        let open = self.consume(&TokenKind::LParen)?;
        let callee = self.parse_value()?;
        let mut args = Vec::new();
        while !self.is(&TokenKind::RParen) {
            args.push(self.parse_value()?);
        }
        let close = self.consume(&TokenKind::RParen)?;
        let kind = FunctionValueKind::Call {
            callee: Box::new(callee),
            args,
        };
        Ok(self.wrap(kind, open, close))
    }

    fn parse_atom(&mut self) -> Result<FunctionValue> {
        let Some(token) = self.peek() else {
            return Err(self.error("expression"));
        };
        let kind = match &token.kind {
            TokenKind::Integer(value) => FunctionValueKind::Integer(*value),
            TokenKind::Fraction {
                numerator,
                denominator,
            } => FunctionValueKind::Fraction {
                numerator: *numerator,
                denominator: *denominator,
            },
            TokenKind::Decimal(value) => FunctionValueKind::Decimal(*value),
            TokenKind::String(value) => FunctionValueKind::String(value.clone()),
            TokenKind::Boolean(value) => FunctionValueKind::Bool(*value),
            TokenKind::Identifier(_) => {
                let ident = self.parse_ident()?;
                return Ok(FunctionValue {
                    kind: FunctionValueKind::Id(ident),
                    range: ident.range,
                });
            }
            TokenKind::Symbol(value) => FunctionValueKind::Symbol(self.ident_interner.intern(value)),
            _ => return Err(self.error("expression")),
        };
        self.advance();
        Ok(FunctionValue {
            kind,
            range: token.range,
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                range,
            }) => {
                let ident = Ident {
                    name: self.ident_interner.intern(name),
                    range: *range,
                };
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error("identifier")),
        }
    }

    /// Returns the docstrings which immediately precede the current token, in
    /// source order.
    fn docs_before_cursor(&self) -> Vec<Box<str>> {
        let mut docs: Vec<_> = self.tokens[..self.cursor]
            .iter()
            .rev()
            .map_while(|token| match &token.kind {
                TokenKind::Docstring(text) => Some(text.clone()),
                _ => None,
            })
            .collect();
        docs.reverse();
        docs
    }

    fn wrap(&self, kind: FunctionValueKind, open: &Token, close: &Token) -> FunctionValue {
        FunctionValue {
            kind,
            range: open.range.to(close.range),
        }
    }
}

impl<'tok> Parser<'tok, '_> {
    fn new<'ident>(
        tokens: &'tok [Token],
        ident_interner: &'ident mut Interner<str>,
    ) -> Parser<'tok, 'ident> {
        let mut p = Parser {
            tokens,
            ident_interner,
            cursor: 0,
            prev_end: Position::START,
        };
        p.setup();
        p
    }

    /// Setups the parser, skipping any trivia if necessary.
    fn setup(&mut self) {
        self.cursor = self.skip_trivia(0);
    }

    /// Returns the index of the first non-trivia token at or after `i`.
    fn skip_trivia(&self, mut i: usize) -> usize {
        while self.tokens.get(i).is_some_and(|t| t.kind.is_trivia()) {
            i += 1;
        }
        i
    }

    /// Returns the current token, or `None` if the input is exhausted.
    fn peek(&self) -> Option<&'tok Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<&'tok TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    /// Returns the token after the current one, without advancing.
    fn peek_next(&self) -> Option<&'tok Token> {
        let i = self.skip_trivia(self.cursor + 1);
        self.tokens.get(i)
    }

    /// If the current token opens a form, returns the kind of the token right
    /// after the parenthesis.
    fn form_keyword(&self) -> Option<&'tok TokenKind> {
        if self.is(&TokenKind::LParen) {
            self.peek_next().map(|t| &t.kind)
        } else {
            None
        }
    }

    /// Returns the current token and advances. Skips any trivia.
    fn advance(&mut self) -> Option<&'tok Token> {
        let c = self.peek()?;
        self.prev_end = c.range.end;
        self.cursor = self.skip_trivia(self.cursor + 1);
        Some(c)
    }

    /// Checks whether the current token is of the given kind. Payloads are not
    /// compared.
    fn is(&self, expect: &TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|kind| mem::discriminant(kind) == mem::discriminant(expect))
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: &TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, fails with an error.
    fn consume(&mut self, expect: &TokenKind) -> Result<&'tok Token> {
        match self.peek() {
            Some(c) if self.is(expect) => {
                self.advance();
                Ok(c)
            }
            _ => Err(self.error(expect.name())),
        }
    }

    /// Start position of the current token, or the end of the last one if the
    /// input is exhausted.
    fn current_start(&self) -> Position {
        self.peek().map_or(self.prev_end, |t| t.range.start)
    }

    fn error(&self, expected: &'static str) -> Error {
        let (actual, position) = match self.peek() {
            Some(token) => (token.kind.name(), token.range.start),
            None => ("end of input", self.tokens.last().map_or(Position::START, |t| t.range.end)),
        };
        Error {
            expected,
            actual,
            position,
            token_index: self.cursor,
        }
    }
}

/// A fatal syntax error. Parsing stops at the first one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} at position {position}, token {token_index}, got {actual}")]
pub struct Error {
    pub expected: &'static str,
    pub actual: &'static str,
    pub position: Position,
    pub token_index: usize,
}

impl Error {
    fn expecting(self, expected: &'static str) -> Error {
        Error { expected, ..self }
    }
}
