//! Front end for a typed dialect of the HtDP intermediate student language.
//!
//! Source text goes through [`lexer`], [`parser`] and [`type_checker`]; the
//! checked program may then be re-emitted, without annotations, by
//! [`codegen`].

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The type checker walks the AST, computing the type of every definition and
/// collecting diagnostics.
pub mod type_checker;

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod env;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

use crate::{ast::Program, token::Token, util::intern::Interner};

/// A fatal error, which stops the pipeline before type checking.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] lexer::Error),
    #[error(transparent)]
    Parse(#[from] parser::Error),
}

/// Lexes and parses the source. `tokens` is cleared and reused as the token
/// buffer.
pub fn parse_source(
    src: &str,
    tokens: &mut Vec<Token>,
    ident_interner: &mut Interner<str>,
) -> Result<Program, Error> {
    tokens.clear();
    lexer::lex(src, tokens)?;
    let program = parser::parse_program(tokens, ident_interner)?;
    tracing::debug!(
        tokens = tokens.len(),
        exprs = program.exprs.len(),
        "parsed source"
    );
    Ok(program)
}
