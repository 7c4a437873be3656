//! Builtin signature tables ("language environments").
//!
//! Each teaching-language tier is a static map from builtin name to a compact
//! signature descriptor. The checker only sees the resulting
//! [`LanguageEnvironment`], so tables may be swapped or extended without
//! touching it.

use crate::types::{Arg, CodeType};

/// A compact, statically constructible description of a builtin's type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Number,
    String,
    Boolean,
    Symbol,
    Any,
    Flexible,
    ListOf(&'static Shape),
}

impl Shape {
    pub fn to_code_type(self) -> CodeType {
        match self {
            Shape::Number => CodeType::Number,
            Shape::String => CodeType::String,
            Shape::Boolean => CodeType::Boolean,
            Shape::Symbol => CodeType::Symbol,
            Shape::Any => CodeType::Any,
            Shape::Flexible => CodeType::Flexible,
            Shape::ListOf(inner) => CodeType::list(inner.to_code_type()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub shape: Shape,
    pub expandable: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Builtin {
    Value(Shape),
    Function {
        args: &'static [Param],
        ret: Shape,
    },
}

impl Builtin {
    pub fn to_code_type(self) -> CodeType {
        match self {
            Builtin::Value(shape) => shape.to_code_type(),
            Builtin::Function { args, ret } => {
                let args = args
                    .iter()
                    .map(|param| Arg {
                        ty: param.shape.to_code_type(),
                        expandable: param.expandable,
                    })
                    .collect();
                CodeType::function(args, ret.to_code_type())
            }
        }
    }
}

/// An ordered mapping from builtin name to type, consumed by the checker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LanguageEnvironment {
    entries: Vec<(Box<str>, CodeType)>,
}

impl LanguageEnvironment {
    /// Builds an environment out of a static table. Entries are sorted by name
    /// so that the resulting order doesn't depend on the table's hashing.
    pub fn from_table(table: &phf::Map<&'static str, Builtin>) -> LanguageEnvironment {
        let mut entries: Vec<(Box<str>, CodeType)> = table
            .entries()
            .map(|(name, builtin)| (Box::from(*name), builtin.to_code_type()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        LanguageEnvironment { entries }
    }

    /// Adds a builtin, replacing any previous one with the same name.
    pub fn insert(&mut self, name: &str, ty: CodeType) {
        match self.entries.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, existing)) => *existing = ty,
            None => self.entries.push((Box::from(name), ty)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CodeType> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, ty)| ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CodeType)> {
        self.entries.iter().map(|(name, ty)| (&**name, ty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The shipped builtin tables.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Language {
    /// A handful of builtins, enough for small examples.
    Minimal,
    /// The Beginning Student Language primitives.
    #[default]
    BeginningStudent,
}

impl Language {
    pub fn table(self) -> &'static phf::Map<&'static str, Builtin> {
        match self {
            Language::Minimal => &MINIMAL,
            Language::BeginningStudent => &BEGINNING_STUDENT,
        }
    }

    pub fn environment(self) -> LanguageEnvironment {
        LanguageEnvironment::from_table(self.table())
    }
}

macro_rules! shape {
    (number) => { Shape::Number };
    (string) => { Shape::String };
    (boolean) => { Shape::Boolean };
    (symbol) => { Shape::Symbol };
    (any) => { Shape::Any };
    (flexible) => { Shape::Flexible };
    ((list $inner:tt)) => { Shape::ListOf(&shape!($inner)) };
}

macro_rules! param {
    ((many $shape:tt)) => {
        Param { shape: shape!($shape), expandable: true }
    };
    ($shape:tt) => {
        Param { shape: shape!($shape), expandable: false }
    };
}

/// `func!([arg, (many arg)] -> ret)`
macro_rules! func {
    ([$($arg:tt),*] -> $ret:tt) => {
        Builtin::Function { args: &[$(param!($arg)),*], ret: shape!($ret) }
    };
}

macro_rules! value {
    ($shape:tt) => {
        Builtin::Value(shape!($shape))
    };
}

pub static MINIMAL: phf::Map<&'static str, Builtin> = phf::phf_map! {
    "+" => func!([(many number)] -> number),
    "string-append" => func!([(many string)] -> string),
    "string->number" => func!([string] -> number),
};

// https://docs.racket-lang.org/htdp-langs/beginner.html
pub static BEGINNING_STUDENT: phf::Map<&'static str, Builtin> = phf::phf_map! {
    "empty" => value!((list flexible)),
    "null" => value!((list any)),
    "e" => value!(number),
    "pi" => value!(number),

    "and" => func!([(many boolean)] -> boolean),
    "or" => func!([(many boolean)] -> boolean),

    // Numbers
    "*" => func!([(many number)] -> number),
    "+" => func!([(many number)] -> number),
    "-" => func!([(many number)] -> number),
    "/" => func!([(many number)] -> number),
    "<" => func!([number, (many number)] -> boolean),
    "<=" => func!([number, (many number)] -> boolean),
    "=" => func!([number, (many number)] -> boolean),
    ">" => func!([number, (many number)] -> boolean),
    ">=" => func!([number, (many number)] -> boolean),
    "abs" => func!([number] -> number),
    "acos" => func!([number] -> number),
    "add1" => func!([number] -> number),
    "angle" => func!([number] -> number),
    "asin" => func!([number] -> number),
    "atan" => func!([number] -> number),
    "ceiling" => func!([number] -> number),
    "conjugate" => func!([number] -> number),
    "cos" => func!([number] -> number),
    "cosh" => func!([number] -> number),
    "denominator" => func!([number] -> number),
    "exact->inexact" => func!([number] -> number),
    "exp" => func!([number] -> number),
    "floor" => func!([number] -> number),
    "imag-part" => func!([number] -> number),
    "inexact->exact" => func!([number] -> number),
    "integer-sqrt" => func!([number] -> number),
    "magnitude" => func!([number] -> number),
    "numerator" => func!([number] -> number),
    "random" => func!([number] -> number),
    "real-part" => func!([number] -> number),
    "round" => func!([number] -> number),
    "sgn" => func!([number] -> number),
    "sin" => func!([number] -> number),
    "sinh" => func!([number] -> number),
    "sqr" => func!([number] -> number),
    "sqrt" => func!([number] -> number),
    "sub1" => func!([number] -> number),
    "tan" => func!([number] -> number),
    "current-seconds" => func!([] -> number),
    "even?" => func!([number] -> boolean),
    "exact?" => func!([number] -> boolean),
    "inexact?" => func!([number] -> boolean),
    "negative?" => func!([number] -> boolean),
    "odd?" => func!([number] -> boolean),
    "positive?" => func!([number] -> boolean),
    "zero?" => func!([number] -> boolean),
    "expt" => func!([number, number] -> number),
    "log" => func!([number, number] -> number),
    "make-polar" => func!([number, number] -> number),
    "make-rectangular" => func!([number, number] -> number),
    "modulo" => func!([number, number] -> number),
    "quotient" => func!([number, number] -> number),
    "remainder" => func!([number, number] -> number),
    "gcd" => func!([number, (many number)] -> number),
    "lcm" => func!([number, (many number)] -> number),
    "max" => func!([number, (many number)] -> number),
    "min" => func!([number, (many number)] -> number),
    "integer->char" => func!([number] -> string),
    "number->string" => func!([number] -> string),
    "int->string" => func!([number] -> string),
    "number->string-digits" => func!([number, number] -> string),

    // Predicates
    "complex?" => func!([any] -> boolean),
    "integer?" => func!([any] -> boolean),
    "number?" => func!([any] -> boolean),
    "rational?" => func!([any] -> boolean),
    "real?" => func!([any] -> boolean),
    "boolean?" => func!([any] -> boolean),
    "symbol?" => func!([any] -> boolean),
    "cons?" => func!([any] -> boolean),
    "list?" => func!([any] -> boolean),
    "null?" => func!([any] -> boolean),
    "string?" => func!([any] -> boolean),
    "struct?" => func!([any] -> boolean),

    // Booleans and symbols
    "boolean->string" => func!([boolean] -> string),
    "boolean=?" => func!([boolean, boolean] -> boolean),
    "not" => func!([boolean] -> boolean),
    "symbol->string" => func!([symbol] -> string),
    "symbol=?" => func!([symbol, symbol] -> boolean),

    // Lists
    "append" => func!([(list any), (many (list any))] -> (list any)),
    "cons" => func!([any, (list any)] -> (list any)),
    "empty?" => func!([(list any)] -> boolean),
    "first" => func!([(list any)] -> any),
    "length" => func!([(list any)] -> number),
    "list" => func!([(many any)] -> (list any)),
    "list*" => func!([(many any)] -> (list any)),
    "list-ref" => func!([(list any), number] -> any),
    "make-list" => func!([number, any] -> (list any)),
    "member" => func!([any, (list any)] -> boolean),
    "member?" => func!([any, (list any)] -> boolean),
    "range" => func!([number, number, number] -> (list number)),
    "remove" => func!([any, (list any)] -> (list any)),
    "remove-all" => func!([any, (list any)] -> (list any)),
    "rest" => func!([(list any)] -> (list any)),
    "reverse" => func!([(list any)] -> (list any)),

    // Strings
    "explode" => func!([string] -> (list string)),
    "implode" => func!([(list string)] -> string),
    "replicate" => func!([number, string] -> string),
    "string->int" => func!([string] -> number),
    "string->number" => func!([string] -> number),
    "string->symbol" => func!([string] -> symbol),
    "string-alphabetic?" => func!([string] -> boolean),
    "string-lower-case?" => func!([string] -> boolean),
    "string-numeric?" => func!([string] -> boolean),
    "string-upper-case?" => func!([string] -> boolean),
    "string-whitespace?" => func!([string] -> boolean),
    "string-append" => func!([(many string)] -> string),
    "string-ci<=?" => func!([string, string] -> boolean),
    "string-ci<?" => func!([string, string] -> boolean),
    "string-ci=?" => func!([string, string] -> boolean),
    "string-ci>=?" => func!([string, string] -> boolean),
    "string-ci>?" => func!([string, string] -> boolean),
    "string-contains-ci?" => func!([string, string] -> boolean),
    "string-contains?" => func!([string, string] -> boolean),
    "string<=?" => func!([string, string] -> boolean),
    "string<?" => func!([string, string] -> boolean),
    "string=?" => func!([string, string] -> boolean),
    "string>=?" => func!([string, string] -> boolean),
    "string>?" => func!([string, string] -> boolean),
    "string-copy" => func!([string] -> string),
    "string-downcase" => func!([string] -> string),
    "string-upcase" => func!([string] -> string),
    "string-ith" => func!([string, number] -> string),
    "string-ref" => func!([string, number] -> string),
    "string-length" => func!([string] -> number),
    "substring" => func!([string, number, number] -> string),
};

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_signatures() {
        let env = Language::BeginningStudent.environment();
        assert_eq!(
            env.get("<"),
            Some(&CodeType::function(
                vec![
                    Arg::fixed(CodeType::Number),
                    Arg::expandable(CodeType::Number)
                ],
                CodeType::Boolean,
            ))
        );
        assert_eq!(
            env.get("explode"),
            Some(&CodeType::function(
                vec![Arg::fixed(CodeType::String)],
                CodeType::list(CodeType::String),
            ))
        );
        assert_eq!(env.get("empty"), Some(&CodeType::list(CodeType::Flexible)));
        assert_eq!(
            env.get("current-seconds"),
            Some(&CodeType::function(vec![], CodeType::Number))
        );
        assert_eq!(env.get("make-posn"), None);
    }

    #[test]
    fn test_environment_is_sorted() {
        let env = Language::Minimal.environment();
        let names: Vec<_> = env.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["+", "string->number", "string-append"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut env = Language::Minimal.environment();
        env.insert("+", CodeType::Any);
        env.insert("sqr", CodeType::function(vec![Arg::fixed(CodeType::Number)], CodeType::Number));
        assert_eq!(env.get("+"), Some(&CodeType::Any));
        assert_eq!(env.len(), 4);
    }
}
