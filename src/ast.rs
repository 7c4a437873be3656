// program      ::= expr*
// expr         ::= define | define-struct | value
// define       ::= '(' 'define' '(' ID parameters ')' value ')'
//                | '(' 'define' ID value ')'
// define-struct::= '(' 'define-struct' ID '(' parameters ')' ')'
// parameters   ::= ID ':' type ('&' ID ':' type)* ['->' type]
//                | ID*
// type         ::= '(' ID type* ')'
//                | ID
// value        ::= '(' 'if' value value value ')'
//                | '(' 'cond' ('(' value value ')')+ ['(' 'else' value ')'] ')'
//                | '(' 'lambda' '(' parameters ')' value ')'
//                | '(' 'local' '(' define* ')' value ')'
//                | '(' ('let' | 'letrec' | 'let*') '(' ('(' ID value ')')* ')' value ')'
//                | '(' 'require' ID ')'
//                | '(' value value* ')'
//                | integer | fraction | decimal | string | boolean | ID | symbol

use crate::{token::Range, util::intern::Interned};

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub exprs: Vec<Expr>,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Define(Define),
    DefineStruct(DefineStruct),
    Value(FunctionValue),
}

/// A function or constant definition.
#[derive(Debug, PartialEq)]
pub struct Define {
    /// Docstring lines attached to this definition, in source order.
    pub docs: Vec<Box<str>>,
    pub name: Ident,
    pub kind: DefineKind,
    pub range: Range,
}

#[derive(Debug, PartialEq)]
pub enum DefineKind {
    Function {
        params: Parameters,
        body: Box<FunctionValue>,
    },
    Constant {
        value: Box<FunctionValue>,
    },
}

#[derive(Debug, PartialEq)]
pub struct DefineStruct {
    pub docs: Vec<Box<str>>,
    pub name: Ident,
    /// Field order determines the constructor's parameter order.
    pub fields: Parameters,
    pub range: Range,
}

#[derive(Debug, PartialEq)]
pub enum Parameters {
    Typed(TypedParameters),
    Untyped(UntypedParameters),
}

impl Parameters {
    /// Iterates over the parameter names, in order.
    pub fn names(&self) -> impl Iterator<Item = Ident> + '_ {
        let (typed, untyped) = match self {
            Parameters::Typed(typed) => (Some(typed.params.iter().map(|p| p.name)), None),
            Parameters::Untyped(untyped) => (None, Some(untyped.names.iter().copied())),
        };
        typed.into_iter().flatten().chain(untyped.into_iter().flatten())
    }
}

#[derive(Debug, PartialEq)]
pub struct TypedParameters {
    pub params: Vec<TypedParameter>,
    pub return_ty: Option<TypeAnnotation>,
    pub range: Range,
}

#[derive(Debug, PartialEq)]
pub struct TypedParameter {
    pub name: Ident,
    pub ty: TypeAnnotation,
}

#[derive(Debug, PartialEq)]
pub struct UntypedParameters {
    pub names: Vec<Ident>,
    pub range: Range,
}

#[derive(Debug, PartialEq)]
pub struct TypeAnnotation {
    pub kind: TypeAnnotationKind,
    pub range: Range,
}

#[derive(Debug, PartialEq)]
pub enum TypeAnnotationKind {
    /// A bare type name, such as `Number`.
    Literal(Ident),
    /// A parenthesized type function, such as `(List-of Number)` or `(Any)`.
    Function {
        name: Ident,
        args: Vec<TypeAnnotation>,
    },
}

#[derive(Debug, PartialEq)]
pub struct FunctionValue {
    pub kind: FunctionValueKind,
    pub range: Range,
}

#[derive(Debug, PartialEq)]
pub enum FunctionValueKind {
    If {
        condition: Box<FunctionValue>,
        then_arm: Box<FunctionValue>,
        else_arm: Box<FunctionValue>,
    },
    Cond {
        /// Non empty list of clauses.
        clauses: Vec<CondClause>,
        else_arm: Option<Box<FunctionValue>>,
    },
    Lambda {
        params: Parameters,
        body: Box<FunctionValue>,
    },
    Local {
        definitions: Vec<Define>,
        body: Box<FunctionValue>,
    },
    Let {
        kind: LetKind,
        bindings: Vec<ValuePair>,
        body: Box<FunctionValue>,
    },
    Require {
        module: Ident,
    },
    Call {
        callee: Box<FunctionValue>,
        args: Vec<FunctionValue>,
    },
    Integer(i64),
    Fraction {
        numerator: i64,
        denominator: i64,
    },
    Decimal(f64),
    String(Box<str>),
    Bool(bool),
    Id(Ident),
    Symbol(Interned<str>),
}

#[derive(Debug, PartialEq)]
pub struct CondClause {
    pub condition: FunctionValue,
    pub body: FunctionValue,
    pub range: Range,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LetKind {
    Let,
    LetRec,
    LetStar,
}

impl LetKind {
    pub fn keyword(self) -> &'static str {
        match self {
            LetKind::Let => "let",
            LetKind::LetRec => "letrec",
            LetKind::LetStar => "let*",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct ValuePair {
    pub name: Ident,
    pub value: FunctionValue,
    pub range: Range,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Interned<str>,
    pub range: Range,
}

impl From<Ident> for Interned<str> {
    fn from(value: Ident) -> Self {
        value.name
    }
}

impl From<&Ident> for Interned<str> {
    fn from(value: &Ident) -> Self {
        value.name
    }
}
