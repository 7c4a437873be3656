use crate::{
    type_checker::{Callee, Error, TypeError},
    util::fmt::{Context, Show},
};

impl Show for TypeError {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}: ", self.range)?;
        }
        self.error.show(f, ctx)
    }
}

impl Show for Error {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        let i = ctx.ident_interner;
        match self {
            Error::AlreadyDefined(name) => {
                write!(f, "identifier {} already defined", i.get(*name))
            }
            Error::AlreadyDefinedLocally(name) => {
                write!(f, "identifier {} already defined locally", i.get(*name))
            }
            Error::Undefined(name) => write!(f, "undefined identifier {}", i.get(*name)),
            Error::UnknownType(name) => write!(f, "unknown type {}", i.get(*name)),
            Error::NotTypeChecked(name) => {
                write!(f, "function {} is not type-checked", i.get(*name))
            }
            Error::NotCallable { callee, actual } => {
                let callee = callee.display(ctx);
                write!(f, "{callee} is not a function, it is a {actual}")
            }
            Error::ArityMismatch {
                callee,
                expected,
                actual,
                at_least,
            } => {
                let callee = callee.display(ctx);
                let at_least = if *at_least { "at least " } else { "" };
                write!(
                    f,
                    "{callee} expects {at_least}{expected} arguments, \
                    but received {actual} instead"
                )
            }
            Error::ArgumentMismatch {
                callee,
                position,
                expected,
                actual,
            } => {
                let callee = callee.display(ctx);
                write!(
                    f,
                    "{callee} argument {position} expects {expected}, \
                    but received {actual} instead"
                )
            }
            Error::ReturnMismatch {
                function,
                expected,
                actual,
            } => {
                match function {
                    Some(name) => write!(f, "function {}", i.get(*name))?,
                    None => write!(f, "lambda")?,
                }
                write!(f, " expects return type {expected}, but got {actual} instead")
            }
            Error::ConditionNotBoolean { form, actual } => {
                write!(
                    f,
                    "{form} condition expects boolean, but received {actual} instead"
                )
            }
        }
    }
}

impl Show for Callee {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        match self {
            Callee::Named(name) => write!(f, "{}", ctx.ident_interner.get(*name)),
            Callee::Expression => write!(f, "expression"),
        }
    }
}
