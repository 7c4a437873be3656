use std::io::Write;

use crate::{
    ast::*,
    types::CodeType,
    util::{
        fmt::{Context, Show},
        intern::{Interned, Interner},
    },
};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(idents: &Interner<str>, program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, idents, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_value_string(idents: &Interner<str>, value: &FunctionValue) -> String {
    let mut buf = Vec::with_capacity(512);
    print_value(&mut buf, idents, 0, value).unwrap();
    String::from_utf8(buf).unwrap()
}

/// Prints one `name: type` line per binding.
pub fn print_globals_string(idents: &Interner<str>, globals: &[(Interned<str>, CodeType)]) -> String {
    let ctx = Context {
        ident_interner: idents,
    };
    let mut out = String::with_capacity(globals.len() * 32);
    for (name, ty) in globals {
        out.push_str(idents.get(*name));
        out.push_str(": ");
        out.push_str(&ty.display(&ctx).to_string());
        out.push('\n');
    }
    out
}

pub fn print_program(
    w: &mut impl Write,
    idents: &Interner<str>,
    program: &Program,
) -> std::io::Result<()> {
    for expr in &program.exprs {
        match expr {
            Expr::Define(define) => print_define(w, idents, 0, define)?,
            Expr::DefineStruct(define) => print_define_struct(w, idents, 0, define)?,
            Expr::Value(value) => print_value(w, idents, 0, value)?,
        }
    }
    Ok(())
}

fn print_define(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    define: &Define,
) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "define {} ({})", idents.get(define.name), define.range)?;
    print_docs(w, i + 1, &define.docs)?;
    match &define.kind {
        DefineKind::Function { params, body } => {
            print_parameters(w, idents, i + 1, params)?;
            print_value(w, idents, i + 1, body)?;
        }
        DefineKind::Constant { value } => print_value(w, idents, i + 1, value)?,
    }
    Ok(())
}

fn print_define_struct(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    define: &DefineStruct,
) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "define-struct {} ({})", idents.get(define.name), define.range)?;
    print_docs(w, i + 1, &define.docs)?;
    print_parameters(w, idents, i + 1, &define.fields)
}

fn print_docs(w: &mut impl Write, i: usize, docs: &[Box<str>]) -> std::io::Result<()> {
    for doc in docs {
        sp(w, i)?;
        writeln!(w, "doc {doc}")?;
    }
    Ok(())
}

fn print_parameters(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    params: &Parameters,
) -> std::io::Result<()> {
    sp(w, i)?;
    match params {
        Parameters::Typed(typed) => {
            writeln!(w, "params typed ({})", typed.range)?;
            for param in &typed.params {
                sp(w, i + 1)?;
                write!(w, "param {} : ", idents.get(param.name))?;
                print_annotation(w, idents, &param.ty)?;
                writeln!(w)?;
            }
            if let Some(return_ty) = &typed.return_ty {
                sp(w, i + 1)?;
                write!(w, "returns ")?;
                print_annotation(w, idents, return_ty)?;
                writeln!(w)?;
            }
        }
        Parameters::Untyped(untyped) => {
            writeln!(w, "params untyped ({})", untyped.range)?;
            for name in &untyped.names {
                sp(w, i + 1)?;
                writeln!(w, "param {}", idents.get(name))?;
            }
        }
    }
    Ok(())
}

/// Prints the annotation the way it's written in the source.
fn print_annotation(
    w: &mut impl Write,
    idents: &Interner<str>,
    annotation: &TypeAnnotation,
) -> std::io::Result<()> {
    match &annotation.kind {
        TypeAnnotationKind::Literal(name) => write!(w, "{}", idents.get(name)),
        TypeAnnotationKind::Function { name, args } => {
            write!(w, "({}", idents.get(name))?;
            for arg in args {
                write!(w, " ")?;
                print_annotation(w, idents, arg)?;
            }
            write!(w, ")")
        }
    }
}

pub fn print_value(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    value: &FunctionValue,
) -> std::io::Result<()> {
    sp(w, i)?;
    let range = value.range;
    match &value.kind {
        FunctionValueKind::If {
            condition,
            then_arm,
            else_arm,
        } => {
            writeln!(w, "if ({range})")?;
            print_value(w, idents, i + 1, condition)?;
            print_value(w, idents, i + 1, then_arm)?;
            print_value(w, idents, i + 1, else_arm)?;
        }
        FunctionValueKind::Cond { clauses, else_arm } => {
            writeln!(w, "cond ({range})")?;
            for clause in clauses {
                sp(w, i + 1)?;
                writeln!(w, "clause ({})", clause.range)?;
                print_value(w, idents, i + 2, &clause.condition)?;
                print_value(w, idents, i + 2, &clause.body)?;
            }
            if let Some(else_arm) = else_arm {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_value(w, idents, i + 2, else_arm)?;
            }
        }
        FunctionValueKind::Lambda { params, body } => {
            writeln!(w, "lambda ({range})")?;
            print_parameters(w, idents, i + 1, params)?;
            print_value(w, idents, i + 1, body)?;
        }
        FunctionValueKind::Local { definitions, body } => {
            writeln!(w, "local ({range})")?;
            for define in definitions {
                print_define(w, idents, i + 1, define)?;
            }
            print_value(w, idents, i + 1, body)?;
        }
        FunctionValueKind::Let {
            kind,
            bindings,
            body,
        } => {
            writeln!(w, "{} ({range})", kind.keyword())?;
            for binding in bindings {
                sp(w, i + 1)?;
                writeln!(w, "binding {} ({})", idents.get(binding.name), binding.range)?;
                print_value(w, idents, i + 2, &binding.value)?;
            }
            print_value(w, idents, i + 1, body)?;
        }
        FunctionValueKind::Require { module } => {
            writeln!(w, "require {} ({range})", idents.get(module))?;
        }
        FunctionValueKind::Call { callee, args } => {
            writeln!(w, "call ({range})")?;
            print_value(w, idents, i + 1, callee)?;
            for arg in args {
                print_value(w, idents, i + 1, arg)?;
            }
        }
        FunctionValueKind::Integer(int) => writeln!(w, "int {int} ({range})")?,
        FunctionValueKind::Fraction {
            numerator,
            denominator,
        } => writeln!(w, "fraction {numerator}/{denominator} ({range})")?,
        FunctionValueKind::Decimal(decimal) => writeln!(w, "decimal {decimal} ({range})")?,
        FunctionValueKind::String(string) => writeln!(w, "string {string:?} ({range})")?,
        FunctionValueKind::Bool(bool) => writeln!(w, "bool {bool} ({range})")?,
        FunctionValueKind::Id(ident) => writeln!(w, "ident {} ({range})", idents.get(ident))?,
        FunctionValueKind::Symbol(symbol) => {
            writeln!(w, "symbol '{} ({range})", idents.get(*symbol))?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:1$}", "", i * INDENT_WIDTH)
}
