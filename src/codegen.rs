//! Emits a checked program as plain `htdp/isl+` source, dropping every type
//! annotation. Function signatures survive as comments above each definition.

use crate::{
    ast::*,
    util::intern::{Interned, Interner},
};

const LANG_HEADER: &str = "#lang htdp/isl+";

/// Forms longer than this are broken over multiple lines.
const MAX_WIDTH: usize = 80;

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Indent {
    Spaces(u8),
    Tab,
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

impl Indent {
    fn unit(self) -> String {
        match self {
            Indent::Spaces(n) => " ".repeat(n.into()),
            Indent::Tab => "\t".to_owned(),
        }
    }

    /// Columns taken by a single indentation level.
    fn width(self) -> usize {
        match self {
            Indent::Spaces(n) => n.into(),
            Indent::Tab => 8,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub indent: Indent,
}

/// Emits the whole program, starting with the `#lang` line. Every top-level
/// form ends with a newline.
pub fn emit(program: &Program, ident_interner: &Interner<str>, options: CompileOptions) -> String {
    let mut generator = Generator::new(ident_interner, options);
    generator.g_program(program);
    tracing::debug!(bytes = generator.code.len(), "emitted program");
    generator.code
}

/// Layout tree of an s-expression.
enum Doc {
    Atom(String),
    List {
        open: char,
        close: char,
        /// Items which stay on the opening line when the form is broken.
        head: Vec<Doc>,
        /// Items which go on their own (indented) lines when the form is broken.
        rest: Vec<Doc>,
    },
}

impl Doc {
    fn atom(text: impl Into<String>) -> Doc {
        Doc::Atom(text.into())
    }

    fn list(head: Vec<Doc>, rest: Vec<Doc>) -> Doc {
        Doc::List {
            open: '(',
            close: ')',
            head,
            rest,
        }
    }

    fn bracket(head: Vec<Doc>, rest: Vec<Doc>) -> Doc {
        Doc::List {
            open: '[',
            close: ']',
            head,
            rest,
        }
    }

    /// A sequence of forms, as in `local` definitions or `let` bindings. Its
    /// first item stays next to the opening delimiter.
    fn sequence(open: char, close: char, mut items: Vec<Doc>) -> Doc {
        if items.is_empty() {
            return Doc::atom(format!("{open}{close}"));
        }
        let rest = items.split_off(1);
        Doc::List {
            open,
            close,
            head: items,
            rest,
        }
    }

    fn flat(&self) -> String {
        match self {
            Doc::Atom(text) => text.clone(),
            Doc::List {
                open,
                close,
                head,
                rest,
            } => {
                let items: Vec<_> = head.iter().chain(rest).map(Doc::flat).collect();
                format!("{open}{}{close}", items.join(" "))
            }
        }
    }
}

struct Generator<'ident> {
    ident_interner: &'ident Interner<str>,
    options: CompileOptions,
    code: String,
}

impl Generator<'_> {
    fn new(ident_interner: &Interner<str>, options: CompileOptions) -> Generator<'_> {
        Generator {
            ident_interner,
            options,
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
        }
    }

    fn g_program(&mut self, program: &Program) {
        self.out(LANG_HEADER);
        for expr in &program.exprs {
            let doc = match expr {
                Expr::Define(define) => {
                    if let DefineKind::Function { params, .. } = &define.kind {
                        self.g_signature(define.name, params);
                    }
                    self.g_docs(&define.docs);
                    self.d_define(define)
                }
                Expr::DefineStruct(define) => {
                    self.g_docs(&define.docs);
                    self.d_define_struct(define)
                }
                Expr::Value(value) => self.d_value(value),
            };
            let text = self.layout(&doc, 0, 0);
            self.out(&text);
        }
    }

    /// `;; name : T1 T2 -> R`
    fn g_signature(&mut self, name: Ident, params: &Parameters) {
        let mut signature = format!(";; {} :", self.ident(name));
        match params {
            Parameters::Typed(typed) => {
                for param in &typed.params {
                    signature.push(' ');
                    signature.push_str(&self.type_to_string(&param.ty));
                }
                signature.push_str(" -> ");
                match &typed.return_ty {
                    Some(ty) => signature.push_str(&self.type_to_string(ty)),
                    None => signature.push_str("any"),
                }
            }
            Parameters::Untyped(untyped) => {
                for _ in &untyped.names {
                    signature.push_str(" any");
                }
                signature.push_str(" -> any");
            }
        }
        self.out(&signature);
    }

    fn g_docs(&mut self, docs: &[Box<str>]) {
        for doc in docs {
            self.out(&format!(";; {doc}"));
        }
    }

    fn type_to_string(&self, annotation: &TypeAnnotation) -> String {
        match &annotation.kind {
            TypeAnnotationKind::Literal(name) => self.ident(*name).to_owned(),
            TypeAnnotationKind::Function { name, args } => match (self.ident(*name), &args[..]) {
                ("Any", _) => "any".to_owned(),
                ("List-of", []) => "(Listof Any)".to_owned(),
                ("List-of", [subtype, ..]) => format!("(Listof {})", self.type_to_string(subtype)),
                (other, args) => {
                    let mut out = format!("({other}");
                    for arg in args {
                        out.push(' ');
                        out.push_str(&self.type_to_string(arg));
                    }
                    out.push(')');
                    out
                }
            },
        }
    }

    fn d_define(&self, define: &Define) -> Doc {
        let name = self.d_ident(define.name);
        match &define.kind {
            DefineKind::Function { params, body } => {
                let mut signature = vec![name];
                signature.extend(params.names().map(|param| self.d_ident(param)));
                Doc::list(
                    vec![Doc::atom("define"), Doc::list(signature, vec![])],
                    vec![self.d_value(body)],
                )
            }
            DefineKind::Constant { value } => {
                Doc::list(vec![Doc::atom("define"), name], vec![self.d_value(value)])
            }
        }
    }

    fn d_define_struct(&self, define: &DefineStruct) -> Doc {
        let fields = define.fields.names().map(|field| self.d_ident(field)).collect();
        Doc::list(
            vec![Doc::atom("define-struct"), self.d_ident(define.name)],
            vec![Doc::list(fields, vec![])],
        )
    }

    fn d_params(&self, params: &Parameters) -> Doc {
        Doc::list(params.names().map(|param| self.d_ident(param)).collect(), vec![])
    }

    fn d_value(&self, value: &FunctionValue) -> Doc {
        match &value.kind {
            FunctionValueKind::If {
                condition,
                then_arm,
                else_arm,
            } => Doc::list(
                vec![Doc::atom("if"), self.d_value(condition)],
                vec![self.d_value(then_arm), self.d_value(else_arm)],
            ),
            FunctionValueKind::Cond { clauses, else_arm } => {
                let mut arms: Vec<_> = clauses
                    .iter()
                    .map(|clause| {
                        Doc::bracket(
                            vec![self.d_value(&clause.condition)],
                            vec![self.d_value(&clause.body)],
                        )
                    })
                    .collect();
                if let Some(else_arm) = else_arm {
                    arms.push(Doc::bracket(
                        vec![Doc::atom("else")],
                        vec![self.d_value(else_arm)],
                    ));
                }
                Doc::list(vec![Doc::atom("cond")], arms)
            }
            FunctionValueKind::Lambda { params, body } => Doc::list(
                vec![Doc::atom("lambda"), self.d_params(params)],
                vec![self.d_value(body)],
            ),
            FunctionValueKind::Local { definitions, body } => {
                let definitions = definitions.iter().map(|d| self.d_define(d)).collect();
                Doc::list(
                    vec![Doc::atom("local")],
                    vec![Doc::sequence('[', ']', definitions), self.d_value(body)],
                )
            }
            FunctionValueKind::Let {
                kind,
                bindings,
                body,
            } => {
                let bindings = bindings
                    .iter()
                    .map(|pair| {
                        Doc::bracket(vec![self.d_ident(pair.name)], vec![self.d_value(&pair.value)])
                    })
                    .collect();
                Doc::list(
                    vec![Doc::atom(kind.keyword())],
                    vec![Doc::sequence('(', ')', bindings), self.d_value(body)],
                )
            }
            FunctionValueKind::Require { module } => {
                Doc::list(vec![Doc::atom("require"), self.d_ident(*module)], vec![])
            }
            FunctionValueKind::Call { callee, args } => Doc::list(
                vec![self.d_value(callee)],
                args.iter().map(|arg| self.d_value(arg)).collect(),
            ),
            FunctionValueKind::Integer(int) => Doc::atom(int.to_string()),
            FunctionValueKind::Fraction {
                numerator,
                denominator,
            } => Doc::atom(format!("{numerator}/{denominator}")),
            FunctionValueKind::Decimal(decimal) => Doc::atom(decimal_to_string(*decimal)),
            FunctionValueKind::String(string) => Doc::atom(quote_string(string)),
            FunctionValueKind::Bool(true) => Doc::atom("#true"),
            FunctionValueKind::Bool(false) => Doc::atom("#false"),
            FunctionValueKind::Id(ident) => self.d_ident(*ident),
            FunctionValueKind::Symbol(symbol) => Doc::atom(format!("'{}", self.ident(*symbol))),
        }
    }

    fn d_ident(&self, ident: impl Into<Interned<str>>) -> Doc {
        Doc::atom(self.ident(ident))
    }

    /// Renders the form starting at `column`, at the provided nesting level.
    fn layout(&self, doc: &Doc, level: usize, column: usize) -> String {
        let flat = doc.flat();
        let fits = !flat.contains('\n') && column + flat.chars().count() <= MAX_WIDTH;
        let Doc::List {
            open,
            close,
            head,
            rest,
        } = doc
        else {
            return flat;
        };
        if fits {
            return flat;
        }

        let mut out = String::with_capacity(flat.len() * 2);
        out.push(*open);
        let mut column = column + 1;
        for (i, item) in head.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                column += 1;
            }
            let text = self.layout(item, level + 1, column);
            column = column_after(column, &text);
            out.push_str(&text);
        }

        let indent = self.options.indent.unit().repeat(level + 1);
        let indent_width = self.options.indent.width() * (level + 1);
        for item in rest {
            out.push('\n');
            out.push_str(&indent);
            out.push_str(&self.layout(item, level + 1, indent_width));
        }
        out.push(*close);
        out
    }

    fn ident(&self, ident: impl Into<Interned<str>>) -> &str {
        self.ident_interner.get(ident)
    }

    fn out(&mut self, line: &str) {
        self.code.push_str(line);
        self.code.push('\n');
    }
}

fn column_after(column: usize, text: &str) -> usize {
    match text.rfind('\n') {
        Some(i) => text[i + 1..].chars().count(),
        None => column + text.chars().count(),
    }
}

fn decimal_to_string(decimal: f64) -> String {
    if decimal.is_finite() && decimal.fract() == 0.0 {
        format!("{decimal:.1}")
    } else {
        decimal.to_string()
    }
}

fn quote_string(string: &str) -> String {
    let mut out = String::with_capacity(string.len() + 2);
    out.push('"');
    for c in string.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
