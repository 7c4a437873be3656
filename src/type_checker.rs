use std::{collections::HashMap, mem};

use crate::{
    ast::{
        Define, DefineKind, DefineStruct, Expr, FunctionValue, FunctionValueKind, Ident,
        Parameters, Program, TypeAnnotation, TypeAnnotationKind,
    },
    builtins::{LanguageEnvironment, Shape},
    env::{Binding, Environment},
    token::Range,
    types::{Arg, CodeType, FunctionType, Tag},
    util::intern::{Interned, Interner},
};

/// Type names which resolve without looking at the struct table.
static TYPE_LITERALS: phf::Map<&'static str, Shape> = phf::phf_map! {
    "Number" => Shape::Number,
    "String" => Shape::String,
    "Boolean" => Shape::Boolean,
    "Symbol" => Shape::Symbol,
};

/// Type names which must be applied, as in `(List-of Number)`.
static TYPE_FUNCTIONS: phf::Map<&'static str, TypeFunction> = phf::phf_map! {
    "Any" => TypeFunction::Any,
    "List-of" => TypeFunction::ListOf,
};

#[derive(Copy, Clone)]
enum TypeFunction {
    Any,
    ListOf,
}

pub struct Checker<'ident> {
    ident_interner: &'ident mut Interner<str>,
    env: Environment,
    /// Field lists of every registered struct, keyed by struct name.
    structs: HashMap<Interned<str>, Vec<StructField>>,
    /// Names bound at the top level, in registration order.
    globals: Vec<Interned<str>>,
    errors: Vec<TypeError>,
}

#[derive(Clone, Debug)]
struct StructField {
    name: Interned<str>,
    ty: CodeType,
}

/// The result of checking a program.
#[derive(Debug)]
pub struct Checked {
    /// Every diagnostic, in the order they were found.
    pub errors: Vec<TypeError>,
    /// The final type of each name defined at the top level, in registration
    /// order. Builtins are not included.
    pub globals: Vec<(Interned<str>, CodeType)>,
}

impl Checked {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the diagnostics ordered by their start line, then column.
    pub fn sorted_errors(&self) -> Vec<&TypeError> {
        let mut errors: Vec<_> = self.errors.iter().collect();
        errors.sort_by_key(|e| (e.range.start.line, e.range.start.column));
        errors
    }
}

impl<'ident> Checker<'ident> {
    /// Creates a checker whose root scope holds the provided builtins.
    pub fn new(
        ident_interner: &'ident mut Interner<str>,
        language: &LanguageEnvironment,
    ) -> Checker<'ident> {
        let mut env = Environment::with_capacity(language.len() + 64);
        for (name, ty) in language.iter() {
            let name = ident_interner.intern(name);
            let binding = Binding {
                ty: ty.clone(),
                defined_at: None,
            };
            env.set(name, binding);
        }
        Checker {
            ident_interner,
            env,
            structs: HashMap::new(),
            globals: Vec::with_capacity(32),
            errors: Vec::with_capacity(8),
        }
    }

    /// Checks the whole program. Checking always completes, reporting every
    /// diagnostic it can find.
    pub fn check(mut self, program: &Program) -> Checked {
        // Struct names are known up front, so annotations may name a struct
        // defined further down.
        for expr in &program.exprs {
            if let Expr::DefineStruct(define) = expr {
                self.structs.entry(define.name.name).or_default();
            }
        }
        for expr in &program.exprs {
            self.register(expr);
        }
        for expr in &program.exprs {
            self.check_expr(expr);
        }

        let globals = self
            .globals
            .iter()
            .filter_map(|&name| self.env.get(name).map(|b| (name, b.ty.clone())))
            .collect();
        tracing::debug!(errors = self.errors.len(), "checked program");
        Checked {
            errors: self.errors,
            globals,
        }
    }

    fn register(&mut self, expr: &Expr) {
        match expr {
            Expr::Define(define) => self.register_define(define),
            Expr::DefineStruct(define) => self.register_struct(define),
            Expr::Value(_) => {}
        }
    }

    /// Binds a definition's name in the current scope before any body is
    /// checked, so that later (or earlier) definitions may refer to it.
    fn register_define(&mut self, define: &Define) {
        let name = define.name;
        if !self.ensure_undefined(name, Error::AlreadyDefined(name.name)) {
            return;
        }

        let ty = match &define.kind {
            DefineKind::Function {
                params: Parameters::Typed(typed),
                ..
            } => self.silenced(|c| {
                let args = typed
                    .params
                    .iter()
                    .map(|param| Arg::fixed(c.resolve_type(&param.ty)))
                    .collect();
                let ret = match &typed.return_ty {
                    Some(ty) => c.resolve_type(ty),
                    None => CodeType::Any,
                };
                CodeType::function(args, ret)
            }),
            DefineKind::Function {
                params: Parameters::Untyped(untyped),
                ..
            } => {
                let args = untyped.names.iter().map(|_| Arg::fixed(CodeType::Any));
                CodeType::function(args.collect(), CodeType::Any)
            }
            // Only used to give forward references a type. Diagnostics are
            // reported when the definition itself is checked.
            DefineKind::Constant { value } => self.silenced(|c| c.check_value(value)),
        };

        tracing::trace!(name = self.ident_interner.get(name), "registered definition");
        self.bind(name, ty);
    }

    fn register_struct(&mut self, define: &DefineStruct) {
        let name = define.name;
        if !self.ensure_undefined(name, Error::AlreadyDefined(name.name)) {
            return;
        }
        // Registered before the fields are resolved so that a field may refer
        // to its own struct.
        self.structs.insert(name.name, Vec::new());

        let fields: Vec<StructField> = match &define.fields {
            Parameters::Typed(typed) => typed
                .params
                .iter()
                .map(|param| StructField {
                    name: param.name.name,
                    ty: self.resolve_type(&param.ty),
                })
                .collect(),
            Parameters::Untyped(untyped) => untyped
                .names
                .iter()
                .map(|field| StructField {
                    name: field.name,
                    ty: CodeType::Any,
                })
                .collect(),
        };
        self.structs.insert(name.name, fields.clone());

        let struct_ty = CodeType::Struct(name.name);
        let struct_name = self.ident_interner.get(name).to_owned();
        self.bind(name, struct_ty.clone());

        let predicate = self.ident_interner.intern(&format!("{struct_name}?"));
        let predicate_ty = CodeType::function(vec![Arg::fixed(CodeType::Any)], CodeType::Boolean);
        self.bind_synthesized(predicate, name.range, predicate_ty);

        let constructor = self.ident_interner.intern(&format!("make-{struct_name}"));
        let constructor_args = fields.iter().map(|f| Arg::fixed(f.ty.clone())).collect();
        let constructor_ty = CodeType::function(constructor_args, struct_ty.clone());
        self.bind_synthesized(constructor, name.range, constructor_ty);

        for field in fields {
            let field_name = self.ident_interner.get(field.name);
            let accessor = format!("{struct_name}-{field_name}");
            let accessor = self.ident_interner.intern(&accessor);
            let accessor_ty = CodeType::function(vec![Arg::fixed(struct_ty.clone())], field.ty);
            self.bind_synthesized(accessor, name.range, accessor_ty);
        }
        tracing::trace!(name = %struct_name, "registered struct");
    }

    fn check_expr(&mut self, expr: &Expr) -> CodeType {
        match expr {
            Expr::Define(define) => self.check_define(define),
            // Fully handled during registration.
            Expr::DefineStruct(_) => CodeType::Void,
            Expr::Value(value) => self.check_value(value),
        }
    }

    fn check_define(&mut self, define: &Define) -> CodeType {
        let name = define.name;
        match &define.kind {
            DefineKind::Function {
                params: Parameters::Typed(typed),
                body,
            } => {
                let params: Vec<_> = typed
                    .params
                    .iter()
                    .map(|param| (param.name, self.resolve_type(&param.ty)))
                    .collect();
                let declared_ret = typed
                    .return_ty
                    .as_ref()
                    .map(|ty| (ty, self.resolve_type(ty)));

                let actual_ret = self
                    .scoped(|c| {
                        for (param, ty) in &params {
                            c.bind_local(*param, ty.clone());
                        }
                        c.check_value(body)
                    })
                    .collapse();

                let Some((ret_annotation, expected_ret)) = declared_ret else {
                    self.error(name.range, Error::NotTypeChecked(name.name));
                    return CodeType::Flexible;
                };
                if !actual_ret.can_be(&expected_ret) {
                    let error = TypeError::new(
                        body.range,
                        Error::ReturnMismatch {
                            function: Some(name.name),
                            expected: expected_ret.tag(),
                            actual: actual_ret.tag(),
                        },
                    )
                    .with_supplement(ret_annotation.range, "return type declared here");
                    self.errors.push(error);
                }

                let args = params.into_iter().map(|(_, ty)| Arg::fixed(ty)).collect();
                self.finalize(define, CodeType::function(args, expected_ret));
                CodeType::Void
            }
            DefineKind::Function {
                params: Parameters::Untyped(untyped),
                body,
            } => {
                self.error(name.range, Error::NotTypeChecked(name.name));
                self.scoped(|c| {
                    for param in &untyped.names {
                        c.bind_local(*param, CodeType::Flexible);
                    }
                    c.check_value(body)
                });
                CodeType::Flexible
            }
            DefineKind::Constant { value } => {
                let ty = self.check_value(value);
                self.finalize(define, ty);
                CodeType::Void
            }
        }
    }

    fn check_value(&mut self, value: &FunctionValue) -> CodeType {
        match &value.kind {
            FunctionValueKind::If {
                condition,
                then_arm,
                else_arm,
            } => {
                self.check_condition("if", condition);
                let then_ty = self.check_value(then_arm);
                let else_ty = self.check_value(else_arm);
                CodeType::union(vec![then_ty, else_ty])
            }
            FunctionValueKind::Cond { clauses, else_arm } => {
                let mut types = Vec::with_capacity(clauses.len() + 1);
                for clause in clauses {
                    self.check_condition("cond", &clause.condition);
                    types.push(self.check_value(&clause.body));
                }
                if let Some(else_arm) = else_arm {
                    types.push(self.check_value(else_arm));
                }
                CodeType::union(types)
            }
            FunctionValueKind::Lambda { params, body } => {
                self.scoped(|c| c.check_lambda(params, body))
            }
            FunctionValueKind::Local { definitions, body } => self.scoped(|c| {
                for define in definitions {
                    c.register_define(define);
                }
                for define in definitions {
                    c.check_define(define);
                }
                c.check_value(body)
            }),
            FunctionValueKind::Let { bindings, body, .. } => self.scoped(|c| {
                for pair in bindings {
                    let name = pair.name;
                    if !c.ensure_undefined(name, Error::AlreadyDefinedLocally(name.name)) {
                        continue;
                    }
                    let ty = c.check_value(&pair.value);
                    c.bind(pair.name, ty);
                }
                c.check_value(body)
            }),
            FunctionValueKind::Require { .. } => CodeType::Any,
            FunctionValueKind::Call { callee, args } => self.check_call(value.range, callee, args),
            FunctionValueKind::Integer(_)
            | FunctionValueKind::Fraction { .. }
            | FunctionValueKind::Decimal(_) => CodeType::Number,
            FunctionValueKind::String(_) => CodeType::String,
            FunctionValueKind::Bool(_) => CodeType::Boolean,
            FunctionValueKind::Symbol(_) => CodeType::Symbol,
            FunctionValueKind::Id(ident) => match self.env.get(ident.name) {
                Some(binding) => binding.ty.clone(),
                None => {
                    self.error(ident.range, Error::Undefined(ident.name));
                    CodeType::Flexible
                }
            },
        }
    }

    /// Must be called within the lambda's own scope.
    fn check_lambda(&mut self, params: &Parameters, body: &FunctionValue) -> CodeType {
        match params {
            Parameters::Typed(typed) => {
                let mut args = Vec::with_capacity(typed.params.len());
                for param in &typed.params {
                    let ty = self.resolve_type(&param.ty);
                    self.bind_local(param.name, ty.clone());
                    args.push(Arg::fixed(ty));
                }
                let actual_ret = self.check_value(body).collapse();
                let ret = match &typed.return_ty {
                    Some(annotation) => {
                        let expected_ret = self.resolve_type(annotation);
                        if !actual_ret.can_be(&expected_ret) {
                            let error = TypeError::new(
                                body.range,
                                Error::ReturnMismatch {
                                    function: None,
                                    expected: expected_ret.tag(),
                                    actual: actual_ret.tag(),
                                },
                            )
                            .with_supplement(annotation.range, "return type declared here");
                            self.errors.push(error);
                        }
                        expected_ret
                    }
                    None => actual_ret,
                };
                CodeType::function(args, ret)
            }
            Parameters::Untyped(untyped) => {
                for param in &untyped.names {
                    self.bind_local(*param, CodeType::Flexible);
                }
                let ret = self.check_value(body).collapse();
                let args = untyped.names.iter().map(|_| Arg::fixed(CodeType::Any));
                CodeType::function(args.collect(), ret)
            }
        }
    }

    fn check_call(&mut self, range: Range, callee: &FunctionValue, args: &[FunctionValue]) -> CodeType {
        let (callee_name, callee_ty) = match &callee.kind {
            FunctionValueKind::Id(ident) => {
                let ty = self.env.get(ident.name).map(|b| b.ty.clone());
                if ty.is_none() {
                    self.error(ident.range, Error::Undefined(ident.name));
                }
                (Callee::Named(ident.name), ty.unwrap_or(CodeType::Flexible))
            }
            _ => (Callee::Expression, self.check_value(callee)),
        };

        // Arguments of a flexible or non-callable callee are left unchecked.
        let function = match callee_ty {
            CodeType::Flexible => return CodeType::Flexible,
            CodeType::Function(function) => function,
            other => {
                let error = Error::NotCallable {
                    callee: callee_name,
                    actual: other.tag(),
                };
                self.error(callee.range, error);
                return CodeType::Flexible;
            }
        };
        let FunctionType { args: params, ret } = function;
        let arg_types: Vec<_> = args.iter().map(|arg| self.check_value(arg)).collect();

        let Some(expected) = expand_params(&params, arg_types.len()) else {
            let error = Error::ArityMismatch {
                callee: callee_name,
                expected: params.len(),
                actual: arg_types.len(),
                at_least: params.iter().any(|p| p.expandable),
            };
            self.error(range, error);
            return CodeType::Flexible;
        };

        for (i, ((actual, expected), arg)) in arg_types.iter().zip(expected).zip(args).enumerate() {
            if !actual.can_be(expected) {
                let error = Error::ArgumentMismatch {
                    callee: callee_name,
                    position: i + 1,
                    expected: expected.tag(),
                    actual: actual.tag(),
                };
                self.error(arg.range, error);
            }
        }
        *ret
    }

    fn check_condition(&mut self, form: &'static str, condition: &FunctionValue) {
        let ty = self.check_value(condition);
        if !ty.can_be(&CodeType::Boolean) {
            let error = Error::ConditionNotBoolean {
                form,
                actual: ty.tag(),
            };
            self.error(condition.range, error);
        }
    }

    /// Maps a type annotation into its type, reporting unknown type names.
    fn resolve_type(&mut self, annotation: &TypeAnnotation) -> CodeType {
        match &annotation.kind {
            TypeAnnotationKind::Literal(ident) => {
                let literal = TYPE_LITERALS.get(self.ident_interner.get(ident)).copied();
                if let Some(shape) = literal {
                    shape.to_code_type()
                } else if self.structs.contains_key(&ident.name) {
                    CodeType::Struct(ident.name)
                } else {
                    self.error(ident.range, Error::UnknownType(ident.name));
                    CodeType::Any
                }
            }
            TypeAnnotationKind::Function { name, args } => {
                let function = TYPE_FUNCTIONS.get(self.ident_interner.get(name)).copied();
                match function {
                    Some(TypeFunction::Any) => CodeType::Any,
                    Some(TypeFunction::ListOf) => {
                        let subtype = match args.first() {
                            Some(arg) => self.resolve_type(arg),
                            None => CodeType::Any,
                        };
                        CodeType::list(subtype)
                    }
                    None => {
                        self.error(name.range, Error::UnknownType(name.name));
                        CodeType::Any
                    }
                }
            }
        }
    }
}

impl Checker<'_> {
    /// Reports `error` at the name's range if it's already bound in the
    /// current scope. Returns whether the name is free.
    fn ensure_undefined(&mut self, name: Ident, error: Error) -> bool {
        let Some(existing) = self.env.get_local(name.name) else {
            return true;
        };
        let mut error = TypeError::new(name.range, error);
        if let Some(defined_at) = existing.defined_at {
            error = error.with_supplement(defined_at, "first defined here");
        }
        self.errors.push(error);
        false
    }

    /// Binds the name in the current scope, remembering top-level names.
    fn bind(&mut self, name: Ident, ty: CodeType) {
        let binding = Binding {
            ty,
            defined_at: Some(name.range),
        };
        if self.env.depth() == 1 {
            self.globals.push(name.name);
        }
        self.env.set(name.name, binding);
    }

    /// Binds a name which doesn't appear in the source, such as a struct
    /// accessor. A clash with an existing name is reported at `defined_at`.
    fn bind_synthesized(&mut self, name: Interned<str>, defined_at: Range, ty: CodeType) {
        let ident = Ident {
            name,
            range: defined_at,
        };
        if self.ensure_undefined(ident, Error::AlreadyDefined(name)) {
            self.bind(ident, ty);
        }
    }

    /// Binds a parameter, reporting a repeated parameter name.
    fn bind_local(&mut self, name: Ident, ty: CodeType) {
        if self.ensure_undefined(name, Error::AlreadyDefinedLocally(name.name)) {
            self.bind(name, ty);
        }
    }

    /// Replaces the registered type of a definition, unless its name has been
    /// bound by another (earlier) definition.
    fn finalize(&mut self, define: &Define, ty: CodeType) {
        let name = define.name;
        let owns_binding = self
            .env
            .get_local(name.name)
            .is_some_and(|binding| binding.defined_at == Some(name.range));
        if owns_binding {
            let binding = Binding {
                ty,
                defined_at: Some(name.range),
            };
            self.env.set(name.name, binding);
        }
    }

    /// Runs `f` in a new child scope, discarding it afterwards.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.env.sub_env();
        let result = f(self);
        self.env.pop();
        result
    }

    /// Runs `f`, discarding every diagnostic it reports.
    fn silenced<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = mem::take(&mut self.errors);
        let result = f(self);
        self.errors = saved;
        result
    }

    fn error(&mut self, range: Range, error: Error) {
        self.errors.push(TypeError::new(range, error));
    }
}

/// Lines the parameter list up with `count` call arguments.
///
/// An expandable parameter is repeated in place as many times as needed,
/// provided there are at least as many arguments as parameters. Returns `None`
/// on arity mismatch.
fn expand_params(params: &[Arg], count: usize) -> Option<Vec<&CodeType>> {
    let expandable = params.iter().position(|p| p.expandable);
    let extra = match expandable {
        Some(_) => count.saturating_sub(params.len()),
        None => 0,
    };
    let expected: Vec<&CodeType> = params
        .iter()
        .enumerate()
        .flat_map(|(i, p)| {
            let times = if Some(i) == expandable { extra + 1 } else { 1 };
            std::iter::repeat_n(&p.ty, times)
        })
        .collect();
    (expected.len() == count).then_some(expected)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeError {
    pub error: Error,
    pub range: Range,
    /// Related source locations, such as a previous definition.
    pub supplements: Vec<Supplement>,
}

impl TypeError {
    pub fn new(range: Range, error: Error) -> TypeError {
        TypeError {
            error,
            range,
            supplements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_supplement(mut self, range: Range, annotation: &'static str) -> TypeError {
        self.supplements.push(Supplement { range, annotation });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Supplement {
    pub range: Range,
    pub annotation: &'static str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    Named(Interned<str>),
    /// A callee which is not a plain identifier, such as a lambda.
    Expression,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    AlreadyDefined(Interned<str>),
    AlreadyDefinedLocally(Interned<str>),
    Undefined(Interned<str>),
    UnknownType(Interned<str>),
    NotTypeChecked(Interned<str>),
    NotCallable {
        callee: Callee,
        actual: Tag,
    },
    ArityMismatch {
        callee: Callee,
        expected: usize,
        actual: usize,
        at_least: bool,
    },
    ArgumentMismatch {
        callee: Callee,
        /// 1-based.
        position: usize,
        expected: Tag,
        actual: Tag,
    },
    ReturnMismatch {
        /// `None` for lambdas.
        function: Option<Interned<str>>,
        expected: Tag,
        actual: Tag,
    },
    ConditionNotBoolean {
        form: &'static str,
        actual: Tag,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        builtins::Language,
        parser::test_utils::parse_program,
        util::{fmt::Context, fmt::Show, test_utils::tree_tests},
    };

    tree_tests!(
        use checker;

        fn test_return_type_mismatch() {
            let program = "(define (f x : Number -> String) x)";
            let tree_error = "
                f: function(number -> string)
            ";
            let expected_errors = &[
                "1:34..1:35: function f expects return type string, but got number instead",
            ];
        }

        fn test_if_produces_union() {
            let program = r#"(define c (if (> 1 0) "a" 2))"#;
            let tree_ok = "
                c: union(string, number)
            ";
        }

        fn test_if_same_types_collapse() {
            let program = "(define c (if #true 1 2/3))";
            let tree_ok = "
                c: number
            ";
        }

        fn test_if_condition_must_be_boolean() {
            let program = "(define c (if 1 'a 'b))";
            let tree_error = "
                c: symbol
            ";
            let expected_errors = &[
                "1:15..1:16: if condition expects boolean, but received number instead",
            ];
        }

        fn test_cond() {
            let program = r#"
                (define (classify n : Number -> String)
                  (cond [(> n 0) "positive"]
                        [(string? n) 0]
                        [else "other"]))
            "#;
            let tree_error = "
                classify: function(number -> string)
            ";
            let expected_errors = &[
                "2:3..4:24: function classify expects return type string, but got union instead",
            ];
        }

        fn test_redefinition() {
            let program = "(define x 1)\n(define x 2)";
            let tree_error = "
                x: number
            ";
            let expected_errors = &["2:9..2:10: identifier x already defined"];
        }

        fn test_builtin_redefinition() {
            let program = "(define (add1 n) n)";
            let tree_error = "";
            let expected_errors = &[
                "1:10..1:14: identifier add1 already defined",
                "1:10..1:14: function add1 is not type-checked",
            ];
        }

        fn test_forward_reference() {
            let program = "(define (f x) (g x))\n(define (g x) x)";
            let tree_error = "
                f: function(any -> any)
                g: function(any -> any)
            ";
            let expected_errors = &[
                "1:10..1:11: function f is not type-checked",
                "2:10..2:11: function g is not type-checked",
            ];
        }

        fn test_mutual_recursion_typed() {
            let program = "
                (define (even n : Number -> Boolean) (if (zero? n) #true (odd (sub1 n))))
                (define (odd n : Number -> Boolean) (if (zero? n) #false (even (sub1 n))))
            ";
            let tree_ok = "
                even: function(number -> boolean)
                odd: function(number -> boolean)
            ";
        }

        fn test_constant_forward_reference() {
            let program = "(define a (+ b 1))\n(define b 2)";
            let tree_ok = "
                a: number
                b: number
            ";
        }

        fn test_variadic_arity() {
            let program = "(define a (+))\n(define b (+ 1 2 3 4))";
            let tree_error = "
                a: flexible
                b: number
            ";
            let expected_errors = &["1:11..1:14: + expects at least 1 arguments, but received 0 instead"];
        }

        fn test_fixed_arity() {
            let program = r#"(define a (substring "abc" 1))"#;
            let tree_error = "
                a: flexible
            ";
            let expected_errors = &[
                "1:11..1:30: substring expects 3 arguments, but received 2 instead",
            ];
        }

        fn test_argument_types() {
            let program = r#"(define a (< 1 "2" 3 #true))"#;
            let tree_error = "
                a: boolean
            ";
            let expected_errors = &[
                "1:16..1:19: < argument 2 expects number, but received string instead",
                "1:22..1:27: < argument 4 expects number, but received boolean instead",
            ];
        }

        fn test_undefined_identifier() {
            let program = "(define a (+ b 1))\n(define c (nope a))";
            let tree_error = "
                a: number
                c: flexible
            ";
            let expected_errors = &[
                "1:14..1:15: undefined identifier b",
                "2:12..2:16: undefined identifier nope",
            ];
        }

        fn test_not_callable() {
            let program = "(define a 1)\n(define b (a 2))\n(define c ((if #true 1 2)))";
            let tree_error = "
                a: number
                b: flexible
                c: flexible
            ";
            let expected_errors = &[
                "2:12..2:13: a is not a function, it is a number",
                "3:12..3:26: expression is not a function, it is a number",
            ];
        }

        fn test_struct() {
            let program = "
                (define-struct posn (x : Number & y : Number))
                (define (norm p : posn -> Number) (+ (posn-x p) (posn-y p)))
                (define origin (make-posn 0 0))
            ";
            let tree_ok = "
                posn: struct(posn)
                posn?: function(any -> boolean)
                make-posn: function(number, number -> struct(posn))
                posn-x: function(struct(posn) -> number)
                posn-y: function(struct(posn) -> number)
                norm: function(struct(posn) -> number)
                origin: struct(posn)
            ";
        }

        fn test_untyped_struct_and_self_reference() {
            let program = "
                (define-struct node (value : Number & next : node))
                (define-struct pair (a b))
                (define-struct bad (v : Vector))
            ";
            let tree_error = "
                node: struct(node)
                node?: function(any -> boolean)
                make-node: function(number, struct(node) -> struct(node))
                node-value: function(struct(node) -> number)
                node-next: function(struct(node) -> struct(node))
                pair: struct(pair)
                pair?: function(any -> boolean)
                make-pair: function(any, any -> struct(pair))
                pair-a: function(struct(pair) -> any)
                pair-b: function(struct(pair) -> any)
                bad: struct(bad)
                bad?: function(any -> boolean)
                make-bad: function(any -> struct(bad))
                bad-v: function(struct(bad) -> any)
            ";
            let expected_errors = &["3:25..3:31: unknown type Vector"];
        }

        fn test_struct_types_are_compared_by_tag() {
            let program = "
                (define-struct a ())
                (define-struct b ())
                (define (f x : a -> b) x)
            ";
            let expected_errors = &[];
        }

        fn test_type_functions() {
            let program = "
                (define (f xs : (List-of Number) & y : (Any) -> (List-of)) (cons y xs))
                (define (g x : (Set-of Number) -> Number) 1)
            ";
            let tree_error = "
                f: function(list(number), any -> list(any))
                g: function(any -> number)
            ";
            let expected_errors = &["2:17..2:23: unknown type Set-of"];
        }

        fn test_missing_return_type() {
            let program = "(define (f x : Number) (+ x undefined))";
            let tree_error = "
                f: function(number -> any)
            ";
            let expected_errors = &[
                "1:10..1:11: function f is not type-checked",
                "1:29..1:38: undefined identifier undefined",
            ];
        }

        fn test_untyped_body_is_still_checked() {
            let program = "(define (f x) (string-append x y))";
            let expected_errors = &[
                "1:10..1:11: function f is not type-checked",
                "1:32..1:33: undefined identifier y",
            ];
        }

        fn test_lambda() {
            let program = r#"
                (define add (lambda (a : Number & b : Number -> Number) (+ a b)))
                (define bad (lambda (a : Number -> String) a))
                (define id (lambda (x) x))
                (define n ((lambda (a : Number) a) 1))
            "#;
            let tree_error = "
                add: function(number, number -> number)
                bad: function(number -> string)
                id: function(any -> flexible)
                n: number
            ";
            let expected_errors = &[
                "2:44..2:45: lambda expects return type string, but got number instead",
            ];
        }

        fn test_local() {
            let program = "
                (define r
                  (local [(define (ev? n : Number -> Boolean) (if (zero? n) #true (od? (sub1 n))))
                          (define (od? n : Number -> Boolean) (if (zero? n) #false (ev? (sub1 n))))
                          (define k 10)]
                    (ev? k)))
                (define outside (ev? 1))
            ";
            let tree_error = "
                r: boolean
                outside: flexible
            ";
            let expected_errors = &["6:18..6:21: undefined identifier ev?"];
        }

        fn test_local_redefinition() {
            let program = "(define r (local [(define a 1) (define a 2)] a))";
            let tree_error = "
                r: number
            ";
            let expected_errors = &["1:40..1:41: identifier a already defined"];
        }

        fn test_let_forms() {
            let program = r#"
                (define a (let ([x 1] [y "s"]) y))
                (define b (let* ([x 1] [y x]) y))
                (define c (letrec ([x 1] [x 2]) x))
                (define d (let ([x y] [y 1]) y))
            "#;
            let tree_error = "
                a: string
                b: number
                c: number
                d: number
            ";
            let expected_errors = &[
                "3:27..3:28: identifier x already defined locally",
                "4:20..4:21: undefined identifier y",
            ];
        }

        fn test_require_and_values() {
            let program = "
                (require batteries)
                (define s 'sym)
                (define f 1.5)
                (define nil empty)
            ";
            let tree_ok = "
                s: symbol
                f: number
                nil: list(flexible)
            ";
        }

        fn test_duplicate_parameter() {
            let program = "(define (f x : Number & x : String -> Number) 1)";
            let tree_error = "
                f: function(number, string -> number)
            ";
            let expected_errors = &["1:25..1:26: identifier x already defined locally"];
        }

        fn test_arguments_of_unknown_callee_are_skipped() {
            let program = r#"
                (define c (nope (+ "a" 1)))
                (define (f g) (g (+ "a" 1)))
            "#;
            let tree_error = "
                c: flexible
                f: function(any -> any)
            ";
            let expected_errors = &[
                "1:12..1:16: undefined identifier nope",
                "2:10..2:11: function f is not type-checked",
            ];
        }

        fn test_struct_defined_after_use() {
            let program = "
                (define (use q : Number -> Number) (get 1))
                (define (get p : pt -> Number) (pt-x p))
                (define-struct pt (x : Number))
            ";
            let tree_error = "
                use: function(number -> number)
                get: function(struct(pt) -> number)
                pt: struct(pt)
                pt?: function(any -> boolean)
                make-pt: function(number -> struct(pt))
                pt-x: function(struct(pt) -> number)
            ";
            let expected_errors = &[
                "1:41..1:42: get argument 1 expects struct, but received number instead",
            ];
        }

        fn test_struct_accessor_clashes_with_definition() {
            let program = "
                (define posn-x 1)
                (define-struct posn (x : Number & y : Number))
            ";
            let tree_error = "
                posn-x: number
                posn: struct(posn)
                posn?: function(any -> boolean)
                make-posn: function(number, number -> struct(posn))
                posn-y: function(struct(posn) -> number)
            ";
            let expected_errors = &["2:16..2:20: identifier posn-x already defined"];
        }
    );

    #[test]
    fn test_redefinition_points_at_first_definition() {
        let (mut i, program) = parse_program("(define x 1)\n(define x 2)");
        let checked = Checker::new(&mut i, &Language::BeginningStudent.environment()).check(&program);
        assert_eq!(checked.errors.len(), 1);
        let error = &checked.errors[0];
        assert_eq!(error.range.start.line, 2);
        assert_eq!(error.supplements.len(), 1);
        assert_eq!(error.supplements[0].range.start.line, 1);
        assert_eq!(error.supplements[0].annotation, "first defined here");
    }

    #[test]
    fn test_minimal_language() {
        let (mut i, program) = parse_program("(define a (+ (string->number \"1\") 2))\n(define b (add1 a))");
        let checked = Checker::new(&mut i, &Language::Minimal.environment()).check(&program);
        let ctx = Context { ident_interner: &i };
        let errors: Vec<_> = checked
            .sorted_errors()
            .into_iter()
            .map(|e| e.display(&ctx).to_string())
            .collect();
        assert_eq!(errors, ["undefined identifier add1"]);
    }

    #[test]
    fn test_custom_builtins() {
        let (mut i, program) = parse_program("(define a (twice 2))");
        let mut language = Language::Minimal.environment();
        language.insert(
            "twice",
            CodeType::function(vec![Arg::fixed(CodeType::Number)], CodeType::Number),
        );
        let checked = Checker::new(&mut i, &language).check(&program);
        assert!(checked.is_ok());
        assert_eq!(checked.globals[0].1, CodeType::Number);
    }

    #[test]
    fn test_sorted_errors() {
        let (mut i, program) = parse_program("(define (f x) (g x))\n(define y z)");
        let checked = Checker::new(&mut i, &Language::BeginningStudent.environment()).check(&program);
        let lines: Vec<_> = checked
            .sorted_errors()
            .iter()
            .map(|e| (e.range.start.line, e.range.start.column))
            .collect();
        assert_eq!(lines, [(1, 10), (1, 16), (2, 11)]);
    }

    #[test]
    fn test_expand_params() {
        let params = [
            Arg::fixed(CodeType::String),
            Arg::expandable(CodeType::Number),
            Arg::fixed(CodeType::Boolean),
        ];
        let tags = |count| expand_params(&params, count).map(|v| v.iter().map(|t| t.tag()).collect::<Vec<_>>());
        assert_eq!(tags(2), None);
        assert_eq!(tags(3), Some(vec![Tag::String, Tag::Number, Tag::Boolean]));
        assert_eq!(
            tags(5),
            Some(vec![Tag::String, Tag::Number, Tag::Number, Tag::Number, Tag::Boolean])
        );
        assert_eq!(expand_params(&[Arg::fixed(CodeType::Any)], 2), None);
    }
}
