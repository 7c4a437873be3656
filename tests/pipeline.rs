use pretty_assertions::assert_eq;
use track::{
    ast::{Define, DefineKind, Expr, Parameters},
    builtins::Language,
    codegen::{self, CompileOptions},
    parse_source,
    type_checker::Checker,
    types::CodeType,
    util::{
        fmt::{report, Context, Show},
        intern::Interner,
    },
};

static DEMOS: &[(&str, &str)] = &[
    ("shapes", include_str!("../demos/shapes.trkt")),
    ("lists", include_str!("../demos/lists.trkt")),
];

#[test]
fn test_demos_check_cleanly() {
    for (name, src) in DEMOS {
        let mut interner = Interner::with_capacity(256);
        let program = parse_source(src, &mut Vec::new(), &mut interner).unwrap();
        let checked = Checker::new(&mut interner, &Language::BeginningStudent.environment())
            .check(&program);

        let ctx = Context {
            ident_interner: &interner,
        };
        let errors: Vec<_> = checked
            .sorted_errors()
            .into_iter()
            .map(|e| format!("{:#}", e.display(&ctx)))
            .collect();
        assert_eq!(errors, Vec::<String>::new(), "{name}");
    }
}

#[test]
fn test_demo_globals() {
    let (_, src) = DEMOS[0];
    let mut interner = Interner::with_capacity(256);
    let program = parse_source(src, &mut Vec::new(), &mut interner).unwrap();
    let checked = Checker::new(&mut interner, &Language::BeginningStudent.environment())
        .check(&program);

    let ctx = Context {
        ident_interner: &interner,
    };
    let type_of = |name: &str| {
        let name = interner.lookup(name).unwrap();
        let (_, ty) = checked.globals.iter().find(|(n, _)| *n == name).unwrap();
        format!("{}", ty.display(&ctx))
    };
    assert_eq!(type_of("unit"), "struct(circle)");
    assert_eq!(type_of("circle-center"), "function(struct(circle) -> struct(posn))");
    assert_eq!(type_of("inside?"), "function(struct(circle), struct(posn) -> boolean)");
    assert_eq!(type_of("summary"), "string");
    assert!(checked
        .globals
        .iter()
        .all(|(_, ty)| !matches!(ty, CodeType::Flexible)));
}

#[test]
fn test_emitted_code_parses_again() {
    for (name, src) in DEMOS {
        let mut interner = Interner::with_capacity(256);
        let program = parse_source(src, &mut Vec::new(), &mut interner).unwrap();
        let code = codegen::emit(&program, &interner, CompileOptions::default());

        let (header, body) = code.split_once('\n').unwrap();
        assert_eq!(header, "#lang htdp/isl+", "{name}");

        let mut other = Interner::with_capacity(256);
        let reparsed = parse_source(body, &mut Vec::new(), &mut other).unwrap();
        assert_eq!(reparsed.exprs.len(), program.exprs.len(), "{name}");
        for expr in &reparsed.exprs {
            if let Expr::Define(Define {
                kind: DefineKind::Function { params, .. },
                ..
            }) = expr
            {
                assert!(matches!(params, Parameters::Untyped(_)), "{name}: {body}");
            }
        }
    }
}

#[test]
fn test_fatal_errors() {
    let mut interner = Interner::with_capacity(16);
    let tokens = &mut Vec::new();

    let error = parse_source("(define x #maybe)", tokens, &mut interner).unwrap_err();
    assert!(matches!(error, track::Error::Lex(_)));
    assert_eq!(
        error.to_string(),
        "invalid character after `#`, expected `true`, `false` or `|` at 1:11"
    );

    let error = parse_source("(define x", tokens, &mut interner).unwrap_err();
    assert!(matches!(error, track::Error::Parse(_)));
}

#[test]
fn test_rendered_report() {
    let src = "(define (f x : Number -> String)\n  x)\n";
    let mut interner = Interner::with_capacity(16);
    let program = parse_source(src, &mut Vec::new(), &mut interner).unwrap();
    let checked = Checker::new(&mut interner, &Language::Minimal.environment()).check(&program);
    let ctx = Context {
        ident_interner: &interner,
    };
    let rendered: Vec<_> = checked
        .sorted_errors()
        .into_iter()
        .map(|e| report::render(e, &ctx, src))
        .collect();
    assert_eq!(
        rendered,
        [concat!(
            "  error: function f expects return type string, but got number instead\n",
            "  1 | (define (f x : Number -> String)\n",
            "  2 |   x)\n",
            "        ^\n",
            "  3 |\n",
            "  note: return type declared here (1:26)\n",
        )]
    );
}
