use crate::{
    builtins::Language,
    lexer, parser,
    type_checker::{Checker, TypeError},
    util::{
        self,
        fmt::{tree, Show},
        intern::Interner,
    },
};

pub fn format_errors(i: &Interner<str>, e: &[&TypeError]) -> Vec<String> {
    let ctx = util::fmt::Context { ident_interner: i };
    e.iter().map(|e| format!("{:#}", e.display(&ctx))).collect()
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserValue(&'static str),
    CheckerProgram(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    TreeError(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Runs the input through the pipeline up to the stage under test.
///
/// A fatal lexer or parser error yields an empty tree and the error message as
/// the single formatted error.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let interner = &mut Interner::with_capacity(128);
    let (Test::ParserProgram(input) | Test::ParserValue(input) | Test::CheckerProgram(input)) =
        test;
    let tokens = match lexer::lex_in_new(input) {
        Ok(tokens) => tokens,
        Err(error) => return (String::new(), vec![error.to_string()]),
    };

    match test {
        Test::ParserProgram(_) => match parser::parse_program(&tokens, interner) {
            Ok(prog) => (tree::print_program_string(interner, &prog), vec![]),
            Err(error) => (String::new(), vec![error.to_string()]),
        },
        Test::ParserValue(_) => match parser::parse_value(&tokens, interner) {
            Ok(value) => (tree::print_value_string(interner, &value), vec![]),
            Err(error) => (String::new(), vec![error.to_string()]),
        },
        Test::CheckerProgram(_) => {
            let prog = match parser::parse_program(&tokens, interner) {
                Ok(prog) => prog,
                Err(error) => return (String::new(), vec![error.to_string()]),
            };
            let env = Language::BeginningStudent.environment();
            let checked = Checker::new(interner, &env).check(&prog);
            let tree = tree::print_globals_string(interner, &checked.globals);
            let errors = format_errors(interner, &checked.sorted_errors());
            (tree, errors)
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::TreeError(expected_tree) => {
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim())
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors)
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:literal;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), ::indoc::indoc! { $source });
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, tree_error, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeError(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, value), $source:expr) => {
        crate::util::test_utils::Test::ParserValue($source)
    };
    (@@get_test(checker, program), $source:expr) => {
        crate::util::test_utils::Test::CheckerProgram($source)
    };
}
pub(crate) use tree_tests;
