use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use track::{
    codegen::{self, CompileOptions, Indent},
    parse_source,
    type_checker::{Checker, TypeError},
    util::{
        fmt::{report, Context},
        intern::Interner,
    },
};

use crate::lang::Lang;

mod lang;

/// Type checks a typed student language program, emitting plain `htdp/isl+`.
#[derive(Parser)]
#[command(name = "trc", version, about, long_about = None)]
struct Cli {
    /// Source file to compile.
    file: PathBuf,

    /// Where to write the emitted program.
    #[arg(short, long, default_value = "out.rkt")]
    out: PathBuf,

    /// Only check the program, without emitting code.
    #[arg(long)]
    no_emit: bool,

    /// Emit code without type checking.
    #[arg(long)]
    no_check: bool,

    /// Builtin functions available to the program.
    #[arg(long, value_enum, default_value_t = Lang::default())]
    lang: Lang,

    /// Spaces per indentation level in the emitted code.
    #[arg(long, default_value_t = 2, conflicts_with = "tab")]
    indent: u8,

    /// Indent the emitted code with tabs.
    #[arg(long)]
    tab: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    tracing::debug!(file = %cli.file.display(), lang = %cli.lang, "compiling");
    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let mut interner = Interner::with_capacity(1024);
    let program = match parse_source(&source, &mut Vec::new(), &mut interner) {
        Ok(program) => program,
        Err(error) => {
            eprintln!("error: {error}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if !cli.no_check {
        let language = track::builtins::Language::from(cli.lang).environment();
        let checked = Checker::new(&mut interner, &language).check(&program);
        if !checked.is_ok() {
            let ctx = Context {
                ident_interner: &interner,
            };
            let errors = checked.sorted_errors();
            write_diagnostics(&mut io::stderr().lock(), &errors, &ctx, &source)?;
            return Ok(ExitCode::FAILURE);
        }
    }
    if cli.no_emit {
        return Ok(ExitCode::SUCCESS);
    }

    println!("No errors, building...");
    let indent = if cli.tab {
        Indent::Tab
    } else {
        Indent::Spaces(cli.indent)
    };
    let code = codegen::emit(&program, &interner, CompileOptions { indent });
    fs::write(&cli.out, code).with_context(|| format!("failed to write {}", cli.out.display()))?;
    println!("Wrote to {}", cli.out.display());
    Ok(ExitCode::SUCCESS)
}

/// Writes every rendered diagnostic, followed by a summary line.
fn write_diagnostics(
    w: &mut impl Write,
    errors: &[&TypeError],
    ctx: &Context<'_>,
    source: &str,
) -> io::Result<()> {
    for error in errors {
        writeln!(w, "{}", report::render(error, ctx, source))?;
    }
    writeln!(
        w,
        "Found {} error(s), skipping emit. (--no-check to override)",
        errors.len()
    )
}

#[cfg(test)]
mod tests {
    use track::builtins::Language;

    use super::*;

    #[test]
    fn test_write_diagnostics() {
        let source = "(define a 1)\n(define a 2)\n";
        let mut interner = Interner::with_capacity(16);
        let program = parse_source(source, &mut Vec::new(), &mut interner).unwrap();
        let checked =
            Checker::new(&mut interner, &Language::BeginningStudent.environment()).check(&program);
        let ctx = Context {
            ident_interner: &interner,
        };

        let mut out = Vec::new();
        write_diagnostics(&mut out, &checked.sorted_errors(), &ctx, source).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("  error: identifier a already defined\n"));
        assert!(out.contains("  note: first defined here (1:9)\n"));
        assert!(out.ends_with("\nFound 1 error(s), skipping emit. (--no-check to override)\n"));
    }
}
