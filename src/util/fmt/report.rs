//! Human readable diagnostics, quoting the offending source lines.

use crate::{
    type_checker::TypeError,
    util::fmt::{Context, Show},
};

/// Context lines shown above and below a single-line range.
const SINGLE_LINE_CONTEXT: usize = 2;

/// Context lines shown above and below a multi-line range.
const MULTI_LINE_CONTEXT: usize = 1;

const PADDING: &str = "  ";

/// Renders the diagnostic against the source it was reported for.
///
/// ```text
///   error: undefined identifier y
///   1 | (define x 1)
///   2 | (define z y)
///                 ^
/// ```
///
/// Every line, including the last one, ends with a newline.
pub fn render(error: &TypeError, ctx: &Context<'_>, source: &str) -> String {
    let lines: Vec<&str> = source.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let width = lines.len().to_string().len();
    let (start, end) = (error.range.start, error.range.end);
    let (start_line, end_line) = (start.line as usize, end.line as usize);

    let mut out = String::with_capacity(256);
    out.push_str(&format!("{PADDING}error: {}\n", error.display(ctx)));

    let quote = |out: &mut String, line: usize, emphasis: bool| {
        let text = lines.get(line - 1).copied().unwrap_or_default();
        let gutter = if emphasis { '>' } else { '|' };
        let rendered = format!("{PADDING}{line:>width$} {gutter} {text}");
        out.push_str(rendered.trim_end());
        out.push('\n');
    };

    let context = if error.range.is_multiline() {
        MULTI_LINE_CONTEXT
    } else {
        SINGLE_LINE_CONTEXT
    };
    let above = (start_line - 1).min(context);
    let below = lines.len().saturating_sub(end_line).min(context);

    for line in start_line - above..start_line {
        quote(&mut out, line, false);
    }
    if error.range.is_multiline() {
        for line in start_line..=end_line {
            quote(&mut out, line, true);
        }
    } else {
        quote(&mut out, start_line, false);
        let offset = PADDING.len() + width + 3 + (start.column as usize - 1);
        let carets = end.column.saturating_sub(start.column).max(1) as usize;
        out.push_str(&format!("{:offset$}{}\n", "", "^".repeat(carets)));
    }
    for line in end_line + 1..=end_line + below {
        quote(&mut out, line, false);
    }

    for supplement in &error.supplements {
        let at = supplement.range.start;
        out.push_str(&format!(
            "{PADDING}note: {} ({}:{})\n",
            supplement.annotation, at.line, at.column
        ));
    }
    out
}
