use super::{ReportError, TableRow};
use crate::stats::format_field;

/// Renders result rows as the body of a LaTeX table.
///
/// Columns are separated by `&` and rows end in `\\`. Competitors are emitted
/// as macros (`\aflpp`) so the paper can typeset fuzzer names uniformly.
#[derive(Debug, Clone)]
pub struct LatexTable {
    /// Opening markup wrapped around significant effect sizes.
    bold_open: String,
    bold_close: String,
}

impl Default for LatexTable {
    fn default() -> Self {
        Self {
            bold_open: r"\textbf{".to_string(),
            bold_close: "}".to_string(),
        }
    }
}

/// Escape underscores for LaTeX.
pub fn escape_latex(text: &str) -> String {
    text.replace('_', r"\_")
}

impl LatexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom markup instead of `\textbf{...}` for significant results.
    pub fn with_markup(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            bold_open: open.into(),
            bold_close: close.into(),
        }
    }

    /// Render one row, e.g. `zlib & \aflpp & \textbf{+L(0.72)} \\`.
    pub fn row(&self, row: &TableRow) -> Result<String, ReportError> {
        let field = format_field(row.effect_size)?;
        let field = if row.significant {
            format!("{}{}{}", self.bold_open, field, self.bold_close)
        } else {
            // Keep plain fields aligned with bold ones.
            format!(
                "{}{}{}",
                " ".repeat(self.bold_open.len()),
                field,
                " ".repeat(self.bold_close.len())
            )
        };
        Ok(format!(
            "{:34} & \\{:10} & {:8} \\\\",
            escape_latex(&row.target),
            row.competitor,
            field
        ))
    }

    /// Render all rows, one per line.
    pub fn render(&self, rows: &[TableRow]) -> Result<String, ReportError> {
        let lines = rows
            .iter()
            .map(|row| self.row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }
}
