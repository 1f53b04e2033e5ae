use std::io::{self, Write};

use colored::Colorize;

use super::{
    ImprovementSummary, Improvement, KSampleComparison, LatexTable, MwuComparison,
    PosthocComparison, ReportError, Reporter, RunReport, TargetOutcome, TwoSampleComparison,
};
use crate::stats::format_field;

/// A reporter that prints comparison results to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
    table: LatexTable,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            table: LatexTable::new(),
        }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self {
            use_colors: false,
            table: LatexTable::new(),
        }
    }

    /// Format a significance flag padded to `width` columns.
    fn format_flag(&self, significant: bool, width: usize) -> String {
        let text = format!("{:width$}", significant, width = width);
        if !self.use_colors {
            text
        } else if significant {
            text.green().bold().to_string()
        } else {
            text.yellow().to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn print_mwu(
        &self,
        writer: &mut impl Write,
        comparison: &MwuComparison,
        alpha: f64,
        tweak_width: usize,
        baseline_width: usize,
    ) -> Result<(), ReportError> {
        writeln!(
            writer,
            "{:tw$} (tweak) vs {:bw$} (baseline): p_val={:.4} (< {}? {}), {}",
            comparison.tweak,
            comparison.baseline,
            comparison.p_value,
            alpha,
            self.format_flag(comparison.p_value < alpha, 5),
            format_field(comparison.effect_size)?,
            tw = tweak_width,
            bw = baseline_width,
        )?;
        Ok(())
    }

    fn print_best_competitors(
        &self,
        writer: &mut impl Write,
        comparisons: &[MwuComparison],
        alpha: f64,
    ) -> Result<(), ReportError> {
        if comparisons.len() != 1 {
            let names: Vec<&str> = comparisons.iter().map(|c| c.baseline.as_str()).collect();
            writeln!(
                writer,
                "[i] Found {} best competitors: {:?}",
                comparisons.len(),
                names
            )?;
        }
        for comparison in comparisons {
            writeln!(
                writer,
                "{}: p_val={:.4} (< {}? {}), {}",
                comparison.baseline,
                comparison.p_value,
                alpha,
                self.format_flag(comparison.p_value < alpha, 5),
                format_field(comparison.effect_size)?,
            )?;
        }
        Ok(())
    }

    fn print_two_sample(
        &self,
        writer: &mut impl Write,
        comparison: &TwoSampleComparison,
    ) -> Result<(), ReportError> {
        let outcome = &comparison.outcome;
        writeln!(
            writer,
            "[i] Two sample comparison: {} vs {}",
            comparison.tweak, comparison.other
        )?;
        writeln!(
            writer,
            "[i] test_statistics={} critical_value={} significant? {}",
            outcome.statistic,
            outcome.critical_value,
            self.format_flag(outcome.significant, 0)
        )?;
        if let Some(effect_size) = comparison.effect_size {
            writeln!(writer, "[i] Effect size: {}", format_field(effect_size)?)?;
        }
        Ok(())
    }

    fn print_posthoc(
        &self,
        writer: &mut impl Write,
        rows: &[PosthocComparison],
    ) -> io::Result<()> {
        for row in rows {
            writeln!(
                writer,
                "{:16} vs {:16}: {} (statistics: {:.2})",
                row.first,
                row.second,
                self.format_flag(row.significant, 5),
                row.statistic
            )?;
        }
        Ok(())
    }

    fn print_k_sample(
        &self,
        writer: &mut impl Write,
        comparison: &KSampleComparison,
    ) -> io::Result<()> {
        writeln!(writer, "Found {} fuzzers: {:?}", comparison.fuzzers.len(), comparison.fuzzers)?;
        writeln!(writer, "{}", self.heading("Posthoc results"))?;
        self.print_posthoc(writer, &comparison.posthoc_median)?;
        writeln!(writer)?;
        writeln!(writer, "{}", self.heading("Posthoc MEAN results"))?;
        self.print_posthoc(writer, &comparison.posthoc_mean)?;
        let critvals = &comparison.critical_values;
        writeln!(
            writer,
            "decision_anova={}, test_statistics_anova={}, critvals=[{}, {}, {}]",
            comparison.significant,
            comparison.statistic,
            critvals.overall,
            critvals.posthoc_median,
            critvals.posthoc_mean
        )?;
        Ok(())
    }

    fn print_improvement(&self, writer: &mut impl Write, imp: &Improvement) -> io::Result<()> {
        writeln!(
            writer,
            "[i] {} {}={} <-> {} ({})",
            imp.statistic, imp.tweak, imp.tweak_value, imp.competitor_value, imp.competitor
        )?;
        writeln!(
            writer,
            "[i] Difference of {}s: {} {}% more coverage ({:.2} times better)",
            imp.statistic,
            imp.difference(),
            imp.percentage,
            imp.factor
        )?;
        Ok(())
    }

    fn print_summary(
        &self,
        writer: &mut impl Write,
        label: &str,
        summary: &ImprovementSummary,
        unit: &str,
    ) -> io::Result<()> {
        writeln!(writer, "[i] Raw {}: {:?}", label, summary.values)?;
        writeln!(
            writer,
            "[i] Average improvement: {}{} (median: {}{})",
            summary.mean, unit, summary.median, unit
        )?;
        writeln!(writer, "[i] Worst improvement: {}{}", summary.min, unit)?;
        writeln!(writer, "[i] Best improvement: {}{}", summary.max, unit)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write the full report.
    pub fn write_report(&self, writer: &mut impl Write, run: &RunReport) -> Result<(), ReportError> {
        for target in &run.targets {
            let outcome = &target.outcome;
            if let TargetOutcome::Skipped(_) = outcome {
                continue;
            }
            writeln!(writer, "{}", self.heading(&format!("# {}", target.target)))?;
            match outcome {
                TargetOutcome::Pairwise(comparisons) => {
                    for c in comparisons {
                        self.print_mwu(writer, c, run.alpha, 10, 10)?;
                    }
                }
                TargetOutcome::AgainstBaseline(comparisons) => {
                    for c in comparisons {
                        self.print_mwu(writer, c, run.alpha, 32, 16)?;
                    }
                }
                TargetOutcome::BestCompetitors(comparisons) => {
                    self.print_best_competitors(writer, comparisons, run.alpha)?;
                }
                TargetOutcome::BestCompetitor(best) => {
                    writeln!(
                        writer,
                        "[i] Best competitor: {} with {} {}",
                        best.competitor, best.statistic, best.competitor_value
                    )?;
                    self.print_two_sample(writer, &best.comparison)?;
                }
                TargetOutcome::TwoSample(comparison) => {
                    self.print_two_sample(writer, comparison)?;
                }
                TargetOutcome::KSample(comparison) => self.print_k_sample(writer, comparison)?,
                TargetOutcome::Improvement(imp) => self.print_improvement(writer, imp)?,
                TargetOutcome::Skipped(_) => {}
            }
            writeln!(writer)?;
        }

        if let Some(factors) = &run.factors {
            self.print_summary(writer, "factors", factors, "")?;
        }
        if let Some(percentages) = &run.percentages {
            self.print_summary(writer, "percentages", percentages, "%")?;
        }
        if let Some(rows) = &run.table {
            writeln!(writer, "{}", self.table.render(rows)?)?;
        }
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, run: &RunReport) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write_report(&mut writer, run)
    }
}
