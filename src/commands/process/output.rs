use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::coverage::{CoverageReport, DocumentStatus, LineStatus};

const NO_VISITS_MESSAGE: &str = "no valid visits found for the selected period";
const PROFESSIONAL_COLUMN: &str = "Professional";
const FAMILIES_COLUMN: &str = "Unique Families Visited";
const COVERAGE_COLUMN: &str = "Coverage %";

pub(super) fn write_json_report(report: &CoverageReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize coverage json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_text_report(report: &CoverageReport, detailed: bool) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_text_report(&mut output, report, detailed)?;
    output.flush()?;
    Ok(())
}

fn render_text_report(
    output: &mut impl Write,
    report: &CoverageReport,
    detailed: bool,
) -> Result<()> {
    writeln!(
        output,
        "Window: {}\tRegistered households: {}",
        report.window.label(),
        report.total_households
    )?;

    if report.has_counted_visits() {
        render_table(output, report)?;
    } else {
        writeln!(output, "{NO_VISITS_MESSAGE}")?;
    }

    render_document_notes(output, report)?;

    if detailed {
        writeln!(output)?;
        writeln!(
            output,
            "Legend: [counted] valid visit  [duplicate] already counted  [out_of_period] outside window"
        )?;
        for line in &report.lines {
            match line.status {
                LineStatus::Header => writeln!(output, "{}", line.text)?,
                status => {
                    let tag = format!("[{}]", status.as_str());
                    writeln!(output, "{tag:<15} {}", line.text)?;
                }
            }
        }
    }

    Ok(())
}

fn render_table(output: &mut impl Write, report: &CoverageReport) -> Result<()> {
    let name_width = report
        .rows
        .iter()
        .map(|row| row.professional.chars().count())
        .chain([PROFESSIONAL_COLUMN.len()])
        .max()
        .unwrap_or(PROFESSIONAL_COLUMN.len());

    writeln!(
        output,
        "{:<name_width$}  {:>families$}  {:>coverage$}",
        PROFESSIONAL_COLUMN,
        FAMILIES_COLUMN,
        COVERAGE_COLUMN,
        families = FAMILIES_COLUMN.len(),
        coverage = COVERAGE_COLUMN.len(),
    )?;

    for row in &report.rows {
        if row.is_total {
            let rule_width = name_width + FAMILIES_COLUMN.len() + COVERAGE_COLUMN.len() + 4;
            writeln!(output, "{}", "-".repeat(rule_width))?;
        }
        writeln!(
            output,
            "{:<name_width$}  {:>families$}  {:>coverage$}",
            row.professional,
            row.unique_families,
            row.coverage,
            families = FAMILIES_COLUMN.len(),
            coverage = COVERAGE_COLUMN.len(),
        )?;
    }

    Ok(())
}

fn render_document_notes(output: &mut impl Write, report: &CoverageReport) -> Result<()> {
    for document in &report.documents {
        match document.status {
            DocumentStatus::Processed => {}
            DocumentStatus::Skipped => {
                writeln!(output, "skipped {}: no Subárea(s) marker", document.name)?;
            }
            DocumentStatus::Failed => {
                writeln!(
                    output,
                    "failed {}: {}",
                    document.name,
                    document.error.as_deref().unwrap_or("unknown error")
                )?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{
        Aggregator, CoverageError, ReportDocument, ReportingWindow, RunSettings, TextExtractor,
    };

    struct SingleReport(&'static str);

    impl TextExtractor for SingleReport {
        fn extract_pages(&self, _document: &ReportDocument) -> Result<Vec<String>, CoverageError> {
            Ok(vec![self.0.to_string()])
        }
    }

    fn render(text: &'static str, detailed: bool) -> String {
        let extractor = SingleReport(text);
        let today = chrono::Utc::now().date_naive();
        let window =
            ReportingWindow::resolve(Some("15/05/2024"), Some("14/06/2024"), today).unwrap();
        let settings = RunSettings::new(window, 10).unwrap();
        let document = ReportDocument::new("maria.pdf", Vec::new());
        let report = Aggregator::new(&extractor)
            .unwrap()
            .aggregate(&[document], &settings);

        let mut buffer = Vec::new();
        render_text_report(&mut buffer, &report, detailed).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn table_lists_professionals_then_total() {
        let rendered = render(
            "Subárea(s): Maria.\n001 A 20/05/2024\n002 B 21/05/2024\n003 C 22/05/2024",
            false,
        );

        let maria = rendered.lines().find(|line| line.starts_with("Maria")).unwrap();
        assert!(maria.contains(" 3 "));
        assert!(maria.ends_with("30.00%"));
        assert!(rendered.lines().last().unwrap().starts_with("TOTAL GERAL"));
        assert!(!rendered.contains(NO_VISITS_MESSAGE));
    }

    #[test]
    fn empty_result_prints_no_visits_message() {
        let rendered = render("Subárea(s): Maria.\n001 A 01/01/2024", false);
        assert!(rendered.contains(NO_VISITS_MESSAGE));
        assert!(!rendered.contains(PROFESSIONAL_COLUMN));
    }

    #[test]
    fn detailed_view_tags_every_line() {
        let rendered = render(
            "Subárea(s): Maria.\n001 A 20/05/2024\n001 A 21/05/2024",
            true,
        );
        assert!(rendered.contains("INÍCIO DO RELATÓRIO: maria.pdf"));
        assert!(rendered.contains("[counted]       001 A 20/05/2024"));
        assert!(rendered.contains("[duplicate]     001 A 21/05/2024"));
        assert!(rendered.contains("[normal]        Subárea(s): Maria."));
    }
}
