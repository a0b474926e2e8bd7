use anyhow::Result;
use tracing::{debug, info, warn};

use super::classifier::LineClassifier;
use super::error::CoverageError;
use super::extract::{ProfessionalLocator, ReportDocument, TextExtractor};
use super::registry::DedupRegistry;
use super::types::{
    AnnotatedLine, CoverageReport, CoverageRow, DocumentStatus, DocumentSummary, LineStatus,
    LineTally,
};
use super::window::ReportingWindow;

const HEADER_RULE_WIDTH: usize = 80;

/// Parameters of one processing run, validated up front.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub window: ReportingWindow,
    pub total_households: i64,
}

impl RunSettings {
    pub fn new(window: ReportingWindow, total_households: i64) -> Result<Self, CoverageError> {
        if total_households <= 0 {
            return Err(CoverageError::InvalidParameter(format!(
                "total households must be positive, got {total_households}"
            )));
        }

        Ok(Self {
            window,
            total_households,
        })
    }
}

pub struct Aggregator<'a> {
    extractor: &'a dyn TextExtractor,
    classifier: LineClassifier,
    locator: ProfessionalLocator,
}

struct ClassifiedDocument {
    professional: String,
    lines: Vec<AnnotatedLine>,
    tally: LineTally,
    registry: DedupRegistry,
}

impl<'a> Aggregator<'a> {
    pub fn new(extractor: &'a dyn TextExtractor) -> Result<Self> {
        Ok(Self {
            extractor,
            classifier: LineClassifier::new()?,
            locator: ProfessionalLocator::new()?,
        })
    }

    /// Processes the batch in order and builds the coverage report.
    ///
    /// A document either contributes all of its lines and ids or none: it
    /// is classified against a staged copy of the registry that only
    /// replaces the run's registry once the whole document succeeded.
    pub fn aggregate(
        &self,
        documents: &[ReportDocument],
        settings: &RunSettings,
    ) -> CoverageReport {
        let mut registry = DedupRegistry::new();
        let mut lines = Vec::new();
        let mut summaries = Vec::with_capacity(documents.len());
        let mut tally = LineTally::default();

        for document in documents {
            let text = match self.extractor.extract_text(document) {
                Ok(text) => text,
                Err(error) => {
                    warn!(
                        document = %document.name,
                        error = %error,
                        "failed to extract report text"
                    );
                    summaries.push(failed_summary(document, None, &error));
                    continue;
                }
            };

            let Some(professional) = self.locator.locate(&text) else {
                info!(document = %document.name, "no professional marker, skipping report");
                summaries.push(DocumentSummary {
                    name: document.name.clone(),
                    status: DocumentStatus::Skipped,
                    professional: None,
                    tally: LineTally::default(),
                    error_kind: None,
                    error: None,
                });
                continue;
            };

            match self.classify_document(document, &text, professional, &registry, settings) {
                Ok(classified) => {
                    debug!(
                        document = %document.name,
                        professional = %classified.professional,
                        counted = classified.tally.counted,
                        duplicate = classified.tally.duplicate,
                        out_of_period = classified.tally.out_of_period,
                        "classified report"
                    );
                    registry = classified.registry;
                    lines.extend(classified.lines);
                    tally.absorb(&classified.tally);
                    summaries.push(DocumentSummary {
                        name: document.name.clone(),
                        status: DocumentStatus::Processed,
                        professional: Some(classified.professional),
                        tally: classified.tally,
                        error_kind: None,
                        error: None,
                    });
                }
                Err((professional, error)) => {
                    warn!(
                        document = %document.name,
                        professional = %professional,
                        error = %error,
                        "report rejected"
                    );
                    summaries.push(failed_summary(document, Some(professional), &error));
                }
            }
        }

        let rows = coverage_rows(&registry, settings.total_households);
        info!(
            documents = documents.len(),
            professionals = rows.iter().filter(|row| !row.is_total).count(),
            counted = tally.counted,
            duplicate = tally.duplicate,
            out_of_period = tally.out_of_period,
            "aggregation complete"
        );

        CoverageReport {
            window: settings.window,
            total_households: settings.total_households,
            rows,
            lines,
            documents: summaries,
            tally,
        }
    }

    fn classify_document(
        &self,
        document: &ReportDocument,
        text: &str,
        professional: String,
        registry: &DedupRegistry,
        settings: &RunSettings,
    ) -> Result<ClassifiedDocument, (String, CoverageError)> {
        let mut staged = registry.clone();
        let mut tally = LineTally::default();
        let mut lines = vec![header_line(&document.name)];

        for line in text.lines() {
            let annotated = match self.classifier.classify(
                line,
                &professional,
                &settings.window,
                &mut staged,
            ) {
                Ok(annotated) => annotated,
                Err(error) => return Err((professional, error)),
            };
            tally.record(annotated.status);
            lines.push(annotated);
        }

        Ok(ClassifiedDocument {
            professional,
            lines,
            tally,
            registry: staged,
        })
    }
}

fn header_line(document_name: &str) -> AnnotatedLine {
    let rule = "=".repeat(HEADER_RULE_WIDTH);
    AnnotatedLine::new(
        format!("{rule}\nINÍCIO DO RELATÓRIO: {document_name}\n{rule}"),
        LineStatus::Header,
    )
}

fn failed_summary(
    document: &ReportDocument,
    professional: Option<String>,
    error: &CoverageError,
) -> DocumentSummary {
    DocumentSummary {
        name: document.name.clone(),
        status: DocumentStatus::Failed,
        professional,
        tally: LineTally::default(),
        error_kind: Some(error.kind().to_string()),
        error: Some(error.to_string()),
    }
}

/// One row per professional in first-counted order, then the grand total
/// when anything was counted at all.
pub fn coverage_rows(registry: &DedupRegistry, total_households: i64) -> Vec<CoverageRow> {
    if registry.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<CoverageRow> = registry
        .counts()
        .map(|(professional, count)| CoverageRow::new(professional, count, total_households))
        .collect();

    let grand_total = registry.total();
    if grand_total > 0 {
        rows.push(CoverageRow::total(grand_total, total_households));
    }

    rows
}
