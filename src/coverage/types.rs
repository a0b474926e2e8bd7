use chrono::NaiveDate;
use serde::Serialize;

use super::window::ReportingWindow;

pub const TOTAL_ROW_LABEL: &str = "TOTAL GERAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Header,
    Counted,
    Duplicate,
    OutOfPeriod,
    Normal,
}

impl LineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Counted => "counted",
            Self::Duplicate => "duplicate",
            Self::OutOfPeriod => "out_of_period",
            Self::Normal => "normal",
        }
    }
}

/// A visit line that carried both a record id and a parseable date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord<'a> {
    pub record_id: &'a str,
    pub visit_date: NaiveDate,
    pub raw_line: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedLine {
    pub text: String,
    pub status: LineStatus,
}

impl AnnotatedLine {
    pub fn new(text: impl Into<String>, status: LineStatus) -> Self {
        Self {
            text: text.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    pub professional: String,
    pub unique_families: usize,
    pub coverage_percent: f64,
    pub coverage: String,
    pub is_total: bool,
}

impl CoverageRow {
    pub fn new(
        professional: impl Into<String>,
        unique_families: usize,
        total_households: i64,
    ) -> Self {
        let coverage_percent = coverage_percent(unique_families, total_households);
        Self {
            professional: professional.into(),
            unique_families,
            coverage_percent,
            coverage: format!("{coverage_percent:.2}%"),
            is_total: false,
        }
    }

    pub fn total(unique_families: usize, total_households: i64) -> Self {
        Self {
            is_total: true,
            ..Self::new(TOTAL_ROW_LABEL, unique_families, total_households)
        }
    }
}

/// Share of registered households visited, as a percentage. Zero when the
/// household total is not positive.
pub fn coverage_percent(unique_families: usize, total_households: i64) -> f64 {
    if total_households <= 0 {
        return 0.0;
    }

    unique_families as f64 / total_households as f64 * 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineTally {
    pub counted: usize,
    pub duplicate: usize,
    pub out_of_period: usize,
    pub normal: usize,
}

impl LineTally {
    pub fn record(&mut self, status: LineStatus) {
        match status {
            LineStatus::Counted => self.counted += 1,
            LineStatus::Duplicate => self.duplicate += 1,
            LineStatus::OutOfPeriod => self.out_of_period += 1,
            LineStatus::Normal => self.normal += 1,
            LineStatus::Header => {}
        }
    }

    pub fn absorb(&mut self, other: &LineTally) {
        self.counted += other.counted;
        self.duplicate += other.duplicate;
        self.out_of_period += other.out_of_period;
        self.normal += other.normal;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed,
    /// No professional marker; the document is ignored without error.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub status: DocumentStatus,
    pub professional: Option<String>,
    pub tally: LineTally,
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub window: ReportingWindow,
    pub total_households: i64,
    pub rows: Vec<CoverageRow>,
    pub lines: Vec<AnnotatedLine>,
    pub documents: Vec<DocumentSummary>,
    pub tally: LineTally,
}

impl CoverageReport {
    pub fn has_counted_visits(&self) -> bool {
        self.tally.counted > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentSummary> {
        self.documents
            .iter()
            .filter(|document| document.status == DocumentStatus::Failed)
    }
}
