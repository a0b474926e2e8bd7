use serde::Serialize;

use crate::coverage::CoverageReport;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
    pub professional: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub report_count: usize,
    pub reports: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceHash {
    pub filename: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub command: String,
    pub layout: String,
    pub source_hashes: Vec<SourceHash>,
    pub report: CoverageReport,
}
