use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;

use super::error::CoverageError;
use super::registry::DedupRegistry;
use super::types::{AnnotatedLine, LineStatus, VisitRecord};
use super::window::ReportingWindow;

#[derive(Debug)]
pub struct LineClassifier {
    visit_date: Regex,
    record_id: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            visit_date: Regex::new(r"(\d{2}/\d{2}/\d{4})")
                .context("failed to compile visit date regex")?,
            record_id: Regex::new(r"^\s*(\d+)").context("failed to compile record id regex")?,
        })
    }

    /// Reads the record id and visit date off a report line.
    ///
    /// `Ok(None)` means the line is not a visit record. A line shaped like a
    /// record whose date is not a real calendar day is an error.
    pub fn parse_record<'a>(
        &self,
        line: &'a str,
    ) -> Result<Option<VisitRecord<'a>>, CoverageError> {
        let Some(date_text) = self
            .visit_date
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
        else {
            return Ok(None);
        };
        let Some(record_id) = self
            .record_id
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
        else {
            return Ok(None);
        };

        let visit_date = NaiveDate::parse_from_str(date_text, "%d/%m/%Y").map_err(|_| {
            CoverageError::MalformedDate {
                value: date_text.to_string(),
                line: line.to_string(),
            }
        })?;

        Ok(Some(VisitRecord {
            record_id,
            visit_date,
            raw_line: line,
        }))
    }

    /// Classifies one line for `professional`, counting it in `registry`
    /// when it is a new in-window visit.
    ///
    /// The window is checked before the registry: an out-of-period visit is
    /// never reported as a duplicate and never recorded.
    pub fn classify(
        &self,
        line: &str,
        professional: &str,
        window: &ReportingWindow,
        registry: &mut DedupRegistry,
    ) -> Result<AnnotatedLine, CoverageError> {
        let Some(record) = self.parse_record(line)? else {
            return Ok(AnnotatedLine::new(line, LineStatus::Normal));
        };

        let status = if !window.contains(record.visit_date) {
            LineStatus::OutOfPeriod
        } else if registry.contains(professional, record.record_id) {
            LineStatus::Duplicate
        } else {
            registry.insert(professional, record.record_id);
            LineStatus::Counted
        };

        Ok(AnnotatedLine::new(record.raw_line, status))
    }
}
