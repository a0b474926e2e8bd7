use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;

use anyhow::{Context, Result};
use clap::ValueEnum;
use regex::Regex;

use super::error::CoverageError;

const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// Readers accept the header anywhere in this prefix.
const SIGNATURE_SEARCH_LIMIT: usize = 1024;

/// One uploaded report, held fully in memory.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ReportDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, bytes))
    }

    pub fn has_pdf_signature(&self) -> bool {
        let prefix = &self.bytes[..self.bytes.len().min(SIGNATURE_SEARCH_LIMIT)];
        prefix
            .windows(PDF_SIGNATURE.len())
            .any(|window| window == PDF_SIGNATURE)
    }
}

/// Turns a report into its text, one entry per page in reading order.
pub trait TextExtractor {
    fn extract_pages(&self, document: &ReportDocument) -> Result<Vec<String>, CoverageError>;

    fn extract_text(&self, document: &ReportDocument) -> Result<String, CoverageError> {
        Ok(self.extract_pages(document)?.join("\n"))
    }
}

/// How `pdftotext` arranges words into lines.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LayoutMode {
    /// Physical rows, so a table row stays on one line (`-layout`).
    #[default]
    Layout,
    /// pdftotext's default reading order; wide columns may land on separate lines.
    Reading,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Reading => "reading",
        }
    }
}

/// Text-layer extraction through poppler's `pdftotext`, fed from memory.
#[derive(Debug, Clone, Copy)]
pub struct PdftotextExtractor {
    layout: LayoutMode,
}

impl PdftotextExtractor {
    pub fn new(layout: LayoutMode) -> Self {
        Self { layout }
    }

    fn args(&self) -> Vec<&'static str> {
        let mut args = vec!["-enc", "UTF-8"];
        if matches!(self.layout, LayoutMode::Layout) {
            args.push("-layout");
        }
        // PDF from stdin, text to stdout.
        args.extend(["-", "-"]);
        args
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_pages(&self, document: &ReportDocument) -> Result<Vec<String>, CoverageError> {
        let unreadable = |reason: String| CoverageError::DocumentUnreadable {
            document: document.name.clone(),
            reason,
        };

        if !document.has_pdf_signature() {
            return Err(unreadable("missing %PDF- signature".to_string()));
        }

        let mut command = Command::new("pdftotext");
        command.args(self.args());

        let output = run_with_stdin(command, &document.bytes)
            .map_err(|error| unreadable(format!("failed to execute pdftotext: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(unreadable(format!(
                "pdftotext returned non-zero exit status: {}",
                stderr.trim()
            )));
        }

        Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Runs `command` with `input` on its stdin while collecting its output.
fn run_with_stdin(mut command: Command, input: &[u8]) -> io::Result<Output> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("child stdin was not captured"))?;

    thread::scope(|scope| {
        // Writer runs beside the reader so a full stdout pipe cannot stall it.
        let writer = scope.spawn(move || {
            let result = stdin.write_all(input);
            drop(stdin);
            result
        });
        let output = child.wait_with_output()?;

        match writer.join() {
            Ok(Err(error)) if error.kind() != io::ErrorKind::BrokenPipe => Err(error),
            Ok(_) => Ok(output),
            Err(_) => Err(io::Error::other("stdin writer panicked")),
        }
    })
}

fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

/// Finds the professional a report belongs to from its `Subárea(s):` line.
#[derive(Debug)]
pub struct ProfessionalLocator {
    marker: Regex,
}

impl ProfessionalLocator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: Regex::new(r"Subárea\(s\):\s*(.*)")
                .context("failed to compile professional marker regex")?,
        })
    }

    /// First marker in the text only. Trailing periods and surrounding
    /// whitespace are dropped; an empty name counts as no marker.
    pub fn locate(&self, text: &str) -> Option<String> {
        let captured = self.marker.captures(text)?.get(1)?.as_str();
        let name = captured.trim().trim_end_matches('.').trim_end();
        if name.is_empty() {
            return None;
        }

        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_strips_whitespace_and_trailing_period() {
        let locator = ProfessionalLocator::new().unwrap();
        let text = "Relatório de visitas\nSubárea(s):   MARIA DAS DORES.  \n001 10/06/2024";
        assert_eq!(locator.locate(text).as_deref(), Some("MARIA DAS DORES"));
    }

    #[test]
    fn locate_uses_first_marker_only() {
        let locator = ProfessionalLocator::new().unwrap();
        let text = "Subárea(s): Maria.\nSubárea(s): Joana.";
        assert_eq!(locator.locate(text).as_deref(), Some("Maria"));
    }

    #[test]
    fn locate_returns_none_without_marker_or_name() {
        let locator = ProfessionalLocator::new().unwrap();
        assert_eq!(locator.locate("Subarea: Maria."), None);
        assert_eq!(locator.locate("Subárea(s): ."), None);
    }

    #[test]
    fn split_pages_drops_trailing_blank_pages() {
        let pages = split_pages("page one\n\u{000C}page two\n\u{000C}\n");
        assert_eq!(pages, vec!["page one\n".to_string(), "page two\n".to_string()]);
    }

    #[test]
    fn non_pdf_bytes_are_unreadable_without_running_pdftotext() {
        let document = ReportDocument::new("notes.pdf", b"plain text, not a pdf".to_vec());

        let error = PdftotextExtractor::new(LayoutMode::Layout)
            .extract_pages(&document)
            .unwrap_err();
        assert_eq!(error.kind(), "document_unreadable");
    }

    #[test]
    fn signature_is_found_after_leading_bytes() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        assert!(ReportDocument::new("bom.pdf", bytes).has_pdf_signature());

        let mut padded = vec![b'\n'; 1000];
        padded.extend_from_slice(b"%PDF-1.7");
        assert!(ReportDocument::new("padded.pdf", padded).has_pdf_signature());
    }

    #[test]
    fn signature_beyond_search_prefix_is_rejected() {
        let mut bytes = vec![b' '; SIGNATURE_SEARCH_LIMIT];
        bytes.extend_from_slice(b"%PDF-1.4");
        assert!(!ReportDocument::new("late.pdf", bytes).has_pdf_signature());
        assert!(!ReportDocument::new("short.pdf", b"%PD".to_vec()).has_pdf_signature());
    }

    #[test]
    fn pdftotext_reads_stdin_and_keeps_rows_by_default() {
        assert_eq!(LayoutMode::default(), LayoutMode::Layout);
        assert_eq!(
            PdftotextExtractor::new(LayoutMode::default()).args(),
            vec!["-enc", "UTF-8", "-layout", "-", "-"]
        );
        assert_eq!(
            PdftotextExtractor::new(LayoutMode::Reading).args(),
            vec!["-enc", "UTF-8", "-", "-"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn run_with_stdin_feeds_document_bytes_to_the_child() {
        let input = b"%PDF-1.4\n001 ANA 10/06/2024\n".repeat(20_000);
        let output = run_with_stdin(Command::new("cat"), &input).unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, input);
    }
}
