use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::coverage::{PdftotextExtractor, ProfessionalLocator, ReportDocument, TextExtractor};
use crate::model::{ReportEntry, ReportInventoryManifest};
use crate::util::{now_utc_string, sha256_hex, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let extractor = PdftotextExtractor::new(args.layout);
    let manifest = build_manifest(&args.input_dir, &extractor)?;

    for report in &manifest.reports {
        match (&report.professional, &report.error) {
            (_, Some(error)) => warn!(file = %report.filename, error = %error, "unreadable report"),
            (Some(professional), None) => {
                info!(file = %report.filename, professional = %professional, "report")
            }
            (None, None) => warn!(file = %report.filename, "report has no Subárea(s) marker"),
        }
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.input_dir.join("report_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(report_count = manifest.report_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(
    input_dir: &Path,
    extractor: &dyn TextExtractor,
) -> Result<ReportInventoryManifest> {
    let locator = ProfessionalLocator::new()?;

    let mut pdf_paths = discover_pdfs(input_dir)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDFs found in {}", input_dir.display());
    }

    let mut reports = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let document = ReportDocument::load(&path)?;
        let (professional, error) = match extractor.extract_text(&document) {
            Ok(text) => (locator.locate(&text), None),
            Err(error) => (None, Some(error.to_string())),
        };

        reports.push(ReportEntry {
            sha256: sha256_hex(&document.bytes),
            size_bytes: document.bytes.len(),
            filename: document.name,
            professional,
            error,
        });
    }

    Ok(ReportInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        report_count: reports.len(),
        reports,
    })
}

pub fn discover_pdfs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageError;

    struct MarkerFromBytes;

    impl TextExtractor for MarkerFromBytes {
        fn extract_pages(&self, document: &ReportDocument) -> Result<Vec<String>, CoverageError> {
            String::from_utf8(document.bytes.clone())
                .map(|text| vec![text])
                .map_err(|error| CoverageError::DocumentUnreadable {
                    document: document.name.clone(),
                    reason: error.to_string(),
                })
        }
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "acs_coverage_inventory_{}_{}",
            label,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn build_manifest_hashes_pdfs_and_finds_professionals() {
        let dir = scratch_dir("manifest");
        fs::write(dir.join("b.PDF"), "Subárea(s): Joana.\n").unwrap();
        fs::write(dir.join("a.pdf"), "Subárea(s): Maria.\n").unwrap();
        fs::write(dir.join("c.pdf"), [0xff_u8, 0xfe]).unwrap();
        fs::write(dir.join("notes.txt"), "Subárea(s): Ninguém.\n").unwrap();

        let manifest = build_manifest(&dir, &MarkerFromBytes).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let names: Vec<_> = manifest.reports.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF", "c.pdf"]);
        assert_eq!(manifest.reports[0].professional.as_deref(), Some("Maria"));
        assert_eq!(manifest.reports[1].professional.as_deref(), Some("Joana"));
        assert!(manifest.reports[2].error.is_some());
        assert_eq!(manifest.reports[0].sha256, sha256_hex("Subárea(s): Maria.\n".as_bytes()));
    }

    #[test]
    fn build_manifest_rejects_directory_without_pdfs() {
        let dir = scratch_dir("empty");
        let result = build_manifest(&dir, &MarkerFromBytes);
        fs::remove_dir_all(&dir).unwrap();
        assert!(result.is_err());
    }
}
