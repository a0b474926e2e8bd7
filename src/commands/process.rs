use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Local, Utc};
use tracing::{info, warn};

use crate::cli::ProcessArgs;
use crate::commands::inventory::discover_pdfs;
use crate::coverage::{
    Aggregator, PdftotextExtractor, ReportDocument, ReportingWindow, RunSettings,
};
use crate::model::{ProcessRunManifest, SourceHash};
use crate::util::{now_utc_string, sha256_hex, utc_compact_string, write_json_pretty};

mod output;

pub fn run(args: ProcessArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let today = Local::now().date_naive();
    let window = ReportingWindow::resolve(args.start.as_deref(), args.end.as_deref(), today)?;
    let settings = RunSettings::new(window, args.total_households)?;

    let paths = collect_document_paths(&args)?;
    info!(
        run_id = %run_id,
        documents = paths.len(),
        window = %window.label(),
        total_households = settings.total_households,
        "starting coverage run"
    );

    let documents = paths
        .iter()
        .map(|path| ReportDocument::load(path))
        .collect::<Result<Vec<_>>>()?;

    let extractor = PdftotextExtractor::new(args.layout);
    let aggregator = Aggregator::new(&extractor)?;
    let report = aggregator.aggregate(&documents, &settings);

    for failure in report.failures() {
        warn!(
            document = %failure.name,
            kind = failure.error_kind.as_deref().unwrap_or_default(),
            error = failure.error.as_deref().unwrap_or_default(),
            "report failed"
        );
    }
    if !report.has_counted_visits() {
        warn!(window = %window.label(), "no valid visits found for the selected period");
    }

    if args.json {
        output::write_json_report(&report)?;
    } else {
        output::write_text_report(&report, args.detailed)?;
    }

    if let Some(report_path) = &args.report_path {
        let manifest = ProcessRunManifest {
            manifest_version: 1,
            run_id,
            started_at,
            completed_at: now_utc_string(),
            command: render_process_command(&args),
            layout: args.layout.as_str().to_string(),
            source_hashes: documents
                .iter()
                .map(|document| SourceHash {
                    filename: document.name.clone(),
                    sha256: sha256_hex(&document.bytes),
                })
                .collect(),
            report,
        };
        write_json_pretty(report_path, &manifest)?;
        info!(path = %report_path.display(), "wrote run manifest");
    }

    Ok(())
}

fn collect_document_paths(args: &ProcessArgs) -> Result<Vec<PathBuf>> {
    let mut paths = args.files.clone();
    if let Some(input_dir) = &args.input_dir {
        let mut discovered = discover_pdfs(input_dir)?;
        discovered.sort();
        paths.extend(discovered);
    }

    if paths.is_empty() {
        bail!("no report PDFs given; pass files or --input-dir");
    }

    Ok(paths)
}

fn render_process_command(args: &ProcessArgs) -> String {
    let mut command = vec!["acs-coverage".to_string(), "process".to_string()];

    for file in &args.files {
        command.push(file.display().to_string());
    }
    if let Some(path) = &args.input_dir {
        command.push("--input-dir".to_string());
        command.push(path.display().to_string());
    }
    command.push("--total-households".to_string());
    command.push(args.total_households.to_string());
    if let Some(start) = &args.start {
        command.push("--start".to_string());
        command.push(start.clone());
    }
    if let Some(end) = &args.end {
        command.push("--end".to_string());
        command.push(end.clone());
    }
    command.push("--layout".to_string());
    command.push(args.layout.as_str().to_string());
    if args.detailed {
        command.push("--detailed".to_string());
    }
    if args.json {
        command.push("--json".to_string());
    }
    if let Some(path) = &args.report_path {
        command.push("--report-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LayoutMode;

    fn args() -> ProcessArgs {
        ProcessArgs {
            files: vec![PathBuf::from("maria.pdf")],
            input_dir: None,
            total_households: 120,
            start: Some("15/05/2024".to_string()),
            end: None,
            layout: LayoutMode::Layout,
            detailed: true,
            json: false,
            report_path: None,
        }
    }

    #[test]
    fn render_process_command_echoes_given_options() {
        assert_eq!(
            render_process_command(&args()),
            "acs-coverage process maria.pdf --total-households 120 --start 15/05/2024 --layout layout --detailed"
        );
    }

    #[test]
    fn collect_document_paths_requires_at_least_one_report() {
        let mut args = args();
        args.files.clear();
        assert!(collect_document_paths(&args).is_err());
    }
}
