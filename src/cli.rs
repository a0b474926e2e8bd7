use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use crate::coverage::LayoutMode;

#[derive(Parser, Debug)]
#[command(
    name = "acs-coverage",
    version,
    about = "Monthly closing of community health worker visit reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count unique visited families per professional for one reporting window.
    Process(ProcessArgs),
    /// List the reports in a directory with their hash and professional.
    Inventory(InventoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Report PDFs to process, in order.
    pub files: Vec<PathBuf>,

    /// Also process every PDF found in this directory.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "ACS_TOTAL_HOUSEHOLDS",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub total_households: i64,

    /// First day of the window (DD/MM/YYYY). Defaults to the 15th of last month.
    #[arg(long)]
    pub start: Option<String>,

    /// Last day of the window (DD/MM/YYYY). Defaults to the 14th of this month.
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long, value_enum, default_value_t = LayoutMode::Layout)]
    pub layout: LayoutMode,

    /// Print every extracted line with its classification.
    #[arg(long, default_value_t = false)]
    pub detailed: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Write a JSON run manifest to this path.
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    pub input_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LayoutMode::Layout)]
    pub layout: LayoutMode,
}
