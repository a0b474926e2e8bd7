mod aggregate;
mod classifier;
mod error;
mod extract;
mod registry;
mod types;
mod window;

pub use aggregate::{Aggregator, RunSettings};
pub use error::CoverageError;
pub use extract::{
    LayoutMode, PdftotextExtractor, ProfessionalLocator, ReportDocument, TextExtractor,
};
pub use types::{CoverageReport, DocumentStatus, LineStatus};
pub use window::ReportingWindow;
