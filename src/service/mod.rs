pub mod report;

pub use report::{ReportError, ReportService, ValidationReport};
