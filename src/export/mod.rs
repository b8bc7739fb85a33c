//! Export of selection results.
//!
//! Provides the plain representative list (one ID per line) and the JSON
//! run report.

pub mod report;
pub mod representatives;

pub use report::{read_report, report_to_json, write_report};
pub use representatives::{format_representatives, write_representatives};
