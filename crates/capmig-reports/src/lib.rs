//! Report rendering and persistence for migration runs.
//!
//! Presentation glue only: the core result structs serialize directly
//! into gzip JSON, a CSV workbook (one sheet file per classification
//! bucket plus roles/users), and a GEXF nesting graph.

pub mod error;
pub mod gexf;
pub mod json;
pub mod report;
pub mod workbook;

pub use error::{ReportError, Result};
pub use json::{read_gzip_json, write_gzip_json, write_pretty_json};
pub use report::MigrationReport;
pub use workbook::WorkbookWriter;
