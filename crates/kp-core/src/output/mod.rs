//! Report and table writers.

pub mod json;
pub mod table;
pub mod text;

pub use json::{JsonReport, LatencySummary};
pub use table::{TableEncoder, TableRow, TABLE_HEADER};
pub use text::render_text_report;
