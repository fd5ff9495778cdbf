//! EPG (Electronic Program Guide) module
//!
//! Schedule documents, normalization into program records, refresh
//! throttling and XMLTV export.

mod normalizer;
mod program;
mod refresh;
pub mod schedule;
pub mod window;
mod xmltv;

// Re-export public types
pub use program::ProgramRecord;
pub use refresh::{ProgramStore, RefreshOutcome, Refresher, ScheduleSource};
pub use window::FetchWindow;
pub use xmltv::write_xmltv;

/// Format a timestamp as local datetime YYYY-MM-DD HH:MM
pub fn format_datetime<Tz: chrono::TimeZone>(ts: &chrono::DateTime<Tz>) -> String {
    ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string()
}
