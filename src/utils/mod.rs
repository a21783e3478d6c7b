//! Utility functions

mod progress_log;
mod sanitize;

pub use progress_log::ProgressLogWriter;
pub use sanitize::sanitize_filename;
