//! Progress-aware logging
//!
//! Log lines and progress bars share stderr. Every log write suspends the
//! bars so a line never lands in the middle of a redraw.

use indicatif::MultiProgress;
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// `MakeWriter` for the fmt layer that writes around the active bars
#[derive(Clone)]
pub struct ProgressLogWriter {
    progress: MultiProgress,
}

impl ProgressLogWriter {
    pub fn new(progress: MultiProgress) -> Self {
        Self { progress }
    }
}

impl Write for ProgressLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for ProgressLogWriter {
    type Writer = ProgressLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
