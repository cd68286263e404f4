//! Append-only result sinks.
//!
//! One line per trial, comma-separated, flushed immediately: a run that
//! dies mid-way leaves every completed trial on disk. Records are never
//! rewritten after emission.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Destination for trial records.
pub trait RecordSink {
    /// Append one record line and make it durable before returning.
    fn emit(&mut self, line: &str) -> Result<(), Error>;
}

/// CSV file sink.
#[derive(Debug)]
pub struct CsvSink {
    out: BufWriter<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Create (truncate) the output file.
    ///
    /// An unusable path is a configuration error: it is caught before any
    /// measurement begins.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|err| Error::Config(format!("cannot open '{}': {err}", path.display())))?;
        Ok(Self {
            out: BufWriter::new(file),
            path,
        })
    }

    /// Path this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn emit(&mut self, line: &str) -> Result<(), Error> {
        writeln!(self.out, "{line}")?;
        // Flush per record: a partial run must still leave complete rows.
        self.out.flush()?;
        Ok(())
    }
}
