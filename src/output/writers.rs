//! Output writing functionality
//!
//! Writers accept output in pieces; nothing is buffered beyond what the
//! destination itself buffers.

use crate::error::{DepsError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Trait for output writers
pub trait OutputWriter {
    /// Write a piece of content to the destination
    fn write(&mut self, content: &str) -> Result<()>;

    /// Flush anything still buffered
    fn flush(&mut self) -> Result<()>;
}

/// Writer for stdout output
#[derive(Debug, Default)]
pub struct StdoutWriter;

impl OutputWriter for StdoutWriter {
    fn write(&mut self, content: &str) -> Result<()> {
        io::stdout()
            .lock()
            .write_all(content.as_bytes())
            .map_err(|e| DepsError::StdoutWrite { source: e })
    }

    fn flush(&mut self) -> Result<()> {
        io::stdout()
            .flush()
            .map_err(|e| DepsError::StdoutWrite { source: e })
    }
}

/// Writer for file output
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    file: BufWriter<File>,
}

impl FileWriter {
    /// Create (or truncate) the output file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| DepsError::OutputWrite {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self {
            path,
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputWriter for FileWriter {
    fn write(&mut self, content: &str) -> Result<()> {
        self.file
            .write_all(content.as_bytes())
            .map_err(|e| DepsError::OutputWrite {
                path: self.path.clone(),
                source: e,
            })
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| DepsError::OutputWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Create an output writer based on the output file option
pub fn create_writer(output_file: Option<impl AsRef<Path>>) -> Result<Box<dyn OutputWriter>> {
    match output_file {
        Some(path) => Ok(Box::new(FileWriter::create(path)?)),
        None => Ok(Box::new(StdoutWriter)),
    }
}
