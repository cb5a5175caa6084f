//! Output formatting and writing functionality
//!
//! Formatters render records one at a time so output can be written while
//! the walk is still running.

mod formatters;
mod progress;
mod writers;

pub use self::formatters::{format_record_text, format_size, format_stats_text};
pub use self::progress::ProgressReporter;
pub use self::writers::{create_writer, FileWriter, OutputWriter, StdoutWriter};

use crate::error::Result;
use crate::models::config::OutputFormat;
use crate::models::{DependencyRecord, WalkStats};

/// Trait for different output formatters
pub trait Formatter {
    /// Text written before the first record
    fn begin(&self) -> Result<String> {
        Ok(String::new())
    }

    /// Render the `index`th record of the stream
    fn record(&self, record: &DependencyRecord, index: usize) -> Result<String>;

    /// Text written once the stream ended cleanly
    fn finish(&self, stats: &WalkStats) -> Result<String>;

    /// Render a complete, already collected walk
    fn format_all(&self, records: &[DependencyRecord], stats: &WalkStats) -> Result<String> {
        let mut output = self.begin()?;
        for (index, record) in records.iter().enumerate() {
            output.push_str(&self.record(record, index)?);
        }
        output.push_str(&self.finish(stats)?);
        Ok(output)
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    pub use_colors: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(use_colors: bool, verbose: bool, quiet: bool) -> Self {
        Self {
            use_colors,
            verbose,
            quiet,
        }
    }
}

impl Formatter for TextFormatter {
    fn record(&self, record: &DependencyRecord, _index: usize) -> Result<String> {
        // Quiet mode only reports the totals
        if self.quiet {
            return Ok(String::new());
        }
        let mut output = formatters::format_record_text(record, self.use_colors, self.verbose);
        output.push('\n');
        Ok(output)
    }

    fn finish(&self, stats: &WalkStats) -> Result<String> {
        if self.quiet {
            return Ok(formatters::format_stats_line(stats));
        }
        Ok(formatters::format_stats_text(stats, self.use_colors))
    }
}

/// JSON array of records, compatible with `module-deps` consumers
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Formatter for JsonFormatter {
    fn begin(&self) -> Result<String> {
        Ok("[".to_string())
    }

    fn record(&self, record: &DependencyRecord, index: usize) -> Result<String> {
        let json = formatters::format_record_json(record, self.pretty)?;
        let separator = if index == 0 { "" } else { "," };
        if self.pretty {
            Ok(format!("{}\n{}", separator, formatters::indent(&json, "  ")))
        } else {
            Ok(format!("{}{}", separator, json))
        }
    }

    fn finish(&self, _stats: &WalkStats) -> Result<String> {
        if self.pretty {
            Ok("\n]\n".to_string())
        } else {
            Ok("]\n".to_string())
        }
    }
}

/// One JSON record per line
pub struct NdjsonFormatter;

impl Formatter for NdjsonFormatter {
    fn record(&self, record: &DependencyRecord, _index: usize) -> Result<String> {
        let mut line = formatters::format_record_json(record, false)?;
        line.push('\n');
        Ok(line)
    }

    fn finish(&self, _stats: &WalkStats) -> Result<String> {
        Ok(String::new())
    }
}

/// Create a formatter based on the output format
pub fn create_formatter(
    format: OutputFormat,
    use_colors: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_colors, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Ndjson => Box::new(NdjsonFormatter),
    }
}
