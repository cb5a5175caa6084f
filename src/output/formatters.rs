//! Output formatting functionality
//!
//! Rendering helpers shared by the formatters in this module.

use crate::error::{DepsError, Result};
use crate::models::{DependencyRecord, WalkStats};
use ansi_term::Colour::{Blue, Cyan, Green, Red, Yellow};
use ansi_term::Style;

/// Format one record as a block of text
pub fn format_record_text(record: &DependencyRecord, use_colors: bool, verbose: bool) -> String {
    let mut output = String::new();

    let file = record.file.display().to_string();
    let mut header = if use_colors {
        Blue.bold().paint(file).to_string()
    } else {
        file
    };

    if record.entry {
        header.push_str(&tag("entry", use_colors, Green.normal()));
    }
    if let Some(expose) = &record.expose {
        header.push_str(&tag(&format!("expose {}", expose), use_colors, Cyan.normal()));
    }
    if record.noparse {
        header.push_str(&tag("noparse", use_colors, Yellow.normal()));
    }
    output.push_str(&header);
    output.push('\n');

    if verbose {
        let detail = format!("  id: {}, source: {}", record.id, format_size(record.source.len() as u64));
        if use_colors {
            output.push_str(&Style::new().dimmed().paint(detail).to_string());
        } else {
            output.push_str(&detail);
        }
        output.push('\n');
    }

    for (reference, resolved) in &record.deps {
        let target = match resolved {
            Some(module) => {
                let file = module.file.display().to_string();
                if use_colors {
                    Style::new().dimmed().paint(file).to_string()
                } else {
                    file
                }
            }
            None if use_colors => Red.paint("false").to_string(),
            None => "false".to_string(),
        };
        output.push_str(&format!("  {} -> {}\n", reference, target));
    }

    output
}

fn tag(label: &str, use_colors: bool, style: Style) -> String {
    if use_colors {
        format!(" {}", style.paint(format!("[{}]", label)))
    } else {
        format!(" [{}]", label)
    }
}

/// Format walk statistics as a summary block
pub fn format_stats_text(stats: &WalkStats, use_colors: bool) -> String {
    let mut output = String::new();

    let title = "Walk Summary";
    if use_colors {
        output.push_str(&Style::new().bold().underline().paint(title).to_string());
    } else {
        output.push_str(title);
    }
    output.push('\n');

    output.push_str(&format!("  Modules: {}\n", stats.modules));
    output.push_str(&format!("  Files read: {}\n", stats.files_read));
    output.push_str(&format!("  Cache hits: {}\n", stats.cache_hits));
    output.push_str(&format!("  Transforms applied: {}\n", stats.transforms_applied));

    let missing = format!("  Missing: {}", stats.missing);
    if use_colors && stats.missing > 0 {
        output.push_str(&Yellow.paint(missing).to_string());
    } else {
        output.push_str(&missing);
    }
    output.push('\n');

    output
}

/// Format walk statistics on a single line
pub fn format_stats_line(stats: &WalkStats) -> String {
    format!(
        "Modules: {}, files read: {}, cache hits: {}, missing: {}\n",
        stats.modules, stats.files_read, stats.cache_hits, stats.missing
    )
}

/// Format a record as JSON
pub fn format_record_json(record: &DependencyRecord, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(record)
    } else {
        serde_json::to_string(record)
    };
    rendered.map_err(|e| DepsError::JsonSerialize { source: e })
}

/// Format a byte count in a human-readable way
pub fn format_size(size: u64) -> String {
    if size < 1024 {
        format!("{}B", size)
    } else if size < 1024 * 1024 {
        format!("{:.2}KB", size as f64 / 1024.0)
    } else {
        format!("{:.2}MB", size as f64 / (1024.0 * 1024.0))
    }
}

/// Indent every line of a pretty-printed JSON value
pub(crate) fn indent(text: &str, by: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", by, line))
        .collect::<Vec<_>>()
        .join("\n")
}
