//! Report rendering.
//!
//! The text report has two sections, tag counts and port/protocol counts:
//!
//! ```text
//! Tag Counts:
//! Tag,Count
//! sv_P1,2
//! Untagged,1
//!
//! Port/Protocol Combination Counts:
//! Port,Protocol,Count
//! 25,tcp,1
//! ```
//!
//! Rows are emitted in the order of the underlying ordered maps, so identical
//! input always renders to identical bytes.

use serde::Serialize;
use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use crate::{classify::Aggregates, Error, Result};

/// Label of the row carrying the untagged count.
pub const UNTAGGED_LABEL: &str = "Untagged";

/// Output format of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}' (expected text or json)", other)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => f.write_str("text"),
            ReportFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Serialize)]
struct TagRow<'a> {
    tag: &'a str,
    count: u64,
}

#[derive(Serialize)]
struct PortProtocolRow<'a> {
    port: &'a str,
    protocol: &'a str,
    count: u64,
}

#[derive(Serialize)]
struct StatsRow {
    lines_read: u64,
    lines_skipped: u64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tag_counts: Vec<TagRow<'a>>,
    untagged: u64,
    port_protocol_counts: Vec<PortProtocolRow<'a>>,
    stats: StatsRow,
}

impl<'a> From<&'a Aggregates> for JsonReport<'a> {
    fn from(agg: &'a Aggregates) -> Self {
        Self {
            tag_counts: agg
                .tag_counts
                .iter()
                .map(|(tag, &count)| TagRow { tag, count })
                .collect(),
            untagged: agg.untagged_count,
            port_protocol_counts: agg
                .port_protocol_counts
                .iter()
                .map(|(key, &count)| PortProtocolRow {
                    port: key.port(),
                    protocol: key.protocol(),
                    count,
                })
                .collect(),
            stats: StatsRow {
                lines_read: agg.stats.lines_read,
                lines_skipped: agg.stats.lines_skipped,
            },
        }
    }
}

fn write_text<W: Write>(agg: &Aggregates, out: &mut W) -> io::Result<()> {
    writeln!(out, "Tag Counts:")?;
    writeln!(out, "Tag,Count")?;
    for (tag, count) in &agg.tag_counts {
        writeln!(out, "{},{}", tag, count)?;
    }
    writeln!(out, "{},{}", UNTAGGED_LABEL, agg.untagged_count)?;
    writeln!(out)?;

    writeln!(out, "Port/Protocol Combination Counts:")?;
    writeln!(out, "Port,Protocol,Count")?;
    for (key, count) in &agg.port_protocol_counts {
        writeln!(out, "{},{},{}", key.port(), key.protocol(), count)?;
    }
    Ok(())
}

fn render<W: Write>(agg: &Aggregates, format: ReportFormat, out: &mut W, origin: &Path) -> Result<()> {
    let written = match format {
        ReportFormat::Text => write_text(agg, out),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonReport::from(agg))?;
            writeln!(out, "{}", json)
        }
    };
    written
        .and_then(|_| out.flush())
        .map_err(|e| Error::file_access(origin, e))
}

/// Render a report into any writer.
pub fn write_report<W: Write>(agg: &Aggregates, format: ReportFormat, mut out: W) -> Result<()> {
    render(agg, format, &mut out, Path::new("<report sink>"))
}

/// Render a report into a file, creating or truncating it.
pub fn write_report_to_path(
    agg: &Aggregates,
    format: ReportFormat,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::file_access(path, e))?;
    render(agg, format, &mut BufWriter::new(file), path)
}
