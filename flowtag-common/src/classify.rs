//! Flow record classification.
//!
//! Every flow log line with at least [`MIN_FLOW_FIELDS`] whitespace-delimited
//! fields is keyed by its destination port and normalized protocol, tagged
//! through the [`LookupTable`] and counted. Shorter lines are skipped without
//! error: flow logs routinely contain truncated entries.

use log::trace;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    lookup::LookupTable,
    types::{FlowProtocol, LookupKey, DSTPORT_FIELD, MIN_FLOW_FIELDS, PROTOCOL_FIELD},
    Error, Result,
};

/// Line bookkeeping that is not part of the tagging result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// Every line consumed, valid or not.
    pub lines_read: u64,
    /// Lines with too few fields to classify.
    pub lines_skipped: u64,
}

/// Counts produced by classifying a set of flow records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    /// Records per tag. Only tags present in the lookup table appear.
    pub tag_counts: BTreeMap<String, u64>,
    /// Records per observed (port, protocol), tagged or not.
    pub port_protocol_counts: BTreeMap<LookupKey, u64>,
    /// Records whose (port, protocol) has no lookup entry.
    pub untagged_count: u64,
    pub stats: ClassifyStats,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a single flow log line and fold it into the counts.
    ///
    /// Returns the key the line was counted under, or `None` when the line
    /// was skipped.
    pub fn record(&mut self, line: &str, table: &LookupTable) -> Option<LookupKey> {
        self.stats.lines_read += 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FLOW_FIELDS {
            self.stats.lines_skipped += 1;
            trace!(
                "Skipping line {} with {} fields",
                self.stats.lines_read,
                fields.len()
            );
            return None;
        }

        let protocol = FlowProtocol::from_indicator(fields[PROTOCOL_FIELD]);
        let key = LookupKey::for_flow(fields[DSTPORT_FIELD], protocol);

        match table.get(&key) {
            Some(tag) => *self.tag_counts.entry(tag.to_string()).or_insert(0) += 1,
            None => self.untagged_count += 1,
        }
        *self.port_protocol_counts.entry(key.clone()).or_insert(0) += 1;

        Some(key)
    }

    /// Number of records that were classified.
    pub fn classified(&self) -> u64 {
        self.stats.lines_read - self.stats.lines_skipped
    }

    /// Number of classified records that matched a tag.
    pub fn tagged(&self) -> u64 {
        self.tag_counts.values().sum()
    }
}

/// Classify an in-memory sequence of lines.
pub fn classify_lines<I, S>(lines: I, table: &LookupTable) -> Aggregates
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregates = Aggregates::new();
    for line in lines {
        aggregates.record(line.as_ref(), table);
    }
    aggregates
}

/// Classify every line of a buffered reader.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected. Only a
/// failure to read from `reader` is an error.
pub fn classify_reader<R: BufRead>(reader: R, table: &LookupTable) -> Result<Aggregates> {
    read_lines(reader, table, Path::new("<flow source>"))
}

/// Classify every line of a flow log file.
pub fn classify_path(path: impl AsRef<Path>, table: &LookupTable) -> Result<Aggregates> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
    read_lines(BufReader::new(file), table, path)
}

fn read_lines<R: BufRead>(reader: R, table: &LookupTable, origin: &Path) -> Result<Aggregates> {
    let mut aggregates = Aggregates::new();
    for chunk in reader.split(b'\n') {
        let bytes = chunk.map_err(|e| Error::file_access(origin, e))?;
        aggregates.record(&String::from_utf8_lossy(&bytes), table);
    }
    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(dstport: &str, protocol: &str) -> String {
        format!(
            "2 123456789012 eni-0a1b2c3d 10.0.1.201 198.51.100.2 {} {} 25 20000 1620140761 1620140821 ACCEPT OK x",
            dstport, protocol
        )
    }

    fn sample_table() -> LookupTable {
        let mut table = LookupTable::new();
        table.insert(LookupKey::new("25", "tcp"), "sv_P1");
        table.insert(LookupKey::new("68", "udp"), "sv_P2");
        table.insert(LookupKey::new("23", "tcp"), "sv_P1");
        table
    }

    fn assert_conserved(agg: &Aggregates) {
        let ppc: u64 = agg.port_protocol_counts.values().sum();
        assert_eq!(agg.tagged() + agg.untagged_count, agg.classified());
        assert_eq!(ppc, agg.classified());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let lines = vec![
            flow("25", "6"),
            flow("68", "17"),
            flow("99", "6"),
            "2 123456789012 eni-0a1b2c3d 10.0.1.201 198.51.100.2 25 6 25".to_string(),
        ];
        let agg = classify_lines(&lines, &sample_table());

        assert_eq!(agg.tag_counts.len(), 2);
        assert_eq!(agg.tag_counts["sv_P1"], 1);
        assert_eq!(agg.tag_counts["sv_P2"], 1);
        assert_eq!(agg.untagged_count, 1);
        assert_eq!(agg.port_protocol_counts.len(), 3);
        assert_eq!(agg.port_protocol_counts[&LookupKey::new("25", "tcp")], 1);
        assert_eq!(agg.port_protocol_counts[&LookupKey::new("68", "udp")], 1);
        assert_eq!(agg.port_protocol_counts[&LookupKey::new("99", "tcp")], 1);
        assert_eq!(agg.stats, ClassifyStats { lines_read: 4, lines_skipped: 1 });
        assert_conserved(&agg);
    }

    #[test]
    fn test_protocol_normalization() {
        let table = LookupTable::new();
        let lines = vec![flow("1", "6"), flow("1", "17"), flow("1", "1"), flow("1", "abc")];
        let agg = classify_lines(&lines, &table);

        assert_eq!(agg.port_protocol_counts[&LookupKey::new("1", "tcp")], 1);
        assert_eq!(agg.port_protocol_counts[&LookupKey::new("1", "udp")], 3);
        assert_eq!(agg.untagged_count, 4);
    }

    #[test]
    fn test_short_lines_touch_nothing() {
        let lines = vec!["", "   ", "a b c d e 25 6 x y z w v u"];
        let agg = classify_lines(lines, &sample_table());

        assert!(agg.tag_counts.is_empty());
        assert!(agg.port_protocol_counts.is_empty());
        assert_eq!(agg.untagged_count, 0);
        assert_eq!(agg.stats.lines_skipped, 3);
    }

    #[test]
    fn test_exactly_fourteen_fields_is_valid() {
        let line = "a b c d e 25 6 x y z w v u t";
        let mut agg = Aggregates::new();
        let key = agg.record(line, &sample_table());
        assert_eq!(key, Some(LookupKey::new("25", "tcp")));
        assert_eq!(agg.tag_counts["sv_P1"], 1);
    }

    #[test]
    fn test_tag_shared_by_keys_accumulates() {
        let lines = vec![flow("25", "6"), flow("23", "6"), flow("23", "6")];
        let agg = classify_lines(&lines, &sample_table());
        assert_eq!(agg.tag_counts["sv_P1"], 3);
        assert_eq!(agg.port_protocol_counts[&LookupKey::new("23", "tcp")], 2);
        assert_conserved(&agg);
    }

    #[test]
    fn test_mixed_whitespace_splits() {
        let line = "a\tb  c d e 68 17\t x y z w v u t  ";
        let agg = classify_lines([line], &sample_table());
        assert_eq!(agg.tag_counts["sv_P2"], 1);
    }

    #[test]
    fn test_classify_reader_handles_invalid_utf8() {
        let mut input = flow("25", "6").into_bytes();
        input.push(b'\n');
        input.extend_from_slice(b"\xff\xfe broken line\n");
        input.extend_from_slice(flow("68", "17").as_bytes());

        let agg = classify_reader(&input[..], &sample_table()).unwrap();
        assert_eq!(agg.stats.lines_read, 3);
        assert_eq!(agg.stats.lines_skipped, 1);
        assert_eq!(agg.tagged(), 2);
    }

    #[test]
    fn test_classify_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = classify_path(dir.path().join("missing.txt"), &sample_table()).unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn test_conservation_over_varied_input() {
        let mut lines = Vec::new();
        for port in 0..40u32 {
            let proto = if port % 3 == 0 { "6" } else { "17" };
            lines.push(flow(&port.to_string(), proto));
            if port % 7 == 0 {
                lines.push(format!("{} short", port));
            }
        }
        let agg = classify_lines(&lines, &sample_table());
        assert_eq!(agg.classified(), 40);
        assert_conserved(&agg);
    }
}
