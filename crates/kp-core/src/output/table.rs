//! Per-event CSV export.

use chrono::SecondsFormat;
use kp_common::{Error, NormalizedRecord, Result};
use serde::Serialize;
use std::io::Write;

/// Column names, in output order.
pub const TABLE_HEADER: [&str; 5] = [
    "MessageSentTime",
    "MessageReceivedTime",
    "Latency",
    "LatencyInNanoSeconds",
    "Partition",
];

/// Presentation projection of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub sent_at: String,
    pub received_at: String,
    pub latency: String,
    pub latency_nanos: i64,
    pub partition: i32,
}

impl From<&NormalizedRecord> for TableRow {
    fn from(record: &NormalizedRecord) -> Self {
        let latency = record.latency();
        Self {
            sent_at: record.sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            received_at: record.received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            latency: latency.to_string(),
            latency_nanos: latency.as_nanos(),
            partition: record.partition.0,
        }
    }
}

/// Streams rows to the sink as records arrive.
pub struct TableEncoder<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> TableEncoder<W> {
    /// Wrap `sink`, writing the header row first when `header` is set.
    pub fn new(sink: W, header: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        if header {
            writer.write_record(TABLE_HEADER).map_err(csv_error)?;
        }
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_record(&mut self, record: &NormalizedRecord) -> Result<()> {
        self.writer
            .serialize(TableRow::from(record))
            .map_err(csv_error)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush buffered rows and hand back the sink.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

fn csv_error(err: csv::Error) -> Error {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::Encode(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    fn encode(records: &[NormalizedRecord], header: bool) -> String {
        let mut encoder = TableEncoder::new(Vec::new(), header).unwrap();
        for record in records {
            encoder.write_record(record).unwrap();
        }
        assert_eq!(encoder.rows(), records.len() as u64);
        String::from_utf8(encoder.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_row_projection() {
        let sent = at(1_617_104_831_727);
        let record = NormalizedRecord::new(sent, at(1_617_104_831_977), 7);
        let row = TableRow::from(&record);
        assert_eq!(row.sent_at, "2021-03-30T11:47:11.727Z");
        assert_eq!(row.received_at, "2021-03-30T11:47:11.977Z");
        assert_eq!(row.latency, "250ms");
        assert_eq!(row.latency_nanos, 250_000_000);
        assert_eq!(row.partition, 7);
    }

    #[test]
    fn test_header_then_rows() {
        let out = encode(
            &[
                NormalizedRecord::new(at(0), at(1_500), 0),
                NormalizedRecord::new(at(2_000), at(1_960), 1),
            ],
            true,
        );
        assert_eq!(
            out,
            "MessageSentTime,MessageReceivedTime,Latency,LatencyInNanoSeconds,Partition\n\
             1970-01-01T00:00:00.000Z,1970-01-01T00:00:01.500Z,1.5s,1500000000,0\n\
             1970-01-01T00:00:02.000Z,1970-01-01T00:00:01.960Z,-40ms,-40000000,1\n"
        );
    }

    #[test]
    fn test_without_header() {
        let out = encode(&[NormalizedRecord::new(at(0), at(0), 3)], false);
        assert_eq!(out, "1970-01-01T00:00:00.000Z,1970-01-01T00:00:00.000Z,0s,0,3\n");
    }

    #[test]
    fn test_empty_table_is_header_only() {
        assert_eq!(encode(&[], true).lines().count(), 1);
        assert!(encode(&[], false).is_empty());
    }
}
