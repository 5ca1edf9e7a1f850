//! Envelope line decoding.
//!
//! One input line is the JSON form of a consumed log message. Its `value` is an
//! Avro Object Container; every record inside it yields one
//! [`NormalizedRecord`] stamped with the envelope's partition and receive time.

use super::value::{FieldValue, Record};
use apache_avro::Reader;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use kp_common::{DecodeError, FieldError, NormalizedRecord};
use serde::Deserialize;
use tracing::{debug, trace};

/// Characters of the offending line kept in envelope errors.
const EXCERPT_CHARS: usize = 120;

/// Characters of a rendered record kept in timestamp errors.
const RENDERED_RECORD_CHARS: usize = 256;

// ── wire format ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, alias = "Partition")]
    partition: i32,

    #[serde(default, alias = "Value")]
    value: Option<Payload>,

    #[serde(alias = "Time", alias = "timestamp")]
    time: ReceiveTime,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Base64(String),
    Raw(Vec<u8>),
}

impl Payload {
    fn into_bytes(self) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            Payload::Base64(text) => STANDARD.decode(text),
            Payload::Raw(bytes) => Ok(bytes),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReceiveTime {
    EpochMillis(i64),
    Rfc3339(String),
}

impl ReceiveTime {
    fn resolve(&self) -> Result<DateTime<Utc>, String> {
        match self {
            ReceiveTime::EpochMillis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
                .ok_or_else(|| format!("receive time {ms} is out of range")),
            ReceiveTime::Rfc3339(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("receive time {text:?} is not RFC 3339: {e}")),
        }
    }
}

// ── decoder ─────────────────────────────────────────────────────────────

/// Stateless line decoder; safe to share between workers.
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder {
    timestamp_field: String,
}

impl EnvelopeDecoder {
    pub fn new(timestamp_field: impl Into<String>) -> Self {
        Self {
            timestamp_field: timestamp_field.into(),
        }
    }

    pub fn timestamp_field(&self) -> &str {
        &self.timestamp_field
    }

    /// Decode one line (without its `\n`). `line_no` is 1-based.
    ///
    /// Blank lines decode to no records. A container with zero records is
    /// valid and also yields an empty vector.
    pub fn decode_line(
        &self,
        line_no: u64,
        line: &str,
    ) -> Result<Vec<NormalizedRecord>, DecodeError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            debug!(line = line_no, "skipping blank line");
            return Ok(Vec::new());
        }

        let envelope: Envelope =
            serde_json::from_str(line).map_err(|e| DecodeError::Envelope {
                line: line_no,
                reason: e.to_string(),
                excerpt: excerpt(line, EXCERPT_CHARS),
            })?;

        let received_at = envelope
            .time
            .resolve()
            .map_err(|reason| DecodeError::Envelope {
                line: line_no,
                reason,
                excerpt: excerpt(line, EXCERPT_CHARS),
            })?;

        let payload = envelope
            .value
            .ok_or_else(|| DecodeError::Container {
                line: line_no,
                reason: "envelope has no value".to_string(),
            })?
            .into_bytes()
            .map_err(|e| DecodeError::Container {
                line: line_no,
                reason: format!("value is not valid base64: {e}"),
            })?;

        let reader = Reader::new(&payload[..]).map_err(|e| DecodeError::Container {
            line: line_no,
            reason: e.to_string(),
        })?;

        let mut records = Vec::new();
        for (index, value) in reader.enumerate() {
            let value = value.map_err(|e| DecodeError::Container {
                line: line_no,
                reason: format!("record {index}: {e}"),
            })?;
            let record = match FieldValue::from(value) {
                FieldValue::Nested(record) => record,
                other => {
                    return Err(DecodeError::NotARecord {
                        line: line_no,
                        record: index,
                        found: other.kind().to_string(),
                    })
                }
            };
            let sent_at = self
                .sent_at(&record)
                .map_err(|source| DecodeError::Timestamp {
                    line: line_no,
                    record: index,
                    source,
                    rendered: excerpt(&record.to_string(), RENDERED_RECORD_CHARS),
                })?;
            records.push(NormalizedRecord::new(sent_at, received_at, envelope.partition));
        }

        trace!(
            line = line_no,
            partition = envelope.partition,
            records = records.len(),
            "decoded envelope"
        );
        Ok(records)
    }

    fn sent_at(&self, record: &Record) -> Result<DateTime<Utc>, FieldError> {
        let millis = record.get_int(&self.timestamp_field)?;
        DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| FieldError::OutOfRange {
            field: self.timestamp_field.clone(),
            value: millis,
        })
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::types::Record as AvroRecord;
    use apache_avro::{Schema, Writer};
    use kp_common::{Latency, PartitionId};

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "Event",
        "fields": [
            {"name": "id", "type": "string"},
            {"name": "sent_at", "type": "long"}
        ]
    }"#;

    fn container(events: &[(&str, i64)]) -> Vec<u8> {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for (id, sent_at) in events {
            let mut record = AvroRecord::new(writer.schema()).unwrap();
            record.put("id", id.to_string());
            record.put("sent_at", *sent_at);
            writer.append(record).unwrap();
        }
        writer.into_inner().unwrap()
    }

    /// Object container header with no data blocks.
    fn header_only() -> Vec<u8> {
        fn write_long(out: &mut Vec<u8>, value: i64) {
            let mut n = ((value << 1) ^ (value >> 63)) as u64;
            while n >= 0x80 {
                out.push((n as u8 & 0x7f) | 0x80);
                n >>= 7;
            }
            out.push(n as u8);
        }
        fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
            write_long(out, bytes.len() as i64);
            out.extend_from_slice(bytes);
        }

        let mut out = b"Obj\x01".to_vec();
        write_long(&mut out, 1);
        write_bytes(&mut out, b"avro.schema");
        write_bytes(&mut out, SCHEMA.as_bytes());
        write_long(&mut out, 0);
        out.extend_from_slice(&[0x5a; 16]);
        out
    }

    fn envelope(partition: i32, payload: &[u8], time: &str) -> String {
        format!(
            r#"{{"Topic":"perf","Partition":{partition},"Offset":12,"Value":"{}","Time":"{time}"}}"#,
            STANDARD.encode(payload)
        )
    }

    #[test]
    fn test_decodes_every_record_in_container() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let line = envelope(
            3,
            &container(&[("a", 1_000), ("b", 1_500)]),
            "1970-01-01T00:00:02Z",
        );
        let records = decoder.decode_line(1, &line).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.partition == PartitionId(3)));
        assert_eq!(records[0].latency(), Latency::from_millis(1_000));
        assert_eq!(records[1].latency(), Latency::from_millis(500));
    }

    #[test]
    fn test_lowercase_fields_and_epoch_millis_time() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let line = format!(
            r#"{{"partition":1,"value":"{}","time":1300}}"#,
            STANDARD.encode(container(&[("a", 1_000)]))
        );
        let records = decoder.decode_line(1, &line).unwrap();
        assert_eq!(records[0].latency(), Latency::from_millis(300));
    }

    #[test]
    fn test_value_as_byte_array() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let bytes = container(&[("a", 1_000)]);
        let line = format!(
            r#"{{"partition":0,"value":{},"time":1000}}"#,
            serde_json::to_string(&bytes).unwrap()
        );
        let records = decoder.decode_line(1, &line).unwrap();
        assert_eq!(records[0].latency(), Latency::ZERO);
    }

    #[test]
    fn test_zero_record_container() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let line = envelope(0, &header_only(), "1970-01-01T00:00:01Z");
        assert!(decoder.decode_line(1, &line).unwrap().is_empty());
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        let decoder = EnvelopeDecoder::new("sent_at");
        assert!(decoder.decode_line(1, "").unwrap().is_empty());
        assert!(decoder.decode_line(2, "   \r").unwrap().is_empty());

        let line = format!("{}\r", envelope(0, &container(&[("a", 1)]), "1970-01-01T00:00:01Z"));
        assert_eq!(decoder.decode_line(3, &line).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_json_carries_line_and_excerpt() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let err = decoder.decode_line(2, "{not json").unwrap_err();
        match err {
            DecodeError::Envelope { line, excerpt, .. } => {
                assert_eq!(line, 2);
                assert_eq!(excerpt, "{not json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_value_is_container_error() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let err = decoder
            .decode_line(5, r#"{"Partition":0,"Value":null,"Time":"1970-01-01T00:00:01Z"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Container { line: 5, .. }));
    }

    #[test]
    fn test_garbage_payload_is_container_error() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let line = envelope(0, b"definitely not avro", "1970-01-01T00:00:01Z");
        let err = decoder.decode_line(1, &line).unwrap_err();
        assert!(matches!(err, DecodeError::Container { .. }));
    }

    #[test]
    fn test_missing_timestamp_field_names_field_and_record() {
        let decoder = EnvelopeDecoder::new("produced_at");
        let line = envelope(0, &container(&[("a", 1), ("b", 2)]), "1970-01-01T00:00:01Z");
        let err = decoder.decode_line(4, &line).unwrap_err();
        match &err {
            DecodeError::Timestamp {
                line,
                record,
                source,
                rendered,
            } => {
                assert_eq!(*line, 4);
                assert_eq!(*record, 0);
                assert_eq!(source.field(), "produced_at");
                assert!(rendered.contains("id: \"a\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("`produced_at`"));
    }

    #[test]
    fn test_non_integer_timestamp_field() {
        let decoder = EnvelopeDecoder::new("id");
        let line = envelope(0, &container(&[("a", 1)]), "1970-01-01T00:00:01Z");
        let err = decoder.decode_line(1, &line).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Timestamp {
                source: FieldError::NotAnInteger { found: "string", .. },
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let line = envelope(0, &container(&[("a", i64::MAX)]), "1970-01-01T00:00:01Z");
        let err = decoder.decode_line(1, &line).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Timestamp {
                source: FieldError::OutOfRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_bad_receive_time() {
        let decoder = EnvelopeDecoder::new("sent_at");
        let line = envelope(0, &container(&[("a", 1)]), "yesterday");
        let err = decoder.decode_line(1, &line).unwrap_err();
        assert!(matches!(err, DecodeError::Envelope { .. }));
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let text = "é".repeat(200);
        let cut = excerpt(&text, 10);
        assert_eq!(cut, format!("{}...", "é".repeat(10)));
        assert_eq!(excerpt("short", 10), "short");
    }
}
