//! Shared fixtures: Avro containers and envelope lines.

#![allow(dead_code)]

use apache_avro::types::Record;
use apache_avro::{Schema, Writer};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};

pub const SCHEMA: &str = r#"{
    "type": "record",
    "name": "PerfEvent",
    "fields": [
        {"name": "id", "type": "string"},
        {"name": "sent_at", "type": "long"}
    ]
}"#;

pub const TIMESTAMP_FIELD: &str = "sent_at";

/// Container holding one record per `sent_at` value (epoch millis).
pub fn container(sent_at: &[i64]) -> Vec<u8> {
    let schema = Schema::parse_str(SCHEMA).unwrap();
    let mut writer = Writer::new(&schema, Vec::new());
    for (i, ts) in sent_at.iter().enumerate() {
        let mut record = Record::new(writer.schema()).unwrap();
        record.put("id", format!("event-{i}"));
        record.put("sent_at", *ts);
        writer.append(record).unwrap();
    }
    writer.into_inner().unwrap()
}

/// Container header with no data blocks.
pub fn empty_container() -> Vec<u8> {
    let mut out = b"Obj\x01".to_vec();
    write_long(&mut out, 1);
    write_bytes(&mut out, b"avro.schema");
    write_bytes(&mut out, SCHEMA.as_bytes());
    write_long(&mut out, 0);
    out.extend_from_slice(&[0xa5; 16]);
    out
}

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

/// Envelope line in the capitalized message JSON layout, without newline.
pub fn envelope(partition: i32, payload: &[u8], received_at_ms: i64) -> String {
    let time = DateTime::<Utc>::from_timestamp_millis(received_at_ms)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        r#"{{"Topic":"perf-test","Partition":{partition},"Offset":0,"Key":null,"Value":"{}","Headers":[],"Time":"{time}"}}"#,
        STANDARD.encode(payload)
    )
}

/// One-record envelope line.
pub fn event_line(partition: i32, sent_at_ms: i64, received_at_ms: i64) -> String {
    envelope(partition, &container(&[sent_at_ms]), received_at_ms)
}

/// Joins lines with `\n`, including a trailing one.
pub fn input(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

/// The reference run: partitions [0, 1, 0], sent [1000, 2000, 1500] ms,
/// received [1100, 2300, 1550] ms.
pub fn three_event_input() -> String {
    input(&[
        event_line(0, 1000, 1100),
        event_line(1, 2000, 2300),
        event_line(0, 1500, 1550),
    ])
}
