//! Parallel line decoding.
//!
//! ```text
//! source ─▶ scanner ─▶ [line queue] ─▶ N decode workers ─▶ [record queue] ─▶ consumer
//! ```
//!
//! Both queues are bounded, so a slow consumer throttles the scanner instead of
//! growing memory. A queue closes when every endpoint on one side is dropped:
//! the scanner finishing closes the line queue, the last worker exiting closes
//! the record queue, and the consumer bailing out makes worker sends fail.
//! The first error from any stage is kept and cancels the others.

pub mod cancel;
pub mod scanner;

pub use cancel::{CancelToken, FirstError};
pub use scanner::LineScanner;

use crate::decode::EnvelopeDecoder;
use crate::progress::ProgressCounters;
use crossbeam::channel::{bounded, Receiver, Sender};
use kp_common::{Error, NormalizedRecord, Result, Stage};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Capacity of the scanner → worker queue, in lines.
pub const LINE_QUEUE_CAPACITY: usize = 1024;

/// Capacity of the worker → consumer queue, in records.
pub const OUTPUT_QUEUE_CAPACITY: usize = 1024;

/// Longest accepted input line, excluding the terminator.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

type NumberedLine = (u64, String);

/// Drives one decode run over a line source.
pub struct LinePipeline {
    decoder: EnvelopeDecoder,
    workers: usize,
    max_line_bytes: usize,
    progress: Arc<ProgressCounters>,
    cancel: CancelToken,
}

impl LinePipeline {
    pub fn new(decoder: EnvelopeDecoder, workers: usize, progress: Arc<ProgressCounters>) -> Self {
        Self {
            decoder,
            workers: workers.max(1),
            max_line_bytes: MAX_LINE_BYTES,
            progress,
            cancel: CancelToken::new(),
        }
    }

    /// Use an externally owned token so the caller can abort the run.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Decode `source` and hand every record to `consume` on the calling thread.
    ///
    /// `terminal` names the consumer's stage in error context. Records arrive
    /// in no particular order. Returns the first error raised by any stage.
    pub fn run<R, F>(&self, source: R, terminal: Stage, mut consume: F) -> Result<()>
    where
        R: BufRead + Send,
        F: FnMut(NormalizedRecord) -> Result<()>,
    {
        let first_error = FirstError::new(self.cancel.clone());
        let (line_tx, line_rx) = bounded::<NumberedLine>(LINE_QUEUE_CAPACITY);
        let (record_tx, record_rx) = bounded::<NormalizedRecord>(OUTPUT_QUEUE_CAPACITY);

        debug!(workers = self.workers, "pipeline starting");
        thread::scope(|scope| {
            let cancel = &self.cancel;
            let progress = self.progress.as_ref();
            let decoder = &self.decoder;
            let errors = &first_error;
            let max_line_bytes = self.max_line_bytes;

            let scanner = scope.spawn(move || {
                scan(source, max_line_bytes, line_tx, cancel, progress, errors)
            });

            let mut workers = Vec::with_capacity(self.workers);
            for id in 0..self.workers {
                let lines = line_rx.clone();
                let records = record_tx.clone();
                workers.push(scope.spawn(move || {
                    decode_worker(id, decoder, lines, records, cancel, progress, errors)
                }));
            }
            // Only the stage threads may hold these, or the queues never close.
            drop(line_rx);
            drop(record_tx);

            for record in record_rx.iter() {
                if cancel.is_cancelled() {
                    break;
                }
                if let Err(err) = consume(record) {
                    errors.record(err.in_stage(terminal));
                    break;
                }
                progress.record_processed();
            }
            drop(record_rx);

            if scanner.join().is_err() {
                errors.record(Error::StagePanicked { stage: Stage::Scan });
            }
            for worker in workers {
                if worker.join().is_err() {
                    errors.record(Error::StagePanicked {
                        stage: Stage::Decode,
                    });
                }
            }
        });

        match first_error.into_inner() {
            Some(err) => {
                debug!(error = %err, "pipeline failed");
                Err(err)
            }
            None if self.cancel.is_cancelled() => Err(Error::Cancelled),
            None => {
                debug!("pipeline finished");
                Ok(())
            }
        }
    }
}

fn scan<R: BufRead>(
    source: R,
    max_line_bytes: usize,
    lines: Sender<NumberedLine>,
    cancel: &CancelToken,
    progress: &ProgressCounters,
    errors: &FirstError,
) {
    debug!("scanner started");
    let mut scanner = LineScanner::new(source, max_line_bytes);
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match scanner.next_line() {
            Ok(Some(line)) => {
                progress.line_read();
                if lines.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                errors.record(err.in_stage(Stage::Scan));
                break;
            }
        }
    }
    debug!(lines = scanner.lines_read(), "scanner stopped");
}

fn decode_worker(
    id: usize,
    decoder: &EnvelopeDecoder,
    lines: Receiver<NumberedLine>,
    records: Sender<NormalizedRecord>,
    cancel: &CancelToken,
    progress: &ProgressCounters,
    errors: &FirstError,
) {
    debug!(worker = id, "decode worker started");
    for (line_no, line) in lines.iter() {
        if cancel.is_cancelled() {
            break;
        }
        let decoded = decoder.decode_line(line_no, &line);
        progress.line_decoded();
        match decoded {
            Ok(batch) => {
                for record in batch {
                    if records.send(record).is_err() {
                        debug!(worker = id, "record queue closed");
                        return;
                    }
                }
            }
            Err(err) => {
                errors.record(Error::from(err).in_stage(Stage::Decode));
                break;
            }
        }
    }
    debug!(worker = id, "decode worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::types::Record as AvroRecord;
    use apache_avro::{Schema, Writer};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use kp_common::DecodeError;
    use std::io::Cursor;

    fn envelope(partition: i32, sent_at: i64, received_at: i64) -> String {
        let schema = Schema::parse_str(
            r#"{"type":"record","name":"E","fields":[{"name":"ts","type":"long"}]}"#,
        )
        .unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        let mut record = AvroRecord::new(writer.schema()).unwrap();
        record.put("ts", sent_at);
        writer.append(record).unwrap();
        let payload = writer.into_inner().unwrap();
        format!(
            r#"{{"partition":{partition},"value":"{}","time":{received_at}}}"#,
            STANDARD.encode(payload)
        )
    }

    fn pipeline(workers: usize) -> (LinePipeline, Arc<ProgressCounters>) {
        let progress = Arc::new(ProgressCounters::new());
        (
            LinePipeline::new(EnvelopeDecoder::new("ts"), workers, Arc::clone(&progress)),
            progress,
        )
    }

    #[test]
    fn test_all_records_reach_consumer() {
        let input: String = (0..500)
            .map(|i| envelope(i % 3, i64::from(i), i64::from(i) + 10) + "\n")
            .collect();
        let (pipeline, progress) = pipeline(4);
        let mut seen = Vec::new();
        pipeline
            .run(Cursor::new(input), Stage::Aggregate, |record| {
                seen.push(record);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen.len(), 500);
        let snapshot = progress.snapshot();
        assert_eq!(snapshot.lines_read, 500);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.records_processed, 500);
    }

    #[test]
    fn test_decode_error_stops_run() {
        let input = format!("{}\n{{broken\n{}\n", envelope(0, 1, 2), envelope(0, 3, 4));
        let (pipeline, _) = pipeline(2);
        let err = pipeline
            .run(Cursor::new(input), Stage::Aggregate, |_| Ok(()))
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Decode));
        assert!(matches!(
            err.root(),
            Error::Decode(DecodeError::Envelope { line: 2, .. })
        ));
        assert!(pipeline.cancel_token().is_cancelled());
    }

    #[test]
    fn test_consumer_error_stops_run_without_deadlock() {
        // Far more records than both queues hold together.
        let input: String = (0..5_000).map(|i| envelope(0, i, i + 1) + "\n").collect();
        let (pipeline, _) = pipeline(3);
        let mut consumed = 0;
        let err = pipeline
            .run(Cursor::new(input), Stage::Encode, |_| {
                consumed += 1;
                if consumed == 10 {
                    Err(Error::Encode("sink closed".to_string()))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Encode));
        assert_eq!(err.code(), 40);
        assert_eq!(consumed, 10);
    }

    #[test]
    fn test_scan_error_is_attributed_to_scan_stage() {
        let input = format!("{}\n{}\n", envelope(0, 1, 2), "x".repeat(8192));
        let (pipeline, _) = pipeline(1);
        let pipeline = pipeline.with_max_line_bytes(4096);
        let err = pipeline
            .run(Cursor::new(input), Stage::Aggregate, |_| Ok(()))
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Scan));
        assert!(matches!(
            err.root(),
            Error::Decode(DecodeError::LineTooLong { line: 2, .. })
        ));
    }

    #[test]
    fn test_precancelled_run_reports_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let (pipeline, _) = pipeline(2);
        let pipeline = pipeline.with_cancel(token);
        let err = pipeline
            .run(Cursor::new(envelope(0, 1, 2)), Stage::Aggregate, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_zero_workers_is_clamped() {
        let (pipeline, _) = pipeline(0);
        assert_eq!(pipeline.workers(), 1);
    }
}
