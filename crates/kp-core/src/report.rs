//! Run orchestration: pipeline → statistics or table → sink.
//!
//! A [`Reporter`] is shared by reference: one thread drives
//! [`Reporter::generate_report`] while others poll [`Reporter::stats`],
//! [`Reporter::progress`] or [`Reporter::live_statistics`].

use crate::decode::EnvelopeDecoder;
use crate::output::{render_text_report, JsonReport, TableEncoder};
use crate::pipeline::LinePipeline;
use crate::progress::{ProgressCounters, ProgressSnapshot};
use crate::stats::{AggregateStatistics, StatisticsEngine};
use kp_common::{Error, OutputMode, Result, RunId, Stage};
use kp_config::ReportConfig;
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

/// Records between two published live snapshots.
pub const LIVE_SNAPSHOT_INTERVAL: u64 = 4096;

/// Polled progress view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterStats {
    pub records_processed: u64,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub output_mode: OutputMode,
    pub records_processed: u64,
    pub elapsed: Duration,
    /// Set for the aggregate modes only.
    pub statistics: Option<AggregateStatistics>,
}

pub struct Reporter {
    config: ReportConfig,
    decoder: EnvelopeDecoder,
    progress: Arc<ProgressCounters>,
    live: Mutex<Option<AggregateStatistics>>,
}

impl Reporter {
    /// Fails fast with a config error before any stage starts.
    pub fn new(config: ReportConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            decoder: EnvelopeDecoder::new(config.timestamp_field.clone()),
            config,
            progress: Arc::new(ProgressCounters::new()),
            live: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Run once over `source`, writing the configured output to `sink`.
    ///
    /// On failure only the error is returned; rows already written to `sink`
    /// stay there.
    pub fn generate_report<R, W>(&self, source: R, sink: &mut W) -> Result<RunSummary>
    where
        R: BufRead + Send,
        W: Write,
    {
        let run_id = RunId::new();
        let span = info_span!("run", run_id = %run_id);
        let _guard = span.enter();

        let output_mode = self.config.output_mode;
        info!(
            mode = %output_mode,
            workers = self.config.effective_worker_count(),
            timestamp_field = %self.config.timestamp_field,
            "run started"
        );
        let started = Instant::now();

        let result = self.write_output(&run_id, source, sink);
        let elapsed = started.elapsed();
        let records_processed = self.progress.records_processed();

        match result {
            Ok(statistics) => {
                info!(
                    records = records_processed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "run finished"
                );
                Ok(RunSummary {
                    run_id,
                    output_mode,
                    records_processed,
                    elapsed,
                    statistics,
                })
            }
            Err(err) => {
                warn!(
                    records = records_processed,
                    code = err.code(),
                    error = %err,
                    "run failed"
                );
                Err(err)
            }
        }
    }

    fn write_output<R, W>(
        &self,
        run_id: &RunId,
        source: R,
        sink: &mut W,
    ) -> Result<Option<AggregateStatistics>>
    where
        R: BufRead + Send,
        W: Write,
    {
        let statistics = match self.config.output_mode {
            OutputMode::Tabular => {
                self.encode_table(source, &mut *sink)?;
                None
            }
            OutputMode::AggregateText => {
                let stats = self.aggregate(source)?;
                render_text_report(&stats, sink)
                    .map_err(|e| Error::from(e).in_stage(Stage::Encode))?;
                Some(stats)
            }
            OutputMode::AggregateJson => {
                let stats = self.aggregate(source)?;
                JsonReport::new(run_id.clone(), &stats)
                    .write_to(sink)
                    .map_err(|e| e.in_stage(Stage::Encode))?;
                Some(stats)
            }
        };
        sink.flush().map_err(|e| Error::from(e).in_stage(Stage::Encode))?;
        Ok(statistics)
    }

    /// Decode `source` and fold every record into a fresh statistics engine.
    ///
    /// The engine is owned by the consuming thread; a snapshot is published
    /// for [`Reporter::live_statistics`] every [`LIVE_SNAPSHOT_INTERVAL`]
    /// records. Pollers only clone the last published snapshot.
    pub fn aggregate<R: BufRead + Send>(&self, source: R) -> Result<AggregateStatistics> {
        self.progress.reset();
        let mut engine = StatisticsEngine::new(self.config.sketch_compression)?;
        self.publish(Some(engine.snapshot()));

        let outcome = self.pipeline().run(source, Stage::Aggregate, |record| {
            engine.add(&record);
            if engine.count() % LIVE_SNAPSHOT_INTERVAL == 0 {
                self.publish(Some(engine.snapshot()));
            }
            Ok(())
        });

        match outcome {
            Ok(()) => {
                let stats = engine.snapshot();
                self.publish(Some(stats.clone()));
                Ok(stats)
            }
            Err(err) => {
                // A failed run exposes no partial aggregate.
                self.publish(None);
                Err(err)
            }
        }
    }

    /// Decode `source` and stream one table row per record into `sink`.
    /// Returns the number of rows written.
    pub fn encode_table<R, W>(&self, source: R, sink: W) -> Result<u64>
    where
        R: BufRead + Send,
        W: Write,
    {
        self.progress.reset();
        let mut encoder = TableEncoder::new(sink, self.config.table_header)
            .map_err(|e| e.in_stage(Stage::Encode))?;
        self.pipeline()
            .run(source, Stage::Encode, |record| encoder.write_record(&record))?;
        let rows = encoder.rows();
        encoder.finish().map_err(|e| e.in_stage(Stage::Encode))?;
        Ok(rows)
    }

    /// Records consumed so far in the current (or last) run.
    pub fn stats(&self) -> ReporterStats {
        ReporterStats {
            records_processed: self.progress.records_processed(),
        }
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Latest published snapshot of an aggregate run in progress, or the
    /// final one of the last successful run. `None` before any aggregate run
    /// or after a failed one.
    pub fn live_statistics(&self) -> Option<AggregateStatistics> {
        self.lock_live().clone()
    }

    fn pipeline(&self) -> LinePipeline {
        LinePipeline::new(
            self.decoder.clone(),
            self.config.effective_worker_count(),
            Arc::clone(&self.progress),
        )
    }

    fn publish(&self, stats: Option<AggregateStatistics>) {
        *self.lock_live() = stats;
    }

    fn lock_live(&self) -> MutexGuard<'_, Option<AggregateStatistics>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
