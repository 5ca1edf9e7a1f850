//! kafka-perf binary: stdin → report or table on stdout, progress on stderr.

use clap::{CommandFactory, Parser};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use kp_common::Result;
use kp_config::ReportConfig;
use kp_core::cli::{Cli, Command, RunArgs};
use kp_core::logging::{init_logging, level_for};
use kp_core::{ExitCode, Reporter};
use std::io::{self, BufReader, BufWriter, Write};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Read buffer for stdin; envelopes are typically a few KiB each.
const STDIN_BUFFER_BYTES: usize = 256 * 1024;

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from_error(&err)
        }
    };
    std::process::exit(code.as_i32());
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_format, level_for(cli.verbose, cli.quiet))?;
    let structured_progress = cli.verbose > 0;

    match cli.command {
        Command::Report(args) => {
            let config = args.resolve()?;
            run_report(config, &args.run, structured_progress)
        }
        Command::Encode(args) => {
            let config = args.resolve()?;
            run_report(config, &args.run, structured_progress)
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "kafka-perf", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_report(config: ReportConfig, run: &RunArgs, structured_progress: bool) -> Result<()> {
    let reporter = Reporter::new(config)?;
    let source = BufReader::with_capacity(STDIN_BUFFER_BYTES, io::stdin());
    let stdout = io::stdout();
    let mut sink = BufWriter::new(stdout.lock());

    let (done_tx, done_rx) = bounded::<()>(0);
    let summary = thread::scope(|scope| {
        if let Some(interval) = run.progress_interval() {
            let reporter = &reporter;
            scope.spawn(move || progress_loop(reporter, interval, done_rx, structured_progress));
        }
        let result = reporter.generate_report(source, &mut sink);
        // Disconnecting the channel stops the progress loop.
        drop(done_tx);
        result
    })?;

    sink.flush()?;
    info!(
        run_id = %summary.run_id,
        records = summary.records_processed,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "done"
    );
    Ok(())
}

fn progress_loop(reporter: &Reporter, interval: Duration, done: Receiver<()>, structured: bool) {
    while let Err(RecvTimeoutError::Timeout) = done.recv_timeout(interval) {
        print_progress(reporter, structured);
    }
    print_progress(reporter, structured);
    if !structured {
        eprintln!();
    }
}

fn print_progress(reporter: &Reporter, structured: bool) {
    if structured {
        let snapshot = reporter.progress();
        info!(
            lines_read = snapshot.lines_read,
            in_flight = snapshot.in_flight,
            records_processed = snapshot.records_processed,
            "progress"
        );
    } else {
        eprint!("\r{} records processed", reporter.stats().records_processed);
    }
}
