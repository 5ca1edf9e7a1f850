//! Fixed-layout text summary.

use crate::stats::AggregateStatistics;
use kp_common::Latency;
use std::io::{self, Write};

const NOT_AVAILABLE: &str = "n/a";

/// Write the summary block. Partitions are listed in ascending order.
pub fn render_text_report<W: Write>(stats: &AggregateStatistics, out: &mut W) -> io::Result<()> {
    write!(
        out,
        "\n=======\nReport\n=======\n\nTotal No. of events {}\n\n\
         Latency\n=======\n\
         Mean                {}\n\
         95th Percentile     {}\n\
         99th Percentile     {}\n\n\
         Partition\n=========\n",
        stats.total_events,
        display(stats.mean),
        display(stats.p95),
        display(stats.p99),
    )?;
    for (partition, count) in &stats.partition_counts {
        write!(out, "\npartition {partition}        {count} messages\n")?;
    }
    Ok(())
}

fn display(latency: Option<Latency>) -> String {
    latency.map_or_else(|| NOT_AVAILABLE.to_string(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kp_common::PartitionId;

    fn render(stats: &AggregateStatistics) -> String {
        let mut out = Vec::new();
        render_text_report(stats, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_layout() {
        let stats = AggregateStatistics {
            total_events: 3,
            mean: Some(Latency::from_millis(150)),
            p95: Some(Latency::from_millis(300)),
            p99: Some(Latency::from_millis(300)),
            min: Some(Latency::from_millis(50)),
            max: Some(Latency::from_millis(300)),
            partition_counts: [(PartitionId(1), 1), (PartitionId(0), 2)].into_iter().collect(),
        };
        let expected = "\n=======\nReport\n=======\n\nTotal No. of events 3\n\n\
                        Latency\n=======\n\
                        Mean                150ms\n\
                        95th Percentile     300ms\n\
                        99th Percentile     300ms\n\n\
                        Partition\n=========\n\
                        \npartition 0        2 messages\n\
                        \npartition 1        1 messages\n";
        assert_eq!(render(&stats), expected);
    }

    #[test]
    fn test_empty_run_prints_not_available() {
        let text = render(&AggregateStatistics::default());
        assert!(text.contains("Total No. of events 0\n"));
        assert!(text.contains("Mean                n/a\n"));
        assert!(text.contains("99th Percentile     n/a\n"));
        assert!(text.ends_with("Partition\n=========\n"));
    }
}
