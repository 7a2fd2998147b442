use std::path::PathBuf;

use clap::Parser;

use crate::graph::AxisMode;
use crate::metrics::engine::FailurePolicy;

/// Compare wikis through metrics computed over their revision histories
#[derive(Parser, Debug, Clone)]
#[command(name = "wikichron")]
#[command(about = "Interactive comparison of wiki revision histories")]
pub struct Args {
    /// Directory holding one `<entity>.csv` or `<entity>.parquet` per wiki
    #[arg(long, env = "WIKICHRON_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Wikis to load, by file stem, in display order
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_values = ["eslagunanegra_pages_full", "cocktails"]
    )]
    pub entities: Vec<String>,

    /// Registry indices of the metrics to compute, in panel order
    #[arg(short, long, value_delimiter = ',', default_values_t = [0, 1])]
    pub metrics: Vec<usize>,

    /// Plot against calendar months instead of months since creation
    #[arg(long)]
    pub absolute_time: bool,

    /// Abort the load when a metric fails instead of marking it unavailable
    #[arg(long)]
    pub strict: bool,

    /// Print the available metrics and exit
    #[arg(long)]
    pub list_metrics: bool,
}

impl Args {
    pub fn axis_mode(&self) -> AxisMode {
        if self.absolute_time {
            AxisMode::Absolute
        } else {
            AxisMode::Relative
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.strict {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Isolate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["wikichron"]).unwrap();
        assert_eq!(args.entities, vec!["eslagunanegra_pages_full", "cocktails"]);
        assert_eq!(args.metrics, vec![0, 1]);
        assert_eq!(args.axis_mode(), AxisMode::Relative);
        assert_eq!(args.failure_policy(), FailurePolicy::Isolate);
    }

    #[test]
    fn test_lists_and_flags() {
        let args = Args::try_parse_from([
            "wikichron",
            "--data-dir",
            "/tmp/wikis",
            "--entities",
            "a,b,c",
            "--metrics",
            "3,0",
            "--absolute-time",
            "--strict",
        ])
        .unwrap();
        assert_eq!(args.data_dir, PathBuf::from("/tmp/wikis"));
        assert_eq!(args.entities, vec!["a", "b", "c"]);
        assert_eq!(args.metrics, vec![3, 0]);
        assert_eq!(args.axis_mode(), AxisMode::Absolute);
        assert_eq!(args.failure_policy(), FailurePolicy::Abort);
    }

    #[test]
    fn test_bad_metric_index_rejected() {
        assert!(Args::try_parse_from(["wikichron", "--metrics", "x"]).is_err());
    }
}
