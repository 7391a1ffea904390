pub mod anomaly_detection;
pub mod debounce;
pub mod pipeline;
pub mod sink;
pub mod thresholds;

pub use anomaly_detection::AnomalyScanner;
pub use debounce::AlertEvent;
pub use pipeline::{ScanJob, ScanOutcome};
pub use sink::{AlertSummary, FileSink, MemorySink, ReportSink};
pub use thresholds::ThresholdPolicy;
