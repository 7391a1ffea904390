pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod forecast;
pub mod monitoring;
pub mod prediction;
pub mod schedule;
pub mod simulate;
pub mod utils;

// Re-exports
pub use api::routes::{create_router, AppState};
pub use api::run_server;
pub use crate::core::{Alert, AlertKind, AlertLog, SimulationLoader, SimulationTables, VillageTopology};
pub use errors::{WaterError, WaterResult};
pub use monitoring::{AnomalyScanner, FileSink, MemorySink, ReportSink, ScanJob, ThresholdPolicy};
pub use prediction::{FeatureSchema, LeakPredictors};
