pub mod alert;
pub mod csv;
pub mod loader;
pub mod timeseries;
pub mod topology;

pub use alert::{Alert, AlertKind, AlertLog};
pub use loader::{SimulationLoader, SimulationTables};
pub use timeseries::{TimeSeriesTable, Timestamp};
pub use topology::VillageTopology;
