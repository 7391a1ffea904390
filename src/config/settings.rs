/*
* Smart Water Plus configuration
* ------------------------------
*
* Layers, lowest priority first:
* 1. Hardcoded defaults (below)
* 2. {CONFIG_PATH}/default.toml
* 3. {CONFIG_PATH}/local.toml
* 4. APP_* environment variables, `__` between section and key
*    (APP_THRESHOLDS__CLUSTER_FLOW_RATIO=1.5)
*
* `smart-water-plus init` writes the defaults to config/default.toml.
*/

use serde::{Deserialize, Serialize};
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::VillageTopology;
use crate::errors::PolicyError;
use crate::monitoring::ThresholdPolicy;
use crate::prediction::FeatureSchema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub thresholds: ThresholdSettings,
    pub village: VillageTopology,
    pub data: DataSettings,
    pub models: ModelSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSettings {
    pub cluster_flow_ratio: f64,
    pub cluster_min_flow: f64,
    pub low_pressure_m: f64,
    /// TOML has no null; switching this off disables the low-pressure rule.
    pub low_pressure_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    pub network_results: PathBuf,
    pub cluster_flows: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub dir: PathBuf,
    pub feature_schema: FeatureSchema,
}

impl ServerSettings {
    pub fn socket_addr(&self, port_override: Option<u16>) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, port_override.unwrap_or(self.port)).parse()
    }
}

impl ThresholdSettings {
    pub fn policy(&self) -> Result<ThresholdPolicy, PolicyError> {
        ThresholdPolicy::new(
            self.cluster_flow_ratio,
            self.cluster_min_flow,
            self.low_pressure_enabled.then_some(self.low_pressure_m),
        )
    }
}

impl Settings {
    /// Loads from the `CONFIG_PATH` directory (default `config`).
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config".to_string());

        info!("Loading configuration from path: {}", config_path);

        let config = defaults()?
            .add_source(File::with_name(&format!("{}/default", config_path)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_path)).required(false))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }

    /// Loads from one explicit file on top of the defaults.
    pub fn new_from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from file: {}", path.display());

        let config = defaults()?
            .add_source(File::from(path))
            .add_source(environment())
            .build()?;

        config.try_deserialize()
    }
}

/// `APP_` prefix, `__` between section and key.
fn environment() -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let d = generate_default_config();
    Config::builder()
        .set_default("server.host", d.server.host)?
        .set_default("server.port", i64::from(d.server.port))?
        .set_default("server.body_limit_bytes", d.server.body_limit_bytes as i64)?
        .set_default("thresholds.cluster_flow_ratio", d.thresholds.cluster_flow_ratio)?
        .set_default("thresholds.cluster_min_flow", d.thresholds.cluster_min_flow)?
        .set_default("thresholds.low_pressure_m", d.thresholds.low_pressure_m)?
        .set_default("thresholds.low_pressure_enabled", d.thresholds.low_pressure_enabled)?
        .set_default("village.num_clusters", i64::from(d.village.num_clusters))?
        .set_default("village.houses_per_cluster", i64::from(d.village.houses_per_cluster))?
        .set_default("data.network_results", path_str(&d.data.network_results))?
        .set_default("data.cluster_flows", path_str(&d.data.cluster_flows))?
        .set_default("data.output_dir", path_str(&d.data.output_dir))?
        .set_default("data.log_dir", path_str(&d.data.log_dir))?
        .set_default("models.dir", path_str(&d.models.dir))?
        .set_default("models.feature_schema", "temperature")
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn generate_default_config() -> Settings {
    let policy = ThresholdPolicy::default();
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 5000,
            body_limit_bytes: 64 * 1024,
        },
        thresholds: ThresholdSettings {
            cluster_flow_ratio: policy.cluster_flow_ratio(),
            cluster_min_flow: policy.cluster_min_flow(),
            low_pressure_m: policy.low_pressure_m().unwrap_or(10.0),
            low_pressure_enabled: policy.low_pressure_m().is_some(),
        },
        village: VillageTopology::default(),
        data: DataSettings {
            network_results: PathBuf::from("simulation/data/network_results.csv"),
            cluster_flows: PathBuf::from("simulation/data/cluster_flows.csv"),
            output_dir: PathBuf::from("simulation/data"),
            log_dir: PathBuf::from("simulation/logs"),
        },
        models: ModelSettings {
            dir: PathBuf::from("backend/models"),
            feature_schema: FeatureSchema::Temperature,
        },
    }
}
