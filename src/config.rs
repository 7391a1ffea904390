pub mod settings;

pub use settings::{
    generate_default_config, DataSettings, ModelSettings, ServerSettings, Settings,
    ThresholdSettings,
};
