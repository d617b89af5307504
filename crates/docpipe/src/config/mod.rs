pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, validate_config, ConfigFormat};
pub use schema::{
    AssemblyConfig, Config, ExtraSection, GeneratorConfig, OutputsConfig, ReportsConfig,
    RetryConfig, TaskTrackerConfig,
};
