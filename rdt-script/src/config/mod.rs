pub mod engine_config;
pub mod logger_config;

pub use engine_config::{EngineConfig, EngineConfigBuilder};
pub use logger_config::LoggerConfig;
