use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::logger_config::LoggerConfig;

/// Script engine configuration.
/// Please use [`EngineConfigBuilder`] if you want to build it from code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the thread pool.
    pub thread_count: usize,
    /// Dispatch passes per second of accumulated time.
    pub ticks_per_second: f64,
    /// Instructions one thread may run in a single pass. `None` is unbounded.
    pub instruction_budget: Option<usize>,
    pub logger: LoggerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_count: 20,
            ticks_per_second: 30.0,
            instruction_budget: None,
            logger: LoggerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> f64 {
        1.0 / self.ticks_per_second
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let config = serde_json::from_slice(bytes.as_slice())
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(config)
    }
}

/// `EngineConfigBuilder` is a convenience builder to create an `EngineConfig` from code.
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.config.thread_count = thread_count;
        self
    }

    pub fn with_ticks_per_second(mut self, ticks_per_second: f64) -> Self {
        self.config.ticks_per_second = ticks_per_second;
        self
    }

    pub fn with_instruction_budget(mut self, budget: usize) -> Self {
        self.config.instruction_budget = Some(budget);
        self
    }

    pub fn with_logger_config(mut self, logger: LoggerConfig) -> Self {
        self.config.logger = logger;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> EngineConfig {
        self.config
    }
}
