use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Worker threads for the parallel stages. `None` means hardware parallelism.
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: None,
            log_format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Resolved worker count, never zero.
    pub fn workers(&self) -> usize {
        self.worker_count
            .filter(|n| *n > 0)
            .unwrap_or_else(crate::workers::hardware_parallelism)
    }
}
