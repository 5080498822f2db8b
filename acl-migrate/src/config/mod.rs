//! Configuration module for acl-migrate.

use migrate_core::config as core_config;
use migrate_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub directory: DirectoryConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    /// Common suffix of target-domain group names. `None` means ask.
    pub group_suffix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub line_ending: LineEnding,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    CrLf,
    Lf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
        }
    }
}

impl std::str::FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crlf" => Ok(LineEnding::CrLf),
            "lf" => Ok(LineEnding::Lf),
            _ => Err(format!("Invalid line ending: {}", s)),
        }
    }
}

impl MigrateConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "acl-migrate".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            directory: DirectoryConfig {
                snapshot_path: env::var("ACL_DIRECTORY_SNAPSHOT")
                    .map(PathBuf::from)
                    .map_err(|_| {
                        AppError::ConfigError(anyhow::anyhow!(
                            "ACL_DIRECTORY_SNAPSHOT is required"
                        ))
                    })?,
            },
            matching: MatchingConfig {
                group_suffix: env::var("ACL_GROUP_SUFFIX").ok(),
            },
            output: OutputConfig {
                line_ending: env::var("ACL_LINE_ENDING")
                    .ok()
                    .map(|s| s.parse())
                    .transpose()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?
                    .unwrap_or_default(),
                report_path: env::var("ACL_REPORT_PATH").ok().map(PathBuf::from),
            },
        })
    }
}
