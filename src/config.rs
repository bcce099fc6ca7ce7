use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::cleaning::CleaningPolicy;
use crate::services::csv::AnalysisPolicy;

fn default_max_file_size() -> usize {
    // 50 MB in bytes
    50 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub preview_rows: usize,
    pub removed_rows_sample: usize,
    pub conversion_threshold: f64,
    pub missing_warning_percent: f64,
    pub ready_missing_percent: f64,
    pub large_dataset_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_file_size: default_max_file_size(),
            preview_rows: 5,
            removed_rows_sample: 10,
            conversion_threshold: 0.8,
            missing_warning_percent: 5.0,
            ready_missing_percent: 10.0,
            large_dataset_rows: 10_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            max_file_size: parse_var(&lookup, "MAX_FILE_SIZE", defaults.max_file_size)?,
            preview_rows: parse_var(&lookup, "PREVIEW_ROWS", defaults.preview_rows)?,
            removed_rows_sample: parse_var(
                &lookup,
                "REMOVED_ROWS_SAMPLE",
                defaults.removed_rows_sample,
            )?,
            conversion_threshold: parse_var(
                &lookup,
                "CONVERSION_THRESHOLD",
                defaults.conversion_threshold,
            )?,
            missing_warning_percent: parse_var(
                &lookup,
                "MISSING_WARNING_PERCENT",
                defaults.missing_warning_percent,
            )?,
            ready_missing_percent: parse_var(
                &lookup,
                "READY_MISSING_PERCENT",
                defaults.ready_missing_percent,
            )?,
            large_dataset_rows: parse_var(
                &lookup,
                "LARGE_DATASET_ROWS",
                defaults.large_dataset_rows,
            )?,
        };

        if !(config.conversion_threshold > 0.0 && config.conversion_threshold <= 1.0) {
            anyhow::bail!(
                "CONVERSION_THRESHOLD must be in (0, 1], got {}",
                config.conversion_threshold
            );
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    pub fn analysis_policy(&self) -> AnalysisPolicy {
        AnalysisPolicy {
            preview_rows: self.preview_rows,
            conversion_threshold: self.conversion_threshold,
            missing_warning_percent: self.missing_warning_percent,
            ready_missing_percent: self.ready_missing_percent,
            large_dataset_rows: self.large_dataset_rows,
        }
    }

    pub fn cleaning_policy(&self) -> CleaningPolicy {
        CleaningPolicy {
            conversion_threshold: self.conversion_threshold,
            preview_rows: self.preview_rows,
            removed_rows_sample: self.removed_rows_sample,
        }
    }
}

pub fn load_config() -> Result<Config> {
    Config::from_env()
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}={:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
