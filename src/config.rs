//! Configuration file handling.
//!
//! Settings come from `farm_dashboard.toml` and are then overridden by
//! command-line flags. Nothing here reads the process environment.

use crate::cli::Args;
use crate::color::Metric;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "farm_dashboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Connection settings for the plot data-join database.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Settings for the real-time weather provider.
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Joined plot dataset (CSV).
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory receiving exports, overview and map files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Metric used to color the map.
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Drop plots without alerts after detection.
    #[serde(default)]
    pub show_only_alerts: bool,

    /// Rows shown in console table previews.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            metric: default_metric(),
            show_only_alerts: false,
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("farm_master_data.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_metric() -> String {
    Metric::ProfitMargin.name().to_string()
}

fn default_preview_rows() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
        }
    }
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_user() -> String {
    "root".to_string()
}

fn default_db_name() -> String {
    "farm_management_database".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    /// Without a key the `rt_*` columns stay empty.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

fn default_weather_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_weather_timeout() -> u64 {
    8
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path` if given, else `farm_dashboard.toml` when present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Command-line flags win over file values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(input) = &args.input {
            self.dashboard.input = input.clone();
        }
        if let Some(dir) = &args.output_dir {
            self.dashboard.output_dir = dir.clone();
        }
        if let Some(metric) = args.metric {
            self.dashboard.metric = metric.name().to_string();
        }
        if args.only_alerts {
            self.dashboard.show_only_alerts = true;
        }
    }

    pub fn metric(&self) -> Result<Metric> {
        self.dashboard.metric.parse()
    }

    /// Default configuration file content.
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Config::default())?)
    }
}
