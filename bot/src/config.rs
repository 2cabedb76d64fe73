use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::instruction::RotationCompletion;

const CONFIG_FILE: &str = "bot.toml";

/// Bot runtime parameters
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BotParameters {
    /// Control tick period
    pub control_period_ms: u64,
    /// Telemetry receive and command send period
    pub transport_period_ms: u64,
    /// Realtime priority of the control activity
    pub control_priority: u8,
    /// Realtime priority of the transport activities
    pub transport_priority: u8,
    /// How rotations detect they reached their target
    pub rotation: RotationCompletion,
    /// Motion program to execute
    pub program: PathBuf,
    pub log_level: String,
}

impl Default for BotParameters {
    fn default() -> Self {
        Self {
            control_period_ms: 2,
            transport_period_ms: 2,
            control_priority: 40,
            transport_priority: 3,
            rotation: RotationCompletion::Exact,
            program: PathBuf::from("program.toml"),
            log_level: String::from("info"),
        }
    }
}

impl BotParameters {
    /// Loads `bot.toml` if present, overridden by `BOT_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::build(
            Config::builder()
                .add_source(File::new(CONFIG_FILE, FileFormat::Toml).required(false))
                .add_source(Environment::with_prefix("BOT").try_parsing(true)),
        )
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(content, FileFormat::Toml)))
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("Cannot read configuration")?
            .try_deserialize()
            .context("Cannot parse configuration")
    }

    /// Writes the parameters back to `bot.toml`.
    pub fn update(&self) -> Result<()> {
        self.write_to(CONFIG_FILE)
    }

    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = toml::to_string_pretty(self)?;
        std::fs::write(path, config).context("Cannot write configuration file")
    }

    pub fn control_period(&self) -> Duration {
        Duration::from_millis(self.control_period_ms)
    }

    pub fn transport_period(&self) -> Duration {
        Duration::from_millis(self.transport_period_ms)
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level).map_err(|_| anyhow!("Invalid log level {}", self.log_level))
    }
}
