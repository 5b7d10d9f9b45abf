//! Layered settings: defaults, then TOML, then `INSIGHTS_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use insights::InsightConfig;
use serde::{Deserialize, Serialize};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "insights.toml";

/// Everything the binary needs: server settings plus the pipeline config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Root for `jobs/` and `uploads/`.
    pub data_dir: PathBuf,
    #[serde(flatten)]
    pub insights: InsightConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            insights: InsightConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the given file (or `./insights.toml`) and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let figment = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                Self::figment(Toml::file(path))
            }
            None => Self::figment(Toml::file(DEFAULT_CONFIG_FILE)),
        };

        let settings: Settings = figment.extract().context("invalid configuration")?;
        settings.insights.validate()?;
        Ok(settings)
    }

    fn figment(toml: figment::providers::Data<Toml>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(toml)
            .merge(Env::prefixed("INSIGHTS_").split("__").ignore(&["log"]))
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}
