use crate::domain::constants::{DEFAULT_ACTIVITIES, DEFAULT_MONTHLY_COUNT, DEFAULT_MONTHLY_WEEKS};
use crate::services::storage::config_dir;
use serde::Deserialize;
use std::path::PathBuf;

fn default_monthly_count() -> u32 {
    DEFAULT_MONTHLY_COUNT
}

fn default_monthly_weeks() -> Vec<u8> {
    DEFAULT_MONTHLY_WEEKS.to_vec()
}

fn default_activities() -> Vec<String> {
    DEFAULT_ACTIVITIES.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub defaults: DefaultSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct GeneralSettings {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct DefaultSettings {
    #[serde(default = "default_monthly_count")]
    pub monthly_count: u32,
    #[serde(default = "default_monthly_weeks")]
    pub monthly_weeks: Vec<u8>,
    #[serde(default = "default_activities")]
    pub activities: Vec<String>,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            monthly_count: default_monthly_count(),
            monthly_weeks: default_monthly_weeks(),
            activities: default_activities(),
        }
    }
}

impl Settings {
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.general.data_dir {
            Some(d) => Ok(d.clone()),
            None => config_dir(),
        }
    }

    pub fn export_dir(&self) -> PathBuf {
        self.general
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let path = config_dir()?.join("config.toml");
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(&path)?;
    log::debug!("loaded settings from {}", path.display());
    parse_settings(&raw)
}
