use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::GramtuiError;
use crate::models::auth::Credential;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    #[serde(default)]
    pub token: Option<Credential>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_id: None,
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf, GramtuiError> {
        Ok(dirs::home_dir()
            .ok_or_else(|| GramtuiError::Config("Could not find home directory".to_string()))?
            .join(".config/gramtui/config.json"))
    }

    /// Loads the config file, falling back to defaults when it does not exist yet.
    pub fn load() -> Result<Self, GramtuiError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, GramtuiError> {
        if !config_path.exists() {
            log::info!("No config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file at {:?}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context("Failed to parse config JSON")?;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), GramtuiError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), GramtuiError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(&self)
            .context("Failed to serialize config to JSON")?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(config_path)
            .with_context(|| format!("Failed to open conf file for writing at {:?}", config_path))?;

        file.write_all(json.as_bytes())
            .context("Failed to write config data")?;

        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some() && self.user_id.is_some()
    }

    pub fn set_login(&mut self, user_id: String, token: Credential) {
        self.user_id = Some(user_id);
        self.token = Some(token);
    }

    pub fn clear_login(&mut self) {
        self.user_id = None;
        self.token = None;
    }
}
