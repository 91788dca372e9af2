// Runtime configuration.
//
// Settings come from `~/.leadbook/config.json` when it exists, with
// `DATABASE_URL` and `SESSION_SECRET` environment variables taking precedence.
// The session secret belongs to the web layer; it rides along here so every
// process reads one configuration surface, but nothing in this crate uses it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::LeadError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Database location, for example `sqlite:///leads.db`. `None` means the
    /// default store under the home directory.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Cookie-signing secret for the web layer. Opaque here, never logged.
    #[serde(default)]
    pub session_secret: Option<String>,
}

impl Config {
    /// Loads the config file if present, applies environment overrides, and
    /// validates the result.
    pub fn load() -> Result<Config, LeadError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    LeadError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    LeadError::Config(format!("failed to parse {}: {e}", path.display()))
                })?
            }
            _ => Config::default(),
        };
        config.apply_overrides(env_value("DATABASE_URL"), env_value("SESSION_SECRET"));
        config.validate()?;
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".leadbook").join("config.json"))
    }

    /// Environment values win over file values. Empty strings count as unset.
    fn apply_overrides(&mut self, database_url: Option<String>, session_secret: Option<String>) {
        if let Some(url) = database_url {
            self.database_url = Some(url);
        }
        if let Some(secret) = session_secret {
            self.session_secret = Some(secret);
        }
    }

    fn validate(&self) -> Result<(), LeadError> {
        if let Some(url) = &self.database_url {
            crate::db::database_path_from_url(url)
                .map_err(|e| LeadError::Config(e.to_string()))?;
        }
        if self.session_secret.is_none() {
            log::warn!("SESSION_SECRET is not set; web sessions will use an insecure default");
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
