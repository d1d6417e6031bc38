use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const API_KEY_VAR: &str = "PLANTNET_API_KEY";
pub const PORT_VAR: &str = "PORT";

/// Settings read once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: Option<String>,
    pub port: u16,
}

impl Config {
    /// An empty credential counts as missing.
    pub fn new(api_key: Option<String>, port: u16) -> Self {
        Config {
            api_key: api_key.filter(|key| !key.is_empty()),
            port,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_values(env::var(API_KEY_VAR).ok(), env::var(PORT_VAR).ok())
    }

    pub fn from_values(api_key: Option<String>, port: Option<String>) -> Result<Self> {
        let port = match port {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{PORT_VAR} must be a valid number between 0 and 65535"))?,
            None => DEFAULT_PORT,
        };

        Ok(Config::new(api_key, port))
    }

    /// PlantNet credential, the only place the relay reads it from.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
