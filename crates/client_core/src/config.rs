use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::message_log::DEFAULT_LOG_CAPACITY;

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:3000/ws";
pub const DEFAULT_CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub log_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    log_capacity: Option<usize>,
}

/// Defaults, then the TOML file (if present), then `TUG_*` environment
/// variables. An explicitly named file must exist; the default one may not.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    overlay_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

fn overlay_settings(
    file_raw: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file_raw {
        let file_cfg: FileSettings = toml::from_str(raw).context("invalid client config file")?;
        if let Some(v) = file_cfg.server_url {
            settings.server_url = v;
        }
        if let Some(v) = file_cfg.log_capacity {
            settings.log_capacity = v;
        }
    }

    if let Some(v) = env("TUG_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("TUG_LOG_CAPACITY") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.log_capacity = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring non-numeric TUG_LOG_CAPACITY"),
        }
    }

    Ok(settings)
}
