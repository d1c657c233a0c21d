use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::agent::AgentConfig;
use crate::fpl::{DEFAULT_FPL_BASE_URL, ManagerId};
use crate::llm::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

const CONFIG_DIR_NAME: &str = "fplchat";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub config_is_explicit: bool,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub fpl_base_url: String,
    pub manager_id: Option<ManagerId>,
    pub max_steps: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    fpl_base_url: Option<String>,
    manager_id: Option<i64>,
    max_steps: Option<i64>,
}

impl AppConfig {
    /// Loads from `path` when given, otherwise from the XDG config location.
    /// Environment variables override values from the file.
    pub fn load_with_path(path: Option<&Path>) -> Result<Self> {
        let (config_path, config_is_explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (discover_config_path()?, false),
        };
        let file_config = load_file_config(&config_path, config_is_explicit)?;

        dotenvy::dotenv().ok();

        let file_api_key = file_value(file_config.as_ref().and_then(|c| c.gemini_api_key.as_ref()));
        let file_model = file_value(file_config.as_ref().and_then(|c| c.gemini_model.as_ref()));
        let file_base_url =
            file_value(file_config.as_ref().and_then(|c| c.gemini_base_url.as_ref()));
        let file_fpl_base_url =
            file_value(file_config.as_ref().and_then(|c| c.fpl_base_url.as_ref()));

        let file_manager_id = match file_config.as_ref().and_then(|cfg| cfg.manager_id) {
            Some(raw) => Some(
                ManagerId::from_str(&raw.to_string())
                    .map_err(|reason| config_error(&config_path, "manager_id", &reason))?,
            ),
            None => None,
        };
        let manager_id = match env_non_empty("FPL_MANAGER_ID") {
            Some(raw) => Some(
                ManagerId::from_str(&raw)
                    .map_err(|reason| config_error(&config_path, "FPL_MANAGER_ID", &reason))?,
            ),
            None => file_manager_id,
        };

        let max_steps = match file_config.as_ref().and_then(|cfg| cfg.max_steps) {
            Some(raw) => usize::try_from(raw)
                .ok()
                .filter(|steps| *steps > 0)
                .ok_or_else(|| {
                    config_error(&config_path, "max_steps", "expected a positive integer")
                })?,
            None => AgentConfig::default().max_steps,
        };

        Ok(Self {
            gemini_api_key: env_non_empty("GEMINI_API_KEY")
                .or_else(|| env_non_empty("GOOGLE_API_KEY"))
                .or(file_api_key),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .or(file_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env_non_empty("GEMINI_BASE_URL")
                .or(file_base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            fpl_base_url: env_non_empty("FPL_BASE_URL")
                .or(file_fpl_base_url)
                .unwrap_or_else(|| DEFAULT_FPL_BASE_URL.to_string()),
            manager_id,
            max_steps,
            config_path,
            config_is_explicit,
        })
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_steps: self.max_steps,
        }
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path, required: bool) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        if required {
            bail!(
                "Failed to load config {}: file does not exist",
                config_path.display()
            );
        }
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn file_value(value: Option<&String>) -> Option<String> {
    value.and_then(|value| non_empty(value).map(ToOwned::to_owned))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| non_empty(&value).map(ToOwned::to_owned))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
