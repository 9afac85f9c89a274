//! Configuration file management for liftgen.
//!
//! Provides a TOML config file at `~/.config/liftgen/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use liftgen_core::generation::OpenAiConfig;
use liftgen_core::pipeline::PipelineConfig;
use liftgen_db::config::DbConfig;

pub const ENV_API_KEY: &str = "LIFTGEN_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "LIFTGEN_MODEL";
pub const ENV_BASE_URL: &str = "LIFTGEN_BASE_URL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub generation: GenerationSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

/// Model provider settings. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the liftgen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/liftgen` or `~/.config/liftgen`,
/// including on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("liftgen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("liftgen")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Write `config` to `path`, creating parent dirs as needed.
/// The file may hold an API key, so it is made owner-only on Unix.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub model: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct LiftgenConfig {
    pub db_config: DbConfig,
    pub generation: OpenAiConfig,
    pub pipeline: PipelineConfig,
}

impl LiftgenConfig {
    /// Resolve from the real environment and the config file, if one exists.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            Some(load_config_from(&path)?)
        } else {
            None
        };
        Ok(Self::resolve_with(cli, file.as_ref(), |key| {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        }))
    }

    /// Apply the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli.database_url` > `LIFTGEN_DATABASE_URL` > `database.url` > [`DbConfig::DEFAULT_URL`]
    /// - Pool size: `LIFTGEN_DB_MAX_CONNECTIONS` > `database.max_connections` > [`DbConfig::DEFAULT_MAX_CONNECTIONS`]
    /// - API key: `LIFTGEN_API_KEY` > `OPENAI_API_KEY` > `generation.api_key`
    /// - Model: `cli.model` > `LIFTGEN_MODEL` > `generation.model` > provider default
    /// - Base URL: `LIFTGEN_BASE_URL` > `generation.base_url` > provider default
    pub fn resolve_with(
        cli: &CliOverrides,
        file: Option<&ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let section = file.map(|f| f.generation.clone()).unwrap_or_default();

        let db_url = cli
            .database_url
            .clone()
            .or_else(|| env(DbConfig::ENV_VAR))
            .or_else(|| file.map(|f| f.database.url.clone()))
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());
        let max_connections = env(DbConfig::MAX_CONNECTIONS_ENV_VAR)
            .and_then(|v| v.trim().parse().ok())
            .or_else(|| file.and_then(|f| f.database.max_connections))
            .unwrap_or(DbConfig::DEFAULT_MAX_CONNECTIONS);

        let defaults = OpenAiConfig::default();
        let generation = OpenAiConfig {
            base_url: env(ENV_BASE_URL)
                .or(section.base_url)
                .unwrap_or(defaults.base_url),
            model: cli
                .model
                .clone()
                .or_else(|| env(ENV_MODEL))
                .or(section.model)
                .unwrap_or(defaults.model),
            api_key: env(ENV_API_KEY)
                .or_else(|| env(ENV_OPENAI_API_KEY))
                .or(section.api_key),
            timeout: section
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
            temperature: section.temperature.unwrap_or(defaults.temperature),
        };

        let mut pipeline = PipelineConfig::default();
        if let Some(n) = section.max_attempts {
            pipeline.max_attempts = n;
        }

        Self {
            db_config: DbConfig::new(db_url).with_max_connections(max_connections),
            generation,
            pipeline,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
