use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{DEFAULT_MAX_TOKENS, DEFAULT_MAX_TURNS, DEFAULT_TEMPERATURE};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default model configuration
    #[serde(default)]
    pub default_model: ModelSettings,

    /// LiteLLM proxy configuration
    #[serde(default)]
    pub litellm: LiteLlmConfig,

    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Default model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model provider (openai, anthropic, ollama, ...)
    pub provider: String,
    /// Model name
    pub name: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            name: "gpt-4o".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// LiteLLM proxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiteLlmConfig {
    /// Proxy base URL (environment variable LITELLM_PROXY_URL wins)
    pub proxy_url: Option<String>,
    /// Master key for proxy authentication
    pub master_key: Option<String>,
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on model round-trips per session
    pub max_turns: usize,
    /// Override for the base system prompt template
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            system_prompt: None,
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".tiller/config.toml");

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    figment = figment.merge(Env::prefixed("TILLER_").split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "tiller") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("tiller");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        let default_config = Config::default();
        save_config(&default_config, Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    }

    let local_example = PathBuf::from(".tiller/config.toml.example");
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let example_config = r#"# Tiller Project Configuration
# This file overrides global settings for this project

[default_model]
provider = "openai"
name = "gpt-4o"
temperature = 0.7
max_tokens = 4096

[agent]
max_turns = 24
"#;
        std::fs::write(&local_example, example_config)?;
        println!("Created example configuration at: {}", local_example.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.default_model.provider, "openai");
        assert_eq!(config.agent.max_turns, DEFAULT_MAX_TURNS);
        assert!(config.litellm.master_key.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
                [default_model]
                provider = "anthropic"
                name = "claude-3-5-sonnet"

                [agent]
                max_turns = 8
            "#,
        ));
        let config: Config = figment.extract().unwrap();

        assert_eq!(config.default_model.provider, "anthropic");
        assert_eq!(config.default_model.name, "claude-3-5-sonnet");
        assert_eq!(config.agent.max_turns, 8);
        // Untouched sections keep their defaults
        assert_eq!(config.default_model.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
