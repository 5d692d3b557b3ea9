use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::ChatError;

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            openai: OpenAiConfig {
                api_base: default_api_base(),
                model: default_model(),
            },
            window: WindowConfig {
                width: 980,
                height: 580,
                min_width: 640,
                min_height: 420,
            },
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Error parsing config.toml: {}. Using defaults.", e),
                },
                Err(e) => eprintln!("Error reading config.toml: {}. Using defaults.", e),
            }
        } else if let Some(parent) = config_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        Config::default()
    }

    // The credential never lives in the config file; a missing key is a
    // fatal startup error handled in main.
    pub fn api_key() -> Result<String, ChatError> {
        match env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ChatError::MissingApiKey),
        }
    }

    pub fn get_config_path() -> PathBuf {
        if let Some(home) = env::var_os("HOME") {
            PathBuf::from(home).join(".config/tabchat/config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.openai.api_base, "https://api.openai.com/v1");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.window.width, 980);
    }

    #[test]
    fn partial_openai_section_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [openai]
            model = "gpt-4o"

            [window]
            width = 800
            height = 600
            min_width = 400
            min_height = 300
            "#,
        )
        .unwrap();
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.api_base, "https://api.openai.com/v1");
    }
}
