use crate::error::{CoreError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaydeckConfig {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engines: EnginesConfig,
}

/// Limits applied while rendering the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Most options a select menu may carry; extra tracks are left out
    #[serde(default = "default_select_menu_max_options")]
    pub select_menu_max_options: usize,
    /// Option labels longer than this many characters are cut
    #[serde(default = "default_option_label_max_chars")]
    pub option_label_max_chars: usize,
}

const fn default_select_menu_max_options() -> usize {
    25
}

const fn default_option_label_max_chars() -> usize {
    100
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            select_menu_max_options: default_select_menu_max_options(),
            option_label_max_chars: default_option_label_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file
    #[serde(default)]
    pub enabled: bool,
}

/// Engine-specific tables, keyed by engine name (`[engines.<name>]`).
///
/// Each engine crate owns the shape of its own table and pulls it out with
/// [`EnginesConfig::get`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnginesConfig(HashMap<String, toml::Value>);

impl EnginesConfig {
    /// Deserialize the table for `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the table exists but does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .map(|value| {
                value.clone().try_into().map_err(|e: toml::de::Error| {
                    CoreError::ConfigInvalid {
                        message: format!("engines.{name}: {e}"),
                    }
                })
            })
            .transpose()
    }
}

impl PlaydeckConfig {
    /// Get the configuration directory path (~/.config/playdeck/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/playdeck/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default path, or write a template on first run.
    ///
    /// `engine_templates` are appended to the base template so a fresh file
    /// documents every engine that was compiled in.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create(engine_templates: Option<&[&str]>) -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, build_config_template(engine_templates))?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        Self::load_from(&config_path)
    }

    /// Load and validate config from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on TOML syntax errors or invalid values.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.player.select_menu_max_options == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.select_menu_max_options must be at least 1".into(),
            });
        }
        if self.player.option_label_max_chars == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.option_label_max_chars must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Build the full config template with engine sections appended.
#[must_use]
pub fn build_config_template(engine_templates: Option<&[&str]>) -> String {
    let mut template = String::from(CONFIG_TEMPLATE);
    for section in engine_templates.unwrap_or_default() {
        template.push('\n');
        template.push_str(section);
    }
    template
}

const CONFIG_TEMPLATE: &str = r#"# Playdeck Configuration
# ~/.config/playdeck/config.toml

[player]
# Select menus carry at most this many tracks; the rest stay in the queue
select_menu_max_options = 25
# Track titles longer than this are cut in menu labels
option_label_max_chars = 100

[logging]
# Also write logs to a file in the cache directory
enabled = false
"#;
