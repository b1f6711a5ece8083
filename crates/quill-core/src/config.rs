//! Editor configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! Serde is Rust's standard for serialization/deserialization.
//! The `#[derive(Serialize, Deserialize)]` macro generates
//! code to convert structs to/from JSON, TOML, etc.
//!
//! `#[serde(default)]` uses Default::default() for missing fields,
//! so a config file only needs the keys it wants to change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::search::SearchOptions;

/// Main engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editing behavior
    pub editor: EditorConfig,

    /// Word-wrap settings
    pub wrap: WrapConfig,

    /// Default find options
    pub search: SearchOptions,

    /// Keyboard settings
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Using default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("quill").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Editing behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tab width in cells
    pub tab_size: usize,

    /// Indent with spaces instead of tabs
    pub use_spaces: bool,

    /// Wrap long lines at the client width
    pub word_wrap: bool,

    /// Allow more than one line
    pub multiline: bool,

    /// Reject edits
    pub read_only: bool,

    /// Undo history limit
    pub undo_limit: usize,

    /// Stop word moves at lowercase-to-uppercase humps
    pub camel_case_words: bool,

    /// Caret blink half-period in milliseconds (0 disables blinking)
    pub caret_blink_ms: u64,

    /// Center the viewport on find results
    pub center_on_find: bool,

    /// Horizontal scroll margin on the left edge, in pixels
    pub scroll_left_margin: f32,

    /// Horizontal scroll margin on the right edge, in pixels
    pub scroll_right_margin: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: 4,
            use_spaces: true,
            word_wrap: false,
            multiline: true,
            read_only: false,
            undo_limit: 1000,
            camel_case_words: false,
            caret_blink_ms: 500,
            center_on_find: true,
            scroll_left_margin: 8.0,
            scroll_right_margin: 32.0,
        }
    }
}

impl EditorConfig {
    /// Returns the text inserted by one indent step.
    pub fn indent_unit(&self) -> String {
        if self.use_spaces {
            " ".repeat(self.tab_size.max(1))
        } else {
            "\t".to_string()
        }
    }
}

/// Word-wrap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapConfig {
    /// Characters at which a line may break
    pub split_chars: Vec<char>,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            split_chars: vec![' ', '-', '\t'],
        }
    }
}

/// Keyboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Custom key bindings, key string to command name
    pub bindings: HashMap<String, String>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.tab_size, 4);
        assert!(config.editor.use_spaces);
        assert!(!config.editor.word_wrap);
        assert_eq!(config.wrap.split_chars, vec![' ', '-', '\t']);
        assert!(!config.search.case_sensitive);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [editor]
            tab_size = 2
            word_wrap = true

            [keyboard.bindings]
            "ctrl+d" = "delete_next_word"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.editor.tab_size, 2);
        assert!(parsed.editor.word_wrap);
        assert_eq!(parsed.editor.undo_limit, 1000);
        assert_eq!(parsed.keyboard.bindings["ctrl+d"], "delete_next_word");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.editor.tab_size = 8;
        config.search.whole_words = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor = 3").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_indent_unit() {
        let mut editor = EditorConfig::default();
        assert_eq!(editor.indent_unit(), "    ");
        editor.use_spaces = false;
        assert_eq!(editor.indent_unit(), "\t");
    }
}
