//! Configuration management for Trailhead

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::theme::Theme;
use crate::tutor::TutorModel;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Selected theme name
    pub theme: String,

    /// Custom theme overrides (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<Theme>,

    /// Model the tutor asks for explanations
    #[serde(default)]
    pub tutor_model: TutorModel,

    /// Curriculum catalog to load instead of the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum_path: Option<PathBuf>,

    /// Show the curriculum panel on startup
    #[serde(default = "default_true")]
    pub show_curriculum: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "Tokyo Night".to_string(),
            custom_theme: None,
            tutor_model: TutorModel::default(),
            curriculum_path: None,
            show_curriculum: true,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from a specific file, writing defaults there when it is missing
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "trailhead").context("Failed to determine home directory")
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    /// Get the data directory path (progress, badges, logs)
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn achievements_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join(crate::progress::achievements::ACHIEVEMENTS_FILE))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("trailhead.log"))
    }

    /// Get the active theme, falling back to Tokyo Night for unknown names
    pub fn active_theme(&self) -> Theme {
        if let Some(custom) = &self.custom_theme {
            return custom.clone();
        }
        Theme::named(&self.theme).unwrap_or_else(|| {
            tracing::warn!("Unknown theme {:?}, using Tokyo Night", self.theme);
            Theme::tokyo_night()
        })
    }
}
