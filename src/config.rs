use crate::core::engine::{EngineOptions, Strategy};
use crate::core::record::MalformedPolicy;
use crate::error::{Result, SamelistError};
use crate::report::{HtmlOptions, OutputFormat};
use crate::report::html::{DEFAULT_IMAGE_BASE_URL, DEFAULT_TITLE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One layer of settings: the config file, or the command line. Unset
/// fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigLayer {
    pub strategy: Option<Strategy>,
    pub on_malformed: Option<MalformedPolicy>,
    pub format: Option<OutputFormat>,
    pub image_base_url: Option<String>,
    pub title: Option<String>,
}

impl ConfigLayer {
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |message: String| SamelistError::Config {
            path: path.display().to_string(),
            message,
        };
        let contents = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| config_error(e.to_string()))
    }

    /// `<config dir>/samelist/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("samelist").join("config.json"))
    }

    /// Loads `explicit` if given (it must exist), otherwise the default file
    /// when present. No file at all yields an empty layer.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::info!("Loading config from {}", path.display());
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Fields set in `self` win over those in `lower`.
    pub fn over(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            strategy: self.strategy.or(lower.strategy),
            on_malformed: self.on_malformed.or(lower.on_malformed),
            format: self.format.or(lower.format),
            image_base_url: self.image_base_url.or(lower.image_base_url),
            title: self.title.or(lower.title),
        }
    }
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub engine: EngineOptions,
    pub format: OutputFormat,
    pub html: HtmlOptions,
}

impl From<ConfigLayer> for Settings {
    fn from(layer: ConfigLayer) -> Self {
        Settings {
            engine: EngineOptions {
                strategy: layer.strategy.unwrap_or_default(),
                on_malformed: layer.on_malformed.unwrap_or_default(),
            },
            format: layer.format.unwrap_or_default(),
            html: HtmlOptions {
                title: layer.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                image_base_url: layer
                    .image_base_url
                    .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
            },
        }
    }
}
