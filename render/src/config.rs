use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Settings for rendering a script into a document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Page margin on all four sides, in twips.
    pub page_margin: u32,

    /// Style used by paragraphs without a `style` argument. Paragraphs may also
    /// reference it by name without declaring it.
    pub default_style: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            page_margin: 1134,
            default_style: "Normal".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid render config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RenderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
