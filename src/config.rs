use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::family::Families;
use crate::registry::{TagDescriptor, TagRegistry};

/// Top-level configuration for pixmeta.
///
/// Adds tag descriptors on top of the builtin catalogue and picks the
/// families that `copy` transfers by default.
///
/// # Loading
///
/// ```rust,no_run
/// use pixmeta::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
/// let registry = config.registry().unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.copy.xmp = false;
/// ```
///
/// A config file looks like:
///
/// ```json
/// {
///   "tags": [
///     { "key": "Xmp.xmp.Nickname", "kind": { "family": "xmp", "kind": { "Simple": "Text" } } },
///     { "key": "Exif.Image.Rating", "kind": { "family": "exif", "class": "Short" } }
///   ],
///   "copy": { "exif": true, "iptc": true, "xmp": true }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Extra or overriding tag descriptors.
    #[serde(default)]
    pub tags: Vec<TagDescriptor>,
    /// Families copied by default.
    #[serde(default)]
    pub copy: Families,
}

impl Config {
    /// Default config file: `pixmeta.json` next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("pixmeta.json"))
    }

    fn resolve(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::config_path(),
        }
    }

    /// Load config from the given path, or from the default location.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve(path)?;
        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        log::debug!(
            "Loaded {} tag descriptor(s) from {}",
            config.tags.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = Self::resolve(path)?;
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// The builtin catalogue extended with the configured descriptors.
    pub fn registry(&self) -> Result<TagRegistry> {
        TagRegistry::with_builtin(self.tags.iter().cloned())
            .context("Invalid tag descriptor in config")
    }
}
