//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::PrecacheEntry;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Manifest(PathBuf, serde_json::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Manifest(path, e) => {
                write!(f, "Invalid precache manifest {}: {}", path.display(), e)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, merge the precache manifest into, and validate a TOML config file.
///
/// A relative `manifest_path` is resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ProxyConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    if let Some(manifest) = manifest_path(path, &config) {
        let raw = fs::read_to_string(&manifest).map_err(ConfigError::Io)?;
        let entries: Vec<PrecacheEntry> =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Manifest(manifest.clone(), e))?;
        tracing::debug!(manifest = %manifest.display(), entries = entries.len(), "Merged precache manifest");
        config.precache.entries.extend(entries);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Absolute location of the manifest referenced by `config`, if any.
pub fn manifest_path(config_path: &Path, config: &ProxyConfig) -> Option<PathBuf> {
    let manifest = PathBuf::from(config.precache.manifest_path.as_ref()?);
    if manifest.is_absolute() {
        Some(manifest)
    } else {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        Some(base.join(manifest))
    }
}
