use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Filenames looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["loadsmith.toml", "loadsmith.json"];

/// A parsed configuration and the file it came from. Relative paths inside
/// the file resolve against [`LoadedConfig::base_dir`].
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub file: ConfigFile,
}

impl LoadedConfig {
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Resolves `path` against the config file's directory unless absolute.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }
}

/// Loads a configuration file from the provided path or default locations.
///
/// # Errors
///
/// Returns an error when no config file exists or it cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> AppResult<LoadedConfig> {
    if let Some(path) = path {
        return load_config_file(path);
    }
    for candidate in DEFAULT_CONFIG_FILES {
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            debug!("Using default config {}", candidate.display());
            return load_config_file(&candidate);
        }
    }
    Err(AppError::config(ConfigError::NoConfigFound))
}

pub(super) fn load_config_file(path: &Path) -> AppResult<LoadedConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    let file = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        })?,
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        })?,
        Some(ext) => {
            return Err(AppError::config(ConfigError::UnsupportedExtension {
                ext: ext.to_owned(),
            }));
        }
        None => return Err(AppError::config(ConfigError::MissingExtension)),
    };
    Ok(LoadedConfig {
        path: path.to_path_buf(),
        file,
    })
}
