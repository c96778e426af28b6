use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine a config path, set HOME or pass --config")]
    NoPath,

    #[error("config file not found '{}'", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub base_url: Option<String>,
    #[serde(alias = "rows")]
    pub page_size: Option<usize>,
    pub start_page: Option<usize>,
    pub rate: Option<u32>,
    pub timeout: Option<usize>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub demo: Option<usize>,
    pub reuse_cached_page: Option<bool>,
    pub no_color: Option<bool>,
}

fn home() -> Option<PathBuf> {
    let home = env::var_os("HOME").or_else(|| env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home))
}

/// `~/.artpick/config.yml`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    Some(home()?.join(".artpick").join("config.yml"))
}

/// The `--config` path with a leading `~` resolved, or the default path.
pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf, ConfigError> {
    let Some(raw) = explicit else {
        return default_config_path().ok_or(ConfigError::NoPath);
    };
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return Ok(PathBuf::from(raw)),
    };
    let home = home().ok_or(ConfigError::NoPath)?;
    Ok(home.join(rest.trim_start_matches(['/', '\\'])))
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    // an empty or comment-only file deserializes as unit
    let blank = contents
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'));
    if blank {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(contents)
}

/// Reads the config at `path`. A missing file is only an error when the
/// path was asked for explicitly.
pub fn load_config(path: &Path, explicit: bool) -> Result<ConfigFile, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if explicit {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(ConfigFile::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    log::debug!("loaded config {}", path.display());
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_config_yaml() -> String {
    r#"# artpick config
#
# Location (default):
#   ~/.artpick/config.yml

# Source
base_url: https://api.artic.edu/api/v1/artworks
# demo: 250            # use an offline collection of N records instead

# Paging
page_size: 10
start_page: 1
reuse_cached_page: true

# HTTP
timeout: 10
rate: 0                # requests per second, 0 = unlimited
# proxy: http://127.0.0.1:8080
# user_agent: artpick

# Output (optional, written on quit)
# output: ./selection.json
# output_format: json

no_color: false
"#
    .to_string()
}

/// Writes the commented default config to `path`. Returns `false` and
/// leaves the file alone if one is already there.
pub fn write_default_config(path: &Path) -> Result<bool, ConfigError> {
    let write_err = |source: io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_err(e)),
    };
    file.write_all(default_config_yaml().as_bytes()).map_err(write_err)?;
    Ok(true)
}
