//! Intake configuration.
//!
//! Loaded from `~/.intake/config.toml`. Every key is optional; a missing file
//! means defaults, which is enough for local use.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Intake configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Base URL of the REST API, e.g. `https://visits.example.edu/api`.
    /// Required for `--remote`.
    pub api_url: Option<String>,

    /// Bearer token sent with every API request.
    pub api_token: Option<String>,

    /// Default acting user (email) for local storage.
    pub user: Option<String>,
}

impl Config {
    /// Load config from `~/.intake/config.toml`.
    /// Returns defaults if the file is missing and an error if it is invalid.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.intake/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".intake").join("config.toml"))
    }

    /// The API base URL, or an error explaining how to set one.
    pub fn require_api_url(&self) -> Result<&str, String> {
        self.api_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                "--remote needs an API URL\n\
                 Add to ~/.intake/config.toml:\n\n\
                 api-url = \"https://visits.example.edu/api\""
                    .to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api-url = \"https://visits.example.edu/api\"\nuser = \"ada@example.edu\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.require_api_url().unwrap(),
            "https://visits.example.edu/api"
        );
        assert_eq!(config.user.as_deref(), Some("ada@example.edu"));
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api-url = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn remote_without_url_explains_itself() {
        let err = Config::default().require_api_url().unwrap_err();
        assert!(err.contains("api-url"));
    }
}
