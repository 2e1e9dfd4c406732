use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;
use crate::osm_url::Viewport;

pub const DEFAULT_API_URL: &str = "https://api.openstreetmap.org/api/0.6/";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base of the OSM API, ending in a slash.
    pub api_url: Url,
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub viewport: Viewport,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("Default API URL should always parse"),
            output_dir: PathBuf::from("./downloads"),
            user_agent: format!("osmdl/{}", env!("CARGO_PKG_VERSION")),
            viewport: Viewport::default(),
        }
    }
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config.normalized())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_template(table: &toml::Table) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(&table.to_string())?;
        Ok(config.normalized())
    }

    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self.normalized()
    }

    /// `Url::join` drops the last path segment unless it ends in a slash.
    fn normalized(mut self) -> Self {
        if !self.api_url.path().ends_with('/') {
            let path = format!("{}/", self.api_url.path());
            self.api_url.set_path(&path);
        }
        self
    }
}
