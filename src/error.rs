use std::path::PathBuf;

use thiserror::Error;

/// Reasons an openstreetmap.org link could not be turned into bounds.
#[derive(Error, Debug, PartialEq)]
pub enum OsmUrlError {
    #[error("Unable to parse URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Short link has no position code")]
    EmptyShortLink,
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
    #[error("No position found in URL")]
    NoPosition,
}

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Unsupported root element <{0}>")]
    UnsupportedRoot(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Unable to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unable to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
