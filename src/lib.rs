pub mod bounds;
pub mod config;
pub mod dispatch;
pub mod download;
pub mod download_plan;
mod error;
pub mod notify;
pub mod osm_url;
pub mod param;
pub mod summary;

pub use error::{ConfigError, OsmUrlError, SummaryError};
