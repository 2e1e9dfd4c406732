//! Turn `--download` / `--downloadgps` parameters into downloads and files to open.
use std::path::PathBuf;

use tracing::{debug, info, warn};
use url::Url;

use crate::bounds::Bounds;
use crate::download::DownloadHandle;
use crate::notify::Notifier;
use crate::param::ParamKind;

/// Paths collected across all parameters, opened once everything is processed.
pub type FileCollection = Vec<PathBuf>;

const WARNING: &str = "Warning";

pub trait LocationOpener {
    fn open_location(&self, url: &str, remote_control: bool) -> Vec<DownloadHandle>;
}

pub trait BoundsParser {
    fn parse_url_to_bounds(&self, url: &str) -> Option<Bounds>;
}

pub trait DownloadEnqueuer {
    fn enqueue_download(&self, bounds: &Bounds, raw_gps: bool) -> Vec<DownloadHandle>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// `--download`: map data.
    Normal,
    /// `--downloadgps`: raw GPS tracks.
    Gps,
}

#[derive(Debug, Default)]
pub struct CommandLineOutcome {
    pub files: FileCollection,
    pub handles: Vec<DownloadHandle>,
}

pub struct Dispatcher<'a> {
    opener: &'a dyn LocationOpener,
    parser: &'a dyn BoundsParser,
    downloads: &'a dyn DownloadEnqueuer,
    notifier: &'a dyn Notifier,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        opener: &'a dyn LocationOpener,
        parser: &'a dyn BoundsParser,
        downloads: &'a dyn DownloadEnqueuer,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            opener,
            parser,
            downloads,
            notifier,
        }
    }

    /// Handle every `--download` value, then every `--downloadgps` value.
    pub fn process_command_line(
        &self,
        downloads: &[String],
        gps_downloads: &[String],
    ) -> CommandLineOutcome {
        let mut outcome = CommandLineOutcome::default();
        for token in downloads {
            let handles = self.process(token, &mut outcome.files, Mode::Normal);
            outcome.handles.extend(handles);
        }
        for token in gps_downloads {
            let handles = self.process(token, &mut outcome.files, Mode::Gps);
            outcome.handles.extend(handles);
        }
        outcome
    }

    pub fn process(
        &self,
        token: &str,
        files: &mut FileCollection,
        mode: Mode,
    ) -> Vec<DownloadHandle> {
        let kind = ParamKind::classify(token);
        info!(token, %kind, ?mode, "Processing download parameter");
        self.dispatch(kind, token, files, mode)
    }

    pub fn dispatch(
        &self,
        kind: ParamKind,
        token: &str,
        files: &mut FileCollection,
        mode: Mode,
    ) -> Vec<DownloadHandle> {
        match (kind, mode) {
            (ParamKind::HttpUrl, Mode::Normal) => self.opener.open_location(token, false),
            (ParamKind::HttpUrl, Mode::Gps) => self.download_from_http(token, true),
            (ParamKind::Bounds, mode) => self.download_from_bounds(token, mode == Mode::Gps),
            (ParamKind::FileUrl, Mode::Normal) => {
                if let Some(path) = self.file_url_to_path(token) {
                    files.push(path);
                }
                vec![]
            }
            (ParamKind::FileName, Mode::Normal) => {
                files.push(PathBuf::from(token));
                vec![]
            }
            (ParamKind::FileUrl | ParamKind::FileName, Mode::Gps) => self.reject_gps(token),
        }
    }

    fn download_from_http(&self, url: &str, raw_gps: bool) -> Vec<DownloadHandle> {
        match self.parser.parse_url_to_bounds(url) {
            Some(bounds) => self.downloads.enqueue_download(&bounds, raw_gps),
            None => {
                warn!(url, "Ignoring malformed URL");
                self.notifier
                    .warn(WARNING, &format!("Ignoring malformed URL: \"{url}\""));
                vec![]
            }
        }
    }

    /// `lat1,lon1,lat2,lon2`. Anything else quietly yields nothing.
    fn download_from_bounds(&self, token: &str, raw_gps: bool) -> Vec<DownloadHandle> {
        let fields: Vec<&str> = token.split(',').filter(|f| !f.is_empty()).collect();
        if fields.len() != 4 {
            debug!(token, count = fields.len(), "Not a bounds parameter");
            return vec![];
        }
        let values = match fields
            .iter()
            .map(|f| f.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(values) => values,
            Err(e) => {
                debug!(token, error = %e, "Not a bounds parameter");
                return vec![];
            }
        };
        let bounds = Bounds::from_corners(values[0], values[1], values[2], values[3]);
        self.downloads.enqueue_download(&bounds, raw_gps)
    }

    fn file_url_to_path(&self, token: &str) -> Option<PathBuf> {
        let path = Url::parse(token)
            .map_err(|e| e.to_string())
            .and_then(|url| {
                url.to_file_path()
                    .map_err(|_| "not a local file path".to_string())
            });
        match path {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(url = token, error = %e, "Ignoring malformed file URL");
                self.notifier
                    .warn(WARNING, &format!("Ignoring malformed file URL: \"{token}\""));
                None
            }
        }
    }

    fn reject_gps(&self, token: &str) -> Vec<DownloadHandle> {
        debug!(token, "File parameter given to --downloadgps");
        self.notifier.warn(
            WARNING,
            "Parameter \"downloadgps\" does not accept file names or file URLs",
        );
        vec![]
    }
}
