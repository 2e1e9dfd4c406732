//! The download subsystem behind the dispatcher: builds OSM API tasks and
//! runs each one on the tokio runtime.
use anyhow::{anyhow, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use crate::bounds::Bounds;
use crate::config::Config;
use crate::dispatch::{BoundsParser, DownloadEnqueuer, LocationOpener};
use crate::download_plan::{try_download, DownloadPlan, DownloadTask, TaskKind};
use crate::notify::Notifier;
use crate::osm_url::OsmUrlParser;

/// File types a plain URL may point at to be downloaded as is.
const DATA_EXTENSIONS: [&str; 7] = [
    ".osm", ".osm.gz", ".osm.bz2", ".osc", ".osc.gz", ".gpx", ".gpx.gz",
];

#[derive(Debug)]
pub struct DownloadOutcome {
    pub task: DownloadTask,
    pub path: PathBuf,
}

/// A download running in the background.
#[derive(Debug)]
pub struct DownloadHandle {
    task: DownloadTask,
    join: JoinHandle<Result<PathBuf>>,
}

impl DownloadHandle {
    /// Panics outside a tokio runtime; `DownloadQueue` checks for one first.
    pub fn spawn<F>(task: DownloadTask, download: F) -> Self
    where
        F: Future<Output = Result<PathBuf>> + Send + 'static,
    {
        Self {
            task,
            join: tokio::spawn(download),
        }
    }

    pub fn task(&self) -> &DownloadTask {
        &self.task
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn abort(&self) {
        self.join.abort();
    }

    pub async fn wait(self) -> Result<DownloadOutcome> {
        let path = self
            .join
            .await
            .map_err(|e| anyhow!("Download of {} did not finish: {}", self.task.url, e))??;
        Ok(DownloadOutcome {
            task: self.task,
            path,
        })
    }
}

/// Downloads are spawned on the current tokio runtime. Without one,
/// nothing is queued and no handles are returned.
pub struct DownloadQueue {
    client: reqwest::Client,
    config: Config,
    parser: OsmUrlParser,
    notifier: Arc<dyn Notifier + Send + Sync>,
    recorded: Mutex<Vec<DownloadTask>>,
    dry_run: bool,
}

impl DownloadQueue {
    pub fn new(config: Config, notifier: Arc<dyn Notifier + Send + Sync>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            parser: OsmUrlParser::new(config.viewport),
            config,
            notifier,
            recorded: Mutex::new(vec![]),
            dry_run: false,
        })
    }

    /// Record tasks without fetching anything. Handles resolve to the
    /// output path the download would have written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Every task handed out so far.
    pub fn plan(&self) -> DownloadPlan {
        let recorded = self.recorded.lock().map(|r| r.clone()).unwrap_or_default();
        DownloadPlan::new(recorded)
    }

    pub fn bounds_task(&self, bounds: &Bounds, raw_gps: bool) -> Result<DownloadTask> {
        let bbox = bounds.to_bbox_param();
        let (kind, endpoint, name) = if raw_gps {
            (
                TaskKind::GpsTrack,
                format!("trackpoints?bbox={bbox}&page=0"),
                format!("trackpoints_{}.gpx", bbox.replace(',', "_")),
            )
        } else {
            (
                TaskKind::OsmData,
                format!("map?bbox={bbox}"),
                format!("map_{}.osm", bbox.replace(',', "_")),
            )
        };
        let url = self.config.api_url.join(&endpoint)?;
        Ok(self.task(kind, url.as_str(), &name))
    }

    pub fn url_task(&self, url: &Url) -> DownloadTask {
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("download");
        self.task(TaskKind::Url, url.as_str(), name)
    }

    /// Pick an output path not used by an earlier task.
    fn task(&self, kind: TaskKind, url: &str, name: &str) -> DownloadTask {
        let recorded = self.recorded.lock().map(|r| r.clone()).unwrap_or_default();
        let taken = |path: &PathBuf| {
            recorded
                .iter()
                .any(|t| PathBuf::from(&t.output) == *path)
        };
        let mut output = self.config.output_dir.join(name);
        let mut n = 2;
        while taken(&output) {
            output = self.config.output_dir.join(format!("{n}-{name}"));
            n += 1;
        }
        DownloadTask::new(kind, url, &output.to_string_lossy())
    }

    fn start(&self, task: DownloadTask) -> Option<DownloadHandle> {
        if Handle::try_current().is_err() {
            warn!(url = %task.url, "No tokio runtime to run the download on");
            return None;
        }
        info!(kind = ?task.kind, url = %task.url, output = %task.output, "Queueing download");
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(task.clone());
        }
        if self.dry_run {
            let output = PathBuf::from(&task.output);
            return Some(DownloadHandle::spawn(task, async move { Ok(output) }));
        }
        let client = self.client.clone();
        let spawned = task.clone();
        Some(DownloadHandle::spawn(task, async move {
            try_download(&client, &spawned).await
        }))
    }

    fn reject_url(&self, url: &str) -> Vec<DownloadHandle> {
        warn!(url, "No download task accepts URL");
        self.notifier.warn(
            "Warning",
            &format!("No download task accepts URL \"{url}\""),
        );
        vec![]
    }
}

impl DownloadEnqueuer for DownloadQueue {
    fn enqueue_download(&self, bounds: &Bounds, raw_gps: bool) -> Vec<DownloadHandle> {
        match self.bounds_task(bounds, raw_gps) {
            Ok(task) => self.start(task).into_iter().collect(),
            Err(e) => {
                warn!(%bounds, error = %e, "Unable to build download URL");
                vec![]
            }
        }
    }
}

impl LocationOpener for DownloadQueue {
    /// Map links and API calls become area downloads; links to data files
    /// are fetched as they are.
    fn open_location(&self, url: &str, remote_control: bool) -> Vec<DownloadHandle> {
        info!(url, remote_control, "Opening location");
        if let Some(bounds) = self.parser.parse_url_to_bounds(url) {
            return self.enqueue_download(&bounds, false);
        }
        match Url::parse(url) {
            Ok(parsed) if is_data_file(&parsed) => {
                self.start(self.url_task(&parsed)).into_iter().collect()
            }
            _ => self.reject_url(url),
        }
    }
}

fn is_data_file(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    DATA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
