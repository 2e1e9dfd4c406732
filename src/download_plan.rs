use anyhow::{anyhow, Context, Result};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    OsmData,
    GpsTrack,
    Url,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DownloadTask {
    pub kind: TaskKind,
    pub url: String,
    pub output: String,
}

impl DownloadTask {
    pub fn new(kind: TaskKind, url: &str, output: &str) -> Self {
        DownloadTask {
            kind,
            url: url.to_string(),
            output: output.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct DownloadPlan {
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Run every task in order, stopping at the first failure.
    pub async fn execute(&self, client: &reqwest::Client) -> Result<Vec<PathBuf>> {
        let mut written = vec![];
        for task in self.tasks.iter() {
            info!(url = %task.url, output = %task.output, "Current task");
            written.push(try_download(client, task).await?);
        }
        Ok(written)
    }
}

pub async fn try_download(client: &reqwest::Client, task: &DownloadTask) -> Result<PathBuf> {
    // Check if the output file already exists; return early if so
    let dst = PathBuf::from(&task.output);
    if dst.exists() {
        info!(output = %dst.display(), "Output file already exists");
        return Ok(dst);
    }

    // Make parent directories as necessary
    if let Some(parent_dir) = dst.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }

    info!(url = %task.url, "Downloading...");
    let response = client
        .get(&task.url)
        .send()
        .await?
        .error_for_status()
        .with_context(|| format!("Download of {} failed", task.url))?;

    // The API generates responses on the fly, so a leftover partial file
    // can't be resumed and is overwritten.
    let partial = PathBuf::from(format!("{}.partial", task.output));
    let byte_count = write_stream(response.bytes_stream(), &partial).await?;

    info!(bytes = byte_count, output = %dst.display(), "Download complete");
    // Rename the file to remove .partial suffix
    fs::rename(&partial, &dst)?;

    Ok(dst)
}

/// Drain `stream` into a freshly truncated file at `path`.
pub async fn write_stream<S, B, E>(stream: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut stream = std::pin::pin!(stream);
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Unable to create {}", path.display()))?;
    let mut byte_count = 0_u64;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| anyhow!("Error reading response body: {e}"))?;
        file.write_all(bytes.as_ref()).await?;
        byte_count += bytes.as_ref().len() as u64;
    }
    file.flush().await?;
    Ok(byte_count)
}
