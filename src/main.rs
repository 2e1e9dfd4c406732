use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;

use osmdl::config::Config;
use osmdl::dispatch::Dispatcher;
use osmdl::download::{DownloadHandle, DownloadQueue};
use osmdl::download_plan::DownloadPlan;
use osmdl::notify::ConsoleNotifier;
use osmdl::osm_url::OsmUrlParser;
use osmdl::summary::{self, Summary};

#[derive(Parser, Debug)]
#[command(author, version, about = "Download OpenStreetMap data and GPS tracks")]
struct Cli {
    /// Area (minlat,minlon,maxlat,maxlon), URL or file to load. Repeatable.
    #[arg(long, value_name = "PARAM", allow_hyphen_values = true)]
    download: Vec<String>,

    /// Area or map URL to fetch raw GPS tracks for. Repeatable.
    #[arg(long = "downloadgps", value_name = "PARAM", allow_hyphen_values = true)]
    download_gps: Vec<String>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the directory downloads are written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the OSM API base URL.
    #[arg(long)]
    api_url: Option<Url>,

    /// Never show warnings meant for an interactive user.
    #[arg(long)]
    headless: bool,

    /// Write the queued download tasks to this JSON file.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Queue tasks without downloading anything.
    #[arg(long)]
    dry_run: bool,

    /// Run the tasks of a previously written plan instead.
    #[arg(long, conflicts_with_all = ["download", "download_gps", "dry_run"])]
    execute_plan: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let notifier = Arc::new(ConsoleNotifier::new(cli.headless));

    let queue = DownloadQueue::new(config.clone(), notifier.clone())?.dry_run(cli.dry_run);

    if let Some(path) = &cli.execute_plan {
        return execute_plan(path, &queue).await;
    }

    if cli.download.is_empty() && cli.download_gps.is_empty() {
        info!("Nothing to download");
        return Ok(());
    }

    let parser = OsmUrlParser::new(config.viewport);
    let dispatcher = Dispatcher::new(&queue, &parser, &queue, notifier.as_ref());
    let outcome = dispatcher.process_command_line(&cli.download, &cli.download_gps);

    if !outcome.files.is_empty() {
        summary::open_files(&outcome.files);
    }

    if let Some(path) = &cli.plan {
        queue
            .plan()
            .write(path)
            .with_context(|| format!("Unable to write plan to {}", path.display()))?;
        info!(path = %path.display(), "Wrote download plan");
    }

    finish_downloads(outcome.handles, cli.dry_run).await
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    };
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url.clone());
    }
    Ok(config)
}

async fn execute_plan(path: &Path, queue: &DownloadQueue) -> Result<()> {
    let plan = DownloadPlan::read(path)
        .with_context(|| format!("Unable to read plan from {}", path.display()))?;
    info!(tasks = plan.tasks().len(), "Executing download plan");
    for written in plan.execute(queue.client()).await? {
        report(&written);
    }
    Ok(())
}

/// Wait for every download, reporting each as it completes.
async fn finish_downloads(handles: Vec<DownloadHandle>, dry_run: bool) -> Result<()> {
    let mut failed = 0;
    for handle in handles {
        match handle.wait().await {
            Ok(done) if dry_run => {
                info!(url = %done.task.url, output = %done.path.display(), "Planned download")
            }
            Ok(done) => report(&done.path),
            Err(e) => {
                error!(error = %e, "Download failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} download(s) failed", failed);
    }
    Ok(())
}

fn report(path: &Path) {
    if summary::is_compressed(path) {
        info!(path = %path.display(), "Saved compressed download without inspecting it");
        return;
    }
    match Summary::read(path) {
        Ok(summary) => info!("Downloaded {}", summary),
        Err(e) => warn!(path = %path.display(), error = %e, "Unable to summarize downloaded file"),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
