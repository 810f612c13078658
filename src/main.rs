use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use engagement_charts::runtime::{self, PipelineJob};
use engagement_charts::{ChartConfig, ChartKind, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "engagement-charts")]
#[command(about = "Render social media engagement charts (boxplot, grouped bars, time series) from CSV", long_about = None)]
struct Args {
    /// Directory holding socialMedia.csv, socialMediaAvg.csv and SocialMediaTime.csv
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Override the boxplot dataset
    #[arg(long)]
    boxplot: Option<PathBuf>,

    /// Override the grouped bar dataset
    #[arg(long)]
    barplot: Option<PathBuf>,

    /// Override the time series dataset
    #[arg(long)]
    lineplot: Option<PathBuf>,

    /// Only render these charts (repeatable)
    #[arg(long, value_enum)]
    only: Vec<ChartKind>,

    /// Output directory
    #[arg(long, default_value = "charts")]
    out_dir: PathBuf,

    /// Output format, overrides the config file
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON chart configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write each scene graph as <chart>.scene.json
    #[arg(long)]
    emit_scene: bool,
}

impl Args {
    fn jobs(&self, config: &ChartConfig) -> Vec<PipelineJob> {
        ChartKind::ALL
            .into_iter()
            .filter(|kind| self.only.is_empty() || self.only.contains(kind))
            .map(|kind| {
                let mut job = PipelineJob::in_dirs(kind, &self.data_dir, &self.out_dir, config);
                let source = match kind {
                    ChartKind::Boxplot => &self.boxplot,
                    ChartKind::GroupedBar => &self.barplot,
                    ChartKind::Line => &self.lineplot,
                };
                if let Some(path) = source {
                    job.source = path.clone();
                }
                job.emit_scene = self.emit_scene;
                job
            })
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ChartConfig::from_path(path).context("Failed to load configuration")?,
        None => ChartConfig::default(),
    };
    if let Some(format) = args.format {
        config.render.format = format;
    }

    let jobs = args.jobs(&config);
    let total = jobs.len();
    let reports = runtime::run_all(jobs, Arc::new(config)).await;

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        tracing::error!(failed, total, "Some charts could not be rendered");
        std::process::exit(1);
    }

    tracing::info!(total, "All charts rendered");
    Ok(())
}
