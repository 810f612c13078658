use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::compiler;
use crate::config::ChartConfig;
use crate::csv_reader;
use crate::data::PlotData;
use crate::graph;
use crate::records::{self, ChartKind};

/// One chart to produce: where its data comes from and where it goes
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub kind: ChartKind,
    pub source: PathBuf,
    pub output: PathBuf,
    /// Also write the scene graph as JSON next to the output
    pub emit_scene: bool,
}

impl PipelineJob {
    /// Job reading the chart's default file in `data_dir`, writing
    /// `<chart>.<ext>` into `out_dir`
    pub fn in_dirs(kind: ChartKind, data_dir: &Path, out_dir: &Path, config: &ChartConfig) -> Self {
        Self {
            kind,
            source: data_dir.join(kind.default_source()),
            output: out_dir.join(format!("{}.{}", kind.name(), config.render.format.extension())),
            emit_scene: false,
        }
    }

    pub fn scene_path(&self) -> PathBuf {
        self.output.with_extension("scene.json")
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub kind: ChartKind,
    pub result: Result<PathBuf>,
}

impl PipelineReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// `.json` sources hold an array of objects; anything else is CSV
fn parse_table(path: &Path, bytes: &[u8]) -> Result<PlotData> {
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        PlotData::from_json(&value)
    } else {
        Ok(PlotData::from_csv(csv_reader::read_csv_from_reader(bytes)?))
    }
}

/// Load, compile, render and write one chart
pub async fn run_pipeline(job: &PipelineJob, config: &ChartConfig) -> Result<PathBuf> {
    info!(chart = %job.kind, source = %job.source.display(), "Loading dataset");
    let bytes = tokio::fs::read(&job.source)
        .await
        .with_context(|| format!("Failed to read '{}'", job.source.display()))?;

    let data = parse_table(&job.source, &bytes)
        .with_context(|| format!("Failed to parse '{}'", job.source.display()))?;
    let records = records::load_records(&data, job.kind)?;
    info!(chart = %job.kind, records = records.len(), "Loaded records");

    let scene = compiler::build_scene(job.kind, &records, config)
        .with_context(|| format!("Failed to compile {}", job.kind))?;

    if let Some(parent) = job.output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }

    let scene_json = if job.emit_scene {
        Some(serde_json::to_vec_pretty(&scene).context("Failed to serialize scene")?)
    } else {
        None
    };

    let format = config.render.format;
    let encoded = tokio::task::spawn_blocking(move || graph::render_scene(&scene, format))
        .await
        .context("Render task failed")??;

    tokio::fs::write(&job.output, encoded)
        .await
        .with_context(|| format!("Failed to write '{}'", job.output.display()))?;

    // The scene file only exists alongside a written chart
    if let Some(json) = scene_json {
        let path = job.scene_path();
        if let Err(e) = tokio::fs::write(&path, json).await {
            let _ = tokio::fs::remove_file(&path).await;
            let _ = tokio::fs::remove_file(&job.output).await;
            return Err(e).with_context(|| format!("Failed to write '{}'", path.display()));
        }
    }
    info!(chart = %job.kind, output = %job.output.display(), "Chart written");

    Ok(job.output.clone())
}

/// Run every job concurrently. A failing job does not stop the others;
/// reports come back in job order.
pub async fn run_all(jobs: Vec<PipelineJob>, config: Arc<ChartConfig>) -> Vec<PipelineReport> {
    let mut set = JoinSet::new();
    for (idx, job) in jobs.into_iter().enumerate() {
        let config = Arc::clone(&config);
        set.spawn(async move {
            let result = run_pipeline(&job, &config).await;
            if let Err(e) = &result {
                error!(chart = %job.kind, "{:#}", e);
            }
            (idx, PipelineReport { kind: job.kind, result })
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => error!("Pipeline task did not complete: {}", e),
        }
    }
    reports.sort_by_key(|(idx, _)| *idx);
    reports.into_iter().map(|(_, report)| report).collect()
}
