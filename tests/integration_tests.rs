use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use engagement_charts::records::load_and_parse;
use engagement_charts::runtime::{run_all, run_pipeline, PipelineJob};
use engagement_charts::{aggregate, ChartConfig, ChartKind};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test").join(name)
}

fn job(kind: ChartKind, source: &str, out_dir: &Path) -> PipelineJob {
    PipelineJob {
        kind,
        source: fixture(source),
        output: out_dir.join(format!("{}.svg", kind.name())),
        emit_scene: false,
    }
}

/// Check if text is an SVG document
fn is_svg(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).trim_start().starts_with("<svg")
}

#[test]
fn test_quartiles_from_fixture() {
    let csv = fs::read_to_string(fixture("likes.csv")).expect("Failed to read test CSV");
    let records = load_and_parse(&csv, ChartKind::Boxplot).unwrap();
    let quantiles = aggregate(&records).unwrap();

    let keys: Vec<&str> = quantiles.keys().collect();
    assert_eq!(keys, vec!["Facebook", "Twitter"]);

    let facebook = quantiles.get("Facebook").unwrap();
    assert_eq!((facebook.min, facebook.q1, facebook.median, facebook.q3, facebook.max), (10.0, 20.0, 30.0, 40.0, 50.0));

    let twitter = quantiles.get("Twitter").unwrap();
    assert_eq!((twitter.q1, twitter.median, twitter.q3), (28.75, 52.5, 76.25));
}

#[tokio::test]
async fn test_end_to_end_boxplot() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(ChartKind::Boxplot, "likes.csv", dir.path());

    let written = run_pipeline(&job, &ChartConfig::default()).await.unwrap();
    let bytes = fs::read(&written).unwrap();
    assert!(is_svg(&bytes), "Output is not an SVG");
    assert!(String::from_utf8_lossy(&bytes).contains("Facebook"));
}

#[tokio::test]
async fn test_end_to_end_bar_chart_with_bad_value() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(ChartKind::GroupedBar, "averages.csv", dir.path());

    let written = run_pipeline(&job, &ChartConfig::default()).await.unwrap();
    assert!(is_svg(&fs::read(written).unwrap()));
}

#[tokio::test]
async fn test_end_to_end_bar_chart_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(ChartKind::GroupedBar, "averages.json", dir.path());
    job.emit_scene = true;

    run_pipeline(&job, &ChartConfig::default()).await.unwrap();

    let scene: serde_json::Value = serde_json::from_slice(&fs::read(job.scene_path()).unwrap()).unwrap();
    let bars = scene["commands"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["type"] == "DrawRect")
        .count();
    // A null average coerces to 0 and still gets a (flat) bar
    assert_eq!(bars, 4);
}

#[tokio::test]
async fn test_end_to_end_line_chart_emits_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(ChartKind::Line, "timeline.csv", dir.path());
    job.emit_scene = true;

    run_pipeline(&job, &ChartConfig::default()).await.unwrap();

    let scene: serde_json::Value = serde_json::from_slice(&fs::read(job.scene_path()).unwrap()).unwrap();
    assert_eq!(scene["width"], 800);
    let commands = scene["commands"].as_array().unwrap();
    let points = commands
        .iter()
        .find(|c| c["type"] == "DrawPoint")
        .and_then(|c| c["points"].as_array())
        .unwrap();
    // 2024-03-05 is not in M/D/YYYY (Weekday) form and is left out
    assert_eq!(points.len(), 6);

    let labels: Vec<&str> = scene["axes"][0]["ticks"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["label"].as_str())
        .collect();
    assert_eq!(labels.first(), Some(&"03/01 (Fri)"));
    assert_eq!(labels.last(), Some(&"03/07 (Thu)"));
}

#[tokio::test]
async fn test_failing_chart_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![
        job(ChartKind::Boxplot, "missing_column.csv", dir.path()),
        job(ChartKind::GroupedBar, "averages.csv", dir.path()),
        job(ChartKind::Line, "timeline.csv", dir.path()),
    ];

    let reports = run_all(jobs, Arc::new(ChartConfig::default())).await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].kind, ChartKind::Boxplot);
    let err = reports[0].result.as_ref().unwrap_err();
    assert!(format!("{:#}", err).contains("Likes"), "unexpected error: {:#}", err);
    assert!(reports[1].is_ok());
    assert!(reports[2].is_ok());
    assert!(dir.path().join("barplot.svg").exists());
    assert!(dir.path().join("lineplot.svg").exists());
    assert!(!dir.path().join("boxplot.svg").exists());
}

#[tokio::test]
async fn test_unwritable_output_leaves_no_scene_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(ChartKind::Boxplot, "likes.csv", dir.path());
    job.emit_scene = true;
    // A directory in place of the chart file makes the final write fail
    fs::create_dir(&job.output).unwrap();

    let result = run_pipeline(&job, &ChartConfig::default()).await;

    assert!(result.is_err());
    assert!(!job.scene_path().exists(), "failed chart left {}", job.scene_path().display());
}

#[test]
fn test_cli_renders_selected_charts() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_engagement-charts"))
        .arg("--boxplot")
        .arg(fixture("likes.csv"))
        .arg("--lineplot")
        .arg(fixture("timeline.csv"))
        .args(["--only", "boxplot", "--only", "lineplot"])
        .arg("--out-dir")
        .arg(dir.path())
        .output()
        .expect("Failed to spawn process");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("boxplot.svg").exists());
    assert!(dir.path().join("lineplot.svg").exists());
    assert!(!dir.path().join("barplot.svg").exists());
}

#[test]
fn test_cli_exit_code_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_engagement-charts"))
        .arg("--boxplot")
        .arg(fixture("missing_column.csv"))
        .arg("--barplot")
        .arg(fixture("averages.csv"))
        .args(["--only", "boxplot", "--only", "barplot"])
        .arg("--out-dir")
        .arg(dir.path())
        .output()
        .expect("Failed to spawn process");

    assert_eq!(output.status.code(), Some(1));
    assert!(dir.path().join("barplot.svg").exists());
}
