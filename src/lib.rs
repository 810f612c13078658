// Library exports for engagement-charts

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod parser;
pub mod records;

// Statistics, scales and geometry
pub mod transform;
pub mod scale;
pub mod palette;
pub mod curve;
pub mod ir;
pub mod compiler;

// Rendering and orchestration
pub mod graph;
pub mod config;
pub mod runtime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "svg")]
    #[default]
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 400 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::default(),
        }
    }
}

pub use config::ChartConfig;
pub use records::{ChartKind, Record};
pub use transform::{aggregate, GroupedQuantiles, QuantileSet};
