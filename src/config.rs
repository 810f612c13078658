//! Chart configuration.
//!
//! Every field has a default reproducing the reference charts (800x400,
//! margins 50/50/50/70, 80 at the bottom of the line chart), so a config file
//! only needs the values it changes:
//!
//! ```json
//! { "render": { "type": "png" }, "barplot": { "palette": ["#333", "#777", "#bbb"] } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::palette::POST_TYPE_COLORS;
use crate::RenderOptions;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self { top: 50.0, right: 50.0, bottom: 50.0, left: 70.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AxisTitles {
    pub x: String,
    pub y: String,
}

impl AxisTitles {
    fn new(x: &str, y: &str) -> Self {
        Self { x: x.to_string(), y: y.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoxplotConfig {
    pub margin: Margin,
    pub padding: f64,
    pub titles: AxisTitles,
    pub whisker_color: String,
    pub box_fill: String,
    pub box_stroke: String,
    pub median_color: String,
}

impl Default for BoxplotConfig {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            padding: 0.5,
            titles: AxisTitles::new("Platform", "Likes"),
            whisker_color: "black".to_string(),
            box_fill: "lightblue".to_string(),
            box_stroke: "black".to_string(),
            median_color: "red".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BarConfig {
    pub margin: Margin,
    /// Padding between platform groups
    pub outer_padding: f64,
    /// Padding between post type bars inside a group
    pub inner_padding: f64,
    pub palette: Vec<String>,
    pub titles: AxisTitles,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            margin: Margin::default(),
            outer_padding: 0.1,
            inner_padding: 0.05,
            palette: POST_TYPE_COLORS.iter().map(|c| c.to_string()).collect(),
            titles: AxisTitles::new("Platform", "Average Likes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LineConfig {
    pub margin: Margin,
    pub titles: AxisTitles,
    pub stroke: String,
    pub stroke_width: f64,
    pub point_radius: f64,
    pub point_color: String,
    /// `chrono` format for x axis tick labels
    pub tick_format: String,
    /// Rotation of x axis tick labels, in degrees
    pub tick_label_angle: f64,
    /// Polyline samples per spline segment when drawing
    pub curve_steps: usize,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            margin: Margin { bottom: 80.0, ..Margin::default() },
            titles: AxisTitles::new("Date", "Average Likes"),
            stroke: "steelblue".to_string(),
            stroke_width: 2.0,
            point_radius: 4.0,
            point_color: "orange".to_string(),
            tick_format: "%m/%d (%a)".to_string(),
            tick_label_angle: -25.0,
            curve_steps: 16,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    pub render: RenderOptions,
    pub boxplot: BoxplotConfig,
    pub barplot: BarConfig,
    pub lineplot: LineConfig,
    /// Approximate number of ticks on numeric and time axes
    pub tick_count: Option<usize>,
}

impl ChartConfig {
    pub const DEFAULT_TICK_COUNT: usize = 10;
    /// Largest accepted canvas width or height, in pixels
    pub const MAX_CANVAS_SIDE: u32 = 16_384;

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ChartConfig = serde_json::from_str(text).context("Invalid chart configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Failed to load config '{}'", path.display()))
    }

    pub fn tick_count(&self) -> usize {
        self.tick_count.unwrap_or(Self::DEFAULT_TICK_COUNT)
    }

    fn validate(&self) -> Result<()> {
        let (width, height) = (self.render.width, self.render.height);
        if width == 0 || height == 0 || width > Self::MAX_CANVAS_SIDE || height > Self::MAX_CANVAS_SIDE {
            anyhow::bail!(
                "canvas size {}x{} is out of range (each side must be 1..={})",
                width,
                height,
                Self::MAX_CANVAS_SIDE
            );
        }
        let margins = [
            ("boxplot", &self.boxplot.margin),
            ("barplot", &self.barplot.margin),
            ("lineplot", &self.lineplot.margin),
        ];
        for (chart, m) in margins {
            if m.left + m.right >= self.render.width as f64 || m.top + m.bottom >= self.render.height as f64 {
                anyhow::bail!("{} margins leave no room for the plot area", chart);
            }
        }
        if self.barplot.palette.is_empty() {
            anyhow::bail!("barplot palette must contain at least one color");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;

    #[test]
    fn test_defaults_match_reference_charts() {
        let config = ChartConfig::default();
        assert_eq!((config.render.width, config.render.height), (800, 400));
        assert_eq!(config.render.format, OutputFormat::Svg);
        assert_eq!(config.boxplot.margin, Margin { top: 50.0, right: 50.0, bottom: 50.0, left: 70.0 });
        assert_eq!(config.lineplot.margin.bottom, 80.0);
        assert_eq!(config.boxplot.padding, 0.5);
        assert_eq!(config.barplot.palette, vec!["#1f77b4", "#ff7f0e", "#2ca02c"]);
        assert_eq!(config.tick_count(), 10);
    }

    #[test]
    fn test_partial_json() {
        let config = ChartConfig::from_json_str(
            r#"{ "render": { "type": "png" }, "lineplot": { "point_color": "red", "margin": { "bottom": 60 } } }"#,
        )
        .unwrap();
        assert_eq!(config.render.format, OutputFormat::Png);
        assert_eq!(config.render.width, 800);
        assert_eq!(config.lineplot.point_color, "red");
        assert_eq!(config.lineplot.margin.bottom, 60.0);
        assert_eq!(config.lineplot.margin.left, 70.0);
        assert_eq!(config.lineplot.stroke, "steelblue");
    }

    #[test]
    fn test_rejects_bad_margins() {
        let result = ChartConfig::from_json_str(r#"{ "boxplot": { "margin": { "left": 900 } } }"#);
        assert!(format!("{:#}", result.unwrap_err()).contains("no room"));
    }

    #[test]
    fn test_rejects_oversized_canvas() {
        let result = ChartConfig::from_json_str(r#"{ "render": { "width": 100000, "height": 100000 } }"#);
        assert!(format!("{:#}", result.unwrap_err()).contains("out of range"));
        assert!(ChartConfig::from_json_str(r#"{ "render": { "width": 0 } }"#).is_err());
        assert!(ChartConfig::from_json_str(r#"{ "render": { "width": 16384, "height": 400 } }"#).is_ok());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(ChartConfig::from_json_str(r#"{ "render": { "type": "gif" } }"#).is_err());
    }
}
