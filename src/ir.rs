use serde::Serialize;

use crate::config::Margin;
use crate::curve::CurvePath;
use crate::graph::{BarStyle, LineStyle, PointStyle, TextStyle};
use crate::scale::Tick;

// =============================================================================
// Layout
// =============================================================================

/// Inner plot rectangle: the canvas minus its margins. Geometry is computed in
/// this frame with the origin at the top-left corner of the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl PlotArea {
    pub fn new(canvas_width: u32, canvas_height: u32, margin: Margin) -> Self {
        Self {
            width: (canvas_width as f64 - margin.left - margin.right).max(0.0),
            height: (canvas_height as f64 - margin.top - margin.bottom).max(0.0),
            margin,
        }
    }

    /// Plot-area point to canvas point
    pub fn to_canvas(&self, p: (f64, f64)) -> (f64, f64) {
        (p.0 + self.margin.left, p.1 + self.margin.top)
    }
}

// =============================================================================
// Scene Graph
// =============================================================================

/// Primitive drawing commands in canvas pixels.
/// The backend executes these without further computation.
#[derive(Debug, Clone, Serialize)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
    pub axes: Vec<Axis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrient {
    Bottom,
    Left,
}

/// An axis line with ticks. `origin` is the canvas point where the axis
/// starts; tick positions are offsets along the axis from that point.
#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub orient: AxisOrient,
    pub origin: (f64, f64),
    pub length: f64,
    pub ticks: Vec<Tick>,
    pub tick_size: f64,
    pub label_style: TextStyle,
}

impl Axis {
    pub const TICK_SIZE: f64 = 6.0;

    /// Canvas point of a tick on the axis line
    pub fn tick_anchor(&self, tick: &Tick) -> (f64, f64) {
        match self.orient {
            AxisOrient::Bottom => (self.origin.0 + tick.position, self.origin.1),
            AxisOrient::Left => (self.origin.0, self.origin.1 + tick.position),
        }
    }

    /// End point of the axis line
    pub fn end(&self) -> (f64, f64) {
        match self.orient {
            AxisOrient::Bottom => (self.origin.0 + self.length, self.origin.1),
            AxisOrient::Left => (self.origin.0, self.origin.1 + self.length),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        style: PointStyle,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        style: BarStyle,
    },
    /// Smooth curve; the backend flattens it into `steps` samples per segment
    DrawCurve {
        path: CurvePath,
        steps: usize,
        style: LineStyle,
    },
    DrawText {
        pos: (f64, f64),
        text: String,
        style: TextStyle,
    },
}

impl SceneGraph {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, commands: Vec::new(), axes: Vec::new() }
    }

    pub fn rects(&self) -> impl Iterator<Item = (&(f64, f64), &(f64, f64), &BarStyle)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::DrawRect { tl, br, style, .. } => Some((tl, br, style)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::DrawText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
