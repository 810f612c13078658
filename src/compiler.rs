use anyhow::Result;
use serde::Serialize;

use crate::config::{AxisTitles, ChartConfig};
use crate::curve::{natural_curve, CurvePath};
use crate::graph::{BarStyle, LineStyle, PointStyle, TextAnchor, TextStyle};
use crate::ir::{Axis, AxisOrient, DrawCommand, PlotArea, SceneGraph};
use crate::records::{ChartKind, Record};
use crate::scale::{self, BarScales, BoxplotScales, LineScales, Tick};
use crate::transform::{aggregate, GroupedQuantiles};

// =============================================================================
// Geometry (plot-area pixels)
// =============================================================================

/// One box-and-whisker glyph. The whisker spans min to max at the band
/// center; the box spans q1 to q3 across the full band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGeometry {
    pub platform: String,
    pub whisker: [(f64, f64); 2],
    pub box_tl: (f64, f64),
    pub box_br: (f64, f64),
    pub median: [(f64, f64); 2],
}

pub fn boxplot_geometry(quantiles: &GroupedQuantiles, scales: &BoxplotScales) -> Vec<BoxGeometry> {
    let bandwidth = scales.x.bandwidth();
    quantiles
        .iter()
        .filter_map(|(platform, q)| {
            let x = scales.x.map(platform)?;
            let center = x + bandwidth / 2.0;
            let y = |v: f64| scales.y.map(v);
            Some(BoxGeometry {
                platform: platform.to_string(),
                whisker: [(center, y(q.min)), (center, y(q.max))],
                box_tl: (x, y(q.q3)),
                box_br: (x + bandwidth, y(q.q1)),
                median: [(x, y(q.median)), (x + bandwidth, y(q.median))],
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGeometry {
    pub platform: String,
    pub post_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

/// One bar per record, offset inside its platform band by post type.
/// Records without a finite `avg_likes` produce no bar.
pub fn bar_geometry(records: &[Record], scales: &BarScales) -> Vec<BarGeometry> {
    let baseline = scales.y.range.0;
    let mut skipped = 0usize;

    let bars: Vec<BarGeometry> = records
        .iter()
        .filter_map(|r| {
            let value = r.avg_likes.filter(|v| v.is_finite());
            let (Some(value), Some(x0), Some(x1)) = (
                value,
                scales.x0.map(r.platform_key()),
                scales.x1.map(r.post_type_key()),
            ) else {
                skipped += 1;
                return None;
            };
            let y = scales.y.map(value);
            Some(BarGeometry {
                platform: r.platform_key().to_string(),
                post_type: r.post_type_key().to_string(),
                x: x0 + x1,
                y,
                width: scales.x1.bandwidth(),
                height: baseline - y,
                color: scales.color.get(r.post_type_key()).unwrap_or("black").to_string(),
            })
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(skipped, "Bars without a numeric value were not drawn");
    }
    bars
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineGeometry {
    /// Sample positions in record order
    pub points: Vec<(f64, f64)>,
    pub path: CurvePath,
    /// Records left out for an invalid date or non-finite value
    pub dropped: usize,
}

pub fn line_geometry(records: &[Record], scales: &LineScales) -> LineGeometry {
    let mut dropped = 0usize;
    let points: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| match (r.date, r.avg_likes.filter(|v| v.is_finite())) {
            (Some(date), Some(value)) => Some((scales.x.map(date), scales.y.map(value))),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        tracing::warn!(dropped, "Samples with an invalid date or value were left out of the line");
    }
    LineGeometry { path: natural_curve(&points), points, dropped }
}

// =============================================================================
// Scene assembly
// =============================================================================

fn axis_label_style(anchor: TextAnchor, rotation: f64) -> TextStyle {
    TextStyle { size: 10.0, anchor, rotation, ..TextStyle::default() }
}

fn bottom_axis(area: &PlotArea, ticks: Vec<Tick>, label_style: TextStyle) -> Axis {
    Axis {
        orient: AxisOrient::Bottom,
        origin: area.to_canvas((0.0, area.height)),
        length: area.width,
        ticks,
        tick_size: Axis::TICK_SIZE,
        label_style,
    }
}

fn left_axis(area: &PlotArea, ticks: Vec<Tick>) -> Axis {
    Axis {
        orient: AxisOrient::Left,
        origin: area.to_canvas((0.0, 0.0)),
        length: area.height,
        ticks,
        tick_size: Axis::TICK_SIZE,
        label_style: axis_label_style(TextAnchor::End, 0.0),
    }
}

/// Axis titles: x centered below the plot, y rotated along the left edge
fn axis_titles(area: &PlotArea, titles: &AxisTitles, x_offset_from_bottom: f64) -> [DrawCommand; 2] {
    let m = area.margin;
    let style = TextStyle { size: 12.0, ..TextStyle::default() };
    [
        DrawCommand::DrawText {
            pos: (m.left + area.width / 2.0, m.top + area.height + m.bottom - x_offset_from_bottom),
            text: titles.x.clone(),
            style: style.clone(),
        },
        DrawCommand::DrawText {
            pos: (20.0, m.top + area.height / 2.0),
            text: titles.y.clone(),
            style: TextStyle { rotation: -90.0, ..style },
        },
    ]
}

fn shift(area: &PlotArea, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points.iter().map(|p| area.to_canvas(*p)).collect()
}

pub fn compile_boxplot(records: &[Record], config: &ChartConfig) -> Result<SceneGraph> {
    let cfg = &config.boxplot;
    let area = PlotArea::new(config.render.width, config.render.height, cfg.margin);
    let quantiles = aggregate(records)?;
    let scales = scale::build_boxplot_scales(records, &area, cfg.padding)?;

    let mut scene = SceneGraph::new(config.render.width, config.render.height);
    let whisker_style = LineStyle { color: Some(cfg.whisker_color.clone()), width: Some(1.0), alpha: None };
    let box_style = BarStyle {
        color: Some(cfg.box_fill.clone()),
        stroke: Some(cfg.box_stroke.clone()),
        alpha: None,
    };
    let median_style = LineStyle { color: Some(cfg.median_color.clone()), width: Some(1.0), alpha: None };

    for glyph in boxplot_geometry(&quantiles, &scales) {
        scene.commands.push(DrawCommand::DrawLine { points: shift(&area, &glyph.whisker), style: whisker_style.clone() });
        scene.commands.push(DrawCommand::DrawRect {
            tl: area.to_canvas(glyph.box_tl),
            br: area.to_canvas(glyph.box_br),
            style: box_style.clone(),
        });
        scene.commands.push(DrawCommand::DrawLine { points: shift(&area, &glyph.median), style: median_style.clone() });
    }

    scene.commands.extend(axis_titles(&area, &cfg.titles, 10.0));
    scene.axes.push(bottom_axis(&area, scales.x.ticks(), axis_label_style(TextAnchor::Middle, 0.0)));
    scene.axes.push(left_axis(&area, scales.y.ticks(config.tick_count())));
    Ok(scene)
}

pub fn compile_bar_chart(records: &[Record], config: &ChartConfig) -> Result<SceneGraph> {
    let cfg = &config.barplot;
    let area = PlotArea::new(config.render.width, config.render.height, cfg.margin);
    let scales = scale::build_bar_scales(records, &area, cfg)?;

    let mut scene = SceneGraph::new(config.render.width, config.render.height);
    for bar in bar_geometry(records, &scales) {
        scene.commands.push(DrawCommand::DrawRect {
            tl: area.to_canvas((bar.x, bar.y)),
            br: area.to_canvas((bar.x + bar.width, bar.y + bar.height)),
            style: BarStyle { color: Some(bar.color), stroke: None, alpha: None },
        });
    }

    scene.commands.extend(axis_titles(&area, &cfg.titles, 10.0));
    scene.axes.push(bottom_axis(&area, scales.x0.ticks(), axis_label_style(TextAnchor::Middle, 0.0)));
    scene.axes.push(left_axis(&area, scales.y.ticks(config.tick_count())));
    Ok(scene)
}

pub fn compile_line_chart(records: &[Record], config: &ChartConfig) -> Result<SceneGraph> {
    let cfg = &config.lineplot;
    let area = PlotArea::new(config.render.width, config.render.height, cfg.margin);
    let scales = scale::build_line_scales(records, &area)?;
    let geometry = line_geometry(records, &scales);

    let mut scene = SceneGraph::new(config.render.width, config.render.height);
    let points = shift(&area, &geometry.points);
    scene.commands.push(DrawCommand::DrawCurve {
        path: geometry.path.translated(area.margin.left, area.margin.top),
        steps: cfg.curve_steps,
        style: LineStyle { color: Some(cfg.stroke.clone()), width: Some(cfg.stroke_width), alpha: None },
    });
    scene.commands.push(DrawCommand::DrawPoint {
        points,
        style: PointStyle { color: Some(cfg.point_color.clone()), size: Some(cfg.point_radius), alpha: None },
    });

    scene.commands.extend(axis_titles(&area, &cfg.titles, 20.0));
    let tick_style = axis_label_style(TextAnchor::End, cfg.tick_label_angle);
    scene.axes.push(bottom_axis(&area, scales.x.ticks(config.tick_count(), &cfg.tick_format), tick_style));
    scene.axes.push(left_axis(&area, scales.y.ticks(config.tick_count())));
    Ok(scene)
}

/// Compile the scene for one chart
pub fn build_scene(kind: ChartKind, records: &[Record], config: &ChartConfig) -> Result<SceneGraph> {
    match kind {
        ChartKind::Boxplot => compile_boxplot(records, config),
        ChartKind::GroupedBar => compile_bar_chart(records, config),
        ChartKind::Line => compile_line_chart(records, config),
    }
}
