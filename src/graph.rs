use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use serde::Serialize;

use crate::curve;
use crate::ir::{Axis, AxisOrient, DrawCommand, SceneGraph};
use crate::OutputFormat;

/// Style configuration for line primitives
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub alpha: Option<f64>,
}

/// Style configuration for point markers (circles)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub alpha: Option<f64>,
}

/// Style configuration for rectangles
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarStyle {
    pub color: Option<String>,
    pub stroke: Option<String>,
    pub alpha: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

/// Style configuration for text labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub size: f64,
    pub color: Option<String>,
    pub anchor: TextAnchor,
    /// Degrees, negative is counter-clockwise
    pub rotation: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self { size: 12.0, color: None, anchor: TextAnchor::Middle, rotation: 0.0 }
    }
}

// =============================================================================
// Scene rendering
// =============================================================================

/// Render a scene graph to encoded SVG text or PNG bytes
pub fn render_scene(scene: &SceneGraph, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Svg => render_svg(scene).map(String::into_bytes),
        OutputFormat::Png => render_png(scene),
    }
}

pub fn render_svg(scene: &SceneGraph) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

/// Bytes in an RGB buffer of `width` by `height` pixels
fn rgb_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

fn render_png(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; rgb_buffer_len(scene.width, scene.height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    for command in &scene.commands {
        draw_command(root, command)?;
    }
    for axis in &scene.axes {
        draw_axis(root, axis)?;
    }

    Ok(())
}

fn draw_command<DB>(root: &DrawingArea<DB, Shift>, command: &DrawCommand) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    match command {
        DrawCommand::DrawLine { points, style } => {
            draw_polyline(root, points, style)?;
        }
        DrawCommand::DrawCurve { path, steps, style } => {
            let points = curve::flatten(path, *steps);
            draw_polyline(root, &points, style)?;
        }
        DrawCommand::DrawPoint { points, style } => {
            let color = parse_color(&style.color).mix(style.alpha.unwrap_or(1.0));
            let radius = style.size.unwrap_or(3.0).round() as i32;
            for p in points {
                root.draw(&Circle::new(pixel(*p), radius, color.filled()))
                    .context("Failed to draw point")?;
            }
        }
        DrawCommand::DrawRect { tl, br, style, .. } => {
            let corners = [pixel(*tl), pixel(*br)];
            if let Some(fill) = &style.color {
                let color = parse_color_str(fill).mix(style.alpha.unwrap_or(1.0));
                root.draw(&Rectangle::new(corners, color.filled()))
                    .context("Failed to draw rectangle")?;
            }
            if let Some(stroke) = &style.stroke {
                root.draw(&Rectangle::new(corners, parse_color_str(stroke).stroke_width(1)))
                    .context("Failed to draw rectangle outline")?;
            }
        }
        DrawCommand::DrawText { pos, text, style } => {
            draw_text(root, text, *pos, style)?;
        }
    }
    Ok(())
}

fn draw_polyline<DB>(root: &DrawingArea<DB, Shift>, points: &[(f64, f64)], style: &LineStyle) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if points.len() < 2 {
        return Ok(());
    }
    let color = parse_color(&style.color).mix(style.alpha.unwrap_or(1.0));
    let width = style.width.unwrap_or(1.0).round().max(1.0) as u32;
    let pixels: Vec<(i32, i32)> = points.iter().map(|p| pixel(*p)).collect();
    root.draw(&PathElement::new(pixels, color.stroke_width(width)))
        .context("Failed to draw line")?;
    Ok(())
}

fn draw_text<DB>(root: &DrawingArea<DB, Shift>, text: &str, pos: (f64, f64), style: &TextStyle) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let hpos = match style.anchor {
        TextAnchor::Start => HPos::Left,
        TextAnchor::Middle => HPos::Center,
        TextAnchor::End => HPos::Right,
    };
    // Quarter turns are the only rotations plotters can express; others
    // keep the anchor and render level.
    let transform = match style.rotation.round() as i64 {
        -90 | 270 => FontTransform::Rotate270,
        90 => FontTransform::Rotate90,
        180 | -180 => FontTransform::Rotate180,
        _ => FontTransform::None,
    };
    let font = ("sans-serif", style.size)
        .into_font()
        .transform(transform)
        .color(&parse_color(&style.color))
        .pos(Pos::new(hpos, VPos::Center));

    root.draw(&Text::new(text.to_string(), pixel(pos), font))
        .context("Failed to draw text")?;
    Ok(())
}

fn draw_axis<DB>(root: &DrawingArea<DB, Shift>, axis: &Axis) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let line = BLACK.stroke_width(1);
    root.draw(&PathElement::new(vec![pixel(axis.origin), pixel(axis.end())], line))
        .context("Failed to draw axis")?;

    for tick in &axis.ticks {
        let (x, y) = axis.tick_anchor(tick);
        let (tick_end, label_pos) = match axis.orient {
            AxisOrient::Bottom => ((x, y + axis.tick_size), (x, y + axis.tick_size + 9.0)),
            AxisOrient::Left => ((x - axis.tick_size, y), (x - axis.tick_size - 3.0, y)),
        };
        root.draw(&PathElement::new(vec![pixel((x, y)), pixel(tick_end)], line))
            .context("Failed to draw tick")?;
        draw_text(root, &tick.label, label_pos, &axis.label_style)?;
    }
    Ok(())
}

fn pixel(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

/// Parse color string to RGBColor
fn parse_color(color_str: &Option<String>) -> RGBColor {
    match color_str.as_deref() {
        Some(s) => parse_color_str(s),
        None => BLACK,
    }
}

/// Named colors used by the chart defaults, `#rgb` and `#rrggbb`.
/// Unknown names fall back to black.
pub fn parse_color_str(s: &str) -> RGBColor {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).unwrap_or(BLACK);
    }
    match s.to_ascii_lowercase().as_str() {
        "red" => RED,
        "green" => RGBColor(0, 128, 0),
        "blue" => BLUE,
        "black" => BLACK,
        "white" => WHITE,
        "yellow" => YELLOW,
        "cyan" => CYAN,
        "magenta" => MAGENTA,
        "gray" | "grey" => RGBColor(128, 128, 128),
        "orange" => RGBColor(255, 165, 0),
        "steelblue" => RGBColor(70, 130, 180),
        "lightblue" => RGBColor(173, 216, 230),
        _ => BLACK,
    }
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(RGBColor(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(RGBColor(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::natural_curve;
    use crate::scale::Tick;

    fn sample_scene() -> SceneGraph {
        let mut scene = SceneGraph::new(200, 100);
        scene.commands.push(DrawCommand::DrawRect {
            tl: (20.0, 20.0),
            br: (60.0, 80.0),
            style: BarStyle {
                color: Some("lightblue".into()),
                stroke: Some("black".into()),
                alpha: None,
            },
        });
        scene.commands.push(DrawCommand::DrawCurve {
            path: natural_curve(&[(10.0, 90.0), (100.0, 40.0), (190.0, 60.0)]),
            steps: 8,
            style: LineStyle { color: Some("steelblue".into()), width: Some(2.0), alpha: None },
        });
        scene.axes.push(Axis {
            orient: AxisOrient::Bottom,
            origin: (10.0, 90.0),
            length: 180.0,
            ticks: vec![Tick { position: 40.0, label: "A".into() }],
            tick_size: Axis::TICK_SIZE,
            label_style: TextStyle::default(),
        });
        scene
    }

    #[test]
    fn test_parse_color_str() {
        assert_eq!(parse_color_str("#1f77b4"), RGBColor(0x1f, 0x77, 0xb4));
        assert_eq!(parse_color_str("#fff"), RGBColor(255, 255, 255));
        assert_eq!(parse_color_str("SteelBlue"), RGBColor(70, 130, 180));
        assert_eq!(parse_color_str("not-a-color"), BLACK);
        assert_eq!(parse_color_str("#zzzzzz"), BLACK);
        assert_eq!(parse_color(&None), BLACK);
    }

    #[test]
    fn test_render_svg() {
        let svg = render_svg(&sample_scene()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<rect"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_rgb_buffer_len_does_not_wrap() {
        assert_eq!(rgb_buffer_len(800, 400), 960_000);
        assert_eq!(rgb_buffer_len(70_000, 70_000), 14_700_000_000);
    }

    #[test]
    fn test_render_scene_svg_bytes() {
        let bytes = render_scene(&SceneGraph::new(50, 50), OutputFormat::Svg).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
    }
}
