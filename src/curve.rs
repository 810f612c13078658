//! Natural cubic spline through a sequence of points, as cubic Bézier segments.
//!
//! Each coordinate is solved independently with second derivatives of zero at
//! both ends, so the curve passes through every input point.

use serde::Serialize;

/// One cubic Bézier segment. The segment starts at the previous segment's
/// `to` (or the path start).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicSegment {
    pub c1: (f64, f64),
    pub c2: (f64, f64),
    pub to: (f64, f64),
}

/// A smoothed path: start point plus Bézier segments
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurvePath {
    pub start: Option<(f64, f64)>,
    pub segments: Vec<CubicSegment>,
}

impl CurvePath {
    /// The same path moved by `(dx, dy)`
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mv = |p: (f64, f64)| (p.0 + dx, p.1 + dy);
        CurvePath {
            start: self.start.map(mv),
            segments: self
                .segments
                .iter()
                .map(|s| CubicSegment { c1: mv(s.c1), c2: mv(s.c2), to: mv(s.to) })
                .collect(),
        }
    }
}

/// Control points `(a, b)` for one coordinate, per Thomas-algorithm solve of
/// the natural spline system
fn control_points(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len() - 1;
    let mut a = vec![0.0; n];
    let mut b = vec![0.0; n];
    let mut r = vec![0.0; n];

    a[0] = 0.0;
    b[0] = 2.0;
    r[0] = x[0] + 2.0 * x[1];
    for i in 1..n.saturating_sub(1) {
        a[i] = 1.0;
        b[i] = 4.0;
        r[i] = 4.0 * x[i] + 2.0 * x[i + 1];
    }
    a[n - 1] = 2.0;
    b[n - 1] = 7.0;
    r[n - 1] = 8.0 * x[n - 1] + x[n];

    for i in 1..n {
        let m = a[i] / b[i - 1];
        b[i] -= m;
        r[i] -= m * r[i - 1];
    }

    a[n - 1] = r[n - 1] / b[n - 1];
    for i in (0..n.saturating_sub(1)).rev() {
        a[i] = (r[i] - a[i + 1]) / b[i];
    }

    b[n - 1] = (x[n] + a[n - 1]) / 2.0;
    for i in 0..n.saturating_sub(1) {
        b[i] = 2.0 * x[i + 1] - a[i + 1];
    }

    (a, b)
}

/// Smooth path through `points`. Two points give a straight segment; fewer
/// give no segments.
pub fn natural_curve(points: &[(f64, f64)]) -> CurvePath {
    let start = points.first().copied();

    let segments = match points.len() {
        0 | 1 => Vec::new(),
        2 => {
            let (p0, p1) = (points[0], points[1]);
            vec![CubicSegment { c1: p0, c2: p1, to: p1 }]
        }
        _ => {
            let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
            let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
            let (ax, bx) = control_points(&xs);
            let (ay, by) = control_points(&ys);

            (0..points.len() - 1)
                .map(|i| CubicSegment {
                    c1: (ax[i], ay[i]),
                    c2: (bx[i], by[i]),
                    to: points[i + 1],
                })
                .collect()
        }
    };

    CurvePath { start, segments }
}

/// Evaluate a cubic Bézier at `t` in `[0, 1]`
pub fn bezier_point(from: (f64, f64), seg: &CubicSegment, t: f64) -> (f64, f64) {
    let u = 1.0 - t;
    let w0 = u * u * u;
    let w1 = 3.0 * u * u * t;
    let w2 = 3.0 * u * t * t;
    let w3 = t * t * t;
    (
        w0 * from.0 + w1 * seg.c1.0 + w2 * seg.c2.0 + w3 * seg.to.0,
        w0 * from.1 + w1 * seg.c1.1 + w2 * seg.c2.1 + w3 * seg.to.1,
    )
}

/// Approximate the path with a polyline, `steps` samples per segment
pub fn flatten(path: &CurvePath, steps: usize) -> Vec<(f64, f64)> {
    let Some(start) = path.start else {
        return Vec::new();
    };
    let steps = steps.max(1);

    let mut out = Vec::with_capacity(1 + path.segments.len() * steps);
    out.push(start);
    let mut from = start;
    for seg in &path.segments {
        for s in 1..=steps {
            let t = s as f64 / steps as f64;
            out.push(if s == steps { seg.to } else { bezier_point(from, seg, t) });
        }
        from = seg.to;
    }
    out
}
