//! Scales mapping data values to pixel positions.
//!
//! - [`BandScale`]: categories to padded, equally sized bands
//! - [`LinearScale`]: numbers to pixels through an affine transform
//! - [`TimeScale`]: calendar dates to pixels, linear in days
//!
//! Scales are built once per chart from the full dataset and never mutated.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::config::BarConfig;
use crate::error::{ChartError, ChartResult};
use crate::ir::PlotArea;
use crate::palette::OrdinalColorScale;
use crate::records::Record;
use crate::transform::distinct;

/// A tick position in pixel space plus its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

// =============================================================================
// Band
// =============================================================================

/// Maps categories to contiguous bands across a pixel range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    domain: Vec<String>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    /// Band scale with the same inner and outer padding, centered in the range
    pub fn new<I, S>(domain: I, range: (f64, f64), padding: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_paddings(domain, range, padding, padding, 0.5)
    }

    pub fn with_paddings<I, S>(
        domain: I,
        range: (f64, f64),
        padding_inner: f64,
        padding_outer: f64,
        align: f64,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owned: Vec<String> = domain.into_iter().map(|s| s.as_ref().to_string()).collect();
        let domain = distinct(owned.iter().map(String::as_str));

        let padding_inner = padding_inner.clamp(0.0, 1.0);
        let padding_outer = padding_outer.max(0.0);
        let align = align.clamp(0.0, 1.0);

        let n = domain.len() as f64;
        let (r0, r1) = range;
        let reverse = r1 < r0;
        let (lo, hi) = if reverse { (r1, r0) } else { (r0, r1) };

        let step = (hi - lo) / (n - padding_inner + padding_outer * 2.0).max(1.0);
        let start = lo + (hi - lo - step * (n - padding_inner)) * align;
        let bandwidth = step * (1.0 - padding_inner);

        // A reversed range lays bands out right to left
        let (start, step) = if reverse {
            (hi - (start - lo) - bandwidth, -step)
        } else {
            (start, step)
        };

        Self { domain, range, padding_inner, padding_outer, align, start, step, bandwidth }
    }

    /// Start of the band for `key`, or `None` for an unknown category
    pub fn map(&self, key: &str) -> Option<f64> {
        self.index_of(key).map(|i| self.start + i as f64 * self.step)
    }

    /// Center of the band for `key`
    pub fn center(&self, key: &str) -> Option<f64> {
        self.map(key).map(|x| x + self.bandwidth / 2.0)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.domain.iter().position(|d| d == key)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step.abs()
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// One tick per category, at the band center
    pub fn ticks(&self) -> Vec<Tick> {
        self.domain
            .iter()
            .filter_map(|key| self.center(key).map(|position| Tick { position, label: key.clone() }))
            .collect()
    }
}

// =============================================================================
// Linear
// =============================================================================

/// Affine map from a numeric domain to a pixel range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Domain `[0, max(values)]`. `NaN` values are ignored; with no values the
    /// domain collapses to `[0, 0]`.
    pub fn zero_based<I>(values: I, range: (f64, f64)) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let max = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
        Self::new((0.0, max.unwrap_or(0.0)), range)
    }

    /// Map a domain value to the range. A degenerate domain maps everything
    /// to the middle of the range.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 || !span.is_finite() {
            if d1.is_nan() { f64::NAN } else { 0.5 }
        } else {
            (value - d0) / span
        };
        r0 + t * (r1 - r0)
    }

    /// Map a range value back into the domain
    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Round tick values covering the domain, about `count` of them
    pub fn tick_values(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        let (start, stop) = if d1 < d0 { (d1, d0) } else { (d0, d1) };
        if !start.is_finite() || !stop.is_finite() || count == 0 {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }

        let Some((i1, i2, inc)) = tick_spec(start, stop, count as f64) else {
            return Vec::new();
        };
        if i2 < i1 {
            return Vec::new();
        }

        (i1..=i2)
            .map(|i| if inc < 0.0 { i as f64 / -inc } else { i as f64 * inc })
            .collect()
    }

    pub fn ticks(&self, count: usize) -> Vec<Tick> {
        let values = self.tick_values(count);
        let step = if values.len() > 1 { values[1] - values[0] } else { 1.0 };
        values
            .into_iter()
            .map(|v| Tick { position: self.map(v), label: format_tick(v, step) })
            .collect()
    }
}

/// Integer tick bounds and increment. A negative increment means the ticks
/// are `i / -inc`, which keeps fractional steps exact.
fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(1.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc) = if power < 0.0 {
        let inc = 10f64.powf(-power) / factor;
        let mut i1 = (start * inc).round();
        let mut i2 = (stop * inc).round();
        if i1 / inc < start { i1 += 1.0; }
        if i2 / inc > stop { i2 -= 1.0; }
        (i1, i2, -inc)
    } else {
        let inc = 10f64.powf(power) * factor;
        let mut i1 = (start / inc).round();
        let mut i2 = (stop / inc).round();
        if i1 * inc < start { i1 += 1.0; }
        if i2 * inc > stop { i2 -= 1.0; }
        (i1, i2, inc)
    };

    if !inc.is_finite() || inc == 0.0 {
        return None;
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    // Keep the integer conversion in range
    i1 = i1.clamp(i64::MIN as f64, i64::MAX as f64);
    i2 = i2.clamp(i64::MIN as f64, i64::MAX as f64);
    Some((i1 as i64, i2 as i64, inc))
}

/// Format a tick value with thousands separators and as many decimals as the
/// tick step needs
pub fn format_tick(value: f64, step: f64) -> String {
    let step = step.abs();
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    let text = format!("{:.*}", decimals, value);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("−", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    // Negative zero prints without a sign
    let sign = if grouped.chars().all(|c| c == '0' || c == ',') && frac_part.map_or(true, |f| f.chars().all(|c| c == '0')) {
        ""
    } else {
        sign
    };

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

// =============================================================================
// Time
// =============================================================================

/// Linear map from a date extent to a pixel range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeScale {
    pub domain: (NaiveDate, NaiveDate),
    pub range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (NaiveDate, NaiveDate), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Domain `[min(date), max(date)]` over the valid dates
    pub fn from_extent<I>(dates: I, range: (f64, f64)) -> ChartResult<Self>
    where
        I: IntoIterator<Item = Option<NaiveDate>>,
    {
        let mut extent: Option<(NaiveDate, NaiveDate)> = None;
        for date in dates.into_iter().flatten() {
            extent = Some(match extent {
                Some((lo, hi)) => (lo.min(date), hi.max(date)),
                None => (date, date),
            });
        }
        let domain = extent.ok_or(ChartError::EmptyDomain { scale: "time" })?;
        Ok(Self::new(domain, range))
    }

    fn linear(&self) -> LinearScale {
        LinearScale::new((0.0, self.span_days()), self.range)
    }

    fn span_days(&self) -> f64 {
        (self.domain.1 - self.domain.0).num_days() as f64
    }

    pub fn map(&self, date: NaiveDate) -> f64 {
        self.linear().map((date - self.domain.0).num_days() as f64)
    }

    /// Calendar dates at regular intervals inside the domain
    pub fn tick_values(&self, count: usize) -> Vec<NaiveDate> {
        let (start, stop) = self.domain;
        if count == 0 {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let interval = TimeInterval::for_target(self.span_days() / count as f64, self.span_days(), count);
        interval.dates_between(start, stop)
    }

    /// Ticks labelled with a `chrono` format string such as `%m/%d (%a)`
    pub fn ticks(&self, count: usize, format: &str) -> Vec<Tick> {
        self.tick_values(count)
            .into_iter()
            .map(|d| Tick { position: self.map(d), label: d.format(format).to_string() })
            .collect()
    }
}

/// Tick intervals from shortest to longest
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeInterval {
    Days(u32),
    Week,
    Months(u32),
    Years(i32),
}

impl TimeInterval {
    const CANDIDATES: [(TimeInterval, f64); 5] = [
        (TimeInterval::Days(1), 1.0),
        (TimeInterval::Days(2), 2.0),
        (TimeInterval::Week, 7.0),
        (TimeInterval::Months(1), 30.0),
        (TimeInterval::Months(3), 90.0),
    ];

    /// Pick the interval whose length is closest (by ratio) to `target` days
    pub fn for_target(target: f64, span_days: f64, count: usize) -> Self {
        let idx = Self::CANDIDATES.iter().position(|(_, days)| *days > target);
        match idx {
            Some(0) => TimeInterval::Days(1),
            Some(i) => {
                let (below, below_days) = Self::CANDIDATES[i - 1];
                let (above, above_days) = Self::CANDIDATES[i];
                if target / below_days < above_days / target { below } else { above }
            }
            None => {
                let years = LinearScale::new((0.0, span_days / 365.0), (0.0, 1.0)).tick_values(count);
                let step = if years.len() > 1 { (years[1] - years[0]).round() } else { 1.0 };
                TimeInterval::Years((step as i32).max(1))
            }
        }
    }

    fn contains(&self, date: NaiveDate) -> bool {
        match self {
            TimeInterval::Days(k) => (date.day() - 1) % k == 0,
            TimeInterval::Week => date.weekday() == Weekday::Sun,
            TimeInterval::Months(k) => date.day() == 1 && (date.month() - 1) % k == 0,
            TimeInterval::Years(k) => date.ordinal() == 1 && date.year().rem_euclid(*k) == 0,
        }
    }

    /// Every boundary of this interval within `[start, stop]`
    pub fn dates_between(&self, start: NaiveDate, stop: NaiveDate) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut date = start;
        while date <= stop {
            if self.contains(date) {
                out.push(date);
            }
            date += match self {
                // Coarse intervals only land on the first of a month
                TimeInterval::Months(_) | TimeInterval::Years(_) if date.day() == 1 => {
                    let next = date.checked_add_months(chrono::Months::new(1));
                    match next {
                        Some(next) => next - date,
                        None => break,
                    }
                }
                _ => Duration::days(1),
            };
        }
        out
    }
}

// =============================================================================
// Chart scale sets
// =============================================================================

/// Scales of the boxplot: platform bands and a zero-based likes axis
#[derive(Debug, Clone, Serialize)]
pub struct BoxplotScales {
    pub x: BandScale,
    pub y: LinearScale,
}

/// Scales of the grouped bar chart. `x1` subdivides one `x0` band.
#[derive(Debug, Clone, Serialize)]
pub struct BarScales {
    pub x0: BandScale,
    pub x1: BandScale,
    pub y: LinearScale,
    pub color: OrdinalColorScale,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineScales {
    pub x: TimeScale,
    pub y: LinearScale,
}

fn require_records(records: &[Record]) -> ChartResult<()> {
    if records.is_empty() {
        return Err(ChartError::EmptyInput);
    }
    Ok(())
}

pub fn build_boxplot_scales(records: &[Record], area: &PlotArea, padding: f64) -> ChartResult<BoxplotScales> {
    require_records(records)?;
    let x = BandScale::new(records.iter().map(Record::platform_key), (0.0, area.width), padding);
    let y = LinearScale::zero_based(records.iter().filter_map(|r| r.likes), (area.height, 0.0));
    tracing::debug!(platforms = ?x.domain(), y_domain = ?y.domain, "Boxplot scales");
    Ok(BoxplotScales { x, y })
}

pub fn build_bar_scales(records: &[Record], area: &PlotArea, config: &BarConfig) -> ChartResult<BarScales> {
    require_records(records)?;
    let x0 = BandScale::new(records.iter().map(Record::platform_key), (0.0, area.width), config.outer_padding);
    let post_types = distinct(records.iter().map(Record::post_type_key));
    let x1 = BandScale::new(&post_types, (0.0, x0.bandwidth()), config.inner_padding);
    let y = LinearScale::zero_based(records.iter().filter_map(|r| r.avg_likes), (area.height, 0.0));
    let color = OrdinalColorScale::with_domain(&post_types, config.palette.iter().cloned());
    tracing::debug!(platforms = ?x0.domain(), post_types = ?post_types, y_domain = ?y.domain, "Bar scales");
    Ok(BarScales { x0, x1, y, color })
}

/// The y domain covers every record, including those with unparseable dates
pub fn build_line_scales(records: &[Record], area: &PlotArea) -> ChartResult<LineScales> {
    require_records(records)?;
    let x = TimeScale::from_extent(records.iter().map(|r| r.date), (0.0, area.width))?;
    let y = LinearScale::zero_based(records.iter().filter_map(|r| r.avg_likes), (area.height, 0.0));
    tracing::debug!(x_domain = ?x.domain, y_domain = ?y.domain, "Line scales");
    Ok(LineScales { x, y })
}
