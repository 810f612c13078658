//! Typed records and the permissive coercion applied while loading them.
//!
//! Numeric fields behave like a unary-plus cast: text that does not look like a
//! number becomes `NaN` instead of failing the load. Dates that do not match
//! `M/D/YYYY (Weekday)` become `None`. Only a missing column is a hard error.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::csv_reader;
use crate::data::PlotData;
use crate::parser::parse_post_date;

/// The three charts, each reading its own dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Dataset A: `Platform`, `Likes`
    Boxplot,
    /// Dataset B: `Platform`, `PostType`, `AvgLikes`
    #[serde(rename = "barplot")]
    #[value(name = "barplot")]
    GroupedBar,
    /// Dataset C: `Date`, `AvgLikes`
    #[serde(rename = "lineplot")]
    #[value(name = "lineplot")]
    Line,
}

pub const PLATFORM_COLUMN: &str = "Platform";
pub const POST_TYPE_COLUMN: &str = "PostType";
pub const LIKES_COLUMN: &str = "Likes";
pub const AVG_LIKES_COLUMN: &str = "AvgLikes";
pub const DATE_COLUMN: &str = "Date";

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Boxplot, ChartKind::GroupedBar, ChartKind::Line];

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            ChartKind::Boxplot => &[PLATFORM_COLUMN, LIKES_COLUMN],
            ChartKind::GroupedBar => &[PLATFORM_COLUMN, POST_TYPE_COLUMN, AVG_LIKES_COLUMN],
            ChartKind::Line => &[DATE_COLUMN, AVG_LIKES_COLUMN],
        }
    }

    /// Stable name used for output files and log fields
    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Boxplot => "boxplot",
            ChartKind::GroupedBar => "barplot",
            ChartKind::Line => "lineplot",
        }
    }

    /// File name of the dataset inside the data directory
    pub fn default_source(self) -> &'static str {
        match self {
            ChartKind::Boxplot => "socialMedia.csv",
            ChartKind::GroupedBar => "socialMediaAvg.csv",
            ChartKind::Line => "SocialMediaTime.csv",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One input row. Fields the dataset does not carry are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub platform: Option<String>,
    pub post_type: Option<String>,
    pub likes: Option<f64>,
    pub date: Option<NaiveDate>,
    pub avg_likes: Option<f64>,
}

impl Record {
    pub fn platform_key(&self) -> &str {
        self.platform.as_deref().unwrap_or("")
    }

    pub fn post_type_key(&self) -> &str {
        self.post_type.as_deref().unwrap_or("")
    }
}

/// Coerce text to a number the way a unary-plus cast does.
///
/// Blank text is `0` and `Infinity` is accepted with an optional sign.
/// Unsigned `0x`, `0o` and `0b` integer literals are read in their radix.
/// Anything else that is not a decimal number is `NaN`.
pub fn coerce_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(value) = radix_literal(trimmed) {
        return value;
    }

    // Rust also accepts "inf" and "nan" spellings, which are not numbers here
    let numeric_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'));
    if !numeric_chars {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `0x1A`, `0o17`, `0b101`; a prefix without digits is `NaN`
fn radix_literal(text: &str) -> Option<f64> {
    let prefix = text.get(..2)?;
    let radix = match prefix {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits
        .chars()
        .try_fold(0.0_f64, |acc, c| c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d)));
    Some(value.unwrap_or(f64::NAN))
}

/// Counts of fields that fell back to a sentinel during coercion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionReport {
    pub invalid_numbers: usize,
    pub invalid_dates: usize,
}

impl CoercionReport {
    pub fn is_clean(&self) -> bool {
        self.invalid_numbers == 0 && self.invalid_dates == 0
    }
}

struct Columns {
    platform: Option<usize>,
    post_type: Option<usize>,
    likes: Option<usize>,
    date: Option<usize>,
    avg_likes: Option<usize>,
}

impl Columns {
    fn resolve(data: &PlotData, kind: ChartKind) -> Result<Self> {
        for column in kind.required_columns() {
            data.column_index(column)
                .with_context(|| format!("{} dataset is missing a required column", kind))?;
        }

        let wanted = |name: &str| {
            if kind.required_columns().contains(&name) {
                data.column_index(name).ok()
            } else {
                None
            }
        };

        Ok(Self {
            platform: wanted(PLATFORM_COLUMN),
            post_type: wanted(POST_TYPE_COLUMN),
            likes: wanted(LIKES_COLUMN),
            date: wanted(DATE_COLUMN),
            avg_likes: wanted(AVG_LIKES_COLUMN),
        })
    }
}

fn field(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.map(|i| row.get(i).cloned().unwrap_or_default())
}

/// Coerce the rows of a table into records for the given chart
pub fn load_records(data: &PlotData, kind: ChartKind) -> Result<Vec<Record>> {
    let (records, report) = load_records_with_report(data, kind)?;
    if !report.is_clean() {
        tracing::warn!(
            chart = %kind,
            invalid_numbers = report.invalid_numbers,
            invalid_dates = report.invalid_dates,
            "Some fields could not be coerced and were kept as sentinels"
        );
    }
    Ok(records)
}

/// Same as [`load_records`], also returning how many fields failed coercion
pub fn load_records_with_report(data: &PlotData, kind: ChartKind) -> Result<(Vec<Record>, CoercionReport)> {
    let columns = Columns::resolve(data, kind)?;
    let mut report = CoercionReport::default();

    let mut records = Vec::with_capacity(data.rows.len());
    for row in &data.rows {
        let mut number = |idx: Option<usize>| {
            field(row, idx).map(|text| {
                let value = coerce_number(&text);
                if value.is_nan() {
                    report.invalid_numbers += 1;
                }
                value
            })
        };
        let likes = number(columns.likes);
        let avg_likes = number(columns.avg_likes);

        let date = match field(row, columns.date) {
            Some(text) => {
                let parsed = parse_post_date(&text);
                if parsed.is_none() {
                    report.invalid_dates += 1;
                }
                parsed
            }
            None => None,
        };

        records.push(Record {
            platform: field(row, columns.platform),
            post_type: field(row, columns.post_type),
            likes,
            date,
            avg_likes,
        });
    }

    Ok((records, report))
}

/// Parse CSV text and coerce it into records for the given chart
pub fn load_and_parse(text: &str, kind: ChartKind) -> Result<Vec<Record>> {
    let csv = csv_reader::read_csv_from_str(text)?;
    load_records(&PlotData::from_csv(csv), kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("12"), 12.0);
        assert_eq!(coerce_number(" 7 "), 7.0);
        assert_eq!(coerce_number("3.5"), 3.5);
        assert_eq!(coerce_number("1e3"), 1000.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert_eq!(coerce_number("-Infinity"), f64::NEG_INFINITY);
        assert!(coerce_number("abc").is_nan());
        assert!(coerce_number("12abc").is_nan());
        assert!(coerce_number("inf").is_nan());
        assert!(coerce_number("NaN").is_nan());
        assert!(coerce_number("1.2.3").is_nan());
    }

    #[test]
    fn test_coerce_radix_literals() {
        assert_eq!(coerce_number("0x1A"), 26.0);
        assert_eq!(coerce_number("0XfF"), 255.0);
        assert_eq!(coerce_number("0o17"), 15.0);
        assert_eq!(coerce_number("0b101"), 5.0);
        assert_eq!(coerce_number(" 0x10 "), 16.0);
        assert!(coerce_number("-0x1A").is_nan());
        assert!(coerce_number("+0x1A").is_nan());
        assert!(coerce_number("0x").is_nan());
        assert!(coerce_number("0b102").is_nan());
        assert!(coerce_number("0x1.5").is_nan());
        assert_eq!(coerce_number("0.5"), 0.5);
        assert_eq!(coerce_number("05"), 5.0);
    }

    #[test]
    fn test_blank_row_coerces_to_zero() {
        let records = load_and_parse("Platform,Likes\nA,4\n,\n", ChartKind::Boxplot).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].platform.as_deref(), Some(""));
        assert_eq!(records[1].likes, Some(0.0));
    }

    #[test]
    fn test_load_boxplot_records() {
        let records = load_and_parse("Platform,Likes\nInstagram,120\nTwitter,abc\n", ChartKind::Boxplot).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].platform.as_deref(), Some("Instagram"));
        assert_eq!(records[0].likes, Some(120.0));
        assert!(records[1].likes.unwrap().is_nan());
        assert_eq!(records[0].avg_likes, None);
        assert_eq!(records[0].date, None);
    }

    #[test]
    fn test_load_bar_records() {
        let records = load_and_parse(
            "Platform,PostType,AvgLikes\nFacebook,Video,152.5\n",
            ChartKind::GroupedBar,
        )
        .unwrap();
        assert_eq!(records[0].post_type.as_deref(), Some("Video"));
        assert_eq!(records[0].avg_likes, Some(152.5));
        assert_eq!(records[0].likes, None);
    }

    #[test]
    fn test_load_time_records_with_invalid_date() {
        let data = PlotData::from_csv(
            csv_reader::read_csv_from_str("Date,AvgLikes\n3/1/2024 (Friday),10\nyesterday,12\n").unwrap(),
        );
        let (records, report) = load_records_with_report(&data, ChartKind::Line).unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(records[1].date, None);
        assert_eq!(records[1].avg_likes, Some(12.0));
        assert_eq!(report, CoercionReport { invalid_numbers: 0, invalid_dates: 1 });
    }

    #[test]
    fn test_missing_column_is_load_error() {
        let result = load_and_parse("Platform,Shares\nX,1\n", ChartKind::Boxplot);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("missing a required column"));
        assert!(message.contains("Likes"));
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let records = load_and_parse("platform,likes\nX,1\n", ChartKind::Boxplot).unwrap();
        assert_eq!(records[0].likes, Some(1.0));
    }

    #[test]
    fn test_chart_kind_names() {
        assert_eq!(ChartKind::GroupedBar.to_string(), "barplot");
        assert_eq!(ChartKind::Line.default_source(), "SocialMediaTime.csv");
        assert_eq!(ChartKind::Boxplot.required_columns(), &["Platform", "Likes"]);
    }
}
