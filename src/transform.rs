use serde::Serialize;
use std::collections::HashMap;

use crate::error::{ChartError, ChartResult};
use crate::records::Record;

/// Five-number summary of one group, ordered `min <= q1 <= median <= q3 <= max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileSet {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl QuantileSet {
    /// Summarize a group of values. `NaN` entries are skipped; a group with no
    /// remaining values is an [`ChartError::EmptyGroup`].
    pub fn from_values(values: &[f64]) -> ChartResult<Self> {
        Self::for_group("", values)
    }

    fn for_group(key: &str, values: &[f64]) -> ChartResult<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return Err(ChartError::EmptyGroup { key: key.to_string() });
        }
        sorted.sort_by(f64::total_cmp);

        Ok(QuantileSet {
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.50),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// R-7 quantile of ascending values: `h = p * (n - 1)`, interpolated between
/// the order statistics around `h`. Returns `NaN` for an empty slice.
///
/// An infinite neighbour absorbs the interpolation, so infinite inputs never
/// produce `NaN`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 { return f64::NAN; }
    if n == 1 { return sorted[0]; }

    let p = p.clamp(0.0, 1.0);
    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    let lower = sorted[lower_idx];
    let upper = sorted[upper_idx];
    if lower_idx == upper_idx || lower == upper {
        return lower;
    }

    let frac = rank - lower_idx as f64;
    match (lower.is_infinite(), upper.is_infinite()) {
        (false, false) => lower + frac * (upper - lower),
        (true, false) => lower,
        (false, true) => upper,
        (true, true) => if frac < 0.5 { lower } else { upper },
    }
}

/// Quartile summaries per platform, in first-seen platform order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedQuantiles {
    groups: Vec<(String, QuantileSet)>,
}

impl GroupedQuantiles {
    pub fn get(&self, key: &str) -> Option<&QuantileSet> {
        self.groups.iter().find(|(k, _)| k == key).map(|(_, q)| q)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuantileSet)> {
        self.groups.iter().map(|(k, q)| (k.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partition records by platform, keeping platforms in first-seen order.
/// `value` picks the field collected for each record; records it rejects
/// still register their platform.
pub fn group_by_platform<F>(records: &[Record], value: F) -> Vec<(String, Vec<f64>)>
where
    F: Fn(&Record) -> Option<f64>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();

    for record in records {
        let key = record.platform_key();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), Vec::new()));
            groups.len() - 1
        });
        if let Some(v) = value(record) {
            groups[slot].1.push(v);
        }
    }

    groups
}

/// Compute the boxplot quartiles of `likes` for every platform
pub fn aggregate(records: &[Record]) -> ChartResult<GroupedQuantiles> {
    if records.is_empty() {
        return Err(ChartError::EmptyInput);
    }

    let groups = group_by_platform(records, |r| r.likes)
        .into_iter()
        .map(|(key, values)| {
            let quantiles = QuantileSet::for_group(&key, &values)?;
            tracing::debug!(platform = %key, ?quantiles, "Computed quartiles");
            Ok((key, quantiles))
        })
        .collect::<ChartResult<Vec<_>>>()?;

    Ok(GroupedQuantiles { groups })
}

/// Distinct values in first-seen order
pub fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = Vec::new();
    for value in values {
        if !seen.iter().any(|s: &String| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn likes(platform: &str, likes: f64) -> Record {
        Record {
            platform: Some(platform.to_string()),
            likes: Some(likes),
            ..Record::default()
        }
    }

    #[test]
    fn test_quartiles_one_to_ten() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let q = QuantileSet::from_values(&values).unwrap();
        assert_eq!(q, QuantileSet { min: 1.0, q1: 3.25, median: 5.5, q3: 7.75, max: 10.0 });
    }

    #[test]
    fn test_unsorted_input() {
        let q = QuantileSet::from_values(&[10.0, 1.0, 7.0, 3.0, 5.0]).unwrap();
        assert_eq!(q.min, 1.0);
        assert_eq!(q.median, 5.0);
        assert_eq!(q.max, 10.0);
        assert_eq!(q.iqr(), 4.0);
    }

    #[test]
    fn test_single_value() {
        let q = QuantileSet::from_values(&[42.0]).unwrap();
        assert_eq!(q, QuantileSet { min: 42.0, q1: 42.0, median: 42.0, q3: 42.0, max: 42.0 });
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(
            QuantileSet::from_values(&[]),
            Err(ChartError::EmptyGroup { key: String::new() })
        );
    }

    #[test]
    fn test_nan_is_skipped() {
        let q = QuantileSet::from_values(&[f64::NAN, 4.0, 2.0]).unwrap();
        assert_eq!(q.min, 2.0);
        assert_eq!(q.median, 3.0);
        assert!(QuantileSet::from_values(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_ordering_invariant() {
        let samples: Vec<Vec<f64>> = vec![
            vec![5.0, 5.0, 5.0],
            vec![1.0, 100.0],
            vec![-3.0, 0.0, 2.5, 2.5, 9.0, 11.0, 250.0],
            (0..37).map(|i| ((i * 7919) % 101) as f64).collect(),
        ];
        for values in samples {
            let q = QuantileSet::from_values(&values).unwrap();
            assert!(q.min <= q.q1 && q.q1 <= q.median && q.median <= q.q3 && q.q3 <= q.max, "{:?}", q);
        }
    }

    #[test]
    fn test_infinite_values_keep_ordering() {
        let values: Vec<f64> = ["1", "Infinity", "Infinity"]
            .iter()
            .map(|s| crate::records::coerce_number(s))
            .collect();
        let q = QuantileSet::from_values(&values).unwrap();
        assert_eq!(q.min, 1.0);
        assert_eq!((q.q1, q.median, q.q3, q.max), (f64::INFINITY, f64::INFINITY, f64::INFINITY, f64::INFINITY));

        let q = QuantileSet::from_values(&[f64::NEG_INFINITY, 1.0]).unwrap();
        assert_eq!((q.min, q.q1, q.median, q.q3), (f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY));
        assert_eq!(q.max, 1.0);

        let q = QuantileSet::from_values(&[f64::NEG_INFINITY, 0.0, f64::INFINITY]).unwrap();
        for v in [q.min, q.q1, q.median, q.q3, q.max] {
            assert!(!v.is_nan(), "{:?}", q);
        }
        assert!(q.min <= q.q1 && q.q1 <= q.median && q.median <= q.q3 && q.q3 <= q.max, "{:?}", q);
    }

    #[test]
    fn test_quantile_sorted_endpoints() {
        let v = [2.0, 4.0, 8.0];
        assert_eq!(quantile_sorted(&v, 0.0), 2.0);
        assert_eq!(quantile_sorted(&v, 1.0), 8.0);
        assert_eq!(quantile_sorted(&v, 0.75), 6.0);
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_group_by_platform_first_seen_order() {
        let records = vec![likes("Y", 1.0), likes("X", 2.0), likes("Y", 3.0)];
        let groups = group_by_platform(&records, |r| r.likes);
        assert_eq!(groups, vec![
            ("Y".to_string(), vec![1.0, 3.0]),
            ("X".to_string(), vec![2.0]),
        ]);
    }

    #[test]
    fn test_aggregate_two_platforms() {
        let records = vec![likes("X", 10.0), likes("X", 20.0), likes("Y", 5.0)];
        let grouped = aggregate(&records).unwrap();

        assert_eq!(grouped.len(), 2);
        let x = grouped.get("X").unwrap();
        assert_eq!((x.min, x.median, x.max), (10.0, 15.0, 20.0));
        let y = grouped.get("Y").unwrap();
        assert_eq!(*y, QuantileSet { min: 5.0, q1: 5.0, median: 5.0, q3: 5.0, max: 5.0 });
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["X", "Y"]);
    }

    #[test]
    fn test_aggregate_all_nan_group_fails() {
        let records = vec![likes("X", 10.0), likes("Z", f64::NAN)];
        assert_eq!(aggregate(&records), Err(ChartError::EmptyGroup { key: "Z".to_string() }));
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert_eq!(aggregate(&[]), Err(ChartError::EmptyInput));
    }

    #[test]
    fn test_distinct() {
        let values = ["Text", "Photo", "Text", "Video", "Photo"];
        assert_eq!(distinct(values), vec!["Text", "Photo", "Video"]);
    }
}
