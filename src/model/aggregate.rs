//! Per-category means and per-bucket kernel duration shares.

use crate::error::Result;
use crate::model::classify::{Categorized, Category, NumberedOp, substring_pattern};
use crate::sheet::OperationRecord;
use regex::Regex;
use serde::Serialize;

/// A labelled, case-insensitive substring of the operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTypeBucket {
    pub label: &'static str,
    pub pattern: &'static str,
}

/// Buckets for the operation-type pie, in display order.
///
/// Buckets are not a partition: a code such as `ReduceBinary` lands in both
/// `Reduce` and `Binary`, so its duration is counted once per matching bucket.
pub const OP_TYPE_BUCKETS: [OpTypeBucket; 10] = [
    OpTypeBucket { label: "MatMul", pattern: "matmul" },
    OpTypeBucket { label: "Conv", pattern: "conv" },
    OpTypeBucket { label: "I2S", pattern: "interleavedtosharded" },
    OpTypeBucket { label: "MaxPool", pattern: "maxpool" },
    OpTypeBucket { label: "Move", pattern: "move" },
    OpTypeBucket { label: "Reduce", pattern: "reduce" },
    OpTypeBucket { label: "Reshard", pattern: "reshard" },
    OpTypeBucket { label: "Tile/Untile", pattern: "tilize" },
    OpTypeBucket { label: "Binary", pattern: "binary" },
    OpTypeBucket { label: "Halo", pattern: "halo" },
];

/// Mean adjusted utilization of one category. `None` means the category had
/// no rows and the mean is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: Category,
    pub operations: usize,
    pub mean_utilization: Option<f64>,
}

/// Summed kernel duration of one bucket and its share of all bucket sums.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub label: String,
    pub duration_ns: f64,
    /// `None` when every bucket sums to zero.
    pub percentage: Option<f64>,
}

pub fn category_mean(rows: &[NumberedOp]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let sum: f64 = rows.iter().map(|r| r.record.adjusted_utilization).sum();
    Some(sum / rows.len() as f64)
}

pub fn category_averages(categorized: &Categorized) -> Vec<CategoryAverage> {
    categorized
        .iter()
        .map(|(category, rows)| CategoryAverage {
            category,
            operations: rows.len(),
            mean_utilization: category_mean(rows),
        })
        .collect()
}

/// Compiled bucket patterns.
#[derive(Debug, Clone)]
pub struct BucketSet {
    buckets: Vec<(&'static str, Regex)>,
}

impl BucketSet {
    pub fn new(buckets: &[OpTypeBucket]) -> Result<Self> {
        let buckets = buckets
            .iter()
            .map(|b| Ok((b.label, substring_pattern(b.pattern)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { buckets })
    }

    pub fn standard() -> Result<Self> {
        Self::new(&OP_TYPE_BUCKETS)
    }

    /// Sum kernel durations per bucket over every row (device or not), then
    /// express each sum as a percentage of the total of the sums.
    ///
    /// Rows without a duration contribute nothing.
    pub fn shares(&self, records: &[OperationRecord]) -> Vec<BucketShare> {
        let sums: Vec<f64> = self
            .buckets
            .iter()
            .map(|(_, re)| {
                records
                    .iter()
                    .filter(|r| re.is_match(&r.op_code))
                    .filter_map(|r| r.kernel_duration_ns)
                    .filter(|d| !d.is_nan())
                    .sum()
            })
            .collect();

        let total: f64 = sums.iter().sum();

        self.buckets
            .iter()
            .zip(sums)
            .map(|((label, _), duration_ns)| BucketShare {
                label: label.to_string(),
                duration_ns,
                percentage: (total != 0.0).then(|| duration_ns / total * 100.0),
            })
            .collect()
    }
}

/// Total of all bucket sums; exceeds `table_duration` when patterns overlap.
pub fn bucketed_duration(shares: &[BucketShare]) -> f64 {
    shares.iter().map(|s| s.duration_ns).sum()
}

/// Total kernel duration of the whole table.
pub fn table_duration(records: &[OperationRecord]) -> f64 {
    records
        .iter()
        .filter_map(|r| r.kernel_duration_ns)
        .filter(|d| !d.is_nan())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(code: &str, duration: Option<f64>) -> OperationRecord {
        OperationRecord {
            op_code: code.to_string(),
            op_type: "tt_dnn_device".to_string(),
            core_count: Some(1),
            kernel_duration_ns: duration,
            ideal_ns: None,
            global_call_count: None,
            adjusted_utilization: 0.0,
        }
    }

    fn numbered(utils: &[f64]) -> Vec<NumberedOp> {
        utils
            .iter()
            .enumerate()
            .map(|(i, u)| NumberedOp {
                operation_number: i + 1,
                record: OperationRecord {
                    adjusted_utilization: *u,
                    ..rec("x", Some(1.0))
                },
            })
            .collect()
    }

    fn pct(shares: &[BucketShare], label: &str) -> Option<f64> {
        shares.iter().find(|s| s.label == label).and_then(|s| s.percentage)
    }

    #[test]
    fn mean_of_rows() {
        assert_eq!(category_mean(&numbered(&[50.0, 100.0, 0.0])), Some(50.0));
    }

    #[test]
    fn mean_of_empty_group_is_undefined() {
        assert_eq!(category_mean(&[]), None);
    }

    #[test]
    fn averages_follow_category_order() {
        let categorized = Categorized {
            matmul: numbered(&[80.0]),
            conv: vec![],
            other: numbered(&[10.0, 30.0]),
        };
        let avgs = category_averages(&categorized);
        assert_eq!(
            avgs,
            vec![
                CategoryAverage {
                    category: Category::MatMul,
                    operations: 1,
                    mean_utilization: Some(80.0),
                },
                CategoryAverage {
                    category: Category::Conv,
                    operations: 0,
                    mean_utilization: None,
                },
                CategoryAverage {
                    category: Category::Other,
                    operations: 2,
                    mean_utilization: Some(20.0),
                },
            ]
        );
    }

    #[test]
    fn single_bucket_row_takes_the_whole_pie() {
        let shares = BucketSet::standard().unwrap().shares(&[rec("MaxPool2d", Some(250.0))]);
        assert_eq!(shares.len(), OP_TYPE_BUCKETS.len());
        for s in &shares {
            let expected = if s.label == "MaxPool" { 100.0 } else { 0.0 };
            assert_eq!(s.percentage, Some(expected), "bucket {}", s.label);
        }
    }

    #[test]
    fn overlapping_buckets_count_twice() {
        let rows = [rec("ReduceBinary", Some(100.0)), rec("Move", Some(100.0))];
        let shares = BucketSet::standard().unwrap().shares(&rows);
        let reduce = shares.iter().find(|s| s.label == "Reduce").unwrap();
        let binary = shares.iter().find(|s| s.label == "Binary").unwrap();
        assert_eq!(reduce.duration_ns, 100.0);
        assert_eq!(binary.duration_ns, 100.0);

        // 300 ns of bucket time against 200 ns of measured time.
        assert_eq!(bucketed_duration(&shares), 300.0);
        assert_eq!(table_duration(&rows), 200.0);
        assert!((pct(&shares, "Reduce").unwrap() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn shares_use_non_device_rows_and_skip_missing_durations() {
        let mut host = rec("HostMatmul", Some(300.0));
        host.op_type = "tt_dnn_cpu".to_string();
        let shares = BucketSet::standard()
            .unwrap()
            .shares(&[host, rec("matmul", None), rec("Conv", Some(100.0))]);
        assert_eq!(pct(&shares, "MatMul"), Some(75.0));
        assert_eq!(pct(&shares, "Conv"), Some(25.0));
    }

    #[test]
    fn tilize_pattern_covers_untilize() {
        let shares = BucketSet::standard()
            .unwrap()
            .shares(&[rec("Untilize", Some(10.0)), rec("TilizeWithValPadding", Some(30.0))]);
        assert_eq!(pct(&shares, "Tile/Untile"), Some(100.0));
    }

    #[test]
    fn zero_total_leaves_percentages_undefined() {
        let shares = BucketSet::standard().unwrap().shares(&[rec("Unknown", Some(10.0))]);
        assert!(shares.iter().all(|s| s.percentage.is_none()));
        assert!(shares.iter().all(|s| s.duration_ns == 0.0));
    }
}
