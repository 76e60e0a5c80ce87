//! Analysis pipeline: utilization, categories, averages, bucket shares.

pub mod aggregate;
pub mod classify;
pub mod utilization;

use crate::config::ReportOptions;
use crate::error::Result;
use crate::sheet::{self, OperationRecord, Table};
use aggregate::{BucketSet, BucketShare, CategoryAverage};
use classify::{Categorized, Classifier};
use tracing::{debug, info, warn};

/// Everything derived from one sheet.
#[derive(Debug, Clone)]
pub struct CategorizedResult {
    pub source: String,
    /// Every row of the sheet, with utilization filled in.
    pub records: Vec<OperationRecord>,
    pub categorized: Categorized,
    pub averages: Vec<CategoryAverage>,
    pub buckets: Vec<BucketShare>,
    /// Kernel duration of the whole sheet, for comparing against bucket sums.
    pub table_duration_ns: f64,
}

/// Run the whole analysis over one loaded table.
pub fn compute(table: &Table, options: &ReportOptions) -> Result<CategorizedResult> {
    // 1) Typed rows.
    let mut records = sheet::records(table)?;

    // 2) Utilization on every row, before any filtering.
    utilization::annotate(&mut records);

    // 3) Categories over device rows only.
    let classifier = Classifier::new(&options.device_op_type)?;
    let categorized = classifier.classify(&records);
    if categorized.total() == 0 {
        warn!(
            source = %table.source,
            op_type = %options.device_op_type,
            "no on-device rows found"
        );
    }

    // 4) Aggregates. Bucket shares use the full table.
    let averages = aggregate::category_averages(&categorized);
    let buckets = BucketSet::standard()?.shares(&records);
    let table_duration_ns = aggregate::table_duration(&records);

    for avg in &averages {
        debug!(
            category = %avg.category,
            operations = avg.operations,
            mean = ?avg.mean_utilization,
            "category average"
        );
    }
    info!(
        source = %table.source,
        rows = records.len(),
        matmul = categorized.matmul.len(),
        conv = categorized.conv.len(),
        other = categorized.other.len(),
        "computed sheet"
    );

    Ok(CategorizedResult {
        source: table.source.clone(),
        records,
        categorized,
        averages,
        buckets,
        table_duration_ns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classify::Category;
    use crate::sheet::load_table;

    const SHEET: &str = "\
OP CODE,OP TYPE,GLOBAL CALL COUNT,CORE COUNT,DEVICE KERNEL DURATION [ns],PM IDEAL [ns]
Matmul_A,tt_dnn_device,1,54,1000,500
HostCopy,tt_dnn_cpu,2,0,0,0
OptimizedConv,tt_dnn_device,3,64,2000,0
ReduceBinary,tt_dnn_device,4,0,100,50
";

    #[test]
    fn compute_runs_every_stage() {
        let table = load_table(SHEET.as_bytes(), "resnet.csv").unwrap();
        let result = compute(&table, &ReportOptions::default()).unwrap();

        assert_eq!(result.source, "resnet.csv");
        assert_eq!(result.records.len(), 4);
        assert_eq!(result.records[0].adjusted_utilization, 100.0);
        // zero cores and zero duration normalize to 0.
        assert_eq!(result.records[1].adjusted_utilization, 0.0);
        assert_eq!(result.records[3].adjusted_utilization, 0.0);

        assert_eq!(result.categorized.matmul.len(), 1);
        assert_eq!(result.categorized.conv.len(), 1);
        assert_eq!(result.categorized.other.len(), 1);
        assert_eq!(result.categorized.other[0].record.op_code, "ReduceBinary");

        assert_eq!(result.averages[0].category, Category::MatMul);
        assert_eq!(result.averages[0].mean_utilization, Some(100.0));
        assert_eq!(result.table_duration_ns, 3100.0);
        assert!(aggregate::bucketed_duration(&result.buckets) > result.table_duration_ns);
    }

    #[test]
    fn compute_surfaces_missing_columns() {
        let table = load_table(b"OP CODE\nMatmul", "bad.csv").unwrap();
        assert!(compute(&table, &ReportOptions::default()).is_err());
    }
}
