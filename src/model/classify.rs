//! Partition on-device operations into MatMul / Conv / Other.

use crate::error::Result;
use crate::sheet::OperationRecord;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;

/// Operation type value that marks a row as executed on the device.
pub const DEVICE_OP_TYPE: &str = "tt_dnn_device";

/// Case-insensitive literal substring matcher.
pub(crate) fn substring_pattern(needle: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    MatMul,
    Conv,
    Other,
}

impl Category {
    /// Declaration order; charts and exports follow it.
    pub const ALL: [Category; 3] = [Category::MatMul, Category::Conv, Category::Other];

    pub fn label(self) -> &'static str {
        match self {
            Category::MatMul => "MatMul",
            Category::Conv => "Conv",
            Category::Other => "Other",
        }
    }

    /// Section heading used in reports.
    pub fn heading(self) -> &'static str {
        match self {
            Category::MatMul => "MatMul Operations",
            Category::Conv => "Conv Operations",
            Category::Other => "Other On-Device Operations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A device operation with its 1-based position inside its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberedOp {
    pub operation_number: usize,
    #[serde(flatten)]
    pub record: OperationRecord,
}

/// On-device rows split by category, each in original row order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Categorized {
    pub matmul: Vec<NumberedOp>,
    pub conv: Vec<NumberedOp>,
    pub other: Vec<NumberedOp>,
}

impl Categorized {
    pub fn get(&self, category: Category) -> &[NumberedOp] {
        match category {
            Category::MatMul => &self.matmul,
            Category::Conv => &self.conv,
            Category::Other => &self.other,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<NumberedOp> {
        match category {
            Category::MatMul => &mut self.matmul,
            Category::Conv => &mut self.conv,
            Category::Other => &mut self.other,
        }
    }

    /// Categories in declaration order with their rows.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[NumberedOp])> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn total(&self) -> usize {
        self.matmul.len() + self.conv.len() + self.other.len()
    }
}

/// Routes operation codes to categories and filters to device rows.
#[derive(Debug, Clone)]
pub struct Classifier {
    device_op_type: String,
    matmul: Regex,
    conv: Regex,
}

impl Classifier {
    pub fn new(device_op_type: &str) -> Result<Self> {
        Ok(Self {
            device_op_type: device_op_type.to_string(),
            matmul: substring_pattern("matmul")?,
            conv: substring_pattern("conv")?,
        })
    }

    /// MatMul wins over Conv when a code contains both.
    pub fn category(&self, op_code: &str) -> Category {
        if self.matmul.is_match(op_code) {
            Category::MatMul
        } else if self.conv.is_match(op_code) {
            Category::Conv
        } else {
            Category::Other
        }
    }

    pub fn is_device_op(&self, record: &OperationRecord) -> bool {
        record.op_type == self.device_op_type
    }

    /// Split device rows into categories; numbering restarts at 1 per category.
    pub fn classify(&self, records: &[OperationRecord]) -> Categorized {
        let mut out = Categorized::default();
        for record in records.iter().filter(|r| self.is_device_op(r)) {
            let group = out.get_mut(self.category(&record.op_code));
            let operation_number = group.len() + 1;
            group.push(NumberedOp {
                operation_number,
                record: record.clone(),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn op(code: &str, op_type: &str) -> OperationRecord {
        OperationRecord {
            op_code: code.to_string(),
            op_type: op_type.to_string(),
            core_count: Some(8),
            kernel_duration_ns: Some(100.0),
            ideal_ns: Some(50.0),
            global_call_count: None,
            adjusted_utilization: 0.0,
        }
    }

    fn codes(ops: &[NumberedOp]) -> Vec<(usize, &str)> {
        ops.iter()
            .map(|o| (o.operation_number, o.record.op_code.as_str()))
            .collect()
    }

    #[test]
    fn category_is_case_insensitive_and_ordered() {
        let c = Classifier::new(DEVICE_OP_TYPE).unwrap();
        assert_eq!(c.category("Matmul_A"), Category::MatMul);
        assert_eq!(c.category("OptimizedConvNew"), Category::Conv);
        assert_eq!(c.category("MATMUL_with_conv"), Category::MatMul);
        assert_eq!(c.category("Binary"), Category::Other);
        assert_eq!(c.category(""), Category::Other);
    }

    #[test]
    fn numbering_restarts_per_category() {
        let rows = vec![
            op("Matmul", DEVICE_OP_TYPE),
            op("Conv2d", DEVICE_OP_TYPE),
            op("Binary", DEVICE_OP_TYPE),
            op("host", "tt_dnn_cpu"),
            op("matmul_1d", DEVICE_OP_TYPE),
            op("Reduce", DEVICE_OP_TYPE),
        ];
        let c = Classifier::new(DEVICE_OP_TYPE).unwrap();
        let out = c.classify(&rows);
        assert_eq!(codes(&out.matmul), vec![(1, "Matmul"), (2, "matmul_1d")]);
        assert_eq!(codes(&out.conv), vec![(1, "Conv2d")]);
        assert_eq!(codes(&out.other), vec![(1, "Binary"), (2, "Reduce")]);
    }

    #[test]
    fn device_rows_partition_exactly_once() {
        let rows: Vec<_> = ["a", "matmul", "CONV", "xconvx", "b", "matmulconv"]
            .iter()
            .map(|c| op(c, DEVICE_OP_TYPE))
            .chain([op("matmul", "other_type")])
            .collect();
        let c = Classifier::new(DEVICE_OP_TYPE).unwrap();
        let out = c.classify(&rows);

        let device = rows.iter().filter(|r| c.is_device_op(r)).count();
        assert_eq!(out.total(), device);
        for (_, group) in out.iter() {
            let numbers: Vec<usize> = group.iter().map(|o| o.operation_number).collect();
            assert_eq!(numbers, (1..=group.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn custom_device_type() {
        let rows = vec![op("Matmul", "npu"), op("Matmul", DEVICE_OP_TYPE)];
        let out = Classifier::new("npu").unwrap().classify(&rows);
        assert_eq!(out.matmul.len(), 1);
        assert_eq!(out.matmul[0].record.op_type, "npu");
    }
}
