//! Declarative chart descriptions.
//!
//! A `ChartSpec` carries everything needed to draw one figure; the HTML
//! report's script turns each into SVG. Nothing here computes metrics, it
//! only projects rows that were already derived.

use crate::model::aggregate::BucketShare;
use crate::model::classify::{Category, NumberedOp};
use serde::Serialize;

pub const BAR_CORE_COLOR: &str = "blue";
pub const BAR_DURATION_COLOR: &str = "green";
pub const LINE_COLOR: &str = "red";
pub const SCATTER_COLOR: &str = "purple";

pub const LABEL_OPERATION_NUMBER: &str = "Operation Number";
pub const LABEL_CORE_COUNT: &str = "Core Count";
pub const LABEL_KERNEL_DURATION: &str = "Device Kernel Duration (ns)";
pub const LABEL_UTILIZATION: &str = "Utilization (%)";

/// One plotted series. `None` values leave a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Legend text, e.g. `MatMul: 42.0%`.
    pub legend: String,
}

/// One layer of a stacked bar chart; `values[i]` belongs to `categories[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarStack {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPoint {
    pub x: f64,
    pub y: f64,
    pub err: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    /// Bars on the left axis, a line on the right axis, shared x.
    BarLine {
        title: String,
        x_label: String,
        bar_axis: String,
        line_axis: String,
        bar: Series,
        line: Series,
    },
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        series: Series,
    },
    Pie {
        title: String,
        legend_title: String,
        slices: Vec<PieSlice>,
    },
    StackedBar {
        title: String,
        x_label: String,
        y_label: String,
        categories: Vec<String>,
        stacks: Vec<BarStack>,
    },
    ErrorBar {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<ErrorPoint>,
    },
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::BarLine { title, .. }
            | ChartSpec::Scatter { title, .. }
            | ChartSpec::Pie { title, .. }
            | ChartSpec::StackedBar { title, .. }
            | ChartSpec::ErrorBar { title, .. } => title,
        }
    }
}

fn utilization_line(rows: &[NumberedOp], x: &[f64]) -> Series {
    Series {
        label: "Utilization".to_string(),
        color: LINE_COLOR.to_string(),
        x: x.to_vec(),
        y: rows
            .iter()
            .map(|r| Some(r.record.adjusted_utilization))
            .collect(),
    }
}

/// The three per-category figures, in display order:
/// core count + utilization, kernel duration + utilization, duration vs. utilization.
pub fn render_category_charts(category: Category, rows: &[NumberedOp]) -> Vec<ChartSpec> {
    let x: Vec<f64> = rows.iter().map(|r| r.operation_number as f64).collect();

    let cores = ChartSpec::BarLine {
        title: format!("Operation Core Count + Utilization ({category})"),
        x_label: LABEL_OPERATION_NUMBER.to_string(),
        bar_axis: LABEL_CORE_COUNT.to_string(),
        line_axis: LABEL_UTILIZATION.to_string(),
        bar: Series {
            label: "Core Count".to_string(),
            color: BAR_CORE_COLOR.to_string(),
            x: x.clone(),
            y: rows
                .iter()
                .map(|r| r.record.core_count.map(f64::from))
                .collect(),
        },
        line: utilization_line(rows, &x),
    };

    let durations = ChartSpec::BarLine {
        title: format!("Operation Device Kernel Duration + Utilization ({category})"),
        x_label: LABEL_OPERATION_NUMBER.to_string(),
        bar_axis: LABEL_KERNEL_DURATION.to_string(),
        line_axis: LABEL_UTILIZATION.to_string(),
        bar: Series {
            label: "Device Kernel Duration".to_string(),
            color: BAR_DURATION_COLOR.to_string(),
            x: x.clone(),
            y: rows.iter().map(|r| r.record.kernel_duration_ns).collect(),
        },
        line: utilization_line(rows, &x),
    };

    // Rows without a duration have no x position and are left out.
    let (sx, sy): (Vec<f64>, Vec<Option<f64>>) = rows
        .iter()
        .filter_map(|r| {
            r.record
                .kernel_duration_ns
                .map(|d| (d, Some(r.record.adjusted_utilization)))
        })
        .unzip();
    let scatter = ChartSpec::Scatter {
        title: format!("Device Kernel Duration vs Utilization ({category})"),
        x_label: LABEL_KERNEL_DURATION.to_string(),
        y_label: LABEL_UTILIZATION.to_string(),
        series: Series {
            label: "Utilization".to_string(),
            color: SCATTER_COLOR.to_string(),
            x: sx,
            y: sy,
        },
    };

    vec![cores, durations, scatter]
}

pub fn pie_legend(share: &BucketShare) -> String {
    match share.percentage {
        Some(p) => format!("{}: {:.1}%", share.label, p),
        None => format!("{}: n/a", share.label),
    }
}

/// Pie of bucket duration sums, legend in bucket order.
pub fn render_bucket_pie(shares: &[BucketShare]) -> ChartSpec {
    ChartSpec::Pie {
        title: "Operation Types Pie Chart".to_string(),
        legend_title: "Operation Types".to_string(),
        slices: shares
            .iter()
            .map(|s| PieSlice {
                label: s.label.clone(),
                value: s.duration_ns,
                legend: pie_legend(s),
            })
            .collect(),
    }
}
