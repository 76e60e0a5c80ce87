//! Reshaping buffer records for display: an operation x address pivot split
//! into fixed-size pages, and a per-name grouping for the error-bar view.

use crate::buffers::query::BufferRecord;
use crate::chart::{BarStack, ChartSpec, ErrorPoint};
use crate::render::{Section, Tab, TableView};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Operations per stacked bar chart.
pub const PAGE_SIZE: usize = 50;

/// Operation ids with their names, one row each.
pub type OperationKey = (i64, String);

/// `cells[row][col]` is the mean size of buffers of `operations[row]` at
/// `addresses[col]`, 0 where the operation has no buffer there.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferPivot {
    pub operations: Vec<OperationKey>,
    pub addresses: Vec<i64>,
    pub cells: Vec<Vec<f64>>,
}

impl BufferPivot {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

pub fn pivot(records: &[BufferRecord]) -> BufferPivot {
    let mut acc: BTreeMap<OperationKey, BTreeMap<i64, (f64, usize)>> = BTreeMap::new();
    let mut addresses = BTreeSet::new();

    for r in records {
        addresses.insert(r.address);
        let slot = acc
            .entry((r.operation_id, r.operation_name.clone()))
            .or_default()
            .entry(r.address)
            .or_default();
        slot.0 += r.max_size_per_bank as f64;
        slot.1 += 1;
    }

    let addresses: Vec<i64> = addresses.into_iter().collect();
    let mut operations = Vec::with_capacity(acc.len());
    let mut cells = Vec::with_capacity(acc.len());
    for (key, by_addr) in acc {
        cells.push(
            addresses
                .iter()
                .map(|a| match by_addr.get(a) {
                    Some((sum, n)) => sum / *n as f64,
                    None => 0.0,
                })
                .collect(),
        );
        operations.push(key);
    }

    BufferPivot {
        operations,
        addresses,
        cells,
    }
}

/// `ceil(n / page)` consecutive half-open ranges covering `0..n`.
pub fn page_ranges(n: usize, page: usize) -> Vec<Range<usize>> {
    let page = page.max(1);
    (0..n.div_ceil(page))
        .map(|i| i * page..((i + 1) * page).min(n))
        .collect()
}

/// Operation name without the `ttnn.` namespace.
pub fn display_name(name: &str) -> &str {
    name.strip_prefix("ttnn.").unwrap_or(name)
}

/// One section per page: a stacked bar of buffer sizes per operation plus
/// the list of operation names on that page.
pub fn render_pivot_pages(pivot: &BufferPivot) -> Vec<Section> {
    page_ranges(pivot.len(), PAGE_SIZE)
        .into_iter()
        .map(|range| {
            let (start, last) = (range.start, range.end - 1);
            let ops = &pivot.operations[range.clone()];
            let rows = &pivot.cells[range];

            let stacks = pivot
                .addresses
                .iter()
                .enumerate()
                .filter(|(col, _)| rows.iter().any(|r| r[*col] != 0.0))
                .map(|(col, addr)| BarStack {
                    label: format!("address {addr}"),
                    values: rows.iter().map(|r| r[col]).collect(),
                })
                .collect();

            let chart = ChartSpec::StackedBar {
                title: format!("L1 Utilization Visualizer (Ops {start}-{last})"),
                x_label: "Operation ID".to_string(),
                y_label: "L1 Buffer Size".to_string(),
                categories: ops.iter().map(|(id, _)| id.to_string()).collect(),
                stacks,
            };

            Section {
                heading: format!("Operations {start}-{last}"),
                charts: vec![chart],
                table: Some(TableView {
                    columns: vec!["operation_id".to_string(), "operation_name".to_string()],
                    rows: ops
                        .iter()
                        .map(|(id, name)| vec![id.to_string(), display_name(name).to_string()])
                        .collect(),
                }),
                ..Section::default()
            }
        })
        .collect()
}

/// Buffers of every operation sharing one name.
#[derive(Debug, Clone, PartialEq)]
pub struct NameGroup {
    pub name: String,
    /// Operation id, address, size.
    pub points: Vec<ErrorPoint>,
}

/// Group by operation name, names sorted, points ordered by operation id.
pub fn group_by_name(records: &[BufferRecord]) -> Vec<NameGroup> {
    let mut groups: BTreeMap<&str, Vec<&BufferRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.operation_name.as_str()).or_default().push(r);
    }
    groups
        .into_iter()
        .map(|(name, mut rs)| {
            rs.sort_by_key(|r| r.operation_id);
            NameGroup {
                name: name.to_string(),
                points: rs
                    .into_iter()
                    .map(|r| ErrorPoint {
                        x: r.operation_id as f64,
                        y: r.address as f64,
                        err: r.max_size_per_bank as f64,
                    })
                    .collect(),
            }
        })
        .collect()
}

/// One tab per operation name with an address +/- size plot.
pub fn render_name_tabs(groups: &[NameGroup]) -> Vec<Tab> {
    groups
        .iter()
        .map(|g| Tab {
            name: g.name.clone(),
            sections: vec![Section {
                heading: g.name.clone(),
                charts: vec![ChartSpec::ErrorBar {
                    title: format!("L1 Utilization for {}", g.name),
                    x_label: "Operation ID".to_string(),
                    y_label: "Address + Size".to_string(),
                    points: g.points.clone(),
                }],
                ..Section::default()
            }],
        })
        .collect()
}
