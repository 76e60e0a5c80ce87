//! `graph_data_<source>` exports: categorized rows with a fixed column subset.

use crate::config::ReportOptions;
use crate::error::Result;
use crate::model::CategorizedResult;
use crate::model::classify::Categorized;
use crate::sheet::row::*;
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EXPORT_SHEET_NAME: &str = "Overall Data";

/// Column order of both export formats.
pub const EXPORT_COLUMNS: [&str; 6] = [
    COL_OP_CODE,
    COL_OP_TYPE,
    COL_GLOBAL_CALL_COUNT,
    COL_CORE_COUNT,
    COL_KERNEL_DURATION,
    COL_ADJUSTED_UTILIZATION,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "OP CODE")]
    pub op_code: String,
    #[serde(rename = "OP TYPE")]
    pub op_type: String,
    #[serde(rename = "GLOBAL CALL COUNT")]
    pub global_call_count: Option<i64>,
    #[serde(rename = "CORE COUNT")]
    pub core_count: Option<u32>,
    #[serde(rename = "DEVICE KERNEL DURATION [ns]")]
    pub kernel_duration_ns: Option<f64>,
    #[serde(rename = "Adjusted Utilization")]
    pub adjusted_utilization: f64,
}

/// MatMul rows, then Conv, then Other, projected to the export columns.
pub fn project(categorized: &Categorized) -> Vec<ExportRow> {
    categorized
        .iter()
        .flat_map(|(_, rows)| rows.iter())
        .map(|op| {
            let r = &op.record;
            ExportRow {
                op_code: r.op_code.clone(),
                op_type: r.op_type.clone(),
                global_call_count: r.global_call_count,
                core_count: r.core_count,
                kernel_duration_ns: r.kernel_duration_ns,
                adjusted_utilization: r.adjusted_utilization,
            }
        })
        .collect()
}

pub fn write_csv<W: Write>(rows: &[ExportRow], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if rows.is_empty() {
        // serialize() only emits the header alongside the first row.
        writer.write_record(EXPORT_COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn xlsx_bytes(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &row.op_code)?;
        sheet.write_string(r, 1, &row.op_type)?;
        if let Some(v) = row.global_call_count {
            sheet.write_number(r, 2, v as f64)?;
        }
        if let Some(v) = row.core_count {
            sheet.write_number(r, 3, f64::from(v))?;
        }
        if let Some(v) = row.kernel_duration_ns {
            sheet.write_number(r, 4, v)?;
        }
        sheet.write_number(r, 5, row.adjusted_utilization)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

/// File stem used to name exports and report tabs: `resnet.v2.csv` -> `resnet`.
pub fn source_stem(name: &str) -> &str {
    let base = base_name(name);
    base.split('.').next().unwrap_or(base)
}

/// One distinct label per input, in input order, for export file names and
/// tab names.
///
/// A source gets its stem when that is still free, then its full file name,
/// then `<stem>_<k>` for the first free `k >= 2`.
pub fn source_labels<S: AsRef<str>>(sources: &[S]) -> Vec<String> {
    let mut taken = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let source = source.as_ref();
            let stem = source_stem(source);
            let label = [stem.to_string(), base_name(source).to_string()]
                .into_iter()
                .chain((2..).map(|k| format!("{stem}_{k}")))
                .find(|l| !taken.contains(l))
                .unwrap_or_else(|| stem.to_string());
            taken.insert(label.clone());
            label
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

/// Write `graph_data_<label>.csv` and `graph_data_<label>.xlsx` into `dir`.
///
/// `label` is used verbatim; see [`source_labels`].
pub fn export_files(label: &str, rows: &[ExportRow], dir: &Path) -> Result<ExportPaths> {
    fs::create_dir_all(dir)?;
    let paths = ExportPaths {
        csv: dir.join(format!("graph_data_{label}.csv")),
        xlsx: dir.join(format!("graph_data_{label}.xlsx")),
    };

    write_csv(rows, fs::File::create(&paths.csv)?)?;
    fs::write(&paths.xlsx, xlsx_bytes(rows)?)?;

    info!(
        rows = rows.len(),
        csv = %paths.csv.display(),
        xlsx = %paths.xlsx.display(),
        "exported graph data"
    );
    Ok(paths)
}

/// Project and export one analysed sheet under `label`, unless
/// `allow_export` is off, in which case nothing is written.
pub fn export_result(
    result: &CategorizedResult,
    label: &str,
    options: &ReportOptions,
    dir: &Path,
) -> Result<Option<ExportPaths>> {
    if !options.allow_export {
        warn!(source = %result.source, "exports are disabled by configuration; skipping");
        return Ok(None);
    }
    let rows = project(&result.categorized);
    export_files(label, &rows, dir).map(Some)
}
