//! Report layout (tabs of sections) and the HTML renderer.

pub mod html;

pub use html::render_html_report;

use crate::chart::{self, ChartSpec};
use crate::config::ReportOptions;
use crate::export::ExportPaths;
use crate::model::CategorizedResult;
use crate::model::aggregate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tab {
    pub name: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
    pub links: Vec<Link>,
    pub charts: Vec<ChartSpec>,
    pub table: Option<TableView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub const NO_DATA: &str = "no data";

fn average_line(avg: &aggregate::CategoryAverage) -> String {
    let value = match avg.mean_utilization {
        Some(m) => format!("{m:.2}%"),
        None => NO_DATA.to_string(),
    };
    format!(
        "Average Utilization for {} Operations: {}",
        avg.category, value
    )
}

fn href_for(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lay out one analysed sheet as a report tab named `name`.
///
/// `exports` lists files already written for this sheet; they are linked by
/// file name, so the report is expected to sit next to them.
pub fn sheet_tab(
    name: &str,
    result: &CategorizedResult,
    options: &ReportOptions,
    exports: Option<&ExportPaths>,
) -> Tab {
    let mut sections = Vec::new();

    if options.show_averages {
        sections.push(Section {
            heading: "Average Utilization".to_string(),
            lines: result.averages.iter().map(average_line).collect(),
            ..Section::default()
        });
    }

    for (category, rows) in result.categorized.iter() {
        let mut section = Section {
            heading: category.heading().to_string(),
            ..Section::default()
        };
        if rows.is_empty() {
            section.lines.push(NO_DATA.to_string());
        } else {
            section.charts = chart::render_category_charts(category, rows);
        }
        sections.push(section);
    }

    if options.show_pie {
        let mut section = Section {
            heading: "Operation Types Pie Chart".to_string(),
            charts: vec![chart::render_bucket_pie(&result.buckets)],
            ..Section::default()
        };
        let bucketed = aggregate::bucketed_duration(&result.buckets);
        if bucketed > result.table_duration_ns {
            section.lines.push(format!(
                "Bucket patterns overlap: buckets sum to {:.0} ns against {:.0} ns of measured kernel time.",
                bucketed, result.table_duration_ns
            ));
        }
        sections.push(section);
    }

    if let Some(paths) = exports {
        sections.push(Section {
            heading: "Download Graph Data".to_string(),
            links: vec![
                Link {
                    label: "Download Data (CSV)".to_string(),
                    href: href_for(&paths.csv),
                },
                Link {
                    label: "Download Data (XLSX)".to_string(),
                    href: href_for(&paths.xlsx),
                },
            ],
            ..Section::default()
        });
    }

    Tab {
        name: name.to_string(),
        sections,
    }
}
