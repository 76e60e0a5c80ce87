//! L1 buffer occupancy from a profiler SQLite database.

pub mod pivot;
pub mod query;

pub use pivot::{BufferPivot, NameGroup, PAGE_SIZE, group_by_name, page_ranges, pivot};
pub use query::{BufferRecord, load, read_buffers};

use crate::render::{Report, Section, Tab};
use tracing::info;

/// Lay out buffer records as a report: paged stacked bars, or one error-bar
/// tab per operation name when `by_name` is set.
pub fn buffer_report(source: &str, records: &[BufferRecord], by_name: bool) -> Report {
    let tabs = if by_name {
        let groups = group_by_name(records);
        info!(names = groups.len(), "grouped buffers by operation name");
        pivot::render_name_tabs(&groups)
    } else {
        let p = pivot(records);
        info!(
            operations = p.len(),
            addresses = p.addresses.len(),
            pages = page_ranges(p.len(), PAGE_SIZE).len(),
            "pivoted buffers"
        );
        let mut sections = pivot::render_pivot_pages(&p);
        if sections.is_empty() {
            sections.push(Section {
                heading: "L1 Utilization Visualizer".to_string(),
                lines: vec![crate::render::NO_DATA.to_string()],
                ..Section::default()
            });
        }
        vec![Tab {
            name: "L1 Utilization".to_string(),
            sections,
        }]
    };

    Report {
        title: "L1 Utilization Visualizer".to_string(),
        subtitle: source.to_string(),
        tabs,
    }
}
