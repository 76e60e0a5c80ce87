//! Performance graphs for device operation profiles, and L1 buffer occupancy
//! views for profiler databases.
//!
//! Pipeline: `sheet` loads a CSV/XLSX export, `model` derives utilization,
//! categories and aggregates, `chart` describes the figures, `render` lays
//! them out as an HTML report, `export` writes the `graph_data_*` files.
//! `buffers` is the separate SQLite tool.

pub mod buffers;
pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod render;
pub mod sheet;

pub use error::{Result, VizError};
