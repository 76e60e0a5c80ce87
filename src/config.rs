//! Report options, loaded from an optional JSON file and overridden by flags.
//!
//! JSON shape (every field optional):
//! {
//!   "show_averages": true,
//!   "show_pie": true,
//!   "allow_export": true,
//!   "multi_file": false,
//!   "device_op_type": "tt_dnn_device"
//! }

use crate::error::{Result, VizError};
use crate::model::classify::DEVICE_OP_TYPE;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportOptions {
    /// Show the per-category average utilization section.
    pub show_averages: bool,
    /// Show the operation-type pie chart.
    pub show_pie: bool,
    /// Permit writing `graph_data_*` exports (`report --export` and the
    /// `export` subcommand).
    pub allow_export: bool,
    /// Accept more than one input sheet (one tab per sheet).
    pub multi_file: bool,
    /// `OP TYPE` value that marks on-device rows.
    pub device_op_type: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            show_averages: true,
            show_pie: true,
            allow_export: true,
            multi_file: false,
            device_op_type: DEVICE_OP_TYPE.to_string(),
        }
    }
}

impl ReportOptions {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| VizError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let options: ReportOptions = serde_json::from_str(&text)?;
        if options.device_op_type.is_empty() {
            return Err(VizError::Config(format!(
                "device_op_type must not be empty in {}",
                path.display()
            )));
        }
        Ok(options)
    }

    /// Reject input counts the options do not allow.
    pub fn check_inputs(&self, inputs: usize) -> Result<()> {
        if inputs == 0 {
            return Err(VizError::Config("at least one input sheet is required".into()));
        }
        if inputs > 1 && !self.multi_file {
            return Err(VizError::Config(format!(
                "{inputs} input sheets given but multi_file is disabled"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viz.json");
        fs::write(&path, r#"{ "show_pie": false, "multi_file": true }"#).unwrap();
        let options = ReportOptions::load(&path).unwrap();
        assert_eq!(
            options,
            ReportOptions {
                show_pie: false,
                multi_file: true,
                ..ReportOptions::default()
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viz.json");
        fs::write(&path, r#"{ "show_pies": false }"#).unwrap();
        assert!(matches!(ReportOptions::load(&path), Err(VizError::Json(_))));
    }

    #[test]
    fn empty_device_type_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viz.json");
        fs::write(&path, r#"{ "device_op_type": "" }"#).unwrap();
        assert!(matches!(ReportOptions::load(&path), Err(VizError::Config(_))));
    }

    #[test]
    fn several_inputs_need_multi_file() {
        let single = ReportOptions::default();
        assert!(single.check_inputs(1).is_ok());
        assert!(matches!(single.check_inputs(2), Err(VizError::Config(_))));
        assert!(matches!(single.check_inputs(0), Err(VizError::Config(_))));

        let multi = ReportOptions {
            multi_file: true,
            ..ReportOptions::default()
        };
        assert!(multi.check_inputs(3).is_ok());
    }
}
