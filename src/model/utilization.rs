//! Adjusted utilization: ideal vs. measured kernel time, scaled to a full grid.

use crate::sheet::OperationRecord;

/// Core count of a full device grid; utilization is normalized against it.
pub const REFERENCE_CORE_COUNT: f64 = 108.0;

/// `(ideal / kernel) * (108 / core_count) * 100`.
///
/// Missing operands and non-finite results (zero duration, zero cores) give 0.
pub fn adjusted_utilization(
    ideal_ns: Option<f64>,
    kernel_ns: Option<f64>,
    core_count: Option<u32>,
) -> f64 {
    let (Some(ideal), Some(kernel), Some(cores)) = (ideal_ns, kernel_ns, core_count) else {
        return 0.0;
    };
    let v = (ideal / kernel) * (REFERENCE_CORE_COUNT / f64::from(cores)) * 100.0;
    if v.is_finite() { v } else { 0.0 }
}

/// Fill `adjusted_utilization` on every record, device-side or not.
pub fn annotate(records: &mut [OperationRecord]) {
    for r in records.iter_mut() {
        r.adjusted_utilization =
            adjusted_utilization(r.ideal_ns, r.kernel_duration_ns, r.core_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_grid_at_half_ideal_is_full_utilization() {
        assert_eq!(adjusted_utilization(Some(500.0), Some(1000.0), Some(54)), 100.0);
    }

    #[test]
    fn zero_duration_is_zero() {
        assert_eq!(adjusted_utilization(Some(500.0), Some(0.0), Some(54)), 0.0);
        // 0/0 is NaN before normalization.
        assert_eq!(adjusted_utilization(Some(0.0), Some(0.0), Some(54)), 0.0);
    }

    #[test]
    fn zero_cores_is_zero() {
        assert_eq!(adjusted_utilization(Some(500.0), Some(1000.0), Some(0)), 0.0);
    }

    #[test]
    fn missing_operand_is_zero() {
        assert_eq!(adjusted_utilization(None, Some(1000.0), Some(8)), 0.0);
        assert_eq!(adjusted_utilization(Some(1.0), None, Some(8)), 0.0);
        assert_eq!(adjusted_utilization(Some(1.0), Some(1000.0), None), 0.0);
    }

    #[test]
    fn no_upper_bound() {
        let v = adjusted_utilization(Some(1000.0), Some(1000.0), Some(1));
        assert_eq!(v, 10800.0);
    }

    #[test]
    fn annotate_touches_every_row() {
        let mut rows = vec![
            OperationRecord {
                op_code: "Matmul_A".into(),
                op_type: "tt_dnn_device".into(),
                core_count: Some(54),
                kernel_duration_ns: Some(1000.0),
                ideal_ns: Some(500.0),
                global_call_count: Some(1),
                adjusted_utilization: -1.0,
            },
            OperationRecord {
                op_code: "host_copy".into(),
                op_type: "tt_dnn_cpu".into(),
                core_count: Some(0),
                kernel_duration_ns: Some(10.0),
                ideal_ns: Some(10.0),
                global_call_count: Some(2),
                adjusted_utilization: -1.0,
            },
        ];
        annotate(&mut rows);
        assert_eq!(rows[0].adjusted_utilization, 100.0);
        assert_eq!(rows[1].adjusted_utilization, 0.0);
        assert!(rows.iter().all(|r| r.adjusted_utilization.is_finite()));
    }
}
