//! Statistical process control limits and out-of-control detection.

use chrono::NaiveDate;
use lifeflight_domain::{CauseType, ControlMethod};
use serde::Serialize;

use crate::incidents::{IncidentBreakdown, PeriodAggregate};
use crate::stats::{mean, sample_std_dev};

/// d2 bias-correction constant for moving ranges of subgroup size 2.
pub const D2_SUBGROUP_2: f64 = 1.128;

/// Width of the control band in sigmas.
pub const SIGMA_MULTIPLIER: f64 = 3.0;

/// Center line and control limits of a rate series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlLimits {
    pub mean: f64,
    pub ucl: f64,
    pub lcl: f64,
    pub sigma: f64,
}

/// Compute control limits. An empty series yields all zeros.
#[must_use]
pub fn control_limits(rates: &[f64], method: ControlMethod) -> ControlLimits {
    if rates.is_empty() {
        return ControlLimits::default();
    }

    let center = mean(rates);
    let sigma = match method {
        ControlMethod::ThreeSigma => sample_std_dev(rates),
        ControlMethod::Individual if rates.len() > 1 => {
            let moving_ranges: Vec<f64> = rates.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
            mean(&moving_ranges) / D2_SUBGROUP_2
        }
        ControlMethod::Individual => sample_std_dev(rates),
    };

    ControlLimits {
        mean: center,
        ucl: center + SIGMA_MULTIPLIER * sigma,
        lcl: (center - SIGMA_MULTIPLIER * sigma).max(0.0),
        sigma,
    }
}

/// A period whose rate falls outside the control limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignableCause {
    pub period: String,
    pub date: NaiveDate,
    pub incident_rate: f64,
    pub total_missions: u64,
    pub incidents: u64,
    pub cause_type: CauseType,
    pub violation: &'static str,
    pub details: IncidentBreakdown,
}

/// Periods strictly above UCL or strictly below LCL. A rate equal to a limit
/// is in control.
// TODO: add the run rule (8 consecutive periods on one side of the mean).
#[must_use]
pub fn identify_assignable_causes(periods: &[PeriodAggregate], limits: &ControlLimits) -> Vec<AssignableCause> {
    periods
        .iter()
        .filter_map(|p| {
            let cause_type = if p.incident_rate > limits.ucl {
                CauseType::AboveUcl
            } else if p.incident_rate < limits.lcl {
                CauseType::BelowLcl
            } else {
                return None;
            };
            Some(AssignableCause {
                period: p.period.clone(),
                date: p.date,
                incident_rate: p.incident_rate,
                total_missions: p.total_missions,
                incidents: p.incidents,
                cause_type,
                violation: cause_type.violation(),
                details: p.breakdown,
            })
        })
        .collect()
}
