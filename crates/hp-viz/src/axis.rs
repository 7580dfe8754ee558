//! Axis range, tick and tick-label planning.

use hp_core::{Error, Result};
use serde::Serialize;

/// Upper bound on generated ticks; a larger count means a mistyped step.
pub const MAX_TICKS: usize = 10_000;

/// Decimal places used for every label of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPrecision {
    /// No decimals.
    Integer,
    /// One decimal.
    One,
    /// Two decimals.
    Two,
}

impl TickPrecision {
    /// Number of decimal places.
    pub fn decimals(self) -> usize {
        match self {
            Self::Integer => 0,
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Format `value` with this precision, never as a negative zero.
    pub fn format(self, value: f64) -> String {
        // Avoid "-0" / "-0.0"
        let v = if value == 0.0 { 0.0 } else { value };
        let s = format!("{:.prec$}", v, prec = self.decimals());
        if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
            s[1..].to_string()
        } else {
            s
        }
    }
}

/// Pick the smallest precision that loses nothing across the interior ticks.
///
/// Interior ticks are formatted to two decimals. A non-zero second decimal
/// anywhere forces two decimals for all labels, a non-zero first decimal
/// forces one, otherwise labels are integers. The first and last tick do
/// not take part.
pub fn select_precision(ticks: &[f64]) -> TickPrecision {
    if ticks.len() < 3 {
        return TickPrecision::Integer;
    }
    let mut need_one = false;
    for &t in &ticks[1..ticks.len() - 1] {
        let s = format!("{t:.2}");
        let Some((_, decimals)) = s.split_once('.') else {
            continue;
        };
        let mut digits = decimals.chars();
        let d1 = digits.next().unwrap_or('0');
        let d2 = digits.next().unwrap_or('0');
        if d2 != '0' {
            return TickPrecision::Two;
        }
        if d1 != '0' {
            need_one = true;
        }
    }
    if need_one { TickPrecision::One } else { TickPrecision::Integer }
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| if i == n - 1 { hi } else { lo + i as f64 * step }).collect()
        }
    }
}

/// Ticks `lo, lo + step, ...` up to and including `hi`.
pub fn stepped_ticks(lo: f64, hi: f64, step: f64) -> Result<Vec<f64>> {
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(Error::Validation(format!("invalid axis range [{lo}, {hi}]")));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(Error::Validation(format!("tick step must be positive, got {step}")));
    }
    let count = ((hi - lo) / step + 1e-9).floor() + 1.0;
    if !count.is_finite() || count > MAX_TICKS as f64 {
        return Err(Error::Validation(format!(
            "tick step {step} over [{lo}, {hi}] gives {count} ticks (max {MAX_TICKS})"
        )));
    }
    let n = count as usize;
    Ok((0..n)
        .map(|i| {
            let v = lo + i as f64 * step;
            if v.abs() < step * 1e-9 { 0.0 } else { v }
        })
        .collect())
}

/// Smallest of `base * {1, 2, 5, 10, 20, 50, ...}` that keeps `[lo, hi]`
/// within [`MAX_TICKS`] ticks.
pub fn fitting_step(lo: f64, hi: f64, base: f64) -> f64 {
    let span = hi - lo;
    if !(span.is_finite() && span > 0.0 && base.is_finite() && base > 0.0) {
        return base;
    }
    let mut decade = base;
    loop {
        for m in [1.0, 2.0, 5.0] {
            let step = decade * m;
            if span / step + 1.0 <= MAX_TICKS as f64 {
                return step;
            }
        }
        decade *= 10.0;
    }
}

/// A planned numeric axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisPlan {
    /// Lower axis limit.
    pub min: f64,
    /// Upper axis limit.
    pub max: f64,
    /// Distance between ticks.
    pub step: f64,
    /// Tick positions from `min` to `max`.
    pub ticks: Vec<f64>,
    /// One label per tick; blank edge labels are empty strings.
    pub labels: Vec<String>,
    /// Precision shared by all labels.
    pub precision: TickPrecision,
}

/// Builds [`AxisPlan`]s, either symmetric around a center or from a custom range.
#[derive(Debug, Clone, Copy)]
pub struct AxisRangePlanner {
    /// Tick step.
    pub step: f64,
    /// Keep the first and last label instead of blanking them.
    pub show_edge_labels: bool,
    /// Forces a precision instead of selecting one from the ticks.
    pub precision: Option<TickPrecision>,
}

impl Default for AxisRangePlanner {
    fn default() -> Self {
        Self { step: 1.0, show_edge_labels: false, precision: None }
    }
}

impl AxisRangePlanner {
    /// Set the tick step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Show or blank the edge labels.
    pub fn with_edge_labels(mut self, show: bool) -> Self {
        self.show_edge_labels = show;
        self
    }

    /// Force a label precision.
    pub fn with_precision(mut self, precision: TickPrecision) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Plan an axis.
    ///
    /// Without `custom_range` the range is `center ± (ceil(max(|min|, |max|)) + 2)`.
    pub fn plan(
        &self,
        values_min: f64,
        values_max: f64,
        center: f64,
        custom_range: Option<[f64; 2]>,
    ) -> Result<AxisPlan> {
        let (min, max) = match custom_range {
            Some([lo, hi]) => (lo, hi),
            None => {
                if !(values_min.is_finite() && values_max.is_finite() && center.is_finite()) {
                    return Err(Error::Validation(
                        "axis planning needs finite extremes and center".to_string(),
                    ));
                }
                let r = values_min.abs().max(values_max.abs()).ceil() + 2.0;
                (center - r, center + r)
            }
        };
        let ticks = stepped_ticks(min, max, self.step)?;
        let precision = self.precision.unwrap_or_else(|| select_precision(&ticks));
        let mut labels: Vec<String> = ticks.iter().map(|&t| precision.format(t)).collect();
        if !self.show_edge_labels {
            if let Some(first) = labels.first_mut() {
                first.clear();
            }
            if let Some(last) = labels.last_mut() {
                last.clear();
            }
        }
        Ok(AxisPlan { min, max, step: self.step, ticks, labels, precision })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn precision_selection() {
        assert_eq!(select_precision(&[1.0, 1.05, 2.0]), TickPrecision::Two);
        assert_eq!(select_precision(&[1.0, 1.5, 2.0]), TickPrecision::One);
        assert_eq!(select_precision(&[1.0, 2.0, 3.0]), TickPrecision::Integer);
    }

    #[test]
    fn precision_ignores_edges() {
        assert_eq!(select_precision(&[0.25, 1.0, 2.75]), TickPrecision::Integer);
        assert_eq!(select_precision(&[0.25, 2.75]), TickPrecision::Integer);
    }

    #[test]
    fn precision_second_decimal_wins() {
        assert_eq!(select_precision(&[0.0, 0.5, 0.75, 1.0]), TickPrecision::Two);
    }

    #[test]
    fn formatting_avoids_negative_zero() {
        assert_eq!(TickPrecision::Integer.format(-0.0), "0");
        assert_eq!(TickPrecision::One.format(-0.01), "0.0");
        assert_eq!(TickPrecision::Two.format(-1.5), "-1.50");
    }

    #[test]
    fn symmetric_default_range() {
        let plan = AxisRangePlanner::default().with_edge_labels(true).plan(0.4, 1.3, 0.0, None).unwrap();
        // ceil(1.3) + 2 = 4
        assert_abs_diff_eq!(plan.min, -4.0);
        assert_abs_diff_eq!(plan.max, 4.0);
        assert_eq!(plan.ticks.len(), 9);
        assert_eq!(plan.labels.first().unwrap(), "-4");
        assert_eq!(plan.labels.last().unwrap(), "4");
        assert_eq!(plan.precision, TickPrecision::Integer);
    }

    #[test]
    fn symmetric_range_around_center() {
        let plan = AxisRangePlanner::default().plan(-2.2, 0.5, 1.0, None).unwrap();
        assert_abs_diff_eq!(plan.min, -4.0);
        assert_abs_diff_eq!(plan.max, 6.0);
    }

    #[test]
    fn custom_range_blanks_edges() {
        let plan = AxisRangePlanner::default().with_step(0.25).plan(0.0, 0.0, 0.0, Some([0.5, 1.5])).unwrap();
        assert_eq!(plan.ticks, vec![0.5, 0.75, 1.0, 1.25, 1.5]);
        assert_eq!(plan.labels, vec!["", "0.75", "1.00", "1.25", ""]);
    }

    #[test]
    fn custom_range_one_decimal() {
        let plan = AxisRangePlanner::default()
            .with_step(0.5)
            .with_edge_labels(true)
            .plan(0.0, 0.0, 0.0, Some([0.0, 2.0]))
            .unwrap();
        assert_eq!(plan.labels, vec!["0.0", "0.5", "1.0", "1.5", "2.0"]);
    }

    #[test]
    fn forced_precision() {
        let plan = AxisRangePlanner::default()
            .with_precision(TickPrecision::One)
            .with_edge_labels(true)
            .plan(0.0, 0.0, 0.0, Some([0.0, 2.0]))
            .unwrap();
        assert_eq!(plan.labels, vec!["0.0", "1.0", "2.0"]);
    }

    #[test]
    fn invalid_ranges() {
        let p = AxisRangePlanner::default();
        assert!(p.plan(0.0, 0.0, 0.0, Some([2.0, 1.0])).is_err());
        assert!(p.with_step(0.0).plan(0.0, 0.0, 0.0, Some([0.0, 1.0])).is_err());
        assert!(p.with_step(1e-9).plan(0.0, 0.0, 0.0, Some([0.0, 1.0])).is_err());
        assert!(p.plan(f64::NAN, 1.0, 0.0, None).is_err());
    }

    #[test]
    fn vanishing_step_is_rejected_not_overflowed() {
        let p = AxisRangePlanner::default().with_step(1e-20);
        let err = p.plan(0.0, 0.0, 0.0, Some([0.0, 1.0]));
        assert!(matches!(err, Err(Error::Validation(_))), "got {err:?}");
        assert!(matches!(stepped_ticks(0.0, f64::MAX, f64::MIN_POSITIVE), Err(Error::Validation(_))));
    }

    #[test]
    fn fitting_step_widens_only_when_needed() {
        assert_eq!(fitting_step(0.0, 10.0, 0.5), 0.5);
        assert_eq!(fitting_step(0.0, 4999.5, 0.5), 0.5);
        assert_eq!(fitting_step(0.0, 6000.0, 0.5), 1.0);
        assert_eq!(fitting_step(0.0, 15_000.0, 0.5), 2.5);
        let step = fitting_step(-1e7, 1e7, 0.5);
        assert!(stepped_ticks(-1e7, 1e7, step).unwrap().len() <= MAX_TICKS);
    }

    #[test]
    fn linspace_endpoints() {
        let xs = linspace(0.0, 10.0, 11);
        assert_eq!(xs.len(), 11);
        assert_abs_diff_eq!(xs[3], 3.0);
        assert_eq!(xs[10], 10.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
