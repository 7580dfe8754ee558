//! Derived series: stacked totals, Poisson bands and ratios.
//!
//! All functions validate their inputs and return an error instead of
//! emitting NaN or infinity. In [`ratio`] a zero denominator bin yields a
//! ratio of exactly 0.

use hp_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lower/upper envelope of an uncertainty band, one entry per bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandEnvelope {
    /// Lower edge per bin.
    pub lo: Vec<f64>,
    /// Upper edge per bin.
    pub hi: Vec<f64>,
}

/// What to do with an empty bin when a band is rescaled around 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandZeroPolicy {
    /// Return a domain error.
    #[default]
    Fail,
    /// Collapse the band to `[1, 1]` in that bin.
    Unit,
}

/// How the ratio series treats zero denominators; stamped into artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct RatioPolicy {
    /// What the numerator is.
    pub numerator: String,
    /// What the denominator is.
    pub denominator: String,
    /// Result where the denominator is zero.
    pub zero_policy: String,
}

fn check_same_len(a: &[f64], b: &[f64], what: &str) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::Validation(format!(
            "{what} length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

/// Elementwise sum of aligned bin-value sequences.
pub fn stacked_total<V: AsRef<[f64]>>(histograms: &[V]) -> Result<Vec<f64>> {
    let (first, rest) = histograms
        .split_first()
        .ok_or_else(|| Error::Validation("stacked total needs at least one histogram".to_string()))?;
    let mut total = first.as_ref().to_vec();
    for h in rest {
        let h = h.as_ref();
        check_same_len(&total, h, "stacked histogram")?;
        for (acc, v) in total.iter_mut().zip(h) {
            *acc += v;
        }
    }
    Ok(total)
}

fn sqrt_checked(v: f64, bin: usize) -> Result<f64> {
    if !v.is_finite() || v < 0.0 {
        return Err(Error::Domain(format!("Poisson error undefined for bin {bin} with value {v}")));
    }
    Ok(v.sqrt())
}

/// `values ± sqrt(values)` per bin.
pub fn poisson_band(values: &[f64]) -> Result<BandEnvelope> {
    let mut lo = Vec::with_capacity(values.len());
    let mut hi = Vec::with_capacity(values.len());
    for (i, &v) in values.iter().enumerate() {
        let e = sqrt_checked(v, i)?;
        lo.push(v - e);
        hi.push(v + e);
    }
    Ok(BandEnvelope { lo, hi })
}

/// Symmetric Poisson error magnitudes (`sqrt(values)`) per bin.
pub fn poisson_errors(values: &[f64]) -> Result<Vec<f64>> {
    values.iter().enumerate().map(|(i, &v)| sqrt_checked(v, i)).collect()
}

/// `numerator / denominator` per bin; a denominator of exactly 0 gives 0.
pub fn ratio(numerator: &[f64], denominator: &[f64]) -> Result<Vec<f64>> {
    check_same_len(numerator, denominator, "ratio")?;
    Ok(numerator
        .iter()
        .zip(denominator)
        .map(|(&n, &d)| if d == 0.0 { 0.0 } else { n / d })
        .collect())
}

/// Poisson band of `values`, optionally rescaled to be centered at 1.
///
/// In ratio mode the band keeps the relative width of the absolute band:
/// `1 ± sqrt(v)/v`.
pub fn ratio_error_band(values: &[f64], ratio_mode: bool, zeros: BandZeroPolicy) -> Result<BandEnvelope> {
    if !ratio_mode {
        return poisson_band(values);
    }
    let mut lo = Vec::with_capacity(values.len());
    let mut hi = Vec::with_capacity(values.len());
    for (i, &v) in values.iter().enumerate() {
        let e = sqrt_checked(v, i)?;
        if v == 0.0 {
            match zeros {
                BandZeroPolicy::Fail => {
                    return Err(Error::Domain(format!(
                        "ratio band undefined for empty bin {i}"
                    )));
                }
                BandZeroPolicy::Unit => {
                    lo.push(1.0);
                    hi.push(1.0);
                    continue;
                }
            }
        }
        let half = (e + v) / v - 1.0;
        lo.push(1.0 - half);
        hi.push(1.0 + half);
    }
    tracing::debug!(bins = values.len(), "ratio error band computed");
    Ok(BandEnvelope { lo, hi })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn ratio_zero_denominator_is_zero() {
        let r = ratio(&[4.0, 0.0, 9.0], &[2.0, 0.0, 3.0]).unwrap();
        assert_eq!(r, vec![2.0, 0.0, 3.0]);
        let r = ratio(&[5.0], &[0.0]).unwrap();
        assert_eq!(r, vec![0.0]);
    }

    #[test]
    fn ratio_length_mismatch() {
        assert!(matches!(ratio(&[1.0, 2.0], &[1.0]), Err(Error::Validation(_))));
    }

    #[test]
    fn poisson_band_of_four() {
        let b = poisson_band(&[4.0]).unwrap();
        assert_eq!(b.lo, vec![2.0]);
        assert_eq!(b.hi, vec![6.0]);
    }

    #[test]
    fn poisson_band_rejects_negative() {
        assert!(matches!(poisson_band(&[1.0, -1.0]), Err(Error::Domain(_))));
        assert!(matches!(poisson_errors(&[f64::NAN]), Err(Error::Domain(_))));
    }

    #[test]
    fn stacked_total_rejects_empty_and_mismatch() {
        let empty: [Vec<f64>; 0] = [];
        assert!(stacked_total(&empty).is_err());
        assert!(stacked_total(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn ratio_band_centered_at_one() {
        let b = ratio_error_band(&[4.0, 100.0], true, BandZeroPolicy::Fail).unwrap();
        assert_abs_diff_eq!(b.lo[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.hi[0], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.lo[1], 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(b.hi[1], 1.1, epsilon = 1e-12);
    }

    #[test]
    fn ratio_band_without_ratio_mode_is_poisson() {
        let b = ratio_error_band(&[9.0], false, BandZeroPolicy::Fail).unwrap();
        assert_eq!(b, poisson_band(&[9.0]).unwrap());
    }

    #[test]
    fn ratio_band_zero_bin() {
        assert!(matches!(
            ratio_error_band(&[4.0, 0.0], true, BandZeroPolicy::Fail),
            Err(Error::Domain(_))
        ));
        let b = ratio_error_band(&[4.0, 0.0], true, BandZeroPolicy::Unit).unwrap();
        assert_eq!(b.lo[1], 1.0);
        assert_eq!(b.hi[1], 1.0);
        // Without ratio mode an empty bin is a valid zero-width band.
        let b = ratio_error_band(&[0.0], false, BandZeroPolicy::Fail).unwrap();
        assert_eq!(b.lo, vec![0.0]);
    }

    proptest! {
        #[test]
        fn prop_single_stack_is_identity(a in proptest::collection::vec(-1e6f64..1e6, 0..64)) {
            let total = stacked_total(&[a.clone()]).unwrap();
            prop_assert_eq!(total, a);
        }

        #[test]
        fn prop_two_stack_is_elementwise_sum(
            n in 0usize..=64,
            a in proptest::collection::vec(-1e6f64..1e6, 64),
            b in proptest::collection::vec(-1e6f64..1e6, 64),
        ) {
            let total = stacked_total(&[&a[..n], &b[..n]]).unwrap();
            prop_assert_eq!(total.len(), n);
            for i in 0..n {
                prop_assert_eq!(total[i], a[i] + b[i]);
            }
        }
    }
}
