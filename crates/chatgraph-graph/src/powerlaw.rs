//! Discrete power-law fitting.
//!
//! Model: `p(x) = x^-α / ζ(α, xmin)` for integer `x >= xmin`, where ζ is the
//! Hurwitz zeta function. α is estimated with the continuous-approximation
//! MLE `1 + n / Σ ln(x / (xmin - ½))`; goodness of fit is the
//! Kolmogorov-Smirnov distance between the empirical and model CDFs on the
//! tail.

use std::collections::BTreeMap;

use tracing::{debug, info};

use chatgraph_types::report::PowerLawFit;

use crate::error::FitError;

/// Smallest tail the estimator accepts.
pub const MIN_TAIL: usize = 2;

/// Default lower cutoff for degree fits.
pub const DEFAULT_XMIN: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xmin {
    Fixed(u64),
    /// Pick the cutoff minimising the KS distance.
    Auto,
}

impl Default for Xmin {
    fn default() -> Self {
        Xmin::Fixed(DEFAULT_XMIN)
    }
}

pub fn fit_discrete(data: &[u64], xmin: Xmin) -> Result<PowerLawFit, FitError> {
    let fit = match xmin {
        Xmin::Fixed(k) => fit_with_xmin(data, k)?,
        Xmin::Auto => scan_xmin(data)?,
    };
    info!(
        "Power-law fit: alpha={:.4} xmin={} n_tail={} D={:.4}",
        fit.alpha, fit.xmin, fit.n_tail, fit.ks_distance
    );
    Ok(fit)
}

pub fn fit_with_xmin(data: &[u64], xmin: u64) -> Result<PowerLawFit, FitError> {
    if xmin == 0 {
        return Err(FitError::InvalidXmin(xmin));
    }

    let mut tail: Vec<u64> = data.iter().copied().filter(|&x| x >= xmin).collect();
    if tail.len() < MIN_TAIL {
        return Err(FitError::InsufficientData {
            xmin,
            needed: MIN_TAIL,
            have: tail.len(),
        });
    }
    tail.sort_unstable();

    let n = tail.len() as f64;
    let shift = xmin as f64 - 0.5;
    let log_sum: f64 = tail.iter().map(|&x| (x as f64 / shift).ln()).sum();
    let alpha = 1.0 + n / log_sum;
    let ks_distance = ks_distance(&tail, alpha, xmin).ok_or(FitError::NonFinite { xmin, alpha })?;

    Ok(PowerLawFit {
        alpha,
        xmin,
        n_tail: tail.len(),
        sigma: (alpha - 1.0) / n.sqrt(),
        ks_distance,
    })
}

/// Try every distinct value below the maximum as cutoff.
fn scan_xmin(data: &[u64]) -> Result<PowerLawFit, FitError> {
    let mut candidates: Vec<u64> = data.iter().copied().filter(|&x| x >= 1).collect();
    candidates.sort_unstable();
    candidates.dedup();
    candidates.pop();

    let mut best: Option<PowerLawFit> = None;
    for xmin in candidates {
        let fit = match fit_with_xmin(data, xmin) {
            Ok(fit) => fit,
            Err(e) => {
                debug!("xmin={} skipped: {}", xmin, e);
                continue;
            }
        };
        debug!("xmin={} alpha={:.4} D={:.4}", xmin, fit.alpha, fit.ks_distance);
        if best.as_ref().is_none_or(|b| fit.ks_distance < b.ks_distance) {
            best = Some(fit);
        }
    }

    best.ok_or(FitError::InsufficientData {
        xmin: 1,
        needed: MIN_TAIL,
        have: data.iter().filter(|&&x| x >= 1).count(),
    })
}

/// `P(X < x)` under the fitted model.
///
/// Uses the scaled zeta: the plain values underflow to `0 / 0` once
/// `alpha * ln(xmin)` passes about 745.
pub fn model_cdf(x: u64, alpha: f64, xmin: u64) -> f64 {
    if x <= xmin {
        return 0.0;
    }
    let (x, xmin) = (x as f64, xmin as f64);
    1.0 - (x / xmin).powf(-alpha) * hurwitz_zeta_scaled(alpha, x) / hurwitz_zeta_scaled(alpha, xmin)
}

pub fn model_pmf(x: u64, alpha: f64, xmin: u64) -> f64 {
    if x < xmin {
        return 0.0;
    }
    (x as f64 / xmin as f64).powf(-alpha) / hurwitz_zeta_scaled(alpha, xmin as f64)
}

/// Max gap between empirical `P(X < x)` and the model, over distinct tail
/// values. `tail` must be sorted. `None` if any gap is not finite.
fn ks_distance(tail: &[u64], alpha: f64, xmin: u64) -> Option<f64> {
    let n = tail.len() as f64;
    let mut d: f64 = 0.0;
    let mut below = 0usize;
    let mut i = 0;
    while i < tail.len() {
        let x = tail[i];
        let empirical = below as f64 / n;
        let gap = (empirical - model_cdf(x, alpha, xmin)).abs();
        if !gap.is_finite() {
            return None;
        }
        d = d.max(gap);

        while i < tail.len() && tail[i] == x {
            i += 1;
        }
        below = i;
    }
    Some(d)
}

/// Empirical probability of each tail value beside the fitted pmf.
pub fn pdf_points(data: &[u64], fit: &PowerLawFit) -> Vec<(u64, f64, f64)> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for &x in data.iter().filter(|&&x| x >= fit.xmin) {
        *counts.entry(x).or_insert(0) += 1;
    }
    let n = counts.values().sum::<usize>() as f64;
    counts
        .into_iter()
        .map(|(x, c)| (x, c as f64 / n, model_pmf(x, fit.alpha, fit.xmin)))
        .collect()
}

// Euler-Maclaurin coefficients (2k)! / B_2k.
const ZETA_A: [f64; 12] = [
    12.0,
    -720.0,
    30240.0,
    -1209600.0,
    47900160.0,
    -1.8924375803183791606e9,
    7.47242496e10,
    -2.950130727918164224e12,
    1.1646782814350067249e14,
    -4.5979787224074726105e15,
    1.8152105401943546773e17,
    -7.1661652561756670113e18,
];

/// Hurwitz zeta `ζ(s, q) = Σ_{k>=0} (k + q)^-s` for `s > 1`, `q > 0`.
pub fn hurwitz_zeta(s: f64, q: f64) -> f64 {
    if s <= 1.0 || q <= 0.0 {
        return f64::INFINITY;
    }
    q.powf(-s) * hurwitz_zeta_scaled(s, q)
}

/// `q^s · ζ(s, q) = Σ_{k>=0} ((k + q) / q)^-s`. Stays near 1 for any `s`.
pub fn hurwitz_zeta_scaled(s: f64, q: f64) -> f64 {
    if s <= 1.0 || q <= 0.0 {
        return f64::INFINITY;
    }

    let mut sum = 1.0;
    let mut a = q;
    let mut b = 0.0;
    let mut i = 0;
    while i < 9 || a <= 9.0 {
        i += 1;
        a += 1.0;
        b = (a / q).powf(-s);
        sum += b;
        if (b / sum).abs() < f64::EPSILON {
            return sum;
        }
    }

    let w = a;
    sum += b * w / (s - 1.0);
    sum -= 0.5 * b;
    let mut fact = 1.0;
    let mut k = 0.0;
    for coeff in ZETA_A {
        fact *= s + k;
        b /= w;
        let term = fact * b / coeff;
        sum += term;
        if (term / sum).abs() < f64::EPSILON {
            break;
        }
        k += 1.0;
        fact *= s + k;
        b /= w;
        k += 1.0;
    }
    sum
}
