//! Procedural envelope computation for `sin`/`cos` over an interval, per
//! `spec.md` §9's design note: "numerical care is required" for periodic
//! functions, "anchored at the nearest period crossing". The closed
//! operator set of `spec.md` §3 has no `floor`/`mod` primitive, so this
//! cannot be expressed as a generic symbolic bound-expression tree (see
//! [`crate::expr::bounds`]'s module doc comment) — it is computed directly
//! in floating point and invoked by the bound engine and by the
//! convexifier's periodic envelope construction.
//!
//! The approach: `sin`/`cos` attain their global max/min of `1`/`-1` at
//! `pi/2 + k*pi` (shifted by `pi/2` for `cos`); an interval `[l, u]` only
//! needs to check whether one of those critical points falls inside it. If
//! `u - l >= 2*pi` the interval spans a full period and the envelope is
//! trivially `[-1, 1]`.

use std::f64::consts::PI;

use crate::common::DEFAULT_EPS;

fn nearest_crossing_in(l: f64, u: f64, phase: f64) -> Option<f64> {
    // Critical points are at `phase + k*pi` for integer k. Find the one
    // nearest to the midpoint that still lies in `[l, u]`.
    if u < l {
        return None;
    }
    let mid = (l + u) / 2.0;
    let k = ((mid - phase) / PI).round();
    for cand_k in [k - 1.0, k, k + 1.0] {
        let c = phase + cand_k * PI;
        if c >= l && c <= u {
            return Some(c);
        }
    }
    None
}

/// Tight `[min, max]` envelope of `sin(x)` for `x` ranging over `[l, u]`.
pub fn sin_envelope(l: f64, u: f64) -> (f64, f64) {
    if !l.is_finite() || !u.is_finite() || u - l >= 2.0 * PI {
        return (-1.0, 1.0);
    }
    let mut lo = l.sin().min(u.sin());
    let mut hi = l.sin().max(u.sin());
    // sin attains +1 at pi/2 + 2k*pi, -1 at -pi/2 + 2k*pi = 3pi/2 + 2k*pi.
    if nearest_crossing_in(l, u, PI / 2.0).is_some() {
        hi = hi.max(1.0);
    }
    if nearest_crossing_in(l, u, -PI / 2.0).is_some() {
        lo = lo.min(-1.0);
    }
    (lo, hi)
}

/// Tight `[min, max]` envelope of `cos(x)` for `x` ranging over `[l, u]`.
pub fn cos_envelope(l: f64, u: f64) -> (f64, f64) {
    // cos(x) = sin(x + pi/2); reuse sin's crossing logic on the shifted
    // interval rather than duplicating it.
    if !l.is_finite() || !u.is_finite() {
        return (-1.0, 1.0);
    }
    sin_envelope(l + PI / 2.0, u + PI / 2.0)
}

/// The representative of `sin(x) = v` nearest to `mid`, picked from the two
/// solution families `asin(v) + 2k*pi` and `(pi - asin(v)) + 2k*pi`.
fn nearest_preimage(mid: f64, v: f64) -> f64 {
    let v = v.clamp(-1.0, 1.0);
    let a0 = v.asin();
    let k1 = ((mid - a0) / (2.0 * PI)).round();
    let cand1 = a0 + k1 * 2.0 * PI;
    let a1 = PI - a0;
    let k2 = ((mid - a1) / (2.0 * PI)).round();
    let cand2 = a1 + k2 * 2.0 * PI;
    if (cand1 - mid).abs() <= (cand2 - mid).abs() {
        cand1
    } else {
        cand2
    }
}

/// Backward pre-image of `[lw, uw]` through `sin` for `x` ranging over `[l,
/// u]`, per `spec.md` §4.E's implied-bound table and §9's anchoring note.
/// Returns `None` when an extremum (`nearest_crossing_in` at phase `pi/2`)
/// falls strictly inside `[l, u]`: `sin` is then not monotonic over the
/// whole interval, and a proper pre-image would be a set of disjoint
/// sub-intervals this crate's single-box bound model cannot represent, so no
/// tightening is attempted rather than risk an unsound one. An extremum
/// sitting exactly at an endpoint is fine — the branch is still monotonic
/// over the closed interval.
pub fn sin_implied(l: f64, u: f64, lw: f64, uw: f64) -> Option<(f64, f64)> {
    if !l.is_finite() || !u.is_finite() || u < l || lw > uw {
        return None;
    }
    // An extremum sitting exactly at one endpoint does not break
    // monotonicity over the closed interval (e.g. cos is monotone on the
    // whole of [0, pi] even though both endpoints are extrema); only an
    // extremum strictly in the interior disqualifies the interval.
    if let Some(c) = nearest_crossing_in(l, u, PI / 2.0) {
        if c > l + DEFAULT_EPS && c < u - DEFAULT_EPS {
            return None;
        }
    }
    let mid = (l + u) / 2.0;
    let x_lo = nearest_preimage(mid, lw.clamp(-1.0, 1.0));
    let x_hi = nearest_preimage(mid, uw.clamp(-1.0, 1.0));
    let (new_l, new_u) = if x_lo <= x_hi { (x_lo, x_hi) } else { (x_hi, x_lo) };
    Some((l.max(new_l), u.min(new_u)))
}

/// `cos(x) = sin(x + pi/2)`: reuses [`sin_implied`] on the shifted interval.
pub fn cos_implied(l: f64, u: f64, lw: f64, uw: f64) -> Option<(f64, f64)> {
    if !l.is_finite() || !u.is_finite() {
        return None;
    }
    let (nl, nu) = sin_implied(l + PI / 2.0, u + PI / 2.0, lw, uw)?;
    Some((nl - PI / 2.0, nu - PI / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_interval_away_from_extrema_is_just_endpoints() {
        let (lo, hi) = sin_envelope(0.0, 0.1);
        assert!((lo - 0.0).abs() < 1e-12);
        assert!((hi - 0.1_f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn interval_spanning_pi_over_2_reaches_one() {
        let (_, hi) = sin_envelope(1.0, 2.0);
        assert_eq!(1.0, hi);
    }

    #[test]
    fn interval_spanning_full_period_is_trivial() {
        assert_eq!((-1.0, 1.0), sin_envelope(0.0, 7.0));
    }

    #[test]
    fn cos_is_one_at_zero_crossing() {
        let (_, hi) = cos_envelope(-0.5, 0.5);
        assert_eq!(1.0, hi);
    }

    #[test]
    fn sin_implied_narrows_a_monotonic_branch() {
        // sin is increasing on [0, pi/2]; w = sin(x) in [0, 0.5] implies
        // x in [0, asin(0.5)].
        let (l, u) = sin_implied(0.0, PI / 2.0, 0.0, 0.5).unwrap();
        assert!((l - 0.0).abs() < 1e-9);
        assert!((u - 0.5_f64.asin()).abs() < 1e-9);
    }

    #[test]
    fn sin_implied_refuses_an_interval_straddling_an_extremum() {
        assert_eq!(None, sin_implied(1.0, 2.0, 0.5, 1.0));
    }

    #[test]
    fn cos_implied_narrows_a_monotonic_branch() {
        // cos is decreasing on [0, pi]; w = cos(x) in [0.5, 1.0] implies
        // x in [0, acos(0.5)].
        let (l, u) = cos_implied(0.0, PI, 0.5, 1.0).unwrap();
        assert!((l - 0.0).abs() < 1e-9);
        assert!((u - 0.5_f64.acos()).abs() < 1e-9);
    }

    #[test]
    fn infinite_bounds_give_trivial_envelope() {
        assert_eq!((-1.0, 1.0), sin_envelope(f64::NEG_INFINITY, 3.0));
    }
}
