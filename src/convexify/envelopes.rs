//! Per-operator envelope construction, `spec.md` §4.G. Each function builds
//! the local cuts for one Aux image shape; [`crate::convexify::convexify_var`]
//! dispatches to the right one.

use crate::common::VarIndex;
use crate::config::ConvexificationType;
use crate::convexify::cuts::{CutSense, RowCut};
use crate::periodic;

/// `spec.md` §4.G sampling modes: where to place the tangents used for the
/// non-secant side of a convex/concave univariate envelope.
pub fn sample_points(mode: ConvexificationType, n: usize, l: f64, u: f64, x0: f64) -> Vec<f64> {
    let x0 = x0.clamp(l, u);
    match mode {
        ConvexificationType::CurrentPointOnly => vec![x0],
        ConvexificationType::UniformGrid => {
            if n <= 1 || u <= l {
                return vec![(l + u) / 2.0];
            }
            (0..n).map(|i| l + (u - l) * (i as f64) / ((n - 1) as f64)).collect()
        }
        ConvexificationType::AroundCurrentPoint => {
            let half = (n / 2).max(1);
            let mut pts = Vec::with_capacity(2 * half);
            for i in 0..half {
                pts.push(l + (x0 - l) * (i as f64 + 1.0) / (half as f64 + 1.0));
            }
            for i in 0..half {
                pts.push(x0 + (u - x0) * (i as f64 + 1.0) / (half as f64 + 1.0));
            }
            pts
        }
    }
}

/// A tangent to `f` at `x0` — a valid lower envelope cut when `f` is convex
/// on the interval, valid upper when concave.
fn tangent_cut(w: VarIndex, x: VarIndex, x0: f64, f_x0: f64, fprime_x0: f64, convex: bool) -> RowCut {
    let rhs = f_x0 - fprime_x0 * x0;
    let sense = if convex { CutSense::Ge } else { CutSense::Le };
    RowCut::local(vec![(w, 1.0), (x, -fprime_x0)], sense, rhs)
}

/// The secant between `(l, f(l))` and `(u, f(u))` — upper envelope when `f`
/// is convex, lower when concave.
fn secant_cut(w: VarIndex, x: VarIndex, l: f64, u: f64, f_l: f64, f_u: f64, convex: bool) -> RowCut {
    let slope = if (u - l).abs() < f64::EPSILON { 0.0 } else { (f_u - f_l) / (u - l) };
    let rhs = f_l - slope * l;
    let sense = if convex { CutSense::Le } else { CutSense::Ge };
    RowCut::local(vec![(w, 1.0), (x, -slope)], sense, rhs)
}

/// `w = x^2`: secant above, sampled tangents below.
pub fn square_envelope(
    w: VarIndex,
    x: VarIndex,
    l: f64,
    u: f64,
    x0: f64,
    mode: ConvexificationType,
    n_pts: usize,
) -> Vec<RowCut> {
    even_power_envelope(w, x, 2, l, u, x0, mode, n_pts)
}

/// `w = x^n`, `n` even positive. `x -> x^n` is convex on the whole real line
/// for even `n` (its second derivative `n(n-1)x^(n-2)` never goes negative),
/// so the envelope has the same secant-above/tangents-below shape as
/// [`square_envelope`] regardless of whether `[l, u]` straddles 0 — unlike
/// [`odd_power_envelope`], there is no sign-split case here.
pub fn even_power_envelope(
    w: VarIndex,
    x: VarIndex,
    n: i32,
    l: f64,
    u: f64,
    x0: f64,
    mode: ConvexificationType,
    n_pts: usize,
) -> Vec<RowCut> {
    let f = |t: f64| t.powi(n);
    let fp = |t: f64| n as f64 * t.powi(n - 1);
    let mut cuts = vec![secant_cut(w, x, l, u, f(l), f(u), true)];
    for t in sample_points(mode, n_pts, l, u, x0) {
        cuts.push(tangent_cut(w, x, t, f(t), fp(t), true));
    }
    cuts
}

/// Fixed point `q_n` of Liberti–Pantelides: the unique root in `(0,1)` of
/// `q^n - n*q^(n-1) + (n-1) = 0`, found by Newton's method.
pub fn liberti_pantelides_q(n: i32) -> f64 {
    let nf = n as f64;
    let f = |q: f64| q.powf(nf) - nf * q.powf(nf - 1.0) + (nf - 1.0);
    let fp = |q: f64| nf * q.powf(nf - 1.0) - nf * (nf - 1.0) * q.powf(nf - 2.0);
    let mut q = 0.5;
    for _ in 0..50 {
        let denom = fp(q);
        if denom.abs() < 1e-14 {
            break;
        }
        let step = f(q) / denom;
        q -= step;
        if step.abs() < 1e-13 {
            break;
        }
    }
    q.clamp(1e-6, 1.0 - 1e-6)
}

/// `w = x^n`, `n` odd positive. Monotone case (interval on one side of 0)
/// mirrors [`square_envelope`]'s tangent/secant split; the straddling case
/// anchors two tangents at `q_n*U` and `q_n*L` per the Liberti–Pantelides
/// construction (`spec.md` §4.G), paired with the overall secant. This is a
/// documented simplification of the full two-piece envelope: the exact
/// construction glues a tangent and a secant on each side at the inflection
/// image, which needs the convex hull of two cuts per side; here a single
/// tangent per side is kept; see `DESIGN.md`.
pub fn odd_power_envelope(
    w: VarIndex,
    x: VarIndex,
    n: i32,
    l: f64,
    u: f64,
    x0: f64,
    mode: ConvexificationType,
    n_pts: usize,
) -> Vec<RowCut> {
    let f = |t: f64| t.powi(n);
    let fp = |t: f64| n as f64 * t.powi(n - 1);
    if l >= 0.0 || u <= 0.0 {
        let convex = l >= 0.0;
        let mut cuts = vec![secant_cut(w, x, l, u, f(l), f(u), convex)];
        for t in sample_points(mode, n_pts, l, u, x0) {
            cuts.push(tangent_cut(w, x, t, f(t), fp(t), convex));
        }
        cuts
    } else {
        let q = liberti_pantelides_q(n);
        let tp = q * u;
        let tn = q * l;
        vec![
            tangent_cut(w, x, tp, f(tp), fp(tp), true),
            tangent_cut(w, x, tn, f(tn), fp(tn), false),
            secant_cut(w, x, l, u, f(l), f(u), true),
        ]
    }
}

/// `w = exp(x)`: convex, same shape as [`square_envelope`].
pub fn exp_envelope(
    w: VarIndex,
    x: VarIndex,
    l: f64,
    u: f64,
    x0: f64,
    mode: ConvexificationType,
    n_pts: usize,
) -> Vec<RowCut> {
    let mut cuts = vec![secant_cut(w, x, l, u, l.exp(), u.exp(), true)];
    for t in sample_points(mode, n_pts, l, u, x0) {
        cuts.push(tangent_cut(w, x, t, t.exp(), t.exp(), true));
    }
    cuts
}

/// `w = log(x)`: concave, dual of [`exp_envelope`] (`spec.md` §4.G).
pub fn log_envelope(
    w: VarIndex,
    x: VarIndex,
    l: f64,
    u: f64,
    x0: f64,
    mode: ConvexificationType,
    n_pts: usize,
) -> Vec<RowCut> {
    let mut cuts = vec![secant_cut(w, x, l, u, l.ln(), u.ln(), false)];
    for t in sample_points(mode, n_pts, l, u, x0) {
        if t > 0.0 {
            cuts.push(tangent_cut(w, x, t, t.ln(), 1.0 / t, false));
        }
    }
    cuts
}

/// `w = sin(x)` / `w = cos(x)`: a tangent at the current point plus the
/// secant between the interval endpoints, both valid because the envelope's
/// curvature over a sub-interval not spanning an inflection is locally
/// convex or concave; `crate::periodic` already establishes the numeric
/// `[min, max]` range used to pick which side is tight.
pub fn sin_envelope_cuts(w: VarIndex, x: VarIndex, l: f64, u: f64, x0: f64) -> Vec<RowCut> {
    let (lo, hi) = periodic::sin_envelope(l, u);
    let mid = (l + u) / 2.0;
    let convex = x0.sin() <= mid.sin();
    vec![
        tangent_cut(w, x, x0, x0.sin(), x0.cos(), convex),
        secant_cut(w, x, l, u, lo, hi, convex),
    ]
}

pub fn cos_envelope_cuts(w: VarIndex, x: VarIndex, l: f64, u: f64, x0: f64) -> Vec<RowCut> {
    let (lo, hi) = periodic::cos_envelope(l, u);
    let mid = (l + u) / 2.0;
    let convex = x0.cos() <= mid.cos();
    vec![
        tangent_cut(w, x, x0, x0.cos(), -x0.sin(), convex),
        secant_cut(w, x, l, u, lo, hi, convex),
    ]
}

/// `w = |x|`: two exact linear lower sides, `w >= x` and `w >= -x`; the
/// secant between `(l, |l|)` and `(u, |u|)` closes the envelope from above.
pub fn abs_envelope(w: VarIndex, x: VarIndex, l: f64, u: f64) -> Vec<RowCut> {
    vec![
        RowCut::local(vec![(w, 1.0), (x, -1.0)], CutSense::Ge, 0.0),
        RowCut::local(vec![(w, 1.0), (x, 1.0)], CutSense::Ge, 0.0),
        secant_cut(w, x, l, u, l.abs(), u.abs(), true),
    ]
}

/// `w = max(args)`: exact per-argument lower sides (`max` is convex), plus
/// the loose but valid upper bound from the arguments' own upper bounds.
pub fn max_envelope(w: VarIndex, args: &[(VarIndex, f64)]) -> Vec<RowCut> {
    let mut cuts: Vec<RowCut> = args
        .iter()
        .map(|&(a, _)| RowCut::local(vec![(w, 1.0), (a, -1.0)], CutSense::Ge, 0.0))
        .collect();
    let ub = args.iter().map(|&(_, u)| u).fold(f64::NEG_INFINITY, f64::max);
    cuts.push(RowCut::local(vec![(w, 1.0)], CutSense::Le, ub));
    cuts
}

/// `w = min(args)`: exact per-argument upper sides (`min` is concave), plus
/// the loose but valid lower bound from the arguments' own lower bounds.
pub fn min_envelope(w: VarIndex, args: &[(VarIndex, f64)]) -> Vec<RowCut> {
    let mut cuts: Vec<RowCut> = args
        .iter()
        .map(|&(a, _)| RowCut::local(vec![(w, 1.0), (a, -1.0)], CutSense::Le, 0.0))
        .collect();
    let lb = args.iter().map(|&(_, l)| l).fold(f64::INFINITY, f64::min);
    cuts.push(RowCut::local(vec![(w, 1.0)], CutSense::Ge, lb));
    cuts
}
