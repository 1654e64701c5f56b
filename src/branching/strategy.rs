//! `spec.md` §4.H branch-point selection strategies. `MidPoint`, `LpClamped`
//! and `LpCentral` need only the variable's bounds and the current LP value;
//! `MinArea` and `Balanced` need the shape of the univariate operator being
//! split and are approximated here by a small grid search over a
//! caller-supplied sample of that operator rather than a closed-form
//! per-operator derivation (see `DESIGN.md`).

/// Midpoint of `[l, u]`, clamped at least `clamp * (u - l)` away from either
/// bound so the resulting children always shrink by a nonzero margin.
pub fn mid_point(l: f64, u: f64, clamp: f64) -> f64 {
    let margin = clamp * (u - l);
    (0.5 * (l + u)).clamp(l + margin, u - margin)
}

/// The current LP value, clamped into `[l + c(u-l), u - c(u-l)]`.
pub fn lp_clamped(lp_value: f64, l: f64, u: f64, c: f64) -> f64 {
    let margin = c * (u - l);
    lp_value.clamp(l + margin, u - margin)
}

/// The current LP value, or the midpoint if that value falls within `c(u-l)`
/// of either bound.
pub fn lp_central(lp_value: f64, l: f64, u: f64, c: f64) -> f64 {
    let margin = c * (u - l);
    if lp_value < l + margin || lp_value > u - margin {
        0.5 * (l + u)
    } else {
        lp_value
    }
}

fn grid_search(l: f64, u: f64, n: usize, cost: impl Fn(f64) -> f64) -> f64 {
    let n = n.max(3);
    let mut best = 0.5 * (l + u);
    let mut best_cost = f64::INFINITY;
    for i in 1..n {
        let p = l + (u - l) * (i as f64) / (n as f64);
        let c = cost(p);
        if c < best_cost {
            best_cost = c;
            best = p;
        }
    }
    best
}

/// Sum, over a handful of sample points on each side of `p`, of the gap
/// between `f` and the secant joining the side's two endpoints — a proxy for
/// the total area of the two one-sided convexifications `p` would produce.
fn secant_gap(a: f64, b: f64, f: &impl Fn(f64) -> f64, reduce: impl Fn(f64, f64) -> f64, init: f64) -> f64 {
    let fa = f(a);
    let fb = f(b);
    let slope = if (b - a).abs() < f64::EPSILON { 0.0 } else { (fb - fa) / (b - a) };
    let steps = 5;
    (0..=steps).fold(init, |acc, i| {
        let t = a + (b - a) * (i as f64) / (steps as f64);
        let secant = fa + slope * (t - a);
        reduce(acc, (secant - f(t)).abs())
    })
}

/// The point minimizing the total area between `f` and the two secants it
/// would induce on `[l, p]` and `[p, u]`.
pub fn min_area(l: f64, u: f64, f: impl Fn(f64) -> f64, n_samples: usize) -> f64 {
    grid_search(l, u, n_samples, |p| {
        secant_gap(l, p, &f, |a, b| a + b, 0.0) + secant_gap(p, u, &f, |a, b| a + b, 0.0)
    })
}

/// The point equalizing the maximum vertical gap on both sides of the split.
pub fn balanced(l: f64, u: f64, f: impl Fn(f64) -> f64, n_samples: usize) -> f64 {
    grid_search(l, u, n_samples, |p| {
        let left_max = secant_gap(l, p, &f, f64::max, 0.0);
        let right_max = secant_gap(p, u, &f, f64::max, 0.0);
        (left_max - right_max).abs()
    })
}
