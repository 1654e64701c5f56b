//! McCormick envelopes for bilinear terms, `spec.md` §4.G: "`w = xy` —
//! McCormick envelope: four inequalities `w ≥ L_x y + L_y x − L_x L_y`,
//! etc." Also backs `w = x/y` by rewriting it as `x = w·y` and applying the
//! same four inequalities to `(w, y)` in place of `(x, y)`.

use crate::common::VarIndex;
use crate::convexify::cuts::{CutSense, RowCut};

/// The four standard McCormick inequalities for `w = x*y` given `x` bounds
/// `[lx, ux]` and `y` bounds `[ly, uy]`:
///
/// ```text
/// w >= lx*y + ly*x - lx*ly   (underestimator 1)
/// w >= ux*y + uy*x - ux*uy   (underestimator 2)
/// w <= ux*y + ly*x - ux*ly   (overestimator 1)
/// w <= lx*y + uy*x - lx*uy   (overestimator 2)
/// ```
pub fn bilinear_envelope(w: VarIndex, x: VarIndex, y: VarIndex, lx: f64, ux: f64, ly: f64, uy: f64) -> Vec<RowCut> {
    vec![
        RowCut::local(vec![(w, 1.0), (y, -lx), (x, -ly)], CutSense::Ge, -lx * ly),
        RowCut::local(vec![(w, 1.0), (y, -ux), (x, -uy)], CutSense::Ge, -ux * uy),
        RowCut::local(vec![(w, 1.0), (y, -ux), (x, -ly)], CutSense::Le, -ux * ly),
        RowCut::local(vec![(w, 1.0), (y, -lx), (x, -uy)], CutSense::Le, -lx * uy),
    ]
}

/// `w = x/y`, rewritten as `x = w*y`: the same four inequalities applied to
/// `(w, y)` standing in for `(x, y)` in the bilinear relation `x = w*y`,
/// given `w`'s own current bounds `[lw, uw]`. Per `spec.md` §4.G, the caller
/// is responsible for branching first if `y` straddles zero — this function
/// assumes `ly`/`uy` already exclude that case.
pub fn division_envelope(
    x: VarIndex,
    w: VarIndex,
    y: VarIndex,
    lw: f64,
    uw: f64,
    ly: f64,
    uy: f64,
) -> Vec<RowCut> {
    // x = w*y  =>  reuse bilinear_envelope with the product variable x
    // standing in for McCormick's "w", and (w, y) as the two factors.
    bilinear_envelope(x, w, y, lw, uw, ly, uy)
}
