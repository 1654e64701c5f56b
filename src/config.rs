//! Solver-wide configuration, per the option table of `spec.md` §6. Built
//! with [`derive_builder`], the same crate this library's teacher depends on
//! for its own MDD-compilation parameter objects — here it plays the same
//! role: a `#[derive(Builder)]` struct with sane defaults that a caller can
//! override field by field instead of constructing the whole thing by hand.

use derive_builder::Builder;

/// Sampling strategy used when generating tangent cuts for convex/concave
/// univariate operators (`x^2`, `exp`, `log`, …). Corresponds to the
/// `convexification_type` option of `spec.md` §6.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConvexificationType {
    /// One tangent at the current LP value of the argument.
    CurrentPointOnly,
    /// `convexification_points` tangents evenly spaced on `[L, U]`.
    UniformGrid,
    /// `convexification_points / 2` tangents on each side of the current
    /// point.
    AroundCurrentPoint,
}

/// Branch-point selection strategy, per `spec.md` §4.H. Corresponds to the
/// `branch_pt_select` option of `spec.md` §6.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BranchPtSelect {
    /// Midpoint of `[L, U]`, clamped away from the bounds.
    MidPoint,
    /// The point minimizing the total area of the two resulting
    /// convexifications.
    MinArea,
    /// The point equalizing the max vertical distance on both sides.
    Balanced,
    /// LP value clamped into `[L + c(U-L), U - c(U-L)]`.
    LpClamped,
    /// LP value, or the midpoint if the LP value is too close to a bound.
    LpCentral,
}

/// The full set of knobs exposed by this crate, per `spec.md` §6. All fields
/// have defaults matching the behaviour `spec.md` describes as the common
/// case; a caller only needs to override what it wants to change.
///
/// # Example
/// ```
/// # use minlp_core::config::{SolverConfigBuilder, BranchPtSelect};
/// let cfg = SolverConfigBuilder::default()
///     .branch_pt_select(BranchPtSelect::LpClamped)
///     .optimality_bt(false)
///     .build()
///     .unwrap();
/// assert!(!cfg.optimality_bt);
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(setter(into))]
pub struct SolverConfig {
    /// Sampling mode for tangent-based convex envelopes.
    #[builder(default = "ConvexificationType::CurrentPointOnly")]
    pub convexification_type: ConvexificationType,

    /// Number of sample points used by `UniformGrid`/`AroundCurrentPoint`.
    #[builder(default = "4")]
    pub convexification_points: usize,

    /// Enable forward + implied bound tightening (FBBT).
    #[builder(default = "true")]
    pub feasibility_bt: bool,

    /// Enable optimality-based bound tightening (OBBT).
    #[builder(default = "true")]
    pub optimality_bt: bool,

    /// `log2` of the maximum depth at which OBBT always runs; deeper nodes
    /// run it with probability `2^(log_num_obbt_per_level - depth - 1)`.
    /// Negative disables the depth cap, zero disables OBBT entirely.
    #[builder(default = "2")]
    pub log_num_obbt_per_level: i32,

    /// Run an extra tightening pass seeded with NLP-feasible points.
    #[builder(default = "false")]
    pub aggressive_fbbt: bool,

    /// Drop cuts that do not cut off the current LP point by at least `eps`.
    #[builder(default = "true")]
    pub violated_cuts_only: bool,

    /// Branch-point selection strategy.
    #[builder(default = "BranchPtSelect::LpClamped")]
    pub branch_pt_select: BranchPtSelect,

    /// Tolerance below which a fractional value is considered integral.
    #[builder(default = "1e-5")]
    pub integer_tolerance: f64,

    /// Tolerance below which a constraint/aux violation is considered
    /// feasible.
    #[builder(default = "1e-7")]
    pub feas_tolerance: f64,

    /// Minimum improvement a new incumbent must bring over the current
    /// cutoff to be accepted.
    #[builder(default = "1e-5")]
    pub cutoff_decr: f64,

    /// Small clamp fraction `c` used by `BranchPtSelect::LpClamped`.
    #[builder(default = "0.2")]
    pub lp_clamp_fraction: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfigBuilder::default()
            .build()
            .expect("all fields of SolverConfig carry a #[builder(default)]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_both_tightening_passes() {
        let cfg = SolverConfig::default();
        assert!(cfg.feasibility_bt);
        assert!(cfg.optimality_bt);
        assert_eq!(BranchPtSelect::LpClamped, cfg.branch_pt_select);
    }

    #[test]
    fn builder_overrides_individual_fields() {
        let cfg = SolverConfigBuilder::default()
            .optimality_bt(false)
            .convexification_points(8usize)
            .build()
            .unwrap();
        assert!(!cfg.optimality_bt);
        assert_eq!(8, cfg.convexification_points);
        assert!(cfg.feasibility_bt, "untouched fields keep their default");
    }
}
