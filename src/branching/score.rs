//! Infeasibility scoring, `spec.md` §4.H: "Each Aux defines an
//! infeasibility score summarizing how badly its equality is violated at
//! the current LP point."

use crate::common::VarIndex;
use crate::depgraph::DependencyGraph;
use crate::domain::Domain;
use crate::expr::arena::NodeArena;
use crate::expr::eval::evaluate;
use crate::variable::VariableStore;

/// The four aggregation weights of the score formula
/// `weiSum·Σinf + weiAvg·avg + weiMin·min + weiMax·max`.
#[derive(Copy, Clone, Debug)]
pub struct ScoreWeights {
    pub wei_sum: f64,
    pub wei_avg: f64,
    pub wei_min: f64,
    pub wei_max: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights { wei_sum: 1.0, wei_avg: 1.0, wei_min: 1.0, wei_max: 1.0 }
    }
}

/// `|value(w) - image(w)|` at the current LP point: zero for an original
/// (it has no defining equation of its own).
pub fn infeasibility(arena: &NodeArena, vars: &VariableStore, domain: &Domain, k: VarIndex) -> f64 {
    match vars.get(k).image() {
        Some(image) => (domain.value(k) - evaluate(arena, image, domain)).abs(),
        None => 0.0,
    }
}

/// `spec.md` §4.H branching score. For an Aux, the four aggregates all
/// degenerate to its own single `infeasibility` value (so the weights sum
/// linearly); for an original, they aggregate over `infeasibility(w)` for
/// every Aux `w` that mentions it ("For originals, score is aggregated over
/// all auxiliaries that mention them").
pub fn score(
    arena: &NodeArena,
    vars: &VariableStore,
    domain: &Domain,
    deps: &DependencyGraph,
    weights: &ScoreWeights,
    k: VarIndex,
) -> f64 {
    let infs: Vec<f64> = if vars.get(k).is_aux() {
        vec![infeasibility(arena, vars, domain, k)]
    } else {
        deps.dependents_of(k).iter().map(|&w| infeasibility(arena, vars, domain, w)).collect()
    };
    if infs.is_empty() {
        return 0.0;
    }
    let sum: f64 = infs.iter().sum();
    let avg = sum / infs.len() as f64;
    let min = infs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = infs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    weights.wei_sum * sum + weights.wei_avg * avg + weights.wei_min * min + weights.wei_max * max
}
