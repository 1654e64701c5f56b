//! Cut representation, `spec.md` §4.G "Cut assembly": every cut generated
//! by this crate is `a·x + b·w ≤/≥/= rhs`, emitted as an "OsiRowCut"-shaped
//! message (`spec.md` §6) so a host LP solver can apply it without this
//! crate knowing anything about the solver's own row representation.

use crate::common::VarIndex;
use crate::domain::Domain;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CutSense {
    Le,
    Ge,
    Eq,
}

/// One linear inequality/equality over a sparse set of variables.
#[derive(Clone, Debug)]
pub struct RowCut {
    pub coeffs: Vec<(VarIndex, f64)>,
    pub sense: CutSense,
    pub rhs: f64,
    /// Valid problem-wide (`true`) or only in the current sub-box (`false`).
    /// `spec.md` §4.G: "all bound-propagation-driven cuts are local."
    pub global: bool,
}

impl RowCut {
    pub fn local(coeffs: Vec<(VarIndex, f64)>, sense: CutSense, rhs: f64) -> Self {
        RowCut { coeffs, sense, rhs, global: false }
    }

    pub fn global(coeffs: Vec<(VarIndex, f64)>, sense: CutSense, rhs: f64) -> Self {
        RowCut { coeffs, sense, rhs, global: true }
    }

    fn lhs(&self, domain: &Domain) -> f64 {
        self.coeffs.iter().map(|(v, c)| c * domain.value(*v)).sum()
    }

    /// `spec.md` §4.G "Violated-only filter": how far the current LP point
    /// sits on the infeasible side of this cut. Positive means violated.
    pub fn violation(&self, domain: &Domain) -> f64 {
        let lhs = self.lhs(domain);
        match self.sense {
            CutSense::Le => lhs - self.rhs,
            CutSense::Ge => self.rhs - lhs,
            CutSense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_violated(&self, domain: &Domain, eps: f64) -> bool {
        self.violation(domain) > eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::VarIndex;

    #[test]
    fn le_cut_reports_positive_violation_past_rhs() {
        let mut d = Domain::new(1);
        d.set_value(VarIndex(0), 5.0);
        let cut = RowCut::local(vec![(VarIndex(0), 1.0)], CutSense::Le, 3.0);
        assert_eq!(2.0, cut.violation(&d));
        assert!(cut.is_violated(&d, 1e-7));
    }

    #[test]
    fn satisfied_cut_is_not_violated() {
        let mut d = Domain::new(1);
        d.set_value(VarIndex(0), 1.0);
        let cut = RowCut::local(vec![(VarIndex(0), 1.0)], CutSense::Le, 3.0);
        assert!(!cut.is_violated(&d, 1e-7));
    }
}
