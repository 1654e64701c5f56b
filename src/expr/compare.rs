//! Structural ordering and canonicalization of expression nodes, per
//! `spec.md` §4.A "Compare" and §9's dedup note: "commutative operators must
//! canonicalize their argument order before interning, otherwise `x+y` and
//! `y+x` create two distinct auxs".
//!
//! Because every node is built bottom-up through
//! [`crate::expr::arena::NodeArena::intern`], two structurally-equal
//! subtrees are always already the same [`NodeId`] by the time their parent
//! is built — interning is the thing that makes that true, inductively. So
//! canonical ordering of a commutative argument list only ever has to sort
//! by child `NodeId`, and the structural key of a node only ever has to
//! look at its own immediate payload plus its children's ids, never recurse
//! into grandchildren. [`compare`] does still walk the whole subtree, for
//! callers — dependency graph cycle diagnostics, tests — that want a genuine
//! total order rather than an interning key.

use std::cmp::Ordering;

use compare::Compare as CompareTrait;

use super::node::{ExprKind, NodeId};

/// Sorts the argument list of a commutative node (`Sum`, `Mul`, `Min`,
/// `Max`) in place, by ascending `NodeId`. A no-op for every other variant.
pub fn canonicalize(kind: &ExprKind, _nodes: &[ExprKind]) -> ExprKind {
    match kind {
        ExprKind::Sum(args) => {
            let mut args = args.clone();
            args.sort_unstable();
            ExprKind::Sum(args)
        }
        ExprKind::Mul(args) => {
            let mut args = args.clone();
            args.sort_unstable();
            ExprKind::Mul(args)
        }
        ExprKind::Min(args) => {
            let mut args = args.clone();
            args.sort_unstable();
            ExprKind::Min(args)
        }
        ExprKind::Max(args) => {
            let mut args = args.clone();
            args.sort_unstable();
            ExprKind::Max(args)
        }
        ExprKind::Group(g) => {
            let mut g = g.clone();
            g.linear.sort_unstable_by_key(|(v, _)| v.id());
            g.nonlinear.sort_unstable();
            ExprKind::Group(g)
        }
        ExprKind::Quad(g, q) => {
            let mut g = g.clone();
            g.linear.sort_unstable_by_key(|(v, _)| v.id());
            g.nonlinear.sort_unstable();
            let mut q = q.clone();
            q.sort_unstable_by_key(|(i, j, _)| (i.id(), j.id()));
            ExprKind::Quad(g, q)
        }
        other => other.clone(),
    }
}

/// A canonical key for the interning table: two calls to this function with
/// structurally-equal, already-canonicalized nodes are guaranteed to return
/// equal strings, and two nodes of different shape are guaranteed to return
/// different strings (the operator tag is always the first component).
pub fn structural_key(kind: &ExprKind, _nodes: &[ExprKind]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(32);
    write!(s, "{:?}#", kind.code()).unwrap();
    match kind {
        ExprKind::Const(v) => write!(s, "{}", v.to_bits()).unwrap(),
        ExprKind::Var(i) | ExprKind::LowerBound(i) | ExprKind::UpperBound(i) => {
            write!(s, "{}", i.id()).unwrap()
        }
        ExprKind::Opp(a) | ExprKind::Abs(a) | ExprKind::Exp(a) | ExprKind::Log(a)
        | ExprKind::Sin(a) | ExprKind::Cos(a) | ExprKind::Ref(a) => write!(s, "{}", a.0).unwrap(),
        ExprKind::Sum(args) | ExprKind::Mul(args) | ExprKind::Min(args) | ExprKind::Max(args) => {
            for a in args {
                write!(s, "{},", a.0).unwrap();
            }
        }
        ExprKind::Sub(a, b) | ExprKind::Div(a, b) | ExprKind::Pow(a, b) => {
            write!(s, "{},{}", a.0, b.0).unwrap()
        }
        ExprKind::Group(g) => write_group_key(&mut s, g),
        ExprKind::Quad(g, q) => {
            write_group_key(&mut s, g);
            s.push('|');
            for (i, j, c) in q {
                write!(s, "{}.{}.{},", i.id(), j.id(), c.to_bits()).unwrap();
            }
        }
    }
    s
}

fn write_group_key(s: &mut String, g: &super::node::GroupData) {
    use std::fmt::Write;
    write!(s, "{}|", g.const0.to_bits()).unwrap();
    for (v, c) in &g.linear {
        write!(s, "{}.{},", v.id(), c.to_bits()).unwrap();
    }
    s.push('|');
    for n in &g.nonlinear {
        write!(s, "{},", n.0).unwrap();
    }
}

/// A genuine recursive total order over two subtrees, per `spec.md` §4.A:
/// first by operator tag, then recursively by children (commutative
/// operators are compared after their own argument lists have been sorted).
pub fn compare(nodes: &[ExprKind], a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let ka = &nodes[a.index()];
    let kb = &nodes[b.index()];
    match ka.code().cmp(&kb.code()) {
        Ordering::Equal => {}
        other => return other,
    }
    match (ka, kb) {
        (ExprKind::Const(x), ExprKind::Const(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (ExprKind::Var(x), ExprKind::Var(y))
        | (ExprKind::LowerBound(x), ExprKind::LowerBound(y))
        | (ExprKind::UpperBound(x), ExprKind::UpperBound(y)) => x.cmp(y),
        (ExprKind::Opp(x), ExprKind::Opp(y))
        | (ExprKind::Abs(x), ExprKind::Abs(y))
        | (ExprKind::Exp(x), ExprKind::Exp(y))
        | (ExprKind::Log(x), ExprKind::Log(y))
        | (ExprKind::Sin(x), ExprKind::Sin(y))
        | (ExprKind::Cos(x), ExprKind::Cos(y))
        | (ExprKind::Ref(x), ExprKind::Ref(y)) => compare(nodes, *x, *y),
        (ExprKind::Sum(xs), ExprKind::Sum(ys))
        | (ExprKind::Mul(xs), ExprKind::Mul(ys))
        | (ExprKind::Min(xs), ExprKind::Min(ys))
        | (ExprKind::Max(xs), ExprKind::Max(ys)) => compare_lists(nodes, xs, ys),
        (ExprKind::Sub(xa, xb), ExprKind::Sub(ya, yb))
        | (ExprKind::Div(xa, xb), ExprKind::Div(ya, yb))
        | (ExprKind::Pow(xa, xb), ExprKind::Pow(ya, yb)) => {
            compare(nodes, *xa, *ya).then_with(|| compare(nodes, *xb, *yb))
        }
        (ExprKind::Group(gx), ExprKind::Group(gy)) => compare_groups(nodes, gx, gy),
        (ExprKind::Quad(gx, qx), ExprKind::Quad(gy, qy)) => {
            compare_groups(nodes, gx, gy).then_with(|| qx.len().cmp(&qy.len()))
        }
        _ => Ordering::Equal,
    }
}

fn compare_lists(nodes: &[ExprKind], xs: &[NodeId], ys: &[NodeId]) -> Ordering {
    let mut sx: Vec<NodeId> = xs.to_vec();
    let mut sy: Vec<NodeId> = ys.to_vec();
    sx.sort_unstable();
    sy.sort_unstable();
    match sx.len().cmp(&sy.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    for (a, b) in sx.iter().zip(sy.iter()) {
        match compare(nodes, *a, *b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn compare_groups(
    nodes: &[ExprKind],
    gx: &super::node::GroupData,
    gy: &super::node::GroupData,
) -> Ordering {
    gx.const0
        .partial_cmp(&gy.const0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| gx.linear.len().cmp(&gy.linear.len()))
        .then_with(|| compare_lists(nodes, &gx.nonlinear, &gy.nonlinear))
}

/// Zero-sized adapter exposing [`compare`] through the `compare` crate's
/// [`CompareTrait`], for contexts that want a `Compare<NodeId>` object
/// (e.g. sorting candidate auxiliaries before a deterministic printout).
/// Mirrors this crate's teacher's `CompareSubProblem` adapter, which does
/// the same job for `SubProblem` ranking in a binary heap.
pub struct NodeOrder<'a> {
    nodes: &'a [ExprKind],
}

impl<'a> NodeOrder<'a> {
    pub fn new(nodes: &'a [ExprKind]) -> Self {
        NodeOrder { nodes }
    }
}

impl<'a> CompareTrait<NodeId> for NodeOrder<'a> {
    fn compare(&self, l: &NodeId, r: &NodeId) -> Ordering {
        compare(self.nodes, *l, *r)
    }
}
