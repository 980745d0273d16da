//! Intraprocedural taint propagation: flow-insensitive, field-insensitive,
//! and fail-safe. Used to reason about which inputs can steer
//! address-typed state; deliberately coarse.

use std::collections::BTreeMap;

use solmc_ast::ast::*;
use solmc_ast::walk;

/// Taint state over a fixed set of sources. Bits only ever go 0 → 1; the
/// analysis runs to a fixed point.
#[derive(Debug)]
pub struct TaintAnalysis {
    sources: usize,
    taint: BTreeMap<DeclId, Vec<bool>>,
    untainted: Vec<bool>,
}

impl TaintAnalysis {
    /// Analysis over sources numbered `0..sources`.
    pub fn new(sources: usize) -> Self {
        TaintAnalysis {
            sources,
            taint: BTreeMap::new(),
            untainted: vec![false; sources],
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Flags a declaration as tainted by source `i` before the run.
    pub fn taint(&mut self, decl: DeclId, source: usize) {
        assert!(source < self.sources, "source index out of range");
        self.entry(decl)[source] = true;
    }

    /// The taint vector for a declaration; never-seen declarations are
    /// untainted.
    pub fn taint_for(&self, decl: DeclId) -> &[bool] {
        self.taint
            .get(&decl)
            .map(Vec::as_slice)
            .unwrap_or(&self.untainted)
    }

    fn entry(&mut self, decl: DeclId) -> &mut Vec<bool> {
        let sources = self.sources;
        self.taint.entry(decl).or_insert_with(|| vec![false; sources])
    }

    /// Runs propagation over one function body until no bit changes.
    pub fn run(&mut self, func: &Function) {
        loop {
            let mut changed = false;
            walk::for_each_expr(&func.body, &mut |e| {
                if let ExprKind::Assign { lhs, rhs, .. } = &e.kind {
                    if let Some(dest) = destination(lhs) {
                        changed |= self.absorb(dest, rhs);
                    }
                }
            });
            walk::for_each_stmt(&func.body, &mut |s| {
                if let Stmt::Declare(decl) = s {
                    if let Some(init) = &decl.init {
                        changed |= self.absorb(decl.id, init);
                    }
                }
            });
            if !changed {
                break;
            }
        }
    }

    /// Unions into `dest` the taint of every declaration referenced inside
    /// `expr`. Any function call inside the expression taints `dest` with
    /// every source, since callees are not tracked.
    fn absorb(&mut self, dest: DeclId, expr: &Expr) -> bool {
        let mut incoming = vec![false; self.sources];
        let mut saw_call = false;
        walk::for_each_subexpr(expr, &mut |e| match &e.kind {
            ExprKind::Identifier {
                decl: Some(DeclRef::Var(id)),
                ..
            }
            | ExprKind::MemberAccess {
                decl: Some(DeclRef::Var(id)),
                ..
            } => {
                for (bit, &set) in incoming.iter_mut().zip(self.taint_for(*id)) {
                    *bit |= set;
                }
            }
            ExprKind::Call { .. } => saw_call = true,
            _ => {}
        });
        if saw_call {
            incoming = vec![true; self.sources];
        }

        let dest_bits = self.entry(dest);
        let mut changed = false;
        for (bit, new) in dest_bits.iter_mut().zip(incoming) {
            if new && !*bit {
                *bit = true;
                changed = true;
            }
        }
        changed
    }
}

/// The destination declaration of an assignment left-hand side: the first
/// identifier or resolved member reached. More than one would be a front-
/// end defect; the first wins, keeping the analysis fail-safe.
fn destination(lhs: &Expr) -> Option<DeclId> {
    match &lhs.unparen().kind {
        ExprKind::Identifier {
            decl: Some(DeclRef::Var(id)),
            ..
        } => Some(*id),
        ExprKind::MemberAccess {
            decl: Some(DeclRef::Var(id)),
            ..
        } => Some(*id),
        ExprKind::MemberAccess { base, .. } => destination(base),
        ExprKind::IndexAccess { base, .. } => destination(base),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmc_ast::builder as b;
    use solmc_ast::types::SolType;

    #[test]
    fn direct_assignment_propagates() {
        let src = b::var_decl("src", b::t_address());
        let dst = b::var_decl("dst", b::t_address());
        let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(b::assign(
            b::decl_ref(&dst),
            b::decl_ref(&src),
        ))]);

        let mut taint = TaintAnalysis::new(2);
        taint.taint(src.id, 1);
        taint.run(&f);
        assert_eq!(taint.taint_for(dst.id), &[false, true]);
        assert_eq!(taint.taint_for(src.id), &[false, true]);
    }

    #[test]
    fn transitive_chain_reaches_fixed_point() {
        let a = b::var_decl("a", b::t_uint());
        let x = b::var_decl("x", b::t_uint());
        let y = b::var_decl("y", b::t_uint());
        // y = x; x = a;  — ordered so one pass is not enough.
        let f = b::FunctionBuilder::new("f").body(vec![
            b::expr_stmt(b::assign(b::decl_ref(&y), b::decl_ref(&x))),
            b::expr_stmt(b::assign(b::decl_ref(&x), b::decl_ref(&a))),
        ]);

        let mut taint = TaintAnalysis::new(1);
        taint.taint(a.id, 0);
        taint.run(&f);
        assert_eq!(taint.taint_for(y.id), &[true]);
    }

    #[test]
    fn calls_taint_with_every_source() {
        let dst = b::var_decl("dst", b::t_uint());
        let g = b::fresh_function_id();
        let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(b::assign(
            b::decl_ref(&dst),
            b::internal_call(b::func_ref("g", g), vec![], SolType::Uint(256)),
        ))]);

        let mut taint = TaintAnalysis::new(3);
        taint.run(&f);
        assert_eq!(taint.taint_for(dst.id), &[true, true, true]);
    }

    #[test]
    fn declaration_initializers_propagate() {
        let src = b::var_decl("src", b::t_uint());
        let local = b::var_decl_init("local", b::t_uint(), b::decl_ref(&src));
        let local_id = local.id;
        let f = b::FunctionBuilder::new("f").body(vec![b::declare(local)]);

        let mut taint = TaintAnalysis::new(1);
        taint.taint(src.id, 0);
        taint.run(&f);
        assert_eq!(taint.taint_for(local_id), &[true]);
    }

    #[test]
    fn untouched_variables_stay_clean() {
        let v = b::var_decl("v", b::t_uint());
        let f = b::FunctionBuilder::new("f").body(vec![]);
        let mut taint = TaintAnalysis::new(2);
        taint.run(&f);
        assert_eq!(taint.taint_for(v.id), &[false, false]);
    }
}
