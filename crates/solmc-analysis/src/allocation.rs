//! The allocation graph: which contracts construct which during their own
//! construction. The transitive closure of a root set yields everything a
//! model must deploy.

use indexmap::IndexSet;
use std::collections::BTreeMap;

use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_ast::walk;
use solmc_ast::Registry;

use crate::error::{Result, TranslateError};

#[derive(Debug, Default)]
pub struct AllocationGraph {
    edges: BTreeMap<ContractId, IndexSet<ContractId>>,
}

impl AllocationGraph {
    /// Scans every constructor body and state-variable initializer for
    /// contract creations. Cycles are a fatal modelling error.
    pub fn build(unit: &SourceUnit, registry: &Registry<'_>) -> Result<Self> {
        let mut graph = AllocationGraph::default();
        for contract in &unit.contracts {
            let sinks = graph.edges.entry(contract.id).or_default();
            let mut record = |e: &Expr| {
                if let ExprKind::Call {
                    kind: CallKind::Creation,
                    callee,
                    args,
                } = &e.kind
                {
                    let ExprKind::New(target) = &callee.kind else {
                        return;
                    };
                    sinks.insert(*target);
                    // A creation passed as a base-typed constructor
                    // argument is a downcast; the field it initializes has
                    // the parameter's static type, so that type is
                    // allocated too.
                    let ctor = registry
                        .contract(*target)
                        .functions
                        .iter()
                        .find(|f| f.kind == FunctionKind::Constructor);
                    for (i, arg) in args.iter().enumerate() {
                        if !matches!(
                            arg.kind,
                            ExprKind::Call {
                                kind: CallKind::Creation,
                                ..
                            }
                        ) {
                            continue;
                        }
                        if let Some(param) = ctor.and_then(|c| c.params.get(i)) {
                            if let SolType::Contract(static_ty) = &param.ty {
                                sinks.insert(*static_ty);
                            }
                        }
                    }
                }
            };
            for var in &contract.state_vars {
                if let Some(init) = &var.init {
                    walk::for_each_subexpr(init, &mut record);
                }
            }
            for func in &contract.functions {
                if func.kind == FunctionKind::Constructor {
                    walk::for_each_expr(&func.body, &mut record);
                }
            }
        }
        graph.check_acyclic(registry)?;
        Ok(graph)
    }

    fn check_acyclic(&self, registry: &Registry<'_>) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Grey,
            Black,
        }
        fn dfs(
            node: ContractId,
            edges: &BTreeMap<ContractId, IndexSet<ContractId>>,
            colors: &mut BTreeMap<ContractId, Color>,
        ) -> Option<ContractId> {
            colors.insert(node, Color::Grey);
            if let Some(sinks) = edges.get(&node) {
                for &next in sinks {
                    match colors.get(&next).copied().unwrap_or(Color::White) {
                        Color::Grey => return Some(next),
                        Color::White => {
                            if let Some(hit) = dfs(next, edges, colors) {
                                return Some(hit);
                            }
                        }
                        Color::Black => {}
                    }
                }
            }
            colors.insert(node, Color::Black);
            None
        }

        let mut colors = BTreeMap::new();
        for &node in self.edges.keys() {
            if colors.get(&node).copied().unwrap_or(Color::White) == Color::White {
                if let Some(hit) = dfs(node, &self.edges, &mut colors) {
                    let name = registry.contract(hit).name.clone();
                    return Err(TranslateError::AllocationCycle(name));
                }
            }
        }
        Ok(())
    }

    /// Contracts constructed while constructing `contract`.
    pub fn allocated_by(&self, contract: ContractId) -> impl Iterator<Item = ContractId> + '_ {
        self.edges
            .get(&contract)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// The transitive allocation closure of a root set, roots included,
    /// in discovery order.
    pub fn closure(&self, roots: &[ContractId]) -> IndexSet<ContractId> {
        let mut seen: IndexSet<ContractId> = roots.iter().copied().collect();
        let mut frontier: Vec<ContractId> = roots.to_vec();
        while let Some(node) = frontier.pop() {
            for next in self.allocated_by(node) {
                if seen.insert(next) {
                    frontier.push(next);
                }
            }
        }
        seen
    }
}
