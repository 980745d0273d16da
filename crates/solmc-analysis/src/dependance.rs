//! Contract dependance: the query surface over the allocation graph, the
//! flattened inheritance view, and per-function reach. Two build modes:
//! full-source (everything) and model-driven (closure of a root set).

use indexmap::IndexSet;
use std::collections::BTreeMap;

use solmc_ast::ast::*;
use solmc_ast::Registry;
use tracing::debug;

use crate::allocation::AllocationGraph;
use crate::error::{Result, TranslateError};
use crate::inheritance::Inheritance;
use crate::reach::{function_reach, FunctionReach};

#[derive(Debug)]
pub struct ContractDependance {
    /// Root contracts, in actor order.
    model: Vec<ContractId>,
    /// Every contract the output must define.
    contracts: IndexSet<ContractId>,
    /// Every function body the output must emit.
    executed: IndexSet<FunctionId>,
    interfaces: BTreeMap<ContractId, Vec<FunctionId>>,
    superchain: BTreeMap<FunctionId, Vec<FunctionId>>,
    func_roi: BTreeMap<FunctionId, IndexSet<FunctionId>>,
    map_roi: BTreeMap<FunctionId, IndexSet<DeclId>>,
}

impl ContractDependance {
    /// Every contract and every exposed function is included. Meant for
    /// whole-source translation and for codegen tests.
    pub fn full_source(
        unit: &SourceUnit,
        registry: &Registry<'_>,
        inheritance: &Inheritance,
    ) -> Result<Self> {
        let model: Vec<ContractId> = unit.contracts.iter().map(|c| c.id).collect();
        let contracts: IndexSet<ContractId> = model.iter().copied().collect();
        let mut executed = IndexSet::new();
        for contract in &unit.contracts {
            for f in &contract.functions {
                executed.insert(f.id);
            }
        }
        Self::assemble(model, contracts, executed, registry, inheritance)
    }

    /// Starts from the named roots and expands through allocation,
    /// override resolution, and calls until a fixed point.
    pub fn model_driven(
        model_names: &[String],
        registry: &Registry<'_>,
        inheritance: &Inheritance,
        allocations: &AllocationGraph,
    ) -> Result<Self> {
        let mut model = Vec::new();
        for name in model_names {
            let contract = registry
                .contract_by_name(name)
                .ok_or_else(|| TranslateError::UnknownModelContract(name.clone()))?;
            model.push(contract.id);
        }

        let mut contracts = allocations.closure(&model);

        // Seed with the interfaces and constructor chains of everything
        // deployed, then chase calls, super-chains, and creations.
        let mut executed: IndexSet<FunctionId> = IndexSet::new();
        let mut frontier: Vec<FunctionId> = Vec::new();
        let seed = |contracts: &IndexSet<ContractId>,
                        executed: &mut IndexSet<FunctionId>,
                        frontier: &mut Vec<FunctionId>| {
            for &cid in contracts.iter() {
                let flat = inheritance.flat(cid);
                for fid in flat.interface(registry) {
                    if executed.insert(fid) {
                        frontier.push(fid);
                    }
                }
                for &fid in &flat.constructors {
                    if executed.insert(fid) {
                        frontier.push(fid);
                    }
                }
            }
        };
        seed(&contracts, &mut executed, &mut frontier);

        while let Some(fid) = frontier.pop() {
            let func = registry.function(fid);
            let FunctionReach {
                calls,
                maps: _,
                creates,
            } = function_reach(func);
            for callee in calls {
                if executed.insert(callee) {
                    frontier.push(callee);
                }
                let owner = registry.function_owner(callee).id;
                if contracts.insert(owner) {
                    seed(
                        &[owner].into_iter().collect(),
                        &mut executed,
                        &mut frontier,
                    );
                }
            }
            for created in creates {
                let grown = allocations.closure(&[created]);
                for cid in grown {
                    if contracts.insert(cid) {
                        seed(
                            &[cid].into_iter().collect(),
                            &mut executed,
                            &mut frontier,
                        );
                    }
                }
            }
            // Methods reachable only via the super chain are still emitted.
            let owner = registry.function_owner(fid).id;
            if let Some(chain) = inheritance.flat(owner).superchain.get(&fid) {
                for &hidden in chain {
                    if executed.insert(hidden) {
                        frontier.push(hidden);
                    }
                }
            }
        }

        Self::assemble(model, contracts, executed, registry, inheritance)
    }

    fn assemble(
        model: Vec<ContractId>,
        contracts: IndexSet<ContractId>,
        executed: IndexSet<FunctionId>,
        registry: &Registry<'_>,
        inheritance: &Inheritance,
    ) -> Result<Self> {
        let mut interfaces = BTreeMap::new();
        let mut superchain = BTreeMap::new();
        for &cid in &contracts {
            let flat = inheritance.flat(cid);
            interfaces.insert(cid, flat.interface(registry));
            for (&winner, chain) in &flat.superchain {
                superchain.insert(winner, chain.clone());
            }
        }

        // Region-of-influence fixed point over the direct-call graph.
        let mut direct: BTreeMap<FunctionId, FunctionReach> = BTreeMap::new();
        for &fid in &executed {
            direct.insert(fid, function_reach(registry.function(fid)));
        }
        let mut func_roi: BTreeMap<FunctionId, IndexSet<FunctionId>> = executed
            .iter()
            .map(|&fid| (fid, direct[&fid].calls.clone()))
            .collect();
        let mut map_roi: BTreeMap<FunctionId, IndexSet<DeclId>> = executed
            .iter()
            .map(|&fid| (fid, direct[&fid].maps.clone()))
            .collect();
        loop {
            let mut changed = false;
            for &fid in &executed {
                let callees: Vec<FunctionId> = func_roi[&fid].iter().copied().collect();
                for callee in callees {
                    let (more_funcs, more_maps) = match (func_roi.get(&callee), map_roi.get(&callee))
                    {
                        (Some(f), Some(m)) => (f.clone(), m.clone()),
                        _ => continue,
                    };
                    let funcs = func_roi.get_mut(&fid).expect("seeded");
                    for extra in more_funcs {
                        changed |= funcs.insert(extra);
                    }
                    let maps = map_roi.get_mut(&fid).expect("seeded");
                    for extra in more_maps {
                        changed |= maps.insert(extra);
                    }
                }
            }
            if !changed {
                break;
            }
        }

        debug!(
            contracts = contracts.len(),
            functions = executed.len(),
            "contract dependance assembled"
        );

        Ok(ContractDependance {
            model,
            contracts,
            executed,
            interfaces,
            superchain,
            func_roi,
            map_roi,
        })
    }

    /// The modeled contracts, in actor order.
    pub fn get_model(&self) -> &[ContractId] {
        &self.model
    }

    /// Every function the output emits, including super-chain bodies.
    pub fn get_executed_code(&self) -> &IndexSet<FunctionId> {
        &self.executed
    }

    pub fn is_deployed(&self, contract: ContractId) -> bool {
        self.contracts.contains(&contract)
    }

    pub fn get_interface(&self, contract: ContractId) -> &[FunctionId] {
        self.interfaces
            .get(&contract)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_superchain(&self, func: FunctionId) -> &[FunctionId] {
        self.superchain
            .get(&func)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_function_roi(&self, func: FunctionId) -> Option<&IndexSet<FunctionId>> {
        self.func_roi.get(&func)
    }

    pub fn get_map_roi(&self, func: FunctionId) -> Option<&IndexSet<DeclId>> {
        self.map_roi.get(&func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmc_ast::builder as b;
    use solmc_ast::types::SolType;

    fn build_all(
        unit: &SourceUnit,
    ) -> (Registry<'_>, Inheritance, AllocationGraph) {
        let registry = Registry::build(unit);
        let inheritance = Inheritance::build(unit, &registry).unwrap();
        let allocations = AllocationGraph::build(unit, &registry).unwrap();
        (registry, inheritance, allocations)
    }

    #[test]
    fn full_source_includes_everything() {
        let f = b::FunctionBuilder::new("f").body(vec![]);
        let f_id = f.id;
        let g = b::FunctionBuilder::new("g").internal().body(vec![]);
        let g_id = g.id;
        let a = b::ContractBuilder::new("A").function(f).function(g).build();
        let a_id = a.id;
        let unit = b::unit(vec![a]);
        let (registry, inheritance, _) = build_all(&unit);
        let deps = ContractDependance::full_source(&unit, &registry, &inheritance).unwrap();

        assert_eq!(deps.get_model(), &[a_id]);
        assert!(deps.is_deployed(a_id));
        assert!(deps.get_executed_code().contains(&f_id));
        assert!(deps.get_executed_code().contains(&g_id));
        // only the public f is in the interface
        assert_eq!(deps.get_interface(a_id), &[f_id]);
    }

    #[test]
    fn model_driven_reaches_internal_calls_and_maps() {
        let m = b::var_decl("m", b::mapping(b::t_uint(), b::t_uint()));
        let m_id = m.id;
        let g = b::FunctionBuilder::new("g")
            .internal()
            .body(vec![b::expr_stmt(b::index(
                b::decl_ref(&m),
                b::num(1),
                b::t_uint(),
            ))]);
        let g_id = g.id;
        let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(b::internal_call(
            b::func_ref("g", g_id),
            vec![],
            SolType::Tuple(vec![]),
        ))]);
        let f_id = f.id;
        let h = b::FunctionBuilder::new("h").internal().body(vec![]);
        let h_id = h.id;
        let a = b::ContractBuilder::new("A")
            .state(m)
            .function(f)
            .function(g)
            .function(h)
            .build();
        let unit = b::unit(vec![a]);
        let (registry, inheritance, allocations) = build_all(&unit);
        let deps = ContractDependance::model_driven(
            &["A".to_string()],
            &registry,
            &inheritance,
            &allocations,
        )
        .unwrap();

        assert!(deps.get_executed_code().contains(&f_id));
        assert!(deps.get_executed_code().contains(&g_id));
        // h is internal and never called
        assert!(!deps.get_executed_code().contains(&h_id));

        // f reaches g's map transitively
        assert!(deps.get_function_roi(f_id).unwrap().contains(&g_id));
        assert!(deps.get_map_roi(f_id).unwrap().contains(&m_id));
    }

    #[test]
    fn model_driven_rejects_unknown_roots() {
        let unit = b::unit(vec![b::ContractBuilder::new("A").build()]);
        let (registry, inheritance, allocations) = build_all(&unit);
        let err = ContractDependance::model_driven(
            &["Nope".to_string()],
            &registry,
            &inheritance,
            &allocations,
        )
        .unwrap_err();
        assert_eq!(err, TranslateError::UnknownModelContract("Nope".into()));
    }
}
