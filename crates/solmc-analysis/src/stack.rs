//! The analysis stack: builds every analysis once, in dependency order,
//! and hands the translation layer a single read-only query surface.

use tracing::debug;

use solmc_ast::ast::SourceUnit;
use solmc_ast::Registry;

use crate::addresses::AddressSummary;
use crate::allocation::AllocationGraph;
use crate::config::TranslationConfig;
use crate::dependance::ContractDependance;
use crate::error::Result;
use crate::inheritance::Inheritance;
use crate::taint::TaintAnalysis;
use crate::types::TypeAnalyzer;

pub struct AnalysisStack<'a> {
    pub unit: &'a SourceUnit,
    pub registry: Registry<'a>,
    pub types: TypeAnalyzer,
    pub allocations: AllocationGraph,
    pub inheritance: Inheritance,
    pub dependance: ContractDependance,
    pub addresses: AddressSummary,
}

impl<'a> AnalysisStack<'a> {
    pub fn build(unit: &'a SourceUnit, config: &TranslationConfig) -> Result<Self> {
        let registry = Registry::build(unit);
        let types = TypeAnalyzer::new(unit)?;
        let allocations = AllocationGraph::build(unit, &registry)?;
        let inheritance = Inheritance::build(unit, &registry)?;
        let dependance = if config.model.is_empty() {
            ContractDependance::full_source(unit, &registry, &inheritance)?
        } else {
            ContractDependance::model_driven(&config.model, &registry, &inheritance, &allocations)?
        };
        let addresses = AddressSummary::build(unit, &dependance, types.map_db());
        debug!(
            actors = dependance.get_model().len(),
            addresses = addresses.size(),
            maps = types.map_db().entries().len(),
            "analysis stack built"
        );
        Ok(AnalysisStack {
            unit,
            registry,
            types,
            allocations,
            inheritance,
            dependance,
            addresses,
        })
    }

    /// Runs the coarse taint analysis over one function, with each of
    /// the function's parameters as a distinct source. Exposed for
    /// address-space pruning; translation output never depends on it.
    pub fn function_taint(&self, func: solmc_ast::ast::FunctionId) -> TaintAnalysis {
        let f = self.registry.function(func);
        let mut taint = TaintAnalysis::new(f.params.len());
        for (i, p) in f.params.iter().enumerate() {
            taint.taint(p.id, i);
        }
        taint.run(f);
        taint
    }
}
