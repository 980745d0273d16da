//! Function specializations: a `(function, carrier contract)` pair, so
//! inherited bodies are named and emitted once per most-derived carrier,
//! with hidden override bodies reachable under a mangled super suffix.

use solmc_analysis::AnalysisStack;
use solmc_ast::ast::{ContractId, FunctionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpecialization {
    /// The override-resolved entry function.
    pub winner: FunctionId,
    /// The body actually being lowered; equals `winner` unless this is a
    /// super-chain member.
    pub func: FunctionId,
    /// The contract the emission is specialized to.
    pub carrier: ContractId,
    /// Position in the super chain; zero for the winner itself.
    pub super_index: usize,
}

impl FunctionSpecialization {
    pub fn entry(func: FunctionId, carrier: ContractId) -> Self {
        FunctionSpecialization {
            winner: func,
            func,
            carrier,
            super_index: 0,
        }
    }

    pub fn super_member(
        winner: FunctionId,
        func: FunctionId,
        carrier: ContractId,
        super_index: usize,
    ) -> Self {
        FunctionSpecialization {
            winner,
            func,
            carrier,
            super_index,
        }
    }

    /// `Method_<Carrier>_Func<name>`, with `_super<i>` for chain members.
    pub fn name(&self, stack: &AnalysisStack<'_>) -> String {
        let contract = stack.types.contract_name(self.carrier);
        let func = &stack.registry.function(self.winner).name;
        if self.super_index == 0 {
            format!("Method_{contract}_Func{func}")
        } else {
            format!("Method_{contract}_Func{func}_super{}", self.super_index)
        }
    }

    pub fn mod_name(&self, stack: &AnalysisStack<'_>, index: usize) -> String {
        format!("{}_mod{index}", self.name(stack))
    }

    pub fn base_name(&self, stack: &AnalysisStack<'_>) -> String {
        format!("{}_base", self.name(stack))
    }

    /// The function a `super.f(…)` call from this body resolves to.
    pub fn super_call_name(&self, stack: &AnalysisStack<'_>) -> Option<String> {
        let chain = stack.dependance.get_superchain(self.winner);
        if self.super_index < chain.len() {
            let next = FunctionSpecialization::super_member(
                self.winner,
                chain[self.super_index],
                self.carrier,
                self.super_index + 1,
            );
            Some(next.name(stack))
        } else {
            None
        }
    }
}
