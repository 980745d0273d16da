//! The inheritance flattener: a linearized view of every contract, with
//! override resolution, state-variable layout, the constructor chain, and
//! the per-function super-call chain.

use std::collections::BTreeMap;

use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_ast::Registry;

use crate::error::Result;

/// A contract with its inheritance hierarchy folded in.
#[derive(Debug)]
pub struct FlatContract {
    pub id: ContractId,
    pub name: String,
    /// Linearized contracts, most-derived (self) first.
    pub linear: Vec<ContractId>,
    /// State variables in layout order: most-base contract first, then in
    /// declaration order within each contract.
    pub state_vars: Vec<DeclId>,
    /// Override-resolved functions: a derived definition hides any same-
    /// signature definition above it. Own definitions first, inherited
    /// survivors after.
    pub functions: Vec<FunctionId>,
    /// Constructor chain, most-base first, own constructor last.
    pub constructors: Vec<FunctionId>,
    /// Modifier definitions, derived definitions shadowing base ones.
    pub modifiers: Vec<ModifierId>,
    /// Per resolved function, the ordered list of hidden bodies a
    /// `super.f(…)` chain reaches.
    pub superchain: BTreeMap<FunctionId, Vec<FunctionId>>,
}

impl FlatContract {
    pub fn find_modifier(&self, registry: &Registry<'_>, name: &str) -> Option<ModifierId> {
        self.modifiers
            .iter()
            .copied()
            .find(|&id| registry.modifier(id).name == name)
    }

    /// True if `name` names a contract in this linearization (so a
    /// modifier-invocation with that name is a parent-constructor call).
    pub fn is_base_name(&self, registry: &Registry<'_>, name: &str) -> bool {
        self.linear
            .iter()
            .any(|&id| registry.contract(id).name == name)
    }

    /// The public/external functions, in emission order.
    pub fn interface(&self, registry: &Registry<'_>) -> Vec<FunctionId> {
        self.functions
            .iter()
            .copied()
            .filter(|&id| {
                let f = registry.function(id);
                f.kind == FunctionKind::Function && f.visibility.is_exposed()
            })
            .collect()
    }

    /// Resolves a plain (unqualified) call to `name` against the
    /// flattened function list.
    pub fn resolve_function(&self, registry: &Registry<'_>, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .copied()
            .find(|&id| registry.function(id).name == name)
    }
}

#[derive(Debug)]
pub struct Inheritance {
    flats: BTreeMap<ContractId, FlatContract>,
}

impl Inheritance {
    pub fn build(unit: &SourceUnit, registry: &Registry<'_>) -> Result<Self> {
        let mut flats = BTreeMap::new();
        for contract in &unit.contracts {
            flats.insert(contract.id, Self::flatten(contract, registry));
        }
        Ok(Inheritance { flats })
    }

    fn flatten(contract: &Contract, registry: &Registry<'_>) -> FlatContract {
        let mut linear = vec![contract.id];
        linear.extend(contract.bases.iter().copied());

        let mut state_vars = Vec::new();
        let mut constructors = Vec::new();
        for &cid in linear.iter().rev() {
            let c = registry.contract(cid);
            state_vars.extend(c.state_vars.iter().map(|v| v.id));
            constructors.extend(
                c.functions
                    .iter()
                    .filter(|f| f.kind == FunctionKind::Constructor)
                    .map(|f| f.id),
            );
        }

        let mut functions: Vec<FunctionId> = Vec::new();
        let mut signatures: Vec<(String, Vec<SolType>)> = Vec::new();
        let mut superchain: BTreeMap<FunctionId, Vec<FunctionId>> = BTreeMap::new();
        for &cid in &linear {
            let c = registry.contract(cid);
            for f in &c.functions {
                if f.kind != FunctionKind::Function {
                    continue;
                }
                let sig = f.signature();
                if let Some(pos) = signatures.iter().position(|s| *s == sig) {
                    // Hidden by a more-derived definition: reachable only
                    // through that definition's super chain.
                    let winner = functions[pos];
                    superchain.entry(winner).or_default().push(f.id);
                } else {
                    signatures.push(sig);
                    functions.push(f.id);
                    superchain.insert(f.id, Vec::new());
                }
            }
        }

        let mut modifiers: Vec<ModifierId> = Vec::new();
        for &cid in &linear {
            let c = registry.contract(cid);
            for m in &c.modifiers {
                let shadowed = modifiers
                    .iter()
                    .any(|&id| registry.modifier(id).name == m.name);
                if !shadowed {
                    modifiers.push(m.id);
                }
            }
        }

        FlatContract {
            id: contract.id,
            name: contract.name.clone(),
            linear,
            state_vars,
            functions,
            constructors,
            modifiers,
            superchain,
        }
    }

    pub fn flat(&self, id: ContractId) -> &FlatContract {
        &self.flats[&id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmc_ast::builder as b;

    fn two_level_unit() -> (SourceUnit, ContractId, ContractId) {
        // contract Base { uint x; function f() public {} function g() public {} }
        // contract Derived is Base { uint y; function f() public {} }
        let x = b::var_decl("x", b::t_uint());
        let base_f = b::FunctionBuilder::new("f").body(vec![]);
        let base_g = b::FunctionBuilder::new("g").body(vec![]);
        let base = b::ContractBuilder::new("Base")
            .state(x)
            .function(base_f)
            .function(base_g)
            .build();
        let base_id = base.id;

        let y = b::var_decl("y", b::t_uint());
        let derived_f = b::FunctionBuilder::new("f").body(vec![]);
        let derived = b::ContractBuilder::new("Derived")
            .base(base_id)
            .state(y)
            .function(derived_f)
            .build();
        let derived_id = derived.id;
        (b::unit(vec![base, derived]), base_id, derived_id)
    }

    #[test]
    fn override_resolution_hides_base_definition() {
        let (unit, _base_id, derived_id) = two_level_unit();
        let registry = Registry::build(&unit);
        let inh = Inheritance::build(&unit, &registry).unwrap();
        let flat = inh.flat(derived_id);

        let names: Vec<_> = flat
            .functions
            .iter()
            .map(|&id| registry.function(id).name.as_str())
            .collect();
        assert_eq!(names, ["f", "g"]);

        // the derived f hides the base f; the base f survives in its chain
        let f = flat.resolve_function(&registry, "f").unwrap();
        assert_eq!(registry.function_owner(f).id, derived_id);
        assert_eq!(flat.superchain[&f].len(), 1);

        let g = flat.resolve_function(&registry, "g").unwrap();
        assert!(flat.superchain[&g].is_empty());
    }

    #[test]
    fn state_layout_is_base_first() {
        let (unit, _base_id, derived_id) = two_level_unit();
        let registry = Registry::build(&unit);
        let inh = Inheritance::build(&unit, &registry).unwrap();
        let flat = inh.flat(derived_id);
        let names: Vec<_> = flat
            .state_vars
            .iter()
            .map(|&id| registry.decl(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn overloads_do_not_hide_each_other() {
        let p = b::var_decl("a", b::t_uint());
        let base_f = b::FunctionBuilder::new("f").param(p).body(vec![]);
        let base = b::ContractBuilder::new("Base").function(base_f).build();
        let base_id = base.id;
        let derived_f = b::FunctionBuilder::new("f").body(vec![]);
        let derived = b::ContractBuilder::new("Derived")
            .base(base_id)
            .function(derived_f)
            .build();
        let derived_id = derived.id;
        let unit = b::unit(vec![base, derived]);
        let registry = Registry::build(&unit);
        let inh = Inheritance::build(&unit, &registry).unwrap();
        // different signatures: both survive
        assert_eq!(inh.flat(derived_id).functions.len(), 2);
    }

    #[test]
    fn base_name_lookup_flags_constructor_invocations() {
        let (unit, _base_id, derived_id) = two_level_unit();
        let registry = Registry::build(&unit);
        let inh = Inheritance::build(&unit, &registry).unwrap();
        let flat = inh.flat(derived_id);
        assert!(flat.is_base_name(&registry, "Base"));
        assert!(!flat.is_base_name(&registry, "Unrelated"));
    }
}
