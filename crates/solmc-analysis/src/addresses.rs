//! The symbolic address space: a compact index range covering the zero
//! address, one slot per actor, one per address literal, and a reserved
//! client range the harness draws senders from.

use std::collections::BTreeSet;

use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_ast::walk;

use crate::dependance::ContractDependance;
use crate::types::MapDatabase;

#[derive(Debug)]
pub struct AddressSummary {
    actor_count: usize,
    /// Distinct non-zero address literals, in value order.
    literals: Vec<i128>,
    zero_literal_used: bool,
    client_count: usize,
}

impl AddressSummary {
    pub fn build(unit: &SourceUnit, deps: &ContractDependance, map_db: &MapDatabase) -> Self {
        let mut literals: BTreeSet<i128> = BTreeSet::new();
        let mut record = |e: &Expr| {
            let is_address = matches!(e.ty, Some(SolType::Address { .. }));
            match &e.kind {
                ExprKind::Number { value, .. } if is_address => {
                    literals.insert(*value);
                }
                ExprKind::Call {
                    kind: CallKind::TypeConversion,
                    args,
                    ..
                } if is_address => {
                    if let Some(Expr {
                        kind: ExprKind::Number { value, .. },
                        ..
                    }) = args.first().map(|a| a.unparen())
                    {
                        literals.insert(*value);
                    }
                }
                _ => {}
            }
        };
        for contract in &unit.contracts {
            for func in &contract.functions {
                walk::for_each_expr(&func.body, &mut record);
            }
            for m in &contract.modifiers {
                walk::for_each_expr(&m.body, &mut record);
            }
            for var in &contract.state_vars {
                if let Some(init) = &var.init {
                    walk::for_each_subexpr(init, &mut record);
                }
            }
        }

        let zero_literal_used = literals.remove(&0);
        // Enough client representatives to name every coordinate of the
        // deepest map, and never fewer than two.
        let client_count = (map_db.max_depth() + 1).max(2);

        AddressSummary {
            actor_count: deps.get_model().len(),
            literals: literals.into_iter().collect(),
            zero_literal_used,
            client_count,
        }
    }

    /// Total number of address slots, the zero address included.
    pub fn size(&self) -> usize {
        1 + self.actor_count + self.literals.len() + self.client_count
    }

    /// Slots reserved before the client range begins.
    pub fn implicit_count(&self) -> usize {
        1 + self.actor_count + self.literals.len()
    }

    pub fn client_count(&self) -> usize {
        self.client_count
    }

    pub fn actor_count(&self) -> usize {
        self.actor_count
    }

    /// The address assigned to the `i`-th actor.
    pub fn actor_address(&self, index: usize) -> usize {
        1 + index
    }

    /// The slot a source address literal maps to.
    pub fn literal_index(&self, literal: i128) -> Option<usize> {
        if literal == 0 {
            return self.zero_literal_used.then_some(0);
        }
        self.literals
            .iter()
            .position(|&l| l == literal)
            .map(|rank| 1 + self.actor_count + rank)
    }

    pub fn literals(&self) -> impl Iterator<Item = i128> + '_ {
        self.zero_literal_used
            .then_some(0)
            .into_iter()
            .chain(self.literals.iter().copied())
    }

    /// Sender slots: `[implicit_count, size)`, excluding zero, actors and
    /// literals by construction.
    pub fn client_range(&self) -> (usize, usize) {
        (self.implicit_count(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inheritance::Inheritance;
    use solmc_ast::builder as b;
    use solmc_ast::Registry;

    fn summary_for(unit: &SourceUnit) -> AddressSummary {
        let registry = Registry::build(unit);
        let inheritance = Inheritance::build(unit, &registry).unwrap();
        let deps = ContractDependance::full_source(unit, &registry, &inheritance).unwrap();
        let map_db = MapDatabase::build(unit);
        AddressSummary::build(unit, &deps, &map_db)
    }

    #[test]
    fn layout_without_literals() {
        let f = b::FunctionBuilder::new("f").body(vec![]);
        let unit = b::unit(vec![b::ContractBuilder::new("A").function(f).build()]);
        let summary = summary_for(&unit);
        // zero + one actor + two clients
        assert_eq!(summary.size(), 4);
        assert_eq!(summary.implicit_count(), 2);
        assert_eq!(summary.client_range(), (2, 4));
        assert_eq!(summary.actor_address(0), 1);
    }

    #[test]
    fn literals_get_slots_after_actors() {
        let body = vec![
            b::expr_stmt(b::cast(b::num(5), b::t_address())),
            b::expr_stmt(b::cast(b::num(0), b::t_address())),
        ];
        let f = b::FunctionBuilder::new("f").body(body);
        let unit = b::unit(vec![b::ContractBuilder::new("A").function(f).build()]);
        let summary = summary_for(&unit);

        assert_eq!(summary.literal_index(0), Some(0));
        assert_eq!(summary.literal_index(5), Some(2));
        assert_eq!(summary.literal_index(7), None);
        // zero + actor + literal 5 + two clients
        assert_eq!(summary.size(), 5);
        assert_eq!(summary.client_range(), (3, 5));
        let all: Vec<_> = summary.literals().collect();
        assert_eq!(all, vec![0, 5]);
    }

    #[test]
    fn client_count_tracks_map_depth() {
        let m = b::var_decl(
            "m",
            b::mapping(b::t_uint(), b::mapping(b::t_uint(), b::t_uint())),
        );
        let unit = b::unit(vec![b::ContractBuilder::new("A").state(m).build()]);
        let summary = summary_for(&unit);
        // depth 2 → 3 representatives
        assert_eq!(summary.client_count(), 3);
    }
}
