//! Per-function reach: the calls a body makes directly, the map
//! declarations it touches, and the contracts it creates. The transitive
//! closure lives in the contract-dependance layer.

use indexmap::IndexSet;

use solmc_ast::ast::*;
use solmc_ast::walk;

/// Direct (one-hop) reach of a single function body.
#[derive(Debug, Default)]
pub struct FunctionReach {
    pub calls: IndexSet<FunctionId>,
    pub maps: IndexSet<DeclId>,
    pub creates: IndexSet<ContractId>,
}

/// Resolves the declaration at the root of an index-access base, looking
/// through the flattened key chain.
pub fn map_root_decl(base: &Expr) -> Option<DeclId> {
    match &base.unparen().kind {
        ExprKind::Identifier {
            decl: Some(DeclRef::Var(id)),
            ..
        } => Some(*id),
        ExprKind::MemberAccess {
            decl: Some(DeclRef::Var(id)),
            ..
        } => Some(*id),
        ExprKind::IndexAccess { base, .. } => map_root_decl(base),
        _ => None,
    }
}

/// Collects the direct reach of a function body.
pub fn function_reach(func: &Function) -> FunctionReach {
    let mut reach = FunctionReach::default();
    walk::for_each_expr(&func.body, &mut |e| match &e.kind {
        ExprKind::Call { kind, callee, .. } => match kind {
            CallKind::Creation => {
                if let ExprKind::New(target) = &callee.kind {
                    reach.creates.insert(*target);
                }
            }
            CallKind::Internal
            | CallKind::External
            | CallKind::BareCall
            | CallKind::BareStaticCall => {
                let target = match &callee.unparen().kind {
                    ExprKind::Identifier {
                        decl: Some(DeclRef::Function(id)),
                        ..
                    } => Some(*id),
                    ExprKind::MemberAccess {
                        decl: Some(DeclRef::Function(id)),
                        ..
                    } => Some(*id),
                    _ => None,
                };
                if let Some(id) = target {
                    reach.calls.insert(id);
                }
            }
            _ => {}
        },
        ExprKind::IndexAccess { base, .. } => {
            // Only the root of a flattened chain names a declaration.
            if !matches!(base.unparen().kind, ExprKind::IndexAccess { .. }) {
                if let Some(decl) = map_root_decl(base) {
                    reach.maps.insert(decl);
                }
            }
        }
        _ => {}
    });
    reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmc_ast::builder as b;
    use solmc_ast::types::SolType;

    #[test]
    fn collects_calls_maps_and_creations() {
        let m = b::var_decl("m", b::mapping(b::t_uint(), b::t_uint()));
        let m_id = m.id;
        let g = b::FunctionBuilder::new("g").body(vec![]);
        let g_id = g.id;
        let child_id = b::fresh_contract_id();

        let f = b::FunctionBuilder::new("f").body(vec![
            b::expr_stmt(b::internal_call(
                b::func_ref("g", g_id),
                vec![],
                SolType::Tuple(vec![]),
            )),
            b::expr_stmt(b::index(b::decl_ref(&m), b::num(1), b::t_uint())),
            b::expr_stmt(b::new_contract(child_id, vec![])),
        ]);

        let reach = function_reach(&f);
        assert!(reach.calls.contains(&g_id));
        assert!(reach.maps.contains(&m_id));
        assert!(reach.creates.contains(&child_id));
    }

    #[test]
    fn nested_index_chain_counts_once() {
        let m = b::var_decl(
            "m",
            b::mapping(b::t_uint(), b::mapping(b::t_uint(), b::t_uint())),
        );
        let m_id = m.id;
        let inner = b::index(
            b::decl_ref(&m),
            b::num(1),
            b::mapping(b::t_uint(), b::t_uint()),
        );
        let outer = b::index(inner, b::num(2), b::t_uint());
        let f = b::FunctionBuilder::new("f").body(vec![b::expr_stmt(outer)]);

        let reach = function_reach(&f);
        assert_eq!(reach.maps.len(), 1);
        assert!(reach.maps.contains(&m_id));
    }
}
