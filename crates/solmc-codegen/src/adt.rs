//! The ADT printer: forward declarations and definitions for every
//! reachable nominal type — specialized maps, user structs, and contract
//! records — innermost first, so later definitions can embed earlier ones.

use std::fmt::Write;

use indexmap::IndexSet;

use solmc_analysis::error::Result;
use solmc_analysis::types::MapEntry;
use solmc_analysis::AnalysisStack;
use solmc_ast::ast::*;
use solmc_cemit::{CStructDef, CVarDecl};

use crate::keys::KeyIterator;
use crate::scope::{rewrite, VarContext};

/// Contracts whose type definitions must be emitted, base contracts ahead
/// of the deployed contracts folding them in.
pub(crate) fn type_owners(stack: &AnalysisStack<'_>) -> Vec<ContractId> {
    let mut owners: IndexSet<ContractId> = IndexSet::new();
    for contract in &stack.unit.contracts {
        if !stack.dependance.is_deployed(contract.id) {
            continue;
        }
        let flat = stack.inheritance.flat(contract.id);
        for &owner in flat.linear.iter().rev() {
            owners.insert(owner);
        }
    }
    owners.into_iter().collect()
}

/// Deployed contracts, in source order.
pub(crate) fn deployed<'u>(stack: &AnalysisStack<'u>) -> Vec<&'u Contract> {
    stack
        .unit
        .contracts
        .iter()
        .filter(|c| stack.dependance.is_deployed(c.id))
        .collect()
}

fn map_struct_def(stack: &AnalysisStack<'_>, entry: &MapEntry) -> Result<CStructDef> {
    let mut def = CStructDef::new(entry.struct_name());
    def = def.field(CVarDecl::new("sol_bool_t", "m_set"));
    for (i, key) in entry.keys.iter().enumerate() {
        def = def.field(CVarDecl::new(
            stack.types.wrapped_name(key)?,
            format!("m_curr{i}"),
        ));
    }
    let value_ty = stack.types.value_type_name(&entry.value)?;
    def = def.field(CVarDecl::new(value_ty.clone(), "d_"));
    def = def.field(CVarDecl::new(value_ty.clone(), "d_nd"));

    // One representative cell per coordinate of the address space.
    let mut it = KeyIterator::new(stack.addresses.size(), entry.keys.len(), 0);
    while it.next() {
        if it.is_full() {
            def = def.field(CVarDecl::new(value_ty.clone(), format!("data{}", it.suffix())));
        }
    }
    Ok(def)
}

fn struct_field(stack: &AnalysisStack<'_>, decl: &VarDecl) -> Result<CVarDecl> {
    Ok(CVarDecl::new(
        stack.types.decl_type_name(decl)?,
        rewrite(&decl.name, false, VarContext::Struct),
    ))
}

fn user_struct_def(stack: &AnalysisStack<'_>, def: &StructDef) -> Result<CStructDef> {
    let mut out = CStructDef::new(stack.types.struct_name(def.id));
    for field in &def.fields {
        out = out.field(struct_field(stack, field)?);
    }
    Ok(out)
}

fn contract_struct_def(stack: &AnalysisStack<'_>, contract: &Contract) -> Result<CStructDef> {
    let flat = stack.inheritance.flat(contract.id);
    let mut out = CStructDef::new(contract.name.clone());
    out = out.field(CVarDecl::new("sol_address_t", "model_address"));
    out = out.field(CVarDecl::new("sol_uint256_t", "model_balance"));
    for &decl_id in &flat.state_vars {
        let decl = stack
            .registry
            .decl(decl_id)
            .expect("flattened state variable is registered");
        out = out.field(struct_field(stack, decl)?);
    }
    Ok(out)
}

/// Every nominal type of the translation, in declaration-before-use order.
fn collect_defs(stack: &AnalysisStack<'_>) -> Result<Vec<CStructDef>> {
    let mut defs = Vec::new();
    for owner in type_owners(stack) {
        let contract = stack.registry.contract(owner);
        for def in &contract.structs {
            for field in &def.fields {
                if let Some(entry) = stack.types.map_db().resolve(field.id) {
                    defs.push(map_struct_def(stack, entry)?);
                }
            }
            defs.push(user_struct_def(stack, def)?);
        }
        for var in &contract.state_vars {
            if let Some(entry) = stack.types.map_db().resolve(var.id) {
                defs.push(map_struct_def(stack, entry)?);
            }
        }
    }
    for contract in deployed(stack) {
        defs.push(contract_struct_def(stack, contract)?);
    }
    Ok(defs)
}

/// Emits all ADTs: forward declarations only, or full definitions.
pub fn print_adts(stack: &AnalysisStack<'_>, forward: bool, out: &mut String) -> Result<()> {
    for def in collect_defs(stack)? {
        if forward {
            write!(out, "{}", def.forward()).expect("string write");
        } else {
            write!(out, "{def}").expect("string write");
        }
    }
    Ok(())
}
