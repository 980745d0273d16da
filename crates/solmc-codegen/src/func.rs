//! The function printer: contract initializers and constructor chains,
//! struct initializers and non-deterministic producers, specialized map
//! helpers, and the per-function modifier chain.

use std::fmt::Write;

use indexmap::IndexSet;

use solmc_analysis::callstate::CALL_STATE;
use solmc_analysis::error::Result;
use solmc_analysis::inheritance::FlatContract;
use solmc_analysis::types::MapEntry;
use solmc_analysis::{AnalysisStack, TranslationConfig};
use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_cemit::{CExpr, CFuncDef, CStmt, CVarDecl};

use crate::adt::deployed;
use crate::block::{determine_block_type, next_call_state, value_handler_stmt, BlockLowering, BlockType};
use crate::expr::ExprConverter;
use crate::nd::{nd_raw, nd_value, zero_map, zero_value};
use crate::scope::{rewrite, VarContext, VariableScopeResolver};
use crate::specialization::FunctionSpecialization;

fn emit(out: &mut String, def: &CFuncDef, forward: bool) {
    if forward {
        write!(out, "{}", def.forward()).expect("string write");
    } else {
        write!(out, "{def}").expect("string write");
    }
}

fn state_params() -> Vec<CVarDecl> {
    CALL_STATE
        .iter()
        .map(|f| CVarDecl::new(f.type_name(), f.name()))
        .collect()
}

fn user_params(
    stack: &AnalysisStack<'_>,
    func: &Function,
    shadow: bool,
) -> Result<Vec<CVarDecl>> {
    let mut params = Vec::new();
    for (i, p) in func.params.iter().enumerate() {
        let source = if p.name.is_empty() {
            format!("unused{i}")
        } else {
            p.name.clone()
        };
        let name = rewrite(&source, shadow, VarContext::Function);
        let ty = stack.types.value_type_name(&p.ty)?;
        params.push(if p.loc == DataLoc::Storage {
            CVarDecl::pointer(ty, name)
        } else {
            CVarDecl::new(ty, name)
        });
    }
    Ok(params)
}

fn self_param(stack: &AnalysisStack<'_>, carrier: ContractId) -> CVarDecl {
    CVarDecl::pointer(
        format!("struct {}", stack.types.contract_name(carrier)),
        "self",
    )
}

/// Modifier invocations that are actual modifiers; parent-constructor
/// invocations are filtered out here and feed the constructor chain.
pub fn filtered_modifiers<'u>(
    stack: &AnalysisStack<'u>,
    flat: &FlatContract,
    func: &'u Function,
) -> Vec<(&'u Modifier, &'u ModifierInvocation)> {
    func.invocations
        .iter()
        .filter_map(|inv| {
            flat.find_modifier(&stack.registry, &inv.name)
                .map(|mid| (stack.registry.modifier(mid), inv))
        })
        .collect()
}

fn return_type(stack: &AnalysisStack<'_>, func: &Function) -> Result<String> {
    Ok(match determine_block_type(&func.returns)? {
        BlockType::Action => "void".to_string(),
        BlockType::Operation | BlockType::Initializer => {
            stack.types.value_type_name(&func.returns[0].ty)?
        }
    })
}

// -------------------------------------------------------------------
// Contract initializers
// -------------------------------------------------------------------

/// The first parent-constructor invocation naming `base`, scanning the
/// constructor chain most-derived first.
fn ctor_invocation<'u>(
    stack: &AnalysisStack<'u>,
    flat: &FlatContract,
    base: &str,
) -> Option<&'u ModifierInvocation> {
    for &fid in flat.constructors.iter().rev() {
        let func = stack.registry.function(fid);
        for inv in &func.invocations {
            if inv.name == base && flat.is_base_name(&stack.registry, &inv.name) {
                return Some(inv);
            }
        }
    }
    None
}

fn print_init(
    stack: &AnalysisStack<'_>,
    contract: &Contract,
    forward: bool,
    out: &mut String,
) -> Result<()> {
    let flat = stack.inheritance.flat(contract.id);
    let own_ctor = flat
        .constructors
        .iter()
        .copied()
        .find(|&fid| stack.registry.function_owner(fid).id == contract.id);

    // One helper per inherited constructor body.
    for &fid in &flat.constructors {
        let func = stack.registry.function(fid);
        let owner = stack.registry.function_owner(fid);
        let spec = FunctionSpecialization::entry(fid, contract.id);
        let mut def = CFuncDef::new("void", format!("Ctor_{}_{}", contract.name, owner.name))
            .param(self_param(stack, contract.id))
            .params(state_params())
            .params(user_params(stack, func, false)?);
        if !forward {
            def = def.body(BlockLowering::constructor(stack, &spec, func)?.convert()?);
        }
        emit(out, &def, forward);
    }

    let mut def = CFuncDef::new("void", format!("Init_{}", contract.name))
        .param(self_param(stack, contract.id))
        .params(state_params());
    if let Some(fid) = own_ctor {
        def = def.params(user_params(stack, stack.registry.function(fid), false)?);
    }

    if !forward {
        let mut decls = VariableScopeResolver::new();
        decls.enter();
        if let Some(fid) = own_ctor {
            for p in &stack.registry.function(fid).params {
                if !p.name.is_empty() {
                    decls.record(
                        &p.name,
                        false,
                        VarContext::Function,
                        p.loc == DataLoc::Storage,
                    );
                }
            }
        }
        let spec = own_ctor.map(|fid| FunctionSpecialization::entry(fid, contract.id));

        let mut body = Vec::new();
        body.push(CStmt::Expr(
            CExpr::ptr_id("self")
                .member("model_balance")
                .unwrap_v()
                .assign(CExpr::IntLit(0)),
        ));

        for &decl_id in &flat.state_vars {
            let decl = stack
                .registry
                .decl(decl_id)
                .expect("flattened state variable is registered");
            let target =
                CExpr::ptr_id("self").member(rewrite(&decl.name, false, VarContext::Struct));
            let stmt = if let Some(entry) = stack.types.map_db().resolve(decl.id) {
                CStmt::Expr(target.assign(zero_map(entry)))
            } else if matches!(decl.ty, SolType::Contract(_)) {
                // Embedded child contracts are initialized by the
                // constructor body's creation call.
                continue;
            } else if decl.ty.is_wrapped() {
                let raw = match &decl.init {
                    Some(e) => {
                        ExprConverter::new(stack, &decls, spec.as_ref()).convert(e, false)?
                    }
                    None => CExpr::IntLit(0),
                };
                CStmt::Expr(target.unwrap_v().assign(raw))
            } else {
                let value = match &decl.init {
                    Some(e) => {
                        ExprConverter::new(stack, &decls, spec.as_ref()).convert(e, false)?
                    }
                    None => zero_value(stack, &decl.ty)?,
                };
                CStmt::Expr(target.assign(value))
            };
            body.push(stmt);
        }

        for &fid in &flat.constructors {
            let func = stack.registry.function(fid);
            let owner = stack.registry.function_owner(fid);
            let mut args = vec![CExpr::ptr_id("self")];
            args.extend(CALL_STATE.iter().map(|f| CExpr::id(f.name())));
            if owner.id == contract.id {
                for p in &user_params(stack, func, false)? {
                    args.push(p.as_id());
                }
            } else if let Some(inv) = ctor_invocation(stack, flat, &owner.name) {
                let mut converter = ExprConverter::new(stack, &decls, spec.as_ref());
                for (arg, param) in inv.args.iter().zip(&func.params) {
                    args.push(converter.convert_as(arg, &param.ty)?);
                }
            }
            body.push(CStmt::Expr(CExpr::call(
                format!("Ctor_{}_{}", contract.name, owner.name),
                args,
            )));
        }
        decls.exit();
        def = def.body(body);
    }
    emit(out, &def, forward);
    Ok(())
}

// -------------------------------------------------------------------
// Struct helpers
// -------------------------------------------------------------------

fn print_struct_helpers(
    stack: &AnalysisStack<'_>,
    def: &StructDef,
    forward: bool,
    out: &mut String,
) -> Result<()> {
    let name = stack.types.struct_name(def.id).to_string();
    let struct_ty = format!("struct {name}");
    let tmp = CExpr::id("tmp");
    let field_target =
        |f: &VarDecl| CExpr::id("tmp").member(rewrite(&f.name, false, VarContext::Struct));

    // Init: one parameter per value field, maps zero-initialized.
    let mut init = CFuncDef::new(struct_ty.clone(), format!("Init_{name}"));
    for field in def.fields.iter().filter(|f| !f.ty.is_mapping()) {
        init = init.param(CVarDecl::new(
            stack.types.value_type_name(&field.ty)?,
            rewrite(&field.name, false, VarContext::Struct),
        ));
    }
    if !forward {
        let mut body = vec![CStmt::VarDecl(CVarDecl::new(struct_ty.clone(), "tmp"))];
        for field in &def.fields {
            let value = if let Some(entry) = stack.types.map_db().resolve(field.id) {
                zero_map(entry)
            } else {
                CExpr::id(rewrite(&field.name, false, VarContext::Struct))
            };
            body.push(CStmt::Expr(field_target(field).assign(value)));
        }
        body.push(CStmt::Return(Some(tmp.clone())));
        init = init.body(body);
    }
    emit(out, &init, forward);

    // ND: every scalar field drawn fresh.
    let mut nd = CFuncDef::new(struct_ty.clone(), format!("ND_{name}"));
    if !forward {
        let mut body = vec![CStmt::VarDecl(CVarDecl::new(struct_ty, "tmp"))];
        for field in &def.fields {
            let stmt = if let Some(entry) = stack.types.map_db().resolve(field.id) {
                CStmt::Expr(field_target(field).assign(zero_map(entry)))
            } else if field.ty.is_wrapped() {
                let msg = format!("{name}::{}", field.name);
                CStmt::Expr(
                    field_target(field)
                        .unwrap_v()
                        .assign(nd_raw(stack, &field.ty, &msg)?),
                )
            } else {
                let msg = format!("{name}::{}", field.name);
                CStmt::Expr(field_target(field).assign(nd_value(stack, &field.ty, &msg)?))
            };
            body.push(stmt);
        }
        body.push(CStmt::Return(Some(tmp)));
        nd = nd.body(body);
    }
    emit(out, &nd, forward);
    Ok(())
}

// -------------------------------------------------------------------
// Map helpers
// -------------------------------------------------------------------

fn key_params(stack: &AnalysisStack<'_>, entry: &MapEntry) -> Result<Vec<CVarDecl>> {
    entry
        .keys
        .iter()
        .enumerate()
        .map(|(i, key)| Ok(CVarDecl::new(stack.types.wrapped_name(key)?, format!("k{i}"))))
        .collect()
}

/// The latch: first access remembers the supplied key.
fn latch_stmt(entry: &MapEntry) -> CStmt {
    let a = CExpr::ptr_id("a");
    let mut then = Vec::new();
    for i in 0..entry.keys.len() {
        then.push(CStmt::Expr(
            a.clone()
                .member(format!("m_curr{i}"))
                .assign(CExpr::id(format!("k{i}"))),
        ));
    }
    then.push(CStmt::Expr(
        a.clone().member("m_set").unwrap_v().assign(CExpr::IntLit(1)),
    ));
    CStmt::If {
        cond: a.member("m_set").unwrap_v().binary("==", CExpr::IntLit(0)),
        then_stmt: Box::new(CStmt::Block(then)),
        else_stmt: None,
    }
}

fn key_compare(entry: &MapEntry, equal: bool) -> CExpr {
    let a = CExpr::ptr_id("a");
    let op = if equal { "==" } else { "!=" };
    let join = if equal { "&&" } else { "||" };
    let mut cond: Option<CExpr> = None;
    for i in 0..entry.keys.len() {
        let one = CExpr::id(format!("k{i}"))
            .unwrap_v()
            .binary(op, a.clone().member(format!("m_curr{i}")).unwrap_v());
        cond = Some(match cond {
            Some(prev) => prev.binary(join, one),
            None => one,
        });
    }
    cond.expect("maps have at least one key")
}

fn fresh_value(stack: &AnalysisStack<'_>, entry: &MapEntry) -> Result<CExpr> {
    nd_value(stack, &entry.value, &entry.display)
}

fn print_map_helpers(
    stack: &AnalysisStack<'_>,
    entry: &MapEntry,
    forward: bool,
    out: &mut String,
) -> Result<()> {
    let name = entry.struct_name();
    let struct_ty = format!("struct {name}");
    let value_ty = stack.types.value_type_name(&entry.value)?;
    let a_param = CVarDecl::pointer(struct_ty.clone(), "a");
    let a = CExpr::ptr_id("a");

    // Init
    let mut init = CFuncDef::new(struct_ty.clone(), format!("Init_{name}"));
    if !forward {
        let mut body = vec![CStmt::VarDecl(CVarDecl::new(struct_ty.clone(), "tmp"))];
        let tmp = CExpr::id("tmp");
        body.push(CStmt::Expr(
            tmp.clone().member("m_set").unwrap_v().assign(CExpr::IntLit(0)),
        ));
        for (i, key) in entry.keys.iter().enumerate() {
            body.push(CStmt::Expr(
                tmp.clone()
                    .member(format!("m_curr{i}"))
                    .assign(zero_value(stack, key)?),
            ));
        }
        body.push(CStmt::Expr(
            tmp.clone().member("d_").assign(zero_value(stack, &entry.value)?),
        ));
        body.push(CStmt::Expr(
            tmp.clone()
                .member("d_nd")
                .assign(zero_value(stack, &entry.value)?),
        ));
        body.push(CStmt::Return(Some(tmp)));
        init = init.body(body);
    }
    emit(out, &init, forward);

    // ND
    let mut nd = CFuncDef::new(struct_ty.clone(), format!("ND_{name}"));
    if !forward {
        let mut body = vec![CStmt::VarDecl(CVarDecl::new(struct_ty.clone(), "tmp"))];
        let tmp = CExpr::id("tmp");
        body.push(CStmt::Expr(tmp.clone().member("m_set").unwrap_v().assign(
            nd_raw(stack, &SolType::Bool, &format!("{}::m_set", entry.display))?,
        )));
        for (i, key) in entry.keys.iter().enumerate() {
            let msg = format!("{}::m_curr{i}", entry.display);
            body.push(CStmt::Expr(
                tmp.clone()
                    .member(format!("m_curr{i}"))
                    .assign(nd_value(stack, key, &msg)?),
            ));
        }
        body.push(CStmt::Expr(
            tmp.clone().member("d_").assign(fresh_value(stack, entry)?),
        ));
        body.push(CStmt::Expr(
            tmp.clone()
                .member("d_nd")
                .assign(zero_value(stack, &entry.value)?),
        ));
        body.push(CStmt::Return(Some(tmp)));
        nd = nd.body(body);
    }
    emit(out, &nd, forward);

    // Read
    let mut read = CFuncDef::new(value_ty.clone(), format!("Read_{name}"))
        .param(a_param.clone())
        .params(key_params(stack, entry)?);
    if !forward {
        read = read.body(vec![
            latch_stmt(entry),
            CStmt::If {
                cond: key_compare(entry, false),
                then_stmt: Box::new(CStmt::Return(Some(fresh_value(stack, entry)?))),
                else_stmt: None,
            },
            CStmt::Return(Some(a.clone().member("d_"))),
        ]);
    }
    emit(out, &read, forward);

    // Write
    let mut write_fn = CFuncDef::new("void", format!("Write_{name}"))
        .param(a_param.clone())
        .params(key_params(stack, entry)?)
        .param(CVarDecl::new(value_ty.clone(), "d"));
    if !forward {
        write_fn = write_fn.body(vec![
            latch_stmt(entry),
            CStmt::If {
                cond: key_compare(entry, true),
                then_stmt: Box::new(CStmt::Block(vec![CStmt::Expr(
                    a.clone().member("d_").assign(CExpr::id("d")),
                )])),
                else_stmt: None,
            },
        ]);
    }
    emit(out, &write_fn, forward);

    // Ref
    let mut ref_fn = CFuncDef::new(value_ty, format!("Ref_{name}"))
        .returning_pointer()
        .param(a_param)
        .params(key_params(stack, entry)?);
    if !forward {
        ref_fn = ref_fn.body(vec![
            latch_stmt(entry),
            CStmt::If {
                cond: key_compare(entry, false),
                then_stmt: Box::new(CStmt::Block(vec![
                    CStmt::Expr(a.clone().member("d_nd").assign(fresh_value(stack, entry)?)),
                    CStmt::Return(Some(a.clone().member("d_nd").reference())),
                ])),
                else_stmt: None,
            },
            CStmt::Return(Some(a.member("d_").reference())),
        ]);
    }
    emit(out, &ref_fn, forward);
    Ok(())
}

// -------------------------------------------------------------------
// Method chains
// -------------------------------------------------------------------

fn print_method_chain(
    stack: &AnalysisStack<'_>,
    flat: &FlatContract,
    spec: &FunctionSpecialization,
    func: &Function,
    forward: bool,
    out: &mut String,
) -> Result<()> {
    let ret = return_type(stack, func)?;
    let mods = filtered_modifiers(stack, flat, func);

    let plain_params = |stack: &AnalysisStack<'_>, shadow: bool| -> Result<Vec<CVarDecl>> {
        let mut params = vec![self_param(stack, spec.carrier)];
        if !func.is_pure() {
            params.extend(state_params());
        }
        params.extend(user_params(stack, func, shadow)?);
        Ok(params)
    };

    if mods.is_empty() {
        let mut def =
            CFuncDef::new(ret, spec.name(stack)).params(plain_params(stack, false)?);
        if !forward {
            def = def.body(BlockLowering::function(stack, spec, func, true)?.convert()?);
        }
        emit(out, &def, forward);
        return Ok(());
    }

    // Exported entry: handles payment, then enters the chain.
    let mut entry = CFuncDef::new(ret.clone(), spec.name(stack)).params(plain_params(stack, false)?);
    if !forward {
        let mut body = Vec::new();
        if func.is_payable() {
            body.push(value_handler_stmt());
        }
        let mut args = vec![CExpr::ptr_id("self")];
        if !func.is_pure() {
            args.extend(next_call_state(false));
        }
        for p in user_params(stack, func, false)? {
            args.push(p.as_id());
        }
        let call = CExpr::call(spec.mod_name(stack, 0), args);
        body.push(if func.returns.is_empty() {
            CStmt::Expr(call)
        } else {
            CStmt::Return(Some(call))
        });
        entry = entry.body(body);
    }
    emit(out, &entry, forward);

    for (i, &(def_mod, invocation)) in mods.iter().enumerate() {
        let next = if i + 1 < mods.len() {
            spec.mod_name(stack, i + 1)
        } else {
            spec.base_name(stack)
        };
        let mut wrapper = CFuncDef::new(ret.clone(), spec.mod_name(stack, i))
            .params(plain_params(stack, true)?);
        if !forward {
            wrapper = wrapper.body(
                BlockLowering::modifier(stack, spec, def_mod, invocation, func, next)?
                    .convert()?,
            );
        }
        emit(out, &wrapper, forward);
    }

    let mut base =
        CFuncDef::new(ret, spec.base_name(stack)).params(plain_params(stack, false)?);
    if !forward {
        base = base.body(BlockLowering::function(stack, spec, func, false)?.convert()?);
    }
    emit(out, &base, forward);
    Ok(())
}

// -------------------------------------------------------------------
// Top level
// -------------------------------------------------------------------

pub fn print_functions(
    stack: &AnalysisStack<'_>,
    config: &TranslationConfig,
    out: &mut String,
) -> Result<()> {
    let forward = config.forward_declare;
    let mut done_owners: IndexSet<ContractId> = IndexSet::new();

    for contract in deployed(stack) {
        let flat = stack.inheritance.flat(contract.id);
        print_init(stack, contract, forward, out)?;

        for &owner in flat.linear.iter().rev() {
            if !done_owners.insert(owner) {
                continue;
            }
            let oc = stack.registry.contract(owner);
            for def in &oc.structs {
                for field in &def.fields {
                    if let Some(entry) = stack.types.map_db().resolve(field.id) {
                        print_map_helpers(stack, entry, forward, out)?;
                    }
                }
                print_struct_helpers(stack, def, forward, out)?;
            }
            for var in &oc.state_vars {
                if let Some(entry) = stack.types.map_db().resolve(var.id) {
                    print_map_helpers(stack, entry, forward, out)?;
                }
            }
        }

        for &winner in &flat.functions {
            if !stack.dependance.get_executed_code().contains(&winner) {
                continue;
            }
            let spec = FunctionSpecialization::entry(winner, contract.id);
            print_method_chain(
                stack,
                flat,
                &spec,
                stack.registry.function(winner),
                forward,
                out,
            )?;
            for (i, &hidden) in stack.dependance.get_superchain(winner).iter().enumerate() {
                if !stack.dependance.get_executed_code().contains(&hidden) {
                    continue;
                }
                let super_spec =
                    FunctionSpecialization::super_member(winner, hidden, contract.id, i + 1);
                print_method_chain(
                    stack,
                    flat,
                    &super_spec,
                    stack.registry.function(hidden),
                    forward,
                    out,
                )?;
            }
        }
    }
    Ok(())
}
