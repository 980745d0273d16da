//! The harness generator: `run_model`, the non-deterministic driver the
//! verifier explores. Declares the call-state and one struct per actor,
//! lays out the symbolic address space, then loops forever choosing one
//! exposed method of one actor per transaction.

use std::fmt::Write;

use solmc_analysis::error::{Result, TranslateError};
use solmc_analysis::types::MapEntry;
use solmc_analysis::{AnalysisStack, InvariantMode, TranslationConfig};
use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_cemit::{CExpr, CFuncDef, CStmt, CVarDecl};

use crate::keys::KeyIterator;
use crate::nd::nd_value;
use crate::scope::{rewrite, VarContext};
use crate::specialization::FunctionSpecialization;
use crate::state::StateGenerator;

/// A map reached from an actor's state, with the access path to it.
struct MapInstance {
    entry: MapEntry,
    path: CExpr,
    display: String,
}

pub struct HarnessGenerator<'a, 'u> {
    stack: &'a AnalysisStack<'u>,
    config: &'a TranslationConfig,
}

impl<'a, 'u> HarnessGenerator<'a, 'u> {
    pub fn new(stack: &'a AnalysisStack<'u>, config: &'a TranslationConfig) -> Self {
        HarnessGenerator { stack, config }
    }

    fn actor_name(index: usize) -> String {
        format!("contract_{index}")
    }

    fn own_constructor(&self, contract: ContractId) -> Option<&'u Function> {
        self.stack
            .registry
            .contract(contract)
            .functions
            .iter()
            .find(|f| f.kind == FunctionKind::Constructor)
    }

    /// Walks every actor's state recursively, recording each reachable
    /// map with its access path.
    fn identify_maps(&self) -> Vec<MapInstance> {
        let mut maps = Vec::new();
        for (i, &cid) in self.stack.dependance.get_model().iter().enumerate() {
            let flat = self.stack.inheritance.flat(cid);
            let root = CExpr::id(Self::actor_name(i));
            for &decl_id in &flat.state_vars {
                let decl = self
                    .stack
                    .registry
                    .decl(decl_id)
                    .expect("flattened state variable is registered");
                self.identify_in(decl, root.clone(), Self::actor_name(i), &mut maps);
            }
        }
        maps
    }

    fn identify_in(&self, decl: &VarDecl, path: CExpr, display: String, out: &mut Vec<MapInstance>) {
        let path = path.member(rewrite(&decl.name, false, VarContext::Struct));
        let display = format!("{display}::{}", decl.name);
        if let Some(entry) = self.stack.types.map_db().resolve(decl.id) {
            out.push(MapInstance {
                entry: entry.clone(),
                path,
                display,
            });
        } else if let SolType::Struct(sid) = &decl.ty {
            for field in &self.stack.registry.structure(*sid).fields {
                self.identify_in(field, path.clone(), display.clone(), out);
            }
        }
    }

    /// The `sol_is_using_reps()` block: re-havoc every representative
    /// cell, constraining each with its map invariant.
    fn expand_interference(&self, maps: &[MapInstance]) -> Result<Vec<CStmt>> {
        let mut block = Vec::new();
        for map in maps {
            let offset = if self.config.invariant_mode == InvariantMode::Universal {
                0
            } else {
                self.stack.addresses.implicit_count()
            };
            let mut it = KeyIterator::new(
                self.stack.addresses.size(),
                map.entry.keys.len(),
                offset,
            );
            while it.next() {
                if !it.is_full() {
                    continue;
                }
                let cell = map.path.clone().member(format!("data{}", it.suffix()));
                let msg = format!("{}::{}", map.display, it.suffix());
                if map.entry.value.is_wrapped() {
                    let raw = crate::nd::nd_raw(self.stack, &map.entry.value, &msg)?;
                    block.push(CStmt::Expr(cell.clone().unwrap_v().assign(raw)));
                } else {
                    block.push(CStmt::Expr(
                        cell.clone().assign(nd_value(self.stack, &map.entry.value, &msg)?),
                    ));
                }
                if self.config.invariant_mode != InvariantMode::None {
                    let arg = if map.entry.value.is_wrapped() {
                        cell.unwrap_v()
                    } else {
                        return Err(TranslateError::StructInvariant);
                    };
                    block.push(CStmt::Expr(CExpr::call(
                        "sol_require",
                        vec![
                            CExpr::call(format!("Inv_{}", map.entry.id), vec![arg]),
                            CExpr::IntLit(0),
                        ],
                    )));
                }
            }
        }
        Ok(block)
    }

    fn print_invariants(&self, forward: bool, out: &mut String) -> Result<()> {
        if self.config.invariant_mode == InvariantMode::None {
            return Ok(());
        }
        for entry in self.stack.types.map_db().entries() {
            if matches!(entry.value, SolType::Struct(_)) {
                return Err(TranslateError::StructInvariant);
            }
            let mut def = CFuncDef::new("int", format!("Inv_{}", entry.id)).param(CVarDecl::new(
                self.stack.types.simple_ctype(&entry.value)?,
                "v",
            ));
            if !forward {
                def = def.body(vec![CStmt::Return(Some(CExpr::IntLit(1)))]);
            }
            emit(out, &def, forward);
        }
        Ok(())
    }

    /// One dispatch case: log, pay if payable, draw every argument, call.
    fn build_case(&self, actor: usize, contract: ContractId, fid: FunctionId) -> Result<Vec<CStmt>> {
        let func = self.stack.registry.function(fid);
        let spec = FunctionSpecialization::entry(fid, contract);
        let state = StateGenerator::new(self.stack, self.config.use_lockstep_time);
        let mut body = Vec::new();

        let params: Vec<String> = func
            .params
            .iter()
            .map(|p| {
                if p.name.is_empty() {
                    "0".to_string()
                } else {
                    p.name.clone()
                }
            })
            .collect();
        body.push(CStmt::Expr(CExpr::call(
            "sol_log",
            vec![CExpr::StrLit(format!(
                "[Calling {}({}) on {}]",
                func.name,
                params.join(", "),
                Self::actor_name(actor)
            ))],
        )));

        if func.is_payable() {
            state.pay(&mut body);
        }

        let mut args = vec![CExpr::id(Self::actor_name(actor)).reference()];
        if !func.is_pure() {
            args.extend(
                solmc_analysis::callstate::CALL_STATE
                    .iter()
                    .map(|f| CExpr::id(f.name())),
            );
        }

        let mut placeholder_count = 0;
        for param in &func.params {
            let ty = self.stack.types.value_type_name(&param.ty)?;
            let decl = if param.name.is_empty() {
                let name = format!("placeholder_{placeholder_count}");
                placeholder_count += 1;
                CVarDecl::new(ty, name)
            } else {
                let value = nd_value(self.stack, &param.ty, &param.name)?;
                CVarDecl::new(ty, format!("arg_{}", param.name)).with_init(value)
            };
            args.push(decl.as_id());
            body.push(CStmt::VarDecl(decl));
        }

        body.push(CStmt::Expr(CExpr::call(spec.name(self.stack), args)));
        body.push(CStmt::Expr(CExpr::call(
            "sol_log",
            vec![CExpr::StrLit("[Call successful]".to_string())],
        )));
        body.push(CStmt::Break);
        Ok(body)
    }

    pub fn print(&self, out: &mut String) -> Result<()> {
        let forward = self.config.forward_declare;
        self.print_invariants(forward, out)?;

        let run_model = CFuncDef::new("void", "run_model");
        if forward {
            emit(out, &run_model, true);
            return Ok(());
        }

        let state = StateGenerator::new(self.stack, self.config.use_lockstep_time);
        let model = self.stack.dependance.get_model();
        let maps = self.identify_maps();

        let mut main = Vec::new();
        state.declare(&mut main);

        for (i, &cid) in model.iter().enumerate() {
            main.push(CStmt::VarDecl(CVarDecl::new(
                format!("struct {}", self.stack.types.contract_name(cid)),
                Self::actor_name(i),
            )));
        }

        // The symbolic address map: actors first, then source literals.
        for literal in self.stack.addresses.literals() {
            let name = crate::expr::address_literal_name(literal);
            main.push(CStmt::VarDecl(CVarDecl::new("sol_address_t", name.clone())));
            let index = self
                .stack
                .addresses
                .literal_index(literal)
                .expect("collected literal has a slot");
            main.push(CStmt::Expr(
                CExpr::id(name).unwrap_v().assign(CExpr::IntLit(index as i128)),
            ));
        }
        for (i, _) in model.iter().enumerate() {
            main.push(CStmt::Expr(
                CExpr::id(Self::actor_name(i))
                    .member("model_address")
                    .unwrap_v()
                    .assign(CExpr::IntLit(self.stack.addresses.actor_address(i) as i128)),
            ));
        }

        for (i, &cid) in model.iter().enumerate() {
            let mut args = vec![CExpr::id(Self::actor_name(i)).reference()];
            args.extend(
                solmc_analysis::callstate::CALL_STATE
                    .iter()
                    .map(|f| CExpr::id(f.name())),
            );
            if let Some(ctor) = self.own_constructor(cid) {
                for param in &ctor.params {
                    let msg = format!(
                        "{}::constructor::{}",
                        self.stack.types.contract_name(cid),
                        param.name
                    );
                    args.push(nd_value(self.stack, &param.ty, &msg)?);
                }
            }
            main.push(CStmt::Expr(CExpr::call(
                format!("Init_{}", self.stack.types.contract_name(cid)),
                args,
            )));
        }

        main.push(CStmt::Expr(CExpr::call(
            "sol_log",
            vec![CExpr::StrLit("[Entering transaction loop]".to_string())],
        )));

        // The transactional loop.
        let mut cases = Vec::new();
        for (i, &cid) in model.iter().enumerate() {
            for &fid in self.stack.dependance.get_interface(cid) {
                cases.push(self.build_case(i, cid, fid)?);
            }
        }
        if cases.is_empty() {
            return Err(TranslateError::EmptyInterface);
        }
        let case_count = cases.len();

        let mut tx = Vec::new();
        tx.push(CStmt::Expr(CExpr::call("sol_on_transaction", vec![])));
        tx.push(CStmt::If {
            cond: CExpr::call("sol_is_using_reps", vec![]),
            then_stmt: Box::new(CStmt::Block(self.expand_interference(&maps)?)),
            else_stmt: None,
        });
        state.update_global(&mut tx);
        tx.push(CStmt::VarDecl(CVarDecl::new("uint8_t", "next_call")));
        tx.push(CStmt::Expr(CExpr::id("next_call").assign(CExpr::call(
            "nd_range",
            vec![
                CExpr::IntLit(0),
                CExpr::IntLit(case_count as i128),
                CExpr::StrLit("next_call".to_string()),
            ],
        ))));
        tx.push(CStmt::Switch {
            cond: CExpr::id("next_call"),
            cases,
            default: vec![CStmt::Expr(CExpr::call(
                "sol_require",
                vec![CExpr::IntLit(0), CExpr::IntLit(0)],
            ))],
        });

        main.push(CStmt::While {
            cond: CExpr::call("sol_continue", vec![]),
            body: Box::new(CStmt::Block(tx)),
        });

        emit(out, &run_model.body(main), false);
        Ok(())
    }
}

fn emit(out: &mut String, def: &CFuncDef, forward: bool) {
    if forward {
        write!(out, "{}", def.forward()).expect("string write");
    } else {
        write!(out, "{def}").expect("string write");
    }
}
