//! Id-to-node lookup tables, built once per source unit.
//!
//! The inheritance and allocation relations are potentially cyclic, so
//! analyses traverse ids rather than references; this registry is the
//! arena they resolve ids against.

use std::collections::BTreeMap;

use crate::ast::*;

#[derive(Debug)]
pub struct Registry<'a> {
    contracts: BTreeMap<ContractId, &'a Contract>,
    contracts_by_name: BTreeMap<&'a str, ContractId>,
    structs: BTreeMap<StructId, &'a StructDef>,
    functions: BTreeMap<FunctionId, (&'a Contract, &'a Function)>,
    modifiers: BTreeMap<ModifierId, (&'a Contract, &'a Modifier)>,
    decls: BTreeMap<DeclId, &'a VarDecl>,
}

impl<'a> Registry<'a> {
    pub fn build(unit: &'a SourceUnit) -> Self {
        let mut reg = Registry {
            contracts: BTreeMap::new(),
            contracts_by_name: BTreeMap::new(),
            structs: BTreeMap::new(),
            functions: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            decls: BTreeMap::new(),
        };
        for contract in &unit.contracts {
            reg.contracts.insert(contract.id, contract);
            reg.contracts_by_name
                .insert(contract.name.as_str(), contract.id);
            for def in &contract.structs {
                reg.structs.insert(def.id, def);
                for field in &def.fields {
                    reg.record_decl(field);
                }
            }
            for var in &contract.state_vars {
                reg.record_decl(var);
            }
            for func in &contract.functions {
                reg.functions.insert(func.id, (contract, func));
                for p in func.params.iter().chain(&func.returns) {
                    reg.record_decl(p);
                }
                reg.record_block(&func.body);
            }
            for m in &contract.modifiers {
                reg.modifiers.insert(m.id, (contract, m));
                for p in &m.params {
                    reg.record_decl(p);
                }
                reg.record_block(&m.body);
            }
        }
        reg
    }

    fn record_decl(&mut self, decl: &'a VarDecl) {
        self.decls.insert(decl.id, decl);
    }

    fn record_block(&mut self, block: &'a Block) {
        for stmt in &block.stmts {
            self.record_stmt(stmt);
        }
    }

    fn record_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(b) => self.record_block(b),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.record_stmt(then_branch);
                if let Some(e) = else_branch {
                    self.record_stmt(e);
                }
            }
            Stmt::While { body, .. } => self.record_stmt(body),
            Stmt::For { init, body, .. } => {
                if let Some(i) = init {
                    self.record_stmt(i);
                }
                self.record_stmt(body);
            }
            Stmt::Declare(decl) => self.record_decl(decl),
            _ => {}
        }
    }

    pub fn contract(&self, id: ContractId) -> &'a Contract {
        self.contracts[&id]
    }

    pub fn contract_by_name(&self, name: &str) -> Option<&'a Contract> {
        self.contracts_by_name.get(name).map(|id| self.contracts[id])
    }

    pub fn structure(&self, id: StructId) -> &'a StructDef {
        self.structs[&id]
    }

    pub fn function(&self, id: FunctionId) -> &'a Function {
        self.functions[&id].1
    }

    pub fn function_owner(&self, id: FunctionId) -> &'a Contract {
        self.functions[&id].0
    }

    pub fn modifier(&self, id: ModifierId) -> &'a Modifier {
        self.modifiers[&id].1
    }

    pub fn decl(&self, id: DeclId) -> Option<&'a VarDecl> {
        self.decls.get(&id).copied()
    }

}
