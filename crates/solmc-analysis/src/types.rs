//! The type analyzer: canonical target names and encodings for every
//! source type, plus the map database that assigns each map declaration
//! its specialized container.

use std::collections::BTreeMap;

use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_ast::walk;

use crate::error::{Result, TranslateError};

/// One specialized map container: a flattened mapping declaration with its
/// ordered key list and value type.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Dense 1-based id; `struct Map_<id>` in the output.
    pub id: usize,
    pub decl: DeclId,
    pub keys: Vec<SolType>,
    pub value: SolType,
    /// Dotted path used in log and non-determinism messages.
    pub display: String,
}

impl MapEntry {
    pub fn struct_name(&self) -> String {
        format!("Map_{}", self.id)
    }
}

/// All map declarations of a source unit, in id order.
#[derive(Debug, Default)]
pub struct MapDatabase {
    entries: Vec<MapEntry>,
    by_decl: BTreeMap<DeclId, usize>,
}

impl MapDatabase {
    /// Ids are assigned per declaration, in declaration order: for each
    /// contract, struct members first, then state variables.
    pub fn build(unit: &SourceUnit) -> Self {
        let mut db = MapDatabase::default();
        for contract in &unit.contracts {
            for def in &contract.structs {
                for field in &def.fields {
                    db.record(field, format!("{}::{}::{}", contract.name, def.name, field.name));
                }
            }
            for var in &contract.state_vars {
                db.record(var, format!("{}::{}", contract.name, var.name));
            }
        }
        db
    }

    fn record(&mut self, decl: &VarDecl, display: String) {
        let Some((keys, value)) = decl.ty.flatten_mapping() else {
            return;
        };
        let id = self.entries.len() + 1;
        self.by_decl.insert(decl.id, self.entries.len());
        self.entries.push(MapEntry {
            id,
            decl: decl.id,
            keys,
            value,
            display,
        });
    }

    pub fn resolve(&self, decl: DeclId) -> Option<&MapEntry> {
        self.by_decl.get(&decl).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// The deepest key list over all maps; sizes the client address range.
    pub fn max_depth(&self) -> usize {
        self.entries.iter().map(|e| e.keys.len()).max().unwrap_or(0)
    }
}

/// Assigns every source type its target-language spelling and encoding.
#[derive(Debug)]
pub struct TypeAnalyzer {
    map_db: MapDatabase,
    contract_names: BTreeMap<ContractId, String>,
    struct_names: BTreeMap<StructId, String>,
}

impl TypeAnalyzer {
    /// Walks the unit once, recording names and enforcing the input
    /// invariant that every expression carries a type annotation.
    pub fn new(unit: &SourceUnit) -> Result<Self> {
        let mut contract_names = BTreeMap::new();
        let mut struct_names = BTreeMap::new();
        for contract in &unit.contracts {
            contract_names.insert(contract.id, contract.name.clone());
            for def in &contract.structs {
                struct_names.insert(def.id, format!("{}_Struct{}", contract.name, def.name));
            }
        }

        let mut untyped = false;
        let mut check = |e: &Expr| {
            if e.ty.is_none() {
                untyped = true;
            }
        };
        for contract in &unit.contracts {
            for func in &contract.functions {
                walk::for_each_expr(&func.body, &mut check);
            }
            for m in &contract.modifiers {
                walk::for_each_expr(&m.body, &mut check);
            }
            for var in &contract.state_vars {
                if let Some(init) = &var.init {
                    walk::for_each_subexpr(init, &mut check);
                }
            }
        }
        if untyped {
            return Err(TranslateError::MissingType);
        }

        Ok(TypeAnalyzer {
            map_db: MapDatabase::build(unit),
            contract_names,
            struct_names,
        })
    }

    pub fn map_db(&self) -> &MapDatabase {
        &self.map_db
    }

    pub fn contract_name(&self, id: ContractId) -> &str {
        &self.contract_names[&id]
    }

    pub fn struct_name(&self, id: StructId) -> &str {
        &self.struct_names[&id]
    }

    /// The resolved type of an expression; an absent annotation is a fatal
    /// input error.
    pub fn expr_type<'e>(&self, expr: &'e Expr) -> Result<&'e SolType> {
        expr.ty.as_ref().ok_or(TranslateError::MissingType)
    }

    pub fn is_wrapped(&self, ty: &SolType) -> bool {
        ty.is_wrapped()
    }

    /// The wrapped runtime type of a scalar.
    pub fn wrapped_name(&self, ty: &SolType) -> Result<String> {
        match ty {
            SolType::Bool => Ok("sol_bool_t".to_string()),
            SolType::Int(n) => Ok(format!("sol_int{n}_t")),
            SolType::Uint(n) => Ok(format!("sol_uint{n}_t")),
            SolType::Address { .. } => Ok("sol_address_t".to_string()),
            other => Err(TranslateError::Unsupported(format!(
                "no wrapped encoding for type {other}"
            ))),
        }
    }

    /// The declared type spelling for a non-mapping value.
    pub fn value_type_name(&self, ty: &SolType) -> Result<String> {
        match ty {
            SolType::Bool | SolType::Int(_) | SolType::Uint(_) | SolType::Address { .. } => {
                self.wrapped_name(ty)
            }
            SolType::Contract(id) => Ok(format!("struct {}", self.contract_name(*id))),
            SolType::Struct(id) => Ok(format!("struct {}", self.struct_name(*id))),
            SolType::Mapping { .. } => Err(TranslateError::Unsupported(
                "mapping used as a value".to_string(),
            )),
            other => Err(TranslateError::Unsupported(format!(
                "type {other} has no target encoding"
            ))),
        }
    }

    /// The declared type spelling for a variable declaration, resolving
    /// map declarations through the map database.
    pub fn decl_type_name(&self, decl: &VarDecl) -> Result<String> {
        if decl.ty.is_mapping() {
            let entry = self
                .map_db
                .resolve(decl.id)
                .ok_or(TranslateError::NotAMapping)?;
            Ok(format!("struct {}", entry.struct_name()))
        } else {
            self.value_type_name(&decl.ty)
        }
    }

    /// The raw C scalar behind a wrapped type, for invariant parameters.
    pub fn simple_ctype(&self, ty: &SolType) -> Result<&'static str> {
        match ty {
            SolType::Bool => Ok("int"),
            SolType::Int(_) => Ok("int"),
            SolType::Uint(_) => Ok("unsigned int"),
            SolType::Address { .. } => Ok("int"),
            other => Err(TranslateError::Unsupported(format!(
                "no simple C type for {other}"
            ))),
        }
    }

    /// The non-deterministic primitive producing a raw value of this type,
    /// when one exists (`bool` and `address` draw from `nd_range` instead).
    pub fn nd_primitive(&self, ty: &SolType) -> Option<String> {
        match ty {
            SolType::Int(n) => Some(format!("nd_int{n}_t")),
            SolType::Uint(n) => Some(format!("nd_uint{n}_t")),
            _ => None,
        }
    }
}
