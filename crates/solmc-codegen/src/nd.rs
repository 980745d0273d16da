//! Zeroed and non-deterministic value construction shared by the
//! function printer and the harness.

use solmc_analysis::error::{Result, TranslateError};
use solmc_analysis::types::MapEntry;
use solmc_analysis::AnalysisStack;
use solmc_ast::types::SolType;
use solmc_cemit::CExpr;

/// A raw (unwrapped) non-deterministic scalar, tagged with `msg`.
pub fn nd_raw(stack: &AnalysisStack<'_>, ty: &SolType, msg: &str) -> Result<CExpr> {
    match ty {
        SolType::Bool => Ok(CExpr::call(
            "nd_range",
            vec![
                CExpr::IntLit(0),
                CExpr::IntLit(2),
                CExpr::StrLit(msg.to_string()),
            ],
        )),
        SolType::Address { .. } => Ok(CExpr::call(
            "nd_range",
            vec![
                CExpr::IntLit(0),
                CExpr::IntLit(stack.addresses.size() as i128),
                CExpr::StrLit(msg.to_string()),
            ],
        )),
        SolType::Int(_) | SolType::Uint(_) => {
            let name = stack
                .types
                .nd_primitive(ty)
                .expect("integer nd primitive exists");
            Ok(CExpr::call(name, vec![CExpr::StrLit(msg.to_string())]))
        }
        other => Err(TranslateError::Unsupported(format!(
            "non-deterministic value of type {other}"
        ))),
    }
}

/// A wrapped non-deterministic value: `Init_<T>(nd…)` for scalars,
/// `ND_<S>()` for structs.
pub fn nd_value(stack: &AnalysisStack<'_>, ty: &SolType, msg: &str) -> Result<CExpr> {
    match ty {
        SolType::Struct(id) => Ok(CExpr::call(
            format!("ND_{}", stack.types.struct_name(*id)),
            vec![],
        )),
        _ if ty.is_wrapped() => {
            let wrapped = stack.types.wrapped_name(ty)?;
            Ok(CExpr::call(
                format!("Init_{wrapped}"),
                vec![nd_raw(stack, ty, msg)?],
            ))
        }
        other => Err(TranslateError::Unsupported(format!(
            "non-deterministic value of type {other}"
        ))),
    }
}

/// The zeroed instance of a value type, recursing into struct fields.
pub fn zero_value(stack: &AnalysisStack<'_>, ty: &SolType) -> Result<CExpr> {
    match ty {
        _ if ty.is_wrapped() => {
            let wrapped = stack.types.wrapped_name(ty)?;
            Ok(CExpr::call(format!("Init_{wrapped}"), vec![CExpr::IntLit(0)]))
        }
        SolType::Struct(id) => {
            let def = stack.registry.structure(*id);
            let mut args = Vec::new();
            for field in def.fields.iter().filter(|f| !f.ty.is_mapping()) {
                args.push(zero_value(stack, &field.ty)?);
            }
            Ok(CExpr::call(
                format!("Init_{}", stack.types.struct_name(*id)),
                args,
            ))
        }
        other => Err(TranslateError::Unsupported(format!(
            "zero value of type {other}"
        ))),
    }
}

/// The zeroed instance of a specialized map.
pub fn zero_map(entry: &MapEntry) -> CExpr {
    CExpr::call(format!("Init_{}", entry.struct_name()), vec![])
}
