use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::{ContractId, StructId};

/// Base of a magic (call-context) expression such as `msg` or `block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagicKind {
    Msg,
    Block,
    Tx,
}

/// A resolved source-language type, as annotated by the front end.
///
/// Only scalars, addresses, contracts, user structs and mappings are
/// translatable; the remaining variants exist so that the converter can
/// name the offending construct when it rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolType {
    Bool,
    /// Signed integer of the given bit width (8..=256).
    Int(u16),
    /// Unsigned integer of the given bit width (8..=256).
    Uint(u16),
    Address {
        payable: bool,
    },
    Contract(ContractId),
    Struct(StructId),
    Mapping {
        key: Box<SolType>,
        value: Box<SolType>,
    },
    /// `msg` / `block` / `tx`, only valid as a member-access base.
    Magic(MagicKind),
    /// The type of a callee expression; never the type of a value.
    Function,
    Array(Box<SolType>),
    FixedBytes(u16),
    StringLiteral,
    Enum(String),
    FixedPoint,
    Tuple(Vec<SolType>),
}

impl SolType {
    pub fn address() -> Self {
        SolType::Address { payable: false }
    }

    /// True for types whose runtime representation is a single-field
    /// wrapper struct (`.v` holds the raw scalar).
    pub fn is_wrapped(&self) -> bool {
        matches!(
            self,
            SolType::Bool | SolType::Int(_) | SolType::Uint(_) | SolType::Address { .. }
        )
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, SolType::Mapping { .. })
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, SolType::Contract(_))
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, SolType::Int(_))
    }

    /// Peels a mapping chain into its ordered key list and final value type.
    /// Returns `None` for non-mapping types.
    pub fn flatten_mapping(&self) -> Option<(Vec<SolType>, SolType)> {
        let SolType::Mapping { key, value } = self else {
            return None;
        };
        let mut keys = vec![(**key).clone()];
        let mut tail = (**value).clone();
        while let SolType::Mapping { key, value } = tail {
            keys.push(*key);
            tail = *value;
        }
        Some((keys, tail))
    }
}

impl fmt::Display for SolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolType::Bool => write!(f, "bool"),
            SolType::Int(n) => write!(f, "int{n}"),
            SolType::Uint(n) => write!(f, "uint{n}"),
            SolType::Address { payable: false } => write!(f, "address"),
            SolType::Address { payable: true } => write!(f, "address payable"),
            SolType::Contract(id) => write!(f, "contract#{}", id.0),
            SolType::Struct(id) => write!(f, "struct#{}", id.0),
            SolType::Mapping { key, value } => write!(f, "mapping({key}=>{value})"),
            SolType::Magic(MagicKind::Msg) => write!(f, "msg"),
            SolType::Magic(MagicKind::Block) => write!(f, "block"),
            SolType::Magic(MagicKind::Tx) => write!(f, "tx"),
            SolType::Function => write!(f, "function"),
            SolType::Array(inner) => write!(f, "{inner}[]"),
            SolType::FixedBytes(n) => write!(f, "bytes{n}"),
            SolType::StringLiteral => write!(f, "string literal"),
            SolType::Enum(name) => write!(f, "enum {name}"),
            SolType::FixedPoint => write!(f, "fixed"),
            SolType::Tuple(_) => write!(f, "tuple"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_types() {
        assert!(SolType::Bool.is_wrapped());
        assert!(SolType::Uint(256).is_wrapped());
        assert!(SolType::Int(8).is_wrapped());
        assert!(SolType::address().is_wrapped());
        assert!(!SolType::Function.is_wrapped());
        assert!(!SolType::Struct(StructId(0)).is_wrapped());
    }

    #[test]
    fn flatten_single_mapping() {
        let m = SolType::Mapping {
            key: Box::new(SolType::Uint(256)),
            value: Box::new(SolType::Bool),
        };
        let (keys, value) = m.flatten_mapping().unwrap();
        assert_eq!(keys, vec![SolType::Uint(256)]);
        assert_eq!(value, SolType::Bool);
    }

    #[test]
    fn flatten_nested_mapping() {
        let m = SolType::Mapping {
            key: Box::new(SolType::Int(256)),
            value: Box::new(SolType::Mapping {
                key: Box::new(SolType::Uint(8)),
                value: Box::new(SolType::Int(256)),
            }),
        };
        let (keys, value) = m.flatten_mapping().unwrap();
        assert_eq!(keys, vec![SolType::Int(256), SolType::Uint(8)]);
        assert_eq!(value, SolType::Int(256));
    }

    #[test]
    fn flatten_non_mapping_is_none() {
        assert!(SolType::Bool.flatten_mapping().is_none());
    }
}
