//! The call-state descriptor: the ambient message/block context threaded
//! through every non-pure method as an ordered parameter tuple.

use solmc_ast::types::{MagicKind, SolType};

/// One field of the call-state record. The declared order below is part of
/// the external contract with the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStateField {
    Sender,
    Value,
    Blocknum,
    Timestamp,
    Paid,
    Origin,
}

/// The fixed field order.
pub const CALL_STATE: [CallStateField; 6] = [
    CallStateField::Sender,
    CallStateField::Value,
    CallStateField::Blocknum,
    CallStateField::Timestamp,
    CallStateField::Paid,
    CallStateField::Origin,
];

impl CallStateField {
    /// The emitted local/parameter name.
    pub fn name(self) -> &'static str {
        match self {
            CallStateField::Sender => "sender",
            CallStateField::Value => "value",
            CallStateField::Blocknum => "blocknum",
            CallStateField::Timestamp => "timestamp",
            CallStateField::Paid => "paid",
            CallStateField::Origin => "origin",
        }
    }

    /// The wrapped type this field is declared with.
    pub fn type_name(self) -> &'static str {
        match self {
            CallStateField::Sender | CallStateField::Origin => "sol_address_t",
            CallStateField::Value | CallStateField::Blocknum | CallStateField::Timestamp => {
                "sol_uint256_t"
            }
            CallStateField::Paid => "sol_bool_t",
        }
    }

    pub fn sol_type(self) -> SolType {
        match self {
            CallStateField::Sender | CallStateField::Origin => SolType::address(),
            CallStateField::Value | CallStateField::Blocknum | CallStateField::Timestamp => {
                SolType::Uint(256)
            }
            CallStateField::Paid => SolType::Bool,
        }
    }
}

/// Resolves a member access on a magic base (`msg.sender`, `block.number`,
/// …) to the call-state field it names.
pub fn magic_field(kind: MagicKind, member: &str) -> Option<CallStateField> {
    match (kind, member) {
        (MagicKind::Msg, "sender") => Some(CallStateField::Sender),
        (MagicKind::Msg, "value") => Some(CallStateField::Value),
        (MagicKind::Block, "number") => Some(CallStateField::Blocknum),
        (MagicKind::Block, "timestamp") => Some(CallStateField::Timestamp),
        (MagicKind::Tx, "origin") => Some(CallStateField::Origin),
        _ => None,
    }
}
