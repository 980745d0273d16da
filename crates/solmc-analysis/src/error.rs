use thiserror::Error;

/// Fatal translation errors. Every failure aborts the session; the caller
/// discards any partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A source construct the model has no encoding for.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("expression carries no type annotation")]
    MissingType,

    #[error("identifier '{0}' references no declaration")]
    UnresolvedIdentifier(String),

    #[error("index access applied to a non-mapping type")]
    NotAMapping,

    #[error("unable to extract address from payment call")]
    PaymentTarget,

    #[error("struct constructor called without an identifier")]
    StructCtorTarget,

    #[error("contract constructor called without a type name")]
    ContractCtorTarget,

    #[error("unrecognized {kind} member: {member}")]
    UnknownMember { kind: &'static str, member: String },

    #[error("bundle has no public or external calls")]
    EmptyInterface,

    #[error("allocation graph contains a cycle through contract '{0}'")]
    AllocationCycle(String),

    #[error("struct invariants are not yet supported")]
    StructInvariant,

    #[error("model names unknown contract '{0}'")]
    UnknownModelContract(String),
}

pub type Result<T> = std::result::Result<T, TranslateError>;
