use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::SolType;

macro_rules! id_type {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            pub struct $name(pub u32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

id_type! {
    /// Identity of a contract definition.
    ContractId,
    /// Identity of a struct definition.
    StructId,
    /// Identity of a function definition.
    FunctionId,
    /// Identity of a modifier definition.
    ModifierId,
    /// Identity of a variable declaration (state variable, field,
    /// parameter, return variable, or local).
    DeclId,
}

/// What an identifier resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclRef {
    Var(DeclId),
    Function(FunctionId),
    Contract(ContractId),
    Struct(StructId),
}

/// A whole annotated program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub contracts: Vec<Contract>,
}

/// A contract definition, with its front-end-computed linearization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub name: String,
    /// C3-linearized base contracts, most-derived first, excluding `self`.
    pub bases: Vec<ContractId>,
    pub structs: Vec<StructDef>,
    pub state_vars: Vec<VarDecl>,
    pub functions: Vec<Function>,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub id: StructId,
    pub name: String,
    pub fields: Vec<VarDecl>,
}

/// Where a declared variable lives. Storage-qualified locals are lowered
/// to pointers; everything else is embedded by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataLoc {
    #[default]
    Value,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub id: DeclId,
    /// Empty for unnamed parameters.
    pub name: String,
    pub ty: SolType,
    #[serde(default)]
    pub loc: DataLoc,
    /// Initializer, for state variables and declaration statements.
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FunctionKind {
    #[default]
    Function,
    Constructor,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    External,
    Internal,
    Private,
}

impl Visibility {
    /// True if the function is callable from outside the contract, i.e.
    /// belongs in the harness interface.
    pub fn is_exposed(self) -> bool {
        matches!(self, Visibility::Public | Visibility::External)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mutability {
    #[default]
    NonPayable,
    Payable,
    View,
    Pure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    #[serde(default)]
    pub kind: FunctionKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub mutability: Mutability,
    pub params: Vec<VarDecl>,
    pub returns: Vec<VarDecl>,
    /// Modifier invocations in source order. Invocations naming a base
    /// contract are parent-constructor calls, not modifiers.
    #[serde(default)]
    pub invocations: Vec<ModifierInvocation>,
    pub body: Block,
}

impl Function {
    pub fn is_payable(&self) -> bool {
        self.mutability == Mutability::Payable
    }

    pub fn is_pure(&self) -> bool {
        self.mutability == Mutability::Pure
    }

    /// Parameter type vector, used for override resolution by signature.
    pub fn signature(&self) -> (String, Vec<SolType>) {
        (
            self.name.clone(),
            self.params.iter().map(|p| p.ty.clone()).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: ModifierId,
    pub name: String,
    pub params: Vec<VarDecl>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierInvocation {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Declare(VarDecl),
    Expression(Expr),
    Return(Option<Expr>),
    Break,
    Continue,
    /// `emit E(...)`; filtered out during lowering.
    Emit(Expr),
    /// `_;` inside a modifier body.
    Placeholder,
    Throw,
    InlineAssembly,
}

/// How the front end classified a call expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Internal,
    External,
    BareCall,
    BareStaticCall,
    Creation,
    Transfer,
    Send,
    Assert,
    Require,
    TypeConversion,
    StructConstructor,
    // Everything below is recognized only to be rejected with a
    // diagnostic naming the construct.
    DelegateCall,
    Keccak256,
    Sha256,
    Ripemd160,
    EcRecover,
    Event,
    SetGas,
    SetValue,
    BlockHash,
    AddMod,
    MulMod,
    ArrayPush,
    ArrayPop,
    ObjectCreation,
    AbiEncode,
    AbiDecode,
    GasLeft,
    Selfdestruct,
    Revert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    BitNot,
    Neg,
    Inc,
    Dec,
}

impl UnaryOp {
    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Neg => "-",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Exp,
}

impl BinaryOp {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Exp => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    /// The binary operator a compound assignment expands to.
    pub fn to_binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Mod => Some(BinaryOp::Mod),
            AssignOp::BitAnd => Some(BinaryOp::BitAnd),
            AssignOp::BitOr => Some(BinaryOp::BitOr),
            AssignOp::BitXor => Some(BinaryOp::BitXor),
            AssignOp::Shl => Some(BinaryOp::Shl),
            AssignOp::Shr => Some(BinaryOp::Shr),
        }
    }
}

/// Numeric sub-denominations; literals fold to `value * multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubDenomination {
    #[default]
    None,
    Wei,
    Szabo,
    Finney,
    Ether,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Year,
}

impl SubDenomination {
    pub fn multiplier(self) -> i128 {
        match self {
            SubDenomination::None | SubDenomination::Wei | SubDenomination::Second => 1,
            SubDenomination::Szabo => 1_000_000_000_000,
            SubDenomination::Finney => 1_000_000_000_000_000,
            SubDenomination::Ether => 1_000_000_000_000_000_000,
            SubDenomination::Minute => 60,
            SubDenomination::Hour => 60 * 60,
            SubDenomination::Day => 60 * 60 * 24,
            SubDenomination::Week => 60 * 60 * 24 * 7,
            SubDenomination::Year => 60 * 60 * 24 * 365,
        }
    }
}

/// An annotated expression: the resolved type plus the node itself.
/// A missing type annotation is a fatal input error, surfaced by the
/// analysis layer rather than here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub ty: Option<SolType>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    BoolLit(bool),
    Number {
        value: i128,
        #[serde(default)]
        denom: SubDenomination,
    },
    StringLit(String),
    Identifier {
        name: String,
        #[serde(default)]
        decl: Option<DeclRef>,
    },
    MemberAccess {
        base: Box<Expr>,
        member: String,
        /// Resolved member declaration, when the member is a field or
        /// function of a nominal type.
        #[serde(default)]
        decl: Option<DeclRef>,
    },
    IndexAccess {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        kind: CallKind,
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// The callee of a `Creation` call: `new C`.
    New(ContractId),
    Assign {
        op: AssignOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        prefix: bool,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Tuple {
        components: Vec<Expr>,
        #[serde(default)]
        is_array: bool,
    },
    Delete(Box<Expr>),
}

impl Expr {
    /// Peels tuple parentheses: `((e))` resolves to `e`.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Tuple {
                components,
                is_array: false,
            } if components.len() == 1 => components[0].unparen(),
            _ => self,
        }
    }

    /// Finds the base identifier of an l-value expression, looking through
    /// parentheses, member accesses and index accesses.
    pub fn lvalue_identifier(&self) -> Option<&Expr> {
        match &self.unparen().kind {
            ExprKind::Identifier { .. } => Some(self.unparen()),
            ExprKind::MemberAccess { base, .. } => base.lvalue_identifier(),
            ExprKind::IndexAccess { base, .. } => base.lvalue_identifier(),
            _ => None,
        }
    }

    /// Finds the identifier of an expression, looking through casts and
    /// parentheses (but not member or index accesses).
    pub fn identifier_through_casts(&self) -> Option<&Expr> {
        let e = self.unparen();
        match &e.kind {
            ExprKind::Identifier { .. } => Some(e),
            ExprKind::Call {
                kind: CallKind::TypeConversion,
                args,
                ..
            } if args.len() == 1 => args[0].identifier_through_casts(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder as b;

    #[test]
    fn sub_denomination_multipliers() {
        assert_eq!(SubDenomination::Ether.multiplier(), 1_000_000_000_000_000_000);
        assert_eq!(SubDenomination::Minute.multiplier(), 60);
        assert_eq!(SubDenomination::Week.multiplier(), 604_800);
        assert_eq!(SubDenomination::Year.multiplier(), 31_536_000);
        assert_eq!(SubDenomination::Wei.multiplier(), 1);
    }

    #[test]
    fn assign_op_expansion() {
        assert_eq!(AssignOp::Assign.to_binary(), None);
        assert_eq!(AssignOp::Add.to_binary(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::Shr.to_binary(), Some(BinaryOp::Shr));
    }

    #[test]
    fn lvalue_sniffing_through_member_and_index() {
        let decl = b::fresh_decl_id();
        let ident = b::var_ref("accs", decl, b::mapping(b::t_uint(), b::t_uint()));
        let indexed = b::index(ident, b::num(1), b::t_uint());
        let member = b::member(indexed, "val", b::t_uint());
        let found = member.lvalue_identifier().expect("identifier");
        match &found.kind {
            ExprKind::Identifier { name, .. } => assert_eq!(name, "accs"),
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn identifier_through_cast_chain() {
        let decl = b::fresh_decl_id();
        let this = b::var_ref("a", decl, b::t_address());
        let cast = b::cast(this, b::t_uint());
        let found = cast.identifier_through_casts().expect("identifier");
        match &found.kind {
            ExprKind::Identifier { name, .. } => assert_eq!(name, "a"),
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn serde_round_trip() {
        let unit = SourceUnit {
            contracts: vec![Contract {
                id: ContractId(0),
                name: "A".into(),
                bases: vec![],
                structs: vec![],
                state_vars: vec![VarDecl {
                    id: DeclId(0),
                    name: "a".into(),
                    ty: SolType::Uint(256),
                    loc: DataLoc::Value,
                    init: None,
                }],
                functions: vec![],
                modifiers: vec![],
            }],
        };
        let json = serde_json::to_string(&unit).unwrap();
        let back: SourceUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(unit, back);
    }
}
