//! Construction helpers for annotated trees.
//!
//! The front end normally produces these trees; tests (and the occasional
//! tool) build them by hand. Ids are drawn from a process-wide counter so
//! that nodes built independently never collide.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::ast::*;
use crate::types::{MagicKind, SolType};

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

fn fresh() -> u32 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub fn fresh_decl_id() -> DeclId {
    DeclId(fresh())
}

pub fn fresh_contract_id() -> ContractId {
    ContractId(fresh())
}

pub fn fresh_struct_id() -> StructId {
    StructId(fresh())
}

pub fn fresh_function_id() -> FunctionId {
    FunctionId(fresh())
}

pub fn fresh_modifier_id() -> ModifierId {
    ModifierId(fresh())
}

// ---------------------------------------------------------------
// Types
// ---------------------------------------------------------------

pub fn t_bool() -> SolType {
    SolType::Bool
}

pub fn t_int() -> SolType {
    SolType::Int(256)
}

pub fn t_uint() -> SolType {
    SolType::Uint(256)
}

pub fn t_address() -> SolType {
    SolType::Address { payable: false }
}

pub fn t_address_payable() -> SolType {
    SolType::Address { payable: true }
}

pub fn mapping(key: SolType, value: SolType) -> SolType {
    SolType::Mapping {
        key: Box::new(key),
        value: Box::new(value),
    }
}

// ---------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------

pub fn var_decl(name: &str, ty: SolType) -> VarDecl {
    VarDecl {
        id: fresh_decl_id(),
        name: name.to_string(),
        ty,
        loc: DataLoc::Value,
        init: None,
    }
}

pub fn storage_decl(name: &str, ty: SolType) -> VarDecl {
    VarDecl {
        loc: DataLoc::Storage,
        ..var_decl(name, ty)
    }
}

pub fn var_decl_init(name: &str, ty: SolType, init: Expr) -> VarDecl {
    VarDecl {
        init: Some(init),
        ..var_decl(name, ty)
    }
}

pub fn struct_def(name: &str, fields: Vec<VarDecl>) -> StructDef {
    StructDef {
        id: fresh_struct_id(),
        name: name.to_string(),
        fields,
    }
}

pub fn modifier_def(name: &str, params: Vec<VarDecl>, stmts: Vec<Stmt>) -> Modifier {
    Modifier {
        id: fresh_modifier_id(),
        name: name.to_string(),
        params,
        body: Block { stmts },
    }
}

// ---------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------

fn expr(ty: SolType, kind: ExprKind) -> Expr {
    Expr { ty: Some(ty), kind }
}

pub fn boolean(value: bool) -> Expr {
    expr(SolType::Bool, ExprKind::BoolLit(value))
}

pub fn num(value: i128) -> Expr {
    num_typed(value, t_uint())
}

pub fn num_typed(value: i128, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::Number {
            value,
            denom: SubDenomination::None,
        },
    )
}

pub fn num_denom(value: i128, denom: SubDenomination, ty: SolType) -> Expr {
    expr(ty, ExprKind::Number { value, denom })
}

pub fn string_lit(value: &str) -> Expr {
    expr(SolType::StringLiteral, ExprKind::StringLit(value.to_string()))
}

pub fn var_ref(name: &str, decl: DeclId, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::Identifier {
            name: name.to_string(),
            decl: Some(DeclRef::Var(decl)),
        },
    )
}

/// A reference to a declared variable, typed from the declaration itself.
pub fn decl_ref(decl: &VarDecl) -> Expr {
    var_ref(&decl.name, decl.id, decl.ty.clone())
}

pub fn func_ref(name: &str, func: FunctionId) -> Expr {
    expr(
        SolType::Function,
        ExprKind::Identifier {
            name: name.to_string(),
            decl: Some(DeclRef::Function(func)),
        },
    )
}

pub fn this_ref(contract: ContractId) -> Expr {
    expr(
        SolType::Contract(contract),
        ExprKind::Identifier {
            name: "this".to_string(),
            decl: Some(DeclRef::Contract(contract)),
        },
    )
}

pub fn super_ref(contract: ContractId) -> Expr {
    expr(
        SolType::Contract(contract),
        ExprKind::Identifier {
            name: "super".to_string(),
            decl: Some(DeclRef::Contract(contract)),
        },
    )
}

pub fn magic(kind: MagicKind) -> Expr {
    let name = match kind {
        MagicKind::Msg => "msg",
        MagicKind::Block => "block",
        MagicKind::Tx => "tx",
    };
    expr(
        SolType::Magic(kind),
        ExprKind::Identifier {
            name: name.to_string(),
            decl: None,
        },
    )
}

pub fn msg_sender() -> Expr {
    member(magic(MagicKind::Msg), "sender", t_address())
}

pub fn msg_value() -> Expr {
    member(magic(MagicKind::Msg), "value", t_uint())
}

pub fn block_number() -> Expr {
    member(magic(MagicKind::Block), "number", t_uint())
}

pub fn block_timestamp() -> Expr {
    member(magic(MagicKind::Block), "timestamp", t_uint())
}

pub fn tx_origin() -> Expr {
    member(magic(MagicKind::Tx), "origin", t_address())
}

pub fn member(base: Expr, name: &str, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::MemberAccess {
            base: Box::new(base),
            member: name.to_string(),
            decl: None,
        },
    )
}

pub fn member_resolved(base: Expr, name: &str, decl: DeclRef, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::MemberAccess {
            base: Box::new(base),
            member: name.to_string(),
            decl: Some(decl),
        },
    )
}

pub fn index(base: Expr, idx: Expr, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::IndexAccess {
            base: Box::new(base),
            index: Box::new(idx),
        },
    )
}

pub fn call(kind: CallKind, callee: Expr, args: Vec<Expr>, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::Call {
            kind,
            callee: Box::new(callee),
            args,
        },
    )
}

pub fn internal_call(callee: Expr, args: Vec<Expr>, ty: SolType) -> Expr {
    call(CallKind::Internal, callee, args, ty)
}

pub fn external_call(callee: Expr, args: Vec<Expr>, ty: SolType) -> Expr {
    call(CallKind::External, callee, args, ty)
}

pub fn new_contract(contract: ContractId, args: Vec<Expr>) -> Expr {
    let callee = expr(SolType::Function, ExprKind::New(contract));
    call(CallKind::Creation, callee, args, SolType::Contract(contract))
}

pub fn require(cond: Expr) -> Expr {
    let callee = expr(
        SolType::Function,
        ExprKind::Identifier {
            name: "require".to_string(),
            decl: None,
        },
    );
    call(CallKind::Require, callee, vec![cond], SolType::Tuple(vec![]))
}

pub fn assert_call(cond: Expr) -> Expr {
    let callee = expr(
        SolType::Function,
        ExprKind::Identifier {
            name: "assert".to_string(),
            decl: None,
        },
    );
    call(CallKind::Assert, callee, vec![cond], SolType::Tuple(vec![]))
}

pub fn transfer(dst: Expr, amount: Expr) -> Expr {
    let callee = member(dst, "transfer", SolType::Function);
    call(CallKind::Transfer, callee, vec![amount], SolType::Tuple(vec![]))
}

pub fn send(dst: Expr, amount: Expr) -> Expr {
    let callee = member(dst, "send", SolType::Function);
    call(CallKind::Send, callee, vec![amount], SolType::Bool)
}

pub fn cast(arg: Expr, to: SolType) -> Expr {
    let callee = expr(
        SolType::Function,
        ExprKind::Identifier {
            name: "<conversion>".to_string(),
            decl: None,
        },
    );
    call(CallKind::TypeConversion, callee, vec![arg], to)
}

pub fn struct_ctor(def: &StructDef, args: Vec<Expr>) -> Expr {
    let callee = expr(
        SolType::Function,
        ExprKind::Identifier {
            name: def.name.clone(),
            decl: Some(DeclRef::Struct(def.id)),
        },
    );
    call(
        CallKind::StructConstructor,
        callee,
        args,
        SolType::Struct(def.id),
    )
}

pub fn assign(lhs: Expr, rhs: Expr) -> Expr {
    assign_op(AssignOp::Assign, lhs, rhs)
}

pub fn assign_op(op: AssignOp, lhs: Expr, rhs: Expr) -> Expr {
    let ty = lhs.ty.clone().unwrap_or(SolType::Tuple(vec![]));
    expr(
        ty,
        ExprKind::Assign {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    )
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: SolType) -> Expr {
    expr(
        ty,
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    )
}

pub fn unary(op: UnaryOp, prefix: bool, operand: Expr) -> Expr {
    let ty = operand.ty.clone().unwrap_or(SolType::Tuple(vec![]));
    expr(
        ty,
        ExprKind::Unary {
            op,
            prefix,
            expr: Box::new(operand),
        },
    )
}

pub fn conditional(cond: Expr, if_true: Expr, if_false: Expr) -> Expr {
    let ty = if_true.ty.clone().unwrap_or(SolType::Tuple(vec![]));
    expr(
        ty,
        ExprKind::Conditional {
            cond: Box::new(cond),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        },
    )
}

// ---------------------------------------------------------------
// Statements
// ---------------------------------------------------------------

pub fn expr_stmt(e: Expr) -> Stmt {
    Stmt::Expression(e)
}

pub fn ret(e: Expr) -> Stmt {
    Stmt::Return(Some(e))
}

pub fn ret_void() -> Stmt {
    Stmt::Return(None)
}

pub fn declare(decl: VarDecl) -> Stmt {
    Stmt::Declare(decl)
}

pub fn block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Block(Block { stmts })
}

pub fn if_stmt(cond: Expr, then_stmts: Vec<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then_branch: Box::new(block(then_stmts)),
        else_branch: None,
    }
}

pub fn if_else(cond: Expr, then_stmts: Vec<Stmt>, else_stmts: Vec<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then_branch: Box::new(block(then_stmts)),
        else_branch: Some(Box::new(block(else_stmts))),
    }
}

pub fn while_stmt(cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While {
        cond,
        body: Box::new(block(body)),
    }
}

pub fn for_stmt(
    init: Option<Stmt>,
    cond: Option<Expr>,
    update: Option<Expr>,
    body: Vec<Stmt>,
) -> Stmt {
    Stmt::For {
        init: init.map(Box::new),
        cond,
        update,
        body: Box::new(block(body)),
    }
}

// ---------------------------------------------------------------
// Functions and contracts
// ---------------------------------------------------------------

pub struct FunctionBuilder {
    f: Function,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            f: Function {
                id: fresh_function_id(),
                name: name.to_string(),
                kind: FunctionKind::Function,
                visibility: Visibility::Public,
                mutability: Mutability::NonPayable,
                params: Vec::new(),
                returns: Vec::new(),
                invocations: Vec::new(),
                body: Block::default(),
            },
        }
    }

    pub fn id(&self) -> FunctionId {
        self.f.id
    }

    pub fn constructor(mut self) -> Self {
        self.f.kind = FunctionKind::Constructor;
        self.f.name = String::new();
        self
    }

    pub fn external(mut self) -> Self {
        self.f.visibility = Visibility::External;
        self
    }

    pub fn internal(mut self) -> Self {
        self.f.visibility = Visibility::Internal;
        self
    }

    pub fn private(mut self) -> Self {
        self.f.visibility = Visibility::Private;
        self
    }

    pub fn payable(mut self) -> Self {
        self.f.mutability = Mutability::Payable;
        self
    }

    pub fn view(mut self) -> Self {
        self.f.mutability = Mutability::View;
        self
    }

    pub fn pure(mut self) -> Self {
        self.f.mutability = Mutability::Pure;
        self
    }

    pub fn param(mut self, decl: VarDecl) -> Self {
        self.f.params.push(decl);
        self
    }

    pub fn returns(mut self, decl: VarDecl) -> Self {
        self.f.returns.push(decl);
        self
    }

    pub fn invokes(mut self, name: &str, args: Vec<Expr>) -> Self {
        self.f.invocations.push(ModifierInvocation {
            name: name.to_string(),
            args,
        });
        self
    }

    pub fn body(mut self, stmts: Vec<Stmt>) -> Function {
        self.f.body = Block { stmts };
        self.f
    }
}

pub struct ContractBuilder {
    c: Contract,
}

impl ContractBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            c: Contract {
                id: fresh_contract_id(),
                name: name.to_string(),
                bases: Vec::new(),
                structs: Vec::new(),
                state_vars: Vec::new(),
                functions: Vec::new(),
                modifiers: Vec::new(),
            },
        }
    }

    pub fn id(&self) -> ContractId {
        self.c.id
    }

    /// Appends to the linearized base list (most-derived first).
    pub fn base(mut self, base: ContractId) -> Self {
        self.c.bases.push(base);
        self
    }

    pub fn state(mut self, decl: VarDecl) -> Self {
        self.c.state_vars.push(decl);
        self
    }

    pub fn structure(mut self, def: StructDef) -> Self {
        self.c.structs.push(def);
        self
    }

    pub fn function(mut self, f: Function) -> Self {
        self.c.functions.push(f);
        self
    }

    pub fn modifier(mut self, m: Modifier) -> Self {
        self.c.modifiers.push(m);
        self
    }

    pub fn build(self) -> Contract {
        self.c
    }
}

pub fn unit(contracts: Vec<Contract>) -> SourceUnit {
    SourceUnit { contracts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_do_not_collide() {
        let a = fresh_decl_id();
        let b = fresh_decl_id();
        assert_ne!(a, b);
    }

    #[test]
    fn function_builder_defaults() {
        let f = FunctionBuilder::new("f").body(vec![]);
        assert_eq!(f.visibility, Visibility::Public);
        assert_eq!(f.mutability, Mutability::NonPayable);
        assert!(f.params.is_empty());
    }

    #[test]
    fn contract_builder_collects_members() {
        let a = var_decl("a", t_uint());
        let f = FunctionBuilder::new("f").body(vec![]);
        let c = ContractBuilder::new("A").state(a).function(f).build();
        assert_eq!(c.name, "A");
        assert_eq!(c.state_vars.len(), 1);
        assert_eq!(c.functions.len(), 1);
    }
}
