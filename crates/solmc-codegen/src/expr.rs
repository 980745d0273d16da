//! The expression converter: lowers one annotated expression into a
//! target expression tree, folding map accesses into `Read`/`Write`/`Ref`
//! calls and unwrapping wrapped scalars as contexts demand.

use sha2::{Digest, Sha256};

use solmc_analysis::callstate::{magic_field, CallStateField, CALL_STATE};
use solmc_analysis::error::{Result, TranslateError};
use solmc_analysis::types::MapEntry;
use solmc_analysis::AnalysisStack;
use solmc_ast::ast::*;
use solmc_ast::types::{MagicKind, SolType};
use solmc_cemit::CExpr;

use crate::scope::{rewrite, VarContext, VariableScopeResolver};
use crate::specialization::FunctionSpecialization;

/// Deterministic integer stand-in for a string literal.
pub fn string_literal_hash(value: &str) -> i128 {
    let digest = Sha256::digest(value.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) as i128
}

/// The name of the symbolic global an address literal lowers to.
pub fn address_literal_name(value: i128) -> String {
    format!("global_index_const_{value}")
}

/// The call-state argument vector for the next call: pass-through for
/// internal calls, a fresh boundary (caller address as sender, zero value,
/// paid) for external ones.
pub fn next_call_state(external: bool) -> Vec<CExpr> {
    CALL_STATE
        .iter()
        .map(|field| match field {
            CallStateField::Sender if external => CExpr::ptr_id("self").member("model_address"),
            CallStateField::Value if external => {
                CExpr::call("Init_sol_uint256_t", vec![CExpr::IntLit(0)])
            }
            CallStateField::Paid => CExpr::call(
                "Init_sol_bool_t",
                vec![CExpr::IntLit(if external { 1 } else { 0 })],
            ),
            other => CExpr::id(other.name()),
        })
        .collect()
}

pub struct ExprConverter<'a, 'u> {
    stack: &'a AnalysisStack<'u>,
    decls: &'a VariableScopeResolver,
    spec: Option<&'a FunctionSpecialization>,
    find_ref: bool,
    lval: bool,
}

impl<'a, 'u> ExprConverter<'a, 'u> {
    pub fn new(
        stack: &'a AnalysisStack<'u>,
        decls: &'a VariableScopeResolver,
        spec: Option<&'a FunctionSpecialization>,
    ) -> Self {
        ExprConverter {
            stack,
            decls,
            spec,
            find_ref: false,
            lval: false,
        }
    }

    /// Converts a full expression; `find_ref` requests the address of the
    /// result rather than its value.
    pub fn convert(&mut self, expr: &Expr, find_ref: bool) -> Result<CExpr> {
        self.find_ref = find_ref;
        self.lval = false;
        self.convert_expr(expr)
    }

    fn with_flags<T>(
        &mut self,
        find_ref: bool,
        lval: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = (self.find_ref, self.lval);
        self.find_ref = find_ref;
        self.lval = lval;
        let out = f(self);
        self.find_ref = saved.0;
        self.lval = saved.1;
        out
    }

    fn expr_type<'e>(&self, e: &'e Expr) -> Result<&'e SolType> {
        self.stack.types.expr_type(e)
    }

    fn convert_expr(&mut self, e: &Expr) -> Result<CExpr> {
        match &e.kind {
            ExprKind::BoolLit(v) => Ok(CExpr::IntLit(if *v { 1 } else { 0 })),
            ExprKind::Number { value, denom } => self.convert_number(e, *value, *denom),
            ExprKind::StringLit(s) => Ok(CExpr::IntLit(string_literal_hash(s))),
            ExprKind::Identifier { name, decl } => self.convert_identifier(e, name, *decl),
            ExprKind::MemberAccess { base, member, .. } => self.convert_member(e, base, member),
            ExprKind::IndexAccess { .. } => self.convert_index(e),
            ExprKind::Call { kind, callee, args } => self.convert_call(e, *kind, callee, args),
            ExprKind::Assign { op, lhs, rhs } => self.convert_assignment(*op, lhs, rhs),
            ExprKind::Unary { op, prefix, expr } => self.convert_unary(*op, *prefix, expr),
            ExprKind::Binary { op, lhs, rhs } => self.convert_binary(*op, lhs, rhs),
            ExprKind::Conditional {
                cond,
                if_true,
                if_false,
            } => Ok(CExpr::Cond {
                cond: Box::new(self.with_flags(false, false, |s| s.convert_expr(cond))?),
                if_true: Box::new(self.with_flags(false, false, |s| s.convert_expr(if_true))?),
                if_false: Box::new(self.with_flags(false, false, |s| s.convert_expr(if_false))?),
            }),
            ExprKind::Tuple {
                components,
                is_array,
            } => {
                if *is_array {
                    Err(TranslateError::Unsupported("inline arrays".into()))
                } else if components.len() == 1 {
                    self.convert_expr(&components[0])
                } else {
                    Err(TranslateError::Unsupported("multivalue tuples".into()))
                }
            }
            ExprKind::Delete(_) => Err(TranslateError::Unsupported("delete".into())),
            ExprKind::New(_) => Err(TranslateError::ContractCtorTarget),
        }
    }

    fn convert_number(&mut self, e: &Expr, value: i128, denom: SubDenomination) -> Result<CExpr> {
        if matches!(self.expr_type(e)?, SolType::Address { .. }) {
            return Ok(CExpr::id(address_literal_name(value)));
        }
        Ok(CExpr::IntLit(value * denom.multiplier()))
    }

    fn convert_identifier(
        &mut self,
        e: &Expr,
        name: &str,
        decl: Option<DeclRef>,
    ) -> Result<CExpr> {
        if name == "this" {
            return Ok(CExpr::ptr_id("self"));
        }
        if matches!(self.expr_type(e)?, SolType::Magic(_)) {
            return Err(TranslateError::Unsupported(
                "magic value outside member access".into(),
            ));
        }
        match decl {
            Some(DeclRef::Var(_)) => {}
            None => return Err(TranslateError::UnresolvedIdentifier(name.to_string())),
            Some(_) => {
                return Err(TranslateError::Unsupported(format!(
                    "declaration-valued identifier '{name}'"
                )))
            }
        }
        let resolved = self.decls.resolve_identifier(name);
        let id = if resolved.pointer {
            CExpr::ptr_id(resolved.name)
        } else {
            CExpr::id(resolved.name)
        };
        Ok(self.finish_value(id, self.expr_type(e)?.clone()))
    }

    /// Applies the reference/unwrap postlude shared by identifiers,
    /// member accesses and map reads.
    fn finish_value(&self, expr: CExpr, ty: SolType) -> CExpr {
        if self.find_ref {
            if expr.is_pointer() {
                expr
            } else {
                expr.reference()
            }
        } else if ty.is_wrapped() {
            expr.unwrap_v()
        } else {
            expr
        }
    }

    fn convert_member(&mut self, e: &Expr, base: &Expr, member: &str) -> Result<CExpr> {
        let base_ty = self.expr_type(base)?.clone();
        let find_ref = self.find_ref;

        let raw = self.with_flags(false, self.lval, |s| match &base_ty {
            SolType::Address { .. } => s.convert_balance_member(base, member),
            SolType::Array(_) | SolType::FixedBytes(_) | SolType::StringLiteral => {
                if member == "length" {
                    Err(TranslateError::Unsupported("array-like lengths".into()))
                } else {
                    Err(TranslateError::UnknownMember {
                        kind: "array-like",
                        member: member.to_string(),
                    })
                }
            }
            SolType::Contract(_) | SolType::Struct(_) => {
                let converted = s.convert_expr(base)?;
                Ok(converted.member(rewrite(member, false, VarContext::Struct)))
            }
            SolType::Magic(kind) => s.convert_magic_member(*kind, member),
            _ => Err(TranslateError::UnknownMember {
                kind: "expression",
                member: member.to_string(),
            }),
        })?;

        if find_ref {
            Ok(raw.reference())
        } else if self.expr_type(e)?.is_wrapped() {
            Ok(raw.unwrap_v())
        } else {
            Ok(raw)
        }
    }

    fn convert_balance_member(&mut self, base: &Expr, member: &str) -> Result<CExpr> {
        if member != "balance" {
            return Err(TranslateError::UnknownMember {
                kind: "address",
                member: member.to_string(),
            });
        }
        let id = base
            .identifier_through_casts()
            .ok_or(TranslateError::Unsupported(
                "balance of arbitrary address".into(),
            ))?;
        if !matches!(self.expr_type(id)?, SolType::Contract(_)) {
            return Err(TranslateError::Unsupported(
                "balance of arbitrary address".into(),
            ));
        }
        let converted = self.convert_expr(id)?;
        Ok(converted.member("model_balance"))
    }

    fn convert_magic_member(&mut self, kind: MagicKind, member: &str) -> Result<CExpr> {
        let field = magic_field(kind, member).ok_or(TranslateError::UnknownMember {
            kind: "call-state",
            member: member.to_string(),
        })?;
        Ok(CExpr::id(field.name()))
    }

    /// Peels a (possibly nested) index access into its root map
    /// declaration and ordered key expressions.
    fn index_chain<'e>(&self, e: &'e Expr) -> Result<(&'e Expr, Vec<&'e Expr>, MapEntry)> {
        let mut keys: Vec<&'e Expr> = Vec::new();
        let mut cur = e;
        loop {
            match &cur.kind {
                ExprKind::IndexAccess { base, index } => {
                    keys.push(index);
                    cur = base.unparen();
                }
                _ => break,
            }
        }
        keys.reverse();
        if !matches!(self.expr_type(cur)?, SolType::Mapping { .. }) {
            return Err(TranslateError::NotAMapping);
        }
        let decl = solmc_analysis::reach::map_root_decl(cur).ok_or(TranslateError::NotAMapping)?;
        let entry = self
            .stack
            .types
            .map_db()
            .resolve(decl)
            .ok_or(TranslateError::NotAMapping)?
            .clone();
        Ok((cur, keys, entry))
    }

    fn convert_index(&mut self, e: &Expr) -> Result<CExpr> {
        let result_ty = self.expr_type(e)?.clone();
        if result_ty.is_mapping() {
            return Err(TranslateError::Unsupported("partial map access".into()));
        }
        let (root, keys, entry) = self.index_chain(e)?;
        let call = self.mapping_call(root, &keys, &entry, None, self.find_ref || self.lval)?;

        if self.find_ref {
            Ok(call)
        } else if self.lval {
            let deref = call.deref();
            Ok(if result_ty.is_wrapped() {
                deref.unwrap_v()
            } else {
                deref
            })
        } else if result_ty.is_wrapped() {
            Ok(call.unwrap_v())
        } else {
            Ok(call)
        }
    }

    /// Builds `Read_`/`Write_`/`Ref_` calls for a map access. `value`
    /// present selects `Write`; otherwise `reference` selects `Ref`.
    fn mapping_call(
        &mut self,
        root: &Expr,
        keys: &[&Expr],
        entry: &MapEntry,
        value: Option<CExpr>,
        reference: bool,
    ) -> Result<CExpr> {
        let op = if value.is_some() {
            "Write"
        } else if reference {
            "Ref"
        } else {
            "Read"
        };
        let name = format!("{op}_{}", entry.struct_name());
        let mut args = Vec::with_capacity(keys.len() + 2);
        args.push(self.with_flags(true, false, |s| s.convert_expr(root))?);
        for (&key, key_ty) in keys.iter().zip(&entry.keys) {
            args.push(self.wrap_arg(key, key_ty)?);
        }
        if let Some(v) = value {
            args.push(v);
        }
        Ok(if op == "Ref" {
            CExpr::ptr_call(name, args)
        } else {
            CExpr::call(name, args)
        })
    }

    /// Converts an argument and wraps it to the expected parameter type.
    pub fn convert_as(&mut self, arg: &Expr, expected: &SolType) -> Result<CExpr> {
        self.wrap_arg(arg, expected)
    }

    fn wrap_arg(&mut self, arg: &Expr, expected: &SolType) -> Result<CExpr> {
        let raw = self.with_flags(false, false, |s| s.convert_expr(arg))?;
        self.wrap_value(raw, expected)
    }

    fn wrap_value(&self, raw: CExpr, expected: &SolType) -> Result<CExpr> {
        if expected.is_wrapped() {
            let name = self.stack.types.wrapped_name(expected)?;
            Ok(CExpr::call(format!("Init_{name}"), vec![raw]))
        } else {
            Ok(raw)
        }
    }

    fn convert_assignment(&mut self, op: AssignOp, lhs: &Expr, rhs: &Expr) -> Result<CExpr> {
        // Contract instantiation assigns in place through the target.
        if let Some(id) = lhs.lvalue_identifier() {
            let contract_target = matches!(self.expr_type(id)?, SolType::Contract(_));
            let rhs_creation = matches!(
                rhs.unparen().kind,
                ExprKind::Call {
                    kind: CallKind::Creation,
                    ..
                }
            );
            if contract_target && rhs_creation {
                let ExprKind::Identifier { name, .. } = &id.kind else {
                    return Err(TranslateError::ContractCtorTarget);
                };
                let target = self.decls.resolve_identifier(name);
                return self.convert_creation(rhs.unparen(), Some(target));
            }
        }

        // Establish the right-hand side, expanding compound operators.
        let lhs_is_ptr = lhs
            .lvalue_identifier()
            .and_then(|id| match &id.kind {
                ExprKind::Identifier { name, .. } => Some(name.clone()),
                _ => None,
            })
            .map(|name| self.decls.resolve_identifier(&name).pointer)
            .unwrap_or(false);

        let rhs_c = match op.to_binary() {
            Some(bin) => {
                let read = self.with_flags(false, false, |s| s.convert_expr(lhs))?;
                let rhs_raw = self.with_flags(false, false, |s| s.convert_expr(rhs))?;
                read.binary(bin.token(), rhs_raw)
            }
            None => self.with_flags(lhs_is_ptr, false, |s| s.convert_expr(rhs))?,
        };

        // A direct map target becomes a Write call.
        if let ExprKind::IndexAccess { .. } = &lhs.unparen().kind {
            let (root, keys, entry) = self.index_chain(lhs.unparen())?;
            let wrapped = self.wrap_value(rhs_c, &entry.value)?;
            return self.mapping_call(root, &keys, &entry, Some(wrapped), false);
        }

        let lhs_c = self.with_flags(false, true, |s| s.convert_expr(lhs))?;
        Ok(lhs_c.assign(rhs_c))
    }

    fn convert_unary(&mut self, op: UnaryOp, prefix: bool, operand: &Expr) -> Result<CExpr> {
        let converted = self.with_flags(false, false, |s| s.convert_expr(operand))?;
        Ok(CExpr::Unary {
            op: op.token(),
            prefix,
            expr: Box::new(converted),
        })
    }

    fn convert_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<CExpr> {
        if op == BinaryOp::Exp {
            return Err(TranslateError::Unsupported("operator **".into()));
        }
        if op == BinaryOp::Shr && self.expr_type(lhs)?.is_signed() {
            return Err(TranslateError::Unsupported(
                "arithmetic shift right".into(),
            ));
        }
        let l = self.with_flags(false, false, |s| s.convert_expr(lhs))?;
        let r = self.with_flags(false, false, |s| s.convert_expr(rhs))?;
        Ok(l.binary(op.token(), r))
    }

    // -----------------------------------------------------------------
    // Function calls
    // -----------------------------------------------------------------

    fn convert_call(
        &mut self,
        e: &Expr,
        kind: CallKind,
        callee: &Expr,
        args: &[Expr],
    ) -> Result<CExpr> {
        match kind {
            CallKind::Internal
            | CallKind::External
            | CallKind::BareCall
            | CallKind::BareStaticCall => self.convert_method(e, callee, args),
            CallKind::Creation => self.convert_creation(e, None),
            CallKind::Transfer => self.convert_payment("_pay", callee, args),
            CallKind::Send => self.convert_payment("_pay_use_rv", callee, args),
            CallKind::Assert => self.convert_assertion("sol_assert", args),
            CallKind::Require => self.convert_assertion("sol_require", args),
            CallKind::TypeConversion => self.convert_cast(e, args),
            CallKind::StructConstructor => self.convert_struct_ctor(callee, args),
            CallKind::DelegateCall => Err(TranslateError::Unsupported("delegate calls".into())),
            CallKind::Keccak256 => Err(TranslateError::Unsupported("KECCAK256".into())),
            CallKind::Sha256 => Err(TranslateError::Unsupported("SHA256".into())),
            CallKind::Ripemd160 => Err(TranslateError::Unsupported("RIPEMD160".into())),
            CallKind::EcRecover => Err(TranslateError::Unsupported("ECRecover".into())),
            CallKind::Event => Err(TranslateError::Unsupported("logging".into())),
            CallKind::SetGas => Err(TranslateError::Unsupported("`gas(<val>)`".into())),
            CallKind::SetValue => Err(TranslateError::Unsupported("`value(<val>)`".into())),
            CallKind::BlockHash => Err(TranslateError::Unsupported("`block.blockhash`".into())),
            CallKind::AddMod => Err(TranslateError::Unsupported("addmod".into())),
            CallKind::MulMod => Err(TranslateError::Unsupported("mulmod".into())),
            CallKind::ArrayPush => Err(TranslateError::Unsupported("`<array>.push`".into())),
            CallKind::ArrayPop => Err(TranslateError::Unsupported("`<array>.pop`".into())),
            CallKind::ObjectCreation => Err(TranslateError::Unsupported("`new <array>`".into())),
            CallKind::AbiEncode => Err(TranslateError::Unsupported("`abi.encode`".into())),
            CallKind::AbiDecode => Err(TranslateError::Unsupported("`abi.decode`".into())),
            CallKind::GasLeft => Err(TranslateError::Unsupported("gasleft".into())),
            CallKind::Selfdestruct => Err(TranslateError::Unsupported("selfdestruct".into())),
            CallKind::Revert => Err(TranslateError::Unsupported("revert".into())),
        }
    }

    fn push_call_state(&self, args: &mut Vec<CExpr>, external: bool) {
        args.extend(next_call_state(external));
    }

    fn convert_method(&mut self, e: &Expr, callee: &Expr, args: &[Expr]) -> Result<CExpr> {
        let callee = callee.unparen();

        // `super.f(…)` routes to the next body in the super chain.
        let is_super = matches!(
            &callee.kind,
            ExprKind::MemberAccess { base, .. }
                if matches!(&base.unparen().kind, ExprKind::Identifier { name, .. } if name == "super")
        );

        let target = match &callee.kind {
            ExprKind::Identifier {
                decl: Some(DeclRef::Function(id)),
                ..
            }
            | ExprKind::MemberAccess {
                decl: Some(DeclRef::Function(id)),
                ..
            } => *id,
            ExprKind::Identifier { name, .. } | ExprKind::MemberAccess { member: name, .. } => {
                return Err(TranslateError::UnresolvedIdentifier(name.clone()))
            }
            _ => return Err(TranslateError::Unsupported("computed call target".into())),
        };
        let func = self.stack.registry.function(target);

        let mut call_args: Vec<CExpr> = Vec::new();
        let (name, external) = if is_super {
            let spec = self
                .spec
                .ok_or_else(|| TranslateError::Unsupported("super outside a method".into()))?;
            let name = spec
                .super_call_name(self.stack)
                .ok_or_else(|| TranslateError::Unsupported("super beyond chain end".into()))?;
            call_args.push(CExpr::ptr_id("self"));
            (name, false)
        } else {
            // A contract-typed member base makes the call external.
            let receiver = if let ExprKind::MemberAccess { base, .. } = &callee.kind {
                if matches!(self.expr_type(base)?, SolType::Contract(_)) {
                    Some(base)
                } else {
                    None
                }
            } else {
                None
            };
            match receiver {
                Some(base) => {
                    let carrier = match self.expr_type(base)? {
                        SolType::Contract(id) => *id,
                        _ => unreachable!("guarded above"),
                    };
                    let converted = self.with_flags(false, false, |s| s.convert_expr(base))?;
                    let converted = if converted.is_pointer() {
                        converted
                    } else {
                        converted.reference()
                    };
                    call_args.push(converted);
                    (
                        FunctionSpecialization::entry(target, carrier).name(self.stack),
                        true,
                    )
                }
                None => {
                    let carrier = self
                        .spec
                        .map(|s| s.carrier)
                        .unwrap_or_else(|| self.stack.registry.function_owner(target).id);
                    call_args.push(CExpr::ptr_id("self"));
                    (
                        FunctionSpecialization::entry(target, carrier).name(self.stack),
                        false,
                    )
                }
            }
        };

        if !func.is_pure() {
            self.push_call_state(&mut call_args, external);
        }
        for (arg, param) in args.iter().zip(&func.params) {
            call_args.push(self.wrap_arg(arg, &param.ty)?);
        }

        let call = CExpr::call(name, call_args);
        if func.returns.len() == 1 && self.expr_type(e)?.is_wrapped() && !self.find_ref {
            Ok(call.unwrap_v())
        } else {
            Ok(call)
        }
    }

    fn convert_creation(
        &mut self,
        e: &Expr,
        target: Option<crate::scope::ResolvedId>,
    ) -> Result<CExpr> {
        let ExprKind::Call {
            kind: CallKind::Creation,
            callee,
            args,
        } = &e.kind
        else {
            return Err(TranslateError::ContractCtorTarget);
        };
        let ExprKind::New(contract_id) = &callee.unparen().kind else {
            return Err(TranslateError::ContractCtorTarget);
        };
        let target = target.ok_or(TranslateError::ContractCtorTarget)?;
        let contract = self.stack.registry.contract(*contract_id);

        let mut call_args = Vec::new();
        let id = if target.pointer {
            CExpr::ptr_id(target.name)
        } else {
            CExpr::id(target.name)
        };
        call_args.push(if id.is_pointer() { id } else { id.reference() });
        self.push_call_state(&mut call_args, true);

        let ctor = contract
            .functions
            .iter()
            .find(|f| f.kind == FunctionKind::Constructor);
        if let Some(ctor) = ctor {
            for (arg, param) in args.iter().zip(&ctor.params) {
                call_args.push(self.wrap_arg(arg, &param.ty)?);
            }
        }

        Ok(CExpr::call(format!("Init_{}", contract.name), call_args))
    }

    fn convert_payment(&mut self, op: &str, callee: &Expr, args: &[Expr]) -> Result<CExpr> {
        if args.len() != 1 {
            return Err(TranslateError::Unsupported(
                "payment without an amount".into(),
            ));
        }
        let ExprKind::MemberAccess { base: dst, .. } = &callee.unparen().kind else {
            return Err(TranslateError::PaymentTarget);
        };

        let balance = CExpr::ptr_id("self").member("model_balance").reference();
        let dst_c = self.wrap_arg(dst, &SolType::Address { payable: true })?;
        let amt_c = self.wrap_arg(&args[0], &SolType::Uint(256))?;
        Ok(CExpr::call(op, vec![balance, dst_c, amt_c]))
    }

    fn convert_assertion(&mut self, op: &str, args: &[Expr]) -> Result<CExpr> {
        let cond = args
            .first()
            .ok_or_else(|| TranslateError::Unsupported("assertion without condition".into()))?;
        let cond_c = self.with_flags(false, false, |s| s.convert_expr(cond))?;
        // Any message argument is discarded.
        Ok(CExpr::call(op, vec![cond_c, CExpr::IntLit(0)]))
    }

    fn convert_cast(&mut self, e: &Expr, args: &[Expr]) -> Result<CExpr> {
        if args.len() != 1 {
            return Err(TranslateError::Unsupported(
                "typecast of multiple values".into(),
            ));
        }
        let arg = &args[0];
        let base_ty = self.expr_type(arg)?.clone();
        let cast_ty = self.expr_type(e)?.clone();

        // Address literals resolve into the symbolic index space.
        if let ExprKind::Number { value, .. } = &arg.unparen().kind {
            if matches!(cast_ty, SolType::Address { .. }) {
                return Ok(CExpr::Cast {
                    ty: "int".into(),
                    expr: Box::new(CExpr::id(address_literal_name(*value))),
                });
            }
        }

        let converted = self.with_flags(false, false, |s| s.convert_expr(arg))?;
        let cast = |ty: &str, e: CExpr| CExpr::Cast {
            ty: ty.into(),
            expr: Box::new(e),
        };

        match (&base_ty, &cast_ty) {
            (SolType::Address { .. }, SolType::Int(_)) => Ok(converted),
            (SolType::Address { .. }, SolType::Uint(_)) => Ok(cast("unsigned int", converted)),
            (SolType::Address { .. }, SolType::Address { .. }) => Ok(converted),
            (SolType::Address { .. }, SolType::Enum(_)) => {
                Err(TranslateError::Unsupported("enums".into()))
            }
            (SolType::Address { .. }, _) => {
                Err(TranslateError::Unsupported("address cast".into()))
            }
            (SolType::Int(_) | SolType::Uint(_), SolType::Int(_) | SolType::Uint(_)) => {
                if base_ty.is_signed() == cast_ty.is_signed() {
                    Ok(converted)
                } else if cast_ty.is_signed() {
                    Ok(cast("int", converted))
                } else {
                    Ok(cast("unsigned int", converted))
                }
            }
            (SolType::Int(_) | SolType::Uint(_), SolType::Address { .. }) => {
                if base_ty.is_signed() {
                    Ok(converted)
                } else {
                    Ok(cast("int", converted))
                }
            }
            (SolType::Int(_) | SolType::Uint(_), SolType::Enum(_)) => {
                Err(TranslateError::Unsupported("enums".into()))
            }
            (SolType::Int(_) | SolType::Uint(_), _) => {
                Err(TranslateError::Unsupported("integer cast".into()))
            }
            (SolType::Bool, SolType::Bool) => Ok(converted),
            (SolType::Bool, _) => Err(TranslateError::Unsupported("bool cast".into())),
            (SolType::Contract(_), SolType::Address { .. }) => {
                Ok(converted.member("model_address").unwrap_v())
            }
            (SolType::Contract(_), SolType::Contract(_)) => {
                Err(TranslateError::Unsupported("contract-to-contract casts".into()))
            }
            (SolType::Contract(_), _) => Err(TranslateError::Unsupported("contract cast".into())),
            (SolType::StringLiteral, _) => {
                Err(TranslateError::Unsupported("string conversions".into()))
            }
            (SolType::FixedBytes(_), _) => Err(TranslateError::Unsupported("byte arrays".into())),
            (SolType::Array(_), _) => Err(TranslateError::Unsupported("arrays".into())),
            (SolType::Enum(_), _) => Err(TranslateError::Unsupported("enums".into())),
            (SolType::FixedPoint, _) | (_, SolType::FixedPoint) => {
                Err(TranslateError::Unsupported("fixed-point conversion".into()))
            }
            _ => Err(TranslateError::Unsupported(
                "conversion of unexpected type".into(),
            )),
        }
    }

    fn convert_struct_ctor(&mut self, callee: &Expr, args: &[Expr]) -> Result<CExpr> {
        let ExprKind::Identifier {
            decl: Some(DeclRef::Struct(sid)),
            ..
        } = &callee.unparen().kind
        else {
            return Err(TranslateError::StructCtorTarget);
        };
        let def = self.stack.registry.structure(*sid);
        let name = format!("Init_{}", self.stack.types.struct_name(*sid));

        let mut call_args = Vec::new();
        let value_fields = def.fields.iter().filter(|f| !f.ty.is_mapping());
        for (arg, field) in args.iter().zip(value_fields) {
            call_args.push(self.wrap_arg(arg, &field.ty)?);
        }
        Ok(CExpr::call(name, call_args))
    }
}
