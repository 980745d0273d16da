//! Block lowering: function bodies, modifier bodies (with placeholder
//! expansion), and constructor bodies, sharing one statement walker.

use solmc_analysis::error::{Result, TranslateError};
use solmc_analysis::AnalysisStack;
use solmc_ast::ast::*;
use solmc_ast::types::SolType;
use solmc_cemit::{CExpr, CStmt, CVarDecl};

pub use crate::expr::next_call_state;
use crate::expr::ExprConverter;
use crate::scope::{rewrite, VarContext, VariableScopeResolver};
use crate::specialization::FunctionSpecialization;

/// A taxonomy of block translations, from the return signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// No return value.
    Action,
    /// One scalar or address return value.
    Operation,
    /// One contract-typed return value.
    Initializer,
}

pub fn determine_block_type(returns: &[VarDecl]) -> Result<BlockType> {
    match returns {
        [] => Ok(BlockType::Action),
        [only] => {
            if matches!(only.ty, SolType::Contract(_)) {
                Ok(BlockType::Initializer)
            } else {
                Ok(BlockType::Operation)
            }
        }
        _ => Err(TranslateError::Unsupported("multivalue returns".into())),
    }
}

/// The payable pre-amble: credit the balance when the frame was paid.
pub fn value_handler_stmt() -> CStmt {
    CStmt::If {
        cond: CExpr::id("paid").unwrap_v().binary("==", CExpr::IntLit(1)),
        then_stmt: Box::new(CStmt::Expr(
            CExpr::ptr_id("self")
                .member("model_balance")
                .unwrap_v()
                .binary("+=", CExpr::id("value").unwrap_v()),
        )),
        else_stmt: None,
    }
}

enum Variant<'x> {
    Function {
        func: &'x Function,
    },
    Constructor {
        func: &'x Function,
    },
    Modifier {
        def: &'x Modifier,
        invocation: &'x ModifierInvocation,
        wrapped: &'x Function,
        next_call: String,
    },
}

pub struct BlockLowering<'a, 'u, 'x> {
    stack: &'a AnalysisStack<'u>,
    spec: &'a FunctionSpecialization,
    variant: Variant<'x>,
    manage_pay: bool,
    block_type: BlockType,
    decls: VariableScopeResolver,
}

impl<'a, 'u, 'x> BlockLowering<'a, 'u, 'x> {
    pub fn function(
        stack: &'a AnalysisStack<'u>,
        spec: &'a FunctionSpecialization,
        func: &'x Function,
        manage_pay: bool,
    ) -> Result<Self> {
        Ok(BlockLowering {
            stack,
            spec,
            variant: Variant::Function { func },
            manage_pay,
            block_type: determine_block_type(&func.returns)?,
            decls: VariableScopeResolver::new(),
        })
    }

    pub fn constructor(
        stack: &'a AnalysisStack<'u>,
        spec: &'a FunctionSpecialization,
        func: &'x Function,
    ) -> Result<Self> {
        Ok(BlockLowering {
            stack,
            spec,
            variant: Variant::Constructor { func },
            manage_pay: false,
            block_type: BlockType::Action,
            decls: VariableScopeResolver::new(),
        })
    }

    pub fn modifier(
        stack: &'a AnalysisStack<'u>,
        spec: &'a FunctionSpecialization,
        def: &'x Modifier,
        invocation: &'x ModifierInvocation,
        wrapped: &'x Function,
        next_call: String,
    ) -> Result<Self> {
        Ok(BlockLowering {
            stack,
            spec,
            variant: Variant::Modifier {
                def,
                invocation,
                wrapped,
                next_call,
            },
            manage_pay: false,
            block_type: determine_block_type(&wrapped.returns)?,
            decls: VariableScopeResolver::new(),
        })
    }

    fn expand(&self, e: &Expr, find_ref: bool) -> Result<CExpr> {
        ExprConverter::new(self.stack, &self.decls, Some(self.spec)).convert(e, find_ref)
    }

    fn expand_as(&self, e: &Expr, expected: &SolType) -> Result<CExpr> {
        ExprConverter::new(self.stack, &self.decls, Some(self.spec)).convert_as(e, expected)
    }

    /// Lowers the whole body, including the variant's entry and exit code.
    pub fn convert(mut self) -> Result<Vec<CStmt>> {
        self.decls.enter();
        let mut stmts = Vec::new();

        let (body, params): (&'x Block, &'x [VarDecl]) = match &self.variant {
            Variant::Function { func } | Variant::Constructor { func } => {
                (&func.body, &func.params)
            }
            Variant::Modifier { def, .. } => (&def.body, &[]),
        };
        for param in params {
            if !param.name.is_empty() {
                self.decls.record(
                    &param.name,
                    false,
                    VarContext::Function,
                    param.loc == DataLoc::Storage,
                );
            }
        }
        self.enter(&mut stmts)?;

        for stmt in &body.stmts {
            if let Some(lowered) = self.lower_stmt(stmt)? {
                stmts.push(lowered);
            }
        }

        self.exit(&mut stmts)?;
        self.decls.exit();
        Ok(stmts)
    }

    fn enter(&mut self, stmts: &mut Vec<CStmt>) -> Result<()> {
        match &self.variant {
            Variant::Function { func } => {
                if self.manage_pay && func.is_payable() {
                    stmts.push(value_handler_stmt());
                }
                for rv in &func.returns {
                    if rv.name.is_empty() {
                        continue;
                    }
                    let resolved =
                        self.decls
                            .record(&rv.name, false, VarContext::Function, false);
                    let ty = self.stack.types.value_type_name(&rv.ty)?;
                    stmts.push(CStmt::VarDecl(CVarDecl::new(ty, resolved.name)));
                }
            }
            Variant::Constructor { .. } => {}
            Variant::Modifier {
                def,
                invocation,
                wrapped,
                ..
            } => {
                // The wrapped function's parameters are visible to the
                // invocation arguments, under shadowed names.
                for param in &wrapped.params {
                    if !param.name.is_empty() {
                        self.decls.record(
                            &param.name,
                            true,
                            VarContext::Function,
                            param.loc == DataLoc::Storage,
                        );
                    }
                }

                if let Some(rv) = wrapped.returns.first() {
                    let ty = self.stack.types.value_type_name(&rv.ty)?;
                    stmts.push(CStmt::VarDecl(CVarDecl::new(
                        ty,
                        rewrite("rv", true, VarContext::Function),
                    )));
                }

                // Arguments are evaluated against the shadow names, then
                // the modifier's own parameters open a fresh scope.
                let mut inits = Vec::new();
                for (param, arg) in def.params.iter().zip(&invocation.args) {
                    inits.push(self.expand_as(arg, &param.ty)?);
                }
                self.decls.enter();
                for (param, init) in def.params.iter().zip(inits) {
                    let resolved =
                        self.decls
                            .record(&param.name, false, VarContext::Function, false);
                    let ty = self.stack.types.value_type_name(&param.ty)?;
                    stmts.push(CStmt::VarDecl(
                        CVarDecl::new(ty, resolved.name).with_init(init),
                    ));
                }
            }
        }
        Ok(())
    }

    fn exit(&mut self, stmts: &mut Vec<CStmt>) -> Result<()> {
        if matches!(stmts.last(), Some(CStmt::Return(_))) {
            return Ok(());
        }
        match &self.variant {
            Variant::Function { func } => {
                if let Some(rv) = func.returns.first() {
                    if !rv.name.is_empty() {
                        let name = rewrite(&rv.name, false, VarContext::Function);
                        stmts.push(CStmt::Return(Some(CExpr::id(name))));
                    }
                }
            }
            Variant::Constructor { .. } => {}
            Variant::Modifier { wrapped, .. } => {
                if wrapped.returns.first().is_some() {
                    stmts.push(CStmt::Return(Some(CExpr::id(rewrite(
                        "rv",
                        true,
                        VarContext::Function,
                    )))));
                }
            }
        }
        Ok(())
    }

    fn lower_branch(&mut self, stmt: &Stmt) -> Result<CStmt> {
        Ok(self.lower_stmt(stmt)?.unwrap_or(CStmt::Block(vec![])))
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<Option<CStmt>> {
        let lowered = match stmt {
            Stmt::Block(b) => {
                self.decls.enter();
                let mut inner = Vec::new();
                for s in &b.stmts {
                    if let Some(l) = self.lower_stmt(s)? {
                        inner.push(l);
                    }
                }
                self.decls.exit();
                Some(CStmt::Block(inner))
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expand(cond, false)?;
                let then_stmt = Box::new(self.lower_branch(then_branch)?);
                let else_stmt = match else_branch {
                    Some(e) => Some(Box::new(self.lower_branch(e)?)),
                    None => None,
                };
                Some(CStmt::If {
                    cond,
                    then_stmt,
                    else_stmt,
                })
            }
            Stmt::While { cond, body } => {
                let cond = self.expand(cond, false)?;
                let body = Box::new(self.lower_branch(body)?);
                Some(CStmt::While { cond, body })
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.decls.enter();
                let init = match init {
                    Some(s) => self.lower_stmt(s)?.map(Box::new),
                    None => None,
                };
                let cond = match cond {
                    Some(c) => Some(self.expand(c, false)?),
                    None => None,
                };
                let update = match update {
                    Some(u) => Some(self.expand(u, false)?),
                    None => None,
                };
                let body = Box::new(self.lower_branch(body)?);
                self.decls.exit();
                Some(CStmt::For {
                    init,
                    cond,
                    update,
                    body,
                })
            }
            Stmt::Declare(decl) => Some(self.lower_declaration(decl)?),
            Stmt::Expression(e) => Some(CStmt::Expr(self.expand(e, false)?)),
            Stmt::Return(value) => Some(self.lower_return(value.as_ref())?),
            Stmt::Break => Some(CStmt::Break),
            Stmt::Continue => Some(CStmt::Continue),
            Stmt::Emit(_) => None,
            Stmt::Placeholder => Some(self.lower_placeholder()?),
            Stmt::Throw => return Err(TranslateError::Unsupported("throw".into())),
            Stmt::InlineAssembly => {
                return Err(TranslateError::Unsupported("inline assembly".into()))
            }
        };
        Ok(lowered)
    }

    fn lower_declaration(&mut self, decl: &VarDecl) -> Result<CStmt> {
        let pointer = decl.loc == DataLoc::Storage;
        let resolved = self
            .decls
            .record(&decl.name, false, VarContext::Function, pointer);
        let ty = self.stack.types.value_type_name(&decl.ty)?;
        let mut lowered = if pointer {
            CVarDecl::pointer(ty, resolved.name)
        } else {
            CVarDecl::new(ty, resolved.name)
        };
        if let Some(init) = &decl.init {
            let init = if pointer {
                self.expand(init, true)?
            } else {
                self.expand_as(init, &decl.ty)?
            };
            lowered = lowered.with_init(init);
        }
        Ok(CStmt::VarDecl(lowered))
    }

    fn lower_return(&mut self, value: Option<&Expr>) -> Result<CStmt> {
        match &self.variant {
            Variant::Modifier { wrapped, .. } => {
                // `return` before the placeholder must keep the wrapped
                // body from running; the synthesized holder carries the
                // value produced so far.
                if wrapped.returns.first().is_some() {
                    Ok(CStmt::Return(Some(CExpr::id(rewrite(
                        "rv",
                        true,
                        VarContext::Function,
                    )))))
                } else {
                    Ok(CStmt::Return(None))
                }
            }
            Variant::Function { func } => match value {
                Some(e) => {
                    let rv = func.returns.first().ok_or_else(|| {
                        TranslateError::Unsupported("return with a value from a void function".into())
                    })?;
                    // Initializer blocks return the record itself; only
                    // scalar operations wrap their result.
                    let returned = match self.block_type {
                        BlockType::Initializer => self.expand(e, false)?,
                        _ => self.expand_as(e, &rv.ty)?,
                    };
                    Ok(CStmt::Return(Some(returned)))
                }
                None => match func.returns.first() {
                    Some(rv) if !rv.name.is_empty() => Ok(CStmt::Return(Some(CExpr::id(
                        rewrite(&rv.name, false, VarContext::Function),
                    )))),
                    _ => Ok(CStmt::Return(None)),
                },
            },
            Variant::Constructor { .. } => Ok(CStmt::Return(None)),
        }
    }

    fn lower_placeholder(&mut self) -> Result<CStmt> {
        let Variant::Modifier {
            wrapped, next_call, ..
        } = &self.variant
        else {
            return Err(TranslateError::Unsupported(
                "placeholder outside a modifier".into(),
            ));
        };

        let mut args = vec![CExpr::ptr_id("self")];
        if !wrapped.is_pure() {
            args.extend(next_call_state(false));
        }
        for (i, param) in wrapped.params.iter().enumerate() {
            let source = if param.name.is_empty() {
                format!("unused{i}")
            } else {
                param.name.clone()
            };
            args.push(CExpr::id(rewrite(&source, true, VarContext::Function)));
        }
        let call = CExpr::call(next_call.clone(), args);

        if wrapped.returns.first().is_some() {
            let holder = CExpr::id(rewrite("rv", true, VarContext::Function));
            Ok(CStmt::Expr(holder.assign(call)))
        } else {
            Ok(CStmt::Expr(call))
        }
    }
}
