//! Depth-first traversal helpers shared by the analyses.
//!
//! Traversal order is pre-order, left-to-right over child edges, which is
//! also the operation ordering contract of the translation pipeline.

use crate::ast::*;

/// Visits every statement in a block, pre-order.
pub fn for_each_stmt<'a>(block: &'a Block, f: &mut impl FnMut(&'a Stmt)) {
    for stmt in &block.stmts {
        visit_stmt(stmt, f);
    }
}

fn visit_stmt<'a>(stmt: &'a Stmt, f: &mut impl FnMut(&'a Stmt)) {
    f(stmt);
    match stmt {
        Stmt::Block(b) => for_each_stmt(b, f),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            visit_stmt(then_branch, f);
            if let Some(e) = else_branch {
                visit_stmt(e, f);
            }
        }
        Stmt::While { body, .. } => visit_stmt(body, f),
        Stmt::For { init, body, .. } => {
            if let Some(i) = init {
                visit_stmt(i, f);
            }
            visit_stmt(body, f);
        }
        _ => {}
    }
}

/// Visits every expression in a block, pre-order, including initializers
/// and loop heads.
pub fn for_each_expr<'a>(block: &'a Block, f: &mut impl FnMut(&'a Expr)) {
    for_each_stmt(block, &mut |stmt| match stmt {
        Stmt::If { cond, .. } | Stmt::While { cond, .. } => for_each_subexpr(cond, f),
        Stmt::For { cond, update, .. } => {
            if let Some(c) = cond {
                for_each_subexpr(c, f);
            }
            if let Some(u) = update {
                for_each_subexpr(u, f);
            }
        }
        Stmt::Declare(decl) => {
            if let Some(init) = &decl.init {
                for_each_subexpr(init, f);
            }
        }
        Stmt::Expression(e) | Stmt::Emit(e) => for_each_subexpr(e, f),
        Stmt::Return(Some(e)) => for_each_subexpr(e, f),
        _ => {}
    });
}

/// Visits an expression and all of its sub-expressions, pre-order.
pub fn for_each_subexpr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::MemberAccess { base, .. } => for_each_subexpr(base, f),
        ExprKind::IndexAccess { base, index } => {
            for_each_subexpr(base, f);
            for_each_subexpr(index, f);
        }
        ExprKind::Call { callee, args, .. } => {
            for_each_subexpr(callee, f);
            for arg in args {
                for_each_subexpr(arg, f);
            }
        }
        ExprKind::Assign { lhs, rhs, .. } => {
            for_each_subexpr(lhs, f);
            for_each_subexpr(rhs, f);
        }
        ExprKind::Unary { expr: e, .. } | ExprKind::Delete(e) => for_each_subexpr(e, f),
        ExprKind::Binary { lhs, rhs, .. } => {
            for_each_subexpr(lhs, f);
            for_each_subexpr(rhs, f);
        }
        ExprKind::Conditional {
            cond,
            if_true,
            if_false,
        } => {
            for_each_subexpr(cond, f);
            for_each_subexpr(if_true, f);
            for_each_subexpr(if_false, f);
        }
        ExprKind::Tuple { components, .. } => {
            for c in components {
                for_each_subexpr(c, f);
            }
        }
        _ => {}
    }
}
