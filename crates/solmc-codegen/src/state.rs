//! Generates the harness's global call-state: declaration, per-transaction
//! advancement, and the payment step for payable dispatch cases.

use solmc_analysis::callstate::{CallStateField, CALL_STATE};
use solmc_analysis::AnalysisStack;
use solmc_cemit::{CExpr, CStmt, CVarDecl};

pub struct StateGenerator<'a, 'u> {
    stack: &'a AnalysisStack<'u>,
    lockstep: bool,
}

impl<'a, 'u> StateGenerator<'a, 'u> {
    pub fn new(stack: &'a AnalysisStack<'u>, lockstep: bool) -> Self {
        StateGenerator { stack, lockstep }
    }

    fn nd_raw(&self, field: CallStateField) -> CExpr {
        CExpr::call(
            "nd_uint256_t",
            vec![CExpr::StrLit(field.name().to_string())],
        )
    }

    /// Declares the call-state locals. Under lockstep the clocks start at
    /// an arbitrary point; otherwise they count from zero.
    pub fn declare(&self, stmts: &mut Vec<CStmt>) {
        if self.lockstep {
            stmts.push(CStmt::VarDecl(CVarDecl::new("uint8_t", "take_step")));
        }
        for field in CALL_STATE {
            stmts.push(CStmt::VarDecl(CVarDecl::new(field.type_name(), field.name())));
            let target = CExpr::id(field.name()).unwrap_v();
            match field {
                CallStateField::Blocknum | CallStateField::Timestamp => {
                    let init = if self.lockstep {
                        self.nd_raw(field)
                    } else {
                        CExpr::IntLit(0)
                    };
                    stmts.push(CStmt::Expr(target.assign(init)));
                }
                CallStateField::Paid => {
                    stmts.push(CStmt::Expr(target.assign(CExpr::IntLit(1))));
                }
                _ => {}
            }
        }
    }

    /// Advances the state at the top of each transaction: clocks are
    /// monotone, the value resets, and the sender is drawn from the
    /// client range. `origin` and `paid` are left as they are.
    pub fn update_global(&self, stmts: &mut Vec<CStmt>) {
        if self.lockstep {
            stmts.push(CStmt::Expr(CExpr::id("take_step").assign(CExpr::call(
                "nd_range",
                vec![
                    CExpr::IntLit(0),
                    CExpr::IntLit(2),
                    CExpr::StrLit("take_step".to_string()),
                ],
            ))));
        }
        for field in CALL_STATE {
            let target = CExpr::id(field.name()).unwrap_v();
            match field {
                CallStateField::Blocknum | CallStateField::Timestamp => {
                    let increment = if self.lockstep {
                        CExpr::IntLit(1)
                    } else {
                        self.nd_raw(field)
                    };
                    let step = CStmt::Expr(
                        target
                            .clone()
                            .assign(CExpr::id(field.name()).unwrap_v().binary("+", increment)),
                    );
                    if self.lockstep {
                        stmts.push(CStmt::If {
                            cond: CExpr::id("take_step"),
                            then_stmt: Box::new(CStmt::Block(vec![step])),
                            else_stmt: None,
                        });
                    } else {
                        stmts.push(step);
                    }
                }
                CallStateField::Value => {
                    stmts.push(CStmt::Expr(target.assign(CExpr::IntLit(0))));
                }
                CallStateField::Sender => {
                    let (lo, hi) = self.stack.addresses.client_range();
                    stmts.push(CStmt::Expr(target.assign(CExpr::call(
                        "nd_range",
                        vec![
                            CExpr::IntLit(lo as i128),
                            CExpr::IntLit(hi as i128),
                            CExpr::StrLit("sender".to_string()),
                        ],
                    ))));
                }
                CallStateField::Paid | CallStateField::Origin => {}
            }
        }
    }

    /// Draws a fresh payment for a payable dispatch case.
    pub fn pay(&self, stmts: &mut Vec<CStmt>) {
        stmts.push(CStmt::Expr(
            CExpr::id("value")
                .unwrap_v()
                .assign(self.nd_raw(CallStateField::Value)),
        ));
    }
}
