use std::fmt;

use crate::expr::CExpr;

/// A typed C variable declaration, usable as a statement, a function
/// parameter, or a struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CVarDecl {
    pub ty: String,
    pub name: String,
    pub pointer: bool,
    pub init: Option<CExpr>,
}

impl CVarDecl {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            pointer: false,
            init: None,
        }
    }

    pub fn pointer(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pointer: true,
            ..Self::new(ty, name)
        }
    }

    pub fn with_init(mut self, init: CExpr) -> Self {
        self.init = Some(init);
        self
    }

    /// An identifier expression naming this declaration.
    pub fn as_id(&self) -> CExpr {
        if self.pointer {
            CExpr::ptr_id(self.name.clone())
        } else {
            CExpr::id(self.name.clone())
        }
    }

    /// Renders without the trailing semicolon, for parameter lists.
    pub fn as_param(&self) -> String {
        if self.pointer {
            format!("{}*{}", self.ty, self.name)
        } else {
            format!("{} {}", self.ty, self.name)
        }
    }
}

impl fmt::Display for CVarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_param())?;
        if let Some(init) = &self.init {
            write!(f, "={init}")?;
        }
        write!(f, ";")
    }
}

/// An emitted C statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CStmt {
    Expr(CExpr),
    Block(Vec<CStmt>),
    If {
        cond: CExpr,
        then_stmt: Box<CStmt>,
        else_stmt: Option<Box<CStmt>>,
    },
    While {
        cond: CExpr,
        body: Box<CStmt>,
    },
    For {
        init: Option<Box<CStmt>>,
        cond: Option<CExpr>,
        update: Option<CExpr>,
        body: Box<CStmt>,
    },
    Return(Option<CExpr>),
    Break,
    Continue,
    VarDecl(CVarDecl),
    Switch {
        cond: CExpr,
        cases: Vec<Vec<CStmt>>,
        default: Vec<CStmt>,
    },
}

impl CStmt {
    pub fn block(stmts: Vec<CStmt>) -> Self {
        CStmt::Block(stmts)
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, stmts: &[CStmt]) -> fmt::Result {
    write!(f, "{{")?;
    for s in stmts {
        write!(f, "{s}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for CStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CStmt::Expr(e) => write!(f, "{e};"),
            CStmt::Block(stmts) => write_block(f, stmts),
            CStmt::If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                write!(f, "if({cond}){then_stmt}")?;
                if let Some(e) = else_stmt {
                    // `else if` chains keep the nested if unbraced.
                    write!(f, "else {e}")?;
                }
                Ok(())
            }
            CStmt::While { cond, body } => write!(f, "while({cond}){body}"),
            CStmt::For {
                init,
                cond,
                update,
                body,
            } => {
                write!(f, "for(")?;
                match init {
                    Some(s) => write!(f, "{s}")?,
                    None => write!(f, ";")?,
                }
                if let Some(c) = cond {
                    write!(f, "{c}")?;
                }
                write!(f, ";")?;
                if let Some(u) = update {
                    write!(f, "{u}")?;
                }
                write!(f, "){body}")
            }
            CStmt::Return(None) => write!(f, "return;"),
            CStmt::Return(Some(e)) => write!(f, "return {e};"),
            CStmt::Break => write!(f, "break;"),
            CStmt::Continue => write!(f, "continue;"),
            CStmt::VarDecl(decl) => write!(f, "{decl}"),
            CStmt::Switch {
                cond,
                cases,
                default,
            } => {
                write!(f, "switch({cond}){{")?;
                for (i, body) in cases.iter().enumerate() {
                    write!(f, "case {i}:")?;
                    write_block(f, body)?;
                }
                write!(f, "default:")?;
                write_block(f, default)?;
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_decl_forms() {
        let plain = CVarDecl::new("sol_int256_t", "func_user_a");
        assert_eq!(plain.to_string(), "sol_int256_t func_user_a;");

        let init = CVarDecl::new("sol_int256_t", "func_user_i")
            .with_init(CExpr::call("Init_sol_int256_t", vec![CExpr::IntLit(0)]));
        assert_eq!(
            init.to_string(),
            "sol_int256_t func_user_i=Init_sol_int256_t(0);"
        );

        let ptr = CVarDecl::pointer("struct A_StructB", "func_user_b__ref")
            .with_init(CExpr::id("self->user_b").reference());
        assert_eq!(
            ptr.to_string(),
            "struct A_StructB*func_user_b__ref=&(self->user_b);"
        );
    }

    #[test]
    fn if_with_unbraced_then() {
        let stmt = CStmt::If {
            cond: CExpr::id("paid").unwrap_v().binary("==", CExpr::IntLit(1)),
            then_stmt: Box::new(CStmt::Expr(
                CExpr::ptr_id("self")
                    .member("model_balance")
                    .unwrap_v()
                    .binary("+=", CExpr::id("value").unwrap_v()),
            )),
            else_stmt: None,
        };
        assert_eq!(
            stmt.to_string(),
            "if(((paid).v)==(1))(((self)->model_balance).v)+=((value).v);"
        );
    }

    #[test]
    fn else_and_else_if_spacing() {
        let plain = CStmt::If {
            cond: CExpr::IntLit(1),
            then_stmt: Box::new(CStmt::Block(vec![])),
            else_stmt: Some(Box::new(CStmt::Block(vec![]))),
        };
        assert_eq!(plain.to_string(), "if(1){}else {}");

        let chained = CStmt::If {
            cond: CExpr::IntLit(1),
            then_stmt: Box::new(CStmt::Block(vec![])),
            else_stmt: Some(Box::new(CStmt::If {
                cond: CExpr::IntLit(0),
                then_stmt: Box::new(CStmt::Block(vec![])),
                else_stmt: None,
            })),
        };
        assert_eq!(chained.to_string(), "if(1){}else if(0){}");
    }

    #[test]
    fn loops() {
        let w = CStmt::While {
            cond: CExpr::IntLit(0),
            body: Box::new(CStmt::Block(vec![CStmt::Break])),
        };
        assert_eq!(w.to_string(), "while(0){break;}");

        let f = CStmt::For {
            init: Some(Box::new(CStmt::VarDecl(
                CVarDecl::new("sol_int256_t", "func_user_i")
                    .with_init(CExpr::call("Init_sol_int256_t", vec![CExpr::IntLit(0)])),
            ))),
            cond: Some(
                CExpr::id("func_user_i")
                    .unwrap_v()
                    .binary("<", CExpr::IntLit(10)),
            ),
            update: None,
            body: Box::new(CStmt::Block(vec![])),
        };
        assert_eq!(
            f.to_string(),
            "for(sol_int256_t func_user_i=Init_sol_int256_t(0);((func_user_i).v)<(10);){}"
        );

        let bare = CStmt::For {
            init: None,
            cond: None,
            update: Some(CExpr::Unary {
                op: "++",
                prefix: true,
                expr: Box::new(CExpr::id("func_user_i").unwrap_v()),
            }),
            body: Box::new(CStmt::Block(vec![])),
        };
        assert_eq!(bare.to_string(), "for(;;++((func_user_i).v)){}");
    }

    #[test]
    fn switch_rendering() {
        let s = CStmt::Switch {
            cond: CExpr::id("next_call"),
            cases: vec![vec![CStmt::Break], vec![CStmt::Break]],
            default: vec![CStmt::Expr(CExpr::call(
                "sol_require",
                vec![CExpr::IntLit(0), CExpr::IntLit(0)],
            ))],
        };
        assert_eq!(
            s.to_string(),
            "switch(next_call){case 0:{break;}case 1:{break;}default:{sol_require(0,0);}}"
        );
    }

    #[test]
    fn returns() {
        assert_eq!(CStmt::Return(None).to_string(), "return;");
        assert_eq!(
            CStmt::Return(Some(CExpr::id("func_user_a"))).to_string(),
            "return func_user_a;"
        );
    }
}
