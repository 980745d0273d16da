use std::fmt;

/// An emitted C expression.
///
/// Sub-expressions are parenthesized at every operator boundary, so
/// operator precedence never has to be consulted: `a + b * c` arrives
/// here already shaped, and renders as `(a)+((b)*(c))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CExpr {
    /// A bare identifier. `pointer` records whether the named value is a
    /// pointer, which decides `.` versus `->` on member access.
    Id { name: String, pointer: bool },
    IntLit(i128),
    /// A C string literal; used for log lines and non-determinism tags.
    StrLit(String),
    Member {
        base: Box<CExpr>,
        field: String,
    },
    Binary {
        lhs: Box<CExpr>,
        op: &'static str,
        rhs: Box<CExpr>,
    },
    Unary {
        op: &'static str,
        prefix: bool,
        expr: Box<CExpr>,
    },
    Cond {
        cond: Box<CExpr>,
        if_true: Box<CExpr>,
        if_false: Box<CExpr>,
    },
    Cast {
        ty: String,
        expr: Box<CExpr>,
    },
    Call {
        name: String,
        args: Vec<CExpr>,
        /// True when the callee returns a pointer (`Ref_…` helpers).
        returns_pointer: bool,
    },
    Ref(Box<CExpr>),
    Deref(Box<CExpr>),
}

impl CExpr {
    pub fn id(name: impl Into<String>) -> Self {
        CExpr::Id {
            name: name.into(),
            pointer: false,
        }
    }

    pub fn ptr_id(name: impl Into<String>) -> Self {
        CExpr::Id {
            name: name.into(),
            pointer: true,
        }
    }

    pub fn member(self, field: impl Into<String>) -> Self {
        CExpr::Member {
            base: Box::new(self),
            field: field.into(),
        }
    }

    /// Unwraps a wrapped scalar: appends the `.v` access.
    pub fn unwrap_v(self) -> Self {
        self.member("v")
    }

    pub fn binary(self, op: &'static str, rhs: CExpr) -> Self {
        CExpr::Binary {
            lhs: Box::new(self),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(self, rhs: CExpr) -> Self {
        self.binary("=", rhs)
    }

    pub fn call(name: impl Into<String>, args: Vec<CExpr>) -> Self {
        CExpr::Call {
            name: name.into(),
            args,
            returns_pointer: false,
        }
    }

    pub fn ptr_call(name: impl Into<String>, args: Vec<CExpr>) -> Self {
        CExpr::Call {
            name: name.into(),
            args,
            returns_pointer: true,
        }
    }

    pub fn reference(self) -> Self {
        CExpr::Ref(Box::new(self))
    }

    pub fn deref(self) -> Self {
        CExpr::Deref(Box::new(self))
    }

    /// Whether this expression denotes a pointer value, so that member
    /// access must render as `->`.
    pub fn is_pointer(&self) -> bool {
        match self {
            CExpr::Id { pointer, .. } => *pointer,
            CExpr::Ref(_) => true,
            CExpr::Call {
                returns_pointer, ..
            } => *returns_pointer,
            _ => false,
        }
    }
}

impl fmt::Display for CExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CExpr::Id { name, .. } => write!(f, "{name}"),
            CExpr::IntLit(v) => write!(f, "{v}"),
            CExpr::StrLit(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            CExpr::Member { base, field } => {
                let sep = if base.is_pointer() { "->" } else { "." };
                write!(f, "({base}){sep}{field}")
            }
            CExpr::Binary { lhs, op, rhs } => write!(f, "({lhs}){op}({rhs})"),
            CExpr::Unary {
                op,
                prefix: true,
                expr,
            } => write!(f, "{op}({expr})"),
            CExpr::Unary {
                op,
                prefix: false,
                expr,
            } => write!(f, "({expr}){op}"),
            CExpr::Cond {
                cond,
                if_true,
                if_false,
            } => write!(f, "({cond})?({if_true}):({if_false})"),
            CExpr::Cast { ty, expr } => write!(f, "(({ty})({expr}))"),
            CExpr::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            CExpr::Ref(e) => write!(f, "&({e})"),
            CExpr::Deref(e) => write!(f, "*({e})"),
        }
    }
}
