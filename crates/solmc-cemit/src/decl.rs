use std::fmt;

use crate::stmt::{CStmt, CVarDecl};

/// A C struct definition. `Display` renders the full definition; use
/// [`CStructDef::forward`] for the forward declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CStructDef {
    pub name: String,
    pub fields: Vec<CVarDecl>,
}

impl CStructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: CVarDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn forward(&self) -> String {
        format!("struct {};", self.name)
    }
}

impl fmt::Display for CStructDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct {}{{", self.name)?;
        for field in &self.fields {
            write!(f, "{field}")?;
        }
        write!(f, "}};")
    }
}

/// A C function. `Display` renders the definition when a body is present
/// and the forward declaration otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CFuncDef {
    pub ret_ty: String,
    pub ret_pointer: bool,
    pub name: String,
    pub params: Vec<CVarDecl>,
    pub body: Option<Vec<CStmt>>,
}

impl CFuncDef {
    pub fn new(ret_ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ret_ty: ret_ty.into(),
            ret_pointer: false,
            name: name.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn returning_pointer(mut self) -> Self {
        self.ret_pointer = true;
        self
    }

    pub fn param(mut self, p: CVarDecl) -> Self {
        self.params.push(p);
        self
    }

    pub fn params(mut self, ps: impl IntoIterator<Item = CVarDecl>) -> Self {
        self.params.extend(ps);
        self
    }

    pub fn body(mut self, stmts: Vec<CStmt>) -> Self {
        self.body = Some(stmts);
        self
    }

    /// The forward declaration, regardless of whether a body is attached.
    pub fn forward(&self) -> String {
        format!("{};", self.signature())
    }

    fn signature(&self) -> String {
        let mut s = String::new();
        s.push_str(&self.ret_ty);
        if self.ret_pointer {
            s.push('*');
        } else {
            s.push(' ');
        }
        s.push_str(&self.name);
        s.push('(');
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                s.push(',');
            }
            s.push_str(&p.as_param());
        }
        s.push(')');
        s
    }
}

impl fmt::Display for CFuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            None => write!(f, "{}", self.forward()),
            Some(stmts) => {
                write!(f, "{}{{", self.signature())?;
                for s in stmts {
                    write!(f, "{s}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
