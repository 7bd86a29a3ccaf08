//! Typed AST produced by the parser (spec §3.2).
//!
//! Every node carries its originating token for diagnostics, per the
//! spec's invariant. `Expr`/`Stmt` are plain enums rather than trait
//! objects — the compiler matches on them exhaustively and there is no
//! need for dynamic dispatch in a single-pass lowering.

use crate::token::Token;

/// A parsed type annotation. Purely advisory at compile time (emitted
/// as an `AssertType` constant, see spec §4.3); the VM never fails on
/// one (Open Question #2, resolved in DESIGN.md: advisory).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Bool,
    Array,
    Hash,
    /// A bare identifier used as a type name (e.g. a struct type).
    Named(String),
}

impl std::fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeAnnotation::Byte => "byte",
            TypeAnnotation::Short => "short",
            TypeAnnotation::Int => "int",
            TypeAnnotation::Long => "long",
            TypeAnnotation::Float => "float",
            TypeAnnotation::Double => "double",
            TypeAnnotation::Char => "char",
            TypeAnnotation::String => "string",
            TypeAnnotation::Bool => "bool",
            TypeAnnotation::Array => "array",
            TypeAnnotation::Hash => "hash",
            TypeAnnotation::Named(name) => name,
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer {
        token: Token,
        value: i64,
    },
    StringLit {
        token: Token,
        value: String,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Null {
        token: Token,
    },
    Ident(Identifier),
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expr>,
    },
    Infix {
        token: Token,
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },
    If {
        token: Token,
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    FunctionLiteral {
        token: Token,
        /// Present when this literal is the RHS of `ধরি name = ফাংশন...`,
        /// so the body can reference itself (spec §4.3 `define_function_name`).
        name: Option<String>,
        params: Vec<Param>,
        return_type: Option<TypeAnnotation>,
        body: Block,
    },
    Call {
        token: Token,
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    ArrayLit {
        token: Token,
        elements: Vec<Expr>,
    },
    HashLit {
        token: Token,
        pairs: Vec<(Expr, Expr)>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    StructLit {
        token: Token,
        type_name: String,
        fields: Vec<(String, Expr)>,
    },
    Member {
        token: Token,
        object: Box<Expr>,
        name: String,
    },
    EnumDef {
        token: Token,
        name: String,
        /// Ordered (variant name, optional explicit value) pairs.
        variants: Vec<(String, Option<i64>)>,
    },
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Integer { token, .. }
            | Expr::StringLit { token, .. }
            | Expr::Boolean { token, .. }
            | Expr::Null { token }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::If { token, .. }
            | Expr::FunctionLiteral { token, .. }
            | Expr::Call { token, .. }
            | Expr::ArrayLit { token, .. }
            | Expr::HashLit { token, .. }
            | Expr::Index { token, .. }
            | Expr::StructLit { token, .. }
            | Expr::Member { token, .. }
            | Expr::EnumDef { token, .. } => token,
            Expr::Ident(ident) => &ident.token,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        token: Token,
        name: String,
        type_annotation: Option<TypeAnnotation>,
        value: Expr,
    },
    Assign {
        token: Token,
        name: String,
        value: Expr,
    },
    Return {
        token: Token,
        value: Expr,
    },
    ExprStmt {
        token: Token,
        expr: Expr,
    },
    Block {
        token: Token,
        statements: Block,
    },
    While {
        token: Token,
        condition: Expr,
        body: Block,
    },
    For {
        token: Token,
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Box<Stmt>>,
        body: Block,
    },
    Break {
        token: Token,
    },
    Continue {
        token: Token,
    },
    /// The path expression must be a string literal; the compiler
    /// rejects anything else (spec §3.2, §4.3).
    Import {
        token: Token,
        path: Expr,
    },
    MemberAssign {
        token: Token,
        object: Expr,
        member: String,
        value: Expr,
    },
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Let { token, .. }
            | Stmt::Assign { token, .. }
            | Stmt::Return { token, .. }
            | Stmt::ExprStmt { token, .. }
            | Stmt::Block { token, .. }
            | Stmt::While { token, .. }
            | Stmt::For { token, .. }
            | Stmt::Break { token }
            | Stmt::Continue { token }
            | Stmt::Import { token, .. }
            | Stmt::MemberAssign { token, .. } => token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
