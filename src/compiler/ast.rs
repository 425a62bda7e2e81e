use std::rc::Rc;

/// A whole G source file: module-scoped statements in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A `{ … }` statement list. Blocks open a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Each statement-level construct has its own variant.
/// Every consumer (analyzer, generator, walker) matches on this
/// exhaustively, so adding a variant without handling it everywhere
/// is a compile-time error.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Import(String),
    Module(String),
    /// Functions are reference-counted so the tree-walker can hold
    /// onto bodies as first-class values without cloning them.
    Function(Rc<Function>),
    Declaration(Declaration),
    If {
        condition: Expr,
        then:      Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body:      Block,
    },
    /// `for NAME in range(…) { … }`
    ForIn {
        var:      String,
        iterable: Expr,
        body:     Block,
    },
    /// The classic three-clause form, `for (init; cond; step) { … }`.
    For {
        init:      Option<Box<Stmt>>,
        condition: Option<Expr>,
        step:      Option<Expr>,
        body:      Block,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Expression(Expr),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name:   String,
    pub params: Vec<Param>,
    pub ret:    Option<TypeExpr>,
    pub body:   Block,
}

/// A parameter. The annotation is optional in the grammar; leaving it
/// off gives the parameter the `none` type, which no argument is
/// compatible with, and the analyzer will say so.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty:   Option<TypeExpr>,
}

/// A type annotation as written: either a plain name or an array of a
/// named element type with a size expression. Whether the name means
/// anything is the analyzer's business.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Scalar(String),
    Array { element: String, size: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub keyword: DeclKind,
    pub name:    String,
    pub ty:      Option<TypeExpr>,
    pub init:    Option<Expr>,
}

/// The declaration keyword decides mutability:
/// `var`/`let` bindings may be reassigned, `val`/`const` may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Val,
    Let,
    Const,
}

impl DeclKind {
    pub fn is_mutable(&self) -> bool {
        matches!(self, DeclKind::Var | DeclKind::Let)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Assign => "=",
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::Less => "<",
            BinOp::LessEqual => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Pos,
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        left:  Box<Expr>,
        op:    BinOp,
        right: Box<Expr>,
    },
    Unary {
        op:      UnOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args:   Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: String,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Grouped(Box<Expr>),
    Ident(String),
    Number(f64),
    /// Contents with escapes already decoded.
    Str(String),
    Bool(bool),
    /// A format string: the displayed text (escapes decoded,
    /// placeholders still in place) plus the parsed placeholder
    /// expressions, ordered by their byte offset in `raw`.
    Format {
        raw:          String,
        placeholders: Vec<(usize, Expr)>,
    },
    /// `range(…)` keeps its raw argument list; arity is checked later.
    Range(Vec<Expr>),
}

impl Expr {
    /// Shortcut for creating an `Expr::Binary` variant.
    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::Binary { left: Box::new(left), op, right: Box::new(right) }
    }

    /// Shortcut for creating an `Expr::Unary` variant.
    pub fn unary(op: UnOp, operand: Expr) -> Expr {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call { callee: Box::new(callee), args }
    }

    pub fn member(object: Expr, member: &str) -> Expr {
        Expr::Member { object: Box::new(object), member: member.to_string() }
    }

    pub fn index(array: Expr, index: Expr) -> Expr {
        Expr::Index { array: Box::new(array), index: Box::new(index) }
    }

    pub fn grouped(inner: Expr) -> Expr {
        Expr::Grouped(Box::new(inner))
    }

    /// Whether this expression may appear on the left of `=`.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Ident(_) | Expr::Index { .. } | Expr::Member { .. })
    }
}
