//! Syntax tree for NiLang programs.
//!
//! Nodes are immutable after construction. Statement and expression kinds
//! are separate enums; expression-like statements (a bare call, a qualified
//! constant) are wrapped in [`StmtKind::Expr`] rather than duplicated.
//!
//! [`Display`] renders the canonical human-readable form used by tests and
//! the CLI `--ast` dump.

use std::fmt::{self, Display};

use beef::lean::Cow;

use crate::span::{Span, Spanned};

pub type Ident<'src> = Spanned<Cow<'src, str>>;

#[cfg_attr(test, derive(Debug))]
pub struct Program<'src> {
  pub body: Vec<Stmt<'src>>,
}

impl<'src> Program<'src> {
  pub fn new() -> Self {
    Self { body: vec![] }
  }
}

impl<'src> Default for Program<'src> {
  fn default() -> Self {
    Self::new()
  }
}

pub type Stmt<'src> = Spanned<StmtKind<'src>>;

#[cfg_attr(test, derive(Debug))]
pub enum StmtKind<'src> {
  Decl(Box<Decl<'src>>),
  Assign(Box<Assign<'src>>),
  Using(Box<Using<'src>>),
  Scope(Box<ScopeStmt<'src>>),
  While(Box<While<'src>>),
  Alias(Box<Alias<'src>>),
  Func(Box<Func<'src>>),
  If(Box<If<'src>>),
  Ctrl(Box<Ctrl<'src>>),
  Expr(Box<Expr<'src>>),
}

/// A possibly scope-qualified type name, e.g. `Int` or `colors::Color`.
#[cfg_attr(test, derive(Debug))]
pub struct TypeExpr<'src> {
  pub span: Span,
  pub path: Vec<Ident<'src>>,
}

impl<'src> TypeExpr<'src> {
  pub fn new(span: impl Into<Span>, path: Vec<Ident<'src>>) -> Self {
    Self {
      span: span.into(),
      path,
    }
  }
}

/// A typed name, as written in declarations and parameter lists.
#[cfg_attr(test, derive(Debug))]
pub struct Variable<'src> {
  pub ty: TypeExpr<'src>,
  pub name: Ident<'src>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Decl<'src> {
  pub var: Variable<'src>,
  pub value: Expr<'src>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Assign<'src> {
  pub target: Ident<'src>,
  pub value: Expr<'src>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Using<'src> {
  pub path: Vec<Ident<'src>>,
}

#[cfg_attr(test, derive(Debug))]
pub struct ScopeStmt<'src> {
  pub name: Ident<'src>,
  pub body: Vec<Stmt<'src>>,
}

#[cfg_attr(test, derive(Debug))]
pub struct While<'src> {
  pub cond: Expr<'src>,
  pub body: Vec<Stmt<'src>>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Alias<'src> {
  pub name: Ident<'src>,
  pub ty: TypeExpr<'src>,
  pub entries: Vec<AliasEntry<'src>>,
}

#[cfg_attr(test, derive(Debug))]
pub struct AliasEntry<'src> {
  pub name: Ident<'src>,
  pub value: Expr<'src>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Func<'src> {
  pub name: Ident<'src>,
  pub ret: Option<TypeExpr<'src>>,
  pub params: Vec<Variable<'src>>,
  pub body: Vec<Stmt<'src>>,
}

#[cfg_attr(test, derive(Debug))]
pub struct If<'src> {
  pub branches: Vec<Branch<'src>>,
  pub default: Option<Vec<Stmt<'src>>>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Branch<'src> {
  pub cond: Expr<'src>,
  pub body: Vec<Stmt<'src>>,
}

#[cfg_attr(test, derive(Debug))]
pub enum Ctrl<'src> {
  Return(Return<'src>),
  Break,
  Continue,
}

#[cfg_attr(test, derive(Debug))]
pub struct Return<'src> {
  pub value: Option<Expr<'src>>,
}

pub type Expr<'src> = Spanned<ExprKind<'src>>;

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub enum ExprKind<'src> {
  Literal(Box<Literal>),
  Prefix(Box<Prefix<'src>>),
  Binary(Box<Binary<'src>>),
  GetVar(Box<GetVar<'src>>),
  Call(Box<Call<'src>>),
  ScopeAccess(Box<ScopeAccess<'src>>),
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub enum Literal {
  Int(i64),
  Bool(bool),
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub struct Prefix<'src> {
  pub op: PrefixOp,
  pub right: Expr<'src>,
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
  Not,
  Neg,
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub struct Binary<'src> {
  pub op: BinaryOp,
  pub left: Expr<'src>,
  pub right: Expr<'src>,
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Eq,
  Neq,
  Less,
  LessEq,
  More,
  MoreEq,
  And,
  Or,
}

impl BinaryOp {
  pub fn as_str(&self) -> &'static str {
    match self {
      BinaryOp::Eq => "==",
      BinaryOp::Neq => "!=",
      BinaryOp::Less => "<",
      BinaryOp::LessEq => "<=",
      BinaryOp::More => ">",
      BinaryOp::MoreEq => ">=",
      BinaryOp::And => "And",
      BinaryOp::Or => "Or",
    }
  }
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub struct GetVar<'src> {
  pub name: Ident<'src>,
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub struct Call<'src> {
  pub target: Expr<'src>,
  pub args: Vec<Expr<'src>>,
}

#[cfg_attr(test, derive(Debug))]
#[derive(Clone)]
pub struct ScopeAccess<'src> {
  pub scope: Expr<'src>,
  pub member: Ident<'src>,
}

pub fn decl_stmt<'src>(var: Variable<'src>, value: Expr<'src>) -> Stmt<'src> {
  let span = var.ty.span.join(value.span);
  Stmt::new(span, StmtKind::Decl(Box::new(Decl { var, value })))
}

pub fn assign_stmt<'src>(target: Ident<'src>, value: Expr<'src>) -> Stmt<'src> {
  let span = target.span.join(value.span);
  Stmt::new(span, StmtKind::Assign(Box::new(Assign { target, value })))
}

pub fn using_stmt<'src>(s: impl Into<Span>, path: Vec<Ident<'src>>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Using(Box::new(Using { path })))
}

pub fn scope_stmt<'src>(
  s: impl Into<Span>,
  name: Ident<'src>,
  body: Vec<Stmt<'src>>,
) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Scope(Box::new(ScopeStmt { name, body })))
}

pub fn while_stmt<'src>(s: impl Into<Span>, cond: Expr<'src>, body: Vec<Stmt<'src>>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::While(Box::new(While { cond, body })))
}

pub fn alias_stmt<'src>(
  s: impl Into<Span>,
  name: Ident<'src>,
  ty: TypeExpr<'src>,
  entries: Vec<AliasEntry<'src>>,
) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Alias(Box::new(Alias { name, ty, entries })))
}

pub fn func_stmt<'src>(
  s: impl Into<Span>,
  name: Ident<'src>,
  ret: Option<TypeExpr<'src>>,
  params: Vec<Variable<'src>>,
  body: Vec<Stmt<'src>>,
) -> Stmt<'src> {
  Stmt::new(
    s,
    StmtKind::Func(Box::new(Func {
      name,
      ret,
      params,
      body,
    })),
  )
}

pub fn if_stmt<'src>(
  s: impl Into<Span>,
  branches: Vec<Branch<'src>>,
  default: Option<Vec<Stmt<'src>>>,
) -> Stmt<'src> {
  Stmt::new(s, StmtKind::If(Box::new(If { branches, default })))
}

pub fn branch<'src>(cond: Expr<'src>, body: Vec<Stmt<'src>>) -> Branch<'src> {
  Branch { cond, body }
}

pub fn return_stmt(s: impl Into<Span>, value: Option<Expr>) -> Stmt {
  Stmt::new(s, StmtKind::Ctrl(Box::new(Ctrl::Return(Return { value }))))
}

pub fn break_stmt<'src>(s: impl Into<Span>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Ctrl(Box::new(Ctrl::Break)))
}

pub fn continue_stmt<'src>(s: impl Into<Span>) -> Stmt<'src> {
  Stmt::new(s, StmtKind::Ctrl(Box::new(Ctrl::Continue)))
}

pub fn expr_stmt(expr: Expr) -> Stmt {
  Stmt::new(expr.span, StmtKind::Expr(Box::new(expr)))
}

pub fn expr_binary<'src>(
  s: impl Into<Span>,
  op: BinaryOp,
  left: Expr<'src>,
  right: Expr<'src>,
) -> Expr<'src> {
  Expr::new(s, ExprKind::Binary(Box::new(Binary { op, left, right })))
}

pub fn expr_prefix(s: impl Into<Span>, op: PrefixOp, right: Expr) -> Expr {
  Expr::new(s, ExprKind::Prefix(Box::new(Prefix { op, right })))
}

pub fn expr_call<'src>(s: impl Into<Span>, target: Expr<'src>, args: Vec<Expr<'src>>) -> Expr<'src> {
  Expr::new(s, ExprKind::Call(Box::new(Call { target, args })))
}

pub fn expr_scope_access<'src>(
  s: impl Into<Span>,
  scope: Expr<'src>,
  member: Ident<'src>,
) -> Expr<'src> {
  Expr::new(s, ExprKind::ScopeAccess(Box::new(ScopeAccess { scope, member })))
}

pub fn expr_get_var(name: Ident) -> Expr {
  Expr::new(name.span, ExprKind::GetVar(Box::new(GetVar { name })))
}

pub fn expr_int(s: impl Into<Span>, value: i64) -> Expr<'static> {
  Expr::new(s, ExprKind::Literal(Box::new(Literal::Int(value))))
}

pub fn expr_bool(s: impl Into<Span>, value: bool) -> Expr<'static> {
  Expr::new(s, ExprKind::Literal(Box::new(Literal::Bool(value))))
}

impl Display for Program<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, stmt) in self.body.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{stmt}")?;
    }
    Ok(())
  }
}

fn write_block(f: &mut fmt::Formatter<'_>, body: &[Stmt<'_>]) -> fmt::Result {
  writeln!(f, " {{")?;
  for stmt in body {
    writeln!(f, "{stmt}")?;
  }
  write!(f, "}}")
}

impl Display for StmtKind<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StmtKind::Decl(v) => write!(f, "{} = {}", v.var, v.value),
      StmtKind::Assign(v) => write!(f, "{} = {}", v.target, v.value),
      StmtKind::Using(v) => write!(f, "Using {}", join_path(&v.path)),
      StmtKind::Scope(v) => {
        write!(f, "Scope {}", v.name)?;
        write_block(f, &v.body)
      }
      StmtKind::While(v) => {
        write!(f, "While {}", v.cond)?;
        write_block(f, &v.body)
      }
      StmtKind::Alias(v) => {
        write!(f, "Alias {}::{} {{", v.name, v.ty)?;
        for (i, entry) in v.entries.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{} = {}", entry.name, entry.value)?;
        }
        write!(f, "}}")
      }
      StmtKind::Func(v) => {
        write!(f, "Fun {}", v.name)?;
        if let Some(ret) = &v.ret {
          write!(f, "::{ret}")?;
        }
        for (i, param) in v.params.iter().enumerate() {
          write!(f, "{}{param}", if i == 0 { "$" } else { ", " })?;
        }
        write_block(f, &v.body)
      }
      StmtKind::If(v) => {
        for (i, branch) in v.branches.iter().enumerate() {
          write!(f, "{} {}", if i == 0 { "If" } else { " Elif" }, branch.cond)?;
          write_block(f, &branch.body)?;
        }
        if let Some(default) = &v.default {
          write!(f, " Else")?;
          write_block(f, default)?;
        }
        Ok(())
      }
      StmtKind::Ctrl(v) => match &**v {
        Ctrl::Return(r) => match &r.value {
          Some(value) => write!(f, "Return {value}"),
          None => write!(f, "Return"),
        },
        Ctrl::Break => write!(f, "Break"),
        Ctrl::Continue => write!(f, "Continue"),
      },
      StmtKind::Expr(v) => write!(f, "{v}"),
    }
  }
}

fn join_path(path: &[Ident<'_>]) -> String {
  path
    .iter()
    .map(|v| v.as_ref())
    .collect::<Vec<_>>()
    .join("::")
}

impl Display for TypeExpr<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", join_path(&self.path))
  }
}

impl Display for Variable<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.ty, self.name)
  }
}

impl Display for ExprKind<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExprKind::Literal(v) => match &**v {
        Literal::Int(value) => write!(f, "{value}"),
        Literal::Bool(value) => write!(f, "{}", if *value { "True" } else { "False" }),
      },
      ExprKind::Prefix(v) => match v.op {
        PrefixOp::Not => write!(f, "(Not {})", v.right),
        PrefixOp::Neg => write!(f, "(-{})", v.right),
      },
      ExprKind::Binary(v) => write!(f, "({} {} {})", v.left, v.op.as_str(), v.right),
      ExprKind::GetVar(v) => write!(f, "{}", v.name),
      ExprKind::Call(v) => {
        write!(f, "{}(", v.target)?;
        for (i, arg) in v.args.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{arg}")?;
        }
        write!(f, ")")
      }
      ExprKind::ScopeAccess(v) => write!(f, "{}::{}", v.scope, v.member),
    }
  }
}
