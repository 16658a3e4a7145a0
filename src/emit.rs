//! Lowering from the AST to the textual instruction stream.
//!
//! A single [`State`] owns the output buffer, the scope tree, both address
//! cursors and the label counter. Semantic diagnostics accumulate and
//! lowering keeps going wherever enough information remains; only internal
//! failures (scratch stack overflow, a builtin missing its lowering) abort
//! the walk.

use crate::error::{Error, ErrorKind};
use crate::span::Span;
use crate::syntax::ast;

pub mod instruction;
pub mod scope;

mod builtin;
mod expr;
mod stmt;

pub use instruction::{Direction, Instruction, Reg, BEGIN_LABEL};
pub use scope::{Function, Scope, ScopeArena, ScopeId, Type, Variable};

use instruction::Addr;

pub fn emit(program: &ast::Program<'_>, stack_size: usize) -> Result<String, Vec<Error>> {
  let mut state = State::new(stack_size);

  state.init_builtin();
  state.emit_op(Instruction::Label(BEGIN_LABEL.into()));

  for stmt in &program.body {
    if let Err(fatal) = state.emit_stmt(stmt) {
      state.errors.push(fatal);
      break;
    }
    // Scratch spill slots do not survive a top-level statement.
    state.scratch = 0;
  }

  if state.errors.is_empty() {
    Ok(render(&state.code))
  } else {
    Err(state.errors)
  }
}

fn render(code: &[Instruction]) -> String {
  let mut out = String::new();
  for instruction in code {
    out.push_str(&instruction.to_string());
    out.push('\n');
  }
  out
}

pub(crate) struct State {
  code: Vec<Instruction>,
  scopes: ScopeArena,
  current: ScopeId,
  stack_size: usize,
  /// Next durable address.
  mem: Addr,
  /// Next scratch address; bounded by `stack_size`.
  scratch: Addr,
  labels: usize,
  errors: Vec<Error>,
}

impl State {
  fn new(stack_size: usize) -> Self {
    let scopes = ScopeArena::new();
    let current = scopes.root();
    Self {
      code: Vec::new(),
      scopes,
      current,
      stack_size,
      mem: stack_size,
      scratch: 0,
      labels: 0,
      errors: Vec::new(),
    }
  }

  #[inline]
  pub(crate) fn emit_op(&mut self, instruction: Instruction) {
    self.code.push(instruction);
  }

  pub(crate) fn error(&mut self, kind: ErrorKind, message: impl ToString, span: Span) {
    self.errors.push(Error::new(kind, message, span));
  }

  pub(crate) fn next_label(&mut self) -> String {
    self.labels += 1;
    format!("label{}", self.labels)
  }

  /// Claim the next durable address.
  pub(crate) fn alloc_mem(&mut self) -> Addr {
    let addr = self.mem;
    self.mem += 1;
    addr
  }

  /// Claim the next scratch address; running past the configured stack
  /// size is unrecoverable.
  pub(crate) fn alloc_scratch(&mut self, span: Span) -> Result<Addr, Error> {
    if self.scratch >= self.stack_size {
      return Err(Error::new(ErrorKind::Internal, "stack overflow", span));
    }
    let addr = self.scratch;
    self.scratch += 1;
    Ok(addr)
  }

  /// Resolve a type expression to a `Type`, reporting unknown names.
  pub(crate) fn resolve_type(&mut self, ty: &ast::TypeExpr<'_>) -> Option<Type> {
    let (scope, name) = match ty.path.as_slice() {
      [name] => (None, name),
      [path @ .., name] => (Some(self.resolve_scope_path(path, ty.span)?), name),
      [] => return None,
    };

    match scope {
      None => {
        if let scope::INT | scope::BOOL | scope::DIR = name.as_ref() {
          return Some(Type::builtin(name.as_ref()));
        }
        if let Some(found) = self.scopes.get_type(self.current, name.as_ref()) {
          return Some(found.clone());
        }
      }
      Some(scope) => {
        if let Some(found) = self.scopes.get_local_type(scope, name.as_ref()) {
          return Some(found.clone());
        }
      }
    }

    self.error(ErrorKind::Name, format!("unknown type {ty}"), ty.span);
    None
  }

  /// Resolve a `::`-separated scope path: the head through the full scope
  /// search, every later segment as a local child of its predecessor.
  pub(crate) fn resolve_scope_path(&mut self, path: &[ast::Ident<'_>], span: Span) -> Option<ScopeId> {
    let (head, rest) = path.split_first()?;
    let Some(mut scope) = self.scopes.get_scope(self.current, head.as_ref()) else {
      self.error(ErrorKind::Name, format!("unknown scope {head}"), span);
      return None;
    };
    for segment in rest {
      match self.scopes.get_local_scope(scope, segment.as_ref()) {
        Some(child) => scope = child,
        None => {
          self.error(ErrorKind::Name, format!("unknown scope {segment}"), span);
          return None;
        }
      }
    }
    Some(scope)
  }

  /// Resolve the scope operand of a `::` expression.
  pub(crate) fn resolve_scope_expr(&mut self, expr: &ast::Expr<'_>) -> Option<ScopeId> {
    match &**expr {
      ast::ExprKind::GetVar(v) => {
        let found = self.scopes.get_scope(self.current, v.name.as_ref());
        if found.is_none() {
          self.error(ErrorKind::Name, format!("unknown scope {}", v.name), expr.span);
        }
        found
      }
      ast::ExprKind::ScopeAccess(v) => {
        let outer = self.resolve_scope_expr(&v.scope)?;
        let found = self.scopes.get_local_scope(outer, v.member.as_ref());
        if found.is_none() {
          self.error(ErrorKind::Name, format!("unknown scope {}", v.member), expr.span);
        }
        found
      }
      _ => {
        self.error(ErrorKind::Name, "invalid scope expression", expr.span);
        None
      }
    }
  }
}

/// `Color` → `color`, matching how alias scopes are named.
pub(crate) fn first_to_lowercase(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_lowercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests;
