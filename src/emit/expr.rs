use super::instruction::Instruction::*;
use super::*;
use crate::error::ErrorKind;
use crate::syntax::ast::{BinaryOp, ExprKind, PrefixOp};

impl State {
  /// Lower an expression; the result is the value's type and the register
  /// holding it (`None` for `Void`-valued expressions).
  pub(super) fn emit_expr(&mut self, expr: &ast::Expr<'_>) -> Result<(Type, Option<Reg>), Error> {
    match &**expr {
      ExprKind::Literal(v) => Ok(self.emit_literal_expr(v)),
      ExprKind::Prefix(v) => self.emit_prefix_expr(v, expr.span),
      ExprKind::Binary(v) => self.emit_binary_expr(v, expr.span),
      ExprKind::GetVar(v) => Ok(self.emit_get_var_expr(v, expr.span)),
      ExprKind::Call(v) => self.emit_call_expr(v, expr.span),
      ExprKind::ScopeAccess(v) => Ok(self.emit_scope_access_expr(v, expr.span)),
    }
  }

  fn emit_literal_expr(&mut self, literal: &ast::Literal) -> (Type, Option<Reg>) {
    match literal {
      ast::Literal::Int(value) => {
        self.emit_op(Ldv(Reg::Ax, *value));
        (Type::builtin(scope::INT), Some(Reg::Ax))
      }
      ast::Literal::Bool(value) => {
        self.emit_op(Ldv(Reg::Ax, *value as i64));
        (Type::builtin(scope::BOOL), Some(Reg::Ax))
      }
    }
  }

  fn emit_get_var_expr(&mut self, expr: &ast::GetVar<'_>, span: Span) -> (Type, Option<Reg>) {
    let Some(variable) = self.scopes.get_variable(self.current, expr.name.as_ref()) else {
      self.error(
        ErrorKind::Name,
        format!("undeclared variable {}", expr.name),
        span,
      );
      return (Type::void(), None);
    };
    let (addr, ty) = (variable.addr, variable.ty.clone());
    self.emit_op(Ldm(Reg::Ax, addr));
    (ty, Some(Reg::Ax))
  }

  fn emit_scope_access_expr(
    &mut self,
    expr: &ast::ScopeAccess<'_>,
    span: Span,
  ) -> (Type, Option<Reg>) {
    let Some(scope) = self.resolve_scope_expr(&expr.scope) else {
      return (Type::void(), None);
    };
    let Some(variable) = self.scopes.get_local_variable(scope, expr.member.as_ref()) else {
      self.error(
        ErrorKind::Name,
        format!("undeclared variable {}", expr.member),
        span,
      );
      return (Type::void(), None);
    };
    let (addr, ty) = (variable.addr, variable.ty.clone());
    self.emit_op(Ldm(Reg::Ax, addr));
    (ty, Some(Reg::Ax))
  }

  fn emit_prefix_expr(
    &mut self,
    expr: &ast::Prefix<'_>,
    span: Span,
  ) -> Result<(Type, Option<Reg>), Error> {
    match expr.op {
      PrefixOp::Not => {
        let (ty, reg) = self.emit_expr(&expr.right)?;
        self.check_condition(&ty, expr.right.span);

        let falsy = self.next_label();
        let end = self.next_label();
        if let Some(reg) = reg {
          self.emit_op(Cmpv(reg, 1));
        }
        self.emit_op(Jme(falsy.clone()));
        self.emit_op(Ldv(Reg::Ax, 1));
        self.emit_op(Jmp(end.clone()));
        self.emit_op(Label(falsy));
        self.emit_op(Ldv(Reg::Ax, 0));
        self.emit_op(Label(end));

        Ok((Type::builtin(scope::BOOL), Some(Reg::Ax)))
      }
      PrefixOp::Neg => {
        self.error(ErrorKind::Internal, "unary minus is not implemented", span);
        Ok((Type::builtin(scope::INT), None))
      }
    }
  }

  fn emit_binary_expr(
    &mut self,
    expr: &ast::Binary<'_>,
    span: Span,
  ) -> Result<(Type, Option<Reg>), Error> {
    let (left_ty, left_reg) = self.emit_expr(&expr.left)?;

    // Spill the left operand so the right side is free to clobber `AX`.
    let scratch = self.alloc_scratch(span)?;
    if let Some(reg) = left_reg {
      self.emit_op(Ldr(scratch, reg));
    }

    let (right_ty, right_reg) = self.emit_expr(&expr.right)?;
    match right_reg {
      Some(Reg::Bx) | None => {}
      Some(reg) => self.emit_op(Ld(Reg::Bx, reg)),
    }
    self.emit_op(Ldm(Reg::Ax, scratch));

    let operand = match expr.op {
      BinaryOp::And | BinaryOp::Or => Type::builtin(scope::BOOL),
      _ => Type::builtin(scope::INT),
    };
    for (ty, side) in [(&left_ty, &expr.left), (&right_ty, &expr.right)] {
      if *ty != operand {
        self.error(
          ErrorKind::Type,
          format!("unexpected type of expression: expected={operand}, got={ty}"),
          side.span,
        );
      }
    }

    match expr.op {
      BinaryOp::And => {
        let falsy = self.next_label();
        let end = self.next_label();
        self.emit_op(Cmpv(Reg::Ax, 0));
        self.emit_op(Jme(falsy.clone()));
        self.emit_op(Cmpv(Reg::Bx, 0));
        self.emit_op(Jme(falsy.clone()));
        self.emit_op(Ldv(Reg::Ax, 1));
        self.emit_op(Jmp(end.clone()));
        self.emit_op(Label(falsy));
        self.emit_op(Ldv(Reg::Ax, 0));
        self.emit_op(Label(end));
      }
      BinaryOp::Or => {
        let truthy = self.next_label();
        let end = self.next_label();
        self.emit_op(Cmpv(Reg::Ax, 1));
        self.emit_op(Jme(truthy.clone()));
        self.emit_op(Cmpv(Reg::Bx, 1));
        self.emit_op(Jme(truthy.clone()));
        self.emit_op(Ldv(Reg::Ax, 0));
        self.emit_op(Jmp(end.clone()));
        self.emit_op(Label(truthy));
        self.emit_op(Ldv(Reg::Ax, 1));
        self.emit_op(Label(end));
      }
      op => {
        let truthy = self.next_label();
        let end = self.next_label();
        self.emit_op(Cmp(Reg::Ax, Reg::Bx));
        let jump = match op {
          BinaryOp::Eq => Jme(truthy.clone()),
          BinaryOp::Neq => Jne(truthy.clone()),
          BinaryOp::Less => Jml(truthy.clone()),
          BinaryOp::LessEq => Jle(truthy.clone()),
          BinaryOp::More => Jmg(truthy.clone()),
          BinaryOp::MoreEq => Jge(truthy.clone()),
          BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        };
        self.emit_op(jump);
        self.emit_op(Ldv(Reg::Ax, 0));
        self.emit_op(Jmp(end.clone()));
        self.emit_op(Label(truthy));
        self.emit_op(Ldv(Reg::Ax, 1));
        self.emit_op(Label(end));
      }
    }

    Ok((Type::builtin(scope::BOOL), Some(Reg::Ax)))
  }

  fn emit_call_expr(
    &mut self,
    expr: &ast::Call<'_>,
    span: Span,
  ) -> Result<(Type, Option<Reg>), Error> {
    let function = match &*expr.target {
      ExprKind::GetVar(v) => {
        let found = self.scopes.get_function(self.current, v.name.as_ref()).cloned();
        if found.is_none() {
          self.error(
            ErrorKind::Name,
            format!("undeclared function {}", v.name),
            span,
          );
        }
        found
      }
      ExprKind::ScopeAccess(v) => {
        let Some(scope) = self.resolve_scope_expr(&v.scope) else {
          return Ok((Type::void(), None));
        };
        let found = self.scopes.get_local_function(scope, v.member.as_ref()).cloned();
        if found.is_none() {
          self.error(
            ErrorKind::Name,
            format!("undeclared function {}", v.member),
            span,
          );
        }
        found
      }
      _ => {
        self.error(ErrorKind::Name, "invalid call target", span);
        None
      }
    };
    let Some(function) = function else {
      return Ok((Type::void(), None));
    };

    if function.is_builtin {
      return self.emit_builtin(&function.name, &expr.args, span);
    }

    if expr.args.len() != function.params.len() {
      self.error(
        ErrorKind::Arity,
        format!(
          "unexpected number of arguments expected={}, got={}",
          function.params.len(),
          expr.args.len()
        ),
        span,
      );
    }

    for (arg, param) in expr.args.iter().zip(&function.params) {
      let (ty, reg) = self.emit_expr(arg)?;
      if ty != param.ty {
        self.error(
          ErrorKind::Type,
          format!(
            "unexpected type of an argument expected={}, got={ty}",
            param.ty
          ),
          arg.span,
        );
      }
      if let Some(reg) = reg {
        self.emit_op(Ldr(param.addr, reg));
      }
    }
    self.emit_op(Call(function.label));

    let reg = if function.ret.is_void() {
      None
    } else {
      Some(Reg::Ax)
    };
    Ok((function.ret, reg))
  }
}
