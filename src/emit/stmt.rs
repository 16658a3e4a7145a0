use super::instruction::Instruction::*;
use super::*;
use crate::error::ErrorKind;
use crate::syntax::ast::Ctrl;

impl State {
  pub(super) fn emit_stmt(&mut self, stmt: &ast::Stmt<'_>) -> Result<(), Error> {
    match &**stmt {
      ast::StmtKind::Decl(v) => self.emit_decl_stmt(v),
      ast::StmtKind::Assign(v) => self.emit_assign_stmt(v, stmt.span),
      ast::StmtKind::Using(v) => self.emit_using_stmt(v, stmt.span),
      ast::StmtKind::Scope(v) => self.emit_scope_stmt(v),
      ast::StmtKind::While(v) => self.emit_while_stmt(v),
      ast::StmtKind::Alias(v) => self.emit_alias_stmt(v),
      ast::StmtKind::Func(v) => self.emit_func_stmt(v, stmt.span),
      ast::StmtKind::If(v) => self.emit_if_stmt(v),
      ast::StmtKind::Ctrl(v) => self.emit_ctrl_stmt(v, stmt.span),
      ast::StmtKind::Expr(v) => self.emit_expr(v).map(|_| ()),
    }
  }

  fn emit_stmt_list(&mut self, list: &[ast::Stmt<'_>]) -> Result<(), Error> {
    for stmt in list {
      self.emit_stmt(stmt)?;
    }
    Ok(())
  }

  fn emit_decl_stmt(&mut self, stmt: &ast::Decl<'_>) -> Result<(), Error> {
    let (ty, reg) = self.emit_expr(&stmt.value)?;
    let declared = self.resolve_type(&stmt.var.ty);

    if let Some(declared) = &declared {
      if *declared != ty {
        self.error(
          ErrorKind::Type,
          format!("unexpected type of expression: variable={declared}, expression={ty}"),
          stmt.value.span,
        );
      }
    }

    let addr = self.alloc_mem();
    if let Some(reg) = reg {
      self.emit_op(Ldr(addr, reg));
    }

    let name = stmt.var.name.to_string();
    let bound = self.scopes.add_variable(
      self.current,
      Variable {
        name: name.clone(),
        addr,
        ty: declared.unwrap_or(ty),
      },
    );
    if !bound {
      self.error(
        ErrorKind::Name,
        format!("variable {name} is already declared in this scope"),
        stmt.var.name.span,
      );
    }
    Ok(())
  }

  fn emit_assign_stmt(&mut self, stmt: &ast::Assign<'_>, span: Span) -> Result<(), Error> {
    let target = self
      .scopes
      .get_variable(self.current, stmt.target.as_ref())
      .map(|v| (v.addr, v.ty.clone()));
    if target.is_none() {
      self.error(
        ErrorKind::Name,
        format!("undeclared variable {}", stmt.target),
        span,
      );
    }

    let (ty, reg) = self.emit_expr(&stmt.value)?;

    if let Some((addr, expected)) = target {
      if expected != ty {
        self.error(
          ErrorKind::Type,
          format!("unexpected type of expression: variable={expected}, expression={ty}"),
          stmt.value.span,
        );
      }
      if let Some(reg) = reg {
        self.emit_op(Ldr(addr, reg));
      }
    }
    Ok(())
  }

  fn emit_using_stmt(&mut self, stmt: &ast::Using<'_>, span: Span) -> Result<(), Error> {
    if let Some(scope) = self.resolve_scope_path(&stmt.path, span) {
      self.scopes.add_using(self.current, scope);
    }
    Ok(())
  }

  fn emit_scope_stmt(&mut self, stmt: &ast::ScopeStmt<'_>) -> Result<(), Error> {
    let (scope, registered) = self.scopes.add_scope(self.current, stmt.name.as_ref());
    if !registered {
      self.error(
        ErrorKind::Name,
        format!("scope {} is already declared", stmt.name),
        stmt.name.span,
      );
    }

    let parent = std::mem::replace(&mut self.current, scope);
    let res = self.emit_stmt_list(&stmt.body);
    self.current = parent;
    res
  }

  fn emit_while_stmt(&mut self, stmt: &ast::While<'_>) -> Result<(), Error> {
    let start = self.next_label();
    let end = self.next_label();

    self.emit_op(Label(start.clone()));
    let (ty, reg) = self.emit_expr(&stmt.cond)?;
    self.check_condition(&ty, stmt.cond.span);
    if let Some(reg) = reg {
      self.emit_op(Cmpv(reg, 1));
    }
    self.emit_op(Jne(end.clone()));

    let body = self.scopes.add_block(self.current);
    self.scopes.set_loop_labels(body, end.clone(), start.clone());
    let parent = std::mem::replace(&mut self.current, body);
    let res = self.emit_stmt_list(&stmt.body);
    self.current = parent;
    res?;

    self.emit_op(Jmp(start));
    self.emit_op(Label(end));
    Ok(())
  }

  fn emit_if_stmt(&mut self, stmt: &ast::If<'_>) -> Result<(), Error> {
    let end = self.next_label();

    for branch in &stmt.branches {
      let next = self.next_label();
      let (ty, reg) = self.emit_expr(&branch.cond)?;
      self.check_condition(&ty, branch.cond.span);
      if let Some(reg) = reg {
        self.emit_op(Cmpv(reg, 1));
      }
      self.emit_op(Jne(next.clone()));

      let body = self.scopes.add_block(self.current);
      let parent = std::mem::replace(&mut self.current, body);
      let res = self.emit_stmt_list(&branch.body);
      self.current = parent;
      res?;

      self.emit_op(Jmp(end.clone()));
      self.emit_op(Label(next));
    }

    if let Some(default) = &stmt.default {
      let body = self.scopes.add_block(self.current);
      let parent = std::mem::replace(&mut self.current, body);
      let res = self.emit_stmt_list(default);
      self.current = parent;
      res?;
    }

    self.emit_op(Label(end));
    Ok(())
  }

  fn emit_alias_stmt(&mut self, stmt: &ast::Alias<'_>) -> Result<(), Error> {
    let underlying = match stmt.ty.path.as_slice() {
      [name] if matches!(name.as_ref(), scope::INT | scope::BOOL) => {
        Type::builtin(name.as_ref())
      }
      _ => {
        self.error(
          ErrorKind::Type,
          format!(
            "alias must be of type {} or {}, got {}",
            scope::INT,
            scope::BOOL,
            stmt.ty
          ),
          stmt.ty.span,
        );
        Type::builtin(scope::INT)
      }
    };

    let alias = Type {
      scope: Some(self.current),
      name: stmt.name.to_string(),
    };
    if !self
      .scopes
      .add_type(self.current, stmt.name.as_ref(), alias.clone())
    {
      self.error(
        ErrorKind::Name,
        format!("type {} is already declared", stmt.name),
        stmt.name.span,
      );
    }

    let scope_name = first_to_lowercase(stmt.name.as_ref());
    let (scope, registered) = self.scopes.add_scope(self.current, scope_name);
    if !registered {
      self.error(
        ErrorKind::Name,
        format!("scope {} is already declared", first_to_lowercase(stmt.name.as_ref())),
        stmt.name.span,
      );
    }

    let parent = std::mem::replace(&mut self.current, scope);
    for entry in &stmt.entries {
      let res = self.emit_alias_entry(entry, &underlying, &alias);
      if let Err(fatal) = res {
        self.current = parent;
        return Err(fatal);
      }
    }
    self.current = parent;
    Ok(())
  }

  fn emit_alias_entry(
    &mut self,
    entry: &ast::AliasEntry<'_>,
    underlying: &Type,
    alias: &Type,
  ) -> Result<(), Error> {
    let (ty, reg) = self.emit_expr(&entry.value)?;
    if ty != *underlying {
      self.error(
        ErrorKind::Type,
        format!("unexpected type of expression: variable={underlying}, expression={ty}"),
        entry.value.span,
      );
    }

    let addr = self.alloc_mem();
    if let Some(reg) = reg {
      self.emit_op(Ldr(addr, reg));
    }

    let bound = self.scopes.add_variable(
      self.current,
      Variable {
        name: entry.name.to_string(),
        addr,
        ty: alias.clone(),
      },
    );
    if !bound {
      self.error(
        ErrorKind::Name,
        format!("variable {} is already declared in this scope", entry.name),
        entry.name.span,
      );
    }
    Ok(())
  }

  fn emit_func_stmt(&mut self, stmt: &ast::Func<'_>, span: Span) -> Result<(), Error> {
    let ret = match &stmt.ret {
      Some(ty) => self.resolve_type(ty).unwrap_or_else(Type::void),
      None => Type::void(),
    };

    let start = self.next_label();
    let end = self.next_label();

    let mut params = Vec::with_capacity(stmt.params.len());
    for param in &stmt.params {
      let ty = self.resolve_type(&param.ty).unwrap_or_else(Type::void);
      let addr = self.alloc_mem();
      params.push(Variable {
        name: param.name.to_string(),
        addr,
        ty,
      });
    }

    let registered = self.scopes.add_function(
      self.current,
      Function {
        name: stmt.name.to_string(),
        label: start.clone(),
        ret: ret.clone(),
        params: params.clone(),
        is_builtin: false,
      },
    );
    if !registered {
      self.error(
        ErrorKind::Name,
        format!("function {} is already declared", stmt.name),
        stmt.name.span,
      );
    }

    let body = self.scopes.add_block(self.current);
    self.scopes.set_return_type(body, ret.clone());
    for (param, var) in stmt.params.iter().zip(params) {
      if !self.scopes.add_variable(body, var) {
        self.error(
          ErrorKind::Name,
          format!("variable {} is already declared in this scope", param.name),
          param.name.span,
        );
      }
    }

    self.emit_op(Jmp(end.clone()));
    self.emit_op(Label(start));

    let parent = std::mem::replace(&mut self.current, body);
    let res = self.emit_stmt_list(&stmt.body);
    self.current = parent;
    res?;

    // Flow-agnostic: only a `Return` directly in the body counts.
    let has_return = stmt
      .body
      .iter()
      .any(|s| matches!(&**s, ast::StmtKind::Ctrl(c) if matches!(&**c, Ctrl::Return(_))));
    if !has_return {
      if ret.is_void() {
        self.emit_op(Ret);
      } else {
        self.error(ErrorKind::Control, "expected return statement", span);
      }
    }

    self.emit_op(Label(end));
    Ok(())
  }

  fn emit_ctrl_stmt(&mut self, stmt: &Ctrl<'_>, span: Span) -> Result<(), Error> {
    match stmt {
      Ctrl::Return(v) => {
        let expected = self.scopes.get_return_type(self.current);

        let (ty, reg) = match &v.value {
          Some(value) => self.emit_expr(value)?,
          None => (Type::void(), None),
        };

        match expected {
          Some(expected) => {
            if expected != ty {
              self.error(
                ErrorKind::Type,
                format!("unexpected type of return value: expected={expected}, got={ty}"),
                span,
              );
            }
          }
          None => {
            self.error(ErrorKind::Control, "return outside of function", span);
          }
        }

        if let Some(reg) = reg {
          self.emit_op(Ld(Reg::Ax, reg));
        }
        self.emit_op(Ret);
      }
      Ctrl::Break => match self.scopes.get_loop_labels(self.current) {
        // The source pairs `Break` with the loop-start label and
        // `Continue` with the end label; preserved as observed.
        Some((_, repeat)) => self.emit_op(Jmp(repeat)),
        None => self.error(ErrorKind::Control, "break outside of loop", span),
      },
      Ctrl::Continue => match self.scopes.get_loop_labels(self.current) {
        Some((escape, _)) => self.emit_op(Jmp(escape)),
        None => self.error(ErrorKind::Control, "continue outside of loop", span),
      },
    }
    Ok(())
  }

  pub(super) fn check_condition(&mut self, ty: &Type, span: Span) {
    if *ty != Type::builtin(scope::BOOL) {
      self.error(
        ErrorKind::Type,
        format!("unexpected type of expression: expected={}, got={ty}", scope::BOOL),
        span,
      );
    }
  }
}
