use super::expr::Precedence;
use super::*;
use crate::syntax::ast::{ExprKind, TypeExpr, Variable};

impl<'src> Parser<'src> {
  pub(super) fn stmt(&mut self) -> Result<ast::Stmt<'src>> {
    match self.current().kind {
      Kw_Using => self.using_stmt(),
      Kw_Return => self.return_stmt(),
      Kw_Scope => self.scope_stmt(),
      Kw_While => self.while_stmt(),
      Kw_If => self.if_stmt(),
      Kw_Alias => self.alias_stmt(),
      Kw_Fun => self.func_stmt(),
      Kw_Break => {
        self.bump();
        Ok(ast::break_stmt(self.previous().span))
      }
      Kw_Continue => {
        self.bump();
        Ok(ast::continue_stmt(self.previous().span))
      }
      _ => self.expr_stmt(),
    }
  }

  fn using_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_Using)?;
    let start = self.previous().span;
    self.no_indent()?;
    let path = self.scope_path()?;
    let end = self.previous().span;
    Ok(ast::using_stmt(start.join(end), path))
  }

  /// `a`, `a::b`, `a::b::c`, …
  fn scope_path(&mut self) -> Result<Vec<ast::Ident<'src>>> {
    let mut path = vec![self.name()?];
    while self.no_indent().is_ok() && self.bump_if(Op_ColonColon) {
      self.no_indent()?;
      path.push(self.name()?);
    }
    Ok(path)
  }

  fn return_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_Return)?;
    let start = self.previous().span;
    // A `Return` alone on its line has no value.
    let value = if self.current().ws.is_none() && !self.current().is(Tok_Eof) {
      Some(self.expr(Precedence::Lowest)?)
    } else {
      None
    };
    let end = self.previous().span;
    Ok(ast::return_stmt(start.join(end), value))
  }

  fn scope_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_Scope)?;
    let start = self.previous().span;
    self.no_indent()?;
    let name = self.name()?;
    let body = self.block()?;
    let end = self.previous().span;
    Ok(ast::scope_stmt(start.join(end), name, body))
  }

  fn while_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_While)?;
    let start = self.previous().span;
    self.no_indent()?;
    let cond = self.expr(Precedence::Lowest)?;
    let body = self.block()?;
    let end = self.previous().span;
    Ok(ast::while_stmt(start.join(end), cond, body))
  }

  fn if_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_If)?;
    let start = self.previous().span;

    let mut branches = vec![self.if_branch()?];
    let mut default = None;

    while self.current().is(Kw_Elif) {
      self.branch_indent()?;
      self.bump();
      branches.push(self.if_branch()?);
    }
    if self.current().is(Kw_Else) {
      self.branch_indent()?;
      self.bump();
      default = Some(self.block()?);
    }

    let end = self.previous().span;
    Ok(ast::if_stmt(start.join(end), branches, default))
  }

  fn if_branch(&mut self) -> Result<ast::Branch<'src>> {
    self.no_indent()?;
    let cond = self.expr(Precedence::Lowest)?;
    let body = self.block()?;
    Ok(ast::branch(cond, body))
  }

  /// `Elif`/`Else` must sit at the same indentation as their `If`.
  fn branch_indent(&self) -> Result<()> {
    self.indent_eq().map_err(|e| {
      Error::new(
        ErrorKind::Parse,
        "unexpected indentation after if statement",
        e.span,
      )
    })
  }

  fn alias_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_Alias)?;
    let start = self.previous().span;
    self.no_indent()?;
    let name = self.pident()?;
    self.no_indent()?;
    self.expect(Op_ColonColon)?;
    self.no_indent()?;
    let ty = self.type_expr()?;

    self.no_indent()?;
    self.expect(Tok_Colon)?;
    self.indent_gt()?;
    let mut entries = vec![self.alias_entry()?];
    self.end_of_line()?;
    while !self.current().is(Tok_Eof) && self.indent_eq().is_ok() {
      entries.push(self.alias_entry()?);
      self.end_of_line()?;
    }
    self.dedent()?;

    let end = self.previous().span;
    Ok(ast::alias_stmt(start.join(end), name, ty, entries))
  }

  fn alias_entry(&mut self) -> Result<ast::AliasEntry<'src>> {
    let name = self.ident()?;
    self.no_indent()?;
    self.expect(Op_Equal)?;
    self.no_indent()?;
    let value = self.expr(Precedence::Lowest)?;
    Ok(ast::AliasEntry { name, value })
  }

  fn func_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.expect(Kw_Fun)?;
    let start = self.previous().span;
    self.no_indent()?;
    let name = self.pident()?;

    let mut ret = None;
    if self.no_indent().is_ok() && self.bump_if(Op_ColonColon) {
      self.no_indent()?;
      ret = Some(self.type_expr()?);
    }

    let mut params = vec![];
    if self.no_indent().is_ok() && self.bump_if(Op_Dollar) {
      self.no_indent()?;
      params.push(self.param()?);
      while self.no_indent().is_ok() && self.bump_if(Tok_Comma) {
        self.no_indent()?;
        params.push(self.param()?);
      }
    }

    let body = self.block()?;
    let end = self.previous().span;
    Ok(ast::func_stmt(start.join(end), name, ret, params, body))
  }

  fn param(&mut self) -> Result<Variable<'src>> {
    let name = self.ident()?;
    self.no_indent()?;
    let ty = self.type_expr()?;
    Ok(Variable { ty, name })
  }

  /// `Int`, `Dir`, `colors::Color`, …
  fn type_expr(&mut self) -> Result<TypeExpr<'src>> {
    let start = self.current().span;
    let path = self.scope_path()?;
    let end = self.previous().span;
    Ok(TypeExpr::new(start.join(end), path))
  }

  /// `: <newline> <stmt…>` at exactly one level deeper.
  fn block(&mut self) -> Result<Vec<ast::Stmt<'src>>> {
    self.no_indent()?;
    self.expect(Tok_Colon)?;
    self.indent_gt()?;

    let mut body = vec![self.stmt()?];
    self.end_of_line()?;
    while !self.current().is(Tok_Eof) && self.indent_eq().is_ok() {
      body.push(self.stmt()?);
      self.end_of_line()?;
    }

    self.dedent()?;
    Ok(body)
  }

  fn expr_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    let target = self.expr(Precedence::Lowest)?;

    // `Type name = value` — the "expression" was really a type. A leading
    // prime identifier (or qualified name) parses as a zero-argument call,
    // so an identifier trailing it on the same line marks a declaration.
    if self.no_indent().is_ok() && self.current().is(Lit_Ident) {
      let Some(ty) = type_expr_of(&target) else {
        return Err(self.error_at(
          format!(
            "expected end of line, got {}",
            self.current().kind.name()
          ),
          self.current(),
        ));
      };
      let name = self.ident()?;
      self.no_indent()?;
      self.expect(Op_Equal)?;
      self.no_indent()?;
      let value = self.expr(Precedence::Lowest)?;
      return Ok(ast::decl_stmt(Variable { ty, name }, value));
    }

    // `name = value`
    if self.no_indent().is_ok() && self.current().is(Op_Equal) {
      if let ExprKind::GetVar(v) = &*target {
        let name = v.name.clone();
        self.bump();
        self.no_indent()?;
        let value = self.expr(Precedence::Lowest)?;
        return Ok(ast::assign_stmt(name, value));
      }
      return Err(self.error_at("invalid assignment target", self.current()));
    }

    Ok(ast::expr_stmt(target))
  }

  pub(super) fn ident(&mut self) -> Result<ast::Ident<'src>> {
    self.expect(Lit_Ident)?;
    let token = self.previous();
    Ok(ast::Ident::new(token.span, self.lex.lexeme(token).into()))
  }

  pub(super) fn pident(&mut self) -> Result<ast::Ident<'src>> {
    self.expect(Lit_PIdent)?;
    let token = self.previous();
    Ok(ast::Ident::new(token.span, self.lex.lexeme(token).into()))
  }

  /// An identifier of either case.
  pub(super) fn name(&mut self) -> Result<ast::Ident<'src>> {
    if self.current().is(Lit_Ident) || self.current().is(Lit_PIdent) {
      self.bump();
      let token = self.previous();
      Ok(ast::Ident::new(token.span, self.lex.lexeme(token).into()))
    } else {
      Err(self.error_at(
        format!("expected identifier, got {}", self.current().kind.name()),
        self.current(),
      ))
    }
  }
}

/// Reinterpret an already-parsed expression as a type path, if it has the
/// right shape (`Int`, `colors::Color`, …).
fn type_expr_of<'src>(expr: &ast::Expr<'src>) -> Option<TypeExpr<'src>> {
  let mut path = vec![];
  collect_path(expr, &mut path)?;
  Some(TypeExpr::new(expr.span, path))
}

fn collect_path<'src>(expr: &ast::Expr<'src>, path: &mut Vec<ast::Ident<'src>>) -> Option<()> {
  match &**expr {
    ExprKind::GetVar(v) => {
      path.push(v.name.clone());
      Some(())
    }
    ExprKind::Call(v) if v.args.is_empty() => collect_path(&v.target, path),
    ExprKind::ScopeAccess(v) => {
      collect_path(&v.scope, path)?;
      path.push(v.member.clone());
      Some(())
    }
    _ => None,
  }
}
