use super::*;
use crate::syntax::ast::ExprKind;

/// Binding strength of infix operators, weakest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
  Lowest,
  /// `And`, `Or`
  Logic,
  /// `==`, `!=`
  Equals,
  /// `<`, `<=`, `>`, `>=`
  LessGreater,
  /// `Not`, unary `-`
  Prefix,
  /// `$`
  Call,
  /// `::`
  Scope,
}

fn precedence_of(kind: TokenKind) -> Precedence {
  match kind {
    Kw_And | Kw_Or => Precedence::Logic,
    Op_EqualEqual | Op_BangEqual => Precedence::Equals,
    Op_Less | Op_LessEqual | Op_More | Op_MoreEqual => Precedence::LessGreater,
    Op_Dollar => Precedence::Call,
    Op_ColonColon => Precedence::Scope,
    _ => Precedence::Lowest,
  }
}

impl<'src> Parser<'src> {
  /// Pratt loop: keep consuming infix operators on the current line while
  /// they bind tighter than the caller.
  pub(super) fn expr(&mut self, prec: Precedence) -> Result<ast::Expr<'src>> {
    let mut left = self.prefix_expr()?;
    while self.no_indent().is_ok() && prec < precedence_of(self.current().kind) {
      left = self.infix_expr(left)?;
    }
    Ok(left)
  }

  fn prefix_expr(&mut self) -> Result<ast::Expr<'src>> {
    match self.current().kind {
      Lit_Int => {
        self.bump();
        let token = self.previous();
        let span = token.span;
        let value = self
          .lex
          .lexeme(token)
          .parse::<i64>()
          .map_err(|e| Error::new(ErrorKind::Parse, format!("invalid number: {e}"), span))?;
        Ok(ast::expr_int(span, value))
      }
      Kw_True => {
        self.bump();
        Ok(ast::expr_bool(self.previous().span, true))
      }
      Kw_False => {
        self.bump();
        Ok(ast::expr_bool(self.previous().span, false))
      }
      Lit_Ident => Ok(ast::expr_get_var(self.ident()?)),
      // A prime identifier on its own denotes a call with no arguments;
      // `$` merges an argument list into it later.
      Lit_PIdent => {
        let name = self.pident()?;
        let span = name.span;
        Ok(ast::expr_call(span, ast::expr_get_var(name), vec![]))
      }
      Kw_Not => {
        self.bump();
        let start = self.previous().span;
        self.no_indent()?;
        let right = self.expr(Precedence::Prefix)?;
        Ok(ast::expr_prefix(
          start.join(right.span),
          ast::PrefixOp::Not,
          right,
        ))
      }
      Op_Minus => {
        self.bump();
        let start = self.previous().span;
        self.no_indent()?;
        let right = self.expr(Precedence::Prefix)?;
        Ok(ast::expr_prefix(
          start.join(right.span),
          ast::PrefixOp::Neg,
          right,
        ))
      }
      kind => Err(self.error_at(
        format!("unexpected token {}", kind.name()),
        self.current(),
      )),
    }
  }

  fn infix_expr(&mut self, left: ast::Expr<'src>) -> Result<ast::Expr<'src>> {
    match self.current().kind {
      Op_ColonColon => self.scope_expr(left),
      Op_Dollar => self.call_expr(left),
      kind => {
        let op = match kind {
          Op_EqualEqual => ast::BinaryOp::Eq,
          Op_BangEqual => ast::BinaryOp::Neq,
          Op_Less => ast::BinaryOp::Less,
          Op_LessEqual => ast::BinaryOp::LessEq,
          Op_More => ast::BinaryOp::More,
          Op_MoreEqual => ast::BinaryOp::MoreEq,
          Kw_And => ast::BinaryOp::And,
          Kw_Or => ast::BinaryOp::Or,
          _ => {
            return Err(self.error_at(
              format!("unexpected token {}", kind.name()),
              self.current(),
            ))
          }
        };
        let prec = precedence_of(kind);
        self.bump();
        self.no_indent()?;
        let right = self.expr(prec)?;
        Ok(ast::expr_binary(left.span.join(right.span), op, left, right))
      }
    }
  }

  /// `a::b` — member access; `a::B` — a call with no arguments resolved
  /// through scope `a`.
  fn scope_expr(&mut self, left: ast::Expr<'src>) -> Result<ast::Expr<'src>> {
    self.expect(Op_ColonColon)?;
    self.no_indent()?;

    // A qualified prime identifier parses as a zero-argument call; the
    // scope operand is the call target, not the call itself.
    let left_span = left.span;
    let scope = match left.into_inner() {
      ExprKind::Call(call) if call.args.is_empty() => call.target,
      kind => ast::Expr::new(left_span, kind),
    };

    if self.current().is(Lit_PIdent) {
      let member = self.pident()?;
      let span = scope.span.join(member.span);
      let access = ast::expr_scope_access(span, scope, member);
      Ok(ast::expr_call(span, access, vec![]))
    } else {
      let member = self.ident()?;
      let span = scope.span.join(member.span);
      Ok(ast::expr_scope_access(span, scope, member))
    }
  }

  /// `f$a, b, …` — the argument list runs to the end of the line.
  fn call_expr(&mut self, left: ast::Expr<'src>) -> Result<ast::Expr<'src>> {
    self.expect(Op_Dollar)?;
    self.no_indent()?;

    let mut args = vec![self.expr(Precedence::Lowest)?];
    while self.no_indent().is_ok() && self.bump_if(Tok_Comma) {
      self.no_indent()?;
      args.push(self.expr(Precedence::Lowest)?);
    }

    let left_span = left.span;
    let target = match left.into_inner() {
      // Merge into the bare zero-argument call the callee parsed as.
      ExprKind::Call(call) if call.args.is_empty() => call.target,
      kind => ast::Expr::new(left_span, kind),
    };
    let span = left_span.join(self.previous().span);
    Ok(ast::expr_call(span, target, args))
  }
}
