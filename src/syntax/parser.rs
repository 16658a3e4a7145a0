#![deny(unused_must_use)]

//! Recursive-descent statement parser with a Pratt expression core.
//!
//! The parser keeps one token of committed lookahead (`current`) plus the
//! previously consumed token, and resolves block structure from the `ws`
//! channel the lexer attaches to line-starting tokens. Diagnostics
//! accumulate; an error aborts the current production and the driver loop
//! resynchronizes to the next top-level construct (column zero).

use self::indent::IndentStack;
use super::ast;
use super::lexer::TokenKind::*;
use super::lexer::{Lexer, Token, TokenKind, INDENT_LENGTH};
use crate::error::{Error, ErrorKind, Result};

pub fn parse(src: &str) -> Result<ast::Program<'_>, Vec<Error>> {
  let lexer = Lexer::new(src);
  let parser = Parser::new(lexer);
  parser.program()
}

pub struct Parser<'src> {
  lex: Lexer<'src>,
  errors: Vec<Error>,
  indent: IndentStack,
}

impl<'src> Parser<'src> {
  fn new(lex: Lexer<'src>) -> Self {
    Self {
      lex,
      errors: Vec::new(),
      indent: IndentStack::new(),
    }
  }

  fn program(mut self) -> Result<ast::Program<'src>, Vec<Error>> {
    let mut program = ast::Program::new();

    while !self.current().is(Tok_Eof) {
      match self.top_level_stmt() {
        Ok(stmt) => program.body.push(stmt),
        Err(e) => {
          self.errors.push(e);
          self.sync();
        }
      }
    }

    // Lexical errors come first: a fatal one truncated the token stream,
    // and everything the parser reported after it is fallout.
    let mut errors = self.lex.take_errors();
    errors.extend(self.errors);
    if errors.is_empty() {
      Ok(program)
    } else {
      Err(errors)
    }
  }

  fn top_level_stmt(&mut self) -> Result<ast::Stmt<'src>> {
    self.indent_eq()?;
    let stmt = self.stmt()?;
    self.end_of_line()?;
    Ok(stmt)
  }

  fn no_indent(&self) -> Result<()> {
    let token = self.current();
    if token.is(Tok_Eof) || token.ws.is_none() {
      Ok(())
    } else {
      Err(self.error_at("invalid indentation", token))
    }
  }

  fn indent_eq(&self) -> Result<()> {
    let token = self.current();
    if token.is(Tok_Eof) || matches!(token.ws, Some(n) if self.indent.is_eq(n)) {
      Ok(())
    } else {
      Err(self.error_at("invalid indentation", token))
    }
  }

  /// Enter a block: the current token must sit exactly one indentation
  /// level below the enclosing statement.
  fn indent_gt(&mut self) -> Result<()> {
    let token = self.current();
    match token.ws {
      Some(n) if self.indent.is_next(n) => {
        self.indent.push(n);
        Ok(())
      }
      ws => {
        let got = ws
          .map(|n| n.saturating_sub(self.indent.level()) / INDENT_LENGTH)
          .unwrap_or(0);
        Err(self.error_at(
          format!("expected one level of indentation after expression, got {got}"),
          token,
        ))
      }
    }
  }

  fn dedent(&mut self) -> Result<()> {
    let token = self.current();
    if token.is(Tok_Eof) || matches!(token.ws, Some(n) if self.indent.is_lt(n)) {
      self.indent.pop();
      Ok(())
    } else if token.is(Kw_Elif) || token.is(Kw_Else) {
      Err(self.error_at("unexpected indentation after if statement", token))
    } else {
      Err(self.error_at("invalid indentation", token))
    }
  }

  /// A statement ends at the line boundary; anything else trailing on the
  /// same line is an error.
  fn end_of_line(&self) -> Result<()> {
    let token = self.current();
    if token.is(Tok_Eof) || token.ws.is_some() {
      Ok(())
    } else {
      Err(self.error_at(
        format!("expected end of line, got {}", token.kind.name()),
        token,
      ))
    }
  }

  #[inline]
  fn previous(&self) -> &Token {
    self.lex.previous()
  }

  #[inline]
  fn current(&self) -> &Token {
    self.lex.current()
  }

  #[inline]
  fn expect(&mut self, kind: TokenKind) -> Result<()> {
    if self.bump_if(kind) {
      Ok(())
    } else {
      Err(self.error_at(
        format!(
          "expected {}, got {}",
          kind.name(),
          self.current().kind.name()
        ),
        self.current(),
      ))
    }
  }

  #[inline]
  fn bump_if(&mut self, kind: TokenKind) -> bool {
    if self.current().is(kind) {
      self.bump();
      true
    } else {
      false
    }
  }

  /// Move forward by one token, returning the previous one.
  #[inline]
  fn bump(&mut self) -> &Token {
    self.lex.bump();
    while self.current().is(Tok_Error) {
      self.errors.push(self.error_kind_at(
        ErrorKind::Lexical,
        format!("illegal token `{}`", self.lex.lexeme(self.current())),
        self.current(),
      ));
      self.lex.bump();
    }
    self.previous()
  }

  fn error_at(&self, message: impl ToString, token: &Token) -> Error {
    self.error_kind_at(ErrorKind::Parse, message, token)
  }

  fn error_kind_at(&self, kind: ErrorKind, message: impl ToString, token: &Token) -> Error {
    Error::new(kind, message, token.span)
  }

  /// Skip to the next top-level construct.
  fn sync(&mut self) {
    self.bump();
    while !self.current().is(Tok_Eof) {
      if matches!(self.current().ws, Some(0)) {
        break;
      }
      self.bump();
    }
    while self.indent.level() > 0 {
      self.indent.pop();
    }
  }
}

mod expr;
mod indent;
mod stmt;
