#![allow(non_camel_case_types)]

use std::borrow::Borrow;
use std::fmt;
use std::mem::{discriminant, take};
use std::ops::Range;

use logos::Logos;

use crate::error::{Error, ErrorKind};
use crate::span::Span;

/// Width of one indentation step, in spaces.
pub const INDENT_LENGTH: u64 = 4;

#[derive(Clone, Debug)]
pub struct Token {
  /// Indentation of the line this token begins, in spaces.
  ///
  /// `None` means the token continues the previous token's line. The lexer
  /// never attaches indentation measured on a blank line: blank lines and
  /// full-line comments re-measure on the next real token.
  pub ws: Option<u64>,
  pub kind: TokenKind,
  pub span: Span,
}

impl Token {
  pub fn is(&self, kind: impl Borrow<TokenKind>) -> bool {
    discriminant(&self.kind) == discriminant(kind.borrow())
  }
}

#[derive(Clone)]
pub struct Lexer<'src> {
  src: &'src str,
  inner: logos::Lexer<'src, TokenKind>,
  previous: Token,
  current: Token,
  ws: Option<u64>,
  eof: Token,
  errors: Vec<Error>,
  halted: bool,
}

impl<'src> Lexer<'src> {
  pub fn new(src: &'src str) -> Self {
    let end = src.len();
    let eof = Token {
      ws: None,
      span: (end..end).into(),
      kind: TokenKind::Tok_Eof,
    };

    let mut lex = Self {
      src,
      inner: TokenKind::lexer(src),
      previous: eof.clone(),
      current: eof.clone(),
      ws: Some(0),
      eof,
      errors: Vec::new(),
      halted: false,
    };
    lex.bump();

    lex
  }

  #[inline]
  pub fn previous(&self) -> &Token {
    &self.previous
  }

  #[inline]
  pub fn current(&self) -> &Token {
    &self.current
  }

  #[inline]
  pub fn lexeme(&self, token: &Token) -> &'src str {
    &self.src[Range::from(token.span)]
  }

  /// Drain the errors recorded by the lexer itself, e.g. bad indentation.
  pub fn take_errors(&mut self) -> Vec<Error> {
    std::mem::take(&mut self.errors)
  }

  #[inline]
  pub fn bump(&mut self) {
    std::mem::swap(&mut self.previous, &mut self.current);

    self.current = self.next_token().unwrap_or(self.eof.clone());
  }

  fn next_token(&mut self) -> Option<Token> {
    if self.halted {
      return None;
    }

    while let Some(kind) = self.inner.next() {
      let lexeme = self.inner.slice();
      let span: Span = self.inner.span().into();

      match kind {
        // Filter
        Ok(TokenKind::_Tok_Whitespace | TokenKind::_Tok_Comment) => continue,
        // Measure indentation
        Ok(TokenKind::_Tok_Indent) => {
          self.ws = Some(measure_indent(lexeme));
          continue;
        }
        Ok(TokenKind::_Tok_Tab) => {
          self.fatal("tabulation is illegal, use only spaces", span);
          return None;
        }
        // Return any other token, validating the indentation it begins
        Ok(kind) => {
          let ws = take(&mut self.ws);
          if let Some(n) = ws {
            if n % INDENT_LENGTH != 0 {
              self.fatal(
                format!("expected indentation to be multiple of {INDENT_LENGTH}, got {n} whitespaces"),
                span,
              );
              return None;
            }
          }
          return Some(Token { ws, kind, span });
        }
        Err(_) => {
          if lexeme.contains('\t') {
            self.fatal("tabulation is illegal, use only spaces", span);
            return None;
          }
          let token = Token {
            ws: take(&mut self.ws),
            kind: TokenKind::Tok_Error,
            span,
          };
          return Some(token);
        }
      }
    }

    None
  }

  fn fatal(&mut self, message: impl ToString, span: Span) {
    self.errors.push(Error::new(ErrorKind::Lexical, message, span));
    self.halted = true;
  }
}

#[derive(Clone, Copy, Debug, Logos, PartialEq)]
pub enum TokenKind {
  // Keywords
  #[token("If")]
  Kw_If,
  #[token("Elif")]
  Kw_Elif,
  #[token("Else")]
  Kw_Else,
  #[token("While")]
  Kw_While,
  #[token("True")]
  Kw_True,
  #[token("False")]
  Kw_False,
  #[token("Using")]
  Kw_Using,
  #[token("And")]
  Kw_And,
  #[token("Or")]
  Kw_Or,
  #[token("Not")]
  Kw_Not,
  #[token("Return")]
  Kw_Return,
  #[token("Scope")]
  Kw_Scope,
  #[token("Alias")]
  Kw_Alias,
  #[token("Fun")]
  Kw_Fun,
  #[token("Break")]
  Kw_Break,
  #[token("Continue")]
  Kw_Continue,

  // Misc characters
  #[token(",")]
  Tok_Comma,
  #[token(":")]
  Tok_Colon,
  #[token("(")]
  Brk_ParenL,

  // Operators
  #[token("$")]
  Op_Dollar,
  #[token("::")]
  Op_ColonColon,
  #[token("=")]
  Op_Equal,
  #[token("==")]
  Op_EqualEqual,
  #[token("!")]
  Op_Bang,
  #[token("!=")]
  Op_BangEqual,
  #[token("<")]
  Op_Less,
  #[token("<=")]
  Op_LessEqual,
  #[token(">")]
  Op_More,
  #[token(">=")]
  Op_MoreEqual,
  #[token("-")]
  Op_Minus,
  #[token("+")]
  Op_Plus,
  #[token("*")]
  Op_Star,
  #[token("/")]
  Op_Slash,
  #[token("**")]
  Op_StarStar,

  // Literals
  /// `0`, `1500`, etc.
  #[regex("[0-9]+")]
  Lit_Int,
  /// `x`, `maxEnergy`, `_tmp`, etc.
  #[regex("[a-z_][a-zA-Z0-9_]*")]
  Lit_Ident,
  /// `Int`, `Fork`, `Color`, etc.
  #[regex("[A-Z][a-zA-Z0-9_]*")]
  Lit_PIdent,

  #[doc(hidden)]
  #[regex(r"(\r?\n)+[ ]*", priority = 10)]
  _Tok_Indent,
  /// Mid-line spaces only; a newline always starts an `_Tok_Indent` match,
  /// even behind trailing whitespace.
  #[doc(hidden)]
  #[regex(r"[ ]+")]
  _Tok_Whitespace,
  #[doc(hidden)]
  #[regex(r"#[^\n]*")]
  _Tok_Comment,
  #[doc(hidden)]
  #[token("\t")]
  _Tok_Tab,

  Tok_Error,
  Tok_Eof,
}

impl TokenKind {
  pub fn name(&self) -> &'static str {
    match self {
      TokenKind::Kw_If => "If",
      TokenKind::Kw_Elif => "Elif",
      TokenKind::Kw_Else => "Else",
      TokenKind::Kw_While => "While",
      TokenKind::Kw_True => "True",
      TokenKind::Kw_False => "False",
      TokenKind::Kw_Using => "Using",
      TokenKind::Kw_And => "And",
      TokenKind::Kw_Or => "Or",
      TokenKind::Kw_Not => "Not",
      TokenKind::Kw_Return => "Return",
      TokenKind::Kw_Scope => "Scope",
      TokenKind::Kw_Alias => "Alias",
      TokenKind::Kw_Fun => "Fun",
      TokenKind::Kw_Break => "Break",
      TokenKind::Kw_Continue => "Continue",
      TokenKind::Tok_Comma => ",",
      TokenKind::Tok_Colon => ":",
      TokenKind::Brk_ParenL => "(",
      TokenKind::Op_Dollar => "$",
      TokenKind::Op_ColonColon => "::",
      TokenKind::Op_Equal => "=",
      TokenKind::Op_EqualEqual => "==",
      TokenKind::Op_Bang => "!",
      TokenKind::Op_BangEqual => "!=",
      TokenKind::Op_Less => "<",
      TokenKind::Op_LessEqual => "<=",
      TokenKind::Op_More => ">",
      TokenKind::Op_MoreEqual => ">=",
      TokenKind::Op_Minus => "-",
      TokenKind::Op_Plus => "+",
      TokenKind::Op_Star => "*",
      TokenKind::Op_Slash => "/",
      TokenKind::Op_StarStar => "**",
      TokenKind::Lit_Int => "number",
      TokenKind::Lit_Ident => "identifier",
      TokenKind::Lit_PIdent => "prime identifier",
      TokenKind::_Tok_Indent => "<indentation>",
      TokenKind::_Tok_Whitespace => "<whitespace>",
      TokenKind::_Tok_Comment => "<comment>",
      TokenKind::_Tok_Tab => "<tab>",
      TokenKind::Tok_Error => "illegal token",
      TokenKind::Tok_Eof => "end of file",
    }
  }
}

fn measure_indent(s: &str) -> u64 {
  let pos = s.rfind('\n').unwrap_or(0);
  (s.len() - pos - 1) as u64
}

pub struct Tokens<'src>(pub Lexer<'src>);

impl<'src> Iterator for Tokens<'src> {
  type Item = (&'src str, Token);

  fn next(&mut self) -> Option<Self::Item> {
    let token = self.0.current().clone();
    self.0.bump();
    if !token.is(TokenKind::Tok_Eof) {
      Some((self.0.lexeme(&token), token))
    } else {
      None
    }
  }
}

pub struct DebugToken<'src>(pub Token, pub &'src str);
impl<'src> fmt::Debug for DebugToken<'src> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ws = self
      .0
      .ws
      .map(|v| v.to_string())
      .unwrap_or_else(|| "_".to_owned());
    let kind = self.0.kind;
    let span = self.0.span;
    let lexeme = self.1;
    if let TokenKind::Lit_Ident | TokenKind::Lit_PIdent = self.0.kind {
      write!(f, "(>{ws} {kind:?} `{lexeme}` @{span})")
    } else {
      write!(f, "(>{ws} {kind:?} @{span})")
    }
  }
}
