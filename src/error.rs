//! Compile diagnostics.
//!
//! Diagnostics accumulate in a list while the pipeline runs; only
//! [`ErrorKind::Internal`] aborts a stage outright. Rendering recovers the
//! 1-based line and 0-based byte column from the span, so the error value
//! itself stays a plain `(kind, message, span)` triple.

use std::error::Error as StdError;
use std::fmt::{Display, Write};

use crate::span::Span;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// Bad indentation, tabs, stray characters.
  Lexical,
  /// Unexpected token in an expected slot.
  Parse,
  /// Operand or declaration type mismatch.
  Type,
  /// Unresolved or redeclared name.
  Name,
  /// Misplaced `Break`/`Continue`/`Return`, missing `Return`.
  Control,
  /// Wrong number of call arguments.
  Arity,
  /// Unrecoverable compiler-level failure, e.g. scratch stack overflow.
  Internal,
}

#[derive(Clone, Debug)]
pub struct Error {
  pub kind: ErrorKind,
  pub message: String,
  pub span: Span,
}

impl Error {
  pub fn new(kind: ErrorKind, message: impl ToString, span: impl Into<Span>) -> Self {
    Self {
      kind,
      message: message.to_string(),
      span: span.into(),
    }
  }

  /// 1-based source line of the error.
  pub fn line(&self, src: &str) -> usize {
    let start = self.span.start.min(src.len());
    1 + src[..start].matches('\n').count()
  }

  /// 0-based byte column of the error within its line.
  pub fn offset(&self, src: &str) -> usize {
    let start = self.span.start.min(src.len());
    start - line_start(src, start)
  }

  /// Render the diagnostic in the compiler's three-line format:
  /// the offending source line, a dashed pointer line with a caret under
  /// the error column, and `path:line:offset: description`.
  pub fn report(&self, path: &str, src: &str) -> String {
    let start = self.span.start.min(src.len());
    let line_start = line_start(src, start);
    let line_end = src[start..]
      .find('\n')
      .map(|v| v + start)
      .unwrap_or(src.len());
    let line = &src[line_start..line_end];
    let offset = start - line_start;

    let mut pointer: String = "-".repeat(line.len());
    if offset < pointer.len() {
      pointer.replace_range(offset..offset + 1, "^");
    }

    let mut out = String::new();
    writeln!(out, "{line}").unwrap();
    writeln!(out, "{pointer}").unwrap();
    write!(
      out,
      "{path}:{}:{}: {}",
      self.line(src),
      offset,
      self.message
    )
    .unwrap();
    out
  }
}

fn line_start(src: &str, pos: usize) -> usize {
  src[..pos].rfind('\n').map(|v| v + 1).unwrap_or(0)
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "error at {}: {}", self.span, self.message)
  }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
