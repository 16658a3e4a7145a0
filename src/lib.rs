//! Compiler for NiLang, a small statically typed, indentation-structured
//! language describing the behavior of an autonomous bot.
//!
//! The pipeline is single-pass and synchronous: bytes go through the
//! [`syntax`] lexer and parser into an AST, and [`emit`] lowers the AST to
//! a textual instruction stream for the bot VM while type checking along
//! the way. Parse errors halt the pipeline before lowering; semantic
//! errors accumulate and poison the output.
//!
//! ```
//! let compiler = nilang::Compiler::new(nilang::DEFAULT_STACK_SIZE);
//! let code = compiler.compile("Using bot\nSleep\n").unwrap();
//! assert!(code.lines().any(|line| line == "nop"));
//! ```

pub mod emit;
pub mod error;
pub mod span;
pub mod syntax;

pub use error::{Error, ErrorKind};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the scratch stack region, in addresses. Durable variable
/// storage starts past it.
pub const DEFAULT_STACK_SIZE: usize = 128;

pub struct Compiler {
  stack_size: usize,
}

impl Compiler {
  pub fn new(stack_size: usize) -> Self {
    Self { stack_size }
  }

  /// Compile a source buffer into the textual instruction stream.
  ///
  /// On failure the diagnostics come back in source order, lexical ones
  /// first; any emitted text from a failed compilation is discarded.
  pub fn compile(&self, src: &str) -> Result<String, Vec<Error>> {
    let program = syntax::parse(src)?;
    emit::emit(&program, self.stack_size)
  }
}

impl Default for Compiler {
  fn default() -> Self {
    Self::new(DEFAULT_STACK_SIZE)
  }
}
