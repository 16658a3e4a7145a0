use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{debug, LevelFilter};
use nilang::Compiler;

#[derive(Debug, Parser)]
#[clap(name = "nilc", version = nilang::VERSION)]
pub struct App {
  /// Source file to compile.
  file: PathBuf,

  /// Scratch stack size, in addresses.
  #[clap(short = 's', long = "stack-size", default_value_t = nilang::DEFAULT_STACK_SIZE)]
  stack_size: usize,

  /// Output path.
  #[clap(short = 'o', long = "output", default_value = "bot.tor")]
  output: PathBuf,

  /// Print the parsed program before compiling.
  #[clap(long = "ast")]
  ast: bool,

  /// Log compilation details.
  #[clap(short, long)]
  verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
  let app = App::parse();

  simple_logger::SimpleLogger::new()
    .with_level(if app.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Warn
    })
    .init()?;

  let path = app.file.display().to_string();
  let source = fs::read_to_string(&app.file).with_context(|| format!("failed to read {path}"))?;

  if app.ast {
    if let Ok(program) = nilang::syntax::parse(&source) {
      println!("{program}");
    }
  }

  let compiler = Compiler::new(app.stack_size);
  match compiler.compile(&source) {
    Ok(code) => {
      debug!(
        "compiled {} lines of instructions from {path}",
        code.lines().count()
      );
      fs::write(&app.output, code)
        .with_context(|| format!("failed to write {}", app.output.display()))?;
      Ok(ExitCode::SUCCESS)
    }
    Err(errors) => {
      // Diagnostics go to stdout and no output is written; the process
      // still exits successfully.
      for error in &errors {
        println!("{}", error.report(&path, &source));
      }
      debug!("aborted with {} errors, no output written", errors.len());
      Ok(ExitCode::SUCCESS)
    }
  }
}
