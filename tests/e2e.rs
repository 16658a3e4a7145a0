use indoc::indoc;
use nilang::{Compiler, ErrorKind, DEFAULT_STACK_SIZE};

#[test]
fn compile_a_full_bot_program() {
  let source = indoc! {"
    # Photosynthesizing bot that forks into free cells.
    Using bot

    Bool hungry = True
    Int threshold = 10

    Fun Refuel$cell Dir:
        Int light = GetLuminosity$cell
        If light > threshold:
            ConsumeSunlight
        Else:
            AbsorbMinerals
        Return

    While hungry:
        Refuel$ dir::front
        If IsEmpty$ dir::front:
            Fork$ dir::front
        hungry = False
    Sleep
  "};

  let compiler = Compiler::new(DEFAULT_STACK_SIZE);
  let code = compiler.compile(source).expect("program should compile");

  // The interesting opcodes all made it into the stream.
  for expected in ["nop", "eatsun", "absorb", "fork front BEGIN", "ret"] {
    assert!(
      code.lines().any(|line| line == expected),
      "missing `{expected}` in:\n{code}"
    );
  }

  // The stream is well-formed: label definitions are unique and every
  // jump or call target is defined.
  let mut defined = std::collections::HashMap::new();
  for line in code.lines() {
    if let Some(name) = line.strip_suffix(':') {
      *defined.entry(name.to_string()).or_insert(0usize) += 1;
    }
  }
  assert!(defined.values().all(|count| *count == 1));
  for line in code.lines() {
    let mut parts = line.split_whitespace();
    match parts.next().unwrap() {
      "jmp" | "jme" | "jne" | "jml" | "jmg" | "jle" | "jge" | "jmf" | "jmb" | "jmc" | "call" => {
        let target = parts.next().unwrap();
        assert!(defined.contains_key(target), "undefined label {target}");
      }
      "fork" | "split" => {
        let target = parts.nth(1).unwrap();
        assert!(defined.contains_key(target), "undefined label {target}");
      }
      _ => {}
    }
  }

  // Compilation is a pure function of its input.
  assert_eq!(code, compiler.compile(source).unwrap());
}

#[test]
fn diagnostics_carry_locations_and_poison_the_output() {
  let source = "Using bot\nInt x = True\n";
  let errors = Compiler::new(DEFAULT_STACK_SIZE)
    .compile(source)
    .expect_err("expected a type error");

  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].report("bot.nil", source),
    "Int x = True\n\
     --------^---\n\
     bot.nil:2:8: unexpected type of expression: variable=Int, expression=Bool"
  );
}

#[test]
fn parse_errors_halt_before_code_generation() {
  let source = "While True:\nBreak\n";
  let errors = Compiler::new(DEFAULT_STACK_SIZE)
    .compile(source)
    .expect_err("expected a parse error");
  assert_eq!(errors[0].kind, ErrorKind::Parse);
}
