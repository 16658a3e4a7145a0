use std::collections::HashMap;

use indoc::indoc;

use super::*;
use crate::error::ErrorKind;
use crate::syntax;

const STACK: usize = 128;

fn compile(src: &str) -> Result<String, Vec<Error>> {
  let program = syntax::parse(src)?;
  emit(&program, STACK)
}

/// The emitted stream after the `BEGIN:` entry label, i.e. without the
/// direction-constant preamble.
fn script(src: &str) -> String {
  match compile(src) {
    Ok(code) => code
      .split_once("BEGIN:\n")
      .expect("missing entry label")
      .1
      .to_string(),
    Err(errors) => {
      for error in &errors {
        eprintln!("{}", error.report("test.nil", src));
      }
      panic!("failed to compile source, see errors above")
    }
  }
}

fn errors(src: &str) -> Vec<Error> {
  compile(src).expect_err("expected compilation to fail")
}

macro_rules! check {
  ($name:ident, $input:literal, $expected:literal) => {
    #[test]
    fn $name() {
      assert_eq!(script(indoc!($input)), indoc!($expected));
    }
  };
}

check! {
  declaration_stores_into_durable_memory,
  "
  Int x = 5
  ",
  "
  ldv AX 5
  ldr 137 AX
  "
}

check! {
  boolean_negation,
  "
  Bool b = Not True
  ",
  "
  ldv AX 1
  cmpv AX 1
  jme label1
  ldv AX 1
  jmp label2
  label1:
  ldv AX 0
  label2:
  ldr 137 AX
  "
}

check! {
  comparison_spills_the_left_operand,
  "
  Bool b = 1 == 2
  ",
  "
  ldv AX 1
  ldr 0 AX
  ldv AX 2
  ld BX AX
  ldm AX 0
  cmp AX BX
  jme label1
  ldv AX 0
  jmp label2
  label1:
  ldv AX 1
  label2:
  ldr 137 AX
  "
}

check! {
  conjunction_evaluates_both_sides,
  "
  Bool b = True And False
  ",
  "
  ldv AX 1
  ldr 0 AX
  ldv AX 0
  ld BX AX
  ldm AX 0
  cmpv AX 0
  jme label1
  cmpv BX 0
  jme label1
  ldv AX 1
  jmp label2
  label1:
  ldv AX 0
  label2:
  ldr 137 AX
  "
}

check! {
  disjunction_evaluates_both_sides,
  "
  Bool b = False Or True
  ",
  "
  ldv AX 0
  ldr 0 AX
  ldv AX 1
  ld BX AX
  ldm AX 0
  cmpv AX 1
  jme label1
  cmpv BX 1
  jme label1
  ldv AX 0
  jmp label2
  label1:
  ldv AX 1
  label2:
  ldr 137 AX
  "
}

check! {
  while_loop_with_break,
  "
  While True:
      Break
  ",
  "
  label1:
  ldv AX 1
  cmpv AX 1
  jne label2
  jmp label1
  jmp label1
  label2:
  "
}

check! {
  nested_loops_resolve_the_nearest_labels,
  "
  While True:
      While True:
          Break
      Continue
  ",
  "
  label1:
  ldv AX 1
  cmpv AX 1
  jne label2
  label3:
  ldv AX 1
  cmpv AX 1
  jne label4
  jmp label3
  jmp label3
  label4:
  jmp label2
  jmp label1
  label2:
  "
}

check! {
  while_loop_reloads_its_condition,
  "
  Bool hungry = True
  While hungry:
      hungry = False
  ",
  "
  ldv AX 1
  ldr 137 AX
  label1:
  ldm AX 137
  cmpv AX 1
  jne label2
  ldv AX 0
  ldr 137 AX
  jmp label1
  label2:
  "
}

check! {
  function_definition_and_call,
  "
  Fun Add::Int$a Int, b Int:
      Return a
  Int r = Add$1, 2
  ",
  "
  jmp label2
  label1:
  ldm AX 137
  ld AX AX
  ret
  label2:
  ldv AX 1
  ldr 137 AX
  ldv AX 2
  ldr 138 AX
  call label1
  ldr 139 AX
  "
}

check! {
  void_function_gets_an_implicit_return,
  "
  Using bot
  Fun Ping:
      Sleep
  Ping
  ",
  "
  jmp label2
  label1:
  nop
  ret
  label2:
  call label1
  "
}

check! {
  if_elif_else_chain,
  "
  Int x = 1
  If x == 1:
      x = 2
  Elif x == 2:
      x = 3
  Else:
      x = 4
  ",
  "
  ldv AX 1
  ldr 137 AX
  ldm AX 137
  ldr 0 AX
  ldv AX 1
  ld BX AX
  ldm AX 0
  cmp AX BX
  jme label3
  ldv AX 0
  jmp label4
  label3:
  ldv AX 1
  label4:
  cmpv AX 1
  jne label2
  ldv AX 2
  ldr 137 AX
  jmp label1
  label2:
  ldm AX 137
  ldr 1 AX
  ldv AX 2
  ld BX AX
  ldm AX 1
  cmp AX BX
  jme label6
  ldv AX 0
  jmp label7
  label6:
  ldv AX 1
  label7:
  cmpv AX 1
  jne label5
  ldv AX 3
  ldr 137 AX
  jmp label1
  label5:
  ldv AX 4
  ldr 137 AX
  label1:
  "
}

check! {
  qualified_builtin_call,
  "
  Using bot
  bot::Sleep
  ",
  "
  nop
  "
}

check! {
  zero_argument_builtins,
  "
  Using bot
  ConsumeSunlight
  AbsorbMinerals
  Sleep
  ",
  "
  eatsun
  absorb
  nop
  "
}

check! {
  direction_dispatch_covers_all_eight_arms,
  "
  Using bot
  Move$ dir::front
  ",
  "
  ldm AX 129
  cmpv AX 1
  jme label1
  cmpv AX 2
  jme label2
  cmpv AX 3
  jme label3
  cmpv AX 4
  jme label4
  cmpv AX 5
  jme label5
  cmpv AX 6
  jme label6
  cmpv AX 7
  jme label7
  cmpv AX 8
  jme label8
  label1:
  mov front
  jmp label9
  label2:
  mov frontright
  jmp label9
  label3:
  mov right
  jmp label9
  label4:
  mov backright
  jmp label9
  label5:
  mov back
  jmp label9
  label6:
  mov backleft
  jmp label9
  label7:
  mov left
  jmp label9
  label8:
  mov frontleft
  jmp label9
  label9:
  "
}

check! {
  face_lowers_to_rot,
  "
  Using bot
  Face$ dir::left
  ",
  "
  ldm AX 135
  cmpv AX 1
  jme label1
  cmpv AX 2
  jme label2
  cmpv AX 3
  jme label3
  cmpv AX 4
  jme label4
  cmpv AX 5
  jme label5
  cmpv AX 6
  jme label6
  cmpv AX 7
  jme label7
  cmpv AX 8
  jme label8
  label1:
  rot front
  jmp label9
  label2:
  rot frontright
  jmp label9
  label3:
  rot right
  jmp label9
  label4:
  rot backright
  jmp label9
  label5:
  rot back
  jmp label9
  label6:
  rot backleft
  jmp label9
  label7:
  rot left
  jmp label9
  label8:
  rot frontleft
  jmp label9
  label9:
  "
}

check! {
  alias_constants_and_qualified_access,
  "
  Alias Color::Int:
      red = 1
      green = 2
  Color c = color::red
  ",
  "
  ldv AX 1
  ldr 137 AX
  ldv AX 2
  ldr 138 AX
  ldm AX 137
  ldr 139 AX
  "
}

check! {
  using_makes_scope_variables_visible,
  "
  Scope farm:
      Int count = 0
  Using farm
  Int total = count
  ",
  "
  ldv AX 0
  ldr 137 AX
  ldm AX 137
  ldr 138 AX
  "
}

#[test]
fn direction_constants_are_seeded_before_the_entry_label() {
  let code = compile("Int x = 5\n").unwrap();
  let (preamble, _) = code.split_once("BEGIN:\n").unwrap();
  let expected: String = (0..=8)
    .map(|value| format!("ldv AX {value}\nldr {} AX\n", STACK + value))
    .collect();
  assert_eq!(preamble, expected);
}

#[test]
fn fork_and_split_reference_the_entry_label() {
  let code = compile("Using bot\nFork$ dir::front\nSplit$ dir::back\n").unwrap();
  assert!(code.lines().any(|line| line == "fork front BEGIN"));
  assert!(code.lines().any(|line| line == "split back BEGIN"));
  // The entry label referenced by both is defined exactly once.
  assert_eq!(code.lines().filter(|line| *line == "BEGIN:").count(), 1);
}

#[test]
fn sensor_builtins_materialize_flags_and_registers() {
  let empty = script("Using bot\nBool e = IsEmpty$ dir::left\n");
  assert!(empty.lines().any(|line| line == "chk left"));
  assert!(empty.lines().any(|line| line.starts_with("jmf ")));
  assert!(empty.ends_with("ldr 137 AX\n"));

  let sibling = script("Using bot\nBool s = IsSibling$ dir::front\n");
  assert!(sibling.lines().any(|line| line.starts_with("jmb ")));

  let friend = script("Using bot\nBool f = IsFriend$ dir::front\n");
  assert!(friend.lines().any(|line| line.starts_with("jmc ")));

  let light = script("Using bot\nInt l = GetLuminosity$ dir::front\n");
  assert!(light.lines().any(|line| line == "ld AX SD"));

  let minerals = script("Using bot\nInt m = GetMineralization$ dir::front\n");
  assert!(minerals.lines().any(|line| line == "ld AX MD"));
}

#[test]
fn compiling_twice_yields_identical_output() {
  let src = indoc! {"
    Using bot
    Bool hungry = True
    Fun Refuel$cell Dir:
        If GetLuminosity$cell > 10:
            ConsumeSunlight
        Else:
            AbsorbMinerals
        Return
    While hungry:
        Refuel$ dir::front
        hungry = False
  "};
  assert_eq!(compile(src).unwrap(), compile(src).unwrap());
}

#[test]
fn every_jump_and_call_target_is_defined_exactly_once() {
  let src = indoc! {"
    Using bot
    Bool hungry = True
    Fun Refuel$cell Dir:
        If GetLuminosity$cell > 10:
            ConsumeSunlight
        Else:
            AbsorbMinerals
        Return
    While hungry:
        Refuel$ dir::front
        If IsEmpty$ dir::front:
            Fork$ dir::front
        hungry = False
  "};
  let code = compile(src).unwrap();

  let mut defined: HashMap<&str, usize> = HashMap::new();
  let mut referenced = vec![];
  for line in code.lines() {
    if let Some(name) = line.strip_suffix(':') {
      *defined.entry(name).or_insert(0) += 1;
    } else {
      let mut parts = line.split_whitespace();
      match parts.next().unwrap() {
        "jmp" | "jme" | "jne" | "jml" | "jmg" | "jle" | "jge" | "jmf" | "jmb" | "jmc"
        | "call" => referenced.push(parts.next().unwrap()),
        "fork" | "split" => referenced.push(parts.nth(1).unwrap()),
        _ => {}
      }
    }
  }

  for (name, count) in &defined {
    assert_eq!(*count, 1, "label {name} defined {count} times");
  }
  for name in referenced {
    assert_eq!(defined.get(name), Some(&1), "label {name} is undefined");
  }
}

#[test]
fn addresses_stay_in_their_pools() {
  let code = compile("Bool b = 1 == 2\n").unwrap();
  let mut scratch = vec![];
  let mut durable = vec![];
  for line in code.lines() {
    let mut parts = line.split_whitespace();
    let addr = match parts.next().unwrap() {
      "ldr" => parts.next().unwrap().parse::<usize>().unwrap(),
      "ldm" => parts.nth(1).unwrap().parse::<usize>().unwrap(),
      _ => continue,
    };
    if addr < STACK {
      scratch.push(addr);
    } else {
      durable.push(addr);
    }
  }
  assert_eq!(scratch, vec![0, 0]);
  // Nine direction constants, then `b`.
  assert_eq!(durable.len(), 10);
  assert!(durable.iter().all(|addr| *addr >= STACK));
}

#[test]
fn scratch_cursor_resets_between_top_level_statements() {
  let code = script("Bool a = 1 == 2\nBool b = 3 == 4\n");
  // Both comparisons spill into scratch slot 0.
  assert_eq!(code.lines().filter(|line| *line == "ldr 0 AX").count(), 2);
  assert!(!code.contains("ldr 1 AX"));
}

#[test]
fn scratch_overflow_is_fatal() {
  let program = syntax::parse("Bool b = 1 == 2 == 3\n").unwrap();
  let errors = emit(&program, 1).unwrap_err();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind, ErrorKind::Internal);
  assert_eq!(errors[0].message, "stack overflow");
}

#[test]
fn declared_type_must_match_the_expression() {
  let errors = errors("Int x = True\n");
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of expression: variable=Int, expression=Bool"
  );
}

#[test]
fn redeclaration_reports_exactly_one_error() {
  let errors = errors("Int x = 5\nInt x = 6\n");
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind, ErrorKind::Name);
  assert_eq!(
    errors[0].message,
    "variable x is already declared in this scope"
  );
}

#[test]
fn if_condition_must_be_bool() {
  let errors = errors("If 1:\n    Int y = 2\n");
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of expression: expected=Bool, got=Int"
  );
}

#[test]
fn while_condition_must_be_bool() {
  let errors = errors("While 1:\n    Break\n");
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of expression: expected=Bool, got=Int"
  );
}

#[test]
fn comparison_operands_must_be_int() {
  let errors = errors("Bool b = True < False\n");
  assert_eq!(errors.len(), 2);
  assert!(errors.iter().all(|e| {
    e.kind == ErrorKind::Type
      && e.message == "unexpected type of expression: expected=Int, got=Bool"
  }));
}

#[test]
fn call_arity_is_checked() {
  let errors = errors("Fun Go$a Int:\n    Return\nGo$1, 2\n");
  assert_eq!(errors[0].kind, ErrorKind::Arity);
  assert_eq!(
    errors[0].message,
    "unexpected number of arguments expected=1, got=2"
  );
}

#[test]
fn builtin_arity_is_checked() {
  let errors = errors("Using bot\nSleep$1\n");
  assert_eq!(errors[0].kind, ErrorKind::Arity);
  assert_eq!(
    errors[0].message,
    "unexpected number of arguments expected=0, got=1"
  );
}

#[test]
fn builtin_direction_argument_must_be_dir() {
  let errors = errors("Using bot\nMove$ 5\n");
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of an argument expected=Dir, got=Int"
  );
}

#[test]
fn break_and_continue_require_a_loop() {
  let break_errors = errors("Break\n");
  assert_eq!(break_errors[0].kind, ErrorKind::Control);
  assert_eq!(break_errors[0].message, "break outside of loop");

  let continue_errors = errors("Continue\n");
  assert_eq!(continue_errors[0].kind, ErrorKind::Control);
  assert_eq!(continue_errors[0].message, "continue outside of loop");
}

#[test]
fn return_requires_a_function() {
  let errors = errors("Return 5\n");
  assert_eq!(errors[0].kind, ErrorKind::Control);
  assert_eq!(errors[0].message, "return outside of function");
}

#[test]
fn non_void_function_requires_a_top_level_return() {
  let errors = errors("Fun Get::Int:\n    Int x = 5\n");
  assert_eq!(errors[0].kind, ErrorKind::Control);
  assert_eq!(errors[0].message, "expected return statement");
}

#[test]
fn return_inside_a_branch_does_not_cover_the_function() {
  let errors = errors("Fun Get::Int:\n    If True:\n        Return 1\n");
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind, ErrorKind::Control);
  assert_eq!(errors[0].message, "expected return statement");
}

#[test]
fn return_value_type_must_match() {
  let errors = errors("Fun Get::Int:\n    Return True\n");
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of return value: expected=Int, got=Bool"
  );
}

#[test]
fn undeclared_names_are_reported() {
  let variable = errors("Int x = y\n");
  assert_eq!(variable[0].kind, ErrorKind::Name);
  assert_eq!(variable[0].message, "undeclared variable y");

  let function = errors("Jump\n");
  assert_eq!(function[0].kind, ErrorKind::Name);
  assert_eq!(function[0].message, "undeclared function Jump");

  let scope = errors("Using farm\n");
  assert_eq!(scope[0].kind, ErrorKind::Name);
  assert_eq!(scope[0].message, "unknown scope farm");

  let ty = errors("Foo x = 5\n");
  assert_eq!(ty[0].kind, ErrorKind::Name);
  assert_eq!(ty[0].message, "unknown type Foo");
}

#[test]
fn alias_must_use_a_primitive_underlying_type() {
  let errors = errors("Alias Color::Dir:\n    a = 1\n");
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "alias must be of type Int or Bool, got Dir"
  );
}

#[test]
fn alias_entries_must_match_the_underlying_type() {
  let errors = errors("Alias Flag::Bool:\n    on = 1\n");
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of expression: variable=Bool, expression=Int"
  );
}

#[test]
fn alias_type_does_not_unify_with_its_primitive() {
  let errors = errors("Alias Color::Int:\n    red = 1\nInt x = color::red\n");
  assert_eq!(errors[0].kind, ErrorKind::Type);
  assert_eq!(
    errors[0].message,
    "unexpected type of expression: variable=Int, expression=Color"
  );
}

#[test]
fn unary_minus_is_diagnosed_not_miscompiled() {
  let errors = errors("Int x = -1\n");
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].message, "unary minus is not implemented");
}
