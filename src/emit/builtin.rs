//! The `bot` intrinsics and the `dir` constant scope.
//!
//! Direction-taking intrinsics compile into an eight-way `cmpv`/`jme`
//! dispatch whose arms emit the opcode with the direction spelled out as a
//! word; the VM resolves words, not register values. Sensor intrinsics
//! point the sensors with `chk` and then either materialize a flag into a
//! boolean or read a sensor register.

use super::instruction::Instruction::*;
use super::*;
use crate::error::ErrorKind;

/// `(name, number of arguments)` of every intrinsic in the `bot` scope.
const BUILTINS: [(&str, usize); 13] = [
  ("Fork", 1),
  ("Split", 1),
  ("Bite", 1),
  ("ConsumeSunlight", 0),
  ("AbsorbMinerals", 0),
  ("IsEmpty", 1),
  ("IsSibling", 1),
  ("IsFriend", 1),
  ("GetLuminosity", 1),
  ("GetMineralization", 1),
  ("Sleep", 0),
  ("Move", 1),
  ("Face", 1),
];

/// Constant names in the `dir` scope, by value 0..=8.
const DIRECTIONS: [&str; 9] = [
  "_",
  "front",
  "frontRight",
  "right",
  "backRight",
  "back",
  "backLeft",
  "left",
  "frontLeft",
];

enum DirectionOp {
  Mov,
  Rot,
  Bite,
  Chk,
  Fork,
  Split,
}

impl State {
  /// Seed the global scope with the `bot` function scope and the `dir`
  /// constant scope, emitting the constant initialization stores.
  pub(super) fn init_builtin(&mut self) {
    let root = self.scopes.root();

    let (bot, _) = self.scopes.add_scope(root, "bot");
    for (name, arity) in BUILTINS {
      self.scopes.add_function(
        bot,
        Function {
          name: name.into(),
          label: String::new(),
          // Sentinel; builtin calls bypass the regular return-type path.
          ret: Type::void(),
          params: vec![
            Variable {
              name: String::new(),
              addr: 0,
              ty: Type::builtin(scope::DIR),
            };
            arity
          ],
          is_builtin: true,
        },
      );
    }

    let (dir, _) = self.scopes.add_scope(root, "dir");
    for (value, name) in DIRECTIONS.iter().enumerate() {
      let addr = self.alloc_mem();
      self.scopes.add_variable(
        dir,
        Variable {
          name: (*name).into(),
          addr,
          ty: Type::builtin(scope::DIR),
        },
      );
      self.emit_op(Ldv(Reg::Ax, value as i64));
      self.emit_op(Ldr(addr, Reg::Ax));
    }
  }

  pub(super) fn emit_builtin(
    &mut self,
    name: &str,
    args: &[ast::Expr<'_>],
    span: Span,
  ) -> Result<(Type, Option<Reg>), Error> {
    match name {
      "Fork" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Fork, reg);
        Ok((Type::void(), None))
      }
      "Split" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Split, reg);
        Ok((Type::void(), None))
      }
      "Bite" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Bite, reg);
        Ok((Type::void(), None))
      }
      "Move" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Mov, reg);
        Ok((Type::void(), None))
      }
      "Face" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Rot, reg);
        Ok((Type::void(), None))
      }
      "IsEmpty" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Chk, reg);
        Ok(self.emit_flag_compare(Jmf))
      }
      "IsSibling" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Chk, reg);
        Ok(self.emit_flag_compare(Jmb))
      }
      "IsFriend" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Chk, reg);
        Ok(self.emit_flag_compare(Jmc))
      }
      "GetLuminosity" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Chk, reg);
        self.emit_op(Ld(Reg::Ax, Reg::Sd));
        Ok((Type::builtin(scope::INT), Some(Reg::Ax)))
      }
      "GetMineralization" => {
        let reg = self.direction_arg(args, span)?;
        self.direction_dispatch(DirectionOp::Chk, reg);
        self.emit_op(Ld(Reg::Ax, Reg::Md));
        Ok((Type::builtin(scope::INT), Some(Reg::Ax)))
      }
      "Sleep" => {
        self.check_arity(args, 0, span);
        self.emit_op(Nop);
        Ok((Type::void(), None))
      }
      "ConsumeSunlight" => {
        self.check_arity(args, 0, span);
        self.emit_op(Eatsun);
        Ok((Type::void(), None))
      }
      "AbsorbMinerals" => {
        self.check_arity(args, 0, span);
        self.emit_op(Absorb);
        Ok((Type::void(), None))
      }
      _ => Err(Error::new(
        ErrorKind::Internal,
        format!("builtin function {name} is not handled"),
        span,
      )),
    }
  }

  fn check_arity(&mut self, args: &[ast::Expr<'_>], expected: usize, span: Span) -> bool {
    if args.len() != expected {
      self.error(
        ErrorKind::Arity,
        format!(
          "unexpected number of arguments expected={expected}, got={}",
          args.len()
        ),
        span,
      );
      return false;
    }
    true
  }

  /// Compile the single `Dir` argument of a direction-taking intrinsic.
  fn direction_arg(
    &mut self,
    args: &[ast::Expr<'_>],
    span: Span,
  ) -> Result<Option<Reg>, Error> {
    if !self.check_arity(args, 1, span) {
      return Ok(None);
    }
    let (ty, reg) = self.emit_expr(&args[0])?;
    if ty != Type::builtin(scope::DIR) {
      self.error(
        ErrorKind::Type,
        format!(
          "unexpected type of an argument expected={}, got={ty}",
          scope::DIR
        ),
        args[0].span,
      );
    }
    Ok(reg)
  }

  fn direction_dispatch(&mut self, op: DirectionOp, reg: Option<Reg>) {
    let Some(reg) = reg else { return };

    let mut arms = Vec::with_capacity(Direction::ALL.len());
    for direction in Direction::ALL {
      self.emit_op(Cmpv(reg, direction.value()));
      let label = self.next_label();
      self.emit_op(Jme(label.clone()));
      arms.push((direction, label));
    }

    let end = self.next_label();
    for (direction, label) in arms {
      self.emit_op(Label(label));
      let instruction = match op {
        DirectionOp::Mov => Mov(direction),
        DirectionOp::Rot => Rot(direction),
        DirectionOp::Bite => Bite(direction),
        DirectionOp::Chk => Chk(direction),
        DirectionOp::Fork => Fork(direction, BEGIN_LABEL.into()),
        DirectionOp::Split => Split(direction, BEGIN_LABEL.into()),
      };
      self.emit_op(instruction);
      self.emit_op(Jmp(end.clone()));
    }
    self.emit_op(Label(end));
  }

  /// Materialize a sensor flag into a boolean in `AX`.
  fn emit_flag_compare(&mut self, jump: fn(String) -> Instruction) -> (Type, Option<Reg>) {
    let truthy = self.next_label();
    let end = self.next_label();

    self.emit_op(jump(truthy.clone()));
    self.emit_op(Ldv(Reg::Ax, 0));
    self.emit_op(Jmp(end.clone()));
    self.emit_op(Label(truthy));
    self.emit_op(Ldv(Reg::Ax, 1));
    self.emit_op(Label(end));

    (Type::builtin(scope::BOOL), Some(Reg::Ax))
  }
}
