//! The textual target language: registers, directions and instructions.
//!
//! The output format is a newline-separated stream where each record is
//! either a label definition (`name:`) or an instruction (`op arg…`).
//! Booleans are serialized as `1`/`0`, addresses as bare integers, and
//! directions as lowercase words.

use std::fmt::{self, Display};

/// Entry point of the compiled program. `fork`/`split` reference it so a
/// spawned bot starts at the main script, skipping constant initialization.
pub const BEGIN_LABEL: &str = "BEGIN";

/// Memory address, scratch (`< stack_size`) or durable (`>= stack_size`).
pub type Addr = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
  Ax,
  Bx,
  Cx,
  Dx,
  /// Sunlight sensor read-out.
  Sd,
  /// Mineralization sensor read-out.
  Md,
  /// Energy read-out.
  En,
  /// Age read-out.
  Ag,
}

impl Display for Reg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Reg::Ax => "AX",
      Reg::Bx => "BX",
      Reg::Cx => "CX",
      Reg::Dx => "DX",
      Reg::Sd => "SD",
      Reg::Md => "MD",
      Reg::En => "EN",
      Reg::Ag => "AG",
    })
  }
}

/// The eight directions a bot can act in, in dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
  Front = 1,
  FrontRight = 2,
  Right = 3,
  BackRight = 4,
  Back = 5,
  BackLeft = 6,
  Left = 7,
  FrontLeft = 8,
}

impl Direction {
  pub const ALL: [Direction; 8] = [
    Direction::Front,
    Direction::FrontRight,
    Direction::Right,
    Direction::BackRight,
    Direction::Back,
    Direction::BackLeft,
    Direction::Left,
    Direction::FrontLeft,
  ];

  /// The operand word emitted into instructions.
  pub fn word(&self) -> &'static str {
    match self {
      Direction::Front => "front",
      Direction::FrontRight => "frontright",
      Direction::Right => "right",
      Direction::BackRight => "backright",
      Direction::Back => "back",
      Direction::BackLeft => "backleft",
      Direction::Left => "left",
      Direction::FrontLeft => "frontleft",
    }
  }

  pub fn value(&self) -> i64 {
    *self as i64
  }
}

impl Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.word())
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
  /// `name:` — a label definition.
  Label(String),

  /// `ldv dst val` — load an immediate into a register.
  Ldv(Reg, i64),
  /// `ld dst src` — register-to-register move.
  Ld(Reg, Reg),
  /// `ldr mem src` — store a register into memory.
  Ldr(Addr, Reg),
  /// `ldm dst mem` — load memory into a register.
  Ldm(Reg, Addr),

  /// `cmp a b` — set flags from a register pair.
  Cmp(Reg, Reg),
  /// `cmpv a val` — set flags from a register and an immediate.
  Cmpv(Reg, i64),

  Jmp(String),
  /// Jump if equal.
  Jme(String),
  /// Jump if not equal.
  Jne(String),
  /// Jump if less.
  Jml(String),
  /// Jump if greater.
  Jmg(String),
  /// Jump if less or equal.
  Jle(String),
  /// Jump if greater or equal.
  Jge(String),
  /// Jump if the checked cell is empty.
  Jmf(String),
  /// Jump if the checked cell holds a sibling.
  Jmb(String),
  /// Jump if the checked cell holds a friend.
  Jmc(String),

  Call(String),
  Ret,

  Mov(Direction),
  Rot(Direction),
  Bite(Direction),
  /// Point the sensors at a cell.
  Chk(Direction),
  Fork(Direction, String),
  Split(Direction, String),
  Eatsun,
  Absorb,
  Nop,
}

impl Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use Instruction::*;
    match self {
      Label(name) => write!(f, "{name}:"),
      Ldv(dst, val) => write!(f, "ldv {dst} {val}"),
      Ld(dst, src) => write!(f, "ld {dst} {src}"),
      Ldr(mem, src) => write!(f, "ldr {mem} {src}"),
      Ldm(dst, mem) => write!(f, "ldm {dst} {mem}"),
      Cmp(a, b) => write!(f, "cmp {a} {b}"),
      Cmpv(a, val) => write!(f, "cmpv {a} {val}"),
      Jmp(l) => write!(f, "jmp {l}"),
      Jme(l) => write!(f, "jme {l}"),
      Jne(l) => write!(f, "jne {l}"),
      Jml(l) => write!(f, "jml {l}"),
      Jmg(l) => write!(f, "jmg {l}"),
      Jle(l) => write!(f, "jle {l}"),
      Jge(l) => write!(f, "jge {l}"),
      Jmf(l) => write!(f, "jmf {l}"),
      Jmb(l) => write!(f, "jmb {l}"),
      Jmc(l) => write!(f, "jmc {l}"),
      Call(l) => write!(f, "call {l}"),
      Ret => write!(f, "ret"),
      Mov(d) => write!(f, "mov {d}"),
      Rot(d) => write!(f, "rot {d}"),
      Bite(d) => write!(f, "bite {d}"),
      Chk(d) => write!(f, "chk {d}"),
      Fork(d, entry) => write!(f, "fork {d} {entry}"),
      Split(d, entry) => write!(f, "split {d} {entry}"),
      Eatsun => write!(f, "eatsun"),
      Absorb => write!(f, "absorb"),
      Nop => write!(f, "nop"),
    }
  }
}
