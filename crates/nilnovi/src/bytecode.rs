//! Instruction set and instruction-stream container.
//!
//! This module defines the opcodes the compiler produces and the VM
//! executes, together with the textual wire format the two stages
//! communicate through: one instruction per line, `opname(p1,p2)`, with
//! comma-separated decimal operands and `opname()` for operand-less
//! opcodes. Instruction addresses are 1-based everywhere — the first
//! instruction of a program is address 1 — and every emitted branch target
//! uses that convention.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A single stack-machine instruction.
///
/// Opcode names are the wire names (they predate this implementation and
/// every compiled program depends on them). Operand types say how the VM
/// uses the value: `i64` operands are stack values, `usize` operands are
/// counts, frame offsets, or 1-based code addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Initialize the machine: two zeroed linkage slots, `base = 0`.
    DebutProg,
    /// Halt cleanly.
    FinProg,
    /// Push `n` zeroed slots for freshly declared variables.
    Reserver(usize),
    /// Push a literal value.
    Empiler(i64),
    /// Push the absolute address of frame slot `a` (`base + 2 + a`).
    EmpilerAd(usize),
    /// Push the *content* of frame slot `a` — the caller-side address held
    /// by an in-out parameter.
    EmpilerParam(usize),
    /// Store the top of stack through the address beneath it; pops both.
    Affectation,
    /// Dereference the address on top of the stack in place.
    ValeurPile,
    /// Read an integer from input into the address on top; pops it.
    Get,
    /// Print the top of stack, newline-terminated; pops it.
    Put,
    /// Arithmetic negation of the top of stack.
    Moins,
    Sous,
    Add,
    Mult,
    Div,
    Egal,
    Diff,
    Inf,
    Infeg,
    Sup,
    Supeg,
    Et,
    Ou,
    /// Boolean negation: 0 becomes 1, anything else becomes 0.
    Non,
    /// Unconditional jump to address `a`.
    Tra(usize),
    /// Pop the top of stack; jump to address `a` if it was 0.
    Tze(usize),
    /// Reserve a linkage block for an upcoming call: push the current base
    /// and a return-address placeholder.
    ReserverBloc,
    /// Complete the call begun by `reserverBloc`, `nbp` argument slots below
    /// the top: promote the block to the current frame, record the return
    /// address, and jump to `a`.
    TraStat(usize, usize),
    /// Discard the current frame and resume at the recorded return address.
    RetourProc,
    /// As `retourProc`, but re-pushes the top of stack as the call result.
    RetourFonct,
    /// Halt with an error status.
    Erreur,
}

impl Op {
    /// The wire-format opcode name.
    pub fn name(self) -> &'static str {
        match self {
            Op::DebutProg => "debutProg",
            Op::FinProg => "finProg",
            Op::Reserver(_) => "reserver",
            Op::Empiler(_) => "empiler",
            Op::EmpilerAd(_) => "empilerAd",
            Op::EmpilerParam(_) => "empilerParam",
            Op::Affectation => "affectation",
            Op::ValeurPile => "valeurPile",
            Op::Get => "get",
            Op::Put => "put",
            Op::Moins => "moins",
            Op::Sous => "sous",
            Op::Add => "add",
            Op::Mult => "mult",
            Op::Div => "div",
            Op::Egal => "egal",
            Op::Diff => "diff",
            Op::Inf => "inf",
            Op::Infeg => "infeg",
            Op::Sup => "sup",
            Op::Supeg => "supeg",
            Op::Et => "et",
            Op::Ou => "ou",
            Op::Non => "non",
            Op::Tra(_) => "tra",
            Op::Tze(_) => "tze",
            Op::ReserverBloc => "reserverBloc",
            Op::TraStat(..) => "traStat",
            Op::RetourProc => "retourProc",
            Op::RetourFonct => "retourFonct",
            Op::Erreur => "erreur",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::Reserver(n) => write!(f, "reserver({n})"),
            Op::Empiler(v) => write!(f, "empiler({v})"),
            Op::EmpilerAd(a) => write!(f, "empilerAd({a})"),
            Op::EmpilerParam(a) => write!(f, "empilerParam({a})"),
            Op::Tra(a) => write!(f, "tra({a})"),
            Op::Tze(a) => write!(f, "tze({a})"),
            Op::TraStat(a, nbp) => write!(f, "traStat({a},{nbp})"),
            op => write!(f, "{}()", op.name()),
        }
    }
}

impl FromStr for Op {
    type Err = Error;

    /// Parse one wire-format line, e.g. `traStat(3,1)`.
    fn from_str(s: &str) -> Result<Op> {
        let line = s.trim();
        let malformed = || Error::Runtime(format!("malformed instruction '{line}'"));

        let open = line.find('(').ok_or_else(malformed)?;
        if !line.ends_with(')') {
            return Err(malformed());
        }
        let name = &line[..open];
        let inside = &line[open + 1..line.len() - 1];
        let params: Vec<i64> = if inside.trim().is_empty() {
            Vec::new()
        } else {
            inside
                .split(',')
                .map(|p| p.trim().parse::<i64>().map_err(|_| malformed()))
                .collect::<Result<_>>()?
        };

        let unsigned = |v: i64| -> Result<usize> {
            usize::try_from(v).map_err(|_| {
                Error::Runtime(format!("negative operand in instruction '{line}'"))
            })
        };
        let arity = |n: usize| -> Result<()> {
            if params.len() == n {
                Ok(())
            } else {
                Err(Error::Runtime(format!(
                    "instruction '{name}' expects {n} operand(s), found {}",
                    params.len()
                )))
            }
        };

        let op = match name {
            "debutProg" => Op::DebutProg,
            "finProg" => Op::FinProg,
            "reserver" => {
                arity(1)?;
                Op::Reserver(unsigned(params[0])?)
            }
            "empiler" => {
                arity(1)?;
                Op::Empiler(params[0])
            }
            "empilerAd" => {
                arity(1)?;
                Op::EmpilerAd(unsigned(params[0])?)
            }
            "empilerParam" => {
                arity(1)?;
                Op::EmpilerParam(unsigned(params[0])?)
            }
            "affectation" => Op::Affectation,
            "valeurPile" => Op::ValeurPile,
            "get" => Op::Get,
            "put" => Op::Put,
            "moins" => Op::Moins,
            "sous" => Op::Sous,
            "add" => Op::Add,
            "mult" => Op::Mult,
            "div" => Op::Div,
            "egal" => Op::Egal,
            "diff" => Op::Diff,
            "inf" => Op::Inf,
            "infeg" => Op::Infeg,
            "sup" => Op::Sup,
            "supeg" => Op::Supeg,
            "et" => Op::Et,
            "ou" => Op::Ou,
            "non" => Op::Non,
            "tra" => {
                arity(1)?;
                Op::Tra(unsigned(params[0])?)
            }
            "tze" => {
                arity(1)?;
                Op::Tze(unsigned(params[0])?)
            }
            "reserverBloc" => Op::ReserverBloc,
            "traStat" => {
                arity(2)?;
                Op::TraStat(unsigned(params[0])?, unsigned(params[1])?)
            }
            "retourProc" => Op::RetourProc,
            "retourFonct" => Op::RetourFonct,
            "erreur" => Op::Erreur,
            other => return Err(Error::Runtime(format!("unknown opcode '{other}'"))),
        };

        // Operand-less opcodes must not carry operands either.
        match op {
            Op::Reserver(_)
            | Op::Empiler(_)
            | Op::EmpilerAd(_)
            | Op::EmpilerParam(_)
            | Op::Tra(_)
            | Op::Tze(_)
            | Op::TraStat(..) => {}
            _ => arity(0)?,
        }

        Ok(op)
    }
}

/// An ordered instruction stream under construction or loaded for execution.
///
/// The compiler appends through [`Program::emit`] and patches branch
/// placeholders in place; the VM fetches by 1-based address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    ops: Vec<Op>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn emit(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Insert an instruction at a 0-based position, shifting later
    /// instructions right by one.
    ///
    /// # Panics
    ///
    /// Panics if `position` is past the end of the stream.
    pub fn insert(&mut self, position: usize, op: Op) {
        assert!(
            position <= self.ops.len(),
            "insert at {position} past the end of a {}-instruction program",
            self.ops.len()
        );
        self.ops.insert(position, op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The instruction at a 1-based address, if any.
    pub fn fetch(&self, address: usize) -> Option<Op> {
        if address == 0 {
            return None;
        }
        self.ops.get(address - 1).copied()
    }

    /// The instruction at a 0-based index.
    pub fn op(&self, index: usize) -> Op {
        self.ops[index]
    }

    pub fn op_mut(&mut self, index: usize) -> &mut Op {
        &mut self.ops[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Render the stream in the wire format, one instruction per line, with
    /// a trailing newline.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        out
    }

    /// Load a stream from its wire format. Blank lines are ignored, so a
    /// missing or present final newline makes no difference.
    pub fn parse(text: &str) -> Result<Program> {
        let mut program = Program::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            program.emit(line.parse()?);
        }
        Ok(program)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_matches_wire_format() {
        assert_eq!(Op::DebutProg.to_string(), "debutProg()");
        assert_eq!(Op::Empiler(-3).to_string(), "empiler(-3)");
        assert_eq!(Op::TraStat(3, 1).to_string(), "traStat(3,1)");
    }

    #[test]
    fn parse_round_trips_every_opcode() {
        let ops = [
            Op::DebutProg,
            Op::FinProg,
            Op::Reserver(2),
            Op::Empiler(42),
            Op::EmpilerAd(0),
            Op::EmpilerParam(1),
            Op::Affectation,
            Op::ValeurPile,
            Op::Get,
            Op::Put,
            Op::Moins,
            Op::Sous,
            Op::Add,
            Op::Mult,
            Op::Div,
            Op::Egal,
            Op::Diff,
            Op::Inf,
            Op::Infeg,
            Op::Sup,
            Op::Supeg,
            Op::Et,
            Op::Ou,
            Op::Non,
            Op::Tra(6),
            Op::Tze(21),
            Op::ReserverBloc,
            Op::TraStat(3, 1),
            Op::RetourProc,
            Op::RetourFonct,
            Op::Erreur,
        ];
        for op in ops {
            assert_eq!(op.to_string().parse::<Op>().unwrap(), op);
        }
    }

    #[test]
    fn parse_tolerates_trailing_newline_or_its_absence() {
        let with = Program::parse("debutProg()\nput()\nfinProg()\n").unwrap();
        let without = Program::parse("debutProg()\nput()\nfinProg()").unwrap();
        assert_eq!(with, without);
        assert_eq!(with.len(), 3);
    }

    #[test]
    fn parse_rejects_unknown_opcodes_and_bad_operands() {
        assert!("jmp(3)".parse::<Op>().is_err());
        assert!("tra()".parse::<Op>().is_err());
        assert!("tra(1,2)".parse::<Op>().is_err());
        assert!("tra(-4)".parse::<Op>().is_err());
        assert!("put(1)".parse::<Op>().is_err());
        assert!("put".parse::<Op>().is_err());
    }

    #[test]
    fn insert_shifts_later_instructions() {
        let mut program = Program::new();
        program.emit(Op::DebutProg);
        program.emit(Op::Put);
        program.insert(1, Op::Empiler(7));
        assert_eq!(program.fetch(2), Some(Op::Empiler(7)));
        assert_eq!(program.fetch(3), Some(Op::Put));
    }

    #[test]
    fn fetch_is_one_based() {
        let mut program = Program::new();
        program.emit(Op::DebutProg);
        assert_eq!(program.fetch(0), None);
        assert_eq!(program.fetch(1), Some(Op::DebutProg));
        assert_eq!(program.fetch(2), None);
    }
}
