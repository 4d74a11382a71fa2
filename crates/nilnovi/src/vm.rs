//! The NilNovi stack virtual machine.
//!
//! A single-threaded fetch/decode/execute loop over a loaded [`Program`].
//! All runtime state lives in one contiguous stack of `i64` cells holding
//! activation records and evaluation temporaries alike, plus two registers:
//! `base`, the index of the current activation's linkage slot, and `co`, the
//! 1-based instruction counter. The top-of-stack index `ip` always equals
//! `stack.len() - 1`, so it is derived rather than stored.
//!
//! The machine never exits the process: `finProg` (or running past the last
//! instruction) surfaces as [`Status::Halted`], and faults — division by
//! zero, bad input to `get`, out-of-range stack access, the `erreur` opcode
//! — as errors from [`Vm::step`]. Console I/O is injected, so the machine is
//! as usable under a test harness as on a terminal.
//!
//! Activation record layout, from `base` upward:
//!
//! ```text
//! S[base]       previous base (dynamic link)
//! S[base + 1]   return address (stored by traStat)
//! S[base + 2+i] parameter / local slot i
//! ```
//!
//! An in-out parameter's slot holds the absolute stack index of the caller's
//! variable; `empilerParam` re-pushes that address, and `valeurPile` /
//! `affectation` read or write through it.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use tracing::trace;

use crate::bytecode::{Op, Program};
use crate::error::{Error, Result};

/// Outcome of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

pub struct Vm<R, W> {
    program: Program,
    stack: Vec<i64>,
    base: usize,
    /// 1-based instruction counter.
    co: usize,
    input: R,
    output: W,
}

impl Vm<BufReader<Stdin>, Stdout> {
    /// A machine reading `get` input from stdin and writing `put` output to
    /// stdout.
    pub fn new(program: Program) -> Self {
        Self::with_io(program, BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Vm<R, W> {
    pub fn with_io(program: Program, input: R, output: W) -> Self {
        Self {
            program,
            stack: Vec::new(),
            base: 0,
            co: 1,
            input,
            output,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// The 1-based address of the next instruction to execute.
    pub fn co(&self) -> usize {
        self.co
    }

    /// Index of the top of the stack. Meaningful once `debutProg` has run.
    pub fn ip(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Run to completion.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? == Status::Running {}
        Ok(())
    }

    /// Fetch, decode, and execute one instruction.
    ///
    /// Jumps load `co` directly; every other instruction falls through to
    /// `co + 1`. Fetching past the end of the program halts.
    pub fn step(&mut self) -> Result<Status> {
        let Some(op) = self.program.fetch(self.co) else {
            return Ok(Status::Halted);
        };
        trace!(co = self.co, base = self.base, %op, "executing");

        match op {
            Op::DebutProg => {
                self.stack.clear();
                self.stack.push(0);
                self.stack.push(0);
                self.base = 0;
            }
            Op::FinProg => return Ok(Status::Halted),

            Op::Reserver(n) => {
                for _ in 0..n {
                    self.stack.push(0);
                }
            }
            Op::Empiler(value) => self.stack.push(value),
            Op::EmpilerAd(offset) => {
                let address = self.base + 2 + offset;
                self.stack.push(address as i64);
            }
            Op::EmpilerParam(offset) => {
                let value = self.slot(self.base + 2 + offset)?;
                self.stack.push(value);
            }
            Op::Affectation => {
                let value = self.pop()?;
                let address = as_address(self.pop()?)?;
                *self.slot_mut(address)? = value;
            }
            Op::ValeurPile => {
                let address = as_address(self.top()?)?;
                let value = self.slot(address)?;
                *self.top_mut()? = value;
            }

            Op::Get => {
                let address = as_address(self.pop()?)?;
                let value = self.read_integer()?;
                *self.slot_mut(address)? = value;
            }
            Op::Put => {
                let value = self.pop()?;
                writeln!(self.output, "{value}")?;
                self.output.flush()?;
            }

            Op::Moins => {
                let top = self.top_mut()?;
                *top = -*top;
            }
            Op::Sous => self.binary(|lhs, rhs| Ok(lhs - rhs))?,
            Op::Add => self.binary(|lhs, rhs| Ok(lhs + rhs))?,
            Op::Mult => self.binary(|lhs, rhs| Ok(lhs * rhs))?,
            Op::Div => self.binary(|lhs, rhs| {
                if rhs == 0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(lhs / rhs)
                }
            })?,

            Op::Egal => self.binary(|lhs, rhs| Ok((lhs == rhs) as i64))?,
            Op::Diff => self.binary(|lhs, rhs| Ok((lhs != rhs) as i64))?,
            Op::Inf => self.binary(|lhs, rhs| Ok((lhs < rhs) as i64))?,
            Op::Infeg => self.binary(|lhs, rhs| Ok((lhs <= rhs) as i64))?,
            Op::Sup => self.binary(|lhs, rhs| Ok((lhs > rhs) as i64))?,
            Op::Supeg => self.binary(|lhs, rhs| Ok((lhs >= rhs) as i64))?,
            Op::Et => self.binary(|lhs, rhs| Ok((lhs != 0 && rhs != 0) as i64))?,
            Op::Ou => self.binary(|lhs, rhs| Ok((lhs != 0 || rhs != 0) as i64))?,
            Op::Non => {
                let top = self.top_mut()?;
                *top = (*top == 0) as i64;
            }

            Op::Tra(target) => {
                self.co = target;
                return Ok(Status::Running);
            }
            Op::Tze(target) => {
                if self.pop()? == 0 {
                    self.co = target;
                    return Ok(Status::Running);
                }
            }

            Op::ReserverBloc => {
                self.stack.push(self.base as i64);
                self.stack.push(0);
            }
            Op::TraStat(target, nbp) => {
                let top = self.ip();
                let link = top
                    .checked_sub(nbp)
                    .and_then(|link| link.checked_sub(1).map(|b| (link, b)));
                let Some((link, new_base)) = link else {
                    return Err(Error::Runtime(format!(
                        "traStat({target},{nbp}) with only {} stack slots",
                        self.stack.len()
                    )));
                };
                *self.slot_mut(link)? = (self.co + 1) as i64;
                self.base = new_base;
                self.co = target;
                return Ok(Status::Running);
            }
            Op::RetourProc => {
                let ra = self.discard_frame()?;
                self.co = ra;
                return Ok(Status::Running);
            }
            Op::RetourFonct => {
                let value = self.top()?;
                let ra = self.discard_frame()?;
                self.stack.push(value);
                self.co = ra;
                return Ok(Status::Running);
            }

            Op::Erreur => {
                return Err(Error::Runtime(
                    "the machine executed the 'erreur' instruction".to_string(),
                ));
            }
        }

        self.co += 1;
        Ok(Status::Running)
    }

    /// Pop the current frame down to and including its linkage slot,
    /// restoring the caller's base. Returns the recorded return address.
    fn discard_frame(&mut self) -> Result<usize> {
        let ra = as_address(self.slot(self.base + 1)?)?;
        let old_base = as_address(self.slot(self.base)?)?;
        self.stack.truncate(self.base);
        self.base = old_base;
        Ok(ra)
    }

    /// Apply a binary operator: `S[ip-1] = S[ip-1] op S[ip]`, popping once.
    fn binary(&mut self, apply: impl FnOnce(i64, i64) -> Result<i64>) -> Result<()> {
        let rhs = self.pop()?;
        let lhs = self.top()?;
        *self.top_mut()? = apply(lhs, rhs)?;
        Ok(())
    }

    fn pop(&mut self) -> Result<i64> {
        self.stack
            .pop()
            .ok_or_else(|| Error::Runtime("stack underflow".to_string()))
    }

    fn top(&self) -> Result<i64> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| Error::Runtime("stack underflow".to_string()))
    }

    fn top_mut(&mut self) -> Result<&mut i64> {
        self.stack
            .last_mut()
            .ok_or_else(|| Error::Runtime("stack underflow".to_string()))
    }

    fn slot(&self, index: usize) -> Result<i64> {
        self.stack.get(index).copied().ok_or_else(|| {
            Error::Runtime(format!("stack access out of range (slot {index})"))
        })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut i64> {
        let len = self.stack.len();
        self.stack.get_mut(index).ok_or_else(|| {
            Error::Runtime(format!(
                "stack access out of range (slot {index} of {len})"
            ))
        })
    }

    /// Read one line of input for `get` and parse it as an integer.
    fn read_integer(&mut self) -> Result<i64> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        let text = line.trim();
        if read == 0 || text.is_empty() {
            return Err(Error::Runtime("no input available for 'get'".to_string()));
        }
        text.parse()
            .map_err(|_| Error::Runtime(format!("input '{text}' is not an integer")))
    }
}

fn as_address(value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::Runtime(format!("'{value}' is not a valid stack address")))
}
