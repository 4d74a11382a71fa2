//! `nnp-exec` — run a compiled NilNovi instruction stream.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nilnovi::{Program, Status, Vm};
use nilnovi_cli::board;

#[derive(Parser)]
#[command(name = "nnp-exec", version)]
#[command(about = "Execute a compiled NilNovi instruction stream", long_about = None)]
struct Cli {
    /// Compiled instruction file
    input: PathBuf,

    /// Show debugging info on output
    #[arg(short, long)]
    debug: bool,

    /// Execute one instruction at a time, waiting for Enter (implies -d)
    #[arg(short, long)]
    stepped: bool,

    /// Show the instruction/stack dashboard while stepping (implies -s)
    #[arg(short, long)]
    board: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let stepped = cli.stepped || cli.board;
    nilnovi_cli::init_tracing(cli.debug || stepped);

    let text = match fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    let program = match Program::parse(&text) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new(program);
    let result = if stepped {
        run_stepped(&mut vm, cli.board)
    } else {
        vm.run()
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Execute one instruction per Enter keypress, showing the machine state
/// before each.
fn run_stepped<R: BufRead, W: Write>(vm: &mut Vm<R, W>, with_board: bool) -> nilnovi::Result<()> {
    let stderr = io::stderr();
    loop {
        if with_board {
            let listing = board::instruction_table(vm.program(), vm.co());
            let stack = board::stack_table(vm.stack());
            write!(stderr.lock(), "{}", board::side_by_side(&listing, &stack))?;
        } else {
            let op = vm
                .program()
                .fetch(vm.co())
                .map(|op| op.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                stderr.lock(),
                "co: {} op: {op} base: {} ip: {} stack: {:?}",
                vm.co(),
                vm.base(),
                vm.ip(),
                vm.stack(),
            )?;
        }

        // Wait for Enter before executing.
        let mut pause = String::new();
        io::stdin().read_line(&mut pause)?;

        if vm.step()? == Status::Halted {
            return Ok(());
        }
    }
}
