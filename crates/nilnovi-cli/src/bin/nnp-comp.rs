//! `nnp-comp` — compile a NilNovi program to its instruction stream.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "nnp-comp", version)]
#[command(about = "Compile a NilNovi program to stack-machine instructions", long_about = None)]
struct Cli {
    /// NNP source file
    input: PathBuf,

    /// Write the instruction stream to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show debugging info on output
    #[arg(short, long)]
    debug: bool,

    /// Print the final identifier table
    #[arg(long)]
    show_ident_table: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    nilnovi_cli::init_tracing(cli.debug);

    let source = match fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let compilation = match nilnovi::compile(&source) {
        Ok(compilation) => compilation,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.show_ident_table {
        println!("------ identifier table ------");
        print!("{}", compilation.identifiers);
        println!("------------------------------");
    }

    match cli.output {
        Some(path) => {
            if let Err(err) = fs::write(&path, compilation.program.serialize()) {
                eprintln!("error: cannot write {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
        None => print!("{}", compilation.program.serialize()),
    }
    ExitCode::SUCCESS
}
