//! Entry point for the Helix9 assembler (helix-asm).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use helix9_core::assembler::Assembler;
use helix9_core::object::ObjectFile;

/// Assembles a Helix9 source file into a relocatable object file.
#[derive(Parser)]
#[command(name = "helix-asm")]
struct Args {
    /// Source file (.hasm).
    input: PathBuf,

    /// Output object file. Defaults to the input path with a .ht extension.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("reading {}: {e}", args.input.display()))?;

    let object: ObjectFile = Assembler::new(&source)
        .assemble()
        .map_err(|e| e.to_string())?;

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("ht"));
    object
        .write_to(&output)
        .map_err(|e| format!("writing {}: {e}", output.display()))?;

    log::info!("wrote {}", output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
