//! Entry point for the Helix9 linker (helix-ld).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use helix9_core::linker::Linker;
use helix9_core::object::ObjectFile;

/// Links one or more Helix9 object files into a single executable.
#[derive(Parser)]
#[command(name = "helix-ld")]
struct Args {
    /// Object files (.ht) to merge, in link order.
    inputs: Vec<PathBuf>,

    /// Output executable file.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

fn run(args: Args) -> Result<(), String> {
    if args.inputs.is_empty() {
        return Err("at least one input object file is required".to_string());
    }

    let mut linker = Linker::new();
    for path in &args.inputs {
        let object =
            ObjectFile::read_from(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
        linker = linker.add_object(object);
    }

    let executable = linker.link().map_err(|e| e.to_string())?;
    executable
        .write_to(&args.output)
        .map_err(|e| format!("writing {}: {e}", args.output.display()))?;

    log::info!("wrote {}", args.output.display());
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
