use clap::{Parser, Subcommand};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ridl_compiler::{check_text, compile_text, GeneratorOptions, IdlError};

#[derive(Parser)]
#[command(name = "ridlc")]
#[command(about = "Compile BSON IDL files to C++ serialization code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an `.idl` file to a C++ header/source pair
    Generate {
        /// Input `.idl` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path prefix; writes `<prefix>.h` and `<prefix>.cpp`
        /// (defaults to the input name with `_gen` appended)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate an `.idl` file without generating code
    Check {
        /// Input `.idl` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the bound form of an `.idl` file as JSON (to stdout)
    Dump {
        /// Input `.idl` file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn file_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn output_prefix(input: &Path, output: &Option<PathBuf>) -> PathBuf {
    if let Some(prefix) = output {
        return prefix.clone();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    input.with_file_name(format!("{}_gen", stem))
}

fn run(cli: &Cli) -> Result<(), IdlError> {
    match &cli.command {
        Commands::Generate { input, output } => {
            let text = fs::read_to_string(input).map_err(IdlError::Io)?;
            let prefix = output_prefix(input, output);
            let header_path = prefix.with_extension("h");
            let source_path = prefix.with_extension("cpp");

            let header_name = header_path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let options = GeneratorOptions {
                command_line: env::args().collect::<Vec<_>>().join(" "),
                header_name,
            };

            let compiled = compile_text(&file_name(input), &text, &options)?;
            fs::write(&header_path, &compiled.code.header).map_err(IdlError::Io)?;
            fs::write(&source_path, &compiled.code.source).map_err(IdlError::Io)?;
            println!(
                "Compiled {} → {} + {}",
                input.display(),
                header_path.display(),
                source_path.display()
            );
            Ok(())
        }

        Commands::Check { input } => {
            let text = fs::read_to_string(input).map_err(IdlError::Io)?;
            check_text(&file_name(input), &text)?;
            println!("{}: ok", input.display());
            Ok(())
        }

        Commands::Dump { input } => {
            let text = fs::read_to_string(input).map_err(IdlError::Io)?;
            let bound = check_text(&file_name(input), &text)?;
            let json = serde_json::to_string_pretty(&bound)
                .map_err(|e| IdlError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
