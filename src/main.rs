//! Punto de entrada ("driver").
//!
//! Este módulo lee el archivo fuente, orquesta la traducción y escribe
//! el resultado. También expone la CLI.

use anyhow::{anyhow, bail, Context};
use clap::{crate_version, Arg, ArgAction, Command};
use log::{info, Level};
use loggerv::Output;
use tbc::{emit::Destination, error::Diagnostics, lex::Lexer, source::Source};

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

/// Nombre del archivo de salida por omisión, junto al archivo fuente.
const DEFAULT_OUTPUT: &str = "out.c";

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("Tiny BASIC compiler")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .required(true)
                .index(1)
                .value_name("FILE")
                .help("Source file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Output file ('-' for stdout), defaults to out.c next to the source"),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream instead of compiling"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disables colorized output"),
        )
        .get_matches();

    // Todos los niveles van a stderr, stdout puede transportar código C
    loggerv::Logger::new()
        .verbosity(u64::from(args.get_count("verbose")))
        .colors(!args.is_present("no-color"))
        .module_path(false)
        .output(&Level::Info, Output::Stderr)
        .output(&Level::Debug, Output::Stderr)
        .output(&Level::Trace, Output::Stderr)
        .init()
        .map_err(|_| anyhow!("Failed to initialize logger"))?;

    // Se extraen argumentos necesarios
    let input = Path::new(args.value_of("input").unwrap());
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read source file: {}", input.display()))?;

    let source = Source::new(input.display().to_string(), text);

    if args.is_present("tokens") {
        return dump_tokens(Lexer::new(source));
    }

    let destination = match args.value_of("output") {
        Some("-") => Destination::Stdout,
        Some(path) => Destination::File(PathBuf::from(path)),
        None => Destination::File(input.with_file_name(DEFAULT_OUTPUT)),
    };

    if destination == Destination::File(input.to_path_buf()) {
        bail!("Refusing to overwrite source file: {}", input.display());
    }

    info!("Compiling {} into {}", input.display(), destination);

    let emitter = match tbc::translate(source, destination) {
        Ok(emitter) => emitter,
        Err(failure) => {
            eprint!("{}", Diagnostics::from(failure));
            process::exit(1);
        }
    };

    let destination = emitter.destination().clone();
    let written = emitter
        .finish()
        .with_context(|| format!("Failed to write output: {}", destination))?;

    info!("Wrote {} bytes to {}", written, destination);
    Ok(())
}

/// Imprime cada token como `lexema: CLASE`, uno por línea.
fn dump_tokens(lexer: Lexer) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    for result in lexer {
        match result {
            Ok(token) => writeln!(stdout, "{}", token.val()).context("Failed to write to stdout")?,
            Err(error) => {
                eprint!("{}", Diagnostics::from(error).kind("Lexical error"));
                process::exit(1);
            }
        }
    }

    Ok(())
}
