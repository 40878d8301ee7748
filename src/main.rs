// Slick CLI - translate one Slick source file into one Go source file.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use slick::{translate, Interner, PluginRegistry, Reader};

#[derive(Debug, Parser)]
#[command(
    name = "slick",
    version,
    about = "Translate a Slick source file into Go source"
)]
struct Args {
    /// The Slick source file to translate.
    input: PathBuf,
    /// The Go file to write.
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let interner = Interner::new();
    let registry = PluginRegistry::new();

    let mut rd = match Reader::from_file(&interner, &args.input) {
        Ok(rd) => rd,
        Err(err) => {
            eprintln!("slick: {}: {}", args.input.display(), err);
            process::exit(1);
        }
    };

    let output = match translate(&mut rd, &registry) {
        Ok(output) => output,
        Err(errors) => {
            eprintln!("{}", errors);
            process::exit(1);
        }
    };

    if let Err(err) = fs::write(&args.output, output) {
        eprintln!("slick: {}: {}", args.output.display(), err);
        process::exit(1);
    }
}
