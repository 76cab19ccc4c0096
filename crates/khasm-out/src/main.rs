use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use khasm::{assemble_with, AsmConfig};
use khasm_out::{label_list, write_coe, write_json, write_listing};

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble KH 32-bit assembly into a memory image")]
struct Opts {
    /// Assembly source (one statement per line, `;` starts a comment)
    #[arg(value_name = "SOURCE")]
    input: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Listing)]
    format: OutputFormat,
    /// Write output to file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Export labels to JSON (Vec<{ addr, name }>)
    #[arg(long, value_name = "FILE")]
    labels_out: Option<PathBuf>,
    /// Let a repeated label replace the earlier definition
    #[arg(long)]
    allow_redefine: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// `addr word` in hex
    Listing,
    /// COE memory initialization file
    Coe,
    Json,
}

fn run(opts: &Opts) -> Result<()> {
    let text = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let cfg = AsmConfig { allow_redefinition: opts.allow_redefine };
    let program = assemble_with(&text, cfg)?;
    tracing::info!(words = program.len(), labels = program.labels.len(), "assembled");

    let mut out: Box<dyn Write> = match &opts.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match opts.format {
        OutputFormat::Listing => write_listing(&mut out, &program)?,
        OutputFormat::Coe => write_coe(&mut out, &program)?,
        OutputFormat::Json => write_json(&mut out, &program)?,
    }
    out.flush()?;

    if let Some(path) = &opts.labels_out {
        let json = serde_json::to_string_pretty(&label_list(&program))?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
