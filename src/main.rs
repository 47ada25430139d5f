use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pcapng_scrub::{scrub, Substitution, TransformConfig};

/// Rewrite PCAPNG captures: redact section metadata and substitute byte
/// patterns in packet payloads.
#[derive(Parser, Debug)]
#[command(name = "pcapng-scrub", version, about)]
struct Args {
    /// Input capture file (pcapng)
    input: PathBuf,

    /// Output capture file
    output: PathBuf,

    /// Drop all options from Section Header Blocks
    #[arg(long)]
    redact: bool,

    /// Byte-substitution rule as colon-separated hex pairs, e.g. aa:bb:cc/00:00:00
    #[arg(short = 's', long = "substitute", value_name = "FROM/TO")]
    substitutions: Vec<Substitution>,

    /// Enable per-block debug output on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "trace" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let input = File::open(&args.input)
        .with_context(|| format!("cannot open input file {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("cannot create output file {}", args.output.display()))?;

    let config = TransformConfig {
        redact_options: args.redact,
        substitutions: args.substitutions,
    };

    let mut writer = BufWriter::new(output);
    let stats = scrub(BufReader::new(input), &mut writer, &config)
        .with_context(|| format!("cannot rewrite capture {}", args.input.display()))?;
    writer.flush().context("cannot flush output file")?;

    debug!(
        blocks = stats.blocks,
        packets = stats.packets,
        bytes = stats.bytes_written,
        "done"
    );
    Ok(())
}
