use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use token_chunker::{ChunkCapacity, ChunkWriter, Pipeline, Tokenizer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "token-chunker",
    version,
    about = "Split a text file into chunks of up to a maximum number of tokens"
)]
struct Args {
    /// Path of the text file to split
    input_file: PathBuf,

    /// Prefix for chunk file names; the chunk index and a .txt extension are
    /// appended
    #[arg(long, alias = "output_prefix", default_value = "chunk_")]
    output_prefix: String,

    /// Maximum number of tokens per chunk
    #[arg(long, alias = "max_tokens", default_value_t = 4096)]
    max_tokens: usize,

    /// Model or encoding name used to tokenize, e.g. gpt-4o or cl100k_base
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Directory to write chunk files into
    #[arg(long, alias = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    /// Fail instead of overwriting chunk files that already exist
    #[arg(long)]
    no_clobber: bool,
}

/// Initialize logging to stderr, defaulting to `info` if `RUST_LOG` is unset.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // The tokenizer is resolved before the input file is touched, so an
    // unknown model name fails without any file I/O.
    let capacity = ChunkCapacity::new(args.max_tokens)?;
    let tokenizer = Tokenizer::for_model(&args.model)?;
    let writer = ChunkWriter::new(args.output_prefix)
        .with_output_dir(args.output_dir)
        .with_overwrite(!args.no_clobber);

    let summary = Pipeline::new(tokenizer, capacity, writer).run(&args.input_file)?;
    info!(
        tokens = summary.token_count(),
        chunks = summary.chunk_count(),
        "done"
    );

    Ok(())
}
