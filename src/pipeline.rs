use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{ChunkCapacity, ChunkWriter, Tokenizer, TokenizerError, WriteError};

/// Indicates there was an error while chunking a file.
/// The `Display` implementation will provide a human-readable error message to
/// help debug the issue that caused the error.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct PipelineError(#[from] PipelineErrorRepr);

/// Private error and free to change across minor version of the crate.
#[derive(Error, Debug)]
enum PipelineErrorRepr {
    #[error("Failed to read input file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Tokenizer(TokenizerError),
    #[error(transparent)]
    Write(WriteError),
}

/// Summary of a completed run: how many tokens the input held and which files
/// were written.
#[derive(Clone, Debug)]
pub struct RunSummary {
    token_count: usize,
    files: Vec<PathBuf>,
}

impl RunSummary {
    /// Total number of tokens the input text encoded to.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Number of chunk files written.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.files.len()
    }

    /// Paths of the written chunk files, in chunk order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Splits one text file into token-bounded chunk files.
///
/// A run reads the input, encodes it with the configured [`Tokenizer`], splits
/// the token ids by the configured [`ChunkCapacity`], and decodes and writes
/// each chunk through the configured [`ChunkWriter`] in order. The first
/// failure aborts the run; files already written stay in place.
#[derive(Debug)]
pub struct Pipeline {
    tokenizer: Tokenizer,
    capacity: ChunkCapacity,
    writer: ChunkWriter,
}

impl Pipeline {
    /// Assemble a pipeline from its parts.
    #[must_use]
    pub fn new(tokenizer: Tokenizer, capacity: ChunkCapacity, writer: ChunkWriter) -> Self {
        Self {
            tokenizer,
            capacity,
            writer,
        }
    }

    /// Chunk the file at `input` into numbered chunk files.
    ///
    /// An input that encodes to no tokens produces no files, and the output
    /// directory is left uncreated.
    ///
    /// # Errors
    ///
    /// If the input file can't be read, a chunk fails to decode back into
    /// text, or a chunk file can't be written, an error is returned and no
    /// further chunks are processed.
    pub fn run(&self, input: &Path) -> Result<RunSummary, PipelineError> {
        let text = fs::read_to_string(input).map_err(|source| PipelineErrorRepr::Read {
            path: input.to_path_buf(),
            source,
        })?;
        debug!(path = %input.display(), bytes = text.len(), "read input file");

        let tokens = self.tokenizer.encode(&text);
        info!(
            tokens = tokens.len(),
            encoding = %self.tokenizer.encoding(),
            "encoded input"
        );

        let mut files = Vec::new();
        for chunk in self.capacity.split(&tokens) {
            let chunk_text = self
                .tokenizer
                .decode(chunk.tokens())
                .map_err(PipelineErrorRepr::Tokenizer)?;
            let path = self
                .writer
                .write(chunk.index(), &chunk_text)
                .map_err(PipelineErrorRepr::Write)?;
            info!(
                chunk = chunk.index(),
                tokens = chunk.token_count(),
                path = %path.display(),
                "saved chunk"
            );
            files.push(path);
        }

        Ok(RunSummary {
            token_count: tokens.len(),
            files,
        })
    }
}
