use thiserror::Error;

/// Indicates there was an error with the chunk capacity configuration.
/// The `Display` implementation will provide a human-readable error message to
/// help debug the issue that caused the error.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ChunkCapacityError(#[from] ChunkCapacityErrorRepr);

/// Private error and free to change across minor version of the crate.
#[derive(Error, Debug)]
enum ChunkCapacityErrorRepr {
    #[error("Chunk capacity must be greater than zero")]
    Zero,
}

/// The maximum number of tokens a single chunk may contain.
///
/// Every chunk produced by [`ChunkCapacity::split`] holds exactly this many
/// tokens, except the final chunk, which holds whatever remains. A capacity of
/// zero is rejected at construction, so a validated capacity can always be
/// used to split.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkCapacity(usize);

impl ChunkCapacity {
    /// Create a new `ChunkCapacity` with the given maximum number of tokens
    /// per chunk.
    ///
    /// # Errors
    ///
    /// If `max_tokens` is zero, an error is returned.
    pub fn new(max_tokens: usize) -> Result<Self, ChunkCapacityError> {
        if max_tokens == 0 {
            Err(ChunkCapacityError(ChunkCapacityErrorRepr::Zero))
        } else {
            Ok(Self(max_tokens))
        }
    }

    /// The maximum number of tokens per chunk.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0
    }

    /// Split a sequence of token ids into consecutive chunks of at most this
    /// many tokens.
    ///
    /// Chunks are yielded in order of their position in `tokens`, with indices
    /// numbered from zero. Every chunk is full except possibly the last one,
    /// which contains the remaining tokens. No token is ever dropped,
    /// duplicated, or reordered, so concatenating the chunks always restores
    /// the original sequence. An empty sequence produces no chunks.
    pub fn split(self, tokens: &[usize]) -> impl Iterator<Item = TokenChunk<'_>> {
        tokens
            .chunks(self.0)
            .enumerate()
            .map(|(index, tokens)| TokenChunk { index, tokens })
    }
}

impl TryFrom<usize> for ChunkCapacity {
    type Error = ChunkCapacityError;

    fn try_from(max_tokens: usize) -> Result<Self, Self::Error> {
        Self::new(max_tokens)
    }
}

/// A contiguous window of token ids produced by [`ChunkCapacity::split`],
/// along with its position in the sequence of chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TokenChunk<'tokens> {
    index: usize,
    tokens: &'tokens [usize],
}

impl<'tokens> TokenChunk<'tokens> {
    /// Zero-based position of this chunk within the split.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The token ids within this chunk.
    #[must_use]
    pub fn tokens(&self) -> &'tokens [usize] {
        self.tokens
    }

    /// Number of tokens in this chunk. Always greater than zero and at most
    /// the capacity the chunk was split with.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}
