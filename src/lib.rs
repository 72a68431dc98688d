/*!
# token-chunker

Large language models have context windows measured in tokens, not characters,
so feeding them a long document usually starts with splitting it by token
count. This crate reads a text file, tokenizes it with one of OpenAI's
[tiktoken](https://github.com/openai/tiktoken) vocabularies via
[`tiktoken-rs`](https://crates.io/crates/tiktoken-rs), splits the token ids
into consecutive chunks of at most a configured size, decodes each chunk back
into text, and writes every chunk to its own numbered file.

Chunks are plain fixed windows over the token sequence: every chunk except the
last holds exactly the configured number of tokens, and the last holds the
remainder. No token is dropped, duplicated, or reordered, so concatenating the
chunk files restores the original token sequence.

## Get Started

### Chunking text in memory

```rust
use token_chunker::{ChunkCapacity, Encoding, Tokenizer};

let tokenizer = Tokenizer::new(Encoding::Cl100kBase).unwrap();
let capacity = ChunkCapacity::new(100).unwrap();

let tokens = tokenizer.encode("your document text");
for chunk in capacity.split(&tokens) {
    let text = tokenizer.decode(chunk.tokens()).unwrap();
    println!("chunk {} ({} tokens): {text}", chunk.index(), chunk.token_count());
}
```

### Chunking a file into numbered chunk files

```no_run
use std::path::Path;

use token_chunker::{ChunkCapacity, ChunkWriter, Pipeline, Tokenizer};

// Model names resolve to their encoding, e.g. gpt-4o -> o200k_base.
let tokenizer = Tokenizer::for_model("gpt-4o").unwrap();
let capacity = ChunkCapacity::new(4096).unwrap();
let writer = ChunkWriter::new("chunk_").with_output_dir("chunks");

let pipeline = Pipeline::new(tokenizer, capacity, writer);
let summary = pipeline.run(Path::new("input.txt")).unwrap();
println!("wrote {} chunk files", summary.chunk_count());
```

Chunk files are named `{prefix}{index}.txt`, numbered from zero. A file that
already exists is overwritten by default; configure the writer with
[`ChunkWriter::with_overwrite`] set to `false` to fail instead of clobbering
earlier output.

## Errors

Any failure aborts the whole run: an unrecognized model name, a vocabulary
that fails to load, a chunk that doesn't decode to valid UTF-8, or a file that
can't be written. Nothing is retried and partial output is left in place, so a
run either completes fully or reports the first error it hit.
*/

mod chunk;
mod pipeline;
mod tokenizer;
mod writer;

pub use chunk::{ChunkCapacity, ChunkCapacityError, TokenChunk};
pub use pipeline::{Pipeline, PipelineError, RunSummary};
pub use tokenizer::{Encoding, Tokenizer, TokenizerError};
pub use writer::{ChunkWriter, WriteError};
