use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Indicates there was an error writing a chunk to the filesystem.
/// The `Display` implementation will provide a human-readable error message to
/// help debug the issue that caused the error.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct WriteError(#[from] WriteErrorRepr);

/// Private error and free to change across minor version of the crate.
#[derive(Error, Debug)]
enum WriteErrorRepr {
    #[error("Failed to create output directory {}", dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Output file {} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("Failed to write output file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes chunks to numbered text files.
///
/// Each chunk lands in its own file, named by appending the chunk's index and
/// a `.txt` extension to the configured prefix, so the chunk at index `0`
/// written with the default prefix becomes `chunk_0.txt`. The output
/// directory is created on the first write if it doesn't exist yet.
///
/// By default an existing file with the same name is overwritten. Call
/// [`Self::with_overwrite`] and set it to `false` to fail instead of
/// clobbering previous output.
#[derive(Clone, Debug)]
pub struct ChunkWriter {
    output_dir: PathBuf,
    prefix: String,
    overwrite: bool,
}

impl ChunkWriter {
    /// Create a writer that names its files with the given prefix, writing
    /// into the current directory.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            output_dir: PathBuf::from("."),
            prefix: prefix.into(),
            overwrite: true,
        }
    }

    /// Retrieve the directory chunk files are written into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Set the directory chunk files are written into. It will be created on
    /// the first write if it doesn't exist.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Retrieve the file name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Retrieve whether existing files will be overwritten.
    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Set whether existing files will be overwritten. When set to `false`,
    /// writing a chunk whose file already exists fails without touching the
    /// existing file.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// The path the chunk with the given index will be written to.
    #[must_use]
    pub fn chunk_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("{}{index}.txt", self.prefix))
    }

    /// Write one chunk's text to its numbered file, returning the path it was
    /// written to.
    ///
    /// # Errors
    ///
    /// If the output directory can't be created, the file already exists while
    /// overwriting is disabled, or writing fails, an error is returned.
    pub fn write(&self, index: usize, text: &str) -> Result<PathBuf, WriteError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| {
            WriteErrorRepr::CreateDir {
                dir: self.output_dir.clone(),
                source,
            }
        })?;

        let path = self.chunk_path(index);
        let mut file = if self.overwrite {
            File::create(&path)
        } else {
            OpenOptions::new().write(true).create_new(true).open(&path)
        }
        .map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                WriteErrorRepr::AlreadyExists { path: path.clone() }
            } else {
                WriteErrorRepr::Write {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        file.write_all(text.as_bytes())
            .map_err(|source| WriteErrorRepr::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}
