use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Models resolved to an encoding by their exact name.
const MODEL_TO_ENCODING: &[(&str, Encoding)] = &[
    ("gpt-4o", Encoding::O200kBase),
    ("gpt-4", Encoding::Cl100kBase),
    ("gpt-3.5-turbo", Encoding::Cl100kBase),
    ("gpt-35-turbo", Encoding::Cl100kBase),
    ("davinci-002", Encoding::Cl100kBase),
    ("babbage-002", Encoding::Cl100kBase),
    ("text-embedding-ada-002", Encoding::Cl100kBase),
    ("text-embedding-3-small", Encoding::Cl100kBase),
    ("text-embedding-3-large", Encoding::Cl100kBase),
    ("text-davinci-003", Encoding::P50kBase),
    ("text-davinci-002", Encoding::P50kBase),
    ("code-davinci-002", Encoding::P50kBase),
    ("code-davinci-001", Encoding::P50kBase),
    ("code-cushman-002", Encoding::P50kBase),
    ("code-cushman-001", Encoding::P50kBase),
    ("text-davinci-edit-001", Encoding::P50kEdit),
    ("code-davinci-edit-001", Encoding::P50kEdit),
    ("text-davinci-001", Encoding::R50kBase),
    ("text-curie-001", Encoding::R50kBase),
    ("text-babbage-001", Encoding::R50kBase),
    ("text-ada-001", Encoding::R50kBase),
    ("davinci", Encoding::R50kBase),
    ("curie", Encoding::R50kBase),
    ("babbage", Encoding::R50kBase),
    ("ada", Encoding::R50kBase),
];

/// Versioned and fine-tuned model families, resolved by name prefix.
/// A name is resolved by its first match, so longer prefixes must come
/// before the shorter ones they contain.
const MODEL_PREFIX_TO_ENCODING: &[(&str, Encoding)] = &[
    ("gpt-4o-", Encoding::O200kBase),
    ("gpt-4-", Encoding::Cl100kBase),
    ("gpt-3.5-turbo-", Encoding::Cl100kBase),
    ("gpt-35-turbo-", Encoding::Cl100kBase),
    ("ft:gpt-4o", Encoding::O200kBase),
    ("ft:gpt-4", Encoding::Cl100kBase),
    ("ft:gpt-3.5-turbo", Encoding::Cl100kBase),
];

/// Indicates there was an error resolving a model name, loading a token
/// vocabulary, or turning token ids back into text. The `Display`
/// implementation will provide a human-readable error message to help debug
/// the issue that caused the error.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct TokenizerError(#[from] TokenizerErrorRepr);

/// Private error and free to change across minor version of the crate.
#[derive(Error, Debug)]
enum TokenizerErrorRepr {
    #[error(
        "Unrecognized model or encoding {model:?}. Supported encodings: {}",
        Encoding::supported_names()
    )]
    UnsupportedModel { model: String },
    #[error("Failed to load the {encoding} token vocabulary")]
    Vocabulary {
        encoding: Encoding,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to decode token ids back into text")]
    Decode {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The closed set of OpenAI token vocabularies this crate can load.
///
/// Each variant displays as the encoding name OpenAI uses, e.g.
/// `o200k_base`, and can also be parsed back from it.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, IntoStaticStr, PartialEq)]
pub enum Encoding {
    /// Vocabulary of the `gpt-4o` model family.
    #[strum(serialize = "o200k_base")]
    O200kBase,
    /// Vocabulary of the `gpt-4` and `gpt-3.5-turbo` model families, and of
    /// the current embedding models.
    #[strum(serialize = "cl100k_base")]
    Cl100kBase,
    /// Vocabulary of the older completion and code models.
    #[strum(serialize = "p50k_base")]
    P50kBase,
    /// Vocabulary of the edit models.
    #[strum(serialize = "p50k_edit")]
    P50kEdit,
    /// Vocabulary of the first-generation GPT-3 models.
    #[strum(serialize = "r50k_base")]
    R50kBase,
}

impl Encoding {
    /// Resolve a model name, such as `gpt-4o`, to its encoding.
    ///
    /// Exact model names are checked first, then versioned and fine-tuned
    /// families by prefix, e.g. `gpt-4o-2024-05-13`. An encoding name such as
    /// `cl100k_base` is also accepted directly.
    ///
    /// # Errors
    ///
    /// If the name matches neither a known model nor an encoding, an error
    /// listing the supported encodings is returned.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        MODEL_TO_ENCODING
            .iter()
            .find_map(|&(name, encoding)| (name == model).then_some(encoding))
            .or_else(|| {
                MODEL_PREFIX_TO_ENCODING
                    .iter()
                    .find_map(|&(prefix, encoding)| model.starts_with(prefix).then_some(encoding))
            })
            .map_or_else(
                || {
                    model.parse().map_err(|_| {
                        TokenizerError(TokenizerErrorRepr::UnsupportedModel {
                            model: model.to_string(),
                        })
                    })
                },
                Ok,
            )
    }

    /// Load the byte pair merge ranks for this encoding into a usable
    /// tokenizer.
    fn load(self) -> Result<CoreBPE, TokenizerError> {
        let bpe = match self {
            Self::O200kBase => tiktoken_rs::o200k_base(),
            Self::Cl100kBase => tiktoken_rs::cl100k_base(),
            Self::P50kBase => tiktoken_rs::p50k_base(),
            Self::P50kEdit => tiktoken_rs::p50k_edit(),
            Self::R50kBase => tiktoken_rs::r50k_base(),
        };
        bpe.map_err(|err| {
            TokenizerError(TokenizerErrorRepr::Vocabulary {
                encoding: self,
                source: err.into(),
            })
        })
    }

    /// Comma-separated list of every encoding name, for error messages.
    fn supported_names() -> String {
        Self::iter()
            .map(<&'static str>::from)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A loaded tokenizer for one of the supported [`Encoding`]s.
///
/// Loading the vocabulary is the expensive part, so construct a `Tokenizer`
/// once and reuse it for as many [`encode`](Self::encode) and
/// [`decode`](Self::decode) calls as needed. The tokenizer holds its merge
/// ranks directly and is immutable once built. Cloning is cheaper than
/// loading, but still copies the vocabulary.
#[derive(Clone)]
pub struct Tokenizer {
    encoding: Encoding,
    bpe: CoreBPE,
}

impl Tokenizer {
    /// Load the tokenizer for a model name, such as `gpt-4o`.
    ///
    /// # Errors
    ///
    /// If the model name is not recognized, or its vocabulary fails to load,
    /// an error is returned.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        Self::new(Encoding::for_model(model)?)
    }

    /// Load the tokenizer for the given encoding.
    ///
    /// # Errors
    ///
    /// If the vocabulary fails to load, an error is returned.
    pub fn new(encoding: Encoding) -> Result<Self, TokenizerError> {
        Ok(Self {
            encoding,
            bpe: encoding.load()?,
        })
    }

    /// The encoding this tokenizer was loaded with.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Tokenize text into its token ids.
    ///
    /// All text is tokenized as ordinary text. Special token markers such as
    /// `<|endoftext|>` carry no special meaning here and are tokenized like
    /// any other characters, so every string can be encoded.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_ordinary(text)
    }

    /// Turn token ids back into the text they were encoded from.
    ///
    /// # Errors
    ///
    /// If any id has no entry in the vocabulary, or the ids do not decode to
    /// valid UTF-8, which can happen when a sequence is cut between the
    /// tokens of a multi-byte character, an error is returned.
    pub fn decode(&self, tokens: &[usize]) -> Result<String, TokenizerError> {
        // `CoreBPE::decode` panics on ids missing from the vocabulary instead
        // of returning `Err`; the panic is caught and surfaced as a decode
        // failure.
        let decoded = panic::catch_unwind(AssertUnwindSafe(|| self.bpe.decode(tokens.to_vec())))
            .map_err(|payload| {
                TokenizerError(TokenizerErrorRepr::Decode {
                    source: panic_reason(&*payload).into(),
                })
            })?;
        decoded.map_err(|err| TokenizerError(TokenizerErrorRepr::Decode { source: err.into() }))
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Text of a caught panic's payload, for the error source chain.
fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("the decoder panicked")
    }
}

#[cfg(test)]
mod tests {
    use fake::{Fake, Faker};
    use once_cell::sync::Lazy;

    use super::*;

    static TOKENIZER: Lazy<Tokenizer> =
        Lazy::new(|| Tokenizer::new(Encoding::Cl100kBase).unwrap());

    #[test]
    fn resolves_exact_model_names() {
        assert_eq!(Encoding::for_model("gpt-4o").unwrap(), Encoding::O200kBase);
        assert_eq!(Encoding::for_model("gpt-4").unwrap(), Encoding::Cl100kBase);
        assert_eq!(
            Encoding::for_model("text-davinci-003").unwrap(),
            Encoding::P50kBase
        );
        assert_eq!(
            Encoding::for_model("text-davinci-edit-001").unwrap(),
            Encoding::P50kEdit
        );
        assert_eq!(Encoding::for_model("davinci").unwrap(), Encoding::R50kBase);
    }

    #[test]
    fn resolves_versioned_model_names_by_prefix() {
        assert_eq!(
            Encoding::for_model("gpt-4o-2024-05-13").unwrap(),
            Encoding::O200kBase
        );
        assert_eq!(
            Encoding::for_model("gpt-4-turbo").unwrap(),
            Encoding::Cl100kBase
        );
        assert_eq!(
            Encoding::for_model("gpt-3.5-turbo-16k").unwrap(),
            Encoding::Cl100kBase
        );
        assert_eq!(
            Encoding::for_model("ft:gpt-4o:my-org::abc123").unwrap(),
            Encoding::O200kBase
        );
    }

    #[test]
    fn resolves_encoding_names_directly() {
        assert_eq!(
            Encoding::for_model("o200k_base").unwrap(),
            Encoding::O200kBase
        );
        assert_eq!(
            Encoding::for_model("cl100k_base").unwrap(),
            Encoding::Cl100kBase
        );
    }

    #[test]
    fn rejects_unknown_model_names() {
        let message = Encoding::for_model("gpt-imaginary")
            .unwrap_err()
            .to_string();
        assert!(message.contains("gpt-imaginary"));
        assert!(message.contains("o200k_base"));
        assert!(message.contains("cl100k_base"));
    }

    #[test]
    fn encoding_displays_as_its_canonical_name() {
        assert_eq!(Encoding::O200kBase.to_string(), "o200k_base");
        assert_eq!(Encoding::Cl100kBase.to_string(), "cl100k_base");
        assert_eq!(Encoding::R50kBase.to_string(), "r50k_base");
    }

    #[test]
    fn encode_and_decode_round_trip() {
        let text = Faker.fake::<String>();
        let tokens = TOKENIZER.encode(&text);
        assert_eq!(TOKENIZER.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn special_token_markers_are_ordinary_text() {
        let text = "An <|endoftext|> marker mid-sentence.";
        let tokens = TOKENIZER.encode(text);
        assert_eq!(TOKENIZER.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn out_of_vocabulary_ids_fail_to_decode() {
        let error = TOKENIZER.decode(&[usize::MAX]).unwrap_err();
        assert!(error.to_string().contains("decode token ids"));
    }

    #[test]
    fn partial_multi_byte_characters_fail_to_decode() {
        // A single emoji spans several tokens, so any strict subset of them
        // holds an incomplete UTF-8 sequence.
        let tokens = TOKENIZER.encode("🦀");
        assert!(tokens.len() > 1);

        let error = TOKENIZER.decode(&tokens[..1]).unwrap_err();
        assert!(error.to_string().contains("decode token ids"));
    }

    #[test]
    fn empty_text_encodes_to_no_tokens() {
        assert!(TOKENIZER.encode("").is_empty());
        assert_eq!(TOKENIZER.decode(&[]).unwrap(), "");
    }
}
