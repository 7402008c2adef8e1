use crate::config::{Configuration, ResourcePaths};
use crate::env::EnvironmentVariables;
use anyhow::{Context, Result, anyhow, bail};
use std::path::{Path, PathBuf};
use tiktoken_rs::CoreBPE;
use tracing::{debug, info, warn};

/// Name given to the locally trained tokenizer that NSL values are measured against
pub const CUSTOM_TOKENIZER_NAME: &str = "CUSTOM tokenizer";

/// Identifier prefix selecting an OpenAI BPE encoding bundled with `tiktoken-rs`
pub const TIKTOKEN_PREFIX: &str = "tiktoken/";

/// Output of tokenizing one document
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedText {
    /// The token sequence rendered as a single string
    pub tokens: String,
    /// The individual tokens
    pub split: Vec<String>,
}

impl TokenizedText {
    /// Build from individual tokens, joining them with a single space
    pub fn from_split(split: Vec<String>) -> Self {
        Self {
            tokens: split.join(" "),
            split,
        }
    }
}

pub trait Tokenizer {
    /// Display name, also used to derive table and file names
    fn name(&self) -> &str;

    /// Whether this tokenizer is the baseline for normalized sequence lengths
    fn is_custom(&self) -> bool {
        false
    }

    fn tokenize(&self, text: &str) -> Result<TokenizedText>;
}

/// Returns true when `name` designates a custom tokenizer baseline
pub fn is_custom_tokenizer(name: &str) -> bool {
    name.to_lowercase().contains("custom tokenizer")
}

/// Table name derived from a tokenizer name, e.g. "bert/base" -> "bert_base"
pub fn sanitize_name(name: &str) -> String {
    name.replace('/', "_")
}

pub struct TiktokenTokenizer {
    name: String,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    /// Load one of the bundled encodings by name (`cl100k_base`, `gpt2`, ...)
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "o200k_base" => tiktoken_rs::o200k_base(),
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
            other => bail!("Unknown tiktoken encoding: {}", other),
        }
        .context(format!("Failed to load tiktoken encoding {}", encoding))?;

        Ok(Self {
            name: format!("{}{}", TIKTOKEN_PREFIX, encoding),
            bpe,
        })
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tokenize(&self, text: &str) -> Result<TokenizedText> {
        let split = self
            .bpe
            .split_by_token(text, false)
            .context(format!("{} failed to tokenize document", self.name))?;
        Ok(TokenizedText::from_split(split))
    }
}

/// A tokenizer backed by the Hugging Face `tokenizers` crate.
///
/// Hub tokenizers report their own token strings. The custom tokenizer is measured on
/// its round trip instead: the document is encoded, decoded back and the decoded text
/// is split on whitespace.
pub struct HuggingFaceTokenizer {
    name: String,
    inner: tokenizers::Tokenizer,
    custom: bool,
}

impl HuggingFaceTokenizer {
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow!(e))
            .context(format!("Failed to load tokenizer from {}", path.display()))?;
        Ok(Self {
            name: name.into(),
            inner,
            custom: false,
        })
    }

    /// Download a tokenizer from the Hugging Face hub
    pub fn from_pretrained(identifier: &str, access_token: Option<&str>) -> Result<Self> {
        let params = tokenizers::FromPretrainedParameters {
            token: access_token.map(str::to_string),
            ..Default::default()
        };
        let inner = tokenizers::Tokenizer::from_pretrained(identifier, Some(params))
            .map_err(|e| anyhow!(e))
            .context(format!("Failed to fetch tokenizer {} from the hub", identifier))?;
        Ok(Self {
            name: identifier.to_string(),
            inner,
            custom: false,
        })
    }

    /// Load the custom baseline tokenizer from a `tokenizer.json` file
    pub fn custom(path: &Path) -> Result<Self> {
        let mut tokenizer = Self::from_file(CUSTOM_TOKENIZER_NAME, path)?;
        tokenizer.custom = true;
        Ok(tokenizer)
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_custom(&self) -> bool {
        self.custom
    }

    fn tokenize(&self, text: &str) -> Result<TokenizedText> {
        if self.custom {
            let encoding = self
                .inner
                .encode(text, true)
                .map_err(|e| anyhow!(e))
                .context(format!("{} failed to encode document", self.name))?;
            let decoded = self
                .inner
                .decode(encoding.get_ids(), true)
                .map_err(|e| anyhow!(e))
                .context(format!("{} failed to decode document", self.name))?;
            let split = decoded.split_whitespace().map(str::to_string).collect();
            Ok(TokenizedText {
                tokens: decoded,
                split,
            })
        } else {
            let encoding = self
                .inner
                .encode(text, false)
                .map_err(|e| anyhow!(e))
                .context(format!("{} failed to tokenize document", self.name))?;
            Ok(TokenizedText::from_split(encoding.get_tokens().to_vec()))
        }
    }
}

/// Local copy of a hub tokenizer, if one was saved under the tokenizers directory
fn local_tokenizer_file(paths: &ResourcePaths, identifier: &str) -> Option<PathBuf> {
    let candidate = paths
        .tokenizers
        .join(sanitize_name(identifier))
        .join("tokenizer.json");
    candidate.is_file().then_some(candidate)
}

/// Resolve a single configured identifier into a tokenizer
pub fn load_tokenizer(
    identifier: &str,
    paths: &ResourcePaths,
    env: &EnvironmentVariables,
) -> Result<Box<dyn Tokenizer>> {
    if let Some(encoding) = identifier.strip_prefix(TIKTOKEN_PREFIX) {
        debug!(identifier, "Loading bundled tiktoken encoding");
        return Ok(Box::new(TiktokenTokenizer::new(encoding)?));
    }

    if let Some(path) = local_tokenizer_file(paths, identifier) {
        debug!(identifier, path = %path.display(), "Loading tokenizer from local copy");
        return Ok(Box::new(HuggingFaceTokenizer::from_file(identifier, &path)?));
    }

    info!(identifier, "Downloading tokenizer from the Hugging Face hub");
    Ok(Box::new(HuggingFaceTokenizer::from_pretrained(
        identifier,
        env.get_hf_access_token(),
    )?))
}

/// Configured identifiers in first-appearance order, each listed once
pub fn unique_identifiers(identifiers: &[String]) -> Vec<&str> {
    let mut unique: Vec<&str> = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        if unique.contains(&identifier.as_str()) {
            warn!(identifier = identifier.as_str(), "Tokenizer listed more than once; ignoring repeat");
        } else {
            unique.push(identifier);
        }
    }
    unique
}

/// Load every configured tokenizer in order, followed by the custom tokenizer if any
pub fn load_tokenizers(
    configuration: &Configuration,
    paths: &ResourcePaths,
    env: &EnvironmentVariables,
) -> Result<Vec<Box<dyn Tokenizer>>> {
    let mut tokenizers = unique_identifiers(&configuration.tokenizers)
        .into_iter()
        .map(|identifier| load_tokenizer(identifier, paths, env))
        .collect::<Result<Vec<_>>>()?;

    if let Some(custom) = &configuration.custom_tokenizer {
        let path = if custom.is_absolute() {
            custom.clone()
        } else {
            paths.tokenizers.join(custom)
        };
        info!(path = %path.display(), "Loading custom tokenizer");
        tokenizers.push(Box::new(HuggingFaceTokenizer::custom(&path)?));
    }

    info!("{} tokenizer(s) loaded", tokenizers.len());
    Ok(tokenizers)
}
