//! Artifact resolution for the classification model.
//!
//! A model is either a local directory (typically the output of a fine-tuning
//! run) or a Hugging Face Hub repository. Both are reduced to the same set of
//! files on disk:
//!
//! - `config.json` with the architecture and the `id2label` map
//! - weights as `model.safetensors` or `pytorch_model.bin`
//! - a tokenizer as `tokenizer.json`, or a WordPiece `vocab.txt`
//!
//! ## Main Types
//!
//! - [`ModelSource`] - where the model comes from
//! - [`HfLoader`] - single-file hub download with retry on lock contention
//! - [`ModelFiles`] - the resolved paths, ready for the model loader

use anyhow::Context;
use hf_hub::api::sync::Api as HfApi;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";
const TOKENIZER_FILE: &str = "tokenizer.json";
const VOCAB_FILE: &str = "vocab.txt";
const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";

/// Where the classification model is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A local directory holding a fine-tuned model.
    Local(PathBuf),
    /// A Hugging Face Hub repository id.
    Hub(String),
}

impl ModelSource {
    /// Prefers `model_path` when it is an existing, non-empty directory and
    /// falls back to the hub repository `model_id` otherwise.
    pub fn resolve(model_path: &Path, model_id: &str) -> Self {
        if is_non_empty_dir(model_path) {
            ModelSource::Local(model_path.to_path_buf())
        } else {
            ModelSource::Hub(model_id.to_string())
        }
    }

    /// Resolves every file the classifier needs, downloading from the hub if required.
    pub fn fetch(&self) -> anyhow::Result<ModelFiles> {
        match self {
            ModelSource::Local(dir) => ModelFiles::from_dir(dir),
            ModelSource::Hub(repo) => ModelFiles::from_hub(repo),
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Local(dir) => write!(f, "local:{}", dir.display()),
            ModelSource::Hub(repo) => write!(f, "hub:{repo}"),
        }
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// The tokenizer artifact shipped with a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerFile {
    /// A serialized `tokenizers` pipeline.
    Json(PathBuf),
    /// A WordPiece vocabulary; the BERT pipeline is assembled around it.
    Vocab { path: PathBuf, lowercase: bool },
}

/// Paths of a resolved model artifact.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
    pub tokenizer: TokenizerFile,
}

impl ModelFiles {
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let config = dir.join(CONFIG_FILE);
        anyhow::ensure!(
            config.is_file(),
            "{CONFIG_FILE} not found in {}",
            dir.display()
        );

        let weights = [SAFETENSORS_FILE, PYTORCH_FILE]
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
            .with_context(|| {
                format!(
                    "Model weights not found in {}. Expected `{SAFETENSORS_FILE}` or `{PYTORCH_FILE}`",
                    dir.display()
                )
            })?;

        let tokenizer_json = dir.join(TOKENIZER_FILE);
        let vocab = dir.join(VOCAB_FILE);
        let tokenizer = if tokenizer_json.is_file() {
            TokenizerFile::Json(tokenizer_json)
        } else if vocab.is_file() {
            let tokenizer_config = dir.join(TOKENIZER_CONFIG_FILE);
            TokenizerFile::Vocab {
                path: vocab,
                lowercase: read_lowercase_flag(tokenizer_config.is_file().then_some(&tokenizer_config)),
            }
        } else {
            anyhow::bail!(
                "No tokenizer found in {}. Expected `{TOKENIZER_FILE}` or `{VOCAB_FILE}`",
                dir.display()
            );
        };

        Ok(Self {
            config,
            weights,
            tokenizer,
        })
    }

    pub fn from_hub(repo: &str) -> anyhow::Result<Self> {
        let fetch = |name: &str| HfLoader::new(repo, name).load();

        let config = fetch(CONFIG_FILE)?;
        let (_, weights) = fetch_first(repo, &[SAFETENSORS_FILE, PYTORCH_FILE], fetch)
            .context("Model weights not found")?;

        let tokenizer = match fetch_first(repo, &[TOKENIZER_FILE, VOCAB_FILE], fetch)
            .context("No tokenizer found")?
        {
            (0, path) => TokenizerFile::Json(path),
            (_, path) => {
                let tokenizer_config = fetch(TOKENIZER_CONFIG_FILE).ok();
                TokenizerFile::Vocab {
                    path,
                    lowercase: read_lowercase_flag(tokenizer_config.as_ref()),
                }
            }
        };

        Ok(Self {
            config,
            weights,
            tokenizer,
        })
    }
}

/// Fetches the first of `names` that succeeds, returning its index and path.
/// When all fail, the error carries every attempt's reason.
fn fetch_first<F>(repo: &str, names: &[&str], fetch: F) -> anyhow::Result<(usize, PathBuf)>
where
    F: Fn(&str) -> anyhow::Result<PathBuf>,
{
    let mut failures = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        match fetch(*name) {
            Ok(path) => return Ok((idx, path)),
            Err(e) => failures.push(format!("`{name}`: {e:#}")),
        }
    }
    anyhow::bail!("could not fetch any of {names:?} from {repo} ({})", failures.join("; "))
}

/// Reads `do_lower_case` from a `tokenizer_config.json`, defaulting to `true`.
fn read_lowercase_flag(tokenizer_config: Option<&PathBuf>) -> bool {
    #[derive(serde::Deserialize)]
    struct RawTokenizerConfig {
        do_lower_case: Option<bool>,
    }

    tokenizer_config
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| serde_json::from_str::<RawTokenizerConfig>(&content).ok())
        .and_then(|raw| raw.do_lower_case)
        .unwrap_or(true)
}

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = HfApi::new()?;
        let hf_api = hf_api.model(self.repo.clone());

        // Retry logic for lock acquisition failures
        let max_retries = 3;
        let mut attempt = 0;

        loop {
            match hf_api.get(self.filename.as_str()) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    let error_msg = e.to_string();
                    if error_msg.contains("Lock acquisition failed") && attempt < max_retries - 1 {
                        // Wait before retrying, with exponential backoff
                        std::thread::sleep(Duration::from_millis(100 * (1 << attempt)));
                        attempt += 1;
                        continue;
                    }
                    return Err(anyhow::Error::new(e)
                        .context(format!("failed to fetch {} from {}", self.filename, self.repo)));
                }
            }
        }
    }
}
