//! Knowledge base loading: one fetch at startup, structural validation,
//! optional cache-first offline copy.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::AssetCache;
use crate::KnowledgeBase;

/// Top-level sections every knowledge base document must carry.
pub const REQUIRED_SECTIONS: [&str; 3] = ["symptoms", "questions", "chemicalTests"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read knowledge base: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not fetch knowledge base: {0}")]
    Http(#[from] reqwest::Error),

    #[error("knowledge base request failed with status {0}")]
    Status(u16),

    #[error("knowledge base is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("knowledge base must be a JSON object")]
    NotAnObject,

    #[error("missing {0} section in knowledge base")]
    MissingSection(&'static str),

    #[error("duplicate question key: {0}")]
    DuplicateQuestion(String),
}

/// Parse and validate a knowledge base document.
pub fn parse_knowledge_base(raw: &str) -> Result<KnowledgeBase, LoadError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value.as_object().ok_or(LoadError::NotAnObject)?;
    for section in REQUIRED_SECTIONS {
        if object.get(section).map_or(true, Value::is_null) {
            return Err(LoadError::MissingSection(section));
        }
    }

    // Typed pass reads the text again: `Value` objects do not keep symptom order.
    let kb: KnowledgeBase = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    for question in &kb.questions {
        if !seen.insert(question.key.as_str()) {
            return Err(LoadError::DuplicateQuestion(question.key.clone()));
        }
    }
    Ok(kb)
}

/// Where the knowledge base document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeSource {
    File(PathBuf),
    Remote(String),
}

impl KnowledgeSource {
    /// Fetch the raw document text.
    pub async fn fetch(&self) -> Result<String, LoadError> {
        match self {
            KnowledgeSource::File(path) => Ok(std::fs::read_to_string(path)?),
            KnowledgeSource::Remote(url) => {
                let response = reqwest::get(url).await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Status(status.as_u16()));
                }
                Ok(response.text().await?)
            }
        }
    }

    /// File name used for this source's entry in the offline cache.
    pub fn cache_key(&self) -> String {
        let raw = self.to_string();
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for KnowledgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeSource::File(path) => write!(f, "{}", path.display()),
            KnowledgeSource::Remote(url) => f.write_str(url),
        }
    }
}

pub struct Loader {
    source: KnowledgeSource,
    cache: Option<AssetCache>,
}

impl Loader {
    pub fn new(source: KnowledgeSource) -> Self {
        Self { source, cache: None }
    }

    /// Serve remote documents cache-first from `cache`, storing fresh fetches
    /// in it. File sources always read the file.
    pub fn with_cache(mut self, cache: AssetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn offline_cache(&self) -> Option<&AssetCache> {
        match self.source {
            KnowledgeSource::Remote(_) => self.cache.as_ref(),
            KnowledgeSource::File(_) => None,
        }
    }

    /// Load the knowledge base once. No retry on failure.
    pub async fn load(&self) -> Result<KnowledgeBase, LoadError> {
        let key = self.source.cache_key();

        if let Some(raw) = self.offline_cache().and_then(|cache| cache.get(&key)) {
            match parse_knowledge_base(&raw) {
                Ok(kb) => {
                    debug!(source = %self.source, "knowledge base served from offline cache");
                    return Ok(kb);
                }
                Err(e) => warn!(source = %self.source, error = %e, "ignoring unusable cached knowledge base"),
            }
        }

        let raw = self.source.fetch().await.inspect_err(|e| {
            warn!(source = %self.source, error = %e, "failed to fetch knowledge base");
        })?;
        let kb = parse_knowledge_base(&raw)?;

        if let Some(cache) = self.offline_cache() {
            cache.put(&key, &raw);
        }
        info!(
            source = %self.source,
            symptoms = kb.symptoms.len(),
            questions = kb.questions.len(),
            chemical_tests = kb.chemical_tests.len(),
            "knowledge base loaded"
        );
        Ok(kb)
    }
}
