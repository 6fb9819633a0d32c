use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.,'"?/#!$%^&*;:{}=\-_`~()]"#).expect("punctuation pattern"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\s+").expect("whitespace pattern"));

/// Canonical form of an utterance, used as the audio store's lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already-normalized key, e.g. one read back from storage or a URL
    pub fn from_normalized(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize raw input text into a cache key.
///
/// Two inputs that differ only in case, punctuation or whitespace run-length
/// map to the same key. The steps run in a fixed order:
/// 1. strip punctuation
/// 2. collapse runs of two or more whitespace characters into one space
/// 3. trim
/// 4. lowercase
pub fn normalize(text: &str) -> CacheKey {
    let without_punctuation = PUNCTUATION.replace_all(text, "");
    let collapsed = WHITESPACE_RUN.replace_all(&without_punctuation, " ");
    CacheKey(collapsed.trim().to_lowercase())
}
