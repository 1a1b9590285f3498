//! Challenge catalog
//!
//! Rooms draw their puzzle from a [`ChallengeSupplier`] exactly once, at creation.
//! The default supplier is a [`ChallengeCatalog`], either built in or loaded from a
//! JSON file shaped like `{"regex": ["..."], "strings": [["..", ".."]]}`.

use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::{Challenge, ChallengeCategory};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog has no {0} challenges")]
    Empty(ChallengeCategory),

    #[error("catalog has a blank {0} challenge")]
    BlankEntry(ChallengeCategory),
}

/// Source of room challenges
pub trait ChallengeSupplier: Send + Sync {
    /// Pick one challenge for the given category
    fn next_challenge(&self, category: ChallengeCategory) -> Challenge;
}

/// On-disk catalog layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    regex: Vec<String>,
    #[serde(default)]
    strings: Vec<Vec<String>>,
}

/// Catalog with at least one entry per category; picks uniformly at random
#[derive(Debug, Clone)]
pub struct ChallengeCatalog {
    regex: Vec<String>,
    strings: Vec<Vec<String>>,
}

impl ChallengeCatalog {
    pub fn new(regex: Vec<String>, strings: Vec<Vec<String>>) -> Result<Self, CatalogError> {
        if regex.is_empty() {
            return Err(CatalogError::Empty(ChallengeCategory::Regex));
        }
        if strings.is_empty() {
            return Err(CatalogError::Empty(ChallengeCategory::Strings));
        }
        if regex.iter().any(|p| p.trim().is_empty()) {
            return Err(CatalogError::BlankEntry(ChallengeCategory::Regex));
        }
        if strings.iter().any(|set| set.is_empty()) {
            return Err(CatalogError::BlankEntry(ChallengeCategory::Strings));
        }

        Ok(Self { regex, strings })
    }

    /// Small catalog used when no file is configured
    pub fn builtin() -> Self {
        let regex = [r"\d{3}\w", r"^[a-z]+@[a-z]+\.com$", r"(ab)+c?", r"^0x[0-9a-f]{2,4}$"];
        let strings: [&[&str]; 4] = [
            &["aa", "bb", "cc"],
            &["cat", "hat", "bat"],
            &["2024-01-01", "1999-12-31", "2000-02-29"],
            &["foo.rs", "bar.rs", "lib.rs"],
        ];

        Self {
            regex: regex.iter().map(|s| s.to_string()).collect(),
            strings: strings
                .iter()
                .map(|set| set.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.regex, file.strings)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            "Loaded challenge catalog from {:?}: {} regex, {} string sets",
            path,
            catalog.regex.len(),
            catalog.strings.len()
        );
        Ok(catalog)
    }

    /// Number of entries available for `category`
    pub fn len(&self, category: ChallengeCategory) -> usize {
        match category {
            ChallengeCategory::Regex => self.regex.len(),
            ChallengeCategory::Strings => self.strings.len(),
        }
    }
}

impl Default for ChallengeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChallengeSupplier for ChallengeCatalog {
    fn next_challenge(&self, category: ChallengeCategory) -> Challenge {
        let mut rng = rand::rng();
        // Both lists are non-empty by construction
        match category {
            ChallengeCategory::Regex => Challenge::Regex {
                pattern: self.regex[rng.random_range(0..self.regex.len())].clone(),
            },
            ChallengeCategory::Strings => Challenge::Strings {
                options: self.strings[rng.random_range(0..self.strings.len())].clone(),
            },
        }
    }
}
