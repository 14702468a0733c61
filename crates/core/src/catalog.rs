//! Topic Catalog
//!
//! The catalog is loaded once per process and shared read-only between the
//! matcher and the scheduler. Loading problems never abort the service: they
//! are logged and the catalog comes up empty, which downstream stages treat as
//! a degraded-but-valid input.

use crate::topic::Topic;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Errors that can occur while reading a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog JSON")]
    Parse(#[from] serde_json::Error),
}

/// Accepted file layouts: a bare array or an object wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Bare(Vec<Topic>),
    Wrapped { topics: Vec<Topic> },
}

/// An ordered, immutable list of topics. Catalog order is significant: every
/// tie in selection and scheduling is broken by it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    topics: Vec<Topic>,
}

impl Catalog {
    /// Builds a catalog, dropping entries whose name was already seen.
    pub fn new(topics: Vec<Topic>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(topics.len());
        for topic in topics {
            if seen.insert(topic.name.clone()) {
                unique.push(topic);
            } else {
                warn!(topic = %topic.name, "Duplicate topic name in catalog; keeping the first entry");
            }
        }
        Self { topics: unique }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let topics = match file {
            CatalogFile::Bare(topics) => topics,
            CatalogFile::Wrapped { topics } => topics,
        };
        Ok(Self::new(topics))
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Loads a catalog, degrading to an empty one on any failure.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(catalog) => {
                info!(path = %path.display(), topics = catalog.len(), "Topic catalog loaded");
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = ?e, "Topic catalog unavailable; continuing with an empty catalog");
                Self::default()
            }
        }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Distinct niches in order of first appearance.
    pub fn niche_order(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.topics
            .iter()
            .map(|t| t.niche.as_str())
            .filter(|niche| seen.insert(*niche))
            .collect()
    }
}
