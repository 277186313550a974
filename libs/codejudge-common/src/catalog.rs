// Problem catalog
// Loaded once, validated up front, immutable afterwards

use crate::types::{Difficulty, Problem};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../../config/problems.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid problem at index {index}: {reason}")]
    Invalid { index: usize, reason: String },

    #[error("duplicate problem id: {0}")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    problems: Vec<Problem>,
}

#[derive(Debug, Clone)]
pub struct ProblemCatalog {
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    /// Catalog shipped with the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::new(file.problems)
    }

    pub fn new(problems: Vec<Problem>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();

        for (index, problem) in problems.iter().enumerate() {
            if problem.id.trim().is_empty() {
                return Err(CatalogError::Invalid {
                    index,
                    reason: "empty id".to_string(),
                });
            }
            if problem.title.trim().is_empty() {
                return Err(CatalogError::Invalid {
                    index,
                    reason: format!("problem '{}' has an empty title", problem.id),
                });
            }
            if problem.test_cases.is_empty() {
                return Err(CatalogError::Invalid {
                    index,
                    reason: format!("problem '{}' has no visible test cases", problem.id),
                });
            }
            if !seen.insert(problem.id.as_str()) {
                return Err(CatalogError::Duplicate(problem.id.clone()));
            }
        }

        Ok(Self { problems })
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Case-insensitive match on title or description
    pub fn search(&self, query: &str) -> Vec<&Problem> {
        let needle = query.trim().to_lowercase();
        self.problems
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.title.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn count_by_difficulty(&self, difficulty: Difficulty) -> usize {
        self.problems
            .iter()
            .filter(|p| p.difficulty == difficulty)
            .count()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
