use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{expand_path, CorpusConfig};
use crate::error::Error;
use crate::types::Document;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Reads every file directly inside `dir` whose name matches the glob.
/// Subdirectories are not descended into.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
    pattern: Pattern,
}

impl CorpusLoader {
    pub fn new(dir: impl Into<PathBuf>, glob: &str) -> crate::error::Result<Self> {
        let pattern = Pattern::new(glob)
            .map_err(|e| Error::InvalidConfig(format!("corpus.glob '{glob}': {e}")))?;
        Ok(Self { dir: dir.into(), pattern })
    }

    pub fn from_config(config: &CorpusConfig) -> crate::error::Result<Self> {
        Self::new(expand_path(&config.dir), &config.glob)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load matching files sorted by path. A missing or empty directory is
    /// not an error: it yields no documents and an empty index downstream.
    pub fn load(&self) -> Result<Vec<Document>> {
        let files = self.list_files();
        if files.is_empty() {
            warn!(dir = %self.dir.display(), pattern = %self.pattern, "No matching files; the index will be empty");
            return Ok(Vec::new());
        }
        let mut docs = Vec::with_capacity(files.len());
        for path in &files {
            debug!(file = %path.display(), "Loading document");
            let content = read_file_content(path)?;
            docs.push(Document::new(path.to_string_lossy(), content));
        }
        info!(documents = docs.len(), dir = %self.dir.display(), "Loaded corpus");
        Ok(docs)
    }

    fn list_files(&self) -> Vec<PathBuf> {
        if !self.dir.is_dir() {
            return Vec::new();
        }
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|name| self.pattern.matches_with(name, MATCH_OPTIONS))
            })
            .map(walkdir::DirEntry::into_path)
            .collect();
        files.sort();
        files
    }
}

fn read_file_content(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}
