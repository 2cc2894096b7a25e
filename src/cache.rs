use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the documents written to the cache directory
const STATE_EXTENSION: &str = "json";

/// Manages the directory that holds saved UI state
#[derive(Debug, Clone)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    /// Create a new CacheManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    /// Use an explicit directory (tests, portable installs)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the state document stored under `key`
    pub fn state_file(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, STATE_EXTENSION))
    }

    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Remove the state document stored under `key`
    pub fn clear_state(&self, key: &str) -> Result<()> {
        let file_path = self.state_file(key);
        if file_path.exists() {
            fs::remove_file(&file_path)?;
        }
        Ok(())
    }

    /// Remove every state document; returns how many were removed
    pub fn clear_all(&self) -> Result<usize> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some(STATE_EXTENSION)
            {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Could not remove cache file {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }
}
