//! Saved UI state: one bounded JSON document per key in the cache directory.
//!
//! Storage problems never reach the user. A missing, unreadable, oversized or
//! corrupt document is treated as "nothing saved", and a failed save is skipped;
//! both are logged as warnings.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::time::SystemTime;

use crate::cache::CacheManager;
use crate::config::PreferencesConfig;
use crate::filter::{BusinessModelFilter, FilterState, PublisherTypeFilter};
use crate::query::{SortDirection, SortOrder};
use crate::row::{Column, ColumnSet};

// SystemTime as seconds since the epoch
mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).map_err(|e| {
            serde::ser::Error::custom(format!("Failed to serialize SystemTime: {}", e))
        })?;
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSort {
    /// 0-based column index in display order
    pub column: usize,
    pub dir: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedApcRange {
    pub apc_min: u32,
    pub apc_max: u32,
}

/// The persisted slice of UI state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    #[serde(with = "time_serde")]
    pub time: SystemTime,
    /// Column header → visible
    #[serde(default)]
    pub columns: BTreeMap<String, bool>,
    #[serde(default)]
    pub order: Option<SavedSort>,
    #[serde(default)]
    pub search: String,
    /// Column header → search term, including the two category columns
    #[serde(default)]
    pub column_searches: BTreeMap<String, String>,
    #[serde(default)]
    pub custom: Option<SavedApcRange>,
}

impl PreferenceSnapshot {
    pub fn capture(state: &FilterState, columns: &ColumnSet, sort: Option<&SortOrder>) -> Self {
        let visibility = Column::ALL
            .iter()
            .map(|c| (c.header().to_string(), columns.contains(*c)))
            .collect();

        let mut column_searches: BTreeMap<String, String> = state
            .value_filters()
            .iter()
            .map(|(column, term)| (column.header().to_string(), term.clone()))
            .collect();
        if let Some(term) = state.publisher_type().search_term() {
            column_searches.insert(Column::PublisherType.header().to_string(), term.to_string());
        }
        if let Some(term) = state.business_model().search_term() {
            column_searches.insert(Column::BusinessModel.header().to_string(), term.to_string());
        }

        Self {
            time: SystemTime::now(),
            columns: visibility,
            order: sort.map(|o| SavedSort {
                column: o.column.index(),
                dir: o.direction,
            }),
            search: state.text_query().to_string(),
            column_searches,
            custom: Some(SavedApcRange {
                apc_min: state.apc_min(),
                apc_max: state.apc_max(),
            }),
        }
    }

    /// Layer the saved filters over `base`. Out-of-range APC bounds are clamped and
    /// unknown columns are ignored.
    pub fn restore_filters(&self, base: FilterState) -> FilterState {
        let mut state = base.with_text_query(&self.search);
        for (header, term) in &self.column_searches {
            match Column::parse(header) {
                Some(Column::PublisherType) => {
                    state = state.with_publisher_type(PublisherTypeFilter::from_search_term(term));
                }
                Some(Column::BusinessModel) => {
                    state = state.with_business_model(BusinessModelFilter::from_search_term(term));
                }
                Some(column) => state = state.with_value_filter(column, Some(term)),
                None => tracing::debug!(header = header.as_str(), "ignoring saved search"),
            }
        }
        if let Some(range) = self.custom {
            state = state.with_apc_range(range.apc_min, range.apc_max);
        }
        state
    }

    /// Saved column visibility, `None` when nothing was saved.
    pub fn visible_columns(&self) -> Option<ColumnSet> {
        if self.columns.is_empty() {
            return None;
        }
        let mut set = ColumnSet::default();
        for (header, visible) in &self.columns {
            if let Some(column) = Column::parse(header) {
                set.set_visible(column, *visible);
            }
        }
        Some(set)
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        let saved = self.order?;
        Column::from_index(saved.column).map(|column| SortOrder::new(column, saved.dir))
    }
}

/// Reads and writes `PreferenceSnapshot`s for one key.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    cache: CacheManager,
    key: String,
    max_bytes: usize,
    enabled: bool,
}

impl PreferenceStore {
    pub fn new(cache: CacheManager, config: &PreferencesConfig) -> Self {
        Self {
            cache,
            key: config.key.clone(),
            max_bytes: config.max_bytes,
            enabled: config.enabled,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The saved snapshot, or `None` if there is none or it cannot be used.
    pub fn load(&self) -> Option<PreferenceSnapshot> {
        if !self.enabled {
            return None;
        }
        match self.try_load() {
            Ok(snapshot) => {
                if let Some(s) = &snapshot {
                    let saved: chrono::DateTime<chrono::Local> = s.time.into();
                    tracing::debug!(
                        key = self.key.as_str(),
                        saved = %saved.format("%Y-%m-%d %H:%M:%S"),
                        "restoring preferences"
                    );
                }
                snapshot
            }
            Err(e) => {
                tracing::warn!("Ignoring saved preferences: {}", e);
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<PreferenceSnapshot>> {
        let path = self.cache.state_file(&self.key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(eyre!("Could not read {}: {}", path.display(), e)),
        };
        if content.len() > self.max_bytes {
            return Err(eyre!(
                "{} is {} bytes, larger than the {} byte limit",
                path.display(),
                content.len(),
                self.max_bytes
            ));
        }
        let snapshot = serde_json::from_str(&content)
            .map_err(|e| eyre!("Could not parse {}: {}", path.display(), e))?;
        Ok(Some(snapshot))
    }

    /// Write `snapshot`; returns whether it was saved.
    pub fn save(&self, snapshot: &PreferenceSnapshot) -> bool {
        if !self.enabled {
            return false;
        }
        match self.try_save(snapshot) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not save preferences: {}", e);
                false
            }
        }
    }

    fn try_save(&self, snapshot: &PreferenceSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        if json.len() > self.max_bytes {
            return Err(eyre!(
                "state is {} bytes, larger than the {} byte limit",
                json.len(),
                self.max_bytes
            ));
        }

        self.cache.ensure_cache_dir()?;

        // Use file locking so two instances don't interleave writes
        use fs2::FileExt;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.cache.state_file(&self.key))?;

        file.lock_exclusive()?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        file.unlock()?;

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.cache.clear_state(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> PreferenceStore {
        PreferenceStore::new(
            CacheManager::with_dir(temp.path().to_path_buf()),
            &PreferencesConfig::default(),
        )
    }

    #[test]
    fn capture_records_category_filters_as_column_searches() {
        let state = FilterState::new(5000)
            .with_publisher_type(PublisherTypeFilter::UniversityPress)
            .with_business_model(BusinessModelFilter::OaDiamond)
            .with_field_filter(Some("Ecology"));
        let snapshot = PreferenceSnapshot::capture(&state, &ColumnSet::default(), None);
        assert_eq!(
            snapshot.column_searches.get("Publisher Type").map(String::as_str),
            Some("University Press")
        );
        assert_eq!(
            snapshot.column_searches.get("Business Model").map(String::as_str),
            Some("OA diamond")
        );
        assert_eq!(
            snapshot.column_searches.get("Subfield").map(String::as_str),
            Some("Ecology")
        );
        assert_eq!(snapshot.columns.get("Website"), Some(&false));
        assert_eq!(snapshot.columns.len(), 14);
    }

    #[test]
    fn restore_clamps_saved_range() {
        let snapshot = PreferenceSnapshot {
            time: SystemTime::now(),
            columns: BTreeMap::new(),
            order: Some(SavedSort {
                column: 99,
                dir: SortDirection::Descending,
            }),
            search: "plants".to_string(),
            column_searches: BTreeMap::from([("Nope".to_string(), "x".to_string())]),
            custom: Some(SavedApcRange {
                apc_min: 8000,
                apc_max: 9000,
            }),
        };
        let state = snapshot.restore_filters(FilterState::new(5000));
        assert_eq!(state.text_query(), "plants");
        assert_eq!((state.apc_min(), state.apc_max()), (5000, 5000));
        assert_eq!(snapshot.sort_order(), None);
        assert_eq!(snapshot.visible_columns(), None);
    }

    #[test]
    fn corrupt_document_is_ignored() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store(&temp);
        fs::write(temp.path().join("wtp_global_state_v1.json"), "{not json")?;
        assert_eq!(store.load(), None);
        Ok(())
    }

    #[test]
    fn oversized_document_is_ignored() -> Result<()> {
        let temp = TempDir::new()?;
        let config = PreferencesConfig {
            max_bytes: 16,
            ..PreferencesConfig::default()
        };
        let store = PreferenceStore::new(CacheManager::with_dir(temp.path().to_path_buf()), &config);
        let snapshot = PreferenceSnapshot::capture(&FilterState::new(5000), &ColumnSet::default(), None);
        assert!(!store.save(&snapshot));
        fs::write(store.cache.state_file(store.key()), " ".repeat(64))?;
        assert_eq!(store.load(), None);
        Ok(())
    }

    #[test]
    fn disabled_store_neither_reads_nor_writes() -> Result<()> {
        let temp = TempDir::new()?;
        let config = PreferencesConfig {
            enabled: false,
            ..PreferencesConfig::default()
        };
        let store = PreferenceStore::new(CacheManager::with_dir(temp.path().to_path_buf()), &config);
        let snapshot = PreferenceSnapshot::capture(&FilterState::new(5000), &ColumnSet::default(), None);
        assert!(!store.save(&snapshot));
        assert!(!store.cache.state_file(store.key()).exists());
        Ok(())
    }
}
