//! Admin allow-list
//!
//! Explicitly-owned store replacing ad hoc global state: callers hold a
//! handle, mutations update the in-memory set and atomically rewrite the
//! persisted snapshot, so both views stay consistent across restarts.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::info;

use crate::errors::{Result, VaultlinkError};

pub struct AdminStore {
    file_path: PathBuf,
    ids: RwLock<HashSet<i64>>,
}

impl AdminStore {
    /// Load the allow-list from `file_path`, seeding it from `initial_ids`
    /// on first run.
    pub fn load(file_path: impl AsRef<Path>, initial_ids: &[i64]) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        let ids: HashSet<i64> = if file_path.exists() {
            let content = fs::read_to_string(&file_path).map_err(|e| {
                VaultlinkError::file_operation(format!(
                    "Failed to read admins file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;
            serde_json::from_str::<Vec<i64>>(&content)
                .map_err(|e| {
                    VaultlinkError::serialization(format!(
                        "Failed to parse admins file {}: {}",
                        file_path.display(),
                        e
                    ))
                })?
                .into_iter()
                .collect()
        } else {
            initial_ids.iter().copied().collect()
        };

        let store = AdminStore {
            file_path,
            ids: RwLock::new(ids),
        };

        // Persist the seed so the snapshot exists from the first start
        store.persist()?;

        info!(
            "AdminStore loaded, {} admin(s), snapshot at {}",
            store.ids.read().unwrap().len(),
            store.file_path.display()
        );
        Ok(store)
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.ids.read().unwrap().contains(&user_id)
    }

    /// Sorted for stable display
    pub fn list(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.ids.read().unwrap().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns false when the id was already present; the snapshot is only
    /// rewritten on actual change.
    pub fn add(&self, user_id: i64) -> Result<bool> {
        {
            let mut guard = self.ids.write().unwrap();
            if !guard.insert(user_id) {
                return Ok(false);
            }
        }
        self.persist()?;
        Ok(true)
    }

    /// Returns false when the id was not present.
    pub fn remove(&self, user_id: i64) -> Result<bool> {
        {
            let mut guard = self.ids.write().unwrap();
            if !guard.remove(&user_id) {
                return Ok(false);
            }
        }
        self.persist()?;
        Ok(true)
    }

    /// Write-temp-then-rename so a crash mid-write never truncates the
    /// previous snapshot.
    fn persist(&self) -> Result<()> {
        let ids = self.list();
        let json = serde_json::to_string_pretty(&ids)?;

        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| {
            VaultlinkError::file_operation(format!(
                "Failed to write admins snapshot {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        fs::rename(&tmp_path, &self.file_path).map_err(|e| {
            VaultlinkError::file_operation(format!(
                "Failed to replace admins snapshot {}: {}",
                self.file_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}
