//! JSON-file backend
//!
//! Keeps the full record set in memory behind a `RwLock` and rewrites the
//! backing file on every insert. Fits single-process deployments; the
//! resolver sees writes after its next load.

use std::collections::HashMap;
use std::fs;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{info, warn};

use super::super::{ContentRecord, SerializableContentRecord, Storage};
use crate::errors::{Result, VaultlinkError};

pub struct FileStorage {
    file_path: String,
    records: RwLock<HashMap<String, ContentRecord>>,
}

impl FileStorage {
    pub fn new(file_path: &str) -> Result<Self> {
        let storage = FileStorage {
            file_path: file_path.to_string(),
            records: RwLock::new(HashMap::new()),
        };

        let loaded = storage.load_from_file()?;
        {
            let mut guard = storage.records.write().unwrap();
            *guard = loaded;
            info!(
                "FileStorage initialized, {} records loaded from {}",
                guard.len(),
                storage.file_path
            );
        }

        Ok(storage)
    }

    fn load_from_file(&self) -> Result<HashMap<String, ContentRecord>> {
        match fs::read_to_string(&self.file_path) {
            Ok(content) => {
                let rows: Vec<SerializableContentRecord> = serde_json::from_str(&content)
                    .map_err(|e| {
                        VaultlinkError::serialization(format!(
                            "Failed to parse records file {}: {}",
                            self.file_path, e
                        ))
                    })?;

                let mut map = HashMap::new();
                for row in rows {
                    let code = row.short_code.clone();
                    match row.into_record() {
                        Some(record) => {
                            map.insert(code, record);
                        }
                        None => {
                            warn!("Skipping inconsistent record '{}' in {}", code, self.file_path);
                        }
                    }
                }
                Ok(map)
            }
            Err(_) => {
                // First run: create an empty store
                fs::write(&self.file_path, "[]").map_err(|e| {
                    VaultlinkError::file_operation(format!(
                        "Failed to create records file {}: {}",
                        self.file_path, e
                    ))
                })?;
                info!("Created empty records file: {}", self.file_path);
                Ok(HashMap::new())
            }
        }
    }

    fn save_to_file(&self, records: &HashMap<String, ContentRecord>) -> Result<()> {
        let rows: Vec<SerializableContentRecord> =
            records.values().map(SerializableContentRecord::from).collect();

        let json = serde_json::to_string_pretty(&rows)?;
        fs::write(&self.file_path, json)?;
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, code: &str) -> Result<Option<ContentRecord>> {
        let guard = self.records.read().unwrap();
        Ok(guard.get(code).cloned())
    }

    async fn insert(&self, record: ContentRecord) -> Result<()> {
        {
            let mut guard = self.records.write().unwrap();
            if guard.contains_key(&record.code) {
                return Err(VaultlinkError::duplicate_code(format!(
                    "Code already exists: {}",
                    record.code
                )));
            }
            guard.insert(record.code.clone(), record);
        }

        let guard = self.records.read().unwrap();
        self.save_to_file(&guard)?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<ContentRecord>> {
        let guard = self.records.read().unwrap();
        let mut records: Vec<ContentRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn uploader_ids(&self) -> Result<Vec<i64>> {
        let guard = self.records.read().unwrap();
        let mut ids: Vec<i64> = guard.values().map(|r| r.uploader_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn backend_name(&self) -> String {
        "file".to_string()
    }
}
