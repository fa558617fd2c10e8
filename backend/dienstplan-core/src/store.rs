// src/store.rs
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{io_context, StoreError};
use crate::model::MonthPeriod;

pub const ROSTER_FILE_NAME: &str = "Mitarbeiter_Stammdaten.json";

/// Workbook candidates for a month, in lookup order.
pub fn schedule_file_names(period: MonthPeriod) -> [String; 2] {
    [
        format!("Dienstplan {}.ods", period.file_stem()),
        format!("Dienstplan {}.xlsx", period.file_stem()),
    ]
}

pub fn entries_file_name(period: MonthPeriod) -> String {
    format!("Stundeneintraege_{}.json", period.file_stem())
}

/// Named blobs in the shared document folder.
pub trait BlobStore {
    /// `Ok(None)` when the blob does not exist yet.
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Flat directory on the local filesystem (e.g. a synced cloud folder).
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| io_context(e, format!("Failed to create data directory: {:?}", root)))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BlobStore for FsStore {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(name);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("Read {} bytes from {:?}", bytes.len(), path);
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_context(e, format!("Failed to read file: {:?}", path))),
        }
    }

    fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(name);
        // Readers must never see a half-written file
        let tmp = self.path_for(&format!(".{}.tmp", name));
        fs::write(&tmp, bytes)
            .map_err(|e| io_context(e, format!("Failed to write file: {:?}", tmp)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| io_context(e, format!("Failed to replace file: {:?}", path)))?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}

pub fn load_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    name: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(name)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => {
            debug!("{} does not exist yet", name);
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize>(store: &dyn BlobStore, name: &str, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;
    store.put(name, &json)
}

/// First existing workbook for the month, with its file name.
pub fn find_schedule(
    store: &dyn BlobStore,
    period: MonthPeriod,
) -> Result<Option<(String, Vec<u8>)>, StoreError> {
    for name in schedule_file_names(period) {
        if let Some(bytes) = store.get(&name)? {
            return Ok(Some((name, bytes)));
        }
    }
    warn!("No Dienstplan workbook found for {}", period);
    Ok(None)
}
