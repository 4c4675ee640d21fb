//! Durable sled-backed sprite sheet records.

use std::io;
use std::path::Path;

use sled::{Db, Tree};

use crate::error::StorageError;
use crate::sheet::SpriteSheet;
use crate::types::now_millis;

const TREE_SHEETS: &str = "sheets";

/// Metadata persistence capability: CRUD over whole sheet records, last write wins.
pub trait SheetStore: Send + Sync {
    fn get_sheet(&self, sheet_id: &str) -> Result<Option<SpriteSheet>, StorageError>;

    fn put_sheet(&self, sheet: &SpriteSheet) -> Result<(), StorageError>;

    /// All sheets, most recently updated first.
    fn list_sheets(&self) -> Result<Vec<SpriteSheet>, StorageError>;

    /// Returns whether a record was removed.
    fn delete_sheet(&self, sheet_id: &str) -> Result<bool, StorageError>;

    fn require_sheet(&self, sheet_id: &str) -> Result<SpriteSheet, StorageError> {
        self.get_sheet(sheet_id)?
            .ok_or_else(|| StorageError::SheetNotFound(sheet_id.to_string()))
    }
}

/// One JSON record per sheet in a sled tree keyed by sheet id.
#[derive(Clone)]
pub struct SledSheetStore {
    db: Db,
    sheets: Tree,
}

impl SledSheetStore {
    pub fn new(db: Db) -> Result<Self, StorageError> {
        let sheets = db.open_tree(TREE_SHEETS).map_err(to_storage_io)?;
        Ok(Self { db, sheets })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path).map_err(to_storage_io)?;
        Self::new(db)
    }

    /// In-memory store removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(to_storage_io)?;
        Self::new(db)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }
}

impl SheetStore for SledSheetStore {
    fn get_sheet(&self, sheet_id: &str) -> Result<Option<SpriteSheet>, StorageError> {
        let Some(raw) = self.sheets.get(sheet_id.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(parsed))
    }

    fn put_sheet(&self, sheet: &SpriteSheet) -> Result<(), StorageError> {
        let mut record = sheet.clone();
        record.updated_at_ms = now_millis();
        let value = serde_json::to_vec(&record).map_err(to_storage_data)?;
        self.sheets
            .insert(record.id.as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    fn list_sheets(&self) -> Result<Vec<SpriteSheet>, StorageError> {
        let mut out = Vec::new();
        for result in self.sheets.iter() {
            let (_, value) = result.map_err(to_storage_io)?;
            let sheet: SpriteSheet = serde_json::from_slice(&value).map_err(to_storage_data)?;
            out.push(sheet);
        }
        out.sort_by_key(|s| std::cmp::Reverse(s.updated_at_ms));
        Ok(out)
    }

    fn delete_sheet(&self, sheet_id: &str) -> Result<bool, StorageError> {
        let removed = self
            .sheets
            .remove(sheet_id.as_bytes())
            .map_err(to_storage_io)?;
        Ok(removed.is_some())
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::Serialization(err.to_string())
}
