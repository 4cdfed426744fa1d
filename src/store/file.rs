//! Whole-file JSON persistence for the patient collection.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::collection::PatientCollection;
use crate::error::StoreError;
use crate::metrics;
use crate::patient::validate_stored;

/// Reads and writes the whole collection as one JSON document.
///
/// No locking happens here; see [`PatientStore`](super::PatientStore) for
/// the serialized read-modify-write path.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty collection if the file does not exist yet.
    ///
    /// Returns `true` when a new file was created.
    pub fn ensure_exists(&self) -> Result<bool, StoreError> {
        match fs::metadata(&self.path) {
            Ok(_) => Ok(false),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .map_err(|e| StoreError::unavailable(&self.path, e))?;
                }
                self.save_all(&PatientCollection::new())?;
                info!(path = %self.path.display(), "Initialized empty patient file");
                Ok(true)
            }
            Err(e) => Err(StoreError::unavailable(&self.path, e)),
        }
    }

    /// Read the entire collection.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load_all(&self) -> Result<PatientCollection, StoreError> {
        let _timer = metrics::timer_store_load();

        let file = File::open(&self.path).map_err(|e| StoreError::unavailable(&self.path, e))?;
        let collection: PatientCollection = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::unavailable(&self.path, format!("malformed document: {e}")))?;

        for patient in collection.iter() {
            validate_stored(&patient.details).map_err(|e| {
                StoreError::unavailable(&self.path, format!("invalid record {}: {e}", patient.id))
            })?;
        }

        debug!(patients = collection.len(), "Loaded patient collection");
        Ok(collection)
    }

    /// Replace the persisted collection.
    ///
    /// The document is written to a sibling temp file, synced, then renamed
    /// over the target, so readers never observe a partial write.
    #[instrument(skip(self, collection), fields(path = %self.path.display(), patients = collection.len()))]
    pub fn save_all(&self, collection: &PatientCollection) -> Result<(), StoreError> {
        let _timer = metrics::timer_store_save();
        let tmp = self.temp_path();

        let write = || -> std::io::Result<()> {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, collection)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&tmp, &self.path)
        };

        if let Err(e) = write() {
            // Best effort; the target is still intact
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::unavailable(&self.path, e));
        }

        debug!("Saved patient collection");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "patients.json".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}
