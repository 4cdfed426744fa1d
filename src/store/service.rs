//! Patient store: the load → mutate → save transactions behind the API.

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use super::collection::{PatientCollection, SortKey, SortOrder};
use super::file::FileStore;
use crate::error::{Result, ServiceError, StoreError};
use crate::metrics;
use crate::patient::{apply_update, Patient};

/// Shared record store.
///
/// Every mutation holds `write_lock` across its whole load → mutate → save
/// sequence, so concurrent writers in this process cannot lose each other's
/// updates. Reads skip the lock; saves are atomic renames. File access runs
/// on the blocking pool, never on a runtime worker.
#[derive(Debug)]
pub struct PatientStore {
    file: FileStore,
    write_lock: Mutex<()>,
}

impl PatientStore {
    /// Create a store over `file`.
    pub fn new(file: FileStore) -> Self {
        Self {
            file,
            write_lock: Mutex::new(()),
        }
    }

    /// Underlying file store.
    pub fn file(&self) -> &FileStore {
        &self.file
    }

    /// Run `op` against the file store on the blocking thread pool.
    async fn blocking<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce(FileStore) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || op(file))
            .await
            .map_err(|e| E::from(StoreError::unavailable(self.file.path(), e)))?
    }

    /// The full collection.
    pub async fn view_all(&self) -> std::result::Result<PatientCollection, StoreError> {
        self.blocking(|file| file.load_all()).await
    }

    /// One patient by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> std::result::Result<Patient, StoreError> {
        self.view_all().await?.get(id)
    }

    /// Patients sorted by a query-supplied key and order.
    ///
    /// Arguments are checked before the file is read.
    #[instrument(skip(self))]
    pub async fn sorted(
        &self,
        sort_by: &str,
        order: Option<&str>,
    ) -> std::result::Result<Vec<Patient>, StoreError> {
        let key = SortKey::parse(sort_by)?;
        let order = order.map(SortOrder::parse).transpose()?.unwrap_or_default();

        Ok(self.view_all().await?.sorted(key, order))
    }

    /// Insert a new patient and persist.
    #[instrument(skip(self, patient), fields(id = %patient.id))]
    pub async fn create(&self, patient: Patient) -> std::result::Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let patients = self
            .blocking(move |file| {
                let mut collection = file.load_all()?;
                collection.insert(patient)?;
                file.save_all(&collection)?;
                Ok::<_, StoreError>(collection.len())
            })
            .await?;

        metrics::inc_patients_created();
        info!(patients, "Patient created");
        Ok(())
    }

    /// Merge `changes` into an existing patient, revalidate and persist.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: &str, changes: &Value) -> Result<Patient> {
        let _guard = self.write_lock.lock().await;

        let id = id.to_string();
        let changes = changes.clone();
        let updated = self
            .blocking(move |file| {
                let mut collection = file.load_all()?;
                let existing = collection.get(&id)?;
                let updated = apply_update(&existing, &changes)?;
                collection.replace(updated.clone())?;
                file.save_all(&collection)?;
                Ok::<_, ServiceError>(updated)
            })
            .await?;

        metrics::inc_patients_updated();
        info!("Patient updated");
        Ok(updated)
    }

    /// Remove a patient and persist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> std::result::Result<Patient, StoreError> {
        let _guard = self.write_lock.lock().await;

        let id = id.to_string();
        let (removed, patients) = self
            .blocking(move |file| {
                let mut collection = file.load_all()?;
                let removed = collection.remove(&id)?;
                file.save_all(&collection)?;
                Ok::<_, StoreError>((removed, collection.len()))
            })
            .await?;

        metrics::inc_patients_deleted();
        info!(patients, "Patient deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{Gender, PatientDetails, Verdict, VerdictRule};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn patient(id: &str, height: f64, weight: f64) -> Patient {
        Patient::new(
            id,
            PatientDetails {
                name: format!("Patient {id}"),
                city: "Kolkata".into(),
                age: 52,
                gender: Gender::Male,
                height,
                weight,
            },
        )
    }

    fn store(dir: &TempDir) -> PatientStore {
        let file = FileStore::new(dir.path().join("patients.json"));
        file.ensure_exists().unwrap();
        PatientStore::new(file)
    }

    #[tokio::test]
    async fn create_then_get_returns_input_with_derived_fields() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let input = patient("P010", 1.75, 80.0);

        store.create(input.clone()).await.unwrap();
        let fetched = store.get("P010").await.unwrap();

        assert_eq!(fetched, input);
        let record = fetched.record(VerdictRule::Contiguous);
        assert_eq!(record.view.bmi, 26.12);
        assert_eq!(record.view.verdict, Verdict::Overweight);
    }

    #[tokio::test]
    async fn duplicate_create_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(patient("P001", 1.7, 60.0)).await.unwrap();
        let before = std::fs::read(store.file().path()).unwrap();

        let err = store.create(patient("P001", 1.9, 99.0)).await.unwrap_err();

        assert_eq!(err, StoreError::DuplicateId { id: "P001".into() });
        assert_eq!(std::fs::read(store.file().path()).unwrap(), before);
    }

    #[tokio::test]
    async fn delete_is_persisted_and_repeatable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(patient("P001", 1.7, 60.0)).await.unwrap();
        store.create(patient("P002", 1.6, 50.0)).await.unwrap();

        store.delete("P001").await.unwrap();
        assert!(matches!(store.get("P001").await, Err(StoreError::NotFound { .. })));

        let after_first = std::fs::read(store.file().path()).unwrap();
        assert!(matches!(
            store.delete("P001").await,
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(std::fs::read(store.file().path()).unwrap(), after_first);
        assert_eq!(store.view_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sorted_rejects_bad_arguments_before_reading_storage() {
        let dir = TempDir::new().unwrap();
        let store = PatientStore::new(FileStore::new(dir.path().join("never-created.json")));

        assert!(matches!(
            store.sorted("age", Some("asc")).await,
            Err(StoreError::InvalidArgument { param: "sort_by", .. })
        ));
        assert!(matches!(
            store.sorted("bmi", Some("up")).await,
            Err(StoreError::InvalidArgument { param: "order", .. })
        ));
        assert!(matches!(
            store.sorted("bmi", None).await,
            Err(StoreError::StorageUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn update_revalidates_and_keeps_id() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(patient("P001", 1.7, 60.0)).await.unwrap();

        let updated = store.update("P001", &json!({"weight": 72.5})).await.unwrap();
        assert_eq!(updated.details.weight, 72.5);
        assert_eq!(store.get("P001").await.unwrap().details.weight, 72.5);

        let err = store.update("P001", &json!({"height": -1})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "height"));
        assert_eq!(store.get("P001").await.unwrap().details.height, 1.7);

        let err = store.update("P404", &json!({"weight": 1.0})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound { .. })));
    }

    /// Two writers that bypass the lock: both load, both save, the first
    /// write is silently discarded.
    #[test]
    fn unserialized_writers_lose_updates() {
        let dir = TempDir::new().unwrap();
        let file = FileStore::new(dir.path().join("patients.json"));
        file.ensure_exists().unwrap();

        let mut first = file.load_all().unwrap();
        let mut second = file.load_all().unwrap();
        first.insert(patient("P001", 1.7, 60.0)).unwrap();
        second.insert(patient("P002", 1.6, 50.0)).unwrap();
        file.save_all(&first).unwrap();
        file.save_all(&second).unwrap();

        let persisted = file.load_all().unwrap();
        assert!(!persisted.contains("P001"));
        assert!(persisted.contains("P002"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_all_persist() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store(&dir));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .create(patient(&format!("P{i:03}"), 1.7, 60.0 + i as f64))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.view_all().await.unwrap().len(), 32);
    }
}
