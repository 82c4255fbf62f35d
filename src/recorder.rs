use std::sync::Arc;
use tracing::info;

use crate::database::{PlateauMonitorRecord, RecordStore};
use crate::error::RecorderError;
use crate::form::PlateauForm;

pub const SUCCESS_MESSAGE: &str = "Record inserted successfully";

/// Maps one submission to one persisted row
#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn RecordStore>,
}

impl Recorder {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Coerce the form, open a connection, insert one row and close the
    /// connection again. The session is closed on the insert error path too;
    /// a connection failure returns before anything is written.
    pub async fn record(&self, form: PlateauForm) -> Result<PlateauMonitorRecord, RecorderError> {
        let record = form.into_record();

        let mut session = self.store.open().await?;
        let outcome = session.insert(&record).await;
        session.close().await;

        let rows = outcome?;
        info!(
            plateau_number = record.plateau_number,
            duration_seconds = record.duration_seconds,
            rows,
            "recorded plateau"
        );
        Ok(record)
    }

    /// Round-trip a trivial query on a fresh connection
    pub async fn health(&self) -> Result<(), RecorderError> {
        let mut session = self.store.open().await?;
        let outcome = session.ping().await;
        session.close().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::memory::{Failure, MemoryStore};

    fn form(plateau_number: Option<&str>, duration_seconds: Option<&str>) -> PlateauForm {
        PlateauForm {
            plateau_number: plateau_number.map(str::to_string),
            duration_seconds: duration_seconds.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn records_exact_values() {
        let store = MemoryStore::new();
        let recorder = Recorder::new(Arc::new(store.clone()));

        let record = recorder.record(form(Some("5"), Some("12.5"))).await.unwrap();

        assert_eq!(record, PlateauMonitorRecord { plateau_number: 5, duration_seconds: 12.5 });
        assert_eq!(store.rows(), vec![record]);
    }

    #[tokio::test]
    async fn missing_fields_record_zeros() {
        let store = MemoryStore::new();
        let recorder = Recorder::new(Arc::new(store.clone()));

        recorder.record(PlateauForm::default()).await.unwrap();

        assert_eq!(store.rows(), vec![PlateauMonitorRecord { plateau_number: 0, duration_seconds: 0.0 }]);
    }

    #[tokio::test]
    async fn each_call_opens_and_closes_its_own_connection() {
        let store = MemoryStore::new();
        let recorder = Recorder::new(Arc::new(store.clone()));

        recorder.record(form(Some("1"), Some("1"))).await.unwrap();
        recorder.record(form(Some("2"), Some("2"))).await.unwrap();

        assert_eq!(store.open_count(), 2);
        assert_eq!(store.close_count(), 2);
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn insert_failure_still_closes_connection() {
        let store = MemoryStore::failing(Failure::Insert);
        let recorder = Recorder::new(Arc::new(store.clone()));

        let err = recorder.record(form(Some("5"), Some("1"))).await.unwrap_err();

        assert!(matches!(err, RecorderError::Insert(_)));
        assert_eq!(err.to_string(), "Error: Table 'PEC.plateau_monitor' doesn't exist");
        assert_eq!(store.open_count(), 1);
        assert_eq!(store.close_count(), 1);
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn connection_failure_writes_nothing() {
        let store = MemoryStore::failing(Failure::Connect);
        let recorder = Recorder::new(Arc::new(store.clone()));

        let err = recorder.record(form(Some("5"), Some("1"))).await.unwrap_err();

        assert!(matches!(err, RecorderError::Connection(_)));
        assert!(err.to_string().starts_with("Connection failed: "));
        assert!(store.rows().is_empty());
        assert_eq!(store.close_count(), 0);
    }

    #[tokio::test]
    async fn health_uses_a_fresh_connection() {
        let store = MemoryStore::new();
        let recorder = Recorder::new(Arc::new(store.clone()));

        recorder.health().await.unwrap();

        assert_eq!(store.open_count(), 1);
        assert_eq!(store.close_count(), 1);
    }
}
