use ecomart::config::AppConfig;
use ecomart::error::AppError;
use ecomart::ledger::{
    CreditLedger, JsonFileStore, KeyValueStore, MemoryStore, SharedLedger, StoreError,
};
use ecomart::rating::{RatingEngine, RatingTables};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Ledger persistence chosen at startup: a JSON file when `LEDGER_PATH` is set, memory otherwise.
#[derive(Debug)]
pub(crate) enum LedgerBackend {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl KeyValueStore for LedgerBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            LedgerBackend::Memory(store) => store.get(key),
            LedgerBackend::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        match self {
            LedgerBackend::Memory(store) => store.set(key, value),
            LedgerBackend::File(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            LedgerBackend::Memory(store) => store.remove(key),
            LedgerBackend::File(store) => store.remove(key),
        }
    }

    fn set_many(&self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        match self {
            LedgerBackend::Memory(store) => store.set_many(entries),
            LedgerBackend::File(store) => store.set_many(entries),
        }
    }
}

pub(crate) fn rating_engine(config: &AppConfig) -> Result<RatingEngine, AppError> {
    let tables = match &config.storage.rating_tables_path {
        Some(path) => {
            info!(path = %path.display(), "loading rating tables override");
            RatingTables::from_path(path)?
        }
        None => RatingTables::standard(),
    };
    Ok(RatingEngine::new(tables))
}

pub(crate) fn ledger(config: &AppConfig) -> Result<SharedLedger<LedgerBackend>, AppError> {
    let backend = match &config.storage.ledger_path {
        Some(path) => {
            info!(path = %path.display(), "persisting ledger to file");
            LedgerBackend::File(JsonFileStore::new(path.clone()))
        }
        None => LedgerBackend::Memory(MemoryStore::new()),
    };
    let ledger = CreditLedger::load(Arc::new(backend))?;
    Ok(Arc::new(Mutex::new(ledger)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_delegates_to_memory_store() {
        let memory = MemoryStore::new();
        let backend = LedgerBackend::Memory(memory.clone());
        backend.set("carbonCredits", "10".to_string()).expect("set");
        assert_eq!(memory.get("carbonCredits").expect("get"), Some("10".to_string()));
        backend.remove("carbonCredits").expect("remove");
        assert_eq!(backend.get("carbonCredits").expect("get"), None);
    }
}
