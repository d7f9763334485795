//! Per-request, per-thread language model provisioning.
//!
//! A request can attach model data (e.g. a small ARPA file built for one
//! document) to its scope. On first use in a worker thread the data is
//! materialized to a temporary file and handed to a loader; the model then
//! stays with that thread and is dropped when the thread exits.

use crate::error::{JoinError, Result};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

type SharedModel = Arc<dyn Any + Send + Sync>;

static NEXT_PROVIDER: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // Models bound to this thread, by provider. Freed with the thread.
    static MODELS: RefCell<HashMap<u64, SharedModel>> = RefCell::new(HashMap::new());
}

/// Data attached to one translation request, keyed by consumer name.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    data: HashMap<String, Arc<String>>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.data.insert(key.to_string(), Arc::new(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<Arc<String>> {
        self.data.get(key).cloned()
    }
}

/// Lazily loads a model per worker thread from request-scoped data.
///
/// Each thread sees only the model it initialized. A thread's model is
/// released when that thread exits, when it calls [`OnDemandModel::release`],
/// or, for the thread dropping the provider, when the provider is dropped.
pub struct OnDemandModel<M, F> {
    key: String,
    loader: F,
    id: u64,
    _model: std::marker::PhantomData<fn() -> M>,
}

impl<M, F> OnDemandModel<M, F>
where
    M: Send + Sync + 'static,
    F: Fn(&Path) -> Result<M>,
{
    pub fn new(key: &str, loader: F) -> Self {
        Self {
            key: key.to_string(),
            loader,
            id: NEXT_PROVIDER.fetch_add(1, Ordering::Relaxed),
            _model: std::marker::PhantomData,
        }
    }

    /// Loads the model for the current request and binds it to this thread,
    /// replacing whatever the thread held for a previous request.
    pub fn initialize_for_input(&self, scope: &RequestScope) -> Result<Arc<M>> {
        let value = scope
            .get(&self.key)
            .ok_or_else(|| JoinError::MissingRequestData(self.key.clone()))?;

        let temp_file = NamedTempFile::new()?;
        {
            let mut writer = BufWriter::new(&temp_file);
            for line in value.lines() {
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
        }

        let model = Arc::new((self.loader)(temp_file.path())?);
        tracing::info!("{}: model initialized from {:?}", self.key, temp_file.path());

        let shared: SharedModel = model.clone();
        MODELS.with(|models| models.borrow_mut().insert(self.id, shared));
        Ok(model)
    }

    /// The model bound to the calling thread, if it has been initialized.
    pub fn per_thread_model(&self) -> Option<Arc<M>> {
        MODELS
            .with(|models| models.borrow().get(&self.id).cloned())
            .and_then(|model| model.downcast::<M>().ok())
    }

    /// Drops the calling thread's model.
    pub fn release(&self) -> Option<Arc<M>> {
        MODELS
            .with(|models| models.borrow_mut().remove(&self.id))
            .and_then(|model| model.downcast::<M>().ok())
    }
}

impl<M, F> Drop for OnDemandModel<M, F> {
    fn drop(&mut self) {
        // The thread may already be tearing down its locals.
        let _ = MODELS.try_with(|models| models.borrow_mut().remove(&self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct LineModel {
        lines: Vec<String>,
    }

    fn load(path: &Path) -> Result<LineModel> {
        let text = std::fs::read_to_string(path)?;
        Ok(LineModel {
            lines: text.lines().map(str::to_string).collect(),
        })
    }

    #[test]
    fn test_lazy_initialization() {
        let provider = OnDemandModel::new("lm", load);
        assert!(provider.per_thread_model().is_none());

        let mut scope = RequestScope::new();
        scope.set("lm", "\\data\\\nngram 1=2\n");
        let model = provider.initialize_for_input(&scope).unwrap();
        assert_eq!(model.lines, vec!["\\data\\", "ngram 1=2"]);
        assert!(Arc::ptr_eq(&model, &provider.per_thread_model().unwrap()));

        assert!(provider.release().is_some());
        assert!(provider.per_thread_model().is_none());
    }

    #[test]
    fn test_models_are_thread_scoped() {
        let provider = Arc::new(OnDemandModel::new("lm", load));
        let mut scope = RequestScope::new();
        scope.set("lm", "main");
        provider.initialize_for_input(&scope).unwrap();

        let worker = Arc::clone(&provider);
        let seen = std::thread::spawn(move || {
            let before = worker.per_thread_model().is_some();
            let mut scope = RequestScope::new();
            scope.set("lm", "worker");
            let model = worker.initialize_for_input(&scope).unwrap();
            (before, model.lines.clone())
        })
        .join()
        .unwrap();

        assert_eq!(seen, (false, vec!["worker".to_string()]));
        assert_eq!(provider.per_thread_model().unwrap().lines, vec!["main"]);
    }

    #[test]
    fn test_missing_request_data() {
        let provider = OnDemandModel::new("lm", load);
        match provider.initialize_for_input(&RequestScope::new()) {
            Err(JoinError::MissingRequestData(key)) => assert_eq!(key, "lm"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_loader_errors_propagate() {
        let provider: OnDemandModel<LineModel, _> =
            OnDemandModel::new("lm", |_: &Path| Err(JoinError::Parse("bad arpa".to_string())));
        let mut scope = RequestScope::new();
        scope.set("lm", "x");
        assert!(matches!(provider.initialize_for_input(&scope), Err(JoinError::Parse(_))));
        assert!(provider.per_thread_model().is_none());
    }

    #[test]
    fn test_models_are_freed_with_their_threads() {
        let provider = Arc::new(OnDemandModel::new("lm", load));
        let released: Vec<std::sync::Weak<LineModel>> = (0..50)
            .map(|i| {
                let worker = Arc::clone(&provider);
                std::thread::spawn(move || {
                    let mut scope = RequestScope::new();
                    scope.set("lm", format!("worker {}", i));
                    Arc::downgrade(&worker.initialize_for_input(&scope).unwrap())
                })
                .join()
                .unwrap()
            })
            .collect();
        assert!(released.iter().all(|model| model.upgrade().is_none()));
    }

    #[test]
    fn test_providers_do_not_share_slots() {
        let first = OnDemandModel::new("lm", load);
        let second = OnDemandModel::new("lm", load);
        let mut scope = RequestScope::new();
        scope.set("lm", "only first");
        let model = first.initialize_for_input(&scope).unwrap();
        assert!(second.per_thread_model().is_none());

        let weak = Arc::downgrade(&model);
        drop(model);
        drop(first);
        assert!(weak.upgrade().is_none());
    }
}
