//! Capabilities the host persistence layer supplies for its domain records.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{VectorError, VectorResult};

/// A persisted domain record
pub trait Record: Send + Sync {
    /// Stable class name written into vector metadata, e.g. `"Post"`
    fn class_name(&self) -> &str;

    /// Primary key rendered as a string
    fn key(&self) -> String;

    /// Source table or collection the record lives in
    fn table(&self) -> &str;

    /// String value of `column`, if the record has one
    fn attribute(&self, column: &str) -> Option<String>;

    /// Records that opt into vector search return `Some(self)`.
    fn as_vectorizable(&self) -> Option<&dyn Vectorizable> {
        None
    }
}

/// Names the columns whose text is embedded for a record
pub trait Vectorizable: Record {
    fn vector_columns(&self) -> Vec<String>;
}

/// Bulk loader for one record class.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Records for `keys`; unknown keys are simply absent. Order is not
    /// significant.
    async fn find_many(&self, keys: &[String]) -> VectorResult<Vec<Arc<dyn Record>>>;
}

/// Repositories by record class name
#[derive(Clone, Default)]
pub struct RecordRegistry {
    repositories: HashMap<String, Arc<dyn RecordRepository>>,
}

impl RecordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        class_name: impl Into<String>,
        repository: Arc<dyn RecordRepository>,
    ) -> Self {
        self.repositories.insert(class_name.into(), repository);
        self
    }

    pub fn get(&self, class_name: &str) -> Option<&Arc<dyn RecordRepository>> {
        self.repositories.get(class_name)
    }
}

/// Reacts to record lifecycle events; called after the write succeeded.
#[async_trait]
pub trait RecordObserver: Send + Sync {
    async fn saved(&self, record: &dyn Record) -> VectorResult<()>;

    async fn deleted(&self, record: &dyn Record) -> VectorResult<()>;
}

/// Observer list owned by the persistence layer.
///
/// Observers run in subscription order and the first error stops dispatch.
#[derive(Default)]
pub struct RecordHooks {
    observers: RwLock<Vec<Arc<dyn RecordObserver>>>,
}

impl RecordHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn RecordObserver>) -> VectorResult<()> {
        self.observers
            .write()
            .map_err(|_| VectorError::Internal("record hooks lock poisoned".to_string()))?
            .push(observer);
        Ok(())
    }

    pub async fn dispatch_saved(&self, record: &dyn Record) -> VectorResult<()> {
        for observer in self.snapshot()? {
            observer.saved(record).await?;
        }
        Ok(())
    }

    pub async fn dispatch_deleted(&self, record: &dyn Record) -> VectorResult<()> {
        for observer in self.snapshot()? {
            observer.deleted(record).await?;
        }
        Ok(())
    }

    fn snapshot(&self) -> VectorResult<Vec<Arc<dyn RecordObserver>>> {
        let observers = self
            .observers
            .read()
            .map_err(|_| VectorError::Internal("record hooks lock poisoned".to_string()))?
            .clone();
        debug!(count = observers.len(), "Dispatching record event");
        Ok(observers)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Plain, Row};
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
        fail_saves: bool,
    }

    #[async_trait]
    impl RecordObserver for Journal {
        async fn saved(&self, record: &dyn Record) -> VectorResult<()> {
            if self.fail_saves {
                return Err(VectorError::Internal("journal full".to_string()));
            }
            self.events.lock().unwrap().push(format!("saved {}", record.key()));
            Ok(())
        }

        async fn deleted(&self, record: &dyn Record) -> VectorResult<()> {
            self.events.lock().unwrap().push(format!("deleted {}", record.key()));
            Ok(())
        }
    }

    #[test]
    fn test_vectorizable_capability() {
        let row = Row::post("1", "hello");
        let columns = row.as_vectorizable().map(|v| v.vector_columns());
        assert_eq!(columns, Some(vec!["title".to_string()]));
        assert!(Plain.as_vectorizable().is_none());
    }

    #[tokio::test]
    async fn test_hooks_dispatch_in_order() {
        let hooks = RecordHooks::new();
        let first = Arc::new(Journal::default());
        let second = Arc::new(Journal::default());
        hooks.subscribe(first.clone()).unwrap();
        hooks.subscribe(second.clone()).unwrap();

        let row = Row::post("1", "hello");
        hooks.dispatch_saved(&row).await.unwrap();
        hooks.dispatch_deleted(&row).await.unwrap();

        for journal in [first, second] {
            assert_eq!(*journal.events.lock().unwrap(), vec!["saved 1", "deleted 1"]);
        }
    }

    #[tokio::test]
    async fn test_first_error_stops_dispatch() {
        let hooks = RecordHooks::new();
        let failing = Arc::new(Journal {
            fail_saves: true,
            ..Journal::default()
        });
        let later = Arc::new(Journal::default());
        hooks.subscribe(failing).unwrap();
        hooks.subscribe(later.clone()).unwrap();

        assert!(hooks.dispatch_saved(&Row::post("1", "x")).await.is_err());
        assert!(later.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let mut repository = MockRecordRepository::new();
        repository
            .expect_find_many()
            .returning(|keys| {
                Ok(keys
                    .iter()
                    .map(|k| Arc::new(Row::post(k, "t")) as Arc<dyn Record>)
                    .collect())
            });

        let registry = RecordRegistry::new().register("Post", Arc::new(repository));
        assert!(registry.get("Comment").is_none());

        let records = registry
            .get("Post")
            .unwrap()
            .find_many(&["4".to_string()])
            .await
            .unwrap();
        assert_eq!(records[0].key(), "4");
    }
}
