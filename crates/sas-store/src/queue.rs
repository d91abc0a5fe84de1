//! # Serialized Write Queue
//!
//! Each persisted entity owns one [`WriteQueue`]. Writes are drained by a
//! single background task in submission order, so a second write that
//! overlaps a first is queued behind it, never interleaved.
//!
//! Store commits are synchronous and may touch the filesystem, so each one
//! runs on Tokio's blocking pool. The drain task awaits it before taking the
//! next request.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::StorageError;
use crate::store::{save_record, PersistedRecord, PersistentStore};

struct WriteRequest<T> {
    record: T,
    done: oneshot::Sender<Result<(), StorageError>>,
}

/// FIFO writer for one persisted record type.
pub struct WriteQueue<T: PersistedRecord> {
    tx: mpsc::UnboundedSender<WriteRequest<T>>,
}

impl<T: PersistedRecord> Clone for WriteQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: PersistedRecord> std::fmt::Debug for WriteQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteQueue").field("key", &T::KEY).finish()
    }
}

impl<T: PersistedRecord> WriteQueue<T> {
    /// Start the writer task on the current Tokio runtime.
    pub fn spawn(store: Arc<dyn PersistentStore>) -> Result<Self, StorageError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| StorageError::NoRuntime)?;
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteRequest<T>>();
        handle.spawn(async move {
            while let Some(WriteRequest { record, done }) = rx.recv().await {
                let store = Arc::clone(&store);
                let result =
                    tokio::task::spawn_blocking(move || save_record(store.as_ref(), &record))
                        .await
                        .unwrap_or_else(|e| {
                            Err(StorageError::Backend(format!("store commit aborted: {e}")))
                        });
                if let Err(e) = &result {
                    tracing::warn!(key = T::KEY, error = %e, "record not saved");
                }
                // The submitter may have dropped its receipt.
                let _ = done.send(result);
            }
        });
        Ok(Self { tx })
    }

    /// Queue a write. The returned receipt resolves once it has been applied.
    pub fn enqueue(&self, record: T) -> SaveReceipt {
        let (done, rx) = oneshot::channel();
        // On a closed queue the request (and its sender) is dropped, which
        // resolves the receipt as `WriterClosed`.
        let _ = self.tx.send(WriteRequest { record, done });
        SaveReceipt { rx }
    }
}

/// Completion handle for a queued write.
#[derive(Debug)]
#[must_use = "dropping a receipt ignores whether the record was saved"]
pub struct SaveReceipt {
    rx: oneshot::Receiver<Result<(), StorageError>>,
}

impl SaveReceipt {
    /// Wait until the write has been applied or has failed.
    pub async fn wait(self) -> Result<(), StorageError> {
        self.rx.await.map_err(|_| StorageError::WriterClosed)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{load_record, MemoryStore, WriteBatch};
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Seq {
        value: u32,
    }

    impl PersistedRecord for Seq {
        const KEY: &'static str = "test.seq";
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
        assert!(matches!(
            WriteQueue::<Seq>::spawn(store),
            Err(StorageError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn test_writes_apply_in_order() {
        let memory = Arc::new(MemoryStore::new());
        let queue = WriteQueue::<Seq>::spawn(memory.clone()).unwrap();
        let receipts: Vec<_> = (1..=20).map(|value| queue.enqueue(Seq { value })).collect();
        for receipt in receipts {
            receipt.wait().await.unwrap();
        }
        assert_eq!(load_record::<Seq>(memory.as_ref()).unwrap().value, 20);
        assert_eq!(memory.commit_count(), 20);
    }

    #[tokio::test]
    async fn test_failed_write_reported_on_receipt() {
        let memory = Arc::new(MemoryStore::new());
        memory.set_fail_writes(true);
        let queue = WriteQueue::<Seq>::spawn(memory.clone()).unwrap();
        let err = queue.enqueue(Seq { value: 1 }).wait().await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }

    /// Store whose commit blocks until the test opens the gate.
    struct GatedStore {
        inner: MemoryStore,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl PersistentStore for GatedStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.inner.get(key)
        }

        fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
            self.gate
                .lock()
                .recv_timeout(Duration::from_secs(2))
                .map_err(|_| StorageError::Backend("gate never opened".into()))?;
            self.inner.commit(batch)
        }
    }

    #[tokio::test]
    async fn test_blocking_commit_leaves_runtime_free() {
        let (open, gate) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            gate: Mutex::new(gate),
        });
        let queue = WriteQueue::<Seq>::spawn(store.clone()).unwrap();
        let receipt = queue.enqueue(Seq { value: 7 });
        // The commit is already waiting; this task must still get to run.
        tokio::time::sleep(Duration::from_millis(20)).await;
        open.send(()).unwrap();
        receipt.wait().await.unwrap();
        assert_eq!(load_record::<Seq>(&store.inner).unwrap().value, 7);
    }
}
