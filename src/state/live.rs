/// Replay-latest observable over a store query
///
/// A `LiveQuery` runs its query once when the first subscriber arrives and
/// again after every committed write to one of its tables, publishing the
/// whole result each time. New subscribers get the latest value straight
/// away. When the last subscriber leaves, the upstream task lingers for a
/// grace period and then shuts down; the next subscriber starts it again.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast::{self, error::RecvError}, watch};
use tracing::{debug, error};

use crate::storage::{EchoStorage, StorageError, StoreChange};

/// How long an unobserved query keeps running before it is torn down
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

type Query<T> = dyn Fn(&dyn EchoStorage) -> Result<T, StorageError> + Send + Sync;

struct Inner<T> {
    storage: Arc<dyn EchoStorage>,
    tables: &'static [StoreChange],
    query: Box<Query<T>>,
    grace: Duration,
    fallback: T,
    /// Channel of the running upstream task, `None` while torn down
    upstream: Mutex<Option<Arc<watch::Sender<T>>>>,
}

pub struct LiveQuery<T> {
    name: &'static str,
    inner: Arc<Inner<T>>,
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// `fallback` is published when the very first query fails
    pub fn new<F>(
        name: &'static str,
        storage: Arc<dyn EchoStorage>,
        tables: &'static [StoreChange],
        grace: Duration,
        fallback: T,
        query: F,
    ) -> Self
    where
        F: Fn(&dyn EchoStorage) -> Result<T, StorageError> + Send + Sync + 'static,
    {
        Self {
            name,
            inner: Arc::new(Inner {
                storage,
                tables,
                query: Box::new(query),
                grace,
                fallback,
                upstream: Mutex::new(None),
            }),
        }
    }

    /// Observe the query, starting the upstream task if needed
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        let mut upstream = match self.inner.upstream.lock() {
            Ok(upstream) => upstream,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(sender) = upstream.as_ref() {
            return sender.subscribe();
        }

        // Listen before the first query so no write slips in between, then
        // run it inline so the first value a subscriber sees is real data.
        let changes = self.inner.storage.subscribe_changes();
        let first = match self.run_query() {
            Ok(value) => value,
            Err(_) => self.inner.fallback.clone(),
        };
        let (sender, receiver) = watch::channel(first);
        let sender = Arc::new(sender);
        *upstream = Some(sender.clone());
        drop(upstream);

        debug!("Live query '{}' started", self.name);
        tokio::spawn(run_upstream(self.name, self.inner.clone(), sender, changes));
        receiver
    }

    /// Re-run the query now and publish the result to any subscribers
    pub fn refresh(&self) -> Result<T, StorageError> {
        let value = self.run_query()?;
        let sender = self
            .inner
            .upstream
            .lock()
            .ok()
            .and_then(|upstream| upstream.clone());
        if let Some(sender) = sender {
            sender.send_replace(value.clone());
        }
        Ok(value)
    }

    /// Whether the upstream task is currently running
    pub fn is_active(&self) -> bool {
        self.inner
            .upstream
            .lock()
            .map(|upstream| upstream.is_some())
            .unwrap_or(false)
    }

    fn run_query(&self) -> Result<T, StorageError> {
        self.inner.run_query(self.name)
    }
}

impl<T> Inner<T> {
    fn run_query(&self, name: &str) -> Result<T, StorageError> {
        (self.query)(self.storage.as_ref()).map_err(|e| {
            error!("Live query '{}' failed: {}", name, e);
            e
        })
    }
}

async fn run_upstream<T>(
    name: &'static str,
    inner: Arc<Inner<T>>,
    sender: Arc<watch::Sender<T>>,
    mut changes: broadcast::Receiver<StoreChange>,
) where
    T: Clone + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            change = changes.recv() => {
                let rerun = match change {
                    Ok(table) => inner.tables.contains(&table),
                    // Missed some notices; the full re-query covers them
                    Err(RecvError::Lagged(_)) => true,
                    Err(RecvError::Closed) => break,
                };
                if rerun {
                    // On failure the previous value stays published
                    if let Ok(value) = inner.run_query(name) {
                        sender.send_replace(value);
                    }
                }
            }
            _ = sender.closed() => {
                tokio::time::sleep(inner.grace).await;

                let mut upstream = match inner.upstream.lock() {
                    Ok(upstream) => upstream,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if sender.receiver_count() == 0 {
                    *upstream = None;
                    break;
                }
            }
        }
    }

    debug!("Live query '{}' stopped", name);
}
