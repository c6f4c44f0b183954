//! Debounced persistence
//!
//! Mutations hand their latest snapshot to the `AutoSaver`, which keeps only
//! the newest value per key and writes everything once no new snapshot has
//! arrived for the configured delay. A failed write keeps the snapshot
//! pending and retries after the next quiet period.

use crate::database::{CollectionKind, Repository};
use crate::error::{AppError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum Command {
    Put { key: String, value: String },
    Flush(oneshot::Sender<Result<()>>),
}

pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl AutoSaver {
    /// Start the background writer
    pub fn spawn(repo: Repository, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(repo, delay, rx));
        tracing::debug!("Autosave started with {}ms delay", delay.as_millis());
        Self { tx, worker }
    }

    /// Queue `value` for `key`, replacing any snapshot still pending for it
    pub fn schedule(&self, key: String, value: String) {
        if self.tx.send(Command::Put { key, value }).is_err() {
            tracing::error!("Autosave worker is gone, change not queued");
        }
    }

    pub fn schedule_collection<T: Serialize>(
        &self,
        kind: CollectionKind,
        user_id: &str,
        items: &[T],
    ) -> Result<()> {
        let value = serde_json::to_string(items)?;
        self.schedule(kind.key_for(user_id), value);
        Ok(())
    }

    /// Write everything pending now and wait for the result
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .map_err(|_| AppError::Storage("Autosave worker stopped".to_string()))?;
        done.await
            .map_err(|_| AppError::Storage("Autosave worker stopped".to_string()))?
    }

    /// Flush and stop the worker
    pub async fn close(self) -> Result<()> {
        let result = self.flush().await;
        let AutoSaver { tx, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            tracing::error!("Autosave worker panicked: {}", e);
        }
        result
    }
}

async fn run(repo: Repository, delay: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut pending: HashMap<String, String> = HashMap::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let wake = deadline;
        let quiet = async move {
            match wake {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Put { key, value }) => {
                    pending.insert(key, value);
                    deadline = Some(Instant::now() + delay);
                }
                Some(Command::Flush(ack)) => {
                    let result = write_pending(&repo, &mut pending).await;
                    deadline = if pending.is_empty() { None } else { Some(Instant::now() + delay) };
                    let _ = ack.send(result);
                }
                None => {
                    if let Err(e) = write_pending(&repo, &mut pending).await {
                        tracing::error!("Final autosave failed, {} key(s) lost: {}", pending.len(), e);
                    }
                    break;
                }
            },
            _ = quiet => {
                match write_pending(&repo, &mut pending).await {
                    Ok(()) => deadline = None,
                    Err(e) => {
                        tracing::error!("Autosave failed, will retry: {}", e);
                        deadline = Some(Instant::now() + delay);
                    }
                }
            }
        }
    }

    tracing::debug!("Autosave worker stopped");
}

/// Write and drop pending entries one by one; entries not yet written stay
async fn write_pending(repo: &Repository, pending: &mut HashMap<String, String>) -> Result<()> {
    let keys: Vec<String> = pending.keys().cloned().collect();
    for key in keys {
        if let Some(value) = pending.get(&key) {
            repo.put_value(&key, value).await?;
        }
        pending.remove(&key);
    }
    Ok(())
}
