//! Single writer for the SQLite database.
//!
//! All writes go through one dedicated thread holding one pooled connection,
//! so concurrent requests never contend for SQLite's write lock. Each job runs
//! inside an immediate transaction.

use std::any::Any;
use std::thread;

use diesel::SqliteConnection;
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use stocktracker_core::errors::{DatabaseError, Error, Result};

const QUEUE_DEPTH: usize = 1024;

type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type Erased = Box<dyn Any + Send + 'static>;
type Envelope = (Job<Erased>, oneshot::Sender<Result<Erased>>);

/// Handle for sending jobs to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Run `job` on the writer's connection and wait for its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Erased)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_unavailable("writer has stopped"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_unavailable("writer dropped the reply"))??;

        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| {
                Error::Database(DatabaseError::Internal(
                    "writer result type mismatch".to_string(),
                ))
            })
    }
}

fn writer_unavailable(reason: &str) -> Error {
    StorageError::WriterUnavailable(reason.to_string()).into()
}

/// Spawn the writer thread and return its handle.
///
/// The thread exits once every `WriteHandle` clone has been dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);

    thread::Builder::new()
        .name("sqlite-writer".to_string())
        .spawn(move || {
            let mut conn = match pool.get() {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Writer could not acquire a connection: {}", e);
                    let reason = format!("no connection: {}", e);
                    // Fail every queued job instead of leaving callers waiting.
                    while let Some((_, reply_tx)) = rx.blocking_recv() {
                        let _ = reply_tx.send(Err(writer_unavailable(&reason)));
                    }
                    return;
                }
            };

            while let Some((job, reply_tx)) = rx.blocking_recv() {
                let result: Result<Erased> = conn
                    .immediate_transaction::<_, StorageError, _>(|c| {
                        job(c).map_err(StorageError::from)
                    })
                    .map_err(Error::from);
                // Receiver may have been cancelled.
                let _ = reply_tx.send(result);
            }
            debug!("Writer thread stopped");
        })
        .map(|_| ())
        .unwrap_or_else(|e| error!("Failed to spawn writer thread: {}", e));

    WriteHandle { tx }
}
