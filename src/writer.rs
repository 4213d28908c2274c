// src/writer.rs - Write-behind persistence
use std::sync::{Arc, Mutex};

use log::{debug, error, info, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{
    EncodedSnapshot, KeyValueStore, Note, Notebook, NotesError, Result, SnapshotSink,
    StorageAdapter,
};

#[derive(Debug)]
enum WriterCommand {
    /// Persist this snapshot
    Write(EncodedSnapshot),
    /// Reply once every earlier write has been attempted
    Flush(oneshot::Sender<Option<String>>),
}

/// Shared between the handle, its sinks and the background task
type LastError = Arc<Mutex<Option<String>>>;

fn record(last_error: &LastError, value: Option<String>) {
    if let Ok(mut slot) = last_error.lock() {
        *slot = value;
    }
}

fn read(last_error: &LastError) -> Option<String> {
    last_error.lock().ok().and_then(|slot| slot.clone())
}

/// Persists snapshots on a background task so mutations never wait on I/O.
///
/// Consecutive pending snapshots are coalesced: only the newest one is
/// written. A failed write is logged and remembered; it never touches the
/// in-memory state that produced the snapshot.
pub struct WriteBehind {
    command_tx: mpsc::UnboundedSender<WriterCommand>,
    writer_task: Option<JoinHandle<()>>,
    last_error: LastError,
}

impl WriteBehind {
    /// Starts the writer. Must be called from within a tokio runtime.
    pub fn spawn<S: KeyValueStore + 'static>(mut adapter: StorageAdapter<S>) -> Self {
        info!("Starting write-behind persistence");
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<WriterCommand>();
        let last_error: LastError = Arc::new(Mutex::new(None));
        let task_error = Arc::clone(&last_error);

        let writer_task = tokio::task::spawn_blocking(move || {
            while let Some(command) = command_rx.blocking_recv() {
                match command {
                    WriterCommand::Write(snapshot) => {
                        let mut latest = snapshot;
                        let mut waiting = Vec::new();
                        let mut skipped = 0;

                        while let Ok(next) = command_rx.try_recv() {
                            match next {
                                WriterCommand::Write(newer) => {
                                    latest = newer;
                                    skipped += 1;
                                }
                                WriterCommand::Flush(ack) => {
                                    waiting.push(ack);
                                    break;
                                }
                            }
                        }
                        if skipped > 0 {
                            trace!("Coalesced {} pending snapshots", skipped);
                        }

                        match adapter.write_encoded(&latest) {
                            Ok(()) => {
                                debug!("Snapshot written");
                                record(&task_error, None);
                            }
                            Err(e) => {
                                error!("Background write failed: {}", e);
                                record(&task_error, Some(e.to_string()));
                            }
                        }

                        for ack in waiting {
                            let _ = ack.send(read(&task_error));
                        }
                    }
                    WriterCommand::Flush(ack) => {
                        let _ = ack.send(read(&task_error));
                    }
                }
            }
            debug!("Write-behind task stopped");
        });

        Self {
            command_tx,
            writer_task: Some(writer_task),
            last_error,
        }
    }

    /// A sink to hand to the store.
    pub fn sink(&self) -> WriteBehindSink {
        WriteBehindSink {
            command_tx: self.command_tx.clone(),
            last_error: Arc::clone(&self.last_error),
        }
    }

    pub fn last_error(&self) -> Option<String> {
        read(&self.last_error)
    }

    /// Waits until every snapshot submitted so far has been written.
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command_tx
            .send(WriterCommand::Flush(ack_tx))
            .map_err(|_| Self::stopped())?;
        match ack_rx.await.map_err(|_| Self::stopped())? {
            None => Ok(()),
            Some(message) => Err(NotesError::StorageError {
                key: "snapshot".to_string(),
                message,
            }),
        }
    }

    /// Flushes pending writes and stops the task.
    ///
    /// Sinks still held elsewhere keep the channel open, so they should be
    /// dropped first; the store owning one is normally gone by now.
    pub async fn shutdown(mut self) -> Result<()> {
        let flushed = self.flush().await;
        let (closed_tx, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.command_tx, closed_tx));
        if let Some(task) = self.writer_task.take() {
            if let Err(e) = task.await {
                error!("Write-behind task ended abnormally: {}", e);
            }
        }
        info!("Write-behind persistence stopped");
        flushed
    }

    fn stopped() -> NotesError {
        NotesError::StorageError {
            key: "snapshot".to_string(),
            message: "write-behind task is not running".to_string(),
        }
    }
}

/// [`SnapshotSink`] feeding a [`WriteBehind`] task.
#[derive(Clone)]
pub struct WriteBehindSink {
    command_tx: mpsc::UnboundedSender<WriterCommand>,
    last_error: LastError,
}

impl SnapshotSink for WriteBehindSink {
    fn submit(&mut self, notes: &[Note], notebooks: &[Notebook]) {
        let encoded = match EncodedSnapshot::encode(notes, notebooks) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to serialize snapshot: {}", e);
                record(&self.last_error, Some(e.to_string()));
                return;
            }
        };
        if self.command_tx.send(WriterCommand::Write(encoded)).is_err() {
            error!("Write-behind task is not running, snapshot dropped");
            record(
                &self.last_error,
                Some("write-behind task is not running".to_string()),
            );
        }
    }

    fn last_error(&self) -> Option<String> {
        read(&self.last_error)
    }
}
