//! Ordered log of session records shared between connections

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::smtp::error::SmtpError;
use crate::smtp::message::Message;

/// A record on its way to the writer task, with the slot for its acknowledgement
#[derive(Debug)]
struct Handoff {
    message: Message,
    ack: oneshot::Sender<()>,
}

/// Every record the server appended, in arrival order.
///
/// Only the writer task started by [`MessageList::spawn_writer`] mutates the
/// entries; readers take snapshots.
#[derive(Debug, Clone)]
pub struct MessageList {
    entries: Arc<watch::Sender<Vec<Message>>>,
}

impl Default for MessageList {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageList {
    pub fn new() -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Start the task that serializes appends. Must be called from within a
    /// tokio runtime.
    pub fn spawn_writer(&self) -> MessageSink {
        let (queue, mut incoming) = mpsc::channel::<Handoff>(1);
        let stop = CancellationToken::new();
        let entries = Arc::clone(&self.entries);
        let stopped = stop.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    handoff = incoming.recv() => match handoff {
                        Some(handoff) => store(&entries, handoff),
                        // every sink is gone
                        None => return,
                    },
                    () = stopped.cancelled() => break,
                }
            }

            incoming.close();
            while let Some(handoff) = incoming.recv().await {
                store(&entries, handoff);
            }
        });

        MessageSink { queue, stop }
    }

    /// Snapshot of all entries, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

fn store(entries: &watch::Sender<Vec<Message>>, handoff: Handoff) {
    entries.send_modify(|messages| messages.push(handoff.message));
    // The producer may have given up waiting; the record is kept regardless.
    let _ = handoff.ack.send(());
}

/// Producer handle for a running writer task
#[derive(Debug, Clone)]
pub struct MessageSink {
    queue: mpsc::Sender<Handoff>,
    stop: CancellationToken,
}

impl MessageSink {
    /// Hand a record to the writer and wait until it is stored
    pub async fn append(&self, message: Message) -> Result<(), SmtpError> {
        if self.stop.is_cancelled() {
            return Err(SmtpError::MessageListStopped);
        }

        let (ack, stored) = oneshot::channel();
        self.queue
            .send(Handoff { message, ack })
            .await
            .map_err(|_| SmtpError::MessageListStopped)?;

        stored.await.map_err(|_| SmtpError::MessageListStopped)
    }

    /// Stop accepting records. Records already handed off are still stored.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}
