use chainfold_types::ChainEvent;
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use tracing::warn;

pub enum Message {
    Event {
        event: ChainEvent,
    },
    Flush {
        response: oneshot::Sender<bool>,
    },
}

#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    /// Queue one chain event for projection.
    pub async fn event(&mut self, event: ChainEvent) {
        if self.sender.send(Message::Event { event }).await.is_err() {
            warn!("pipeline mailbox closed; event dropped");
        }
    }

    /// Push every accepted write to the store. Resolves once all shards have
    /// flushed; returns false when the pipeline is gone or a shard has failed.
    pub async fn flush(&mut self) -> bool {
        let (response, receiver) = oneshot::channel();
        if self.sender.send(Message::Flush { response }).await.is_err() {
            warn!("pipeline mailbox closed; flush failed");
            return false;
        }
        receiver.await.unwrap_or(false)
    }
}
