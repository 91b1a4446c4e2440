use crate::metrics::ProjectionMetrics;
use crate::pipeline::{Config, Mailbox, Message};
use crate::projection::Projection;
use crate::store::Store;
use chainfold_types::ChainEvent;
use commonware_runtime::{Handle, Metrics, Spawner};
use commonware_utils::modulo;
use futures::{
    channel::{mpsc, oneshot},
    future::join_all,
    SinkExt, StreamExt,
};
use tracing::{debug, error, info};

/// Work routed to one shard worker.
enum Work {
    Event { event: ChainEvent },
    Flush { response: oneshot::Sender<bool> },
}

pub struct Actor<R, S>
where
    R: Spawner + Metrics + Clone + Send + Sync + 'static,
    S: Store,
{
    context: R,
    config: Config,
    store: S,
    metrics: ProjectionMetrics,
    mailbox: mpsc::Receiver<Message>,
}

impl<R, S> Actor<R, S>
where
    R: Spawner + Metrics + Clone + Send + Sync + 'static,
    S: Store,
{
    pub fn new(context: R, config: Config, store: S) -> (Self, Mailbox) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        let metrics = ProjectionMetrics::register(&context);
        (
            Self {
                context,
                config,
                store,
                metrics,
                mailbox,
            },
            Mailbox::new(sender),
        )
    }

    pub fn start(self) -> Handle<()> {
        let context = self.context.clone();
        context.spawn(move |context| async move {
            let mut actor = self;
            actor.context = context;
            actor.run().await;
        })
    }

    async fn run(mut self) {
        // One projection per shard. Routing by identity keeps each identity's events
        // on a single worker, so no two workers ever fold the same entity.
        let shards = self.config.shards.get();
        let mut workers = Vec::with_capacity(shards);
        let mut handles = Vec::with_capacity(shards);
        for shard in 0..shards {
            let (sender, work) = mpsc::channel(self.config.mailbox_size);
            let store = self.store.clone();
            let metrics = self.metrics.clone();
            let handle = self
                .context
                .with_label("shard")
                .spawn(move |_| shard_worker(shard, store, metrics, work));
            workers.push(sender);
            handles.push(handle);
        }
        info!(shards, "projection pipeline started");

        while let Some(message) = self.mailbox.next().await {
            match message {
                Message::Event { event } => {
                    let shard = modulo(&event.routing_identity(), shards as u64) as usize;
                    if workers[shard].send(Work::Event { event }).await.is_err() {
                        error!(shard, "projection shard stopped; pipeline shutting down");
                        return;
                    }
                }
                Message::Flush { response } => {
                    let mut receipts = Vec::with_capacity(workers.len());
                    let mut healthy = true;
                    for (shard, worker) in workers.iter_mut().enumerate() {
                        let (ack, receipt) = oneshot::channel();
                        if worker.send(Work::Flush { response: ack }).await.is_err() {
                            error!(shard, "projection shard stopped; flush incomplete");
                            healthy = false;
                            continue;
                        }
                        receipts.push(receipt);
                    }
                    for receipt in join_all(receipts).await {
                        healthy &= receipt.unwrap_or(false);
                    }
                    let _ = response.send(healthy);
                }
            }
        }

        // Ingress closed: release the shard mailboxes so workers run their final
        // flush, then wait for them.
        drop(workers);
        for handle in handles {
            let _ = handle.await;
        }
        debug!("projection pipeline stopped");
    }
}

async fn shard_worker<S: Store>(
    shard: usize,
    store: S,
    metrics: ProjectionMetrics,
    mut work: mpsc::Receiver<Work>,
) {
    let mut projection = Projection::new(store.clone());
    while let Some(message) = work.next().await {
        match message {
            Work::Event { event } => match projection.apply(&event).await {
                Ok(outcome) => metrics.observe(&outcome),
                Err(err) => {
                    error!(shard, ?err, "store failure while projecting; shard stopped");
                    return;
                }
            },
            Work::Flush { response } => {
                let changes = projection.take_committed();
                let count = changes.len() as u64;
                if let Err(err) = store.apply(changes).await {
                    error!(shard, ?err, "store failure while flushing; shard stopped");
                    return;
                }
                metrics.flushes.inc();
                metrics.flushed_writes.inc_by(count);
                let _ = response.send(true);
            }
        }
    }

    // Push whatever is still held before exiting.
    let changes = projection.take_committed();
    if changes.is_empty() {
        return;
    }
    let count = changes.len() as u64;
    if let Err(err) = store.apply(changes).await {
        error!(shard, ?err, "store failure during final flush");
        return;
    }
    metrics.flushes.inc();
    metrics.flushed_writes.inc_by(count);
}
