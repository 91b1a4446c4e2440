//! Chain event intake.

use chainfold_types::ChainEvent;
use futures::{Stream, StreamExt};
use std::future::Future;
use tracing::{debug, warn};

use crate::pipeline::Mailbox;

#[cfg(any(test, feature = "mocks"))]
use futures::channel::mpsc;
#[cfg(any(test, feature = "mocks"))]
use std::sync::{Arc, Mutex};

/// Trait for a feed of decoded chain events.
///
/// Implementations wrap whatever transport delivers the log (an RPC poller, a
/// websocket subscription, a capture file) and yield events in log order. Event kinds
/// the decoder does not understand must still come through, as
/// [`EventPayload::Unrecognized`](chainfold_types::EventPayload); only transport
/// faults surface as item errors.
pub trait EventSource: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a stream of chain events in log order.
    fn subscribe(
        &self,
    ) -> impl Future<
        Output = Result<impl Stream<Item = Result<ChainEvent, Self::Error>> + Send, Self::Error>,
    > + Send;
}

/// Forward a source's events into the pipeline until the stream ends.
///
/// Transport faults are returned to the caller, who owns the reconnect policy. A
/// clean end of stream returns Ok.
pub async fn pump<E: EventSource>(source: &E, mailbox: &mut Mailbox) -> Result<(), E::Error> {
    let stream = source.subscribe().await?;
    let mut stream = Box::pin(stream);
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => mailbox.event(event).await,
            Err(err) => {
                warn!(?err, "event stream failed");
                return Err(err);
            }
        }
    }
    debug!("event stream ended");
    Ok(())
}

/// A scripted event source for testing.
#[cfg(any(test, feature = "mocks"))]
#[derive(Clone, Default)]
pub struct Mock {
    #[allow(clippy::type_complexity)]
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<Result<ChainEvent, std::io::Error>>>>>,
}

#[cfg(any(test, feature = "mocks"))]
impl Mock {
    /// Deliver one event to every open subscription.
    pub fn emit(&self, event: ChainEvent) {
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|sender| sender.unbounded_send(Ok(event.clone())).is_ok());
    }

    /// Deliver a transport fault to every open subscription.
    pub fn fail(&self) {
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|sender| {
            sender
                .unbounded_send(Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "scripted stream failure",
                )))
                .is_ok()
        });
    }

    /// End every open subscription cleanly.
    pub fn close(&self) {
        self.senders.lock().unwrap().clear();
    }
}

#[cfg(any(test, feature = "mocks"))]
impl EventSource for Mock {
    type Error = std::io::Error;

    async fn subscribe(
        &self,
    ) -> Result<impl Stream<Item = Result<ChainEvent, Self::Error>> + Send, Self::Error> {
        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Actor, Config};
    use crate::store::Memory;
    use crate::Store as _;
    use alloy_primitives::{Address, B256, U256};
    use chainfold_types::{EventMeta, EventPayload, Key, Value};
    use commonware_macros::test_traced;
    use commonware_runtime::{
        deterministic::{self, Runner},
        Clock, Metrics, Runner as _, Spawner,
    };
    use std::{num::NonZeroUsize, time::Duration};

    fn config() -> Config {
        Config {
            shards: NonZeroUsize::new(2).unwrap(),
            mailbox_size: 16,
        }
    }

    fn deposit(player: Address, amount: u64, log_index: u32) -> ChainEvent {
        ChainEvent::new(
            EventMeta {
                tx_hash: B256::repeat_byte(0x77),
                log_index,
                block: 60,
                timestamp: 6_000,
            },
            EventPayload::Deposit {
                player,
                amount: U256::from(amount),
            },
        )
    }

    #[test_traced]
    fn pump_feeds_the_pipeline() {
        let cfg = deterministic::Config::default().with_seed(7);
        let executor = Runner::from(cfg);
        executor.start(|context| async move {
            let store = Memory::default();
            let (actor, mut mailbox) =
                Actor::new(context.with_label("pipeline"), config(), store.clone());
            actor.start();

            let source = Mock::default();
            let pump_handle = context.with_label("pump").spawn({
                let source = source.clone();
                let mut mailbox = mailbox.clone();
                move |_| async move { pump(&source, &mut mailbox).await }
            });

            // Let the pump open its subscription before emitting.
            context.sleep(Duration::from_millis(10)).await;
            let player = Address::repeat_byte(0x51);
            source.emit(deposit(player, 100, 0));
            source.emit(deposit(player, 11, 1));
            source.close();
            assert!(matches!(pump_handle.await, Ok(Ok(()))));

            assert!(mailbox.flush().await);
            match store.get(&Key::Vault(player)).await.unwrap() {
                Some(Value::Vault(vault)) => {
                    assert_eq!(vault.withdrawable_balance, U256::from(111u64));
                }
                other => panic!("expected vault, got {other:?}"),
            }
        });
    }

    #[test_traced]
    fn pump_surfaces_transport_faults() {
        let cfg = deterministic::Config::default().with_seed(8);
        let executor = Runner::from(cfg);
        executor.start(|context| async move {
            let store = Memory::default();
            let (actor, mut mailbox) =
                Actor::new(context.with_label("pipeline"), config(), store.clone());
            actor.start();

            let source = Mock::default();
            let pump_handle = context.with_label("pump").spawn({
                let source = source.clone();
                let mut mailbox = mailbox.clone();
                move |_| async move { pump(&source, &mut mailbox).await }
            });

            context.sleep(Duration::from_millis(10)).await;
            let player = Address::repeat_byte(0x52);
            source.emit(deposit(player, 100, 0));
            source.fail();

            let err = pump_handle
                .await
                .expect("pump task")
                .expect_err("pump should surface the fault");
            assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);

            // Everything delivered before the fault still lands.
            assert!(mailbox.flush().await);
            match store.get(&Key::Vault(player)).await.unwrap() {
                Some(Value::Vault(vault)) => {
                    assert_eq!(vault.withdrawable_balance, U256::from(100u64));
                }
                other => panic!("expected vault, got {other:?}"),
            }
        });
    }
}
