use alloy_primitives::{Address, B256, U256};
use anyhow::{Context as _, Result};
use chainfold_types::{
    ChainEvent, EventMeta, EventPayload, Key, Player, RandomnessRequest, StakeRecord,
    UpgradeAttempt, Value, Vault, VrfAuthorization,
};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use crate::guard::{self, GuardViolation};
use crate::store::Store;

mod handlers;

/// Resolution of one event.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The handler's staged writes were accepted (possibly zero writes).
    Applied,
    /// Unrecognized event kind; nothing written.
    Skipped { topic: B256 },
    /// An expected entity was missing; treated as a benign replay-window edge.
    Dropped(DropReason),
    /// The event's writes were aborted.
    Rejected(RejectReason),
}

#[derive(Debug, PartialEq, Eq)]
pub enum DropReason {
    VaultMissing { address: Address },
    RequestMissing { request_id: U256 },
    AlreadyFulfilled { request_id: U256 },
}

#[derive(Debug, PartialEq, Eq)]
pub enum RejectReason {
    Guard(GuardViolation),
    Collision { key: Key },
}

/// Staging overlay that folds events into entity writes.
///
/// Writes accumulate in two levels: `pending` holds the current event's staged rows
/// and either promotes into `committed` or is discarded wholesale, giving per-event
/// atomicity; `committed` holds rows from accepted events until the caller drains
/// them to the store. Reads fall through pending, committed, then the store.
pub struct Projection<S: Store> {
    store: S,
    committed: BTreeMap<Key, Value>,
    pending: BTreeMap<Key, Value>,
}

impl<S: Store> Projection<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            committed: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        if let Some(value) = self.pending.get(key) {
            return Ok(Some(value.clone()));
        }
        self.prior(key).await
    }

    /// State for a key ignoring the current event's staged writes; this is what the
    /// consistency guard compares proposed rows against.
    async fn prior(&self, key: &Key) -> Result<Option<Value>> {
        if let Some(value) = self.committed.get(key) {
            return Ok(Some(value.clone()));
        }
        self.store.get(key).await
    }

    fn stage(&mut self, key: Key, value: Value) {
        self.pending.insert(key, value);
    }

    async fn get_or_init_vault(&self, address: Address, created_at: u64) -> Result<Vault> {
        Ok(match self.get(&Key::Vault(address)).await? {
            Some(Value::Vault(vault)) => vault,
            _ => Vault::new(created_at),
        })
    }

    async fn get_or_init_stake(&self, address: Address, created_at: u64) -> Result<StakeRecord> {
        Ok(match self.get(&Key::Stake(address)).await? {
            Some(Value::Stake(stake)) => stake,
            _ => StakeRecord::new(address, created_at),
        })
    }

    /// Stage the player anchor for `address` unless one already exists.
    async fn ensure_player(&mut self, address: Address) -> Result<()> {
        if self.get(&Key::Player(address)).await?.is_none() {
            self.stage(Key::Player(address), Value::Player(Player::new(address)));
        }
        Ok(())
    }

    /// Fold one event into the projection.
    ///
    /// Domain problems resolve to an [`Outcome`]; only store I/O failures surface as
    /// `Err`. Either every row the event staged commits or none does.
    pub async fn apply(&mut self, event: &ChainEvent) -> Result<Outcome> {
        let outcome = match self
            .dispatch(event)
            .await
            .context("state error during projection")?
        {
            Outcome::Applied => match self
                .check_pending()
                .await
                .context("state error during guard check")?
            {
                Some(violation) => {
                    self.pending.clear();
                    Outcome::Rejected(RejectReason::Guard(violation))
                }
                None => {
                    self.committed.append(&mut self.pending);
                    Outcome::Applied
                }
            },
            other => {
                self.pending.clear();
                other
            }
        };

        match &outcome {
            Outcome::Applied => {}
            Outcome::Skipped { topic } => {
                warn!(
                    %topic,
                    block = event.meta.block,
                    "unrecognized event kind; skipping"
                );
            }
            Outcome::Dropped(DropReason::AlreadyFulfilled { request_id }) => {
                warn!(
                    %request_id,
                    block = event.meta.block,
                    "request already fulfilled; keeping first fulfillment"
                );
            }
            Outcome::Dropped(reason) => {
                debug!(
                    ?reason,
                    kind = event.payload.kind(),
                    block = event.meta.block,
                    "expected entity missing; dropping event"
                );
            }
            Outcome::Rejected(RejectReason::Guard(violation)) => {
                error!(
                    %violation,
                    ?event,
                    "consistency guard rejected event; writes aborted"
                );
            }
            Outcome::Rejected(RejectReason::Collision { key }) => {
                error!(
                    identity = %key.identity(),
                    ?event,
                    "identity collision on unique entity; event not committed"
                );
            }
        }

        Ok(outcome)
    }

    async fn dispatch(&mut self, event: &ChainEvent) -> Result<Outcome> {
        let meta = &event.meta;
        match &event.payload {
            EventPayload::Deposit { player, amount } => {
                self.handle_deposit(meta, *player, *amount).await
            }
            EventPayload::Withdrawal { player, amount } => {
                self.handle_withdrawal(meta, *player, *amount).await
            }
            EventPayload::CommissionPaid {
                referrer, amount, ..
            } => self.handle_commission_paid(meta, *referrer, *amount).await,
            EventPayload::Staked {
                user,
                token_id,
                amount,
            } => self.handle_staked(meta, *user, *token_id, *amount).await,
            EventPayload::UnstakeClaimed { user, amount } => {
                self.handle_unstake_claimed(meta, *user, *amount).await
            }
            EventPayload::VipTransfer { from, to, token_id } => {
                self.handle_vip_transfer(meta, *from, *to, *token_id).await
            }
            EventPayload::UpgradeProcessed {
                player,
                token_contract,
                target_rarity,
                result_rarity,
            } => {
                self.handle_upgrade_processed(
                    meta,
                    *player,
                    *token_contract,
                    *target_rarity,
                    *result_rarity,
                )
                .await
            }
            EventPayload::RequestSent {
                request_id,
                requester,
            } => self.handle_request_sent(meta, *request_id, *requester).await,
            EventPayload::RequestFulfilled {
                request_id,
                random_words,
            } => {
                self.handle_request_fulfilled(meta, *request_id, random_words)
                    .await
            }
            EventPayload::AuthorizationChanged {
                contract,
                authorized,
            } => {
                self.handle_authorization_changed(meta, *contract, *authorized)
                    .await
            }
            EventPayload::Unrecognized { topic, .. } => Ok(Outcome::Skipped { topic: *topic }),
        }
    }

    /// Run the consistency guard over every staged row.
    async fn check_pending(&self) -> Result<Option<GuardViolation>> {
        for (key, value) in &self.pending {
            let prior = self.prior(key).await?;
            if let Err(violation) = guard::check(key, prior.as_ref(), value) {
                return Ok(Some(violation));
            }
        }
        Ok(None)
    }

    /// Fold a batch of events in order, returning each event's resolution.
    pub async fn execute(&mut self, events: &[ChainEvent]) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.apply(event).await?);
        }
        Ok(outcomes)
    }

    /// Consume the projection, yielding accepted writes in key order.
    pub fn commit(self) -> Vec<(Key, Value)> {
        self.committed.into_iter().collect()
    }

    /// Drain accepted writes in key order, leaving the projection ready for more
    /// events.
    pub fn take_committed(&mut self) -> Vec<(Key, Value)> {
        std::mem::take(&mut self.committed).into_iter().collect()
    }
}

/// Fold `events` into `store` on top of whatever it already holds.
///
/// Folding the full log into an empty store rebuilds the canonical state.
pub async fn replay<S: Store>(store: &S, events: &[ChainEvent]) -> Result<()> {
    let mut projection = Projection::new(store.clone());
    projection.execute(events).await?;
    store.apply(projection.commit()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Memory;
    use commonware_runtime::{deterministic::Runner, Runner as _};

    fn meta(log_index: u32, block: u64) -> EventMeta {
        EventMeta {
            tx_hash: B256::repeat_byte(0x11),
            log_index,
            block,
            timestamp: 1_700_000_000 + block,
        }
    }

    fn deposit(player: Address, amount: u64, log_index: u32) -> ChainEvent {
        ChainEvent::new(
            meta(log_index, 1),
            EventPayload::Deposit {
                player,
                amount: U256::from(amount),
            },
        )
    }

    #[derive(Clone)]
    struct FailingStore;

    impl Store for FailingStore {
        async fn get(&self, _: &Key) -> Result<Option<Value>> {
            Err(anyhow::anyhow!("disk offline"))
        }

        async fn upsert(&self, _: Key, _: Value) -> Result<()> {
            Err(anyhow::anyhow!("disk offline"))
        }
    }

    #[test]
    fn unrecognized_event_is_skipped_without_writes() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let mut projection = Projection::new(store.clone());

            let topic = B256::repeat_byte(0xee);
            let event = ChainEvent::new(
                meta(0, 1),
                EventPayload::Unrecognized {
                    topic,
                    data: vec![1, 2, 3],
                },
            );
            let outcome = projection.apply(&event).await.unwrap();
            assert_eq!(outcome, Outcome::Skipped { topic });
            assert!(projection.commit().is_empty());
            assert!(store.rows().is_empty());
        });
    }

    #[test]
    fn reads_fall_through_to_the_store() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let player = Address::repeat_byte(0x0a);
            let store = Memory::default();

            // Seed the store via one projection, then observe from a second.
            replay(&store, &[deposit(player, 100, 0)]).await.unwrap();

            let mut projection = Projection::new(store.clone());
            let event = ChainEvent::new(
                meta(1, 2),
                EventPayload::Withdrawal {
                    player,
                    amount: U256::from(40u64),
                },
            );
            assert_eq!(projection.apply(&event).await.unwrap(), Outcome::Applied);

            let changes = projection.take_committed();
            assert_eq!(changes.len(), 1);
            match &changes[0] {
                (Key::Vault(address), Value::Vault(vault)) => {
                    assert_eq!(*address, player);
                    assert_eq!(vault.withdrawable_balance, U256::from(60u64));
                }
                other => panic!("unexpected change: {other:?}"),
            }
        });
    }

    #[test]
    fn rejected_event_commits_none_of_its_writes() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let user = Address::repeat_byte(0x0b);
            let store = Memory::default();

            // Seed a stake row at the top of the range without a player anchor, the
            // shape a partially backfilled store can hold.
            let mut stake = StakeRecord::new(user, 1);
            stake.staked_amount = U256::MAX;
            store
                .upsert(Key::Stake(user), Value::Stake(stake))
                .await
                .unwrap();

            // The stake handler stages the missing player anchor before the amount
            // overflows; rejection must discard the anchor along with everything else.
            let mut projection = Projection::new(store.clone());
            let overflow = ChainEvent::new(
                meta(0, 1),
                EventPayload::Staked {
                    user,
                    token_id: 8,
                    amount: U256::from(1u64),
                },
            );
            let outcome = projection.apply(&overflow).await.unwrap();
            assert!(matches!(
                outcome,
                Outcome::Rejected(RejectReason::Guard(GuardViolation::AmountOverflow { .. }))
            ));
            assert!(projection.get(&Key::Player(user)).await.unwrap().is_none());

            // Stream continues; an unrelated deposit still applies.
            let after = deposit(Address::repeat_byte(0x0d), 5, 1);
            assert_eq!(projection.apply(&after).await.unwrap(), Outcome::Applied);

            // The rejected event changed nothing for `user`.
            store.apply(projection.commit()).await.unwrap();
            assert!(store.get(&Key::Player(user)).await.unwrap().is_none());
            match store.get(&Key::Stake(user)).await.unwrap() {
                Some(Value::Stake(stake)) => assert_eq!(stake.staked_amount, U256::MAX),
                other => panic!("unexpected stake row: {other:?}"),
            }
        });
    }

    #[test]
    fn change_sets_come_out_in_key_order() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let mut projection = Projection::new(store);

            // Apply in descending address order; commit must sort.
            for (i, byte) in [0x0c, 0x0b, 0x0a].into_iter().enumerate() {
                let event = deposit(Address::repeat_byte(byte), 1, i as u32);
                assert_eq!(projection.apply(&event).await.unwrap(), Outcome::Applied);
            }

            let changes = projection.commit();
            let keys: Vec<Key> = changes.into_iter().map(|(key, _)| key).collect();
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted);
        });
    }

    #[test]
    fn store_failures_propagate() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut projection = Projection::new(FailingStore);
            let event = deposit(Address::repeat_byte(0x0a), 1, 0);
            let err = projection.apply(&event).await.unwrap_err();
            assert!(format!("{err:#}").contains("disk offline"));
        });
    }
}
