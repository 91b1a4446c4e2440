use super::super::*;
use super::rejected;

impl<S: Store> Projection<S> {
    /// Fold a stake into the account's record, seeding the player anchor and the
    /// record itself on first sight.
    ///
    /// The record's owning player is re-linked on every stake so a record created by
    /// an SBT mint stays attached to whoever holds the token now.
    pub(in crate::projection) async fn handle_staked(
        &mut self,
        meta: &EventMeta,
        user: Address,
        token_id: u64,
        amount: U256,
    ) -> Result<Outcome> {
        self.ensure_player(user).await?;
        let mut stake = self.get_or_init_stake(user, meta.timestamp).await?;
        stake.player = user;
        stake.staked_amount =
            match guard::credit(user, "staked_amount", stake.staked_amount, amount) {
                Ok(total) => total,
                Err(violation) => return Ok(rejected(violation)),
            };
        stake.token_id = Some(token_id);
        stake.last_updated_at = meta.timestamp;
        self.stage(Key::Stake(user), Value::Stake(stake));
        Ok(Outcome::Applied)
    }

    /// Unstake claims settle entirely on chain; the record keeps its running totals.
    pub(in crate::projection) async fn handle_unstake_claimed(
        &mut self,
        _meta: &EventMeta,
        _user: Address,
        _amount: U256,
    ) -> Result<Outcome> {
        Ok(Outcome::Applied)
    }

    /// Fold an SBT transfer. Only mints matter: a mint seeds the receiver's player
    /// anchor and stake record and pins the token, without touching staked amounts.
    /// Secondary transfers pass through untouched.
    pub(in crate::projection) async fn handle_vip_transfer(
        &mut self,
        meta: &EventMeta,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> Result<Outcome> {
        if from != Address::ZERO {
            return Ok(Outcome::Applied);
        }
        self.ensure_player(to).await?;
        let mut stake = self.get_or_init_stake(to, meta.timestamp).await?;
        stake.player = to;
        stake.token_id = Some(token_id);
        stake.last_updated_at = meta.timestamp;
        self.stage(Key::Stake(to), Value::Stake(stake));
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::*;
    use crate::store::Memory;
    use commonware_runtime::{deterministic::Runner, Runner as _};

    fn meta(log_index: u32, timestamp: u64) -> EventMeta {
        EventMeta {
            tx_hash: B256::repeat_byte(0x33),
            log_index,
            block: 20,
            timestamp,
        }
    }

    fn staked(user: Address, token_id: u64, amount: u64, log_index: u32, timestamp: u64) -> ChainEvent {
        ChainEvent::new(
            meta(log_index, timestamp),
            EventPayload::Staked {
                user,
                token_id,
                amount: U256::from(amount),
            },
        )
    }

    async fn project(events: Vec<ChainEvent>) -> (Memory, Vec<Outcome>) {
        let store = Memory::default();
        let mut projection = Projection::new(store.clone());
        let outcomes = projection.execute(&events).await.expect("execute");
        store.apply(projection.commit()).await.expect("flush");
        (store, outcomes)
    }

    async fn stake(store: &Memory, address: Address) -> StakeRecord {
        match store.get(&Key::Stake(address)).await.expect("get stake") {
            Some(Value::Stake(stake)) => stake,
            other => panic!("expected stake record, got {other:?}"),
        }
    }

    #[test]
    fn first_stake_seeds_player_and_record() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let user = Address::repeat_byte(0x11);
            let (store, outcomes) = project(vec![staked(user, 7, 40, 0, 2_000)]).await;

            assert_eq!(outcomes, vec![Outcome::Applied]);
            match store.get(&Key::Player(user)).await.unwrap() {
                Some(Value::Player(player)) => assert_eq!(player.address, user),
                other => panic!("expected player, got {other:?}"),
            }
            let stake = stake(&store, user).await;
            assert_eq!(stake.player, user);
            assert_eq!(stake.staked_amount, U256::from(40u64));
            assert_eq!(stake.token_id, Some(7));
            assert_eq!(stake.created_at, 2_000);
        });
    }

    #[test]
    fn stakes_accumulate_and_track_the_latest_token() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let user = Address::repeat_byte(0x12);
            let events = vec![
                staked(user, 7, 40, 0, 2_000),
                staked(user, 9, 10, 1, 2_050),
            ];
            let (store, outcomes) = project(events).await;

            assert_eq!(outcomes, vec![Outcome::Applied, Outcome::Applied]);
            let stake = stake(&store, user).await;
            assert_eq!(stake.staked_amount, U256::from(50u64));
            assert_eq!(stake.token_id, Some(9));
            assert_eq!(stake.created_at, 2_000);
            assert_eq!(stake.last_updated_at, 2_050);
        });
    }

    #[test]
    fn unstake_claim_is_a_pass_through() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let user = Address::repeat_byte(0x13);
            let events = vec![
                staked(user, 7, 40, 0, 2_000),
                ChainEvent::new(
                    meta(1, 2_100),
                    EventPayload::UnstakeClaimed {
                        user,
                        amount: U256::from(40u64),
                    },
                ),
            ];
            let (store, outcomes) = project(events).await;

            assert_eq!(outcomes, vec![Outcome::Applied, Outcome::Applied]);
            let stake = stake(&store, user).await;
            assert_eq!(stake.staked_amount, U256::from(40u64));
            assert_eq!(stake.last_updated_at, 2_000);
        });
    }

    #[test]
    fn mint_seeds_receiver_without_amounts() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let receiver = Address::repeat_byte(0x14);
            let event = ChainEvent::new(
                meta(0, 2_000),
                EventPayload::VipTransfer {
                    from: Address::ZERO,
                    to: receiver,
                    token_id: 7,
                },
            );
            let (store, outcomes) = project(vec![event]).await;

            assert_eq!(outcomes, vec![Outcome::Applied]);
            assert!(store.get(&Key::Player(receiver)).await.unwrap().is_some());
            let stake = stake(&store, receiver).await;
            assert_eq!(stake.player, receiver);
            assert_eq!(stake.token_id, Some(7));
            assert_eq!(stake.staked_amount, U256::ZERO);
        });
    }

    #[test]
    fn mint_after_stake_keeps_the_balance() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let user = Address::repeat_byte(0x15);
            let events = vec![
                staked(user, 7, 40, 0, 2_000),
                ChainEvent::new(
                    meta(1, 2_100),
                    EventPayload::VipTransfer {
                        from: Address::ZERO,
                        to: user,
                        token_id: 9,
                    },
                ),
            ];
            let (store, _) = project(events).await;

            let stake = stake(&store, user).await;
            assert_eq!(stake.staked_amount, U256::from(40u64));
            assert_eq!(stake.token_id, Some(9));
        });
    }

    #[test]
    fn secondary_transfer_writes_nothing() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let event = ChainEvent::new(
                meta(0, 2_000),
                EventPayload::VipTransfer {
                    from: Address::repeat_byte(0x16),
                    to: Address::repeat_byte(0x17),
                    token_id: 7,
                },
            );
            let (store, outcomes) = project(vec![event]).await;

            assert_eq!(outcomes, vec![Outcome::Applied]);
            assert!(store.rows().is_empty());
        });
    }
}
