use super::super::*;

impl<S: Store> Projection<S> {
    /// Record a resolved upgrade attempt.
    ///
    /// Attempts are immutable and keyed by transaction hash and log index, so two
    /// events claiming the same slot can only mean a broken feed or a replay bug.
    /// That collision is rejected loudly instead of papered over.
    pub(in crate::projection) async fn handle_upgrade_processed(
        &mut self,
        meta: &EventMeta,
        player: Address,
        token_contract: Address,
        target_rarity: u8,
        result_rarity: u8,
    ) -> Result<Outcome> {
        let key = Key::Attempt {
            tx_hash: meta.tx_hash,
            log_index: meta.log_index,
        };
        if self.get(&key).await?.is_some() {
            return Ok(Outcome::Rejected(RejectReason::Collision { key }));
        }
        self.ensure_player(player).await?;
        let attempt = UpgradeAttempt::new(
            player,
            token_contract,
            target_rarity,
            result_rarity,
            meta.timestamp,
            meta.block,
        );
        self.stage(key, Value::Attempt(attempt));
        Ok(Outcome::Applied)
    }
}
