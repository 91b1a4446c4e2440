use super::super::*;
use super::rejected;

impl<S: Store> Projection<S> {
    /// Credit a deposit to the player's vault, creating the vault on first sight.
    ///
    /// Deposits never create a player anchor; only staking-side events do.
    pub(in crate::projection) async fn handle_deposit(
        &mut self,
        meta: &EventMeta,
        player: Address,
        amount: U256,
    ) -> Result<Outcome> {
        let mut vault = self.get_or_init_vault(player, meta.timestamp).await?;
        vault.withdrawable_balance = match guard::credit(
            player,
            "withdrawable_balance",
            vault.withdrawable_balance,
            amount,
        ) {
            Ok(balance) => balance,
            Err(violation) => return Ok(rejected(violation)),
        };
        vault.last_updated_at = meta.timestamp;
        self.stage(Key::Vault(player), Value::Vault(vault));
        Ok(Outcome::Applied)
    }

    /// Debit a withdrawal from the player's vault.
    ///
    /// A missing vault means the matching deposit predates the replayed window; the
    /// event is dropped without creating anything.
    pub(in crate::projection) async fn handle_withdrawal(
        &mut self,
        meta: &EventMeta,
        player: Address,
        amount: U256,
    ) -> Result<Outcome> {
        let mut vault = match self.get(&Key::Vault(player)).await? {
            Some(Value::Vault(vault)) => vault,
            _ => {
                return Ok(Outcome::Dropped(DropReason::VaultMissing {
                    address: player,
                }))
            }
        };
        vault.withdrawable_balance =
            match guard::debit_balance(player, vault.withdrawable_balance, amount) {
                Ok(balance) => balance,
                Err(violation) => return Ok(rejected(violation)),
            };
        vault.last_updated_at = meta.timestamp;
        self.stage(Key::Vault(player), Value::Vault(vault));
        Ok(Outcome::Applied)
    }

    /// Add a referral payout to the referrer's lifetime commission total. The paying
    /// player's vault is untouched; the chain already moved the funds.
    pub(in crate::projection) async fn handle_commission_paid(
        &mut self,
        meta: &EventMeta,
        referrer: Address,
        amount: U256,
    ) -> Result<Outcome> {
        let mut vault = self.get_or_init_vault(referrer, meta.timestamp).await?;
        vault.total_commission_paid = match guard::credit(
            referrer,
            "total_commission_paid",
            vault.total_commission_paid,
            amount,
        ) {
            Ok(total) => total,
            Err(violation) => return Ok(rejected(violation)),
        };
        vault.last_updated_at = meta.timestamp;
        self.stage(Key::Vault(referrer), Value::Vault(vault));
        Ok(Outcome::Applied)
    }
}
