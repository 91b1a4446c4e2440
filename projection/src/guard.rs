//! Consistency guard: invariant checks run on every staged write before it commits.
//!
//! The guard accepts or rejects a proposed row; it never repairs one. A rejection
//! aborts the whole event (none of its writes commit) and the stream continues with
//! the next event.
//!
//! Balances and stake amounts are unsigned by construction, so their non-negativity
//! invariants reduce to the checked arithmetic in [`debit_balance`] and [`credit`].
//! [`check`] holds what remains: the cross-write monotonicity rules.

use alloy_primitives::{Address, U256};
use chainfold_types::{Key, RequestInvariantError, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardViolation {
    #[error("vault {address:#x} balance {balance} cannot cover debit {debit}")]
    BalanceUnderflow {
        address: Address,
        balance: U256,
        debit: U256,
    },

    #[error("{field} addition for {address:#x} overflowed")]
    AmountOverflow {
        address: Address,
        field: &'static str,
    },

    #[error("vault {address:#x} total commission regressed from {prior} to {proposed}")]
    CommissionRegressed {
        address: Address,
        prior: U256,
        proposed: U256,
    },

    #[error("request {request_id} fulfillment cannot revert to unfulfilled")]
    FulfillmentRegressed { request_id: U256 },

    #[error(transparent)]
    Request(#[from] RequestInvariantError),
}

/// Debit a vault balance, refusing to go below zero.
pub(crate) fn debit_balance(
    address: Address,
    balance: U256,
    debit: U256,
) -> Result<U256, GuardViolation> {
    balance
        .checked_sub(debit)
        .ok_or(GuardViolation::BalanceUnderflow {
            address,
            balance,
            debit,
        })
}

/// Add to an unsigned accumulator, refusing to wrap.
pub(crate) fn credit(
    address: Address,
    field: &'static str,
    current: U256,
    amount: U256,
) -> Result<U256, GuardViolation> {
    current
        .checked_add(amount)
        .ok_or(GuardViolation::AmountOverflow { address, field })
}

/// Validate a staged row against its prior durable state.
pub(crate) fn check(
    key: &Key,
    prior: Option<&Value>,
    proposed: &Value,
) -> Result<(), GuardViolation> {
    match (key, proposed) {
        (Key::Vault(address), Value::Vault(vault)) => {
            if let Some(Value::Vault(prior)) = prior {
                if vault.total_commission_paid < prior.total_commission_paid {
                    return Err(GuardViolation::CommissionRegressed {
                        address: *address,
                        prior: prior.total_commission_paid,
                        proposed: vault.total_commission_paid,
                    });
                }
            }
            Ok(())
        }
        (Key::Request(request_id), Value::Request(request)) => {
            request.validate_invariants()?;
            if let Some(Value::Request(prior)) = prior {
                if prior.fulfilled && !request.fulfilled {
                    return Err(GuardViolation::FulfillmentRegressed {
                        request_id: *request_id,
                    });
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
