use super::*;

/// Shorthand for handlers that stop on a guard violation without raising an error.
fn rejected(violation: GuardViolation) -> Outcome {
    Outcome::Rejected(RejectReason::Guard(violation))
}

mod altar;
mod staking;
mod vault;
mod vrf;
