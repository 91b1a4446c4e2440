//! Projected entities.
//!
//! Each entity is a durable record keyed by a deterministic identity (see
//! [`crate::identity`]) and mutated only by the projection engine. No entity is ever
//! deleted.

mod player;
mod stake;
mod upgrade;
mod vault;
mod vrf;

pub use player::Player;
pub use stake::StakeRecord;
pub use upgrade::UpgradeAttempt;
pub use vault::Vault;
pub use vrf::{RandomnessRequest, RequestInvariantError, RequestType, VrfAuthorization};
