//! Chainfold domain types.
//!
//! Defines the chain event model, the projected entities, identity resolution, and the
//! store key/value encoding shared by the projection engine and its embedders.
//!
//! All identities are pure functions of event fields: two projector instances replaying
//! the same event sequence must derive byte-identical keys and values.

pub mod codec;
pub mod constants;
pub mod entity;
pub mod event;
pub mod identity;
pub mod store;

pub use constants::*;
pub use entity::{
    Player, RandomnessRequest, RequestInvariantError, RequestType, StakeRecord, UpgradeAttempt,
    Vault, VrfAuthorization,
};
pub use event::{ChainEvent, EventMeta, EventPayload};
pub use identity::{address_key, attempt_key, request_key};
pub use store::{Key, Value};
