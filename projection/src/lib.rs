//! Chainfold projection engine.
//!
//! This crate folds the ordered chain event log into durable entities: players, vault
//! balances, stake records, upgrade attempts, and VRF request state. The fold is
//! deterministic; replaying the same event sequence into an empty store always rebuilds
//! byte-identical state.
//!
//! ## Determinism requirements
//! - Do not read wall-clock time inside handlers; every timestamp comes from the event.
//! - Do not let iteration order of hash-based collections influence outputs; change
//!   sets leave the projection sorted by key.
//! - Handler effects depend only on (loaded entity, event); no ambient state.
//!
//! ## Error policy
//! Store I/O failures are the only errors that propagate. Domain problems (unrecognized
//! event kinds, missing entities, guard violations, identity collisions) resolve to an
//! [`Outcome`] so one bad event never halts the stream.
//!
//! The primary entrypoint is [`Projection`]; [`pipeline::Actor`] drives one from a
//! mailbox with identity-sharded workers.
//!
//! ## Minimal replay (example)
//! ```rust,ignore
//! # #[cfg(feature = "mocks")]
//! # {
//! use chainfold_projection::{replay, Memory};
//!
//! # async fn example(events: Vec<chainfold_types::ChainEvent>) -> anyhow::Result<()> {
//! let store = Memory::default();
//! replay(&store, &events).await?;
//! // `store` now holds the projected entities.
//! # Ok(())
//! # }
//! # }
//! ```

pub mod metrics;
pub mod pipeline;
pub mod source;

mod guard;
mod projection;
mod store;


pub use guard::GuardViolation;
pub use projection::{replay, DropReason, Outcome, Projection, RejectReason};
pub use store::Store;

#[cfg(any(test, feature = "mocks"))]
pub use store::Memory;
