//! Sharded projection pipeline.
//!
//! Events enter through a [`Mailbox`] and are routed to a fixed set of shard workers
//! by routing identity, so all events touching one identity are folded by the same
//! worker in arrival order. Workers hold their accepted writes until a flush pushes
//! them to the store.

mod actor;
mod ingress;

pub use actor::Actor;
pub use ingress::{Mailbox, Message};
use std::num::NonZeroUsize;

pub struct Config {
    /// Number of shard workers. Identity routing is stable for a given shard count;
    /// changing it only moves identities between workers, never reorders one
    /// identity's events.
    pub shards: NonZeroUsize,
    /// Depth of the ingress and per-shard mailboxes.
    pub mailbox_size: usize,
}
