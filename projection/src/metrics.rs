//! Observer surface for the projection pipeline.
//!
//! Counters are registered against the runtime's metrics context and handed to the
//! pipeline as an explicit observer; nothing here is process-global state.

use crate::{DropReason, Outcome, RejectReason};
use commonware_runtime::Metrics;
use prometheus_client::metrics::counter::Counter;
use std::sync::atomic::AtomicU64;

/// Per-outcome event counters plus flush accounting.
#[derive(Clone)]
pub struct ProjectionMetrics {
    pub applied: Counter<u64, AtomicU64>,
    pub skipped: Counter<u64, AtomicU64>,
    pub dropped: Counter<u64, AtomicU64>,
    pub guard_rejections: Counter<u64, AtomicU64>,
    pub collisions: Counter<u64, AtomicU64>,
    pub flushes: Counter<u64, AtomicU64>,
    pub flushed_writes: Counter<u64, AtomicU64>,
}

impl ProjectionMetrics {
    pub fn register(context: &impl Metrics) -> Self {
        let applied: Counter<u64, AtomicU64> = Counter::default();
        let skipped: Counter<u64, AtomicU64> = Counter::default();
        let dropped: Counter<u64, AtomicU64> = Counter::default();
        let guard_rejections: Counter<u64, AtomicU64> = Counter::default();
        let collisions: Counter<u64, AtomicU64> = Counter::default();
        let flushes: Counter<u64, AtomicU64> = Counter::default();
        let flushed_writes: Counter<u64, AtomicU64> = Counter::default();
        context.register(
            "events_applied_total",
            "Number of events whose writes committed",
            applied.clone(),
        );
        context.register(
            "events_skipped_total",
            "Number of unrecognized events skipped",
            skipped.clone(),
        );
        context.register(
            "events_dropped_total",
            "Number of events dropped because an expected entity was missing",
            dropped.clone(),
        );
        context.register(
            "guard_rejections_total",
            "Number of events rejected by the consistency guard",
            guard_rejections.clone(),
        );
        context.register(
            "identity_collisions_total",
            "Number of events rejected because a unique key already existed",
            collisions.clone(),
        );
        context.register(
            "flushes_total",
            "Number of change-set flushes to the entity store",
            flushes.clone(),
        );
        context.register(
            "flushed_writes_total",
            "Number of entity rows written during flushes",
            flushed_writes.clone(),
        );

        Self {
            applied,
            skipped,
            dropped,
            guard_rejections,
            collisions,
            flushes,
            flushed_writes,
        }
    }

    /// Record one event's outcome.
    pub fn observe(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied.inc(),
            Outcome::Skipped { .. } => self.skipped.inc(),
            Outcome::Dropped(DropReason::VaultMissing { .. })
            | Outcome::Dropped(DropReason::RequestMissing { .. })
            | Outcome::Dropped(DropReason::AlreadyFulfilled { .. }) => self.dropped.inc(),
            Outcome::Rejected(RejectReason::Guard(_)) => self.guard_rejections.inc(),
            Outcome::Rejected(RejectReason::Collision { .. }) => self.collisions.inc(),
        };
    }
}
