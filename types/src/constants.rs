//! Projection-wide constants.

/// Maximum random words accepted in a single VRF fulfillment. Mirrors the upstream
/// coordinator's per-request word limit.
pub const MAX_RANDOM_WORDS: usize = 500;

/// Maximum raw payload bytes retained for an event the projector does not recognize.
pub const MAX_RAW_EVENT_BYTES: usize = 1024;
