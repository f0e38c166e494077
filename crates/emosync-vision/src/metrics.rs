//! Metric names emitted by the vision layer.
//!
//! Counters are recorded through the `metrics` facade; they are no-ops unless
//! the binary installs a recorder.

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAME_CACHE_HITS_TOTAL: &str = "emosync_frame_cache_hits_total";
    pub const FRAME_INFERENCES_TOTAL: &str = "emosync_frame_inferences_total";
    pub const FRAME_FALLBACKS_TOTAL: &str = "emosync_frame_fallbacks_total";
}
