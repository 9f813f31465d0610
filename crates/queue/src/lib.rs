//! Background jobs for peertube-rs.
//!
//! - **Redundancy**: periodic sweep duplicating remote videos picked by the
//!   configured strategies, and expiring old redundancies
//! - **Executor**: the database-backed sweep implementation
//! - **HLS**: streaming playlist download into the redundancy directory
//! - **Retry**: exponential backoff for remote downloads

pub mod executor;
pub mod hls;
pub mod redundancy;
pub mod retry;

pub use executor::{DbRedundancyExecutor, RedundancyDirectoryRemover, RedundancyUrls, is_too_heavy};
pub use hls::{HlsDownloader, PlaylistDownloader, parse_playlist_uris};
pub use redundancy::{
    RedundancyExecutor, StrategyOutcome, SweepSummary, run_redundancy_scheduler,
    run_redundancy_sweep,
};
pub use retry::RetryPolicy;
