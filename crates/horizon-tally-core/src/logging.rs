//! Logging facilities for Horizon Tally.
//!
//! Horizon Tally uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your
//! application:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::new("horizon_tally=debug"))
//!     .init();
//! ```
//!
//! Filter on the constants in [`targets`] to follow a single subsystem, e.g.
//! `RUST_LOG=horizon_tally::collection=debug` to watch fetches, merges,
//! ignored concurrent fetches and dropped stale responses.

/// Span names used throughout Horizon Tally for tracing.
pub mod span_names {
    /// One `fetch_next` call, from guard check to merge.
    pub const FETCH: &str = "horizon_tally::fetch";
    /// One `fetch_all` loop.
    pub const FETCH_ALL: &str = "horizon_tally::fetch_all";
    /// One GraphQL operation.
    pub const GRAPHQL: &str = "horizon_tally_net::graphql";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_tally_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_tally_core::signal";
    /// Paged collection controller target.
    pub const COLLECTION: &str = "horizon_tally::collection";
    /// Selection model target.
    pub const SELECTION: &str = "horizon_tally::selection";
    /// Collection registry target.
    pub const REGISTRY: &str = "horizon_tally::registry";
    /// Configuration loading target.
    pub const CONFIG: &str = "horizon_tally::config";
    /// HTTP transport target.
    pub const NET: &str = "horizon_tally_net::http";
    /// GraphQL client and page source target.
    pub const GRAPHQL: &str = "horizon_tally_net::graphql";
}
