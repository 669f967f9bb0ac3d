//! # Observability & Tracing
//!
//! Structured logging for the storefront.
//!
//! ## Overview
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter that hides the
//! module prefix (`with_target(false)`) and writes to stderr, leaving stdout to the CLI's
//! own output. The filter comes from `RUST_LOG`; when that is unset the level given by
//! the caller (the CLI's `--log-level`) applies.
//!
//! ## What Gets Traced
//!
//! - **Registry lifecycle**: start, each `Loaded` with its session, epoch and subset sizes,
//!   shutdown with the final size
//! - **Mutations**: `Created`, `Updated`, `Deleted` with the product id and origin
//! - **Degradation**: failed refreshes, searches and remote writes at `warn`, each with the
//!   error that caused the fallback
//! - **Discarded refreshes**: `Discarding refresh from a previous session` with both epochs
//!
//! ## Usage Examples
//!
//! ```bash
//! # Default: warnings only
//! storefront products
//!
//! # Show loads, refreshes and mutations
//! RUST_LOG=info storefront refresh
//!
//! # Full payloads (drafts, patches, queries)
//! storefront --log-level debug create "Lamp" --price 29.99
//! ```
//!
//! A session switch racing a refresh looks like this at `info`:
//!
//! ```text
//! INFO Loaded session=Some(UserId("1")) epoch=1 remote=0 local=2
//! INFO Session changed session=Some(UserId("2"))
//! INFO Loaded session=Some(UserId("2")) epoch=2 remote=0 local=0
//! INFO Discarding refresh from a previous session stale_epoch=1 epoch=2 size=30
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
