//! # Product Registry
//!
//! Reconciles the remote catalog with locally created and edited products, and mirrors
//! the merged view to the store under the session-scoped key.
//!
//! ## Overview
//!
//! The registry is a single actor ([`RegistryActor`]) reached through a cloneable
//! [`RegistryClient`]. It keeps two subsets per session:
//!
//! - **remote**: replaced wholesale by every successful refresh
//! - **local**: created by the user under a `local_` id, edited in place
//!
//! Every record carries an explicit [`Origin`](crate::model::Origin) tag, and updates and
//! deletes dispatch on it. After any mutation the merged set (remote first, then local)
//! is written to `all_products_<user>` or `all_products_guest`.
//!
//! ## Concurrency
//!
//! The mailbox is the single-flight queue: a create, update or delete completes, including
//! its awaited remote call, before the next request is looked at. Refresh and search do
//! their network work in spawned tasks so reads stay responsive. Each `load` bumps the
//! session epoch; a refresh started under an older epoch is discarded with
//! [`RegistryError::StaleSession`] instead of landing in the wrong partition.
//!
//! ## Failure model
//!
//! Network failures never lose local state. A failed refresh is a no-op, a failed search
//! returns local matches only, and failed remote writes fall back to the local edit. A
//! store failure after a mutation is returned to the caller while the in-memory change
//! stays in place.
//!
//! ## Example
//!
//! ```ignore
//! let (actor, registry) = RegistryActor::new(RegistryConfig::default());
//! tokio::spawn(actor.run(RegistryContext { catalog, store }));
//!
//! registry.load(Some(UserId::from(1u64))).await?;
//! let lamp = registry
//!     .create(ProductDraft::new("Lamp").price(29.99).stock(5).category("home"))
//!     .await?;
//! assert!(lamp.id.has_local_prefix());
//! ```

mod actor;
mod client;
pub mod error;
mod ids;
mod message;
mod state;

pub use actor::{RegistryActor, RegistryContext};
pub use client::RegistryClient;
pub use error::*;
pub use message::Response;
