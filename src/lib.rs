#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Storefront Registry
//!
//! > **An offline-first product registry on top of a read-mostly catalog API.**
//!
//! The remote catalog (a DummyJSON-style REST API) accepts writes but never keeps them.
//! This crate keeps the user's own products on the device, merges them with the remote
//! catalog, and partitions everything by the signed-in user.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why an actor?
//!
//! The registry is touched from several places at once: the CLI command, a background
//! refresh, a background search, and the session watcher that reloads it when the user
//! changes. Putting the state behind one mailbox means:
//! - **No locks**: requests are handled one at a time by a single task.
//! - **No torn sessions**: a refresh started for user A can never land in user B's
//!   partition. Every load bumps an epoch, and results carrying an older epoch are dropped.
//! - **Honest failures**: a closed mailbox is [`ActorClosed`](registry::RegistryError::ActorClosed),
//!   a vanished reply is [`ActorDropped`](registry::RegistryError::ActorDropped).
//!
//! ### Local state is the source of truth
//!
//! Remote writes are mirrored when possible but only the store is authoritative. Remote
//! failures degrade (a failed refresh keeps the current set, a failed search falls back
//! to local matches); storage failures are reported.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`], [`storage`])
//! - **Role**: Product and user records, the payloads that create and change them, and the
//!   key/value store they persist into.
//! - **Key items**: [`Product`](model::Product), [`ProductId`](model::ProductId),
//!   [`KeyValueStore`](storage::KeyValueStore), [`FileStore`](storage::FileStore).
//!
//! ### 2. The Remote Side ([`catalog`], [`http`])
//! - **Role**: The catalog contract, wire normalization, and the `reqwest` client.
//! - **Key items**: [`CatalogApi`](catalog::CatalogApi), [`ApiClient`](http::ApiClient),
//!   [`browse`](catalog::browse()).
//!
//! ### 3. The Engine ([`registry`])
//! - **Role**: The per-user product registry actor and its typed client.
//! - **Key items**: [`RegistryActor`](registry::RegistryActor),
//!   [`RegistryClient`](registry::RegistryClient).
//!
//! ### 4. The Session ([`auth`])
//! - **Role**: Login, logout, restore, and the identity channel the registry follows.
//! - **Key items**: [`AuthSession`](auth::AuthSession).
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! - **Role**: Spins up the actor and the session watcher and tears them down again.
//! - **Key items**: [`StorefrontSystem`](lifecycle::StorefrontSystem),
//!   [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ### 6. The Extras ([`cart`], [`wishlist`], [`config`])
//! Small stored lists and the environment-driven configuration.
//!
//! ### Mocking
//! [`mock`] has scripted [`CatalogApi`](catalog::CatalogApi) and [`AuthApi`](auth::AuthApi)
//! doubles so the registry can be tested without a network.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! storefront login emilys emilyspass
//! storefront create "Lamp" --price 29.99 --category home
//! storefront products --local
//! RUST_LOG=info storefront refresh --limit 30
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mock;
pub mod model;
pub mod registry;
pub mod storage;
pub mod wishlist;
