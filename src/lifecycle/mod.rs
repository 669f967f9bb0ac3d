//! # System Lifecycle & Orchestration
//!
//! Starts, wires and stops the storefront's background tasks.
//!
//! ## The Orchestration Pattern
//!
//! The registry actor and the auth session are simple on their own; the coupling between
//! them (the registry's storage partition follows the signed-in identity) lives here.
//!
//! **Key Responsibilities:**
//! 1. **Actor Creation** - build the registry actor and its client
//! 2. **Dependency Injection** - hand the store and catalog to the actor at `run()`
//! 3. **Session Following** - a watcher task turns identity changes into registry loads
//! 4. **Graceful Shutdown** - stop the watcher, close the mailbox, await both tasks
//! 5. **Observability Setup** - [`setup_tracing`]
//!
//! ```rust,ignore
//! setup_tracing("info");
//! let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
//! let api = Arc::new(ApiClient::from_config(&config, store.clone())?);
//! let system = StorefrontSystem::new(config.registry, store, api.clone(), api);
//! system.restore().await?;
//! ```

pub mod storefront_system;
pub mod tracing;

pub use self::tracing::*;
pub use storefront_system::*;
