use crate::auth::{AuthApi, AuthError, AuthSession};
use crate::cart::Cart;
use crate::catalog::{browse, BrowseQuery, CatalogApi, CatalogError, Category};
use crate::config::RegistryConfig;
use crate::model::{Credentials, Product, UserId, UserProfile};
use crate::registry::{RegistryActor, RegistryClient, RegistryContext};
use crate::storage::{KeyValueStore, StorageError};
use crate::wishlist::Wishlist;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Wires the storefront together and owns its background tasks.
///
/// `StorefrontSystem` is responsible for:
/// - **Lifecycle Management**: starting the registry actor and the session watcher, and
///   stopping both on [`shutdown`](Self::shutdown)
/// - **Dependency Wiring**: injecting the store and catalog into the registry at `run()`
/// - **Session Following**: reloading the registry whenever the signed-in identity changes
///
/// # Example
///
/// ```ignore
/// let system = StorefrontSystem::new(RegistryConfig::default(), store, catalog, auth_api);
///
/// system.login(Credentials::new("emilys", "emilyspass")).await?;
/// let lamp = system.registry.create(ProductDraft::new("Lamp")).await?;
///
/// system.shutdown().await?;
/// ```
pub struct StorefrontSystem {
    /// The signed-in session.
    pub auth: AuthSession,

    /// Client of the registry actor.
    pub registry: RegistryClient,

    store: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn CatalogApi>,
    stop_watcher: oneshot::Sender<()>,
    watcher: JoinHandle<()>,
    actor: JoinHandle<()>,
}

impl StorefrontSystem {
    /// Spawns the registry actor and the session watcher.
    ///
    /// The watcher loads the registry for the identity current at start-up, then again on
    /// every change published by the session.
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn CatalogApi>,
        auth_api: Arc<dyn AuthApi>,
    ) -> Self {
        let auth = AuthSession::new(auth_api, store.clone());

        let (actor, registry) = RegistryActor::new(config);
        let actor = tokio::spawn(actor.run(RegistryContext {
            catalog: catalog.clone(),
            store: store.clone(),
        }));

        let (stop_watcher, stopped) = oneshot::channel();
        let watcher = tokio::spawn(follow_session(auth.subscribe(), registry.clone(), stopped));

        Self {
            auth,
            registry,
            store,
            catalog,
            stop_watcher,
            watcher,
            actor,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogApi> {
        &self.catalog
    }

    pub fn wishlist(&self) -> Result<Wishlist, StorageError> {
        Wishlist::load(self.store.clone())
    }

    pub fn cart(&self) -> Result<Cart, StorageError> {
        Cart::load(self.store.clone())
    }

    pub async fn browse(&self, query: &BrowseQuery) -> Result<Vec<Product>, CatalogError> {
        browse(self.catalog.as_ref(), query).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.catalog.categories().await
    }

    /// Signs in and waits until the registry serves the new user's partition.
    pub async fn login(&self, credentials: Credentials) -> Result<UserProfile, AuthError> {
        let profile = self.auth.login(credentials).await?;
        self.sync_session().await;
        Ok(profile)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        let result = self.auth.logout();
        self.sync_session().await;
        result
    }

    /// Picks up a stored token, then waits for the registry to follow.
    pub async fn restore(&self) -> Result<Option<UserProfile>, AuthError> {
        let profile = self.auth.restore().await?;
        self.sync_session().await;
        Ok(profile)
    }

    /// Resolves once the registry has loaded the partition of the current identity.
    pub async fn sync_session(&self) {
        let mut changes = self.registry.changes();
        loop {
            match self.registry.session().await {
                Ok(session) if session == self.auth.current_identity() => return,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Registry unavailable while syncing session");
                    return;
                }
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Gracefully shuts down the system.
    ///
    /// Stops the session watcher, drops the registry client so the actor's mailbox
    /// closes, and waits for both tasks. Clones of the registry client held elsewhere keep
    /// the actor alive until they are dropped too.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down storefront...");

        let _ = self.stop_watcher.send(());
        if let Err(e) = self.watcher.await {
            error!("Session watcher failed: {:?}", e);
            return Err(e);
        }

        drop(self.registry);
        drop(self.auth);
        if let Err(e) = self.actor.await {
            error!("Registry task failed: {:?}", e);
            return Err(e);
        }

        info!("Storefront shutdown complete.");
        Ok(())
    }
}

async fn follow_session(
    mut identities: watch::Receiver<Option<UserId>>,
    registry: RegistryClient,
    mut stopped: oneshot::Receiver<()>,
) {
    let initial = identities.borrow_and_update().clone();
    if let Err(e) = registry.load(initial).await {
        warn!(error = %e, "Initial registry load failed");
    }

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            changed = identities.changed() => {
                if changed.is_err() {
                    break;
                }
                let identity = identities.borrow_and_update().clone();
                info!(session = ?identity, "Session changed");
                if let Err(e) = registry.load(identity).await {
                    warn!(error = %e, "Registry reload failed");
                }
            }
        }
    }
}
