use super::ids::LocalIdGenerator;
use super::message::{RegistryRequest, Response};
use super::state::{merge_unique, Partitions};
use super::{RegistryClient, RegistryError};
use crate::catalog::{normalize_all, CatalogApi, CatalogQuery, ProductPayload};
use crate::config::RegistryConfig;
use crate::model::{Origin, Product, ProductDraft, ProductId, ProductPatch, UserId};
use crate::storage::{products_key, JsonStore, KeyValueStore, StorageError};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Dependencies injected when the actor starts.
#[derive(Clone)]
pub struct RegistryContext {
    pub catalog: Arc<dyn CatalogApi>,
    pub store: Arc<dyn KeyValueStore>,
}

/// Owns the merged product view of the current session.
///
/// Requests are handled strictly one after another, including the awaited remote call of
/// an update or delete, so no lock guards the partitions. Refresh and search run their
/// network call in a spawned task; a refresh result re-enters through the mailbox and is
/// applied only if the session epoch it was stamped with is still current.
pub struct RegistryActor {
    receiver: mpsc::Receiver<RegistryRequest>,
    // Weak so that a running actor does not keep its own mailbox open.
    mailbox: mpsc::WeakSender<RegistryRequest>,
    config: RegistryConfig,
    session: Option<UserId>,
    epoch: u64,
    partitions: Partitions,
    // Set when the session's stored set could not be read.
    unreadable: bool,
    ids: LocalIdGenerator,
    revision: watch::Sender<u64>,
}

impl RegistryActor {
    pub fn new(config: RegistryConfig) -> (Self, RegistryClient) {
        let (sender, receiver) = mpsc::channel(config.mailbox_capacity.max(1));
        let (revision, changes) = watch::channel(0);
        let actor = Self {
            receiver,
            mailbox: sender.downgrade(),
            config,
            session: None,
            epoch: 0,
            partitions: Partitions::default(),
            unreadable: false,
            ids: LocalIdGenerator::default(),
            revision,
        };
        (actor, RegistryClient::new(sender, changes))
    }

    /// Runs the event loop until every client is dropped.
    pub async fn run(mut self, ctx: RegistryContext) {
        info!("Registry started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RegistryRequest::Load {
                    identity,
                    respond_to,
                } => {
                    let loaded = self.load(&ctx, identity);
                    let readable = loaded.is_ok();
                    let _ = respond_to.send(loaded);
                    if readable && self.config.refresh_on_load {
                        self.spawn_refresh(&ctx, self.config.default_query.clone(), None);
                    }
                }
                RegistryRequest::Refresh { query, respond_to } => {
                    debug!(session = ?self.session, epoch = self.epoch, ?query, "Refresh");
                    self.spawn_refresh(&ctx, query, Some(respond_to));
                }
                RegistryRequest::ApplyRemote {
                    epoch,
                    products,
                    respond_to,
                } => {
                    let result = self.apply_remote(&ctx, epoch, products);
                    if let Some(respond_to) = respond_to {
                        let _ = respond_to.send(result);
                    }
                }
                RegistryRequest::Search { query, respond_to } => {
                    self.search(&ctx, query, respond_to);
                }
                RegistryRequest::List { respond_to } => {
                    let _ = respond_to.send(Ok(self.partitions.merged()));
                }
                RegistryRequest::Local { respond_to } => {
                    let _ = respond_to.send(Ok(self.partitions.local().to_vec()));
                }
                RegistryRequest::Get { id, respond_to } => {
                    let item = self.partitions.find(&id).cloned();
                    debug!(%id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                RegistryRequest::Session { respond_to } => {
                    let _ = respond_to.send(Ok(self.session.clone()));
                }
                RegistryRequest::Create { draft, respond_to } => {
                    let result = self.create(&ctx, draft);
                    let _ = respond_to.send(result);
                }
                RegistryRequest::Update {
                    id,
                    patch,
                    respond_to,
                } => {
                    let result = self.update(&ctx, id, patch).await;
                    let _ = respond_to.send(result);
                }
                RegistryRequest::Delete { id, respond_to } => {
                    let result = self.delete(&ctx, id).await;
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(session = ?self.session, size = self.partitions.len(), "Registry shutdown");
    }

    fn load(&mut self, ctx: &RegistryContext, identity: Option<UserId>) -> Result<usize, RegistryError> {
        self.epoch += 1;
        self.session = identity;
        let key = products_key(self.session.as_ref());

        let records = match read_records(ctx.store.as_ref(), &key) {
            Ok(records) => records,
            Err(e) => {
                warn!(%key, error = %e, "Could not read stored products, refusing writes");
                self.partitions = Partitions::default();
                self.unreadable = true;
                self.bump();
                return Err(e.into());
            }
        };
        self.partitions = Partitions::from_records(records);
        self.unreadable = false;
        self.ids.seed(self.partitions.local().iter().map(|p| &p.id));
        self.bump();

        info!(
            session = ?self.session,
            epoch = self.epoch,
            remote = self.partitions.remote_len(),
            local = self.partitions.local().len(),
            "Loaded"
        );
        Ok(self.partitions.len())
    }

    fn ensure_writable(&self) -> Result<(), RegistryError> {
        if self.unreadable {
            warn!(session = ?self.session, "Write refused, stored products were not read");
            return Err(RegistryError::PartitionUnreadable);
        }
        Ok(())
    }

    fn spawn_refresh(
        &self,
        ctx: &RegistryContext,
        query: CatalogQuery,
        respond_to: Option<Response<usize>>,
    ) {
        let epoch = self.epoch;
        let session = self.session.clone();
        let catalog = ctx.catalog.clone();
        let mailbox = self.mailbox.clone();

        tokio::spawn(async move {
            match catalog.fetch_products(&query).await {
                Ok(page) => {
                    let products = normalize_all(page.products);
                    // Dropping `respond_to` here surfaces as ActorDropped to the caller.
                    let Some(mailbox) = mailbox.upgrade() else {
                        return;
                    };
                    let _ = mailbox
                        .send(RegistryRequest::ApplyRemote {
                            epoch,
                            products,
                            respond_to,
                        })
                        .await;
                }
                Err(e) => {
                    warn!(?session, error = %e, "Remote refresh failed, keeping current products");
                    if let Some(respond_to) = respond_to {
                        let _ = respond_to.send(Err(e.into()));
                    }
                }
            }
        });
    }

    fn apply_remote(
        &mut self,
        ctx: &RegistryContext,
        epoch: u64,
        products: Vec<Product>,
    ) -> Result<usize, RegistryError> {
        if epoch != self.epoch {
            info!(
                stale_epoch = epoch,
                epoch = self.epoch,
                size = products.len(),
                "Discarding refresh from a previous session"
            );
            return Err(RegistryError::StaleSession);
        }
        self.ensure_writable()?;
        self.partitions.replace_remote(products);
        self.bump();
        let size = self.partitions.remote_len();
        info!(session = ?self.session, size, "Remote products refreshed");
        self.persist(ctx)?;
        Ok(size)
    }

    fn search(&self, ctx: &RegistryContext, query: String, respond_to: Response<Vec<Product>>) {
        let query = query.trim().to_string();
        if query.is_empty() {
            let _ = respond_to.send(Ok(self.partitions.merged()));
            return;
        }
        let local = self.partitions.local_matches(&query.to_lowercase());
        let catalog = ctx.catalog.clone();

        tokio::spawn(async move {
            let remote = match catalog.search(&query).await {
                Ok(page) => normalize_all(page.products),
                Err(e) => {
                    warn!(%query, error = %e, "Remote search failed, returning local matches only");
                    Vec::new()
                }
            };
            let results = merge_unique(remote, local);
            debug!(%query, size = results.len(), "Search");
            let _ = respond_to.send(Ok(results));
        });
    }

    fn create(&mut self, ctx: &RegistryContext, draft: ProductDraft) -> Result<Product, RegistryError> {
        self.ensure_writable()?;
        if let Err(e) = draft.validate() {
            warn!(error = %e, "Create rejected");
            return Err(e.into());
        }
        let partitions = &self.partitions;
        let id = self.ids.next(|id| partitions.contains(id));
        let product = Product::from_draft(id, draft, self.session.clone(), Utc::now());

        self.partitions.push_local(product.clone());
        self.bump();
        info!(id = %product.id, session = ?self.session, size = self.partitions.len(), "Created");

        if self.config.mirror_remote_creates {
            self.mirror_create(ctx, &product);
        }
        self.persist(ctx)?;
        Ok(product)
    }

    // The demo API acknowledges but never stores writes; the reply is only logged.
    fn mirror_create(&self, ctx: &RegistryContext, product: &Product) {
        let catalog = ctx.catalog.clone();
        let payload = ProductPayload::from(product);
        let local_id = product.id.clone();
        tokio::spawn(async move {
            match catalog.add_product(&payload).await {
                Ok(reply) => {
                    debug!(%local_id, remote_id = ?reply.id, "Remote create acknowledged")
                }
                Err(e) => warn!(%local_id, error = %e, "Remote create failed"),
            }
        });
    }

    async fn update(
        &mut self,
        ctx: &RegistryContext,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RegistryError> {
        self.ensure_writable()?;
        if let Err(e) = patch.validate() {
            warn!(%id, error = %e, "Update rejected");
            return Err(e.into());
        }
        let origin = match self.partitions.find(&id) {
            Some(product) => product.origin,
            None => {
                warn!(%id, "Not found");
                return Err(RegistryError::NotFound(id));
            }
        };

        let remote_reply = match origin {
            Origin::Local => None,
            Origin::Remote => match ctx.catalog.update_product(&id, &ProductPayload::from(&patch)).await {
                Ok(reply) => Some(reply),
                Err(e) => {
                    warn!(%id, error = %e, "Remote update failed, applying locally");
                    None
                }
            },
        };

        let now = Utc::now();
        let updated = {
            let product = self
                .partitions
                .find_mut(&id)
                .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
            match &remote_reply {
                Some(reply) => reply.overlay(product, now),
                None => patch.apply_to(product, now),
            }
            product.clone()
        };
        self.bump();
        info!(%id, %origin, remote_ack = remote_reply.is_some(), "Updated");

        self.persist(ctx)?;
        Ok(updated)
    }

    async fn delete(&mut self, ctx: &RegistryContext, id: ProductId) -> Result<(), RegistryError> {
        self.ensure_writable()?;
        let origin = match self.partitions.find(&id) {
            Some(product) => product.origin,
            None => {
                warn!(%id, "Not found");
                return Err(RegistryError::NotFound(id));
            }
        };
        if origin == Origin::Remote {
            if let Err(e) = ctx.catalog.delete_product(&id).await {
                warn!(%id, error = %e, "Remote delete failed, removing locally");
            }
        }
        self.partitions.remove(&id);
        self.bump();
        info!(%id, %origin, size = self.partitions.len(), "Deleted");

        self.persist(ctx)
    }

    /// Writes the merged set under the session key. The in-memory state stays as is on
    /// failure.
    fn persist(&self, ctx: &RegistryContext) -> Result<(), RegistryError> {
        let key = products_key(self.session.as_ref());
        let merged: Vec<&Product> = self.partitions.iter().collect();
        ctx.store.save_json(&key, &merged).map_err(|e| {
            warn!(%key, error = %e, "Persist failed");
            RegistryError::from(e)
        })
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// Reads a stored product set, skipping records that no longer decode.
///
/// An undecodable blob counts as empty. A store that cannot be read at all is an error.
fn read_records(store: &dyn KeyValueStore, key: &str) -> Result<Vec<Product>, StorageError> {
    let raw: Vec<Value> = match store.load_json(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(Vec::new()),
        Err(StorageError::Serialization(e)) => {
            warn!(%key, error = %e, "Stored products unreadable, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Product>(value) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(%key, error = %e, "Skipping unreadable stored product");
                None
            }
        })
        .collect())
}
