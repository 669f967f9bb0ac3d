use super::message::{RegistryRequest, Response};
use super::RegistryError;
use crate::catalog::CatalogQuery;
use crate::model::{Product, ProductDraft, ProductId, ProductPatch, UserId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

/// Handle to the registry actor. Cheap to clone; the actor stops once every clone is gone.
#[derive(Clone)]
pub struct RegistryClient {
    sender: mpsc::Sender<RegistryRequest>,
    changes: watch::Receiver<u64>,
}

impl RegistryClient {
    pub(crate) fn new(sender: mpsc::Sender<RegistryRequest>, changes: watch::Receiver<u64>) -> Self {
        Self { sender, changes }
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(Response<T>) -> RegistryRequest,
    ) -> Result<T, RegistryError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| RegistryError::ActorClosed)?;
        response.await.map_err(|_| RegistryError::ActorDropped)?
    }

    /// Switches to the partition of `identity` and returns how many records it holds.
    ///
    /// If the store cannot be read the load fails with [`RegistryError::Storage`] and writes
    /// are refused until a later load succeeds.
    #[instrument(skip(self))]
    pub async fn load(&self, identity: Option<UserId>) -> Result<usize, RegistryError> {
        self.call(|respond_to| RegistryRequest::Load {
            identity,
            respond_to,
        })
        .await
    }

    /// Replaces the remote subset with a fresh catalog page.
    ///
    /// On failure nothing changes. Returns [`RegistryError::StaleSession`] if the session
    /// was swapped while the request was in flight.
    #[instrument(skip(self))]
    pub async fn refresh_remote(&self, query: CatalogQuery) -> Result<usize, RegistryError> {
        self.call(|respond_to| RegistryRequest::Refresh { query, respond_to })
            .await
    }

    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, RegistryError> {
        debug!(?draft, "create called");
        self.call(|respond_to| RegistryRequest::Create { draft, respond_to })
            .await
    }

    #[instrument(skip(self, id, patch), fields(%id))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, RegistryError> {
        debug!(?patch, "update called");
        self.call(|respond_to| RegistryRequest::Update {
            id,
            patch,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, id), fields(%id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), RegistryError> {
        self.call(|respond_to| RegistryRequest::Delete { id, respond_to })
            .await
    }

    /// Remote hits followed by matching local records, without duplicate ids.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, RegistryError> {
        let query = query.to_string();
        self.call(|respond_to| RegistryRequest::Search { query, respond_to })
            .await
    }

    /// The merged set: remote records, then local ones.
    pub async fn products(&self) -> Result<Vec<Product>, RegistryError> {
        self.call(|respond_to| RegistryRequest::List { respond_to })
            .await
    }

    pub async fn local_products(&self) -> Result<Vec<Product>, RegistryError> {
        self.call(|respond_to| RegistryRequest::Local { respond_to })
            .await
    }

    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RegistryError> {
        self.call(|respond_to| RegistryRequest::Get { id, respond_to })
            .await
    }

    pub async fn session(&self) -> Result<Option<UserId>, RegistryError> {
        self.call(|respond_to| RegistryRequest::Session { respond_to })
            .await
    }

    /// Revision counter, bumped whenever the merged set changes.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.clone()
    }
}
