use super::RegistryError;
use crate::catalog::CatalogQuery;
use crate::model::{Product, ProductDraft, ProductId, ProductPatch, UserId};
use tokio::sync::oneshot;

/// One-shot reply channel carried by every request.
pub type Response<T> = oneshot::Sender<Result<T, RegistryError>>;

/// Requests processed by the registry actor, one at a time.
#[derive(Debug)]
pub(crate) enum RegistryRequest {
    /// Swap to the partition of `identity`. Replies with the number of records read.
    Load {
        identity: Option<UserId>,
        respond_to: Response<usize>,
    },
    /// Replies with the size of the new remote subset.
    Refresh {
        query: CatalogQuery,
        respond_to: Response<usize>,
    },
    /// Posted by a finished refresh task back into the mailbox.
    ApplyRemote {
        epoch: u64,
        products: Vec<Product>,
        respond_to: Option<Response<usize>>,
    },
    Search {
        query: String,
        respond_to: Response<Vec<Product>>,
    },
    List {
        respond_to: Response<Vec<Product>>,
    },
    Local {
        respond_to: Response<Vec<Product>>,
    },
    Get {
        id: ProductId,
        respond_to: Response<Option<Product>>,
    },
    Session {
        respond_to: Response<Option<UserId>>,
    },
    Create {
        draft: ProductDraft,
        respond_to: Response<Product>,
    },
    Update {
        id: ProductId,
        patch: ProductPatch,
        respond_to: Response<Product>,
    },
    Delete {
        id: ProductId,
        respond_to: Response<()>,
    },
}
