//! # Test Doubles
//!
//! Expectation-driven stand-ins for the remote API, so the registry and session can be
//! exercised without a network.
//!
//! ## MockCatalog
//!
//! Expectations are queued per operation and consumed in order. Background work in the
//! registry (load-triggered refreshes, create mirroring) interleaves freely with foreground
//! calls, so queues are keyed by operation rather than kept in one global order.
//!
//! ```ignore
//! let catalog = MockCatalog::new();
//! catalog.expect_fetch().return_ok(ProductPage::new(vec![RemoteProduct::new(1u64, "Shoe")]));
//! catalog.expect_search("shoe").return_err(CatalogError::Unavailable("down".into()));
//!
//! // ... drive the registry ...
//!
//! catalog.verify(); // every expectation consumed, no argument mismatches
//! ```
//!
//! A call with no queued expectation answers [`CatalogError::Unavailable`], which is how
//! the registry sees an offline catalog.
//!
//! ### Holding a reply back
//!
//! [`after`](PageExpectation::after) parks the reply until a oneshot fires. This is how
//! tests let a session switch overtake an in-flight refresh:
//!
//! ```ignore
//! let (release, gate) = oneshot::channel();
//! catalog.expect_fetch().after(gate).return_ok(page);
//! // ... switch session ...
//! release.send(()).unwrap();
//! ```

use crate::auth::{AuthApi, AuthError, LoginResponse};
use crate::catalog::{
    CatalogApi, CatalogError, CatalogQuery, Category, ProductPage, ProductPayload, RemoteProduct,
};
use crate::model::{Credentials, ProductId, UserProfile};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{oneshot, Notify};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// CATALOG
// =============================================================================

/// Operation kinds of [`CatalogApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    Fetch,
    Product,
    Categories,
    ByCategory,
    Search,
    Add,
    Update,
    Delete,
}

/// A recorded call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCall {
    Fetch(CatalogQuery),
    Product(ProductId),
    Categories,
    ByCategory(String),
    Search(String),
    Add(ProductPayload),
    Update(ProductId, ProductPayload),
    Delete(ProductId),
}

impl CatalogCall {
    pub fn op(&self) -> CatalogOp {
        match self {
            CatalogCall::Fetch(_) => CatalogOp::Fetch,
            CatalogCall::Product(_) => CatalogOp::Product,
            CatalogCall::Categories => CatalogOp::Categories,
            CatalogCall::ByCategory(_) => CatalogOp::ByCategory,
            CatalogCall::Search(_) => CatalogOp::Search,
            CatalogCall::Add(_) => CatalogOp::Add,
            CatalogCall::Update(..) => CatalogOp::Update,
            CatalogCall::Delete(_) => CatalogOp::Delete,
        }
    }

    /// The key argument an expectation can pin (id, slug or search text).
    fn key(&self) -> Option<String> {
        match self {
            CatalogCall::Product(id) | CatalogCall::Update(id, _) | CatalogCall::Delete(id) => {
                Some(id.to_string())
            }
            CatalogCall::ByCategory(s) | CatalogCall::Search(s) => Some(s.clone()),
            CatalogCall::Fetch(_) | CatalogCall::Categories | CatalogCall::Add(_) => None,
        }
    }
}

enum Reply {
    Page(Result<ProductPage, CatalogError>),
    Product(Result<RemoteProduct, CatalogError>),
    Categories(Result<Vec<Category>, CatalogError>),
    Unit(Result<(), CatalogError>),
}

struct Expectation {
    key: Option<String>,
    gate: Option<oneshot::Receiver<()>>,
    reply: Reply,
}

#[derive(Default)]
struct CatalogState {
    expectations: Mutex<HashMap<CatalogOp, VecDeque<Expectation>>>,
    calls: Mutex<Vec<CatalogCall>>,
    mismatches: Mutex<Vec<String>>,
    notify: Notify,
}

/// Scriptable [`CatalogApi`].
#[derive(Clone, Default)]
pub struct MockCatalog {
    state: Arc<CatalogState>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self, op: CatalogOp, key: Option<String>) -> Pending {
        Pending {
            state: self.state.clone(),
            op,
            key,
            gate: None,
        }
    }

    /// Expects `GET /products`.
    pub fn expect_fetch(&self) -> PageExpectation {
        PageExpectation(self.pending(CatalogOp::Fetch, None))
    }

    /// Expects `GET /products/search?q={query}`.
    pub fn expect_search(&self, query: &str) -> PageExpectation {
        PageExpectation(self.pending(CatalogOp::Search, Some(query.to_string())))
    }

    /// Expects `GET /products/category/{slug}`.
    pub fn expect_products_by_category(&self, slug: &str) -> PageExpectation {
        PageExpectation(self.pending(CatalogOp::ByCategory, Some(slug.to_string())))
    }

    pub fn expect_product(&self, id: impl Into<ProductId>) -> ProductExpectation {
        ProductExpectation(self.pending(CatalogOp::Product, Some(id.into().to_string())))
    }

    pub fn expect_categories(&self) -> CategoriesExpectation {
        CategoriesExpectation(self.pending(CatalogOp::Categories, None))
    }

    pub fn expect_add(&self) -> ProductExpectation {
        ProductExpectation(self.pending(CatalogOp::Add, None))
    }

    pub fn expect_update(&self, id: impl Into<ProductId>) -> ProductExpectation {
        ProductExpectation(self.pending(CatalogOp::Update, Some(id.into().to_string())))
    }

    pub fn expect_delete(&self, id: impl Into<ProductId>) -> UnitExpectation {
        UnitExpectation(self.pending(CatalogOp::Delete, Some(id.into().to_string())))
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<CatalogCall> {
        lock(&self.state.calls).clone()
    }

    pub fn call_count(&self, op: CatalogOp) -> usize {
        lock(&self.state.calls).iter().filter(|c| c.op() == op).count()
    }

    /// Resolves once `op` has been called at least `n` times.
    pub async fn wait_for(&self, op: CatalogOp, n: usize) {
        loop {
            let notified = self.state.notify.notified();
            if self.call_count(op) >= n {
                return;
            }
            notified.await;
        }
    }

    /// Panics if an expectation is left over or a call did not match its expectation.
    pub fn verify(&self) {
        let mismatches = lock(&self.state.mismatches);
        if !mismatches.is_empty() {
            panic!("Catalog calls did not match expectations: {:?}", *mismatches);
        }
        let remaining: usize = lock(&self.state.expectations).values().map(VecDeque::len).sum();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    async fn answer(&self, call: CatalogCall) -> Option<Reply> {
        let op = call.op();
        let key = call.key();
        // Consume before recording, so a waiter woken by `wait_for` sees the queue updated.
        let expectation = lock(&self.state.expectations)
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        lock(&self.state.calls).push(call);
        self.state.notify.notify_waiters();

        let expectation = expectation?;
        if expectation.key.is_some() && expectation.key != key {
            lock(&self.state.mismatches).push(format!(
                "{op:?}: expected {:?}, got {:?}",
                expectation.key, key
            ));
            return None;
        }
        if let Some(gate) = expectation.gate {
            let _ = gate.await;
        }
        Some(expectation.reply)
    }
}

fn offline() -> CatalogError {
    CatalogError::Unavailable("no expectation set".to_string())
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn fetch_products(&self, query: &CatalogQuery) -> Result<ProductPage, CatalogError> {
        match self.answer(CatalogCall::Fetch(query.clone())).await {
            Some(Reply::Page(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn product(&self, id: &ProductId) -> Result<RemoteProduct, CatalogError> {
        match self.answer(CatalogCall::Product(id.clone())).await {
            Some(Reply::Product(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        match self.answer(CatalogCall::Categories).await {
            Some(Reply::Categories(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn products_by_category(&self, slug: &str) -> Result<ProductPage, CatalogError> {
        match self.answer(CatalogCall::ByCategory(slug.to_string())).await {
            Some(Reply::Page(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn search(&self, query: &str) -> Result<ProductPage, CatalogError> {
        match self.answer(CatalogCall::Search(query.to_string())).await {
            Some(Reply::Page(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn add_product(&self, payload: &ProductPayload) -> Result<RemoteProduct, CatalogError> {
        match self.answer(CatalogCall::Add(payload.clone())).await {
            Some(Reply::Product(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, CatalogError> {
        match self
            .answer(CatalogCall::Update(id.clone(), payload.clone()))
            .await
        {
            Some(Reply::Product(result)) => result,
            _ => Err(offline()),
        }
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        match self.answer(CatalogCall::Delete(id.clone())).await {
            Some(Reply::Unit(result)) => result,
            _ => Err(offline()),
        }
    }
}

// =============================================================================
// EXPECTATION BUILDERS
// =============================================================================

struct Pending {
    state: Arc<CatalogState>,
    op: CatalogOp,
    key: Option<String>,
    gate: Option<oneshot::Receiver<()>>,
}

impl Pending {
    fn push(self, reply: Reply) {
        lock(&self.state.expectations)
            .entry(self.op)
            .or_default()
            .push_back(Expectation {
                key: self.key,
                gate: self.gate,
                reply,
            });
    }
}

/// Builder for operations answering a [`ProductPage`].
pub struct PageExpectation(Pending);

impl PageExpectation {
    /// Holds the reply until `gate` fires (or its sender is dropped).
    pub fn after(mut self, gate: oneshot::Receiver<()>) -> Self {
        self.0.gate = Some(gate);
        self
    }

    pub fn return_ok(self, page: ProductPage) {
        self.0.push(Reply::Page(Ok(page)));
    }

    pub fn return_err(self, error: CatalogError) {
        self.0.push(Reply::Page(Err(error)));
    }
}

/// Builder for operations answering a single [`RemoteProduct`].
pub struct ProductExpectation(Pending);

impl ProductExpectation {
    pub fn after(mut self, gate: oneshot::Receiver<()>) -> Self {
        self.0.gate = Some(gate);
        self
    }

    pub fn return_ok(self, product: RemoteProduct) {
        self.0.push(Reply::Product(Ok(product)));
    }

    pub fn return_err(self, error: CatalogError) {
        self.0.push(Reply::Product(Err(error)));
    }
}

pub struct CategoriesExpectation(Pending);

impl CategoriesExpectation {
    pub fn return_ok(self, categories: Vec<Category>) {
        self.0.push(Reply::Categories(Ok(categories)));
    }

    pub fn return_err(self, error: CatalogError) {
        self.0.push(Reply::Categories(Err(error)));
    }
}

pub struct UnitExpectation(Pending);

impl UnitExpectation {
    pub fn return_ok(self) {
        self.0.push(Reply::Unit(Ok(())));
    }

    pub fn return_err(self, error: CatalogError) {
        self.0.push(Reply::Unit(Err(error)));
    }
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Default)]
struct AuthState {
    users: Mutex<Vec<(Credentials, UserProfile)>>,
    signed_in: Mutex<Option<UserProfile>>,
}

/// In-memory [`AuthApi`] with a fixed set of accounts.
///
/// A successful login issues `token-<user id>`; `me` answers for the last user that
/// logged in through this instance.
#[derive(Clone, Default)]
pub struct MockAuth {
    state: Arc<AuthState>,
    offline: bool,
}

impl MockAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the API were unreachable.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn with_user(self, username: &str, password: &str, profile: UserProfile) -> Self {
        lock(&self.state.users).push((Credentials::new(username, password), profile));
        self
    }

    fn unreachable(&self) -> Result<(), AuthError> {
        if self.offline {
            Err(AuthError::Unavailable("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthApi for MockAuth {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        self.unreachable()?;
        let profile = lock(&self.state.users)
            .iter()
            .find(|(known, _)| {
                known.username == credentials.username && known.password == credentials.password
            })
            .map(|(_, profile)| profile.clone())
            .ok_or_else(|| AuthError::Rejected {
                status: 400,
                message: "Invalid credentials".to_string(),
            })?;
        *lock(&self.state.signed_in) = Some(profile.clone());
        Ok(LoginResponse {
            token: format!("token-{}", profile.id),
            profile,
        })
    }

    async fn me(&self) -> Result<UserProfile, AuthError> {
        self.unreachable()?;
        lock(&self.state.signed_in)
            .clone()
            .ok_or_else(|| AuthError::Rejected {
                status: 401,
                message: "Invalid/Expired Token!".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_catalog_with_expectations() {
        let mock = MockCatalog::new();
        mock.expect_fetch()
            .return_ok(ProductPage::new(vec![RemoteProduct::new(1u64, "Shoe")]));
        mock.expect_delete(1u64).return_ok();

        let page = mock.fetch_products(&CatalogQuery::default()).await.unwrap();
        assert_eq!(page.products.len(), 1);
        mock.delete_product(&ProductId::from(1u64)).await.unwrap();

        mock.verify();
        assert_eq!(mock.call_count(CatalogOp::Fetch), 1);
    }

    #[tokio::test]
    async fn test_unscripted_call_is_offline() {
        let mock = MockCatalog::new();
        let err = mock.search("x").await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "did not match")]
    async fn test_argument_mismatch_fails_verify() {
        let mock = MockCatalog::new();
        mock.expect_search("shoe").return_ok(ProductPage::default());
        let _ = mock.search("hat").await;
        mock.verify();
    }

    #[tokio::test]
    async fn test_gated_reply_waits_for_release() {
        let mock = MockCatalog::new();
        let (release, gate) = oneshot::channel();
        mock.expect_fetch().after(gate).return_ok(ProductPage::default());

        let caller = mock.clone();
        let task = tokio::spawn(async move { caller.fetch_products(&CatalogQuery::default()).await });
        mock.wait_for(CatalogOp::Fetch, 1).await;
        assert!(!task.is_finished());

        release.send(()).unwrap();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_mock_auth() {
        let auth = MockAuth::new().with_user("emilys", "emilyspass", UserProfile::new(1u64, "emilys"));
        assert!(auth.me().await.is_err());

        let response = auth.login(&Credentials::new("emilys", "emilyspass")).await.unwrap();
        assert_eq!(response.token, "token-1");
        assert_eq!(auth.me().await.unwrap().username, "emilys");
    }
}
