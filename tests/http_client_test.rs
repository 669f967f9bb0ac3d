use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use storefront_registry::auth::{AuthError, AuthSession};
use storefront_registry::catalog::{
    normalize_all, CatalogApi, CatalogError, CatalogQuery, ProductPayload, SortField, SortOrder,
};
use storefront_registry::http::ApiClient;
use storefront_registry::model::{Credentials, ProductId, UserId, UserProfile};
use storefront_registry::storage::{JsonStore, KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server_uri: &str, store: Arc<MemoryStore>) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(server_uri, Duration::from_secs(5), store).unwrap())
}

#[tokio::test]
async fn test_fetch_products_sends_query_and_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("limit", "2"))
        .and(query_param("skip", "0"))
        .and(query_param("sortBy", "price"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                {"id": 1, "title": "Essence Mascara", "price": "9.99", "stock": 5},
                {"id": 2, "price": 19.99},
                {"title": "no id"}
            ],
            "total": 194,
            "skip": 0,
            "limit": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    let page = api
        .fetch_products(&CatalogQuery::page(2, 0).sorted(SortField::Price, SortOrder::Desc))
        .await
        .unwrap();
    assert_eq!(page.total, Some(194));

    let products = normalize_all(page.products);
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price, 9.99);
    assert_eq!(products[0].stock, 5);
    assert_eq!(products[1].title, "Untitled");
}

#[tokio::test]
async fn test_bare_array_and_slug_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/category/beauty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Essence Mascara", "category": "beauty"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
            "fragrances"
        ])))
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    let page = api.products_by_category("beauty").await.unwrap();
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.total, None);

    let categories = api.categories().await.unwrap();
    assert_eq!(categories[0].name, "Beauty");
    assert_eq!(categories[1].slug, "fragrances");
    assert_eq!(categories[1].name, "fragrances");
}

#[tokio::test]
async fn test_category_slug_is_a_single_encoded_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/category/skin%20care%2Foils%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": [{"id": 1}]})))
        .expect(1)
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    let page = api.products_by_category("skin care/oils?x").await.unwrap();

    assert_eq!(page.products.len(), 1);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_search_passes_query_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/search"))
        .and(query_param("q", "desk lamp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .expect(1)
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    assert!(api.search("desk lamp").await.unwrap().products.is_empty());
}

#[tokio::test]
async fn test_error_status_carries_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Product with id '999' not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    match api.product(&ProductId::from(999u64)).await {
        Err(CatalogError::Status { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Product with id '999' not found");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert!(matches!(
        api.product(&ProductId::from(1u64)).await,
        Err(CatalogError::Decode(_))
    ));
}

#[tokio::test]
async fn test_writes_send_json_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/products/1"))
        .and(body_partial_json(json!({"price": 12.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "title": "Shoe", "price": 12.0})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "isDeleted": true})))
        .expect(1)
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    let payload = ProductPayload {
        price: Some(12.0),
        ..ProductPayload::default()
    };
    let reply = api
        .update_product(&ProductId::from(1u64), &payload)
        .await
        .unwrap();
    assert_eq!(reply.id, Some(ProductId::from(1u64)));
    api.delete_product(&ProductId::from(1u64)).await.unwrap();
}

#[tokio::test]
async fn test_login_stores_access_token_and_authorizes_later_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "emilys", "password": "emilyspass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "emilys",
            "email": "emily.johnson@x.dummyjson.com",
            "firstName": "Emily",
            "lastName": "Johnson",
            "gender": "female",
            "image": "https://dummyjson.com/icon/emilys/128",
            "accessToken": "abc.def",
            "refreshToken": "ghi.jkl"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .and(header("authorization", "Bearer abc.def"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let store = Arc::new(MemoryStore::new());
    let api = client(&server.uri(), store.clone());
    let session = AuthSession::new(api.clone(), store.clone());

    let profile = session
        .login(Credentials::new("emilys", "emilyspass"))
        .await
        .unwrap();

    assert_eq!(profile.display_name(), "Emily Johnson");
    assert_eq!(session.current_identity(), Some(UserId::from(1u64)));
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc.def"));
    let cached: UserProfile = store.load_json(USER_KEY).unwrap().unwrap();
    assert_eq!(cached.username, "emilys");

    api.categories().await.unwrap();
}

#[tokio::test]
async fn test_requests_without_token_are_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let api = client(&server.uri(), Arc::new(MemoryStore::new()));

    api.categories().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid credentials"})))
        .mount(&server)
        .await;
    let store = Arc::new(MemoryStore::new());
    let api = client(&server.uri(), store.clone());
    let session = AuthSession::new(api, store.clone());

    let result = session.login(Credentials::new("emilys", "wrong")).await;

    assert!(matches!(
        result,
        Err(AuthError::Rejected { status: 400, ref message }) if message == "Invalid credentials"
    ));
    assert!(!session.is_authenticated());
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn test_restore_with_expired_token_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid/Expired Token!"})))
        .expect(1)
        .mount(&server)
        .await;
    let store = Arc::new(MemoryStore::new());
    store.set(TOKEN_KEY, "stale").unwrap();
    store
        .save_json(USER_KEY, &UserProfile::new(1u64, "emilys"))
        .unwrap();
    let session = AuthSession::new(client(&server.uri(), store.clone()), store.clone());

    assert_eq!(session.restore().await.unwrap(), None);
    assert_eq!(session.current_identity(), None);
    assert!(store.get(TOKEN_KEY).unwrap().is_none());
    assert!(store.get(USER_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_restore_without_network_keeps_cached_profile() {
    // An address nobody listens on any more.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let store = Arc::new(MemoryStore::new());
    store.set(TOKEN_KEY, "abc.def").unwrap();
    store
        .save_json(USER_KEY, &UserProfile::new(1u64, "emilys"))
        .unwrap();
    let api = client(&uri, store.clone());
    let session = AuthSession::new(api.clone(), store.clone());

    let profile = session.restore().await.unwrap().expect("cached profile");

    assert_eq!(profile.username, "emilys");
    assert!(session.is_authenticated());
    assert!(matches!(api.categories().await, Err(CatalogError::Transport(_))));
}
