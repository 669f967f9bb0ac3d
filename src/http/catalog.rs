use super::{ApiClient, ApiFailure};
use crate::catalog::{
    CatalogApi, CatalogError, CatalogQuery, Category, ProductPage, ProductPayload, RemoteProduct,
};
use crate::model::ProductId;
use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

impl From<ApiFailure> for CatalogError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Transport(e) => CatalogError::Transport(e),
            ApiFailure::Status { status, message } => CatalogError::Status { status, message },
            ApiFailure::Decode(message) => CatalogError::Decode(message),
        }
    }
}

#[async_trait]
impl CatalogApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self, query: &CatalogQuery) -> Result<ProductPage, CatalogError> {
        let builder = self
            .request(Method::GET, "/products")
            .query(&query.to_pairs());
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self, id), fields(%id))]
    async fn product(&self, id: &ProductId) -> Result<RemoteProduct, CatalogError> {
        let builder = self.request_at(Method::GET, &["products", id.as_str()]);
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let builder = self.request(Method::GET, "/products/categories");
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self))]
    async fn products_by_category(&self, slug: &str) -> Result<ProductPage, CatalogError> {
        let builder = self.request_at(Method::GET, &["products", "category", slug]);
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<ProductPage, CatalogError> {
        let builder = self
            .request(Method::GET, "/products/search")
            .query(&[("q", query)]);
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self, payload))]
    async fn add_product(&self, payload: &ProductPayload) -> Result<RemoteProduct, CatalogError> {
        let builder = self.request(Method::POST, "/products/add").json(payload);
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self, id, payload), fields(%id))]
    async fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, CatalogError> {
        let builder = self
            .request_at(Method::PUT, &["products", id.as_str()])
            .json(payload);
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self, id), fields(%id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let builder = self.request_at(Method::DELETE, &["products", id.as_str()]);
        Ok(self.send_empty(builder).await?)
    }
}
