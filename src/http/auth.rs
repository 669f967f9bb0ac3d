use super::{ApiClient, ApiFailure};
use crate::auth::{AuthApi, AuthError, LoginResponse};
use crate::model::{Credentials, UserProfile};
use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

impl From<ApiFailure> for AuthError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Transport(e) => AuthError::Transport(e),
            ApiFailure::Status { status, message } => AuthError::Rejected { status, message },
            ApiFailure::Decode(message) => AuthError::Decode(message),
        }
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let builder = self.request(Method::POST, "/auth/login").json(credentials);
        Ok(self.send_json(builder).await?)
    }

    #[instrument(skip(self))]
    async fn me(&self) -> Result<UserProfile, AuthError> {
        let builder = self.request(Method::GET, "/auth/me");
        Ok(self.send_json(builder).await?)
    }
}
