use std::sync::Arc;

use reqwest::Client;
use tracing::info;
use url::Url;

use super::read_json;
use crate::{
    error::AppError,
    models::{
        session::SessionContext,
        user::{AuthResponse, LoginCredentials, RegisterCredentials, User},
    },
};

/// Client for the external credential service.
#[derive(Clone)]
pub struct IdentityService {
    client: Client,
    base: Arc<Url>,
}

impl IdentityService {
    pub fn new(client: Client, base: Url) -> Self {
        Self {
            client,
            base: Arc::new(base),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base
            .join(path)
            .map_err(|err| AppError::Config(format!("cannot build endpoint {path}: {err}")))
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<SessionContext, AppError> {
        let url = self.endpoint("auth/login")?;
        let response = self.client.post(url).json(credentials).send().await?;
        let auth: AuthResponse = read_json(response).await?;
        info!(email = %auth.user.email, "signed in");
        Ok(auth.into())
    }

    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<User, AppError> {
        let url = self.endpoint("auth/register")?;
        let response = self.client.post(url).json(credentials).send().await?;
        let user: User = read_json(response).await?;
        info!(email = %user.email, "registered");
        Ok(user)
    }
}
