pub mod countries;
pub mod identity;
pub mod trips;

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;

pub fn http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

/// Decodes a successful body or classifies the failure.
pub(crate) async fn read_json<T>(response: Response) -> Result<T, AppError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    Err(rejection(status, response).await)
}

async fn rejection(status: StatusCode, response: Response) -> AppError {
    let url = response.url().clone();
    match status {
        StatusCode::UNAUTHORIZED => {
            warn!("backend refused credentials for {url}");
            AppError::Unauthorized
        }
        StatusCode::NOT_FOUND => AppError::NotFound,
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = detail_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            warn!("backend error {status} for {url}: {message}");
            AppError::Backend {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("message"))? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
