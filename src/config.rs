use std::{env, net::SocketAddr, time::Duration};

use url::Url;

use crate::error::AppError;

pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all?fields=name,flags";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub api_base_url: Url,
    pub countries_url: Url,
    pub cookie_secret: String,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let api_base_url = parse_base_url(
            "API_BASE_URL",
            &env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
        )?;

        let countries_url = env::var("COUNTRIES_URL")
            .unwrap_or_else(|_| DEFAULT_COUNTRIES_URL.to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid COUNTRIES_URL: {err}")))?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-trip-planner-cookie-secret".to_string());

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|err| {
                AppError::Config(format!("invalid HTTP_TIMEOUT_SECS: {err}"))
            })?),
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            listen_addr,
            api_base_url,
            countries_url,
            cookie_secret,
            http_timeout,
        })
    }
}

/// Base URLs get a trailing slash so relative endpoint paths join under them.
pub fn parse_base_url(name: &str, raw: &str) -> Result<Url, AppError> {
    let mut url: Url = raw
        .parse()
        .map_err(|err| AppError::Config(format!("invalid {name}: {err}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
