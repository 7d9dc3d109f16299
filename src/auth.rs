use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{
    cookie::{Cookie, Key, SameSite},
    CookieJar, PrivateCookieJar,
};
use tracing::{debug, warn};

use crate::{
    error::{AppError, ValidationError},
    models::{
        session::SessionContext,
        settings::Theme,
        user::{LoginCredentials, RegisterCredentials},
    },
    services::identity::IdentityService,
};

pub const SESSION_COOKIE: &str = "trip_session";
pub const THEME_COOKIE: &str = "trip_theme";
pub const MIN_PASSWORD_LEN: usize = 6;

/// The session stored in the encrypted cookie, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<SessionContext>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        Ok(Self(session_from_jar(&jar)))
    }
}

impl CurrentSession {
    pub fn require_session(&self) -> Result<&SessionContext, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

fn session_from_jar(jar: &PrivateCookieJar) -> Option<SessionContext> {
    let cookie = jar.get(SESSION_COOKIE)?;
    match serde_json::from_str(cookie.value()) {
        Ok(session) => Some(session),
        Err(err) => {
            warn!("discarding unreadable session cookie: {err}");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTheme(pub Theme);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTheme
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        let theme = jar
            .get(THEME_COOKIE)
            .map(|cookie| Theme::parse(cookie.value()))
            .unwrap_or_default();
        Ok(Self(theme))
    }
}

pub fn apply_session_cookie(
    jar: PrivateCookieJar,
    session: &SessionContext,
) -> Result<PrivateCookieJar, AppError> {
    let value = serde_json::to_string(session).map_err(anyhow::Error::from)?;
    let cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok(jar.add(cookie))
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn apply_theme_cookie(jar: CookieJar, theme: Theme) -> CookieJar {
    let cookie = Cookie::build((THEME_COOKIE, theme.as_str()))
        .path("/")
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

pub fn validate_login(credentials: &LoginCredentials) -> Result<(), ValidationError> {
    if !credentials.email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

pub fn validate_registration(credentials: &RegisterCredentials) -> Result<(), ValidationError> {
    if credentials.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    validate_login(&credentials.login())
}

pub async fn sign_in(
    identity: &IdentityService,
    credentials: &LoginCredentials,
) -> Result<SessionContext, AppError> {
    if let Err(err) = validate_login(credentials) {
        debug!(email = %credentials.email, "rejected sign-in form: {err}");
        return Err(err.into());
    }
    identity.login(credentials).await
}

/// Registers the account and signs straight into it.
pub async fn register_and_sign_in(
    identity: &IdentityService,
    credentials: &RegisterCredentials,
) -> Result<SessionContext, AppError> {
    if let Err(err) = validate_registration(credentials) {
        debug!(email = %credentials.email, "rejected registration form: {err}");
        return Err(err.into());
    }
    identity.register(credentials).await?;
    identity.login(&credentials.login()).await
}
