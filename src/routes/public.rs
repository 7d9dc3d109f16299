use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use serde::Deserialize;

use super::local_path;
use crate::{
    auth::{self, CurrentSession, CurrentTheme},
    error::AppError,
    models::user::{LoginCredentials, RegisterCredentials},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/auth/login", get(login_form).post(login_submit))
        .route("/auth/register", get(register_form).post(register_submit))
        .route("/auth/logout", post(logout))
        .route("/theme", post(toggle_theme))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    theme: String,
    here: String,
    logged_in: bool,
    user_name: String,
}

async fn landing(current: CurrentSession, CurrentTheme(theme): CurrentTheme) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LandingTemplate {
        theme: theme.to_string(),
        here: "/".into(),
        logged_in: current.0.is_some(),
        user_name: current
            .0
            .as_ref()
            .map(|session| session.user.display_name().to_string())
            .unwrap_or_default(),
    })
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    theme: String,
    here: String,
    logged_in: bool,
    show_error: bool,
    error_message: String,
    email: String,
}

async fn login_form(CurrentTheme(theme): CurrentTheme) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LoginTemplate {
        theme: theme.to_string(),
        here: "/auth/login".into(),
        logged_in: false,
        show_error: false,
        error_message: String::new(),
        email: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

async fn login_submit(
    State(state): State<AppState>,
    CurrentTheme(theme): CurrentTheme,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = LoginCredentials {
        email: form.email.trim().to_string(),
        password: form.password,
    };

    match auth::sign_in(&state.identity, &credentials).await {
        Ok(session) => Ok((
            auth::apply_session_cookie(jar, &session)?,
            Redirect::to("/dashboard"),
        )
            .into_response()),
        Err(AppError::Unauthorized) => Ok(render_login_error(
            theme.to_string(),
            credentials.email,
            "Sign-in failed, please check your email and password.".into(),
        )),
        Err(err) => match err.notice() {
            Some(message) => Ok(render_login_error(theme.to_string(), credentials.email, message)),
            None => Err(err),
        },
    }
}

fn render_login_error(theme: String, email: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(LoginTemplate {
            theme,
            here: "/auth/login".into(),
            logged_in: false,
            show_error: true,
            error_message: message,
            email,
        }),
    )
        .into_response()
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    theme: String,
    here: String,
    logged_in: bool,
    show_error: bool,
    error_message: String,
    name: String,
    email: String,
}

async fn register_form(CurrentTheme(theme): CurrentTheme) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(RegisterTemplate {
        theme: theme.to_string(),
        here: "/auth/register".into(),
        logged_in: false,
        show_error: false,
        error_message: String::new(),
        name: String::new(),
        email: String::new(),
    })
}

#[derive(Deserialize)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
    password_confirm: String,
}

async fn register_submit(
    State(state): State<AppState>,
    CurrentTheme(theme): CurrentTheme,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(render_register_error(
            theme.to_string(),
            form.name,
            form.email,
            "The passwords do not match.".into(),
        ));
    }

    let credentials = RegisterCredentials {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password,
    };

    match auth::register_and_sign_in(&state.identity, &credentials).await {
        Ok(session) => Ok((
            auth::apply_session_cookie(jar, &session)?,
            Redirect::to("/dashboard"),
        )
            .into_response()),
        Err(err) => match err.notice() {
            Some(message) => Ok(render_register_error(
                theme.to_string(),
                credentials.name,
                credentials.email,
                message,
            )),
            None => Err(err),
        },
    }
}

fn render_register_error(theme: String, name: String, email: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(RegisterTemplate {
            theme,
            here: "/auth/register".into(),
            logged_in: false,
            show_error: true,
            error_message: message,
            name,
            email,
        }),
    )
        .into_response()
}

async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    (auth::clear_session_cookie(jar), Redirect::to("/"))
}

#[derive(Deserialize)]
struct ThemeForm {
    back: Option<String>,
}

async fn toggle_theme(
    CurrentTheme(theme): CurrentTheme,
    jar: CookieJar,
    Form(form): Form<ThemeForm>,
) -> (CookieJar, Redirect) {
    let back = local_path(form.back.as_deref()).to_string();
    (
        auth::apply_theme_cookie(jar, theme.toggled()),
        Redirect::to(&back),
    )
}
