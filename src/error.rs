use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Local rejections raised before any request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a name")]
    MissingName,
    #[error("please choose both a start and an end date")]
    MissingDates,
    #[error("please fill in every destination field")]
    MissingDestinationFields,
    #[error("the selected dates are not valid")]
    InvalidDate,
    #[error("the end date must not be before the start date")]
    EndBeforeStart,
    #[error("the trip must start today or later")]
    StartInPast,
    #[error("destination dates must fall within the trip ({trip_start} to {trip_end})")]
    OutsideTrip { trip_start: String, trip_end: String },
    #[error("the selected dates overlap another destination")]
    Overlap,
    #[error("save the trip before changing it")]
    TripNotSaved,
    #[error("destination {0} is not part of this trip")]
    UnknownDestination(i64),
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("the password needs at least {0} characters")]
    PasswordTooShort(usize),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
}

impl AppError {
    /// Message worth showing back to the user on the page they came from.
    pub fn notice(&self) -> Option<String> {
        match self {
            AppError::Validation(err) => Some(err.to_string()),
            AppError::Backend { status, message } => {
                Some(format!("code: {status}, message: {message}"))
            }
            AppError::NotFound => Some("the requested item no longer exists".into()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized => return Redirect::to("/auth/login").into_response(),
            AppError::Config(_) | AppError::Io(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Http(_) | AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, self.to_string()).into_response()
    }
}
