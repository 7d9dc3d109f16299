use serde::{Deserialize, Serialize};

use super::user::{AuthResponse, User};

/// The signed-in user and the bearer token issued for them.
///
/// Created at sign-in, dropped at sign-out, and handed to every call that
/// needs to act on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user: User,
    pub token: String,
}

impl SessionContext {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.id
    }
}

impl From<AuthResponse> for SessionContext {
    fn from(response: AuthResponse) -> Self {
        Self::new(response.user, response.access_token)
    }
}
