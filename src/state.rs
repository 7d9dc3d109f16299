use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    services::{countries::CountryService, identity::IdentityService, trips::TripBackend},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub trips: Arc<dyn TripBackend>,
    pub identity: IdentityService,
    pub countries: CountryService,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        trips: Arc<dyn TripBackend>,
        identity: IdentityService,
        countries: CountryService,
    ) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            trips,
            identity,
            countries,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
