use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;
use url::Url;

use super::read_json;
use crate::{
    error::{AppError, ValidationError},
    models::{
        session::SessionContext,
        trip::{Destination, Trip},
    },
};

/// Everything the planner needs from the service that stores trips.
#[async_trait]
pub trait TripBackend: Send + Sync {
    async fn list_trips(&self, session: &SessionContext) -> Result<Vec<Trip>, AppError>;

    async fn get_trip(&self, session: &SessionContext, trip_id: i64) -> Result<Trip, AppError>;

    async fn create_trip(&self, session: &SessionContext, trip: &Trip) -> Result<Trip, AppError>;

    async fn update_trip(&self, session: &SessionContext, trip: &Trip) -> Result<Trip, AppError>;

    async fn delete_trip(&self, session: &SessionContext, trip_id: i64) -> Result<Trip, AppError>;

    async fn list_destinations(
        &self,
        session: &SessionContext,
        trip_id: i64,
    ) -> Result<Vec<Destination>, AppError>;

    async fn add_destination(
        &self,
        session: &SessionContext,
        destination: &Destination,
    ) -> Result<Destination, AppError>;

    async fn update_destination(
        &self,
        session: &SessionContext,
        destination_id: i64,
        destination: &Destination,
    ) -> Result<Destination, AppError>;

    async fn delete_destination(
        &self,
        session: &SessionContext,
        destination_id: i64,
    ) -> Result<Destination, AppError>;
}

/// REST client for the trip backend.
#[derive(Clone)]
pub struct TripService {
    client: Client,
    base: Arc<Url>,
}

impl TripService {
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

    fn authorized(&self, request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        request.bearer_auth(&session.token)
    }
}

#[async_trait]
impl TripBackend for TripService {
    async fn list_trips(&self, session: &SessionContext) -> Result<Vec<Trip>, AppError> {
        let url = self.endpoint("api/trips/")?;
        let response = self.authorized(self.client.get(url), session).send().await?;
        read_json(response).await
    }

    async fn get_trip(&self, session: &SessionContext, trip_id: i64) -> Result<Trip, AppError> {
        let url = self.endpoint(&format!("api/trips/{trip_id}"))?;
        let response = self.authorized(self.client.get(url), session).send().await?;
        read_json(response).await
    }

    async fn create_trip(&self, session: &SessionContext, trip: &Trip) -> Result<Trip, AppError> {
        let url = self.endpoint("api/trips/")?;
        let payload = trip.to_server();
        debug!(name = %payload.name, "creating trip");
        let response = self
            .authorized(self.client.post(url), session)
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_trip(&self, session: &SessionContext, trip: &Trip) -> Result<Trip, AppError> {
        let trip_id = trip.id.ok_or(ValidationError::TripNotSaved)?;
        let url = self.endpoint(&format!("api/trips/{trip_id}"))?;
        let payload = trip.to_server();
        debug!(trip_id, "updating trip");
        let response = self
            .authorized(self.client.put(url), session)
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_trip(&self, session: &SessionContext, trip_id: i64) -> Result<Trip, AppError> {
        let url = self.endpoint(&format!("api/trips/{trip_id}"))?;
        let response = self
            .authorized(self.client.delete(url), session)
            .send()
            .await?;
        read_json(response).await
    }

    async fn list_destinations(
        &self,
        session: &SessionContext,
        trip_id: i64,
    ) -> Result<Vec<Destination>, AppError> {
        let url = self.endpoint(&format!("api/trips/{trip_id}/destinations/"))?;
        let response = self.authorized(self.client.get(url), session).send().await?;
        read_json(response).await
    }

    async fn add_destination(
        &self,
        session: &SessionContext,
        destination: &Destination,
    ) -> Result<Destination, AppError> {
        if destination.trip_id == 0 {
            return Err(ValidationError::TripNotSaved.into());
        }
        let url = self.endpoint(&format!(
            "api/trips/{}/destinations/",
            destination.trip_id
        ))?;
        let payload = destination.to_server();
        debug!(trip_id = payload.trip_id, name = %payload.name, "adding destination");
        let response = self
            .authorized(self.client.post(url), session)
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_destination(
        &self,
        session: &SessionContext,
        destination_id: i64,
        destination: &Destination,
    ) -> Result<Destination, AppError> {
        let url = self.endpoint(&format!("api/destinations/{destination_id}"))?;
        let payload = destination.to_server();
        debug!(destination_id, "updating destination");
        let response = self
            .authorized(self.client.put(url), session)
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_destination(
        &self,
        session: &SessionContext,
        destination_id: i64,
    ) -> Result<Destination, AppError> {
        let url = self.endpoint(&format!("api/destinations/{destination_id}"))?;
        let response = self
            .authorized(self.client.delete(url), session)
            .send()
            .await?;
        read_json(response).await
    }
}
