//! Editing state for one trip and its destinations.
//!
//! The planner validates every create or update locally and only talks to the
//! backend once the dates check out.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::{
    dates::{self, DateValue},
    error::{AppError, ValidationError},
    models::{
        session::SessionContext,
        trip::{Destination, Trip},
    },
    services::trips::TripBackend,
};

#[derive(Debug, Clone, PartialEq)]
struct TripSnapshot {
    name: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl TripSnapshot {
    fn of(trip: &Trip) -> Self {
        Self {
            name: trip.name.trim().to_string(),
            start: trip.start(),
            end: trip.end(),
        }
    }
}

pub struct TripPlanner<'a, B: TripBackend + ?Sized> {
    backend: &'a B,
    session: &'a SessionContext,
    today: NaiveDate,
    trip: Trip,
    snapshot: Option<TripSnapshot>,
    changed: bool,
}

impl<'a, B: TripBackend + ?Sized> TripPlanner<'a, B> {
    pub fn new(backend: &'a B, session: &'a SessionContext) -> Self {
        Self {
            backend,
            session,
            today: Local::now().date_naive(),
            trip: Trip::default(),
            snapshot: None,
            changed: false,
        }
    }

    /// Pins the day used for the "trip starts today or later" rule.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn is_editing(&self) -> bool {
        self.trip.id.is_some()
    }

    pub fn set_trip_fields(
        &mut self,
        name: impl Into<String>,
        start_date: Option<DateValue>,
        end_date: Option<DateValue>,
    ) {
        self.trip.name = name.into();
        self.trip.start_date = start_date;
        self.trip.end_date = end_date;
        self.trip.recompute_total_days();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match &self.snapshot {
            Some(snapshot) => self.changed || *snapshot != TripSnapshot::of(&self.trip),
            None => false,
        }
    }

    /// Trip days not yet assigned to a destination.
    pub fn remaining_days(&self) -> i64 {
        let used: i64 = self
            .trip
            .destinations
            .iter()
            .map(|dest| {
                if dest.days != 0 {
                    dest.days
                } else {
                    dest.span_days()
                }
            })
            .sum();
        self.trip.total_days - used
    }

    pub fn reset(&mut self) {
        self.trip = Trip::default();
        self.snapshot = None;
        self.changed = false;
    }

    pub async fn load(&mut self, trip_id: i64) -> Result<&Trip, AppError> {
        let mut trip = self.backend.get_trip(self.session, trip_id).await?;
        if trip.destinations.is_empty() {
            trip.destinations = self.backend.list_destinations(self.session, trip_id).await?;
        }
        trip.recompute_total_days();
        self.adopt(trip);
        Ok(&self.trip)
    }

    pub async fn create_trip(&mut self) -> Result<&Trip, AppError> {
        if self.trip.name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        let (start, _) = checked_range(self.trip.start_date.as_ref(), self.trip.end_date.as_ref())?;
        if !dates::is_on_or_after(Some(&DateValue::Date(start)), self.today) {
            debug!(%start, today = %self.today, "rejecting trip starting in the past");
            return Err(ValidationError::StartInPast.into());
        }

        self.trip.recompute_total_days();
        let mut created = self.backend.create_trip(self.session, &self.trip).await?;
        created.recompute_total_days();
        info!(trip_id = ?created.id, name = %created.name, "trip created");
        self.adopt(created);
        Ok(&self.trip)
    }

    pub async fn save_trip(&mut self) -> Result<&Trip, AppError> {
        if self.trip.id.is_none() {
            return Err(ValidationError::TripNotSaved.into());
        }
        checked_range(self.trip.start_date.as_ref(), self.trip.end_date.as_ref())?;

        self.trip.recompute_total_days();
        let mut saved = self.backend.update_trip(self.session, &self.trip).await?;
        if saved.destinations.is_empty() {
            saved.destinations = std::mem::take(&mut self.trip.destinations);
        }
        saved.recompute_total_days();
        info!(trip_id = ?saved.id, "trip saved");
        self.adopt(saved);
        Ok(&self.trip)
    }

    pub async fn delete_trip(&mut self, trip_id: i64) -> Result<Trip, AppError> {
        if self.trip.id == Some(trip_id) {
            self.reset();
        }
        let deleted = self.backend.delete_trip(self.session, trip_id).await?;
        info!(trip_id, "trip deleted");
        Ok(deleted)
    }

    pub async fn add_destination(&mut self, draft: Destination) -> Result<&Destination, AppError> {
        let trip_id = self.trip.id.ok_or(ValidationError::TripNotSaved)?;
        let days = self.check_destination(&draft, None)?;

        let mut outgoing = draft.to_server();
        outgoing.id = None;
        outgoing.trip_id = trip_id;
        outgoing.days = days;

        let created = self.backend.add_destination(self.session, &outgoing).await?;
        let stamped = restamp(created, &outgoing);
        info!(trip_id, destination_id = ?stamped.id, "destination added");
        self.trip.destinations.push(stamped);
        let last = self.trip.destinations.len() - 1;
        Ok(&self.trip.destinations[last])
    }

    pub async fn update_destination(
        &mut self,
        destination_id: i64,
        draft: Destination,
    ) -> Result<&Destination, AppError> {
        let index = self
            .position_of(destination_id)
            .ok_or(ValidationError::UnknownDestination(destination_id))?;
        let days = self.check_destination(&draft, Some(destination_id))?;

        let mut outgoing = draft.to_server();
        outgoing.id = Some(destination_id);
        outgoing.trip_id = self.trip.destinations[index].trip_id;
        outgoing.days = days;

        let updated = self
            .backend
            .update_destination(self.session, destination_id, &outgoing)
            .await?;
        self.trip.destinations[index] = restamp(updated, &outgoing);
        self.changed = true;
        info!(destination_id, "destination updated");
        Ok(&self.trip.destinations[index])
    }

    /// Removes the destination at `index`, deleting it remotely when it was
    /// ever persisted.
    pub async fn remove_destination(&mut self, index: usize) -> Result<Destination, AppError> {
        let Some(destination) = self.trip.destinations.get(index) else {
            return Err(AppError::NotFound);
        };
        if let Some(destination_id) = destination.id {
            self.backend
                .delete_destination(self.session, destination_id)
                .await?;
            info!(destination_id, "destination deleted");
        }
        Ok(self.trip.destinations.remove(index))
    }

    pub fn position_of(&self, destination_id: i64) -> Option<usize> {
        self.trip
            .destinations
            .iter()
            .position(|dest| dest.id == Some(destination_id))
    }

    fn adopt(&mut self, trip: Trip) {
        self.snapshot = Some(TripSnapshot::of(&trip));
        self.trip = trip;
        self.changed = false;
    }

    /// Runs every local rule for a destination and returns its day count.
    fn check_destination(
        &self,
        draft: &Destination,
        exclude_id: Option<i64>,
    ) -> Result<i64, ValidationError> {
        if draft.name.trim().is_empty()
            || draft.country.trim().is_empty()
            || draft.start_date.is_none()
            || draft.end_date.is_none()
        {
            return Err(ValidationError::MissingDestinationFields);
        }
        let (start, end) = checked_range(draft.start_date.as_ref(), draft.end_date.as_ref())?;
        let start = DateValue::Date(start);
        let end = DateValue::Date(end);

        if !dates::is_within_trip(
            Some(&start),
            Some(&end),
            self.trip.start_date.as_ref(),
            self.trip.end_date.as_ref(),
        ) {
            debug!(?start, ?end, "destination outside trip range");
            return Err(ValidationError::OutsideTrip {
                trip_start: dates::format_for_display(self.trip.start_date.as_ref()),
                trip_end: dates::format_for_display(self.trip.end_date.as_ref()),
            });
        }

        if dates::overlaps(Some(&start), Some(&end), &self.trip.destinations, exclude_id) {
            debug!(?start, ?end, "destination overlaps a sibling");
            return Err(ValidationError::Overlap);
        }

        Ok(dates::day_count(Some(&start), Some(&end)))
    }
}

/// Both dates present, readable, and in order.
fn checked_range(
    start: Option<&DateValue>,
    end: Option<&DateValue>,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    if start.is_none() || end.is_none() {
        return Err(ValidationError::MissingDates);
    }
    let (Some(start), Some(end)) = (dates::normalize(start), dates::normalize(end)) else {
        return Err(ValidationError::InvalidDate);
    };
    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok((start, end))
}

/// The locally computed dates and day count win over the backend echo.
fn restamp(mut echoed: Destination, sent: &Destination) -> Destination {
    echoed.start_date = sent.start_date.clone();
    echoed.end_date = sent.end_date.clone();
    echoed.days = sent.days;
    if echoed.trip_id == 0 {
        echoed.trip_id = sent.trip_id;
    }
    echoed
}
