use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Path, Query, State},
    response::{Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Local;
use serde::Deserialize;
use tracing::debug;

use super::with_notice;
use crate::{
    auth::{self, CurrentSession, CurrentTheme},
    dates::{self, DateValue, DATE_FORMAT},
    error::AppError,
    models::{
        country::Country,
        session::SessionContext,
        settings::Theme,
        trip::{Destination, Trip},
    },
    planner::TripPlanner,
    services::trips::TripBackend,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/trips", post(create_trip))
        .route("/trips/:id", get(trip_page).post(save_trip))
        .route("/trips/:id/delete", post(delete_trip))
        .route("/trips/:id/destinations", post(add_destination))
        .route("/trips/:id/destinations/:dest_id", post(update_destination))
        .route(
            "/trips/:id/destinations/:dest_id/delete",
            post(remove_destination),
        )
        .route("/countries", get(country_suggestions))
}

type Planner<'a> = TripPlanner<'a, dyn TripBackend>;

#[derive(Debug, Default, Deserialize)]
struct NoticeQuery {
    notice: Option<String>,
}

struct TripRow {
    id: i64,
    name: String,
    start_display: String,
    end_display: String,
    total_days: i64,
    selected: bool,
}

struct DestinationRow {
    id: i64,
    editable: bool,
    name: String,
    country: String,
    start_input: String,
    end_input: String,
    start_display: String,
    end_display: String,
    days: i64,
}

impl DestinationRow {
    fn of(dest: &Destination) -> Self {
        Self {
            id: dest.id.unwrap_or_default(),
            editable: dest.id.is_some(),
            name: dest.name.clone(),
            country: dest.country.clone(),
            start_input: dates::format_for_input(dest.start_date.as_ref()),
            end_input: dates::format_for_input(dest.end_date.as_ref()),
            start_display: dates::format_for_display(dest.start_date.as_ref()),
            end_display: dates::format_for_display(dest.end_date.as_ref()),
            days: if dest.days != 0 {
                dest.days
            } else {
                dest.span_days()
            },
        }
    }
}

struct TripEditor {
    id: i64,
    name: String,
    start_input: String,
    end_input: String,
    start_display: String,
    end_display: String,
    total_days: i64,
    remaining_days: i64,
    destinations: Vec<DestinationRow>,
}

impl TripEditor {
    fn of(planner: &Planner<'_>) -> Self {
        let trip = planner.trip();
        Self {
            id: trip.id.unwrap_or_default(),
            name: trip.name.clone(),
            start_input: dates::format_for_input(trip.start_date.as_ref()),
            end_input: dates::format_for_input(trip.end_date.as_ref()),
            start_display: dates::format_for_display(trip.start_date.as_ref()),
            end_display: dates::format_for_display(trip.end_date.as_ref()),
            total_days: trip.total_days,
            remaining_days: planner.remaining_days(),
            destinations: trip.destinations.iter().map(DestinationRow::of).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    theme: String,
    here: String,
    logged_in: bool,
    user_name: String,
    notice: String,
    today: String,
    trips: Vec<TripRow>,
    editor: Option<TripEditor>,
}

async fn overview(
    State(state): State<AppState>,
    current: CurrentSession,
    CurrentTheme(theme): CurrentTheme,
    jar: PrivateCookieJar,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    match render_dashboard(&state, session, theme, None, query.notice).await {
        Err(AppError::Unauthorized) => Ok(signed_out(jar)),
        page => page,
    }
}

async fn trip_page(
    State(state): State<AppState>,
    current: CurrentSession,
    CurrentTheme(theme): CurrentTheme,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let page = render_dashboard(&state, session, theme, Some(trip_id), query.notice).await;
    settle(jar, page, "/dashboard")
}

async fn render_dashboard(
    state: &AppState,
    session: &SessionContext,
    theme: Theme,
    selected: Option<i64>,
    notice: Option<String>,
) -> Result<Response, AppError> {
    let trips = state.trips.list_trips(session).await?;

    let editor = match selected {
        Some(trip_id) => {
            let mut planner = Planner::new(state.trips.as_ref(), session);
            planner.load(trip_id).await?;
            Some(TripEditor::of(&planner))
        }
        None => None,
    };

    Ok(AskamaTemplateResponse::into_response(DashboardTemplate {
        theme: theme.to_string(),
        here: selected.map(trip_path).unwrap_or_else(|| "/dashboard".into()),
        logged_in: true,
        user_name: session.user.display_name().to_string(),
        notice: notice.unwrap_or_default(),
        today: Local::now().date_naive().format(DATE_FORMAT).to_string(),
        trips: trip_rows(&trips, selected),
        editor,
    }))
}

fn trip_rows(trips: &[Trip], selected: Option<i64>) -> Vec<TripRow> {
    trips
        .iter()
        .filter_map(|trip| {
            let id = trip.id?;
            let mut total = trip.clone();
            total.recompute_total_days();
            Some(TripRow {
                id,
                name: trip.name.clone(),
                start_display: dates::format_for_display(trip.start_date.as_ref()),
                end_display: dates::format_for_display(trip.end_date.as_ref()),
                total_days: total.total_days,
                selected: selected == Some(id),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct TripForm {
    name: String,
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct DestinationForm {
    name: String,
    country: String,
    start_date: String,
    end_date: String,
}

impl DestinationForm {
    fn draft(&self, trip_id: i64) -> Destination {
        Destination::draft(
            trip_id,
            self.name.trim(),
            self.country.trim(),
            DateValue::from_input(&self.start_date),
            DateValue::from_input(&self.end_date),
        )
    }
}

fn fill_trip(planner: &mut Planner<'_>, form: &TripForm) {
    planner.set_trip_fields(
        form.name.trim(),
        DateValue::from_input(&form.start_date),
        DateValue::from_input(&form.end_date),
    );
}

async fn create_trip(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let mut planner = Planner::new(state.trips.as_ref(), session);
    fill_trip(&mut planner, &form);

    let outcome = planner.create_trip().await.map(|trip| match trip.id {
        Some(id) => with_notice(&trip_path(id), "Trip created"),
        None => with_notice("/dashboard", "Trip created"),
    });
    settle_redirect(jar, outcome, "/dashboard")
}

async fn save_trip(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let mut planner = Planner::new(state.trips.as_ref(), session);
    let back = trip_path(trip_id);

    let outcome = edit_trip(&mut planner, trip_id, &form)
        .await
        .map(|notice| with_notice(&back, notice));
    settle_redirect(jar, outcome, &back)
}

async fn edit_trip(
    planner: &mut Planner<'_>,
    trip_id: i64,
    form: &TripForm,
) -> Result<&'static str, AppError> {
    planner.load(trip_id).await?;
    fill_trip(planner, form);
    if !planner.has_unsaved_changes() {
        return Ok("Nothing to save");
    }
    planner.save_trip().await?;
    Ok("Trip saved")
}

async fn delete_trip(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let mut planner = Planner::new(state.trips.as_ref(), session);

    let outcome = planner
        .delete_trip(trip_id)
        .await
        .map(|_| with_notice("/dashboard", "Trip deleted"));
    settle_redirect(jar, outcome, "/dashboard")
}

async fn add_destination(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
    Path(trip_id): Path<i64>,
    Form(form): Form<DestinationForm>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let mut planner = Planner::new(state.trips.as_ref(), session);
    let back = trip_path(trip_id);

    let outcome = async {
        planner.load(trip_id).await?;
        planner.add_destination(form.draft(trip_id)).await?;
        Ok::<_, AppError>(with_notice(&back, "Destination added"))
    }
    .await;
    settle_redirect(jar, outcome, &back)
}

async fn update_destination(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
    Path((trip_id, dest_id)): Path<(i64, i64)>,
    Form(form): Form<DestinationForm>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let mut planner = Planner::new(state.trips.as_ref(), session);
    let back = trip_path(trip_id);

    let outcome = async {
        planner.load(trip_id).await?;
        planner
            .update_destination(dest_id, form.draft(trip_id))
            .await?;
        Ok::<_, AppError>(with_notice(&back, "Destination updated"))
    }
    .await;
    settle_redirect(jar, outcome, &back)
}

async fn remove_destination(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
    Path((trip_id, dest_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let session = current.require_session()?;
    let mut planner = Planner::new(state.trips.as_ref(), session);
    let back = trip_path(trip_id);

    let outcome = async {
        planner.load(trip_id).await?;
        let index = planner.position_of(dest_id).ok_or(AppError::NotFound)?;
        planner.remove_destination(index).await?;
        Ok::<_, AppError>(with_notice(&back, "Destination removed"))
    }
    .await;
    settle_redirect(jar, outcome, &back)
}

#[derive(Debug, Default, Deserialize)]
struct CountryQuery {
    q: Option<String>,
}

async fn country_suggestions(
    State(state): State<AppState>,
    Query(query): Query<CountryQuery>,
) -> Json<Vec<Country>> {
    let term = query.q.unwrap_or_default();
    Json(state.countries.search(&term).await)
}

fn trip_path(trip_id: i64) -> String {
    format!("/dashboard/trips/{trip_id}")
}

fn signed_out(jar: PrivateCookieJar) -> Response {
    (auth::clear_session_cookie(jar), Redirect::to("/auth/login")).into_response()
}

fn settle_redirect(
    jar: PrivateCookieJar,
    outcome: Result<String, AppError>,
    back_to: &str,
) -> Result<Response, AppError> {
    settle(
        jar,
        outcome.map(|location| Redirect::to(&location).into_response()),
        back_to,
    )
}

/// Expired sessions sign the user out; anything the user can act on goes back
/// to `back_to` as a notice.
fn settle(
    jar: PrivateCookieJar,
    outcome: Result<Response, AppError>,
    back_to: &str,
) -> Result<Response, AppError> {
    match outcome {
        Ok(response) => Ok(response),
        Err(AppError::Unauthorized) => Ok(signed_out(jar)),
        Err(err) => match err.notice() {
            Some(notice) => {
                debug!("returning to {back_to}: {notice}");
                Ok(Redirect::to(&with_notice(back_to, &notice)).into_response())
            }
            None => Err(err),
        },
    }
}
