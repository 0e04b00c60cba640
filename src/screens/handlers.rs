use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, error, instrument};

use super::dto::{
    CalendarView, DashboardView, LogView, PaymentResponse, ToggleRequest, ToggleResponse,
};
use super::screen::{MealScreen, Phase};
use super::services::{self, PaymentOutcome, Toggle};
use crate::{
    auth::{Session, SessionState},
    error::AppError,
    meals::{format::parse_iso_date, MealKind},
    state::AppState,
};

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/calendar", get(get_calendar))
        .route("/log", get(get_log))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/calendar/:date/:meal", put(put_meal))
        .route("/log/mark-all-paid", post(mark_all_paid))
}

/// Builds a screen for the signed-in owner and loads its rows.
async fn load_screen(
    state: &AppState,
    session: &Session,
) -> Result<MealScreen, AppError> {
    let mut screen = MealScreen::new(session);
    services::refresh(&mut screen, state.gateway.as_ref()).await?;
    debug!(owner = %screen.owner(), phase = ?screen.phase(), rows = screen.records().len(), "screen loaded");
    Ok(screen)
}

#[instrument(skip(state, session))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    session: SessionState,
) -> Result<Json<DashboardView>, AppError> {
    let session = session.require()?;
    let screen = load_screen(&state, &session).await?;
    Ok(Json(DashboardView::build(&session, &screen, state.today())))
}

#[instrument(skip(state, session))]
pub async fn get_calendar(
    State(state): State<AppState>,
    session: SessionState,
) -> Result<Json<CalendarView>, AppError> {
    let session = session.require()?;
    let screen = load_screen(&state, &session).await?;
    Ok(Json(CalendarView::build(
        &screen,
        state.config.calendar_start,
        state.today(),
    )))
}

#[instrument(skip(state, session))]
pub async fn get_log(
    State(state): State<AppState>,
    session: SessionState,
) -> Result<Json<LogView>, AppError> {
    let session = session.require()?;
    let screen = load_screen(&state, &session).await?;
    Ok(Json(LogView::build(&screen)))
}

/// PUT /calendar/:date/:meal { "taken": bool }
///
/// A rejected write answers with the error status and the day as re-read
/// from the datastore, so the caller can drop its optimistic value.
#[instrument(skip(state, session, body))]
pub async fn put_meal(
    State(state): State<AppState>,
    session: SessionState,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ToggleResponse>), AppError> {
    let session = session.require()?;
    let Path((date, meal)) = path?;
    let Json(body) = body?;
    let date = parse_iso_date(&date)
        .map_err(|_| AppError::Validation(format!("Invalid date: {date}")))?;
    let kind: MealKind = meal.parse().map_err(AppError::Validation)?;

    let mut screen = load_screen(&state, &session).await?;
    let toggle = Toggle {
        date,
        kind,
        taken: body.taken,
    };
    let result = services::toggle_meal(
        &mut screen,
        state.gateway.as_ref(),
        toggle,
        state.config.seed_untouched_meals,
        state.now(),
    )
    .await;

    match result {
        Ok(notice) => Ok((
            StatusCode::OK,
            Json(ToggleResponse::build(&screen, date, notice)),
        )),
        Err(e @ AppError::Gateway { .. }) if screen.phase() == &Phase::Ready => {
            error!(error = %e, %date, %kind, "meal update rejected; returning stored state");
            Ok((
                e.status(),
                Json(ToggleResponse::build(&screen, date, e.notice())),
            ))
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, session))]
pub async fn mark_all_paid(
    State(state): State<AppState>,
    session: SessionState,
) -> Result<Json<PaymentResponse>, AppError> {
    let session = session.require()?;
    let mut screen = load_screen(&state, &session).await?;
    let outcome =
        services::mark_all_paid(&mut screen, state.gateway.as_ref(), state.today()).await?;
    let (notice, payment) = match outcome {
        PaymentOutcome::NothingDue(notice) => (notice, None),
        PaymentOutcome::Paid { payment, notice } => (notice, Some(payment)),
    };
    Ok(Json(PaymentResponse {
        notice,
        payment,
        stats: screen.stats().into(),
    }))
}
