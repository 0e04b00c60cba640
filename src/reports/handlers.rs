use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::builder::{ReportOutcome, ReportTemplate, MAX_RECENT_DAYS};
use crate::{
    auth::{Session, SessionState},
    error::AppError,
    meals::format::parse_iso_date,
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/unpaid", get(unpaid_report))
        .route("/reports/paid", get(paid_report))
        .route("/reports/range", get(range_report))
        .route("/reports/recent", get(recent_report))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub days: Option<String>,
}

/// Checks the range inputs before anything is fetched.
pub fn validate_range(query: &RangeQuery) -> Result<ReportTemplate, AppError> {
    let (Some(start), Some(end)) = (
        query.start.as_deref().filter(|s| !s.trim().is_empty()),
        query.end.as_deref().filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Please select both start and end dates".into(),
        ));
    };
    let start = parse_iso_date(start)
        .map_err(|_| AppError::Validation(format!("Invalid start date: {start}")))?;
    let end = parse_iso_date(end)
        .map_err(|_| AppError::Validation(format!("Invalid end date: {end}")))?;
    if start > end {
        return Err(AppError::Validation(
            "Start date must be before end date".into(),
        ));
    }
    Ok(ReportTemplate::range(start, end))
}

pub fn validate_recent_days(days: Option<&str>) -> Result<u32, AppError> {
    match days.and_then(|d| d.trim().parse::<u32>().ok()) {
        Some(d) if (1..=MAX_RECENT_DAYS).contains(&d) => Ok(d),
        _ => Err(AppError::Validation(format!(
            "Number of days must be between 1 and {MAX_RECENT_DAYS}"
        ))),
    }
}

/// Fetches the owner's rows and renders `template` over them.
async fn render(
    state: &AppState,
    session: Session,
    template: ReportTemplate,
) -> Result<Response, AppError> {
    let records = state
        .gateway
        .fetch_meals(session.owner)
        .await
        .map_err(AppError::gateway("generate report"))?;

    match template.build(&records, state.now()) {
        ReportOutcome::Ready(report) => {
            info!(owner = %session.owner, filename = %report.filename, "report generated");
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                report.filename
            ))
            .map_err(|e| AppError::gateway("generate report")(anyhow::Error::from(e)))?;

            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            headers.insert(header::CONTENT_DISPOSITION, disposition);
            Ok((headers, report.download_bytes()).into_response())
        }
        ReportOutcome::Empty(notice) => Ok(Json(notice).into_response()),
    }
}

#[instrument(skip(state, session))]
pub async fn unpaid_report(
    State(state): State<AppState>,
    session: SessionState,
) -> Result<Response, AppError> {
    render(&state, session.require()?, ReportTemplate::unpaid()).await
}

#[instrument(skip(state, session))]
pub async fn paid_report(
    State(state): State<AppState>,
    session: SessionState,
) -> Result<Response, AppError> {
    render(&state, session.require()?, ReportTemplate::paid()).await
}

#[instrument(skip(state, session))]
pub async fn range_report(
    State(state): State<AppState>,
    session: SessionState,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let session = session.require()?;
    let Query(query) = query?;
    let template = validate_range(&query)?;
    render(&state, session, template).await
}

#[instrument(skip(state, session))]
pub async fn recent_report(
    State(state): State<AppState>,
    session: SessionState,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let session = session.require()?;
    let Query(query) = query?;
    let days = validate_recent_days(query.days.as_deref())?;
    let template = ReportTemplate::recent(days, state.today());
    render(&state, session, template).await
}
