pub mod goals;
pub mod sessions;
pub mod tasks;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::StatsSummary;
use crate::state::AppState;
use crate::stats::{build_summary, StatsSources};
use crate::store::{Record, Store};
use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "taskboard API is running",
        "endpoints": {
            "stats": "/stats-summary",
            "tasks": "/tasks",
            "goals": "/goals",
            "sessions": "/sessions",
        }
    }))
}

pub async fn stats_summary(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<StatsSummary>, AppError> {
    let summary = build_summary(StatsSources::from(&state.db), caller.owner()).await?;
    Ok(Json(summary))
}

/// Loads a path-referenced record, failing before any mutation when it is
/// missing or belongs to another caller.
pub(crate) async fn find_owned<R: Record>(
    store: &dyn Store<R>,
    caller: &Caller,
    raw_id: &str,
) -> Result<R, AppError> {
    let missing = || AppError::not_found(format!("{} not found", R::LABEL));
    let id = Uuid::parse_str(raw_id).map_err(|_| missing())?;
    let record = store.find_by_id(id).await?.ok_or_else(missing)?;
    caller.ensure_owns(record.owner())?;
    Ok(record)
}

pub(crate) fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::bad_request(format!("{field} is required")))
}

pub(crate) fn non_blank(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_owned())
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (UTC midnight).
pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::bad_request(format!("{field} must be an RFC 3339 timestamp or YYYY-MM-DD date")))
}
