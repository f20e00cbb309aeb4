use super::{parse_timestamp, required};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{CreateSessionRequest, Session, SessionDayPoint, SessionFilter, SessionSort};
use crate::state::AppState;
use crate::stats::{day_window, weekly_session_stats};
use crate::store::{Sort, Store};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Local, Utc};
use tracing::info;
use uuid::Uuid;

impl CreateSessionRequest {
    pub fn into_session(self, owner: Option<&str>, now: DateTime<Utc>) -> Result<Session, AppError> {
        let kind = required("type", self.kind)?;
        let duration = required("duration", self.duration)?;
        if duration == 0 {
            return Err(AppError::bad_request("duration must be at least 1 minute"));
        }
        let completed_at = self
            .completed_at
            .map(|raw| parse_timestamp("completedAt", &raw))
            .transpose()?
            .unwrap_or(now);

        Ok(Session {
            id: Uuid::new_v4(),
            owner: owner.map(str::to_owned),
            kind,
            duration,
            completed_at,
            task_id: self.task_id,
            created_at: now,
        })
    }
}

pub async fn list_sessions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Session>>, AppError> {
    let filter = SessionFilter::owned_by(caller.owner());
    let sessions = state
        .db
        .sessions
        .find(&filter, Some(Sort::desc(SessionSort::CompletedAt)), None)
        .await?;
    Ok(Json(sessions))
}

pub async fn create_session(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let Json(payload) = payload?;
    let session = payload.into_session(caller.owner(), Utc::now())?;
    let session = state.db.sessions.insert(session).await?;
    info!(
        session_id = %session.id,
        kind = ?session.kind,
        duration = session.duration,
        "session logged"
    );
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn todays_sessions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Session>>, AppError> {
    let filter = SessionFilter {
        completed: day_window(&Local::now()).range(),
        ..SessionFilter::owned_by(caller.owner())
    };
    let sessions = state
        .db
        .sessions
        .find(&filter, Some(Sort::desc(SessionSort::CompletedAt)), None)
        .await?;
    Ok(Json(sessions))
}

pub async fn weekly_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<SessionDayPoint>>, AppError> {
    let points = weekly_session_stats(&state.db.sessions, caller.owner()).await?;
    Ok(Json(points))
}
