use super::{find_owned, non_blank, parse_timestamp, required};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    Confirmation, CreateGoalRequest, Goal, GoalFilter, GoalPatch, GoalSort, GoalStatus,
    ProgressRequest, TimeRange, UpdateGoalRequest,
};
use crate::state::AppState;
use crate::store::{Sort, Store};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

impl CreateGoalRequest {
    pub fn into_goal(self, owner: Option<&str>, now: DateTime<Utc>) -> Result<Goal, AppError> {
        let title = non_blank("title", required("title", self.title)?)?;
        let target = positive("target", required("target", self.target)?)?;
        let deadline = parse_timestamp("deadline", &required("deadline", self.deadline)?)?;

        Ok(Goal {
            id: Uuid::new_v4(),
            owner: owner.map(str::to_owned),
            title,
            kind: self.kind.unwrap_or_default(),
            target,
            current: 0,
            deadline,
            category: self.category.unwrap_or_default(),
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

impl UpdateGoalRequest {
    pub fn into_patch(self) -> Result<GoalPatch, AppError> {
        Ok(GoalPatch {
            title: self.title.map(|title| non_blank("title", title)).transpose()?,
            kind: self.kind,
            target: self.target.map(|target| positive("target", target)).transpose()?,
            current: self.current,
            deadline: self
                .deadline
                .map(|raw| parse_timestamp("deadline", &raw))
                .transpose()?,
            category: self.category,
            status: self.status,
            increment: None,
        })
    }
}

fn positive(field: &str, value: u32) -> Result<u32, AppError> {
    if value == 0 {
        return Err(AppError::bad_request(format!("{field} must be at least 1")));
    }
    Ok(value)
}

pub async fn list_goals(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Goal>>, AppError> {
    let filter = GoalFilter::owned_by(caller.owner());
    let goals = state
        .db
        .goals
        .find(&filter, Some(Sort::asc(GoalSort::Deadline)), None)
        .await?;
    Ok(Json(goals))
}

pub async fn active_goals(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Goal>>, AppError> {
    let filter = GoalFilter {
        status: Some(GoalStatus::Active),
        deadline: TimeRange::starting_at(Utc::now()),
        ..GoalFilter::owned_by(caller.owner())
    };
    let goals = state
        .db
        .goals
        .find(&filter, Some(Sort::asc(GoalSort::Deadline)), None)
        .await?;
    Ok(Json(goals))
}

pub async fn get_goal(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Goal>, AppError> {
    let goal = find_owned::<Goal>(&state.db.goals, &caller, &id).await?;
    Ok(Json(goal))
}

pub async fn create_goal(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateGoalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let Json(payload) = payload?;
    let goal = payload.into_goal(caller.owner(), Utc::now())?;
    let goal = state.db.goals.insert(goal).await?;
    info!(goal_id = %goal.id, target = goal.target, "goal created");
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn update_goal(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateGoalRequest>, JsonRejection>,
) -> Result<Json<Goal>, AppError> {
    let existing = find_owned::<Goal>(&state.db.goals, &caller, &id).await?;
    let Json(payload) = payload?;
    let patch = payload.into_patch()?;
    let goal = state.db.goals.update(existing.id, patch).await?;
    info!(goal_id = %goal.id, status = ?goal.status, "goal updated");
    Ok(Json(goal))
}

/// Adds `increment` (default 1) to the goal; the body may be omitted.
pub async fn record_progress(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Goal>, AppError> {
    let existing = find_owned::<Goal>(&state.db.goals, &caller, &id).await?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ProgressRequest::default()
    } else {
        serde_json::from_slice::<ProgressRequest>(&body)
            .map_err(|err| AppError::bad_request(format!("invalid progress payload: {err}")))?
    };

    let goal = state
        .db
        .goals
        .update(existing.id, GoalPatch::progress(request.step()))
        .await?;
    info!(
        goal_id = %goal.id,
        current = goal.current,
        target = goal.target,
        status = ?goal.status,
        "goal progress recorded"
    );
    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Confirmation>, AppError> {
    let existing = find_owned::<Goal>(&state.db.goals, &caller, &id).await?;
    state.db.goals.delete(existing.id).await?;
    info!(goal_id = %existing.id, "goal deleted");
    Ok(Json(Confirmation {
        message: "Goal deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalCategory, GoalKind};

    fn request(target: Option<u32>) -> CreateGoalRequest {
        CreateGoalRequest {
            title: Some("Ship ten features".into()),
            kind: None,
            target,
            deadline: Some("2026-02-01".into()),
            category: None,
        }
    }

    #[test]
    fn create_starts_active_at_zero() {
        let goal = request(Some(10)).into_goal(None, Utc::now()).unwrap();
        assert_eq!(goal.current, 0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.kind, GoalKind::Weekly);
        assert_eq!(goal.category, GoalCategory::Productivity);
    }

    #[test]
    fn target_must_be_positive() {
        assert!(matches!(
            request(Some(0)).into_goal(None, Utc::now()),
            Err(AppError::ValidationFailed(_))
        ));
        assert!(matches!(
            request(None).into_goal(None, Utc::now()),
            Err(AppError::ValidationFailed(_))
        ));
    }
}
