use super::{find_owned, non_blank, parse_timestamp, required};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{
    Confirmation, CreateTaskRequest, Priority, Task, TaskFilter, TaskPatch, TaskSort, TaskStatus,
    TimeRange, UpdateTaskRequest,
};
use crate::state::AppState;
use crate::stats::day_window;
use crate::store::{Sort, Store};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Local, Utc};
use tracing::info;
use uuid::Uuid;

const RECENT_LIMIT: usize = 5;

/// Fixed list views offered by `GET /tasks/filter/:preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPreset {
    All,
    Completed,
    Pending,
    Overdue,
    Today,
    High,
}

impl TaskPreset {
    /// Unknown presets fall back to the full list.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "pending" => Self::Pending,
            "overdue" => Self::Overdue,
            "today" => Self::Today,
            "high" => Self::High,
            _ => Self::All,
        }
    }

    pub fn filter(self, owner: Option<&str>, now: DateTime<Local>) -> TaskFilter {
        let base = TaskFilter::owned_by(owner);
        match self {
            Self::All => base,
            Self::Completed => TaskFilter {
                status: Some(TaskStatus::Completed),
                ..base
            },
            Self::Pending => TaskFilter {
                status: Some(TaskStatus::Pending),
                ..base
            },
            Self::Overdue => TaskFilter {
                status: Some(TaskStatus::Pending),
                due: TimeRange::before(now.with_timezone(&Utc)),
                ..base
            },
            Self::Today => TaskFilter {
                due: day_window(&now).range(),
                ..base
            },
            Self::High => TaskFilter {
                priority: Some(Priority::High),
                ..base
            },
        }
    }
}

impl CreateTaskRequest {
    pub fn into_task(self, owner: Option<&str>, now: DateTime<Utc>) -> Result<Task, AppError> {
        let title = non_blank("title", required("title", self.title)?)?;
        let description = non_blank("description", required("description", self.description)?)?;
        let due_date = parse_timestamp("dueDate", &required("dueDate", self.due_date)?)?;

        Ok(Task {
            id: Uuid::new_v4(),
            owner: owner.map(str::to_owned),
            title,
            description,
            due_date,
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

impl UpdateTaskRequest {
    pub fn into_patch(self) -> Result<TaskPatch, AppError> {
        Ok(TaskPatch {
            title: self.title.map(|title| non_blank("title", title)).transpose()?,
            description: self
                .description
                .map(|description| non_blank("description", description))
                .transpose()?,
            due_date: self
                .due_date
                .map(|raw| parse_timestamp("dueDate", &raw))
                .transpose()?,
            status: self.status,
            priority: self.priority,
            category: self.category,
            tags: self.tags,
        })
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = TaskFilter::owned_by(caller.owner());
    let tasks = state
        .db
        .tasks
        .find(&filter, Some(Sort::desc(TaskSort::CreatedAt)), None)
        .await?;
    Ok(Json(tasks))
}

pub async fn recent_tasks(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = TaskFilter::owned_by(caller.owner());
    let tasks = state
        .db
        .tasks
        .find(&filter, Some(Sort::desc(TaskSort::CreatedAt)), Some(RECENT_LIMIT))
        .await?;
    Ok(Json(tasks))
}

pub async fn filter_tasks(
    State(state): State<AppState>,
    caller: Caller,
    Path(preset): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = TaskPreset::parse(&preset).filter(caller.owner(), Local::now());
    let tasks = state
        .db
        .tasks
        .find(&filter, Some(Sort::asc(TaskSort::DueDate)), None)
        .await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = find_owned::<Task>(&state.db.tasks, &caller, &id).await?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let Json(payload) = payload?;
    let task = payload.into_task(caller.owner(), Utc::now())?;
    let task = state.db.tasks.insert(task).await?;
    info!(task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let existing = find_owned::<Task>(&state.db.tasks, &caller, &id).await?;
    let Json(payload) = payload?;
    let patch = payload.into_patch()?;
    let task = state.db.tasks.update(existing.id, patch).await?;
    info!(task_id = %task.id, status = ?task.status, "task updated");
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Confirmation>, AppError> {
    let existing = find_owned::<Task>(&state.db.tasks, &caller, &id).await?;
    state.db.tasks.delete(existing.id).await?;
    info!(task_id = %existing.id, "task deleted");
    Ok(Json(Confirmation {
        message: "Task deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskCategory;
    use chrono::TimeZone;

    fn request(due_date: Option<&str>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: Some("Plan sprint".into()),
            description: Some("Outline the next two weeks".into()),
            due_date: due_date.map(str::to_owned),
            status: None,
            priority: None,
            category: None,
            tags: None,
        }
    }

    #[test]
    fn create_applies_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let task = request(Some("2026-01-09")).into_task(Some("alice"), now).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.category, TaskCategory::Other);
        assert!(task.tags.is_empty());
        assert_eq!(task.owner.as_deref(), Some("alice"));
        assert_eq!(task.created_at, now);
    }

    #[test]
    fn create_without_due_date_fails_validation() {
        let result = request(None).into_task(None, Utc::now());
        assert!(matches!(result, Err(AppError::ValidationFailed(_))));
    }

    #[test]
    fn update_rejects_blank_title() {
        let patch = UpdateTaskRequest {
            title: Some("  ".into()),
            description: None,
            due_date: None,
            status: None,
            priority: None,
            category: None,
            tags: None,
        };
        assert!(matches!(patch.into_patch(), Err(AppError::ValidationFailed(_))));
    }

    #[test]
    fn presets_parse_case_insensitively_and_default_to_all() {
        assert_eq!(TaskPreset::parse("Overdue"), TaskPreset::Overdue);
        assert_eq!(TaskPreset::parse("high"), TaskPreset::High);
        assert_eq!(TaskPreset::parse("whatever"), TaskPreset::All);
    }

    fn clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 5, 15, 30, 0).single().unwrap()
    }

    #[test]
    fn status_and_priority_presets_filter_one_field() {
        let completed = TaskPreset::Completed.filter(Some("alice"), clock());
        assert_eq!(completed.status, Some(TaskStatus::Completed));
        assert_eq!(completed.owner.as_deref(), Some("alice"));
        assert_eq!(completed.due, TimeRange::default());

        let pending = TaskPreset::Pending.filter(None, clock());
        assert_eq!(pending.status, Some(TaskStatus::Pending));
        assert_eq!(pending.priority, None);

        let high = TaskPreset::High.filter(None, clock());
        assert_eq!(high.priority, Some(Priority::High));
        assert_eq!(high.status, None);
        assert_eq!(high.due, TimeRange::default());
    }

    #[test]
    fn today_preset_spans_local_day_only() {
        let now = clock();
        let filter = TaskPreset::Today.filter(None, now);
        let window = day_window(&now);
        assert_eq!(filter.due, window.range());
        assert_eq!(filter.status, None);
        assert!(filter.due.contains(window.start));
        assert!(!filter.due.contains(window.end));
        assert!(filter.due.contains(now.with_timezone(&Utc)));
    }

    #[test]
    fn all_preset_only_scopes_owner() {
        let filter = TaskPreset::All.filter(Some("bob"), clock());
        assert_eq!(filter.owner.as_deref(), Some("bob"));
        assert_eq!(filter.status, None);
        assert_eq!(filter.priority, None);
        assert_eq!(filter.due, TimeRange::default());
        assert_eq!(filter.updated, TimeRange::default());
    }

    #[test]
    fn overdue_preset_selects_pending_tasks_due_before_now() {
        let now = Local::now();
        let filter = TaskPreset::Overdue.filter(None, now);
        assert_eq!(filter.status, Some(TaskStatus::Pending));
        assert_eq!(filter.due, TimeRange::before(now.with_timezone(&Utc)));
    }
}
