use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskCategory {
    Work,
    Personal,
    Shopping,
    Health,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GoalKind {
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GoalCategory {
    Tasks,
    Learning,
    Fitness,
    #[default]
    Productivity,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Work,
    #[serde(rename = "Short Break")]
    ShortBreak,
    #[serde(rename = "Long Break")]
    LongBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category: TaskCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.due_date < now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: GoalKind,
    pub target: u32,
    pub current: u32,
    pub deadline: DateTime<Utc>,
    pub category: GoalCategory,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn record_progress(&mut self, increment: u32) {
        self.current = self.current.saturating_add(increment);
        self.settle();
    }

    /// Clamps `current` to `target`, completing the goal once it is reached.
    pub fn settle(&mut self) {
        if self.current >= self.target {
            self.current = self.target;
            self.status = GoalStatus::Completed;
        }
    }

    /// Puts a completed goal back to Active when its progress is edited below target.
    pub fn reopen(&mut self) {
        if self.status == GoalStatus::Completed && self.current < self.target {
            self.status = GoalStatus::Active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub duration: u32,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Half-open `[since, until)` interval; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    pub fn before(until: DateTime<Utc>) -> Self {
        Self {
            since: None,
            until: Some(until),
        }
    }

    pub fn starting_at(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: None,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| at >= since) && self.until.is_none_or(|until| at < until)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub owner: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due: TimeRange,
    pub updated: TimeRange,
}

impl TaskFilter {
    pub fn owned_by(owner: Option<&str>) -> Self {
        Self {
            owner: owner.map(str::to_owned),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    pub owner: Option<String>,
    pub status: Option<GoalStatus>,
    pub deadline: TimeRange,
}

impl GoalFilter {
    pub fn owned_by(owner: Option<&str>) -> Self {
        Self {
            owner: owner.map(str::to_owned),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub owner: Option<String>,
    pub kind: Option<SessionKind>,
    pub completed: TimeRange,
}

impl SessionFilter {
    pub fn owned_by(owner: Option<&str>) -> Self {
        Self {
            owner: owner.map(str::to_owned),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    CreatedAt,
    DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalSort {
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSort {
    CompletedAt,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category: Option<TaskCategory>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub kind: Option<GoalKind>,
    pub target: Option<u32>,
    pub current: Option<u32>,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<GoalCategory>,
    pub status: Option<GoalStatus>,
    pub increment: Option<u32>,
}

impl GoalPatch {
    pub fn progress(increment: u32) -> Self {
        Self {
            increment: Some(increment),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category: Option<TaskCategory>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category: Option<TaskCategory>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<GoalKind>,
    pub target: Option<u32>,
    pub deadline: Option<String>,
    pub category: Option<GoalCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<GoalKind>,
    pub target: Option<u32>,
    pub current: Option<u32>,
    pub deadline: Option<String>,
    pub category: Option<GoalCategory>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressRequest {
    pub increment: Option<u32>,
}

impl ProgressRequest {
    /// A missing or zero increment counts as a single step.
    pub fn step(&self) -> u32 {
        self.increment.filter(|step| *step > 0).unwrap_or(1)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(rename = "type")]
    pub kind: Option<SessionKind>,
    pub duration: Option<u32>,
    pub task_id: Option<Uuid>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub overdue: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalCounts {
    pub active: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroToday {
    pub sessions_today: u64,
    pub focus_time_today: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub tasks: TaskCounts,
    pub priority_distribution: BTreeMap<Priority, u64>,
    pub weekly_trends: Vec<TrendPoint>,
    pub goals: GoalCounts,
    pub pomodoro: PomodoroToday,
    pub productivity_score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionDayPoint {
    pub date: String,
    pub work_sessions: u64,
    pub work_time: u64,
    pub short_breaks: u64,
    pub long_breaks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn goal(target: u32, current: u32) -> Goal {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        Goal {
            id: Uuid::new_v4(),
            owner: None,
            title: "Read books".into(),
            kind: GoalKind::Monthly,
            target,
            current,
            deadline: at,
            category: GoalCategory::Learning,
            status: GoalStatus::Active,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn progress_clamps_to_target_and_completes() {
        let mut goal = goal(10, 8);
        goal.record_progress(5);
        assert_eq!(goal.current, 10);
        assert_eq!(goal.status, GoalStatus::Completed);
    }

    #[test]
    fn progress_below_target_stays_active() {
        let mut goal = goal(10, 3);
        goal.record_progress(2);
        assert_eq!(goal.current, 5);
        assert_eq!(goal.status, GoalStatus::Active);
    }

    #[test]
    fn reopen_only_touches_completed_goals_below_target() {
        let mut rewound = goal(10, 3);
        rewound.status = GoalStatus::Completed;
        rewound.reopen();
        assert_eq!(rewound.status, GoalStatus::Active);

        let mut reached = goal(10, 10);
        reached.status = GoalStatus::Completed;
        reached.reopen();
        assert_eq!(reached.status, GoalStatus::Completed);

        let mut failed = goal(10, 2);
        failed.status = GoalStatus::Failed;
        failed.reopen();
        assert_eq!(failed.status, GoalStatus::Failed);
    }

    #[test]
    fn progress_never_overflows() {
        let mut goal = goal(u32::MAX, u32::MAX - 1);
        goal.record_progress(u32::MAX);
        assert_eq!(goal.current, u32::MAX);
        assert_eq!(goal.status, GoalStatus::Completed);
    }

    #[test]
    fn zero_increment_counts_as_one_step() {
        assert_eq!(ProgressRequest { increment: Some(0) }.step(), 1);
        assert_eq!(ProgressRequest::default().step(), 1);
        assert_eq!(ProgressRequest { increment: Some(4) }.step(), 4);
    }

    #[test]
    fn overdue_requires_pending_and_past_due() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let mut task = Task {
            id: Uuid::new_v4(),
            owner: None,
            title: "File taxes".into(),
            description: "Before the deadline".into(),
            due_date: now - chrono::Duration::hours(1),
            status: TaskStatus::Pending,
            priority: Priority::High,
            category: TaskCategory::Personal,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        assert!(task.is_overdue(now));
        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(now));
        task.status = TaskStatus::Pending;
        task.due_date = now;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn session_kinds_use_spaced_wire_names() {
        let kind: SessionKind = serde_json::from_str("\"Short Break\"").unwrap();
        assert_eq!(kind, SessionKind::ShortBreak);
        assert!(serde_json::from_str::<SessionKind>("\"Nap\"").is_err());
    }

    #[test]
    fn time_range_is_half_open() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 6, 0, 0, 0).unwrap();
        let range = TimeRange::between(start, end);
        assert!(range.contains(start));
        assert!(!range.contains(end));
        assert!(TimeRange::default().contains(end));
    }
}
