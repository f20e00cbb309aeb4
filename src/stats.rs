use crate::errors::AppError;
use crate::models::{
    Goal, GoalCounts, GoalFilter, GoalStatus, PomodoroToday, Priority, Session, SessionDayPoint,
    SessionFilter, SessionKind, StatsSummary, Task, TaskCounts, TaskFilter, TaskStatus, TimeRange,
    TrendPoint,
};
use crate::store::{Database, Store, StoreError};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::error;

pub const TREND_DAYS: u32 = 7;

const COMPLETED_TASK_POINTS: i128 = 10;
const OVERDUE_TASK_PENALTY: i128 = 5;
const ACTIVE_GOAL_POINTS: i128 = 15;
const SESSION_POINTS: i128 = 8;

/// One local calendar day as the UTC instants `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn range(&self) -> TimeRange {
        TimeRange::between(self.start, self.end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.range().contains(at)
    }
}

pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> DayWindow {
    window_for(&now.timezone(), now.date_naive())
}

/// The `days` calendar days ending with `now`'s day, oldest first.
pub fn trailing_days<Tz: TimeZone>(now: &DateTime<Tz>, days: u32) -> Vec<DayWindow> {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..i64::from(days))
        .rev()
        .map(|offset| window_for(&tz, today - Duration::days(offset)))
        .collect()
}

fn window_for<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DayWindow {
    DayWindow {
        date,
        start: local_midnight(tz, date),
        end: local_midnight(tz, date + Duration::days(1)),
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // Zones whose DST shift skips midnight start the day at the first valid hour.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct StatsSources<'a> {
    pub tasks: &'a dyn Store<Task>,
    pub goals: &'a dyn Store<Goal>,
    pub sessions: &'a dyn Store<Session>,
}

impl<'a> From<&'a Database> for StatsSources<'a> {
    fn from(db: &'a Database) -> Self {
        Self {
            tasks: &db.tasks,
            goals: &db.goals,
            sessions: &db.sessions,
        }
    }
}

pub async fn build_summary(
    sources: StatsSources<'_>,
    owner: Option<&str>,
) -> Result<StatsSummary, AppError> {
    build_summary_at(sources, owner, Local::now()).await
}

pub async fn build_summary_at<Tz: TimeZone>(
    sources: StatsSources<'_>,
    owner: Option<&str>,
    now: DateTime<Tz>,
) -> Result<StatsSummary, AppError> {
    let days = trailing_days(&now, TREND_DAYS);
    let today = day_window(&now);
    let now = now.with_timezone(&Utc);

    let all_tasks = TaskFilter::owned_by(owner);
    let active_goals = GoalFilter {
        status: Some(GoalStatus::Active),
        ..GoalFilter::owned_by(owner)
    };
    let completed_goals = GoalFilter {
        status: Some(GoalStatus::Completed),
        ..GoalFilter::owned_by(owner)
    };
    let todays_sessions = SessionFilter {
        completed: today.range(),
        ..SessionFilter::owned_by(owner)
    };

    let (tasks, active, completed, sessions) = tokio::try_join!(
        sources.tasks.find(&all_tasks, None, None),
        sources.goals.count(&active_goals),
        sources.goals.count(&completed_goals),
        sources.sessions.find(&todays_sessions, None, None),
    )
    .map_err(|err| {
        error!(error = %err, "stats aggregation failed");
        AppError::AggregationFailed(err.to_string())
    })?;

    Ok(summarize(
        &tasks,
        GoalCounts { active, completed },
        &sessions,
        now,
        &days,
    ))
}

/// Folds one owner's snapshot into the dashboard summary.
pub fn summarize(
    tasks: &[Task],
    goals: GoalCounts,
    todays_sessions: &[Session],
    now: DateTime<Utc>,
    days: &[DayWindow],
) -> StatsSummary {
    let counts = task_counts(tasks, now);
    let pomodoro = PomodoroToday {
        sessions_today: todays_sessions.len() as u64,
        focus_time_today: todays_sessions
            .iter()
            .filter(|session| session.kind == SessionKind::Work)
            .map(|session| u64::from(session.duration))
            .sum(),
    };
    let productivity_score = productivity_score(
        counts.completed,
        counts.overdue,
        goals.active,
        pomodoro.sessions_today,
    );

    StatsSummary {
        priority_distribution: priority_distribution(tasks),
        weekly_trends: completion_trend(tasks, days),
        tasks: counts,
        goals,
        pomodoro,
        productivity_score,
    }
}

pub fn task_counts(tasks: &[Task], now: DateTime<Utc>) -> TaskCounts {
    let total = tasks.len() as u64;
    let completed = tasks
        .iter()
        .filter(|task| task.status == TaskStatus::Completed)
        .count() as u64;
    let overdue = tasks.iter().filter(|task| task.is_overdue(now)).count() as u64;

    TaskCounts {
        total,
        completed,
        pending: total - completed,
        overdue,
        completion_rate: completion_rate(completed, total),
    }
}

/// Percentage rounded to one decimal; 0 for an empty task list.
pub fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 1000.0).round() / 10.0
}

pub fn priority_distribution(tasks: &[Task]) -> BTreeMap<Priority, u64> {
    let mut distribution = BTreeMap::new();
    for task in tasks {
        *distribution.entry(task.priority).or_insert(0) += 1;
    }
    distribution
}

/// Completed tasks per day, bucketed by the day their last update landed in.
pub fn completion_trend(tasks: &[Task], days: &[DayWindow]) -> Vec<TrendPoint> {
    let mut counts = vec![0u64; days.len()];
    for task in tasks.iter().filter(|task| task.status == TaskStatus::Completed) {
        if let Some(index) = days.iter().position(|day| day.contains(task.updated_at)) {
            counts[index] += 1;
        }
    }

    days.iter()
        .zip(counts)
        .map(|(day, completed)| TrendPoint {
            date: date_key(day.date),
            completed,
        })
        .collect()
}

pub fn productivity_score(completed: u64, overdue: u64, active_goals: u64, sessions_today: u64) -> u8 {
    let raw = i128::from(completed) * COMPLETED_TASK_POINTS
        - i128::from(overdue) * OVERDUE_TASK_PENALTY
        + i128::from(active_goals) * ACTIVE_GOAL_POINTS
        + i128::from(sessions_today) * SESSION_POINTS;
    raw.clamp(0, 100) as u8
}

pub async fn weekly_session_stats(
    sessions: &dyn Store<Session>,
    owner: Option<&str>,
) -> Result<Vec<SessionDayPoint>, StoreError> {
    weekly_session_stats_at(sessions, owner, Local::now()).await
}

pub async fn weekly_session_stats_at<Tz: TimeZone>(
    sessions: &dyn Store<Session>,
    owner: Option<&str>,
    now: DateTime<Tz>,
) -> Result<Vec<SessionDayPoint>, StoreError> {
    let days = trailing_days(&now, TREND_DAYS);
    let filter = SessionFilter {
        completed: span(&days),
        ..SessionFilter::owned_by(owner)
    };
    let sessions = sessions.find(&filter, None, None).await?;
    Ok(session_points(&sessions, &days))
}

pub fn session_points(sessions: &[Session], days: &[DayWindow]) -> Vec<SessionDayPoint> {
    let mut points: Vec<SessionDayPoint> = days
        .iter()
        .map(|day| SessionDayPoint {
            date: date_key(day.date),
            ..SessionDayPoint::default()
        })
        .collect();

    for session in sessions {
        let Some(index) = days.iter().position(|day| day.contains(session.completed_at)) else {
            continue;
        };
        let point = &mut points[index];
        match session.kind {
            SessionKind::Work => {
                point.work_sessions += 1;
                point.work_time += u64::from(session.duration);
            }
            SessionKind::ShortBreak => point.short_breaks += 1,
            SessionKind::LongBreak => point.long_breaks += 1,
        }
    }
    points
}

fn span(days: &[DayWindow]) -> TimeRange {
    match (days.first(), days.last()) {
        (Some(first), Some(last)) => TimeRange::between(first.start, last.end),
        _ => TimeRange::default(),
    }
}
