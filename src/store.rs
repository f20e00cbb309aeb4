//! Record collections backed by the JSON data file.
//!
//! Every collection shares one snapshot of [`AppData`]. Writes clone the
//! snapshot, apply the change, persist it and only then publish it, so a
//! failed write leaves both memory and disk as they were.

use crate::models::{
    AppData, Goal, GoalFilter, GoalPatch, GoalSort, Session, SessionFilter, SessionSort, Task,
    TaskFilter, TaskPatch, TaskSort,
};
use crate::storage::persist_data;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{cmp::Ordering, convert::Infallible, marker::PhantomData, path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: &'static str, id: Uuid },
    #[error("{0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub descending: bool,
}

impl<K> Sort<K> {
    pub fn asc(key: K) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    pub fn desc(key: K) -> Self {
        Self {
            key,
            descending: true,
        }
    }
}

/// A persisted entity type and the query vocabulary of its collection.
pub trait Record: Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const LABEL: &'static str;

    type Filter: Send + Sync;
    type Patch: Send;
    type SortKey: Copy + Send + Sync;

    fn id(&self) -> Uuid;
    fn owner(&self) -> Option<&str>;
    fn matches(&self, filter: &Self::Filter) -> bool;
    fn compare(&self, other: &Self, key: Self::SortKey) -> Ordering;
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    fn rows(data: &AppData) -> &Vec<Self>;
    fn rows_mut(data: &mut AppData) -> &mut Vec<Self>;
}

#[async_trait]
pub trait Store<R: Record>: Send + Sync {
    async fn count(&self, filter: &R::Filter) -> Result<u64, StoreError>;

    async fn find(
        &self,
        filter: &R::Filter,
        sort: Option<Sort<R::SortKey>>,
        limit: Option<usize>,
    ) -> Result<Vec<R>, StoreError>;

    async fn insert(&self, record: R) -> Result<R, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<R>, StoreError>;

    async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<R, StoreError>;
}

fn owner_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| actual == Some(wanted))
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";
    const LABEL: &'static str = "Task";

    type Filter = TaskFilter;
    type Patch = TaskPatch;
    type SortKey = TaskSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn matches(&self, filter: &TaskFilter) -> bool {
        owner_matches(filter.owner.as_deref(), self.owner())
            && filter.status.is_none_or(|status| self.status == status)
            && filter.priority.is_none_or(|priority| self.priority == priority)
            && filter.due.contains(self.due_date)
            && filter.updated.contains(self.updated_at)
    }

    fn compare(&self, other: &Self, key: TaskSort) -> Ordering {
        match key {
            TaskSort::CreatedAt => self.created_at.cmp(&other.created_at),
            TaskSort::DueDate => self.due_date.cmp(&other.due_date),
        }
    }

    fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = now;
    }

    fn rows(data: &AppData) -> &Vec<Self> {
        &data.tasks
    }

    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.tasks
    }
}

impl Record for Goal {
    const COLLECTION: &'static str = "goals";
    const LABEL: &'static str = "Goal";

    type Filter = GoalFilter;
    type Patch = GoalPatch;
    type SortKey = GoalSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn matches(&self, filter: &GoalFilter) -> bool {
        owner_matches(filter.owner.as_deref(), self.owner())
            && filter.status.is_none_or(|status| self.status == status)
            && filter.deadline.contains(self.deadline)
    }

    fn compare(&self, other: &Self, key: GoalSort) -> Ordering {
        match key {
            GoalSort::Deadline => self.deadline.cmp(&other.deadline),
        }
    }

    fn apply(&mut self, patch: GoalPatch, now: DateTime<Utc>) {
        let progress_edited =
            patch.status.is_none() && (patch.current.is_some() || patch.target.is_some());
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(target) = patch.target {
            self.target = target;
        }
        if let Some(current) = patch.current {
            self.current = current;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        match patch.increment {
            Some(step) => self.record_progress(step),
            None => {
                if progress_edited {
                    self.reopen();
                }
                self.settle();
            }
        }
        self.updated_at = now;
    }

    fn rows(data: &AppData) -> &Vec<Self> {
        &data.goals
    }

    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.goals
    }
}

impl Record for Session {
    const COLLECTION: &'static str = "sessions";
    const LABEL: &'static str = "Session";

    type Filter = SessionFilter;
    // Sessions are immutable once logged.
    type Patch = Infallible;
    type SortKey = SessionSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn matches(&self, filter: &SessionFilter) -> bool {
        owner_matches(filter.owner.as_deref(), self.owner())
            && filter.kind.is_none_or(|kind| self.kind == kind)
            && filter.completed.contains(self.completed_at)
    }

    fn compare(&self, other: &Self, key: SessionSort) -> Ordering {
        match key {
            SessionSort::CompletedAt => self.completed_at.cmp(&other.completed_at),
        }
    }

    fn apply(&mut self, patch: Infallible, _now: DateTime<Utc>) {
        match patch {}
    }

    fn rows(data: &AppData) -> &Vec<Self> {
        &data.sessions
    }

    fn rows_mut(data: &mut AppData) -> &mut Vec<Self> {
        &mut data.sessions
    }
}

struct Shared {
    path: PathBuf,
    data: Mutex<AppData>,
}

/// Typed view over one collection of the shared data file.
pub struct Collection<R> {
    shared: Arc<Shared>,
    record: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            record: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    async fn write<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&mut Vec<R>) -> Result<T, StoreError> + Send,
    {
        let mut data = self.shared.data.lock().await;
        let mut next = data.clone();
        let outcome = change(R::rows_mut(&mut next))?;
        persist_data(&self.shared.path, &next).await?;
        *data = next;
        Ok(outcome)
    }

    fn not_found(id: Uuid) -> StoreError {
        StoreError::NotFound {
            collection: R::COLLECTION,
            id,
        }
    }
}

#[async_trait]
impl<R: Record> Store<R> for Collection<R> {
    async fn count(&self, filter: &R::Filter) -> Result<u64, StoreError> {
        let data = self.shared.data.lock().await;
        Ok(R::rows(&data).iter().filter(|row| row.matches(filter)).count() as u64)
    }

    async fn find(
        &self,
        filter: &R::Filter,
        sort: Option<Sort<R::SortKey>>,
        limit: Option<usize>,
    ) -> Result<Vec<R>, StoreError> {
        let mut rows: Vec<R> = {
            let data = self.shared.data.lock().await;
            R::rows(&data)
                .iter()
                .filter(|row| row.matches(filter))
                .cloned()
                .collect()
        };

        if let Some(sort) = sort {
            rows.sort_by(|a, b| {
                let ordering = a.compare(b, sort.key);
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, record: R) -> Result<R, StoreError> {
        self.write(move |rows| {
            rows.push(record.clone());
            Ok(record)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        let data = self.shared.data.lock().await;
        Ok(R::rows(&data).iter().find(|row| row.id() == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, StoreError> {
        self.write(move |rows| {
            let row = rows
                .iter_mut()
                .find(|row| row.id() == id)
                .ok_or_else(|| Self::not_found(id))?;
            row.apply(patch, Utc::now());
            Ok(row.clone())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<R, StoreError> {
        self.write(move |rows| {
            let index = rows
                .iter()
                .position(|row| row.id() == id)
                .ok_or_else(|| Self::not_found(id))?;
            Ok(rows.remove(index))
        })
        .await
    }
}

/// The three record stores behind one data file.
#[derive(Clone)]
pub struct Database {
    pub tasks: Collection<Task>,
    pub goals: Collection<Goal>,
    pub sessions: Collection<Session>,
}

impl Database {
    pub fn new(path: PathBuf, data: AppData) -> Self {
        let shared = Arc::new(Shared {
            path,
            data: Mutex::new(data),
        });
        Self {
            tasks: Collection {
                shared: Arc::clone(&shared),
                record: PhantomData,
            },
            goals: Collection {
                shared: Arc::clone(&shared),
                record: PhantomData,
            },
            sessions: Collection {
                shared,
                record: PhantomData,
            },
        }
    }
}
