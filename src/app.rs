use crate::handlers::{self, goals, sessions, tasks};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/stats-summary", get(handlers::stats_summary))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/recent", get(tasks::recent_tasks))
        .route("/tasks/filter/:preset", get(tasks::filter_tasks))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route("/goals/active", get(goals::active_goals))
        .route(
            "/goals/:id",
            get(goals::get_goal)
                .put(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route(
            "/goals/:id/progress",
            post(goals::record_progress).put(goals::record_progress),
        )
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route("/sessions/today", get(sessions::todays_sessions))
        .route("/sessions/weekly-stats", get(sessions::weekly_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
