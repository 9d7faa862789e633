mod dto;
pub mod handlers;
pub mod store;

pub use self::store::{GoalProfile, GoalStore, LocalGoalStore, PgGoalStore};

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/goals", get(handlers::get_goals).put(handlers::put_goals))
}
