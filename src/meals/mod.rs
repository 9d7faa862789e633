mod dto;
pub mod handlers;
pub mod ledger;
pub mod local;
pub mod pg;
pub mod rollup;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meals", get(handlers::list_meals).post(handlers::save_meal))
        .route("/meals/watch", get(handlers::watch_meals))
        .route("/meals/:id", delete(handlers::delete_meal))
        .route("/meals/summary/today", get(handlers::today_summary))
        .route("/meals/summary/week", get(handlers::week_summary))
}
