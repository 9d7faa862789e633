pub mod aggregate;
mod dto;
pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod service;

pub use self::aggregate::Totals;

use axum::{routing::post, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/nutrition/calculate", post(handlers::calculate))
}
