use axum::{extract::State, Json};
use tracing::{info, instrument};

use crate::{error::AppError, scope::Scope, state::AppState};

use super::{dto::CalculateRequest, service, service::Estimate};

#[instrument(skip(state, payload))]
pub async fn calculate(
    State(state): State<AppState>,
    Scope(_scope): Scope,
    Json(payload): Json<CalculateRequest>,
) -> Result<Json<Estimate>, AppError> {
    if payload.ingredients.is_empty() {
        return Err(AppError::invalid("add at least one ingredient"));
    }

    let estimate = service::estimate(state.model.as_ref(), &payload.ingredients).await?;
    info!(
        items = estimate.items.len(),
        calories = estimate.totals.calories,
        "nutrition estimated"
    );
    Ok(Json(estimate))
}
