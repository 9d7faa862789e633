use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{error::AppError, nutrition::Totals, scope::UserScope};

use super::ledger::{Ingredient, MealLedger, MealRecord, NewMeal};

#[derive(Debug, FromRow)]
struct MealRow {
    id: Uuid,
    logged_at_ms: i64,
    logged_at_label: String,
    ingredients: Json<Vec<Ingredient>>,
    totals: Json<Totals>,
}

impl From<MealRow> for MealRecord {
    fn from(row: MealRow) -> Self {
        Self {
            id: row.id,
            timestamp: row.logged_at_ms,
            date: row.logged_at_label,
            ingredients: row.ingredients.0,
            totals: row.totals.0,
        }
    }
}

/// Postgres-backed ledger for the cloud mode. Ids come from the database
/// (`DEFAULT gen_random_uuid()`); ingredient and totals snapshots ride as
/// JSONB. This backend is polled, so `subscribe` stays `None`.
pub struct PgLedger {
    db: PgPool,
}

impl PgLedger {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealLedger for PgLedger {
    async fn append(&self, scope: &UserScope, meal: NewMeal) -> Result<MealRecord, AppError> {
        let row = sqlx::query_as::<_, MealRow>(
            r#"
            INSERT INTO meals (user_scope, logged_at_ms, logged_at_label, ingredients, totals)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, logged_at_ms, logged_at_label, ingredients, totals
            "#,
        )
        .bind(scope.key())
        .bind(meal.timestamp)
        .bind(&meal.date)
        .bind(Json(&meal.ingredients))
        .bind(Json(&meal.totals))
        .fetch_one(&self.db)
        .await
        .map_err(AppError::persistence)?;
        Ok(row.into())
    }

    async fn remove(&self, scope: &UserScope, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM meals
            WHERE id = $1 AND user_scope = $2
            "#,
        )
        .bind(id)
        .bind(scope.key())
        .execute(&self.db)
        .await
        .map_err(AppError::persistence)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_all(&self, scope: &UserScope) -> Result<Vec<MealRecord>, AppError> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, logged_at_ms, logged_at_label, ingredients, totals
            FROM meals
            WHERE user_scope = $1
            ORDER BY logged_at_ms DESC
            "#,
        )
        .bind(scope.key())
        .fetch_all(&self.db)
        .await
        .map_err(AppError::persistence)?;
        Ok(rows.into_iter().map(MealRecord::from).collect())
    }
}
