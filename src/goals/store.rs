use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    scope::UserScope,
    storage::{load_json_or_default, persist_json},
};

/// Daily nutrient targets. One profile per scope, created from defaults on
/// first use and only ever replaced whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProfile {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fibers: f64,
}

impl Default for GoalProfile {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbs: 200.0,
            fats: 70.0,
            fibers: 30.0,
        }
    }
}

/// Profile storage. A missing or corrupt profile is "absent", never an
/// error: `load` substitutes defaults and persists them so the next read is
/// identical. `save` replaces all five fields together.
#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn load(&self, scope: &UserScope) -> Result<GoalProfile, AppError>;
    async fn save(&self, scope: &UserScope, profile: &GoalProfile) -> Result<(), AppError>;
}

type Profiles = HashMap<String, GoalProfile>;

pub struct LocalGoalStore {
    path: PathBuf,
    profiles: RwLock<Profiles>,
}

impl LocalGoalStore {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let profiles: Profiles = load_json_or_default(&path)?;
        Ok(Self {
            path,
            profiles: RwLock::new(profiles),
        })
    }
}

#[async_trait]
impl GoalStore for LocalGoalStore {
    async fn load(&self, scope: &UserScope) -> Result<GoalProfile, AppError> {
        let key = scope.key();
        {
            let profiles = self.profiles.read().await;
            if let Some(profile) = profiles.get(&key) {
                return Ok(profile.clone());
            }
        }

        // First read for this scope: persist the defaults so future loads
        // are stable.
        let defaults = GoalProfile::default();
        let mut profiles = self.profiles.write().await;
        if let Some(profile) = profiles.get(&key) {
            return Ok(profile.clone());
        }
        let mut next = profiles.clone();
        next.insert(key, defaults.clone());
        persist_json(self.path.clone(), next.clone())
            .await
            .map_err(AppError::persistence)?;
        *profiles = next;
        Ok(defaults)
    }

    async fn save(&self, scope: &UserScope, profile: &GoalProfile) -> Result<(), AppError> {
        let mut profiles = self.profiles.write().await;
        let mut next = profiles.clone();
        next.insert(scope.key(), profile.clone());
        persist_json(self.path.clone(), next.clone())
            .await
            .map_err(AppError::persistence)?;
        *profiles = next;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct GoalRow {
    calories: f64,
    protein: f64,
    carbs: f64,
    fats: f64,
    fibers: f64,
}

impl From<GoalRow> for GoalProfile {
    fn from(row: GoalRow) -> Self {
        Self {
            calories: row.calories,
            protein: row.protein,
            carbs: row.carbs,
            fats: row.fats,
            fibers: row.fibers,
        }
    }
}

pub struct PgGoalStore {
    db: PgPool,
}

impl PgGoalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GoalStore for PgGoalStore {
    async fn load(&self, scope: &UserScope) -> Result<GoalProfile, AppError> {
        let key = scope.key();
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT calories, protein, carbs, fats, fibers
            FROM goal_profiles
            WHERE user_scope = $1
            "#,
        )
        .bind(&key)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::persistence)?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // Set-if-absent, then read back so a concurrent first load still
        // observes one stable profile.
        let defaults = GoalProfile::default();
        sqlx::query(
            r#"
            INSERT INTO goal_profiles (user_scope, calories, protein, carbs, fats, fibers)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_scope) DO NOTHING
            "#,
        )
        .bind(&key)
        .bind(defaults.calories)
        .bind(defaults.protein)
        .bind(defaults.carbs)
        .bind(defaults.fats)
        .bind(defaults.fibers)
        .execute(&self.db)
        .await
        .map_err(AppError::persistence)?;

        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT calories, protein, carbs, fats, fibers
            FROM goal_profiles
            WHERE user_scope = $1
            "#,
        )
        .bind(&key)
        .fetch_one(&self.db)
        .await
        .map_err(AppError::persistence)?;
        Ok(row.into())
    }

    async fn save(&self, scope: &UserScope, profile: &GoalProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO goal_profiles (user_scope, calories, protein, carbs, fats, fibers)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_scope) DO UPDATE
            SET calories = EXCLUDED.calories,
                protein = EXCLUDED.protein,
                carbs = EXCLUDED.carbs,
                fats = EXCLUDED.fats,
                fibers = EXCLUDED.fibers
            "#,
        )
        .bind(scope.key())
        .bind(profile.calories)
        .bind(profile.protein)
        .bind(profile.carbs)
        .bind(profile.fats)
        .bind(profile.fibers)
        .execute(&self.db)
        .await
        .map_err(AppError::persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_load_persists_the_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("goals.json");
        let scope = UserScope::Local;

        let store = LocalGoalStore::open(path.clone()).expect("open");
        let first = store.load(&scope).await.expect("load");
        assert_eq!(first, GoalProfile::default());

        let second = store.load(&scope).await.expect("load again");
        assert_eq!(second, first);

        // The defaults were written, not regenerated: a fresh store sees them.
        let reopened = LocalGoalStore::open(path).expect("reopen");
        let third = reopened.load(&scope).await.expect("load after reopen");
        assert_eq!(third, first);
    }

    #[tokio::test]
    async fn save_overwrites_all_fields_together() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalGoalStore::open(dir.path().join("goals.json")).expect("open");
        let scope = UserScope::Local;

        let custom = GoalProfile {
            calories: 2500.0,
            protein: 180.0,
            carbs: 250.0,
            fats: 80.0,
            fibers: 35.0,
        };
        store.save(&scope, &custom).await.expect("save");
        assert_eq!(store.load(&scope).await.expect("load"), custom);
    }

    #[tokio::test]
    async fn corrupt_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("goals.json");
        std::fs::write(&path, b"}}} definitely not json").expect("write garbage");

        let store = LocalGoalStore::open(path).expect("open tolerates corruption");
        let profile = store.load(&UserScope::Local).await.expect("load");
        assert_eq!(profile, GoalProfile::default());
    }

    #[tokio::test]
    async fn scopes_have_independent_profiles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalGoalStore::open(dir.path().join("goals.json")).expect("open");

        let alice = UserScope::User(uuid::Uuid::new_v4());
        let custom = GoalProfile {
            calories: 1800.0,
            ..GoalProfile::default()
        };
        store.save(&alice, &custom).await.expect("save");

        assert_eq!(store.load(&alice).await.expect("load"), custom);
        assert_eq!(
            store.load(&UserScope::Local).await.expect("load"),
            GoalProfile::default()
        );
    }
}
