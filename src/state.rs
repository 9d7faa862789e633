use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::{
    ai::{ChatCompletionsClient, CompletionClient},
    auth::jwt::JwtKeys,
    config::{AppConfig, StorageBackend},
    goals::{GoalStore, LocalGoalStore, PgGoalStore},
    meals::{ledger::MealLedger, local::LocalLedger, pg::PgLedger},
};

/// Cloud-mode extras: the user table lives in the same pool as the stores.
#[derive(Clone)]
pub struct Accounts {
    pub db: PgPool,
    pub keys: JwtKeys,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<dyn MealLedger>,
    pub goals: Arc<dyn GoalStore>,
    pub model: Arc<dyn CompletionClient>,
    pub accounts: Option<Accounts>,
}

impl AppState {
    /// Build the whole session: backend pair, model client, accounts. The
    /// storage backend is picked here, once; nothing downstream branches on
    /// it again.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let model: Arc<dyn CompletionClient> =
            Arc::new(ChatCompletionsClient::new(config.model.clone())?);

        match config.backend {
            StorageBackend::Local => {
                let ledger = Arc::new(LocalLedger::open(config.data_dir.join("meals.json"))?)
                    as Arc<dyn MealLedger>;
                let goals = Arc::new(LocalGoalStore::open(config.data_dir.join("goals.json"))?)
                    as Arc<dyn GoalStore>;
                Ok(Self {
                    config,
                    ledger,
                    goals,
                    model,
                    accounts: None,
                })
            }
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing for postgres backend")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed or folder missing; continuing");
                }

                let jwt = config
                    .jwt
                    .as_ref()
                    .context("JWT config missing for postgres backend")?;
                let keys = JwtKeys::from_config(jwt);

                let ledger = Arc::new(PgLedger::new(db.clone())) as Arc<dyn MealLedger>;
                let goals = Arc::new(PgGoalStore::new(db.clone())) as Arc<dyn GoalStore>;
                Ok(Self {
                    config,
                    ledger,
                    goals,
                    model,
                    accounts: Some(Accounts { db, keys }),
                })
            }
        }
    }
}

#[cfg(test)]
impl AppState {
    /// Local stores in a temp dir plus a canned model response; enough to
    /// drive handlers without network or a database.
    pub fn for_tests(dir: &std::path::Path, canned_response: &str) -> Self {
        use crate::error::AppError;
        use async_trait::async_trait;

        struct CannedModel(String);

        #[async_trait]
        impl CompletionClient for CannedModel {
            async fn complete(&self, _prompt: &str) -> Result<String, AppError> {
                Ok(self.0.clone())
            }
        }

        let config = Arc::new(AppConfig {
            backend: StorageBackend::Local,
            database_url: None,
            data_dir: dir.to_path_buf(),
            model: crate::config::ModelConfig {
                base_url: "http://localhost:0".into(),
                api_key: None,
                model: "test".into(),
            },
            jwt: None,
            utc_offset_hours: 0,
        });

        let ledger = Arc::new(LocalLedger::open(dir.join("meals.json")).expect("open test ledger"))
            as Arc<dyn MealLedger>;
        let goals = Arc::new(LocalGoalStore::open(dir.join("goals.json")).expect("open test goals"))
            as Arc<dyn GoalStore>;

        Self {
            config,
            ledger,
            goals,
            model: Arc::new(CannedModel(canned_response.to_string())),
            accounts: None,
        }
    }
}
