use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{error::AppError, nutrition::Totals, scope::UserScope};

/// One entry of the in-progress recipe as the user typed it. `quantity`
/// stays untyped because clients send both `"200"` and `200`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub unit: String,
}

/// A persisted meal. Immutable once appended, except for deletion; `totals`
/// is the snapshot taken at calculation time and is never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealRecord {
    pub id: Uuid,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Display label stamped at save time.
    pub date: String,
    pub ingredients: Vec<Ingredient>,
    pub totals: Totals,
}

/// A meal awaiting persistence; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeal {
    pub timestamp: i64,
    pub date: String,
    pub ingredients: Vec<Ingredient>,
    pub totals: Totals,
}

/// Handle for a push feed of ledger changes. Dropping it (or calling
/// `unsubscribe`) detaches the watcher; nothing leaks across navigation.
pub struct LedgerSubscription {
    rx: broadcast::Receiver<Vec<MealRecord>>,
}

impl LedgerSubscription {
    pub(crate) fn new(rx: broadcast::Receiver<Vec<MealRecord>>) -> Self {
        Self { rx }
    }

    /// The next full record set, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Vec<MealRecord>> {
        loop {
            match self.rx.recv().await {
                Ok(records) => return Some(records),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

/// Backend-agnostic meal ledger. One implementation is picked at startup and
/// held behind `Arc<dyn MealLedger>`; nothing else in the crate branches on
/// the backend kind.
#[async_trait]
pub trait MealLedger: Send + Sync {
    /// Persist a meal and hand back the stored record, id assigned by the
    /// backend. Once this resolves the record is visible to `list_all`.
    async fn append(&self, scope: &UserScope, meal: NewMeal) -> Result<MealRecord, AppError>;

    /// Delete by id. An absent id is `AppError::NotFound`.
    async fn remove(&self, scope: &UserScope, id: Uuid) -> Result<(), AppError>;

    /// Every record for the scope, in no particular order; display sorting
    /// is the caller's job.
    async fn list_all(&self, scope: &UserScope) -> Result<Vec<MealRecord>, AppError>;

    /// Push feed of the full record set after each change. Only push-capable
    /// backends return one; polling backends return `None`.
    fn subscribe(&self, scope: &UserScope) -> Option<LedgerSubscription> {
        let _ = scope;
        None
    }
}
