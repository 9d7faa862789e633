use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::{
    error::AppError,
    scope::UserScope,
    storage::{load_json_or_default, persist_json},
};

use super::ledger::{LedgerSubscription, MealLedger, MealRecord, NewMeal};

type Records = HashMap<String, Vec<MealRecord>>;

/// File-backed ledger for the local, single-user mode. The whole store lives
/// in memory and every mutation rewrites `meals.json` atomically before the
/// change becomes visible, so a failed write never splits memory from disk.
///
/// Being in-process, this is the push-capable backend: each committed change
/// fans the scope's full record set out to subscribers.
pub struct LocalLedger {
    path: PathBuf,
    records: RwLock<Records>,
    watchers: Mutex<HashMap<String, broadcast::Sender<Vec<MealRecord>>>>,
}

impl LocalLedger {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let records: Records = load_json_or_default(&path)?;
        Ok(Self {
            path,
            records: RwLock::new(records),
            watchers: Mutex::new(HashMap::new()),
        })
    }

    fn notify(&self, key: &str, records: Vec<MealRecord>) {
        let watchers = self.watchers.lock().expect("watchers lock poisoned");
        if let Some(tx) = watchers.get(key) {
            // Nobody listening is fine.
            let _ = tx.send(records);
        }
    }
}

#[async_trait]
impl MealLedger for LocalLedger {
    async fn append(&self, scope: &UserScope, meal: NewMeal) -> Result<MealRecord, AppError> {
        let key = scope.key();
        let record = MealRecord {
            id: Uuid::new_v4(),
            timestamp: meal.timestamp,
            date: meal.date,
            ingredients: meal.ingredients,
            totals: meal.totals,
        };

        let mut records = self.records.write().await;
        let mut next = records.clone();
        next.entry(key.clone()).or_default().push(record.clone());

        persist_json(self.path.clone(), next.clone())
            .await
            .map_err(AppError::persistence)?;
        let scoped = next.get(&key).cloned().unwrap_or_default();
        *records = next;
        drop(records);

        self.notify(&key, scoped);
        Ok(record)
    }

    async fn remove(&self, scope: &UserScope, id: Uuid) -> Result<(), AppError> {
        let key = scope.key();

        let mut records = self.records.write().await;
        let mut next = records.clone();
        let scoped = next.entry(key.clone()).or_default();
        let before = scoped.len();
        scoped.retain(|r| r.id != id);
        if scoped.len() == before {
            return Err(AppError::NotFound);
        }

        persist_json(self.path.clone(), next.clone())
            .await
            .map_err(AppError::persistence)?;
        let scoped = next.get(&key).cloned().unwrap_or_default();
        *records = next;
        drop(records);

        self.notify(&key, scoped);
        Ok(())
    }

    async fn list_all(&self, scope: &UserScope) -> Result<Vec<MealRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records.get(&scope.key()).cloned().unwrap_or_default())
    }

    fn subscribe(&self, scope: &UserScope) -> Option<LedgerSubscription> {
        let mut watchers = self.watchers.lock().expect("watchers lock poisoned");
        let tx = watchers
            .entry(scope.key())
            .or_insert_with(|| broadcast::channel(16).0);
        Some(LedgerSubscription::new(tx.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::Totals;
    use serde_json::json;

    use crate::meals::ledger::Ingredient;

    fn sample_meal(timestamp: i64) -> NewMeal {
        NewMeal {
            timestamp,
            date: "01/03/2024 12:00:00".into(),
            ingredients: vec![Ingredient {
                name: "rice".into(),
                quantity: json!(100),
                unit: "g".into(),
            }],
            totals: Totals {
                calories: 130.0,
                protein: 2.7,
                carbs: 28.0,
                fats: 0.3,
                fiber: 0.4,
            },
        }
    }

    #[tokio::test]
    async fn append_then_list_then_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LocalLedger::open(dir.path().join("meals.json")).expect("open");
        let scope = UserScope::Local;

        let stored = ledger
            .append(&scope, sample_meal(1_000))
            .await
            .expect("append");

        let listed = ledger.list_all(&scope).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, stored.id);
        assert_eq!(listed[0].totals.calories, 130.0);

        ledger.remove(&scope, stored.id).await.expect("remove");
        assert!(ledger.list_all(&scope).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn remove_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LocalLedger::open(dir.path().join("meals.json")).expect("open");

        let err = ledger
            .remove(&UserScope::Local, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn records_survive_reopening_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("meals.json");
        let scope = UserScope::Local;

        let stored = {
            let ledger = LocalLedger::open(path.clone()).expect("open");
            ledger.append(&scope, sample_meal(42)).await.expect("append")
        };

        let reopened = LocalLedger::open(path).expect("reopen");
        let listed = reopened.list_all(&scope).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, stored.id);
        assert_eq!(listed[0].timestamp, 42);
    }

    #[tokio::test]
    async fn ids_are_unique_across_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LocalLedger::open(dir.path().join("meals.json")).expect("open");
        let scope = UserScope::Local;

        let a = ledger.append(&scope, sample_meal(1)).await.expect("append");
        let b = ledger.append(&scope, sample_meal(2)).await.expect("append");
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn scopes_do_not_leak_into_each_other() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LocalLedger::open(dir.path().join("meals.json")).expect("open");

        let alice = UserScope::User(Uuid::new_v4());
        let bob = UserScope::User(Uuid::new_v4());
        ledger.append(&alice, sample_meal(1)).await.expect("append");

        assert_eq!(ledger.list_all(&alice).await.expect("list").len(), 1);
        assert!(ledger.list_all(&bob).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_each_committed_change() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LocalLedger::open(dir.path().join("meals.json")).expect("open");
        let scope = UserScope::Local;

        let mut sub = ledger.subscribe(&scope).expect("local ledger pushes");

        let stored = ledger.append(&scope, sample_meal(7)).await.expect("append");
        let seen = sub.next().await.expect("update after append");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, stored.id);

        ledger.remove(&scope, stored.id).await.expect("remove");
        let seen = sub.next().await.expect("update after remove");
        assert!(seen.is_empty());

        sub.unsubscribe();
    }
}
