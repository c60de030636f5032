use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::worker::{LedgerEntry, LedgerInput, LedgerKind},
};

/// Append-only penalty and bonus ledgers. Both tables share one shape.
pub struct LedgerStore {
    pool: DbPool,
}

impl LedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append an entry after checking the worker and the referenced order
    pub async fn add_entry(&self, kind: LedgerKind, entry: &LedgerInput) -> Result<LedgerEntry> {
        let worker = sqlx::query_scalar::<_, i64>("SELECT id FROM workers WHERE id = ?")
            .bind(entry.worker_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if worker.is_none() {
            return Err(AppError::not_found("Worker"));
        }

        if let Some(order_id) = entry.order_id {
            let order = sqlx::query_scalar::<_, i64>("SELECT id FROM orders WHERE id = ?")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::Database)?;
            if order.is_none() {
                return Err(AppError::not_found("Order"));
            }
        }

        let created = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            INSERT INTO {} (worker_id, delta, description, order_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
            kind.table()
        ))
        .bind(entry.worker_id)
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(entry.order_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(created)
    }

    /// All entries of one worker, newest first
    pub async fn get_entries(&self, kind: LedgerKind, worker_id: i64) -> Result<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(&format!(
            "SELECT * FROM {} WHERE worker_id = ? ORDER BY created_at DESC, id DESC",
            kind.table()
        ))
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory_pool, worker_store::WorkerStore},
        models::worker::WorkerInput,
    };

    async fn setup() -> (LedgerStore, i64) {
        let pool = memory_pool().await.unwrap();
        let worker = WorkerStore::new(pool.clone())
            .create_worker(&WorkerInput {
                name: "Anna".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        (LedgerStore::new(pool), worker.id)
    }

    fn entry(worker_id: i64, amount: i64, order_id: Option<i64>) -> LedgerInput {
        LedgerInput {
            worker_id,
            amount,
            description: "late".into(),
            order_id,
        }
    }

    #[tokio::test]
    async fn ledgers_are_kept_apart() {
        let (store, worker_id) = setup().await;
        store
            .add_entry(LedgerKind::Penalty, &entry(worker_id, 300, None))
            .await
            .unwrap();
        store
            .add_entry(LedgerKind::Bonus, &entry(worker_id, 500, None))
            .await
            .unwrap();
        store
            .add_entry(LedgerKind::Bonus, &entry(worker_id, 100, None))
            .await
            .unwrap();

        assert_eq!(store.get_entries(LedgerKind::Penalty, worker_id).await.unwrap().len(), 1);
        let bonuses = store.get_entries(LedgerKind::Bonus, worker_id).await.unwrap();
        assert_eq!(bonuses.iter().map(|b| b.delta).sum::<i64>(), 600);
    }

    #[tokio::test]
    async fn unknown_worker_is_rejected() {
        let (store, _) = setup().await;
        let err = store
            .add_entry(LedgerKind::Bonus, &entry(999, 100, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Worker"));
    }

    #[tokio::test]
    async fn unknown_order_reference_is_rejected() {
        let (store, worker_id) = setup().await;
        let err = store
            .add_entry(LedgerKind::Penalty, &entry(worker_id, 100, Some(12)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Order"));
    }
}
