use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::worker::{Worker, WorkerInput, WorkerStatistics},
};

/// Worker store for database operations
pub struct WorkerStore {
    pool: DbPool,
}

impl WorkerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a worker without a login account
    pub async fn create_worker(&self, worker: &WorkerInput) -> Result<Worker> {
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;

        insert_worker(&mut conn, None, worker).await
    }

    pub async fn get_all_workers(&self) -> Result<Vec<Worker>> {
        let workers = sqlx::query_as::<_, Worker>("SELECT * FROM workers ORDER BY surname, name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(workers)
    }

    pub async fn get_worker_by_id(&self, id: i64) -> Result<Worker> {
        let worker = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Worker"))?;

        Ok(worker)
    }

    /// Worker row linked to a login account
    pub async fn get_worker_by_user_id(&self, user_id: i64) -> Result<Worker> {
        let worker = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Worker"))?;

        Ok(worker)
    }

    pub async fn update_worker(&self, id: i64, worker: &WorkerInput) -> Result<Worker> {
        let updated = sqlx::query_as::<_, Worker>(
            r#"
            UPDATE workers
            SET name = ?, surname = ?, email = ?, phone = ?, salary_schema = ?, salary = ?, has_car = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&worker.name)
        .bind(&worker.surname)
        .bind(&worker.email)
        .bind(&worker.phone)
        .bind(worker.salary_schema)
        .bind(worker.salary)
        .bind(worker.has_car)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found("Worker"))?;

        Ok(updated)
    }

    /// Delete a worker; refused while orders still point at it
    pub async fn delete_worker(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::referenced_or_database(e, "Worker"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Worker"));
        }

        Ok(())
    }

    /// Orders, revenue, bonuses and penalties of a worker in `[start, end)`.
    /// Every sum is zero when nothing matches.
    pub async fn get_statistics(
        &self,
        worker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WorkerStatistics> {
        let stats = sqlx::query_as::<_, WorkerStatistics>(
            r#"
            SELECT s.*, s.base_salary + s.total_bonus - s.total_penalties AS total_salary
            FROM (
                SELECT
                    w.id AS worker_id,
                    w.name AS worker_name,
                    w.surname AS worker_surname,
                    w.phone AS worker_phone,
                    w.salary_schema,
                    w.salary AS base_salary,
                    (SELECT COUNT(*) FROM orders o
                        WHERE o.worker_id = w.id AND o.created_at >= ? AND o.created_at < ?) AS total_orders,
                    (SELECT COALESCE(SUM(o.total_amount), 0) FROM orders o
                        WHERE o.worker_id = w.id AND o.created_at >= ? AND o.created_at < ?) AS total_revenue,
                    (SELECT COALESCE(SUM(b.delta), 0) FROM bonuses b
                        WHERE b.worker_id = w.id AND b.created_at >= ? AND b.created_at < ?) AS total_bonus,
                    (SELECT COALESCE(SUM(p.delta), 0) FROM penalties p
                        WHERE p.worker_id = w.id AND p.created_at >= ? AND p.created_at < ?) AS total_penalties
                FROM workers w
                WHERE w.id = ?
            ) s
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found("Worker"))?;

        Ok(stats)
    }
}

/// Insert a worker row, optionally linked to a login account. Runs on the
/// caller's connection so it can share a transaction with the user insert.
pub(crate) async fn insert_worker(
    conn: &mut SqliteConnection,
    user_id: Option<i64>,
    worker: &WorkerInput,
) -> Result<Worker> {
    let now = Utc::now();

    let created = sqlx::query_as::<_, Worker>(
        r#"
        INSERT INTO workers (user_id, name, surname, email, phone, salary_schema, salary, has_car, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&worker.name)
    .bind(&worker.surname)
    .bind(&worker.email)
    .bind(&worker.phone)
    .bind(worker.salary_schema)
    .bind(worker.salary)
    .bind(worker.has_car)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(AppError::Database)?;

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_pool, models::worker::SalarySchema};
    use chrono::Duration;

    fn input(name: &str) -> WorkerInput {
        WorkerInput {
            name: name.into(),
            salary_schema: Some(SalarySchema::Fixed),
            salary: 2_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_range_gives_zero_sums() {
        let store = WorkerStore::new(memory_pool().await.unwrap());
        let worker = store.create_worker(&input("Pyotr")).await.unwrap();
        let start = Utc::now() - Duration::days(7);

        let stats = store
            .get_statistics(worker.id, start, start + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, 0);
        assert_eq!(stats.total_bonus, 0);
        assert_eq!(stats.total_penalties, 0);
        assert_eq!(stats.total_salary, 2_000);
    }

    #[tokio::test]
    async fn statistics_for_unknown_worker_is_not_found() {
        let store = WorkerStore::new(memory_pool().await.unwrap());
        let now = Utc::now();

        let err = store
            .get_statistics(404, now, now + Duration::days(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_changes_salary_terms() {
        let store = WorkerStore::new(memory_pool().await.unwrap());
        let worker = store.create_worker(&input("Pyotr")).await.unwrap();

        let mut changed = input("Pyotr");
        changed.salary_schema = Some(SalarySchema::Percentage);
        changed.salary = 10;
        let updated = store.update_worker(worker.id, &changed).await.unwrap();

        assert_eq!(updated.salary_schema, Some(SalarySchema::Percentage));
        assert_eq!(updated.salary, 10);
        assert!(matches!(
            store.update_worker(999, &changed).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
