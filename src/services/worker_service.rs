use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::{
    db::{
        DbPool, ledger_store::LedgerStore, order_store::OrderStore, user_store::UserStore,
        worker_store::WorkerStore,
    },
    error::{AppError, Result},
    models::{
        user::AuthUser,
        worker::{
            LedgerEntry, LedgerInput, LedgerKind, MAX_PERCENTAGE_RATE, SalaryReport, SalarySchema,
            Worker, WorkerInput, WorkerStatistics, compute_salary,
        },
    },
    services::auth_service::{check_credentials, hash_password},
};

/// Workers, their penalty and bonus ledgers, and pay derived from orders
pub struct WorkerService {
    workers: WorkerStore,
    ledger: LedgerStore,
    orders: OrderStore,
    users: UserStore,
}

impl WorkerService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            workers: WorkerStore::new(pool.clone()),
            ledger: LedgerStore::new(pool.clone()),
            orders: OrderStore::new(pool.clone()),
            users: UserStore::new(pool),
        }
    }

    /// Create a worker. With a password, a login account for the worker's
    /// email is opened in the same transaction.
    pub async fn create_worker(&self, mut input: WorkerInput) -> Result<Worker> {
        validate(&input)?;

        let Some(password) = input.password.take() else {
            let worker = self.workers.create_worker(&input).await?;
            tracing::info!(worker_id = worker.id, "worker created");
            return Ok(worker);
        };

        input.email = input.email.trim().to_lowercase();
        check_credentials(&input.email, &password)?;
        let password_hash = hash_password(&password)?;

        let (user, worker) = self
            .users
            .create_worker_account(&password_hash, &input)
            .await?;
        tracing::info!(worker_id = worker.id, user_id = user.id, "worker created with login");

        Ok(worker)
    }

    pub async fn get_all_workers(&self) -> Result<Vec<Worker>> {
        self.workers.get_all_workers().await
    }

    pub async fn get_worker(&self, id: i64) -> Result<Worker> {
        self.workers.get_worker_by_id(id).await
    }

    pub async fn get_worker_by_user_id(&self, user_id: i64) -> Result<Worker> {
        self.workers.get_worker_by_user_id(user_id).await
    }

    pub async fn update_worker(&self, id: i64, input: WorkerInput) -> Result<Worker> {
        validate(&input)?;

        let worker = self.workers.update_worker(id, &input).await?;
        tracing::info!(worker_id = id, "worker updated");

        Ok(worker)
    }

    pub async fn delete_worker(&self, id: i64) -> Result<()> {
        self.workers.delete_worker(id).await?;
        tracing::info!(worker_id = id, "worker deleted");

        Ok(())
    }

    pub async fn add_penalty(&self, input: LedgerInput) -> Result<LedgerEntry> {
        self.add_entry(LedgerKind::Penalty, input).await
    }

    pub async fn add_bonus(&self, input: LedgerInput) -> Result<LedgerEntry> {
        self.add_entry(LedgerKind::Bonus, input).await
    }

    pub async fn get_penalties(&self, worker_id: i64) -> Result<Vec<LedgerEntry>> {
        self.workers.get_worker_by_id(worker_id).await?;
        self.ledger.get_entries(LedgerKind::Penalty, worker_id).await
    }

    pub async fn get_bonuses(&self, worker_id: i64) -> Result<Vec<LedgerEntry>> {
        self.workers.get_worker_by_id(worker_id).await?;
        self.ledger.get_entries(LedgerKind::Bonus, worker_id).await
    }

    /// Orders, revenue and ledger sums of a worker over `[start, end)`
    pub async fn get_worker_statistics(
        &self,
        worker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WorkerStatistics> {
        if start >= end {
            return Err(AppError::validation("start must be before end"));
        }

        let stats = self.workers.get_statistics(worker_id, start, end).await?;
        tracing::debug!(
            worker_id,
            orders = stats.total_orders,
            revenue = stats.total_revenue,
            "worker statistics computed"
        );

        Ok(stats)
    }

    /// Pay for the 24 hours starting at `start`
    pub async fn salary(&self, worker_id: i64, start: DateTime<Utc>) -> Result<SalaryReport> {
        let worker = self.workers.get_worker_by_id(worker_id).await?;
        let end = start + Duration::hours(24);
        let revenue = self.orders.get_worker_revenue(worker_id, start, end).await?;

        let amount = compute_salary(worker.salary_schema, worker.salary, revenue)
            .ok_or_else(|| AppError::Internal(format!("salary of worker {worker_id} overflows")))?;

        Ok(SalaryReport {
            worker_id,
            window_start: start,
            window_end: end,
            salary_schema: worker.salary_schema,
            revenue,
            amount,
        })
    }

    /// Salary of the calling worker
    pub async fn own_salary(&self, caller: &AuthUser, start: DateTime<Utc>) -> Result<SalaryReport> {
        let worker = match self.workers.get_worker_by_user_id(caller.user_id).await {
            Ok(worker) => worker,
            Err(AppError::NotFound(_)) => return Err(AppError::Forbidden),
            Err(err) => return Err(err),
        };
        self.salary(worker.id, start).await
    }

    async fn add_entry(&self, kind: LedgerKind, input: LedgerInput) -> Result<LedgerEntry> {
        if input.amount == 0 {
            return Err(AppError::validation("amount must not be zero"));
        }

        let entry = self.ledger.add_entry(kind, &input).await?;
        tracing::info!(
            worker_id = entry.worker_id,
            ledger = kind.table(),
            delta = entry.delta,
            order_id = ?entry.order_id,
            "ledger entry added"
        );

        Ok(entry)
    }
}

fn validate(input: &WorkerInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("worker name is required"));
    }
    if input.salary < 0 {
        return Err(AppError::validation("salary must not be negative"));
    }
    if input.salary_schema == Some(SalarySchema::Percentage) && input.salary > MAX_PERCENTAGE_RATE {
        return Err(AppError::validation(format!(
            "percentage rate must not exceed {MAX_PERCENTAGE_RATE}"
        )));
    }
    Ok(())
}

/// Parse a query-string instant: a plain date means midnight UTC,
/// anything else must be RFC 3339.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::default()).and_utc());
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::validation(format!("invalid date: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_pool, models::user::SignInInput, services::AuthService};

    /// Contract and client that orders can point at
    async fn seed_client(pool: &DbPool) -> i64 {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO contracts (number, client_type, created_at, updated_at) VALUES ('C1', 'cash', ?, ?)",
        )
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO clients (name, client_type, contract_id, created_at, updated_at) VALUES ('K1', 'cash', 1, ?, ?) RETURNING id",
        )
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn order_at(pool: &DbPool, worker_id: i64, client_id: i64, total: i64, at: DateTime<Utc>) {
        sqlx::query(
            r#"
            INSERT INTO orders (status, worker_id, client_id, vehicle_number, payment_method, total_amount, created_at, updated_at)
            VALUES ('completed', ?, ?, 'A123BC77', 'cash', ?, ?, ?)
            "#,
        )
        .bind(worker_id)
        .bind(client_id)
        .bind(total)
        .bind(at)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn entry_at(pool: &DbPool, table: &str, worker_id: i64, delta: i64, at: DateTime<Utc>) {
        sqlx::query(&format!(
            "INSERT INTO {table} (worker_id, delta, created_at) VALUES (?, ?, ?)"
        ))
        .bind(worker_id)
        .bind(delta)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
    }

    #[test]
    fn plain_date_is_midnight_utc() {
        let instant = parse_instant("2025-03-01").unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-03-01T00:00:00+00:00");
        assert!(parse_instant("2025-03-01T10:00:00+03:00").is_ok());
        assert!(parse_instant("01.03.2025").is_err());
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let service = WorkerService::new(memory_pool().await.unwrap());
        let worker = service
            .create_worker(WorkerInput {
                name: "Anna".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = service
            .add_bonus(LedgerInput {
                worker_id: worker.id,
                amount: 0,
                description: String::new(),
                order_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn ledger_entries_shape_the_statistics() {
        let service = WorkerService::new(memory_pool().await.unwrap());
        let worker = service
            .create_worker(WorkerInput {
                name: "Anna".into(),
                salary_schema: Some(SalarySchema::Fixed),
                salary: 1_000,
                ..Default::default()
            })
            .await
            .unwrap();
        let start = Utc::now() - Duration::hours(1);

        for (amount, penalty) in [(200, false), (50, true)] {
            let input = LedgerInput {
                worker_id: worker.id,
                amount,
                description: String::new(),
                order_id: None,
            };
            if penalty {
                service.add_penalty(input).await.unwrap();
            } else {
                service.add_bonus(input).await.unwrap();
            }
        }

        let stats = service
            .get_worker_statistics(worker.id, start, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(stats.total_bonus, 200);
        assert_eq!(stats.total_penalties, 50);
        assert_eq!(stats.total_salary, 1_150);
        assert_eq!(service.get_penalties(worker.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fixed_salary_ignores_empty_day() {
        let service = WorkerService::new(memory_pool().await.unwrap());
        let worker = service
            .create_worker(WorkerInput {
                name: "Anna".into(),
                salary_schema: Some(SalarySchema::Fixed),
                salary: 2_500,
                ..Default::default()
            })
            .await
            .unwrap();

        let report = service
            .salary(worker.id, parse_instant("2020-01-01").unwrap())
            .await
            .unwrap();
        assert_eq!(report.revenue, 0);
        assert_eq!(report.amount, 2_500);
    }

    #[tokio::test]
    async fn reversed_range_is_rejected() {
        let service = WorkerService::new(memory_pool().await.unwrap());
        let now = Utc::now();
        assert!(matches!(
            service
                .get_worker_statistics(1, now, now - Duration::days(1))
                .await
                .unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn percentage_rate_above_hundred_is_rejected() {
        let service = WorkerService::new(memory_pool().await.unwrap());
        let input = WorkerInput {
            name: "Greedy".into(),
            salary_schema: Some(SalarySchema::Percentage),
            salary: 101,
            ..Default::default()
        };

        assert!(matches!(
            service.create_worker(input.clone()).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let fixed = service
            .create_worker(WorkerInput {
                salary_schema: Some(SalarySchema::Fixed),
                ..input.clone()
            })
            .await
            .unwrap();
        assert!(matches!(
            service.update_worker(fixed.id, input).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn overflowing_salary_is_an_error_not_a_panic() {
        let pool = memory_pool().await.unwrap();
        let service = WorkerService::new(pool.clone());
        let client = seed_client(&pool).await;
        let worker = service
            .create_worker(WorkerInput {
                name: "Rich".into(),
                salary_schema: Some(SalarySchema::Percentage),
                salary: 100,
                ..Default::default()
            })
            .await
            .unwrap();
        let start = parse_instant("2025-03-01").unwrap();
        order_at(&pool, worker.id, client, i64::MAX / 10, start).await;

        assert!(matches!(
            service.salary(worker.id, start).await.unwrap_err(),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn salary_window_includes_start_and_excludes_end() {
        let pool = memory_pool().await.unwrap();
        let service = WorkerService::new(pool.clone());
        let client = seed_client(&pool).await;
        let worker = service
            .create_worker(WorkerInput {
                name: "Oleg".into(),
                salary_schema: Some(SalarySchema::Percentage),
                salary: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        let start = parse_instant("2025-03-01").unwrap();
        let end = start + Duration::hours(24);

        order_at(&pool, worker.id, client, 1_000, start).await;
        order_at(&pool, worker.id, client, 2_000, end - Duration::seconds(1)).await;
        order_at(&pool, worker.id, client, 4_000, end).await;
        order_at(&pool, worker.id, client, 8_000, start - Duration::seconds(1)).await;

        let report = service.salary(worker.id, start).await.unwrap();
        assert_eq!(report.window_end, end);
        assert_eq!(report.revenue, 3_000);
        assert_eq!(report.amount, 300);
    }

    #[tokio::test]
    async fn statistics_leave_out_rows_outside_the_range() {
        let pool = memory_pool().await.unwrap();
        let service = WorkerService::new(pool.clone());
        let client = seed_client(&pool).await;
        let worker = service
            .create_worker(WorkerInput {
                name: "Anna".into(),
                salary_schema: Some(SalarySchema::Fixed),
                salary: 1_000,
                ..Default::default()
            })
            .await
            .unwrap();
        let start = parse_instant("2025-03-01").unwrap();
        let end = parse_instant("2025-04-01").unwrap();
        let before = start - Duration::seconds(1);

        order_at(&pool, worker.id, client, 500, start).await;
        order_at(&pool, worker.id, client, 700, end).await;
        order_at(&pool, worker.id, client, 900, before).await;
        entry_at(&pool, "bonuses", worker.id, 300, end - Duration::seconds(1)).await;
        entry_at(&pool, "bonuses", worker.id, 40, end).await;
        entry_at(&pool, "penalties", worker.id, 100, start).await;
        entry_at(&pool, "penalties", worker.id, 60, before).await;

        let stats = service
            .get_worker_statistics(worker.id, start, end)
            .await
            .unwrap();
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_revenue, 500);
        assert_eq!(stats.total_bonus, 300);
        assert_eq!(stats.total_penalties, 100);
        assert_eq!(stats.total_salary, 1_200);
    }

    #[tokio::test]
    async fn worker_created_with_password_can_log_in() {
        let pool = memory_pool().await.unwrap();
        let service = WorkerService::new(pool.clone());
        let auth = AuthService::new(pool, "secret", 1);

        let worker = service
            .create_worker(WorkerInput {
                name: "Pavel".into(),
                email: " Pavel@Shop.ru ".into(),
                password: Some("pavel-pass".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(worker.user_id.is_some());
        assert_eq!(worker.email, "pavel@shop.ru");

        let session = auth
            .login(SignInInput {
                email: "pavel@shop.ru".into(),
                password: "pavel-pass".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.worker_id, Some(worker.id));
        assert_eq!(
            service.get_worker_by_user_id(session.user.id).await.unwrap().id,
            worker.id
        );
    }

    #[tokio::test]
    async fn short_password_creates_nothing() {
        let service = WorkerService::new(memory_pool().await.unwrap());

        let err = service
            .create_worker(WorkerInput {
                name: "Pavel".into(),
                email: "pavel@shop.ru".into(),
                password: Some("123".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.get_all_workers().await.unwrap().is_empty());
    }
}
