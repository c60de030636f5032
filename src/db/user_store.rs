use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db::{DbPool, worker_store::insert_worker},
    error::{AppError, Result},
    models::{
        user::{Role, User},
        worker::{Worker, WorkerInput},
    },
};

/// User store for database operations
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    /// Create a new UserStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok(user)
    }

    /// Get a user by login email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(user)
    }

    /// Id of the worker row linked to a user, if any
    pub async fn get_worker_id(&self, user_id: i64) -> Result<Option<i64>> {
        let worker_id = sqlx::query_scalar::<_, i64>("SELECT id FROM workers WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(worker_id)
    }

    /// Create a user. A worker account gets its worker row in the same
    /// transaction, linked through `workers.user_id`.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<(User, Option<i64>)> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let user = insert_user(&mut tx, name, email, password_hash, role).await?;
        let worker_id = match role {
            Role::Worker => {
                let worker = WorkerInput {
                    name: name.to_string(),
                    email: email.to_string(),
                    ..Default::default()
                };
                Some(insert_worker(&mut tx, Some(user.id), &worker).await?.id)
            }
            Role::Manager => None,
        };

        tx.commit().await.map_err(AppError::Database)?;

        Ok((user, worker_id))
    }

    /// Open a login account for a fully described worker. The user and the
    /// worker row are written together or not at all.
    pub async fn create_worker_account(
        &self,
        password_hash: &str,
        worker: &WorkerInput,
    ) -> Result<(User, Worker)> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let user = insert_user(&mut tx, &worker.name, &worker.email, password_hash, Role::Worker)
            .await?;
        let worker = insert_worker(&mut tx, Some(user.id), worker).await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok((user, worker))
    }
}

async fn insert_user(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::unique_or_database(e, "Email is already registered"))
}
