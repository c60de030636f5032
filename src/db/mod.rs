use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Sqlite, migrate::MigrateDatabase, sqlite::SqlitePoolOptions};
use std::time::Duration;

pub mod booking_store;
pub mod client_store;
pub mod contract_store;
pub mod inventory_store;
pub mod ledger_store;
pub mod order_store;
pub mod service_store;
pub mod user_store;
pub mod worker_store;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    // Create the database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    setup_database(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory pool with the full schema, for tests
pub async fn memory_pool() -> Result<DbPool> {
    init_db_pool("sqlite::memory:", 1).await
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('worker', 'manager')),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contracts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        number TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        client_company_name TEXT NOT NULL DEFAULT '',
        client_company_address TEXT NOT NULL DEFAULT '',
        client_company_phone TEXT NOT NULL DEFAULT '',
        client_company_email TEXT NOT NULL DEFAULT '',
        client_company_inn TEXT NOT NULL DEFAULT '',
        client_company_kpp TEXT NOT NULL DEFAULT '',
        client_company_ogrn TEXT NOT NULL DEFAULT '',
        client_type TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS material_cards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT '',
        rs25 INTEGER NOT NULL DEFAULT 0 CHECK (rs25 >= 0),
        r19 INTEGER NOT NULL DEFAULT 0 CHECK (r19 >= 0),
        r20 INTEGER NOT NULL DEFAULT 0 CHECK (r20 >= 0),
        r25 INTEGER NOT NULL DEFAULT 0 CHECK (r25 >= 0),
        r251 INTEGER NOT NULL DEFAULT 0 CHECK (r251 >= 0),
        r13 INTEGER NOT NULL DEFAULT 0 CHECK (r13 >= 0),
        r15 INTEGER NOT NULL DEFAULT 0 CHECK (r15 >= 0),
        foot9 INTEGER NOT NULL DEFAULT 0 CHECK (foot9 >= 0),
        foot12 INTEGER NOT NULL DEFAULT 0 CHECK (foot12 >= 0),
        foot15 INTEGER NOT NULL DEFAULT 0 CHECK (foot15 >= 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price INTEGER NOT NULL CHECK (price >= 0),
        contract_id INTEGER NOT NULL REFERENCES contracts(id),
        material_card_id INTEGER REFERENCES material_cards(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_services_contract ON services(contract_id)",
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        client_type TEXT NOT NULL,
        owner_phone TEXT NOT NULL DEFAULT '',
        manager_phone TEXT NOT NULL DEFAULT '',
        contract_id INTEGER NOT NULL REFERENCES contracts(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cars (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        number TEXT NOT NULL UNIQUE,
        model TEXT NOT NULL DEFAULT '',
        year INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients_cars (
        client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
        PRIMARY KEY (client_id, car_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER UNIQUE REFERENCES users(id) ON DELETE SET NULL,
        name TEXT NOT NULL,
        surname TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        salary_schema TEXT,
        salary INTEGER NOT NULL DEFAULT 0,
        has_car INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        status TEXT NOT NULL,
        worker_id INTEGER NOT NULL REFERENCES workers(id),
        client_id INTEGER NOT NULL REFERENCES clients(id),
        vehicle_number TEXT NOT NULL,
        payment_method TEXT NOT NULL,
        total_amount INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_worker_created ON orders(worker_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS order_services (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        service_id INTEGER NOT NULL,
        service_description TEXT NOT NULL DEFAULT '',
        wheel_position TEXT NOT NULL,
        price INTEGER NOT NULL CHECK (price > 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_order_services_order ON order_services(order_id)",
    r#"
    CREATE TABLE IF NOT EXISTS penalties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL REFERENCES workers(id) ON DELETE CASCADE,
        delta INTEGER NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        order_id INTEGER REFERENCES orders(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bonuses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_id INTEGER NOT NULL REFERENCES workers(id) ON DELETE CASCADE,
        delta INTEGER NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        order_id INTEGER REFERENCES orders(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS storage (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        rs25 INTEGER NOT NULL DEFAULT 0 CHECK (rs25 >= 0),
        r19 INTEGER NOT NULL DEFAULT 0 CHECK (r19 >= 0),
        r20 INTEGER NOT NULL DEFAULT 0 CHECK (r20 >= 0),
        r25 INTEGER NOT NULL DEFAULT 0 CHECK (r25 >= 0),
        r251 INTEGER NOT NULL DEFAULT 0 CHECK (r251 >= 0),
        r13 INTEGER NOT NULL DEFAULT 0 CHECK (r13 >= 0),
        r15 INTEGER NOT NULL DEFAULT 0 CHECK (r15 >= 0),
        foot9 INTEGER NOT NULL DEFAULT 0 CHECK (foot9 >= 0),
        foot12 INTEGER NOT NULL DEFAULT 0 CHECK (foot12 >= 0),
        foot15 INTEGER NOT NULL DEFAULT 0 CHECK (foot15 >= 0),
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS materials (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        type_ds INTEGER NOT NULL DEFAULT 0,
        storage INTEGER NOT NULL DEFAULT 0 CHECK (storage >= 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (name, type_ds)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        car_number TEXT NOT NULL,
        client_desc TEXT NOT NULL DEFAULT '',
        manager_desc TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

/// Set up the database schema
async fn setup_database(pool: &DbPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    // The storage table holds exactly one row
    sqlx::query("INSERT OR IGNORE INTO storage (id, updated_at) VALUES (1, ?)")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_setup_is_idempotent() {
        let pool = memory_pool().await.unwrap();
        setup_database(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM storage")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
