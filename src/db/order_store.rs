use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::order::{
        Order, OrderDraft, OrderLine, OrderLineInput, OrderRow, OrderStatistics, OrderStatus,
        PricedLine,
    },
};

/// Work orders and their line items
pub struct OrderStore {
    pool: DbPool,
}

impl OrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Write the header and every line item in one transaction.
    /// Returns the id of the new order.
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        ensure_parties_exist(&mut tx, draft).await?;

        let order_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO orders (status, worker_id, client_id, vehicle_number, payment_method, total_amount, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING id
            "#,
        )
        .bind(draft.status)
        .bind(draft.worker_id)
        .bind(draft.client_id)
        .bind(&draft.vehicle_number)
        .bind(draft.payment_method)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        write_lines(&mut tx, order_id, &draft.lines).await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(order_id)
    }

    /// Replace the header and the full line-item list of an order
    pub async fn update_order(&self, id: i64, draft: &OrderDraft) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let current = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Order"))?;
        ensure_transition(current, draft.status)?;

        ensure_parties_exist(&mut tx, draft).await?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status = ?, worker_id = ?, client_id = ?, vehicle_number = ?, payment_method = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(draft.status)
        .bind(draft.worker_id)
        .bind(draft.client_id)
        .bind(&draft.vehicle_number)
        .bind(draft.payment_method)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM order_services WHERE order_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        write_lines(&mut tx, id, &draft.lines).await?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }

    /// Move an order forward in its lifecycle
    pub async fn update_status(&self, id: i64, status: OrderStatus) -> Result<()> {
        let current = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Order"))?;
        ensure_transition(current, status)?;

        // The status guard keeps a concurrent backward move from slipping in
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .bind(current)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("order status changed concurrently".into()));
        }

        Ok(())
    }

    pub async fn delete_order(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Order"));
        }

        Ok(())
    }

    pub async fn get_order_by_id(&self, id: i64) -> Result<Order> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::not_found("Order"))?;

        let mut orders = self.attach_lines(vec![row]).await?;
        orders.pop().ok_or_else(|| AppError::not_found("Order"))
    }

    pub async fn get_all_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        self.attach_lines(rows).await
    }

    pub async fn get_orders_by_worker(&self, worker_id: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE worker_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.attach_lines(rows).await
    }

    /// Orders of a worker created in `[start, end)`
    pub async fn get_orders_by_worker_in_range(
        &self,
        worker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT * FROM orders
            WHERE worker_id = ? AND created_at >= ? AND created_at < ?
            ORDER BY created_at, id
            "#,
        )
        .bind(worker_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.attach_lines(rows).await
    }

    /// Summed order revenue of a worker in `[start, end)`
    pub async fn get_worker_revenue(
        &self,
        worker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let revenue = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(total_amount), 0) FROM orders
            WHERE worker_id = ? AND created_at >= ? AND created_at < ?
            "#,
        )
        .bind(worker_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(revenue)
    }

    /// Shop-wide aggregate over all orders
    pub async fn get_statistics(&self) -> Result<OrderStatistics> {
        let stats = sqlx::query_as::<_, OrderStatistics>(
            r#"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(total_amount), 0) AS total_revenue,
                COUNT(DISTINCT worker_id) AS total_workers,
                COUNT(DISTINCT client_id) AS total_clients,
                CAST(COALESCE(AVG(total_amount), 0) AS REAL) AS average_order_value
            FROM orders
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(stats)
    }

    /// Load the line items of all given orders with one query
    async fn attach_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM order_services WHERE order_id IN (");
        let mut ids = query.separated(", ");
        for row in &rows {
            ids.push_bind(row.id);
        }
        query.push(") ORDER BY order_id, id");

        let lines = query
            .build_query_as::<OrderLine>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(line);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let services = by_order.remove(&row.id).unwrap_or_default();
                Order::from_parts(row, services)
            })
            .collect())
    }
}

fn ensure_transition(current: OrderStatus, next: OrderStatus) -> Result<()> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "order status cannot move back from {current:?} to {next:?}"
        )))
    }
}

async fn ensure_parties_exist(conn: &mut SqliteConnection, draft: &OrderDraft) -> Result<()> {
    let client = sqlx::query_scalar::<_, i64>("SELECT id FROM clients WHERE id = ?")
        .bind(draft.client_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    if client.is_none() {
        return Err(AppError::not_found("Client"));
    }

    let worker = sqlx::query_scalar::<_, i64>("SELECT id FROM workers WHERE id = ?")
        .bind(draft.worker_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    if worker.is_none() {
        return Err(AppError::not_found("Worker"));
    }

    Ok(())
}

/// Fix the price of one line: an explicit price is kept, an omitted one is
/// taken from the catalog row it references.
async fn price_line(conn: &mut SqliteConnection, line: &OrderLineInput) -> Result<PricedLine> {
    let catalog_price = sqlx::query_scalar::<_, i64>("SELECT price FROM services WHERE id = ?")
        .bind(line.service_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::not_found(format!("Service {}", line.service_id)))?;

    let price = line.price.unwrap_or(catalog_price);
    if price <= 0 {
        return Err(AppError::validation(format!(
            "line item for service {} must have a positive price",
            line.service_id
        )));
    }

    Ok(PricedLine {
        service_id: line.service_id,
        description: line.description.clone(),
        wheel_position: line.wheel_position,
        price,
    })
}

/// Insert the line items and set the order total to their sum
async fn write_lines(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[OrderLineInput],
) -> Result<i64> {
    let mut total = 0i64;

    for line in lines {
        let priced = price_line(conn, line).await?;

        sqlx::query(
            r#"
            INSERT INTO order_services (order_id, service_id, service_description, wheel_position, price)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(priced.service_id)
        .bind(&priced.description)
        .bind(priced.wheel_position)
        .bind(priced.price)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        total = total
            .checked_add(priced.price)
            .ok_or_else(|| AppError::validation("order total is out of range"))?;
    }

    sqlx::query("UPDATE orders SET total_amount = ? WHERE id = ?")
        .bind(total)
        .bind(order_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    Ok(total)
}
