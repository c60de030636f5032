use chrono::{DateTime, Utc};

use crate::{
    db::{DbPool, order_store::OrderStore, worker_store::WorkerStore},
    error::{AppError, Result},
    models::{
        order::{Order, OrderDraft, OrderInput, OrderStatistics, OrderStatus},
        user::{AuthUser, Role},
    },
};

/// Composes, stores and reads work orders
pub struct OrderService {
    orders: OrderStore,
    workers: WorkerStore,
}

impl OrderService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            orders: OrderStore::new(pool.clone()),
            workers: WorkerStore::new(pool),
        }
    }

    /// Create an order for the caller. A worker always bills under their own
    /// worker record; a manager names the worker explicitly.
    pub async fn create_order(&self, caller: &AuthUser, input: OrderInput) -> Result<Order> {
        let worker_id = match caller.role {
            Role::Worker => self.own_worker_id(caller).await?,
            Role::Manager => input
                .worker_id
                .ok_or_else(|| AppError::validation("worker_id is required"))?,
        };
        let status = input.status.unwrap_or_default();
        let draft = build_draft(input, worker_id, status)?;

        let id = self.orders.create_order(&draft).await?;
        let order = self.orders.get_order_by_id(id).await?;
        tracing::info!(
            order_id = id,
            worker_id,
            client_id = order.client_id,
            total = order.total_amount,
            lines = order.services.len(),
            "order created"
        );

        Ok(order)
    }

    /// Replace header and line items of an order. Omitted status keeps the current one.
    pub async fn update_order(&self, id: i64, input: OrderInput) -> Result<Order> {
        let current = self.orders.get_order_by_id(id).await?;
        let worker_id = input
            .worker_id
            .ok_or_else(|| AppError::validation("worker_id is required"))?;
        let status = input.status.unwrap_or(current.status);
        let draft = build_draft(input, worker_id, status)?;

        self.orders.update_order(id, &draft).await?;
        let order = self.orders.get_order_by_id(id).await?;
        tracing::info!(order_id = id, total = order.total_amount, "order updated");

        Ok(order)
    }

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Order> {
        self.orders.update_status(id, status).await?;
        tracing::info!(order_id = id, ?status, "order status changed");

        self.orders.get_order_by_id(id).await
    }

    pub async fn delete_order(&self, id: i64) -> Result<()> {
        self.orders.delete_order(id).await?;
        tracing::info!(order_id = id, "order deleted");

        Ok(())
    }

    pub async fn get_order(&self, id: i64) -> Result<Order> {
        self.orders.get_order_by_id(id).await
    }

    pub async fn get_all_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.get_all_orders().await?;
        tracing::debug!(count = orders.len(), "orders loaded");

        Ok(orders)
    }

    pub async fn get_orders_by_worker(&self, worker_id: i64) -> Result<Vec<Order>> {
        self.workers.get_worker_by_id(worker_id).await?;
        self.orders.get_orders_by_worker(worker_id).await
    }

    pub async fn get_orders_by_worker_in_range(
        &self,
        worker_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        if start >= end {
            return Err(AppError::validation("start must be before end"));
        }
        self.workers.get_worker_by_id(worker_id).await?;
        self.orders
            .get_orders_by_worker_in_range(worker_id, start, end)
            .await
    }

    /// Orders of the calling worker
    pub async fn get_own_orders(&self, caller: &AuthUser) -> Result<Vec<Order>> {
        let worker_id = self.own_worker_id(caller).await?;
        self.orders.get_orders_by_worker(worker_id).await
    }

    pub async fn get_statistics(&self) -> Result<OrderStatistics> {
        self.orders.get_statistics().await
    }

    async fn own_worker_id(&self, caller: &AuthUser) -> Result<i64> {
        match self.workers.get_worker_by_user_id(caller.user_id).await {
            Ok(worker) => Ok(worker.id),
            Err(AppError::NotFound(_)) => {
                tracing::warn!(user_id = caller.user_id, "account has no worker record");
                Err(AppError::Forbidden)
            }
            Err(err) => Err(err),
        }
    }
}

/// Validate an order payload before anything is written
fn build_draft(input: OrderInput, worker_id: i64, status: OrderStatus) -> Result<OrderDraft> {
    let client_id = input
        .client_id
        .ok_or_else(|| AppError::validation("client_id is required"))?;
    let vehicle_number = input.vehicle_number.trim().to_uppercase();
    if vehicle_number.is_empty() {
        return Err(AppError::validation("vehicle_number is required"));
    }
    let payment_method = input
        .payment_method
        .ok_or_else(|| AppError::validation("payment_method is required"))?;
    if input.services.is_empty() {
        return Err(AppError::validation("order needs at least one service"));
    }
    for (index, line) in input.services.iter().enumerate() {
        if line.service_id <= 0 {
            return Err(AppError::validation(format!(
                "service line {} has no service_id",
                index + 1
            )));
        }
        if matches!(line.price, Some(price) if price <= 0) {
            return Err(AppError::validation(format!(
                "service line {} must have a positive price",
                index + 1
            )));
        }
    }

    Ok(OrderDraft {
        status,
        worker_id,
        client_id,
        vehicle_number,
        payment_method,
        lines: input.services,
    })
}
