use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    http::{Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    db::DbPool,
    services::{
        AuthService, BookingService, CatalogService, ClientService, InventoryService,
        OrderService, WorkerService,
    },
};

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod clients;
pub mod inventory;
pub mod orders;
pub mod workers;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub orders: Arc<OrderService>,
    pub workers: Arc<WorkerService>,
    pub clients: Arc<ClientService>,
    pub catalog: Arc<CatalogService>,
    pub inventory: Arc<InventoryService>,
    pub bookings: Arc<BookingService>,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        Self {
            auth: Arc::new(AuthService::new(
                pool.clone(),
                config.jwt_secret.clone(),
                config.jwt_expiration_hours,
            )),
            orders: Arc::new(OrderService::new(pool.clone())),
            workers: Arc::new(WorkerService::new(pool.clone())),
            clients: Arc::new(ClientService::new(pool.clone())),
            catalog: Arc::new(CatalogService::new(pool.clone())),
            inventory: Arc::new(InventoryService::new(pool.clone())),
            bookings: Arc::new(BookingService::new(pool)),
        }
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Build the full HTTP router
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/date", post(bookings::create_booking))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register));

    let shared = Router::new()
        .route("/api/services", get(catalog::get_all_services))
        .route(
            "/api/services/{contract_id}/prices",
            get(catalog::get_service_prices_by_contract),
        )
        .route("/api/client-types", get(clients::get_client_types))
        .route("/api/clients", get(clients::get_all_clients));

    let worker = Router::new()
        .route("/api/worker", get(orders::get_own_orders).post(orders::create_order))
        .route("/api/worker/salary", get(workers::get_own_salary))
        .route_layer(middleware::from_fn(auth::require_worker));

    let manager = Router::new()
        .nest("/api/manager", manager_routes())
        .route_layer(middleware::from_fn(auth::require_manager));

    let protected = Router::new()
        .merge(shared)
        .merge(worker)
        .merge(manager)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn manager_routes() -> Router<AppState> {
    Router::new()
        // Orders
        .route("/orders", get(orders::get_all_orders).post(orders::create_order))
        .route(
            "/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/orders/{id}/status", put(orders::update_order_status))
        .route("/statistics", get(orders::get_statistics))
        // Clients and vehicles
        .route("/clients", get(clients::get_all_clients).post(clients::create_client))
        .route(
            "/clients/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/clients/{id}/vehicles",
            get(clients::get_client_cars).post(clients::add_car_to_client),
        )
        .route("/clients/{id}/vehicles/import", post(clients::import_vehicles))
        .route("/clients/whose/{car}", get(clients::whose_car))
        .route("/clients/compare/{car}", get(clients::compare_clients_for_car))
        .route(
            "/clients/bookings",
            get(bookings::get_bookings).post(bookings::create_booking),
        )
        .route("/clients/bookings/{id}", put(bookings::update_booking))
        // Workers
        .route("/workers", get(workers::get_all_workers).post(workers::create_worker))
        .route(
            "/workers/{id}",
            get(workers::get_worker)
                .put(workers::update_worker)
                .delete(workers::delete_worker),
        )
        .route("/workers/{id}/orders", get(orders::get_orders_by_worker))
        .route("/workers/{id}/salary", get(workers::get_salary))
        .route("/workers/penalties", post(workers::add_penalty))
        .route("/workers/penalties/{id}", get(workers::get_penalties))
        .route("/workers/bonuses", post(workers::add_bonus))
        .route("/workers/bonuses/{id}", get(workers::get_bonuses))
        .route("/workers/statistics/{id}", get(workers::get_worker_statistics))
        // Catalog
        .route("/services", get(catalog::get_all_services).post(catalog::create_service))
        .route("/services/with-prices", get(catalog::get_all_with_prices))
        .route(
            "/services/{id}",
            put(catalog::update_service).delete(catalog::delete_service),
        )
        .route(
            "/contracts",
            get(catalog::get_all_contracts).post(catalog::create_contract),
        )
        .route("/contracts/{id}", get(catalog::get_contract))
        .route("/contracts/{id}/services", post(catalog::add_services_to_contract))
        // Inventory
        .route(
            "/material-cards",
            get(inventory::get_all_material_cards).post(inventory::create_material_card),
        )
        .route(
            "/material-cards/{id}",
            put(inventory::update_material_card).delete(inventory::delete_material_card),
        )
        .route("/material-cards/{id}/spell", post(inventory::spell_material))
        .route("/material-cards/storage", get(inventory::get_storage))
        .route("/material-cards/delivery", post(inventory::add_delivery))
        .route(
            "/materials",
            get(inventory::get_all_materials).post(inventory::create_material),
        )
        .route(
            "/materials/{id}",
            get(inventory::get_material)
                .put(inventory::update_material)
                .delete(inventory::delete_material),
        )
        .route("/materials/{id}/add-quantity", post(inventory::add_quantity))
        .route(
            "/materials/{id}/subtract-quantity",
            post(inventory::subtract_quantity),
        )
}
