pub mod auth_service;
pub mod booking_service;
pub mod catalog_service;
pub mod client_service;
pub mod inventory_service;
pub mod order_service;
pub mod worker_service;

pub use auth_service::AuthService;
pub use booking_service::BookingService;
pub use catalog_service::CatalogService;
pub use client_service::ClientService;
pub use inventory_service::InventoryService;
pub use order_service::OrderService;
pub use worker_service::WorkerService;
