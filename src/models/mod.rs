pub mod booking;
pub mod client;
pub mod contract;
pub mod inventory;
pub mod order;
pub mod service;
pub mod user;
pub mod worker;
