pub mod analysis;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
