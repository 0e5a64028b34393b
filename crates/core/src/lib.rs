pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod signature;
