// Public API for integration tests and the user provisioning binary

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;
pub mod store;
pub mod types;
