//! HTTP API for the task service

pub mod response;
pub mod routes;
pub mod server;

pub use response::ApiError;
pub use routes::{AppState, SharedState};
pub use server::ApiServer;
