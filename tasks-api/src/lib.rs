//! # tasks-api
//!
//! HTTP service for task records, with list and read responses served
//! through the versioned key-value cache in `tasks-cache`.

pub mod api;
pub mod config;
pub mod tasks;

pub use api::{ApiError, ApiServer, AppState, SharedState};
pub use config::{ApiServerConfig, ConfigError};
pub use tasks::{MemoryTaskStore, Task, TaskFields, TaskPage, TaskQuery};
