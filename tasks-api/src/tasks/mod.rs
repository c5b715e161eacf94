//! Task resource: model and storage

pub mod model;
pub mod store;

pub use model::{OrderBy, OrderDirection, ResultInfo, Task, TaskFields, TaskPage, TaskQuery};
pub use store::MemoryTaskStore;
