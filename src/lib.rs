pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use api::{build_router, AppState};
pub use client::{FakeBackend, GuiaBackend, HttpBackend, ResourceClient};
pub use config::AppConfig;
pub use error::{AppError, AppResult, BackendError, ValidationError, WorkflowError};
pub use service::{DuplicationWorkflow, OrderEditor, OrderService, WorkflowService};
