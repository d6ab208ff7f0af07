use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::Level;

/// Failure talking to the REST backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("decode: {0}")]
    Decode(String),

    #[error("backend rejected request: {0}")]
    Rejected(String),
}

/// Client-side checks that run before any network call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate count must be between {min} and {max}, got {got}")]
    CountOutOfRange { got: i64, min: u32, max: u32 },

    #[error("select a Proyecto or Subproyecto chain before saving")]
    MissingChain,

    #[error("select a {label} before saving")]
    MissingLeaf { label: &'static str },

    #[error("{label} options have not loaded, retry before saving")]
    UnresolvedLevel { label: &'static str },

    #[error("line items could not be read: {0}")]
    UnreadableItems(String),

    #[error("the waybill has no line items")]
    NoItems,

    #[error("the first line item has no product code")]
    BlankProductCode,

    #[error("gross weight must be a positive number")]
    NonPositiveWeight,

    #[error("order has no supplier")]
    MissingSupplier,

    #[error("order has no line items")]
    EmptyOrder,

    #[error("line {line}: quantity and unit price must be positive")]
    InvalidOrderLine { line: usize },

    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidRate(f64),
}

/// Guards on the duplication state machine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("waybill {0} not found")]
    SourceNotFound(i64),

    #[error("no duplicate batch for waybill {0}")]
    BatchNotFound(i64),

    #[error("waybill {0} already has generated documents and cannot be duplicated")]
    DuplicationRefused(i64),

    #[error("waybill {0} already has a duplicate batch")]
    BatchExists(i64),

    #[error("duplication of waybill {0} is already in progress")]
    DuplicationInFlight(i64),

    #[error("batch {0} is already being saved")]
    SubmitInFlight(i64),

    #[error("batch {source_id} has no duplicate at position {index}")]
    DuplicateIndex { source_id: i64, index: usize },

    #[error("no line item at position {0}")]
    LineIndex(usize),

    #[error("no hierarchy chain is active")]
    NoChainSelected,

    #[error("option {id} is not available at this level")]
    UnknownOption { id: i64 },

    #[error("{0} cannot be selected before its parent")]
    ParentNotSelected(Level),

    #[error("realtime channel closed")]
    ChannelClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Workflow(WorkflowError::SourceNotFound(_))
            | AppError::Workflow(WorkflowError::BatchNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Workflow(WorkflowError::ChannelClosed) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Workflow(_) => StatusCode::CONFLICT,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(body)).into_response()
    }
}
