pub mod duplication;
pub mod field_report;
pub mod orders;
pub mod processing;
pub mod realtime;
pub mod selector;
pub mod sync;
pub mod validation;
pub mod workflow;

pub use duplication::{apply_shared_patch, DuplicationWorkflow, EventOutcome};
pub use orders::{OrderEditor, OrderService};
pub use selector::{CascadingSelector, FetchRequest, LevelOptions};
pub use workflow::WorkflowService;
