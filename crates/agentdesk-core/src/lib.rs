// Agent console core
//
// This crate provides a presentation-independent implementation of an agent
// administration console: a directory store over a remote agent API, a
// search/filter/paginate pipeline, confirmation-gated actions, row menu
// placement, transient notifications and the create form.
//
// Key design decisions:
// - The remote API sits behind the AgentApi trait (HTTP in the CLI, in-memory for tests)
// - The directory publishes every change through a watch channel
// - Fetches are sequence-numbered so stale responses never overwrite fresher data
// - Derived views (pages, summaries, status) are recomputed from snapshots, never stored
// - Errors are classified once, at the API boundary, into DirectoryError

pub mod agent;
pub mod config;
pub mod confirm;
pub mod console;
pub mod directory;
pub mod display;
pub mod error;
pub mod form;
pub mod menu;
pub mod notify;
pub mod query;
pub mod traits;

// In-memory implementation for demos and testing
pub mod memory;

// Re-exports for convenience
pub use agent::{Agent, AgentMeta, AgentParams, AgentStatus, Capabilities, OwnerSummary};
pub use config::ConsoleConfig;
pub use confirm::{ConfirmationFlow, DeleteFlow, FlowState, StatusChange, StatusChanged, StatusFlow};
pub use console::{Console, CreateError, View};
pub use directory::{AgentDirectory, DirectorySnapshot};
pub use display::{format_timestamp, known_models, model_display_name};
pub use error::{DirectoryError, FlowError, Result};
pub use form::{AgentForm, AttachmentError, AttachmentStaging, FieldError, FileCandidate, FormError};
pub use memory::InMemoryAgentApi;
pub use menu::{compute_placement, AnchorGeometry, ClickTarget, Placement, RowMenu};
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use query::{run_query, PageView, QueryState, StatusFilter, Summary};
pub use traits::AgentApi;
