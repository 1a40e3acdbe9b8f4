// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod error;
pub mod history;
pub mod runtime;
pub mod sandbox;
pub mod selector;
pub mod session;
pub mod store;
pub mod task;
pub mod timer;

pub use catalog::{Catalog, TaskDefinition};
pub use error::{PracticError, Result};
pub use session::{TaskPhase, TaskSession};
pub use store::{FileStore, KeyValueStore, MemoryStore, ProgressStore};
pub use task::{CompletionRejected, PracticeTask};
