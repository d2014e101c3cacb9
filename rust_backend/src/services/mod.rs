//! Request-level services: orchestration and progress reporting.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::GroupingOrchestrator;
pub use progress::{NullSink, ProgressEntry, ProgressLog, ProgressSink};
