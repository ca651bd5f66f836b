//! # Types
//!
//! Small value types shared by the attach backend and the load operation.

pub mod agent;
pub mod process;

// Re-export all public types
pub use agent::{AgentLibrary, PERFMAP_LIBRARY_NAME};
pub use process::ProcessId;
