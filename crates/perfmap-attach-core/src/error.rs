//! # Error Types
//!
//! General error handling for attaching to a VM and loading an agent.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::path::PathBuf;

use thiserror::Error;

/// Message the attach listener reports when the agent's `Agent_OnAttach`
/// entry point returns non-zero.
///
/// The perf map agent signals completion over its own side channel and then
/// returns a failure code on purpose, so this exact message is expected.
pub const AGENT_ON_ATTACH_FAILED: &str = "Agent_OnAttach failed";

/// Main error type for attach operations
///
/// ## Error Categories
///
/// 1. **Process errors**: ProcessNotFound, AttachFailed, NotAttached
/// 2. **Permission errors**: PermissionDenied
/// 3. **Local precondition errors**: LibraryMissing, InvalidArgument
/// 4. **Agent errors**: AgentLoad, AgentInitialization
/// 5. **Wire errors**: Protocol
/// 6. **Platform errors**: Unsupported
/// 7. **I/O errors**: Io (sockets, trigger files, etc.)
#[derive(Error, Debug)]
pub enum AttachError
{
    /// The process with the given PID doesn't exist or has exited
    #[error("Process not found: PID {0}")]
    ProcessNotFound(u32),

    /// Insufficient permissions to attach to the target process
    ///
    /// The HotSpot attach listener only accepts connections from the user that
    /// owns the VM (or root), and signalling the target needs the same rights.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid argument, for example a malformed process id
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to attach to a process
    ///
    /// General failure to bring up or reach the target's attach listener, for
    /// example when the listener socket never appears.
    #[error("Failed to attach to process: {0}")]
    AttachFailed(String),

    /// Operation requires an attached VM handle
    #[error("Not attached to a process")]
    NotAttached,

    /// The agent library is not where we expect it
    #[error("Expected {name} at '{}' but it didn't exist.", .path.display())]
    LibraryMissing
    {
        /// Bare file name of the library
        name: String,
        /// Absolute path that was checked
        path: PathBuf,
    },

    /// The target VM refused or failed to load the agent library
    #[error("{0}")]
    AgentLoad(String),

    /// The library loaded but its `Agent_OnAttach` returned non-zero
    #[error("{message} (return code {return_code})")]
    AgentInitialization
    {
        /// Message reported for the failure
        message: String,
        /// Value returned by `Agent_OnAttach`
        return_code: i32,
    },

    /// The attach listener answered with something we can't interpret
    #[error("Attach protocol error: {0}")]
    Protocol(String),

    /// No attach backend exists for this platform
    #[error("Unsupported platform: {0}")]
    Unsupported(String),

    /// I/O error (sockets, trigger files, `/proc` reads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttachError
{
    /// Whether this is the one initialization failure that is expected and
    /// must not fail the attach.
    ///
    /// Matches on the exact message text only.
    pub fn is_ignorable_initialization(&self) -> bool
    {
        matches!(self, AttachError::AgentInitialization { message, .. } if message == AGENT_ON_ATTACH_FAILED)
    }
}

/// Convenience type alias for `Result<T, AttachError>`
///
/// ```rust
/// use perfmap_attach_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, AttachError>;
