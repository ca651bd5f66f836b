//! # Attacher Traits
//!
//! The interface between the load operation and a platform attach backend.
//!
//! Attaching is split in two:
//!
//! - [`Attacher`] knows how to reach a process and hands back a handle
//! - [`VirtualMachine`] is that handle: it can load an agent and detach
//!
//! [`crate::loader::load_agent`] is written against these traits only, so a
//! backend can be swapped (or faked in tests) without touching the rules
//! around missing libraries, ignorable failures and detaching.

use std::path::Path;

use crate::error::Result;
#[cfg(unix)]
use crate::platform::hotspot::{AttachConfig, HotSpotAttacher};
use crate::types::ProcessId;

/// A live attachment to a running VM
///
/// ## Lifecycle
///
/// 1. Obtain one from [`Attacher::attach`]
/// 2. Load agents: `load_agent_path()`
/// 3. Release it: `detach()`
///
/// Prefer wrapping the handle in [`crate::guards::AttachGuard`], which detaches
/// on every exit path.
pub trait VirtualMachine
{
    /// Process this handle is attached to.
    fn pid(&self) -> ProcessId;

    /// Ask the VM to load the native agent at `path` and run its
    /// `Agent_OnAttach` with `options`.
    ///
    /// `path` must be absolute; the VM resolves relative paths against its
    /// own working directory.
    ///
    /// ## Errors
    ///
    /// - `NotAttached`: the handle was already detached
    /// - `AgentLoad`: the VM could not load the library
    /// - `AgentInitialization`: the library loaded but `Agent_OnAttach` failed
    /// - `Protocol`, `Io`: transport failures
    fn load_agent_path(&mut self, path: &Path, options: &str) -> Result<()>;

    /// Release the attachment.
    ///
    /// Detaching an already detached handle is a no-op.
    fn detach(&mut self) -> Result<()>;

    /// Whether `detach()` has not been called yet.
    fn is_attached(&self) -> bool;
}

/// Something that can attach to a process by pid
pub trait Attacher
{
    /// Handle type produced by a successful attach.
    type Vm: VirtualMachine;

    /// Attach to a running process.
    ///
    /// ## Errors
    ///
    /// - `ProcessNotFound`: the PID doesn't exist
    /// - `PermissionDenied`: we may not attach to this process
    /// - `AttachFailed`: the target never became attachable
    fn attach(&self, pid: ProcessId) -> Result<Self::Vm>;
}

impl<A: Attacher + ?Sized> Attacher for &A
{
    type Vm = A::Vm;

    fn attach(&self, pid: ProcessId) -> Result<Self::Vm>
    {
        (**self).attach(pid)
    }
}

/// Create the attacher for the current platform
///
/// ## Example
///
/// ```rust,no_run
/// use perfmap_attach_core::attacher::{create_attacher, Attacher, VirtualMachine};
/// use perfmap_attach_core::platform::hotspot::AttachConfig;
/// use perfmap_attach_core::types::ProcessId;
///
/// let attacher = create_attacher(AttachConfig::default())?;
/// let mut vm = attacher.attach(ProcessId::from(12345))?;
/// vm.detach()?;
/// # Ok::<(), perfmap_attach_core::error::AttachError>(())
/// ```
///
/// ## Platform Support
///
/// - Linux: HotSpot dynamic attach over the `.java_pid<pid>` socket
/// - Other Unix systems: `Unsupported`
#[cfg(unix)]
pub fn create_attacher(config: AttachConfig) -> Result<HotSpotAttacher>
{
    #[cfg(target_os = "linux")]
    {
        Ok(HotSpotAttacher::new(config))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = config;
        Err(crate::error::AttachError::Unsupported(format!(
            "dynamic attach is not implemented for platform: {}",
            std::env::consts::OS
        )))
    }
}
