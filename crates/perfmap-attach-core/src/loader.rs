//! # Attach-and-load
//!
//! One-shot operation: attach to a process, load an agent library into it,
//! detach.

use tracing::{info, warn};

use crate::attacher::{Attacher, VirtualMachine};
use crate::error::{AttachError, Result};
use crate::guards::AttachGuard;
use crate::types::{AgentLibrary, ProcessId};

/// How a load finished when it didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome
{
    /// The agent loaded and `Agent_OnAttach` returned 0.
    Loaded,
    /// `Agent_OnAttach` reported the expected failure; the agent has already
    /// signalled completion through its own channel.
    InitializationSignalled,
}

/// Load `library` into process `pid` through `attacher`.
///
/// The library's existence is checked before anything touches the target, so
/// a missing library never causes an attach. Once attached, the handle is
/// detached exactly once no matter how the load ends.
///
/// Agent options are always empty.
///
/// ## Errors
///
/// - `LibraryMissing`: no file at the resolved path; nothing was attached
/// - anything [`Attacher::attach`] returns
/// - anything [`VirtualMachine::load_agent_path`] returns, except the
///   ignorable `Agent_OnAttach failed` initialization error
/// - the detach error, if the load itself succeeded
pub fn load_agent<A: Attacher>(attacher: &A, pid: ProcessId, library: &AgentLibrary) -> Result<LoadOutcome>
{
    let path = library.resolve()?;
    if !path.exists() {
        return Err(AttachError::LibraryMissing {
            name: library.file_name().to_string(),
            path,
        });
    }

    info!(%pid, library = %path.display(), "attaching to process");
    let mut vm = AttachGuard::new(attacher.attach(pid)?);

    let outcome = match vm.load_agent_path(&path, "") {
        Ok(()) => Ok(LoadOutcome::Loaded),
        Err(e) if e.is_ignorable_initialization() => {
            warn!(%pid, error = %e, "agent reported initialization failure, treating as signalled");
            Ok(LoadOutcome::InitializationSignalled)
        }
        Err(e) => Err(e),
    };

    match (outcome, vm.detach()) {
        (Ok(outcome), Ok(())) => {
            info!(%pid, ?outcome, "detached");
            Ok(outcome)
        }
        (Ok(_), Err(detach_err)) => Err(detach_err),
        (Err(load_err), detached) => {
            if let Err(detach_err) = detached {
                warn!(%pid, error = %detach_err, "detach failed after load error");
            }
            Err(load_err)
        }
    }
}
