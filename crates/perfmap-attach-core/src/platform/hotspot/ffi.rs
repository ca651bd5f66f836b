//! # libc Wrappers
//!
//! The few raw system calls the attach mechanism needs, wrapped so the rest
//! of the backend stays free of `unsafe`.

use std::io;

use libc::c_int;

use crate::error::AttachError;
use crate::types::ProcessId;

/// Send `signal` to `pid`. A signal of 0 only checks that the process exists
/// and that we may signal it.
pub fn send_signal(pid: ProcessId, signal: c_int) -> io::Result<()>
{
    let raw = pid.as_raw();
    if raw <= 0 {
        // kill() with 0 or a negative pid targets process groups
        return Err(io::Error::from_raw_os_error(libc::ESRCH));
    }

    // SAFETY: kill has no memory-safety preconditions; `raw` names a single process
    let result = unsafe { libc::kill(raw, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Effective user id of this process.
pub fn effective_uid() -> u32
{
    // SAFETY: geteuid cannot fail and touches no memory
    unsafe { libc::geteuid() }
}

/// Map a failed `kill()` onto the attach error taxonomy.
pub fn signal_error(pid: ProcessId, err: io::Error) -> AttachError
{
    match err.raw_os_error() {
        Some(libc::ESRCH) => AttachError::ProcessNotFound(pid.0),
        Some(libc::EPERM) => AttachError::PermissionDenied(format!("not allowed to signal process {pid}")),
        _ => AttachError::Io(err),
    }
}

/// Check that `pid` exists and that we are allowed to signal it.
///
/// ## Errors
///
/// - `ProcessNotFound`: no such process
/// - `PermissionDenied`: the process belongs to someone else
pub fn probe_process(pid: ProcessId) -> crate::error::Result<()>
{
    send_signal(pid, 0).map_err(|e| signal_error(pid, e))
}
