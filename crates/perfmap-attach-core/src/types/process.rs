//! Process identifier type.

use std::fmt;
use std::str::FromStr;

use crate::error::AttachError;

/// Process identifier (PID)
///
/// A PID is the number the operating system assigns to a running process.
/// The attach command receives it in string form on the command line, so
/// besides the usual conversions it implements [`FromStr`].
///
/// ## Example
///
/// ```rust
/// use perfmap_attach_core::types::ProcessId;
///
/// let pid: ProcessId = "4242".parse()?;
/// assert_eq!(pid, ProcessId::from(4242));
/// # Ok::<(), perfmap_attach_core::error::AttachError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl ProcessId
{
    /// The pid as a `libc::pid_t`, for signalling and `/proc` lookups.
    ///
    /// Values above `i32::MAX` cannot name a process and map to `-1`, which
    /// every consumer treats as invalid.
    pub fn as_raw(self) -> libc::pid_t
    {
        libc::pid_t::try_from(self.0).unwrap_or(-1)
    }
}

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProcessId
{
    type Err = AttachError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let trimmed = s.trim();
        let pid = trimmed
            .parse::<u32>()
            .map_err(|e| AttachError::InvalidArgument(format!("invalid process id '{s}': {e}")))?;

        // pid 0 addresses the caller's process group, never a single VM
        if pid == 0 || libc::pid_t::try_from(pid).is_err() {
            return Err(AttachError::InvalidArgument(format!("invalid process id '{s}'")));
        }

        Ok(ProcessId(pid))
    }
}
