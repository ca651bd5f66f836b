//! # Attach Listener Discovery
//!
//! Finding, and if necessary starting, the attach listener of a HotSpot VM.
//!
//! HotSpot does not listen for attach requests until asked. Asking means
//! creating a `.attach_pid<pid>` trigger file and sending `SIGQUIT`; the VM's
//! signal handler sees the file and opens the `.java_pid<pid>` socket in its
//! temp directory. Without the trigger file the same signal just prints a
//! thread dump.
//!
//! Containers complicate the names: `<pid>` is the pid *inside* the target's
//! pid namespace, and "its temp directory" is `/tmp` under the target's root,
//! which we reach through `/proc/<pid>/root`.

use std::fs::{self, File};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::constants::{DEFAULT_TMP_DIR, POLL_STEP, SOCKET_PREFIX, TRIGGER_PREFIX};
use super::ffi;
use crate::error::{AttachError, Result};
use crate::types::ProcessId;

/// Innermost pid from the `NSpid:` line of a `/proc/<pid>/status` file.
pub fn parse_nspid(status: &str) -> Option<u32>
{
    status
        .lines()
        .find_map(|line| line.strip_prefix("NSpid:"))
        .and_then(|rest| rest.split_whitespace().last())
        .and_then(|pid| pid.parse().ok())
}

/// Mask of caught signals from the `SigCgt:` line of a `/proc/<pid>/status` file.
pub fn parse_sigcgt(status: &str) -> Option<u64>
{
    status
        .lines()
        .find_map(|line| line.strip_prefix("SigCgt:"))
        .and_then(|mask| u64::from_str_radix(mask.trim(), 16).ok())
}

/// Whether a caught-signal mask includes `SIGQUIT`.
pub fn catches_sigquit(mask: u64) -> bool
{
    mask & (1 << (libc::SIGQUIT - 1)) != 0
}

/// The target's pid as seen from inside its own pid namespace.
///
/// Falls back to the host pid on kernels without `NSpid` or when `/proc`
/// can't be read.
pub fn namespace_pid(pid: ProcessId) -> u32
{
    fs::read_to_string(format!("/proc/{pid}/status"))
        .ok()
        .and_then(|status| parse_nspid(&status))
        .unwrap_or(pid.0)
}

/// The directory the target VM uses as `/tmp`.
pub fn target_tmp_dir(pid: ProcessId) -> PathBuf
{
    let through_root = PathBuf::from(format!("/proc/{pid}/root{DEFAULT_TMP_DIR}"));
    if fs::metadata(&through_root).is_ok_and(|m| m.is_dir()) {
        through_root
    } else {
        PathBuf::from(DEFAULT_TMP_DIR)
    }
}

/// Path of the attach socket for a VM whose namespace pid is `nspid`.
pub fn socket_path(tmp_dir: &Path, nspid: u32) -> PathBuf
{
    tmp_dir.join(format!("{SOCKET_PREFIX}{nspid}"))
}

/// Whether a Unix socket exists at `path`.
pub fn socket_exists(path: &Path) -> bool
{
    fs::metadata(path).is_ok_and(|m| m.file_type().is_socket())
}

/// Verify the socket is owned by us, or that we are root.
///
/// The VM rejects peers with a different uid anyway; checking up front turns
/// that silent hang-up into a clear error.
///
/// ## Errors
///
/// - `PermissionDenied`: owned by another user
/// - `Io`: the socket can't be stat'ed
pub fn check_socket_owner(path: &Path) -> Result<()>
{
    let owner = fs::metadata(path)?.uid();
    let euid = ffi::effective_uid();
    if euid != 0 && owner != euid {
        return Err(AttachError::PermissionDenied(format!(
            "attach socket {} is owned by uid {owner}, we run as uid {euid}",
            path.display()
        )));
    }
    Ok(())
}

/// A trigger file that is removed when dropped.
struct TriggerFile
{
    path: PathBuf,
}

impl TriggerFile
{
    /// Create the trigger in the target's working directory, or in its temp
    /// directory if that fails.
    fn create(pid: ProcessId, nspid: u32, tmp_dir: &Path) -> Result<Self>
    {
        let name = format!("{TRIGGER_PREFIX}{nspid}");
        let in_cwd = PathBuf::from(format!("/proc/{pid}/cwd")).join(&name);

        match File::create(&in_cwd) {
            Ok(_) => Ok(Self { path: in_cwd }),
            Err(e) => {
                debug!(path = %in_cwd.display(), error = %e, "cannot create trigger in target cwd, using tmp");
                let in_tmp = tmp_dir.join(&name);
                File::create(&in_tmp)?;
                Ok(Self { path: in_tmp })
            }
        }
    }
}

impl Drop for TriggerFile
{
    fn drop(&mut self)
    {
        let _ = fs::remove_file(&self.path);
    }
}

/// Ask the VM to start its attach listener and wait for `socket` to appear.
///
/// Waits grow linearly in [`POLL_STEP`] increments until `timeout` has passed.
/// The trigger file is removed on every exit path.
///
/// ## Errors
///
/// - `ProcessNotFound`: the target died while we waited
/// - `PermissionDenied`: we may not signal the target
/// - `AttachFailed`: the target has no `SIGQUIT` handler, or the socket did
///   not appear in time
/// - `Io`: the trigger file could not be created
pub fn start_listener(pid: ProcessId, nspid: u32, tmp_dir: &Path, socket: &Path, timeout: Duration) -> Result<()>
{
    // SIGQUIT terminates a process that doesn't handle it; HotSpot always does
    let caught = fs::read_to_string(format!("/proc/{pid}/status"))
        .ok()
        .and_then(|status| parse_sigcgt(&status));
    if caught.is_some_and(|mask| !catches_sigquit(mask)) {
        return Err(AttachError::AttachFailed(format!(
            "process {pid} does not catch SIGQUIT; not a HotSpot VM"
        )));
    }

    let trigger = TriggerFile::create(pid, nspid, tmp_dir)?;
    debug!(%pid, trigger = %trigger.path.display(), "created attach trigger, sending SIGQUIT");

    ffi::send_signal(pid, libc::SIGQUIT).map_err(|e| ffi::signal_error(pid, e))?;

    let started = Instant::now();
    let mut delay = Duration::ZERO;
    while !socket_exists(socket) {
        if started.elapsed() >= timeout {
            return Err(AttachError::AttachFailed(format!(
                "attach listener of process {pid} did not start within {} ms ({} not found)",
                timeout.as_millis(),
                socket.display()
            )));
        }

        delay += POLL_STEP;
        trace!(%pid, delay_ms = delay.as_millis(), "waiting for attach socket");
        thread::sleep(delay.min(timeout.saturating_sub(started.elapsed())));

        // A VM that exits while we wait would otherwise just time out
        ffi::probe_process(pid)?;
    }

    debug!(%pid, socket = %socket.display(), "attach listener is up");
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_nspid_nested_namespace()
    {
        let status = "Name:\tjava\nTgid:\t4711\nPid:\t4711\nNSpid:\t4711\t1\nPPid:\t1\n";
        assert_eq!(parse_nspid(status), Some(1));
    }

    #[test]
    fn test_parse_nspid_host_namespace()
    {
        let status = "Name:\tjava\nNSpid:\t4711\n";
        assert_eq!(parse_nspid(status), Some(4711));
    }

    #[test]
    fn test_parse_nspid_missing()
    {
        assert_eq!(parse_nspid("Name:\tjava\nPid:\t4711\n"), None);
        assert_eq!(parse_nspid("NSpid:\n"), None);
    }

    #[test]
    fn test_parse_sigcgt()
    {
        // A JVM catches SIGQUIT (bit 2) among others
        let jvm = "Name:\tjava\nSigIgn:\t0000000000000000\nSigCgt:\t2000000181005ccf\n";
        let mask = parse_sigcgt(jvm).unwrap();
        assert!(catches_sigquit(mask));

        let sleep = "Name:\tsleep\nSigCgt:\t0000000000000000\n";
        assert!(!catches_sigquit(parse_sigcgt(sleep).unwrap()));

        assert_eq!(parse_sigcgt("Name:\tjava\n"), None);
    }

    #[test]
    fn test_socket_path()
    {
        assert_eq!(socket_path(Path::new("/tmp"), 42), PathBuf::from("/tmp/.java_pid42"));
    }

    #[test]
    fn test_regular_file_is_not_a_socket()
    {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".java_pid1");
        fs::write(&path, b"").unwrap();
        assert!(!socket_exists(&path));
        assert!(!socket_exists(&temp.path().join("absent")));
    }

    #[test]
    fn test_own_socket_passes_owner_check()
    {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".java_pid1");
        let _listener = std::os::unix::net::UnixListener::bind(&path).unwrap();
        assert!(socket_exists(&path));
        assert!(check_socket_owner(&path).is_ok());
    }

    #[test]
    fn test_trigger_file_is_removed_on_drop()
    {
        let temp = tempfile::tempdir().unwrap();
        let trigger = TriggerFile {
            path: temp.path().join(".attach_pid1"),
        };
        File::create(&trigger.path).unwrap();
        let path = trigger.path.clone();
        drop(trigger);
        assert!(!path.exists());
    }
}
