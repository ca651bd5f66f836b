//! # HotSpot Dynamic Attach
//!
//! Attaches to a running HotSpot JVM through its attach listener socket and
//! loads native agents into it.
//!
//! ## How it works
//!
//! 1. Make sure the process exists and we may signal it
//! 2. Find `.java_pid<nspid>` in the target's temp directory, starting the
//!    listener if it isn't there (see [`listener`])
//! 3. Check the socket belongs to us
//! 4. Per command: connect, send one request, read the reply (see [`protocol`])
//!
//! The VM closes the connection after each command, so [`HotSpotVm`] holds no
//! open socket between loads. Detaching only marks the handle unusable.

pub mod constants;
pub mod ffi;
pub mod listener;
pub mod protocol;

use std::io::{BufReader, ErrorKind, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::attacher::{Attacher, VirtualMachine};
use crate::error::{AttachError, Result};
use crate::types::ProcessId;
use constants::{DEFAULT_TIMEOUT, LOAD_COMMAND};

/// Tunables for the HotSpot attacher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachConfig
{
    /// How long to wait for the attach listener to come up, and the read and
    /// write timeout on the socket.
    pub timeout: Duration,
    /// Use this directory instead of the target's `/tmp` when looking for the
    /// attach socket and placing a fallback trigger file.
    pub tmp_dir: Option<PathBuf>,
}

impl AttachConfig
{
    /// Set the listener and socket timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self
    {
        self.timeout = timeout;
        self
    }

    /// Override the target's temp directory.
    #[must_use]
    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self
    {
        self.tmp_dir = Some(tmp_dir.into());
        self
    }
}

impl Default for AttachConfig
{
    fn default() -> Self
    {
        Self {
            timeout: DEFAULT_TIMEOUT,
            tmp_dir: None,
        }
    }
}

/// Attacher for HotSpot VMs on Linux
#[derive(Debug, Clone, Default)]
pub struct HotSpotAttacher
{
    config: AttachConfig,
}

impl HotSpotAttacher
{
    /// Create an attacher with the given configuration.
    pub fn new(config: AttachConfig) -> Self
    {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &AttachConfig
    {
        &self.config
    }
}

impl Attacher for HotSpotAttacher
{
    type Vm = HotSpotVm;

    fn attach(&self, pid: ProcessId) -> Result<HotSpotVm>
    {
        ffi::probe_process(pid)?;

        let nspid = listener::namespace_pid(pid);
        let tmp_dir = self
            .config
            .tmp_dir
            .clone()
            .unwrap_or_else(|| listener::target_tmp_dir(pid));
        let socket = listener::socket_path(&tmp_dir, nspid);
        debug!(%pid, nspid, socket = %socket.display(), "resolved attach socket");

        if !listener::socket_exists(&socket) {
            listener::start_listener(pid, nspid, &tmp_dir, &socket, self.config.timeout)?;
        }
        listener::check_socket_owner(&socket)?;

        info!(%pid, "attached");
        Ok(HotSpotVm {
            pid,
            socket,
            timeout: self.config.timeout,
            attached: true,
        })
    }
}

/// Attachment to one HotSpot VM
#[derive(Debug)]
pub struct HotSpotVm
{
    pid: ProcessId,
    socket: PathBuf,
    timeout: Duration,
    attached: bool,
}

impl HotSpotVm
{
    /// Attach socket this handle talks to.
    pub fn socket(&self) -> &Path
    {
        &self.socket
    }

    /// Send one command and return a reader positioned at the reply.
    fn execute(&self, command: &str, args: &[&[u8]]) -> Result<BufReader<UnixStream>>
    {
        if !self.attached {
            return Err(AttachError::NotAttached);
        }

        let request = protocol::encode_request(command, args)?;

        let mut stream = UnixStream::connect(&self.socket).map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::ConnectionRefused => AttachError::AttachFailed(format!(
                "attach listener of process {} is gone ({}): {e}",
                self.pid,
                self.socket.display()
            )),
            ErrorKind::PermissionDenied => {
                AttachError::PermissionDenied(format!("cannot connect to {}: {e}", self.socket.display()))
            }
            _ => AttachError::Io(e),
        })?;

        let timeout = (!self.timeout.is_zero()).then_some(self.timeout);
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        debug!(pid = %self.pid, command, "sending attach command");
        stream.write_all(&request)?;
        stream.flush()?;

        Ok(BufReader::new(stream))
    }
}

impl VirtualMachine for HotSpotVm
{
    fn pid(&self) -> ProcessId
    {
        self.pid
    }

    fn load_agent_path(&mut self, path: &Path, options: &str) -> Result<()>
    {
        if !path.is_absolute() {
            return Err(AttachError::InvalidArgument(format!(
                "agent path must be absolute: {}",
                path.display()
            )));
        }

        info!(pid = %self.pid, agent = %path.display(), "loading agent");
        let mut reply = self.execute(
            LOAD_COMMAND,
            &[path.as_os_str().as_bytes(), b"true", options.as_bytes()],
        )?;
        protocol::parse_load_reply(&mut reply)
    }

    fn detach(&mut self) -> Result<()>
    {
        if self.attached {
            self.attached = false;
            debug!(pid = %self.pid, "detached");
        }
        Ok(())
    }

    fn is_attached(&self) -> bool
    {
        self.attached
    }
}
