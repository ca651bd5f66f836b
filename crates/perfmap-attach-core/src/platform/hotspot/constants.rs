//! # HotSpot Attach Constants
//!
//! Names and numbers of the HotSpot dynamic attach mechanism on Linux.

use std::time::Duration;

/// Attach protocol version sent as the first field of every request.
pub const PROTOCOL_VERSION: &str = "1";

/// Every request carries exactly this many arguments after the command.
pub const ARGS_PER_REQUEST: usize = 3;

/// Completion status for a request the VM does not understand.
pub const ATTACH_ERROR_BADVERSION: i32 = 101;

/// Command that loads a native agent.
pub const LOAD_COMMAND: &str = "load";

/// Prefix of the agent result line on JDK 9 and later.
pub const RETURN_CODE_PREFIX: &str = "return code: ";

/// Socket file name prefix, followed by the pid as seen inside the target's namespace.
pub const SOCKET_PREFIX: &str = ".java_pid";

/// Trigger file name prefix; its presence plus `SIGQUIT` starts the attach listener.
pub const TRIGGER_PREFIX: &str = ".attach_pid";

/// Fallback temp directory when the target's root isn't reachable through `/proc`.
pub const DEFAULT_TMP_DIR: &str = "/tmp";

/// Default time to wait for the attach listener and for socket I/O.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval step while waiting for the socket; the n-th wait sleeps n steps.
pub const POLL_STEP: Duration = Duration::from_millis(20);
