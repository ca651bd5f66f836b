//! # RAII Guard for VM Attachments
//!
//! [`AttachGuard`] owns a [`VirtualMachine`] handle and detaches it when
//! dropped, so the attachment is released even if loading fails or panics.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use perfmap_attach_core::attacher::{create_attacher, Attacher, VirtualMachine};
//! use perfmap_attach_core::guards::AttachGuard;
//! use perfmap_attach_core::platform::hotspot::AttachConfig;
//! use perfmap_attach_core::types::ProcessId;
//!
//! let attacher = create_attacher(AttachConfig::default())?;
//! let mut vm = AttachGuard::new(attacher.attach(ProcessId::from(12345))?);
//! vm.load_agent_path(Path::new("/opt/agent/libagent.so"), "")?;
//! // Detach explicitly to see the error, or let the guard do it on drop
//! vm.detach()?;
//! # Ok::<(), perfmap_attach_core::error::AttachError>(())
//! ```

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::attacher::VirtualMachine;
use crate::error::Result;

/// RAII guard that detaches a VM handle when dropped.
///
/// Detach happens at most once: after an explicit [`AttachGuard::detach`]
/// the drop is a no-op.
pub struct AttachGuard<V: VirtualMachine>
{
    vm: V,
    active: bool,
}

impl<V: VirtualMachine> AttachGuard<V>
{
    /// Take ownership of an attached handle.
    pub fn new(vm: V) -> Self
    {
        Self { vm, active: true }
    }

    /// Detach now and report the outcome.
    ///
    /// ## Errors
    ///
    /// Whatever the handle's `detach()` returns. The guard is disarmed either
    /// way; a failed detach is not retried on drop.
    pub fn detach(mut self) -> Result<()>
    {
        self.active = false;
        self.vm.detach()
    }
}

impl<V: VirtualMachine> Deref for AttachGuard<V>
{
    type Target = V;

    fn deref(&self) -> &Self::Target
    {
        &self.vm
    }
}

impl<V: VirtualMachine> DerefMut for AttachGuard<V>
{
    fn deref_mut(&mut self) -> &mut Self::Target
    {
        &mut self.vm
    }
}

impl<V: VirtualMachine> Drop for AttachGuard<V>
{
    fn drop(&mut self)
    {
        if self.active {
            self.active = false;
            // Best effort detach, there is no caller left to hand the error to
            if let Err(e) = self.vm.detach() {
                warn!(pid = %self.vm.pid(), error = %e, "detach on drop failed");
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::Cell;
    use std::path::Path;
    use std::rc::Rc;

    use super::*;
    use crate::error::AttachError;
    use crate::types::ProcessId;

    struct CountingVm
    {
        detaches: Rc<Cell<u32>>,
        fail_detach: bool,
    }

    impl VirtualMachine for CountingVm
    {
        fn pid(&self) -> ProcessId
        {
            ProcessId::from(7)
        }

        fn load_agent_path(&mut self, _path: &Path, _options: &str) -> Result<()>
        {
            Err(AttachError::AgentLoad("boom".to_string()))
        }

        fn detach(&mut self) -> Result<()>
        {
            self.detaches.set(self.detaches.get() + 1);
            if self.fail_detach {
                Err(AttachError::AttachFailed("socket gone".to_string()))
            } else {
                Ok(())
            }
        }

        fn is_attached(&self) -> bool
        {
            self.detaches.get() == 0
        }
    }

    fn counting(fail_detach: bool) -> (CountingVm, Rc<Cell<u32>>)
    {
        let detaches = Rc::new(Cell::new(0));
        let vm = CountingVm {
            detaches: Rc::clone(&detaches),
            fail_detach,
        };
        (vm, detaches)
    }

    #[test]
    fn test_drop_detaches_once()
    {
        let (vm, detaches) = counting(false);
        {
            let mut guard = AttachGuard::new(vm);
            assert!(guard.load_agent_path(Path::new("/x.so"), "").is_err());
        }
        assert_eq!(detaches.get(), 1);
    }

    #[test]
    fn test_explicit_detach_disarms_drop()
    {
        let (vm, detaches) = counting(false);
        let guard = AttachGuard::new(vm);
        guard.detach().unwrap();
        assert_eq!(detaches.get(), 1);
    }

    #[test]
    fn test_failed_explicit_detach_is_not_retried()
    {
        let (vm, detaches) = counting(true);
        let guard = AttachGuard::new(vm);
        assert!(guard.detach().is_err());
        assert_eq!(detaches.get(), 1);
    }

    #[test]
    fn test_detach_on_panic_unwind()
    {
        let (vm, detaches) = counting(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = AttachGuard::new(vm);
            panic!("load blew up");
        }));
        assert!(result.is_err());
        assert_eq!(detaches.get(), 1);
    }
}
