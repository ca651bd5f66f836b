//! # perfmap-attach-core
//!
//! Attach to a running JVM once and load a native agent library into it.
//!
//! This crate provides:
//! - [`loader::load_agent`], the attach-and-load operation
//! - the [`Attacher`]/[`VirtualMachine`] seam it is written against
//! - a HotSpot dynamic attach backend for Linux
//! - an RAII guard that detaches on every exit path
//!
//! ## Example
//!
//! ```rust,no_run
//! use perfmap_attach_core::attacher::create_attacher;
//! use perfmap_attach_core::loader::load_agent;
//! use perfmap_attach_core::platform::hotspot::AttachConfig;
//! use perfmap_attach_core::types::{AgentLibrary, ProcessId};
//!
//! let attacher = create_attacher(AttachConfig::default())?;
//! let outcome = load_agent(&attacher, "4242".parse::<ProcessId>()?, &AgentLibrary::perfmap())?;
//! println!("{outcome:?}");
//! # Ok::<(), perfmap_attach_core::error::AttachError>(())
//! ```
//!
//! ## Why unsafe code is needed
//!
//! Signalling the target (`kill`) and reading our effective uid go through
//! `libc`. Those calls are wrapped in `platform::hotspot::ffi`.

#![allow(unsafe_code)] // Required for libc::kill / libc::geteuid

pub mod attacher;
pub mod error;
pub mod guards;
pub mod loader;
pub mod platform;
pub mod types;

pub use attacher::{Attacher, VirtualMachine};
// Re-export commonly used types
pub use error::{AttachError, Result};
pub use loader::{load_agent, LoadOutcome};
#[cfg(unix)]
pub use platform::hotspot::{AttachConfig, HotSpotAttacher};
pub use types::{AgentLibrary, ProcessId};
