//! # Platform-Specific Implementations
//!
//! Attach backends, one per runtime/platform combination.
//!
//! - **hotspot**: HotSpot JVM dynamic attach over a Unix domain socket
//!   (Linux; the module builds on any Unix so the types stay nameable)
//!
//! Each backend implements [`crate::attacher::Attacher`] and
//! [`crate::attacher::VirtualMachine`].

#[cfg(unix)]
pub mod hotspot;
