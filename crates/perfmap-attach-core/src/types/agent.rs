//! Agent library location.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AttachError, Result};

/// File name of the perf map agent library.
pub const PERFMAP_LIBRARY_NAME: &str = "liblo2s-perfmap.so";

/// A native agent library identified by file name and lookup directory
///
/// The path handed to the target VM must be absolute: the VM resolves it
/// relative to *its* working directory otherwise. [`AgentLibrary::resolve`]
/// anchors relative directories at our current working directory, without
/// following symlinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLibrary
{
    name: String,
    dir: Option<PathBuf>,
}

impl AgentLibrary
{
    /// Library `name` looked up in the current working directory.
    pub fn new(name: impl Into<String>) -> Self
    {
        Self {
            name: name.into(),
            dir: None,
        }
    }

    /// The perf map agent in the current working directory.
    pub fn perfmap() -> Self
    {
        Self::new(PERFMAP_LIBRARY_NAME)
    }

    /// Look the library up in `dir` instead of the working directory.
    ///
    /// A relative `dir` is still taken relative to the working directory.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self
    {
        self.dir = Some(dir.into());
        self
    }

    /// Bare file name, for messages.
    pub fn file_name(&self) -> &str
    {
        &self.name
    }

    /// Directory override, if any.
    pub fn dir(&self) -> Option<&Path>
    {
        self.dir.as_deref()
    }

    /// Absolute path of the library.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the name is empty or contains a path separator
    /// - `Io`: the current working directory can't be determined
    pub fn resolve(&self) -> Result<PathBuf>
    {
        if Path::new(&self.name).file_name().and_then(|n| n.to_str()) != Some(self.name.as_str()) {
            return Err(AttachError::InvalidArgument(format!(
                "agent library name must be a bare file name, got '{}'",
                self.name
            )));
        }

        let relative = match &self.dir {
            Some(dir) => dir.join(&self.name),
            None => PathBuf::from(&self.name),
        };

        if relative.is_absolute() {
            return Ok(relative);
        }

        Ok(env::current_dir()?.join(relative))
    }
}

impl Default for AgentLibrary
{
    fn default() -> Self
    {
        Self::perfmap()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_is_perfmap_in_cwd()
    {
        let lib = AgentLibrary::default();
        assert_eq!(lib.file_name(), PERFMAP_LIBRARY_NAME);
        assert!(lib.dir().is_none());

        let resolved = lib.resolve().unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, env::current_dir().unwrap().join(PERFMAP_LIBRARY_NAME));
    }

    #[test]
    fn test_absolute_dir_is_used_verbatim()
    {
        let lib = AgentLibrary::perfmap().in_dir("/opt/lo2s/lib");
        assert_eq!(lib.resolve().unwrap(), PathBuf::from("/opt/lo2s/lib/liblo2s-perfmap.so"));
    }

    #[test]
    fn test_relative_dir_is_anchored_at_cwd()
    {
        let lib = AgentLibrary::new("libagent.so").in_dir("build/lib");
        let expected = env::current_dir().unwrap().join("build/lib/libagent.so");
        assert_eq!(lib.resolve().unwrap(), expected);
    }

    #[test]
    fn test_name_with_separator_is_rejected()
    {
        let lib = AgentLibrary::new("../libagent.so");
        assert!(matches!(lib.resolve(), Err(AttachError::InvalidArgument(_))));

        let empty = AgentLibrary::new("");
        assert!(matches!(empty.resolve(), Err(AttachError::InvalidArgument(_))));
    }
}
