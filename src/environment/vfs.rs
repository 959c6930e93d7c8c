//! Virtual file systems

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use crate::error::Result;

/// Read access to game data files by absolute unix style path
pub trait VirtualFileSystem {
    fn exists(&self, path: &str) -> bool;
    fn read_to_string(&self, path: &str) -> Result<String>;
}

/// File system backed by a map, used by tests and tools
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RefCell<HashMap<String, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<String>, content: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), content.into());
    }

    pub fn remove_file(&self, path: &str) -> bool {
        self.files.borrow_mut().remove(path).is_some()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn read_to_string(&self, path: &str) -> Result<String> {
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("file not found: {}", path)).into()
        })
    }
}

/// File system rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl VirtualFileSystem for DiskFileSystem {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn read_to_string(&self, path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.resolve(path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IgdeError;

    #[test]
    fn test_memory_file_system() {
        let vfs = MemoryFileSystem::new();
        vfs.add_file("/worlds/a.deworld", "<world/>");

        assert!(vfs.exists("/worlds/a.deworld"));
        assert_eq!(vfs.read_to_string("/worlds/a.deworld").unwrap(), "<world/>");
        assert!(matches!(vfs.read_to_string("/missing"), Err(IgdeError::Io(_))));

        assert!(vfs.remove_file("/worlds/a.deworld"));
        assert!(!vfs.exists("/worlds/a.deworld"));
    }

    #[test]
    fn test_disk_file_system_resolves_below_root() {
        let vfs = DiskFileSystem::new("/data");
        assert_eq!(vfs.resolve("/worlds/a.deworld"), PathBuf::from("/data/worlds/a.deworld"));
        assert!(!vfs.exists("/definitely/not/here.deworld"));
    }
}
