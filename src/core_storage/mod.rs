//! Virtual-path capability set over the host filesystem.
//!
//! `SandboxFs` is the single choke point through which both protocol
//! variants touch storage: it re-normalizes every virtual path, maps it
//! under the fixed root, and forwards to the host adapter. Nothing above it
//! ever sees a host path.

use crate::core_host::fs::{DirIter, FileInfo, FileRead, FileWrite, HostFs};
use crate::core_path::{normalize, to_host};
use crate::error::FsError;

pub struct SandboxFs<'h> {
    host: &'h dyn HostFs,
    root: &'h str,
}

impl<'h> SandboxFs<'h> {
    pub fn new(host: &'h dyn HostFs, root: &'h str) -> Self {
        Self { host, root }
    }

    pub fn root(&self) -> &str {
        self.root
    }

    /// Map an absolute virtual path to its host form, re-normalizing
    /// defensively so a stray `..` can never escape the root.
    fn host_path(&self, vpath: &str) -> Result<crate::core_path::HostPathBuf, FsError> {
        let norm = normalize("/", vpath)?;
        Ok(to_host(self.root, norm.as_str())?)
    }

    pub fn stat(&self, vpath: &str) -> Result<FileInfo, FsError> {
        self.host.stat(self.host_path(vpath)?.as_str())
    }

    pub fn open_read(&self, vpath: &str) -> Result<Box<dyn FileRead>, FsError> {
        self.host.open_read(self.host_path(vpath)?.as_str())
    }

    pub fn open_write_trunc(&self, vpath: &str) -> Result<Box<dyn FileWrite>, FsError> {
        self.host.open_write_trunc(self.host_path(vpath)?.as_str())
    }

    pub fn dir_open(&self, vpath: &str) -> Result<Box<dyn DirIter>, FsError> {
        self.host.dir_open(self.host_path(vpath)?.as_str())
    }

    pub fn delete(&self, vpath: &str) -> Result<(), FsError> {
        self.host.delete(self.host_path(vpath)?.as_str())
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let from = self.host_path(from)?;
        let to = self.host_path(to)?;
        self.host.rename(from.as_str(), to.as_str())
    }

    pub fn make_dir(&self, vpath: &str) -> Result<(), FsError> {
        self.host.make_dir(self.host_path(vpath)?.as_str())
    }

    pub fn remove_dir(&self, vpath: &str) -> Result<(), FsError> {
        self.host.remove_dir(self.host_path(vpath)?.as_str())
    }

    pub fn file_size(&self, vpath: &str) -> Result<u64, FsError> {
        let info = self.stat(vpath)?;
        if info.is_dir {
            return Err(FsError::IsDir);
        }
        Ok(info.size)
    }

    pub fn file_mtime(&self, vpath: &str) -> Result<i64, FsError> {
        let info = self.stat(vpath)?;
        info.mtime_unix.ok_or(FsError::Io)
    }
}
