use heapless::String as FixedString;

use crate::error::FsError;

/// Longest directory entry name the iterator will surface.
pub const NAME_MAX: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub is_dir: bool,
    /// Unix seconds; `None` when the host filesystem has no usable mtime.
    pub mtime_unix: Option<i64>,
}

/// One directory entry, `.` and `..` always filtered out.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: FixedString<NAME_MAX>,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub mtime_unix: Option<i64>,
}

/// Open file being read. `read` returning 0 means EOF.
pub trait FileRead {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError>;
}

/// Open file being written (truncate-and-create semantics). Partial writes
/// are returned honestly so the engine can resume.
pub trait FileWrite {
    fn write(&mut self, buf: &[u8]) -> Result<usize, FsError>;
}

/// Lazy, finite directory walk; restart by reopening.
pub trait DirIter {
    fn next_entry(&mut self) -> Result<Option<DirEntry>, FsError>;
}

/// Host filesystem capability set. All paths are host-absolute, already
/// mapped under the fixed root by the path layer.
pub trait HostFs {
    fn stat(&self, path: &str) -> Result<FileInfo, FsError>;
    fn open_read(&self, path: &str) -> Result<Box<dyn FileRead>, FsError>;
    fn open_write_trunc(&self, path: &str) -> Result<Box<dyn FileWrite>, FsError>;
    fn dir_open(&self, path: &str) -> Result<Box<dyn DirIter>, FsError>;
    fn delete(&self, path: &str) -> Result<(), FsError>;
    fn rename(&self, from: &str, to: &str) -> Result<(), FsError>;
    fn make_dir(&self, path: &str) -> Result<(), FsError>;
    fn remove_dir(&self, path: &str) -> Result<(), FsError>;
}
