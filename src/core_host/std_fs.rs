use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::time::UNIX_EPOCH;

use log::warn;

use super::fs::{DirEntry, DirIter, FileInfo, FileRead, FileWrite, HostFs};
use crate::error::FsError;

/// `std::fs` implementation of the host filesystem adapter.
#[derive(Debug, Default)]
pub struct StdFs;

fn map_io(e: std::io::Error) -> FsError {
    match e.kind() {
        ErrorKind::NotFound => FsError::NotFound,
        ErrorKind::AlreadyExists => FsError::Exists,
        ErrorKind::DirectoryNotEmpty => FsError::NotEmpty,
        ErrorKind::CrossesDevices => FsError::CrossDevice,
        ErrorKind::IsADirectory => FsError::IsDir,
        ErrorKind::InvalidInput => FsError::InvalidPath,
        _ => FsError::Io,
    }
}

fn mtime_unix(meta: &fs::Metadata) -> Option<i64> {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
}

impl HostFs for StdFs {
    fn stat(&self, path: &str) -> Result<FileInfo, FsError> {
        let meta = fs::metadata(path).map_err(map_io)?;
        Ok(FileInfo {
            size: meta.len(),
            is_dir: meta.is_dir(),
            mtime_unix: mtime_unix(&meta),
        })
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn FileRead>, FsError> {
        let meta = fs::metadata(path).map_err(map_io)?;
        if meta.is_dir() {
            return Err(FsError::IsDir);
        }
        let file = fs::File::open(path).map_err(map_io)?;
        Ok(Box::new(StdFileRead { file }))
    }

    fn open_write_trunc(&self, path: &str) -> Result<Box<dyn FileWrite>, FsError> {
        let file = fs::File::create(path).map_err(map_io)?;
        Ok(Box::new(StdFileWrite { file }))
    }

    fn dir_open(&self, path: &str) -> Result<Box<dyn DirIter>, FsError> {
        let rd = fs::read_dir(path).map_err(map_io)?;
        Ok(Box::new(StdDirIter { rd }))
    }

    fn delete(&self, path: &str) -> Result<(), FsError> {
        fs::remove_file(path).map_err(map_io)
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        fs::rename(from, to).map_err(map_io)
    }

    fn make_dir(&self, path: &str) -> Result<(), FsError> {
        match fs::create_dir(path) {
            Ok(()) => Ok(()),
            // create_dir reports a missing parent as NotFound; keep it.
            Err(e) => Err(map_io(e)),
        }
    }

    fn remove_dir(&self, path: &str) -> Result<(), FsError> {
        fs::remove_dir(path).map_err(map_io)
    }
}

struct StdFileRead {
    file: fs::File,
}

impl FileRead for StdFileRead {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        loop {
            match self.file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io(e)),
            }
        }
    }
}

struct StdFileWrite {
    file: fs::File,
}

impl FileWrite for StdFileWrite {
    fn write(&mut self, buf: &[u8]) -> Result<usize, FsError> {
        loop {
            match self.file.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io(e)),
            }
        }
    }
}

struct StdDirIter {
    rd: fs::ReadDir,
}

impl DirIter for StdDirIter {
    fn next_entry(&mut self) -> Result<Option<DirEntry>, FsError> {
        loop {
            let entry = match self.rd.next() {
                None => return Ok(None),
                Some(Err(e)) => return Err(map_io(e)),
                Some(Ok(entry)) => entry,
            };
            let os_name = entry.file_name();
            let name = match os_name.to_str() {
                Some(s) => s,
                None => {
                    warn!("skipping non-UTF-8 directory entry in {:?}", entry.path());
                    continue;
                }
            };
            // read_dir never yields `.`/`..` but belt and braces for other
            // HostFs implementations that route through here.
            if name == "." || name == ".." {
                continue;
            }
            let mut fixed = heapless::String::new();
            if fixed.push_str(name).is_err() {
                warn!("skipping over-long directory entry name ({} bytes)", name.len());
                continue;
            }
            let meta = entry.metadata().ok();
            return Ok(Some(DirEntry {
                name: fixed,
                is_dir: meta.as_ref().map(|m| m.is_dir()).unwrap_or(false),
                size: meta.as_ref().map(|m| m.len()),
                mtime_unix: meta.as_ref().and_then(mtime_unix),
            }));
        }
    }
}
