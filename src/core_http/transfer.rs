//! One-chunk-per-tick body streaming for the WebDAV variant.
//!
//! A handler that needs to move more than a response head hands the engine
//! a `BodyTransfer` record; the server steps it once per tick, exactly like
//! the FTP data-transfer steppers. Each step moves at most one
//! transfer-buffer-sized chunk and returns.

use log::debug;

use crate::constants::TRANSFER_BUF;
use crate::core_host::fs::{FileRead, FileWrite};
use crate::core_http::exchange::Wire;
use crate::core_path::VPathBuf;
use crate::core_storage::SandboxFs;
use crate::error::{FsError, HttpError};

/// What one tick of stepping produced.
pub enum Step {
    /// Transfer still in flight; step again next tick.
    Progress,
    /// Response fully written; the exchange can complete.
    Done,
    /// Framing-level failure; the server closes the connection, answering
    /// with the error status first when no head has gone out yet.
    Failed(HttpError),
}

/// The single in-flight body transfer of the active exchange.
pub enum BodyTransfer {
    /// File to response body; the response head is already written.
    Get(GetStream),
    /// Request body to file; the empty-body reply goes out at body end.
    Put(PutSink),
    /// Sandbox-internal file copy, for COPY and the MOVE cross-device
    /// fallback.
    Copy(CopyStream),
}

impl BodyTransfer {
    pub fn step(
        &mut self,
        fs: &SandboxFs<'_>,
        wire: &mut Wire<'_>,
        buf: &mut [u8; TRANSFER_BUF],
    ) -> Step {
        match self {
            BodyTransfer::Get(t) => t.step(wire, buf),
            BodyTransfer::Put(t) => t.step(wire, buf),
            BodyTransfer::Copy(t) => t.step(fs, wire, buf),
        }
    }
}

pub struct GetStream {
    pub reader: Box<dyn FileRead>,
    /// Body bytes still owed against the Content-Length already sent.
    pub remaining: u64,
}

impl GetStream {
    fn step(&mut self, wire: &mut Wire<'_>, buf: &mut [u8; TRANSFER_BUF]) -> Step {
        if self.remaining == 0 {
            return finish(wire);
        }
        let want = self.remaining.min(buf.len() as u64) as usize;
        let n = match self.reader.read(&mut buf[..want]) {
            // The file shrank under us; the promised length cannot be met.
            Ok(0) => return Step::Failed(HttpError::UnexpectedEndOfStream),
            Ok(n) => n,
            Err(e) => {
                debug!("GET read failed: {}", e);
                return Step::Failed(HttpError::UnexpectedEndOfStream);
            }
        };
        if let Err(e) = wire.write_body(&buf[..n]) {
            return Step::Failed(e);
        }
        self.remaining -= n as u64;
        if self.remaining == 0 {
            finish(wire)
        } else {
            Step::Progress
        }
    }
}

pub struct PutSink {
    pub writer: Box<dyn FileWrite>,
    /// 201 for a fresh resource, 204 for an overwrite.
    pub status: u16,
}

impl PutSink {
    fn step(&mut self, wire: &mut Wire<'_>, buf: &mut [u8; TRANSFER_BUF]) -> Step {
        let n = match wire.read_body(buf) {
            Ok(n) => n,
            Err(e) => return Step::Failed(e),
        };
        if n == 0 {
            return respond(wire, self.status);
        }
        if write_all(self.writer.as_mut(), &buf[..n]).is_err() {
            return respond(wire, 500);
        }
        Step::Progress
    }
}

pub struct CopyStream {
    pub reader: Box<dyn FileRead>,
    pub writer: Box<dyn FileWrite>,
    /// 201 for a fresh destination, 204 for an overwrite.
    pub status: u16,
    /// MOVE fallback removes the source once the copy has landed.
    pub delete_source: Option<VPathBuf>,
}

impl CopyStream {
    fn step(
        &mut self,
        fs: &SandboxFs<'_>,
        wire: &mut Wire<'_>,
        buf: &mut [u8; TRANSFER_BUF],
    ) -> Step {
        let n = match self.reader.read(buf) {
            Ok(n) => n,
            Err(e) => {
                debug!("copy read failed: {}", e);
                return respond(wire, 500);
            }
        };
        if n == 0 {
            if let Some(source) = self.delete_source.take() {
                let _ = fs.delete(source.as_str());
            }
            return respond(wire, self.status);
        }
        if write_all(self.writer.as_mut(), &buf[..n]).is_err() {
            return respond(wire, 500);
        }
        Step::Progress
    }
}

fn finish(wire: &mut Wire<'_>) -> Step {
    match wire.finish() {
        Ok(()) => Step::Done,
        Err(e) => Step::Failed(e),
    }
}

fn respond(wire: &mut Wire<'_>, status: u16) -> Step {
    match wire.respond_empty(status, &[]) {
        Ok(()) => Step::Done,
        Err(e) => Step::Failed(e),
    }
}

fn write_all(writer: &mut dyn FileWrite, mut buf: &[u8]) -> Result<(), FsError> {
    while !buf.is_empty() {
        let n = writer.write(buf)?;
        if n == 0 {
            return Err(FsError::Io);
        }
        buf = &buf[n..];
    }
    Ok(())
}
