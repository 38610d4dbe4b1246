//! One-chunk-per-tick transfer stepping.
//!
//! Each in-flight transfer advances by at most one transfer-buffer-sized
//! chunk per tick. The stepper never blocks beyond the adapter timeouts it
//! passes: 0 for data-channel probes, the send timeout for flushing a chunk.

use log::{debug, trace, warn};

use crate::constants::{PASV_ACCEPT_DEADLINE_MS, POLL_TIMEOUT_MS, SEND_TIMEOUT_MS, TRANSFER_BUF};
use crate::core_ftp::listfmt::{format_list_line, format_nlst_line};
use crate::core_ftp::session::{DataChannel, ListTransfer, RetrTransfer, StorTransfer};
use crate::core_host::fs::FileWrite;
use crate::core_host::net::{send_all, Conn};
use crate::core_storage::SandboxFs;
use crate::error::NetError;

/// What one tick of stepping produced.
pub enum StepResult {
    /// Transfer still in flight; try again next tick.
    Progress,
    Finished(Outcome),
}

/// Terminal state of a transfer, mapped to control-channel replies by the
/// server: 226, 550, 426+550, or 425 respectively.
pub enum Outcome {
    Complete,
    Failed,
    DataError,
    PasvTimeout,
}

/// Accept the pending passive data connection if the client has arrived.
fn poll_data(data: &mut DataChannel, now_ms: u64) -> Result<bool, Outcome> {
    if let DataChannel::Pending { listener, since_ms } = data {
        match listener.accept(POLL_TIMEOUT_MS) {
            Ok(conn) => {
                trace!("data connection accepted on port {}", listener.local_port());
                *data = DataChannel::Open(conn);
            }
            Err(NetError::WouldBlock) => {
                if now_ms.saturating_sub(*since_ms) > PASV_ACCEPT_DEADLINE_MS {
                    warn!("client never opened the data connection");
                    return Err(Outcome::PasvTimeout);
                }
                return Ok(false);
            }
            Err(_) => return Err(Outcome::DataError),
        }
    }
    Ok(true)
}

fn open_conn(data: &mut DataChannel) -> &mut dyn Conn {
    match data {
        DataChannel::Open(conn) => conn.as_mut(),
        // poll_data() ran first; Pending cannot reach here.
        DataChannel::Pending { .. } => unreachable!("data channel not open"),
    }
}

pub fn step_list(
    t: &mut ListTransfer,
    fs: &SandboxFs<'_>,
    now_unix: i64,
    now_ms: u64,
    xfer: &mut [u8; TRANSFER_BUF],
) -> StepResult {
    match poll_data(&mut t.data, now_ms) {
        Ok(true) => {}
        Ok(false) => return StepResult::Progress,
        Err(outcome) => return StepResult::Finished(outcome),
    }

    if t.iter.is_none() {
        match fs.dir_open(t.path.as_str()) {
            Ok(iter) => t.iter = Some(iter),
            Err(e) => {
                debug!("LIST failed to open {}: {}", t.path, e);
                return StepResult::Finished(Outcome::Failed);
            }
        }
    }
    let iter = t.iter.as_mut().expect("iterator just installed");

    // Fill the transfer buffer with whole lines, then send once.
    let mut filled = 0usize;
    let mut exhausted = false;
    if let Some(line) = t.pending.take() {
        xfer[..line.len()].copy_from_slice(line.as_bytes());
        filled = line.len();
    }
    while !exhausted {
        let entry = match iter.next_entry() {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                exhausted = true;
                break;
            }
            Err(e) => {
                debug!("LIST iteration failed: {}", e);
                return StepResult::Finished(Outcome::Failed);
            }
        };
        let line = if t.names_only {
            format_nlst_line(&entry)
        } else {
            format_list_line(&entry, now_unix)
        };
        if filled + line.len() > xfer.len() {
            t.pending = Some(line);
            break;
        }
        xfer[filled..filled + line.len()].copy_from_slice(line.as_bytes());
        filled += line.len();
    }

    if filled > 0 {
        if send_all(open_conn(&mut t.data), &xfer[..filled], SEND_TIMEOUT_MS).is_err() {
            return StepResult::Finished(Outcome::DataError);
        }
    }
    if exhausted && t.pending.is_none() {
        StepResult::Finished(Outcome::Complete)
    } else {
        StepResult::Progress
    }
}

pub fn step_retr(t: &mut RetrTransfer, now_ms: u64, xfer: &mut [u8; TRANSFER_BUF]) -> StepResult {
    match poll_data(&mut t.data, now_ms) {
        Ok(true) => {}
        Ok(false) => return StepResult::Progress,
        Err(outcome) => return StepResult::Finished(outcome),
    }

    if t.ascii {
        // Read a quarter buffer, expand LF to CRLF into the disjoint lower
        // half; worst case doubles the input.
        let (dst, src) = xfer.split_at_mut(TRANSFER_BUF / 2);
        let n = match t.reader.read(&mut src[..TRANSFER_BUF / 4]) {
            Ok(0) => return StepResult::Finished(Outcome::Complete),
            Ok(n) => n,
            Err(e) => {
                debug!("RETR read failed: {}", e);
                return StepResult::Finished(Outcome::Failed);
            }
        };
        let m = expand_lf_to_crlf(&src[..n], dst, &mut t.last_was_cr);
        if send_all(open_conn(&mut t.data), &dst[..m], SEND_TIMEOUT_MS).is_err() {
            return StepResult::Finished(Outcome::DataError);
        }
    } else {
        let n = match t.reader.read(xfer) {
            Ok(0) => return StepResult::Finished(Outcome::Complete),
            Ok(n) => n,
            Err(e) => {
                debug!("RETR read failed: {}", e);
                return StepResult::Finished(Outcome::Failed);
            }
        };
        if send_all(open_conn(&mut t.data), &xfer[..n], SEND_TIMEOUT_MS).is_err() {
            return StepResult::Finished(Outcome::DataError);
        }
    }
    StepResult::Progress
}

pub fn step_stor(t: &mut StorTransfer, now_ms: u64, xfer: &mut [u8; TRANSFER_BUF]) -> StepResult {
    match poll_data(&mut t.data, now_ms) {
        Ok(true) => {}
        Ok(false) => return StepResult::Progress,
        Err(outcome) => return StepResult::Finished(outcome),
    }

    let n = match open_conn(&mut t.data).recv(xfer, POLL_TIMEOUT_MS) {
        Ok(n) => n,
        Err(NetError::WouldBlock) => return StepResult::Progress,
        Err(NetError::Closed) => {
            // Orderly client close is the end-of-file marker for STOR. A
            // trailing CR held in ASCII mode was not part of a CRLF pair.
            if t.held_cr {
                if write_all(t.writer.as_mut(), b"\r").is_err() {
                    return StepResult::Finished(Outcome::Failed);
                }
            }
            return StepResult::Finished(Outcome::Complete);
        }
        Err(NetError::Io) => return StepResult::Finished(Outcome::DataError),
    };

    if t.ascii {
        // Strip CRs that immediately precede LFs, carrying a trailing CR
        // across chunk boundaries. Output never exceeds input plus the
        // held byte.
        let mut held = t.held_cr;
        let mut out = 0usize;
        let mut scratch = [0u8; TRANSFER_BUF + 1];
        for i in 0..n {
            let b = xfer[i];
            if held {
                if b != b'\n' {
                    scratch[out] = b'\r';
                    out += 1;
                }
                held = false;
            }
            if b == b'\r' {
                held = true;
            } else {
                scratch[out] = b;
                out += 1;
            }
        }
        t.held_cr = held;
        if write_all(t.writer.as_mut(), &scratch[..out]).is_err() {
            return StepResult::Finished(Outcome::Failed);
        }
    } else if write_all(t.writer.as_mut(), &xfer[..n]).is_err() {
        return StepResult::Finished(Outcome::Failed);
    }
    StepResult::Progress
}

fn write_all(writer: &mut dyn FileWrite, mut buf: &[u8]) -> Result<(), crate::error::FsError> {
    while !buf.is_empty() {
        let n = writer.write(buf)?;
        if n == 0 {
            return Err(crate::error::FsError::Io);
        }
        buf = &buf[n..];
    }
    Ok(())
}

/// ASCII-mode outbound translation: bare LF becomes CRLF, existing CRLFs
/// pass through. `last_was_cr` carries the lookahead across chunks.
fn expand_lf_to_crlf(src: &[u8], dst: &mut [u8], last_was_cr: &mut bool) -> usize {
    let mut out = 0usize;
    for &b in src {
        if b == b'\n' && !*last_was_cr {
            dst[out] = b'\r';
            out += 1;
        }
        dst[out] = b;
        out += 1;
        *last_was_cr = b == b'\r';
    }
    out
}
