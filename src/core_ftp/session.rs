//! Per-connection FTP session state.
//!
//! The session is a tagged variant chain: authentication phase, then the
//! single outstanding transfer. Holding the directory iterator, file reader,
//! and file writer inside the `Transfer` variants makes the at-most-one-
//! live-handle rule structural rather than a runtime check.

use heapless::String as FixedString;

use crate::core_host::fs::{DirIter, FileRead, FileWrite};
use crate::core_host::net::{Conn, Listener};
use crate::core_path::VPathBuf;

pub const USER_MAX: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

pub enum Session {
    Unauth,
    UserSupplied { user: FixedString<USER_MAX> },
    Authenticated(AuthSession),
}

impl Session {
    pub fn new() -> Self {
        Session::Unauth
    }

    pub fn authenticated(&mut self) -> Option<&mut AuthSession> {
        match self {
            Session::Authenticated(auth) => Some(auth),
            _ => None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

pub struct AuthSession {
    pub cwd: VPathBuf,
    pub ttype: TransferType,
    pub rename_from: Option<VPathBuf>,
    pub transfer: Transfer,
}

impl AuthSession {
    pub fn new() -> Self {
        let mut cwd = VPathBuf::new();
        // Capacity is far above one byte.
        let _ = cwd.push('/');
        Self {
            cwd,
            ttype: TransferType::Binary,
            rename_from: None,
            transfer: Transfer::None,
        }
    }
}

/// The single outstanding transfer, or the armed passive listener waiting
/// for a transfer command.
pub enum Transfer {
    None,
    PassiveArmed { listener: Box<dyn Listener> },
    List(ListTransfer),
    Retr(RetrTransfer),
    Stor(StorTransfer),
}

impl Transfer {
    /// True while a data transfer spans ticks; command dispatch pauses for
    /// the duration. An armed passive listener does not pause dispatch.
    pub fn in_progress(&self) -> bool {
        matches!(
            self,
            Transfer::List(_) | Transfer::Retr(_) | Transfer::Stor(_)
        )
    }
}

/// Data connection lifecycle: a passive listener still waiting for the
/// client, then the accepted stream.
pub enum DataChannel {
    Pending {
        listener: Box<dyn Listener>,
        since_ms: u64,
    },
    Open(Box<dyn Conn>),
}

pub struct ListTransfer {
    pub path: VPathBuf,
    pub names_only: bool,
    /// Opened on the first tick after the data connection is up.
    pub iter: Option<Box<dyn DirIter>>,
    pub data: DataChannel,
    /// Line that did not fit into the transfer buffer last tick.
    pub pending: Option<crate::core_ftp::listfmt::ListLine>,
}

pub struct RetrTransfer {
    pub reader: Box<dyn FileRead>,
    pub data: DataChannel,
    pub ascii: bool,
    /// Last byte sent was CR; suppresses doubling an existing CRLF across
    /// chunk boundaries in ASCII mode.
    pub last_was_cr: bool,
}

pub struct StorTransfer {
    pub writer: Box<dyn FileWrite>,
    pub data: DataChannel,
    pub ascii: bool,
    /// A CR arrived at the end of the previous chunk and is held until the
    /// next byte decides whether it precedes an LF.
    pub held_cr: bool,
}
