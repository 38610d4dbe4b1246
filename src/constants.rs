// src/constants.rs

/// Maximum length of a client-visible virtual path, excluding the NUL the
/// host ABI appends.
pub const PATH_MAX: usize = 256;

/// Host path capacity: fixed root + virtual path + separator + NUL.
pub const HOST_PATH_MAX: usize = 512;

/// Fixed storage root every virtual path is mapped under.
pub const DEFAULT_ROOT: &str = "/sdcard";

pub const FTP_PORT: u16 = 21;
pub const HTTP_PORT: u16 = 8080;

/// Inclusive passive-mode port range.
pub const PASV_PORT_MIN: u16 = 50000;
pub const PASV_PORT_MAX: u16 = 50100;

/// Per-session buffer capacities, allocated once at server start.
pub const CMD_BUF: usize = 1024;
pub const REPLY_BUF: usize = 1024;
pub const TRANSFER_BUF: usize = 8192;
pub const SCRATCH_BUF: usize = 1024;

/// HTTP request head (request line + headers) scratch.
pub const HEADER_BUF: usize = 16 * 1024;
pub const MAX_HEADERS: usize = 64;
pub const TARGET_MAX: usize = 1024;

/// Adapter timeouts, milliseconds.
pub const POLL_TIMEOUT_MS: u32 = 0;
pub const FRAME_READ_TIMEOUT_MS: u32 = 5000;
pub const SEND_TIMEOUT_MS: u32 = 5000;

/// A passive data connection the client never opens is abandoned after this.
pub const PASV_ACCEPT_DEADLINE_MS: u64 = 10_000;

/// Host tick cadence the daemon binary drives.
pub const TICK_INTERVAL_MS: u64 = 33;

pub const FTP_BANNER: &str = "Paper Portal FTP Ready";
pub const SERVER_NAME: &str = "PaperPortal/0.2";
