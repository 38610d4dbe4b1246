use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the NOOP FTP command.
pub fn handle_noop_command() -> ReplyBuf {
    format_reply(200, "OK.")
}
