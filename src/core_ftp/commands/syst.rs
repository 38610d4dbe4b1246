use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the SYST FTP command.
pub fn handle_syst_command() -> ReplyBuf {
    format_reply(215, "UNIX Type: L8")
}
