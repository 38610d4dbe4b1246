use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the ALLO FTP command. Storage is never pre-allocated here.
pub fn handle_allo_command() -> ReplyBuf {
    format_reply(202, "No storage allocation necessary.")
}
