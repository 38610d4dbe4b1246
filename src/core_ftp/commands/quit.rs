use log::info;

use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the QUIT FTP command. The server closes the control connection
/// after the reply is flushed.
pub fn handle_quit_command() -> ReplyBuf {
    info!("received QUIT, closing control connection");
    format_reply(221, "Service closing control connection.")
}
