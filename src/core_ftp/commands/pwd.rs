use core::fmt::Write as _;

use heapless::String as FixedString;
use log::info;

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;

/// Handles the PWD FTP command.
pub fn handle_pwd_command(auth: &AuthSession) -> ReplyBuf {
    info!("PWD -> {}", auth.cwd);
    let mut text: FixedString<320> = FixedString::new();
    let _ = write!(text, "\"{}\" is the current directory.", auth.cwd);
    format_reply(257, text.as_str())
}
