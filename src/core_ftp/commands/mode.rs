use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the MODE FTP command. Only stream mode is supported.
pub fn handle_mode_command(arg: &str) -> ReplyBuf {
    if arg.eq_ignore_ascii_case("S") {
        format_reply(200, "Mode set to S.")
    } else {
        format_reply(504, "Command not implemented for that parameter.")
    }
}
