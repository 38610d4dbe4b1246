use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the STRU FTP command. Only file structure is supported.
pub fn handle_stru_command(arg: &str) -> ReplyBuf {
    if arg.eq_ignore_ascii_case("F") {
        format_reply(200, "Structure set to F.")
    } else {
        format_reply(504, "Command not implemented for that parameter.")
    }
}
