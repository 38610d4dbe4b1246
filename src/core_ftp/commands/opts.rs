use crate::core_ftp::reply::{format_reply, ReplyBuf};

/// Handles the OPTS FTP command. Only `UTF8 ON` is recognized; names are
/// already passed through verbatim.
pub fn handle_opts_command(arg: &str) -> ReplyBuf {
    if arg.eq_ignore_ascii_case("UTF8 ON") {
        format_reply(200, "UTF8 set to on.")
    } else {
        format_reply(501, "Option not understood.")
    }
}
