use log::info;

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;

/// Handles the RNFR (Rename From) FTP command.
///
/// The source is only normalized and remembered; existence is checked by
/// the rename itself when RNTO arrives.
pub fn handle_rnfr_command(auth: &mut AuthSession, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => {
            info!("RNFR {}", path);
            auth.rename_from = Some(path);
            format_reply(350, "Ready for RNTO.")
        }
        Err(_) => {
            auth.rename_from = None;
            format_reply(550, "Invalid path.")
        }
    }
}
