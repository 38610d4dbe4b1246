use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the RNTO (Rename To) FTP command.
///
/// Requires a preceding RNFR. The pending source is cleared whether the
/// rename succeeds or not.
pub fn handle_rnto_command(auth: &mut AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    let from = match auth.rename_from.take() {
        Some(path) => path,
        None => return format_reply(503, "Bad sequence of commands."),
    };
    if arg.is_empty() {
        return super::syntax_error();
    }
    let to = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "Failed to rename file or directory."),
    };
    match fs.rename(from.as_str(), to.as_str()) {
        Ok(()) => {
            info!("renamed {} -> {}", from, to);
            format_reply(250, "File or directory renamed successfully.")
        }
        Err(e) => {
            debug!("rename {} -> {} failed: {}", from, to, e);
            let (code, text) = e.ftp_reply();
            format_reply(code, text)
        }
    }
}
