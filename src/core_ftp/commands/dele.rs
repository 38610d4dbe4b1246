use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the DELE (Delete File) FTP command.
pub fn handle_dele_command(auth: &AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    let path = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "Failed to delete file."),
    };
    match fs.delete(path.as_str()) {
        Ok(()) => {
            info!("DELE {}", path);
            format_reply(250, "File deleted.")
        }
        Err(e) => {
            debug!("DELE {} failed: {}", path, e);
            let (code, text) = e.ftp_reply();
            format_reply(code, text)
        }
    }
}
