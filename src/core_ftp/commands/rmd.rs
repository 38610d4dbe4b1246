use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the RMD (Remove Directory) FTP command.
pub fn handle_rmd_command(auth: &AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    let path = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "Failed to remove directory."),
    };
    match fs.remove_dir(path.as_str()) {
        Ok(()) => {
            info!("RMD {}", path);
            format_reply(250, "Directory removed.")
        }
        Err(e) => {
            debug!("RMD {} failed: {}", path, e);
            let (code, text) = e.ftp_reply();
            format_reply(code, text)
        }
    }
}
