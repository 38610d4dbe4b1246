use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the CWD FTP command.
///
/// The target is resolved against the session's current directory, must
/// exist, and must be a directory.
pub fn handle_cwd_command(auth: &mut AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    let target = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "Failed to change directory."),
    };
    match fs.stat(target.as_str()) {
        Ok(info) if info.is_dir => {
            info!("CWD {} -> {}", arg, target);
            auth.cwd = target;
            format_reply(250, "Directory successfully changed.")
        }
        Ok(_) | Err(_) => {
            debug!("CWD {} rejected", arg);
            format_reply(550, "Failed to change directory.")
        }
    }
}
