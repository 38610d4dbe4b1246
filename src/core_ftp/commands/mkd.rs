use core::fmt::Write as _;

use heapless::String as FixedString;
use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the MKD (Make Directory) FTP command.
pub fn handle_mkd_command(auth: &AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    let path = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "Failed to create directory."),
    };
    match fs.make_dir(path.as_str()) {
        Ok(()) => {
            info!("MKD {}", path);
            let mut text: FixedString<320> = FixedString::new();
            let _ = write!(text, "\"{}\" directory created.", path);
            format_reply(257, text.as_str())
        }
        Err(e) => {
            debug!("MKD {} failed: {}", path, e);
            let (code, text) = e.ftp_reply();
            format_reply(code, text)
        }
    }
}
