use core::fmt::Write as _;

use heapless::String as FixedString;
use log::debug;

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the SIZE (File Size) FTP command.
pub fn handle_size_command(auth: &AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    let path = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "File not found."),
    };
    match fs.file_size(path.as_str()) {
        Ok(size) => {
            let mut text: FixedString<24> = FixedString::new();
            let _ = write!(text, "{}", size);
            format_reply(213, text.as_str())
        }
        Err(e) => {
            debug!("SIZE {} failed: {}", path, e);
            format_reply(550, "File not found.")
        }
    }
}
