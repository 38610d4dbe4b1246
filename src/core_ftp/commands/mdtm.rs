use core::fmt::Write as _;

use chrono::{DateTime, Utc};
use heapless::String as FixedString;
use log::debug;

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::AuthSession;
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the MDTM (Modification Time) FTP command, answering the file's
/// mtime as `YYYYMMDDhhmmss` in UTC.
pub fn handle_mdtm_command(auth: &AuthSession, fs: &SandboxFs<'_>, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    let path = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "File not found."),
    };
    let stamp = fs
        .file_mtime(path.as_str())
        .ok()
        .and_then(|mtime| DateTime::<Utc>::from_timestamp(mtime, 0));
    match stamp {
        Some(when) => {
            let mut text: FixedString<24> = FixedString::new();
            let _ = write!(text, "{}", when.format("%Y%m%d%H%M%S"));
            format_reply(213, text.as_str())
        }
        None => {
            debug!("MDTM {} failed", path);
            format_reply(550, "File not found.")
        }
    }
}
