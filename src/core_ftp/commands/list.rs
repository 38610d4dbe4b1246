use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::{AuthSession, DataChannel, ListTransfer, Transfer};
use crate::core_path::normalize;

/// Handles the LIST and NLST FTP commands.
///
/// Requires an armed passive listener. The 150 reply goes out immediately;
/// the directory is opened and streamed by the transfer stepper on the
/// following ticks, so a bad path surfaces as the closing 550.
pub fn handle_list_command(
    auth: &mut AuthSession,
    arg: &str,
    names_only: bool,
    now_ms: u64,
) -> ReplyBuf {
    // Clients routinely send ls flags ("LIST -la"); drop leading flag
    // words and keep the first path-looking token.
    let path_arg = arg
        .split_whitespace()
        .find(|word| !word.starts_with('-'))
        .unwrap_or("");

    let path = match normalize(auth.cwd.as_str(), path_arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "Failed to list directory."),
    };

    match core::mem::replace(&mut auth.transfer, Transfer::None) {
        Transfer::PassiveArmed { listener } => {
            info!("{} {}", if names_only { "NLST" } else { "LIST" }, path);
            auth.transfer = Transfer::List(ListTransfer {
                path,
                names_only,
                iter: None,
                data: DataChannel::Pending {
                    listener,
                    since_ms: now_ms,
                },
                pending: None,
            });
            format_reply(150, "Here comes the directory listing.")
        }
        other => {
            debug!("LIST without PASV");
            auth.transfer = other;
            format_reply(425, "Use PASV first.")
        }
    }
}
