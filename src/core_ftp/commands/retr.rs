use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::{AuthSession, DataChannel, RetrTransfer, Transfer, TransferType};
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the RETR (Retrieve) FTP command.
///
/// Opens the file reader up front so an unreadable path answers 550 without
/// a data transfer; on success the 150 reply goes out and the stepper
/// streams chunks on the following ticks.
pub fn handle_retr_command(
    auth: &mut AuthSession,
    fs: &SandboxFs<'_>,
    arg: &str,
    now_ms: u64,
) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    let path = match normalize(auth.cwd.as_str(), arg) {
        Ok(path) => path,
        Err(_) => return format_reply(550, "File not found."),
    };

    match core::mem::replace(&mut auth.transfer, Transfer::None) {
        Transfer::PassiveArmed { listener } => match fs.open_read(path.as_str()) {
            Ok(reader) => {
                info!("RETR {}", path);
                auth.transfer = Transfer::Retr(RetrTransfer {
                    reader,
                    data: DataChannel::Pending {
                        listener,
                        since_ms: now_ms,
                    },
                    ascii: auth.ttype == TransferType::Ascii,
                    last_was_cr: false,
                });
                format_reply(150, "Opening data connection.")
            }
            Err(e) => {
                debug!("RETR {} failed to open: {}", path, e);
                // Keep passive mode armed so the client may retry.
                auth.transfer = Transfer::PassiveArmed { listener };
                format_reply(550, "File not found.")
            }
        },
        other => {
            auth.transfer = other;
            format_reply(425, "Use PASV first.")
        }
    }
}
