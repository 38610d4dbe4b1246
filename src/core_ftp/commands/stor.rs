use log::{debug, info};

use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::{AuthSession, DataChannel, StorTransfer, Transfer, TransferType};
use crate::core_path::normalize;
use crate::core_storage::SandboxFs;

/// Handles the STOR (Store File) FTP command.
///
/// Creates or truncates the target before the 150 reply; the stepper then
/// drains the data connection into the writer until the client closes it.
pub fn handle_stor_command(
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
        Err(_) => return format_reply(550, "Failed to open file."),
    };

    match core::mem::replace(&mut auth.transfer, Transfer::None) {
        Transfer::PassiveArmed { listener } => match fs.open_write_trunc(path.as_str()) {
            Ok(writer) => {
                info!("STOR {}", path);
                auth.transfer = Transfer::Stor(StorTransfer {
                    writer,
                    data: DataChannel::Pending {
                        listener,
                        since_ms: now_ms,
                    },
                    ascii: auth.ttype == TransferType::Ascii,
                    held_cr: false,
                });
                format_reply(150, "Opening data connection.")
            }
            Err(e) => {
                debug!("STOR {} failed to create: {}", path, e);
                auth.transfer = Transfer::PassiveArmed { listener };
                format_reply(550, "Failed to open file.")
            }
        },
        other => {
            auth.transfer = other;
            format_reply(425, "Use PASV first.")
        }
    }
}
