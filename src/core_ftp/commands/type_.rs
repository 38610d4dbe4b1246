use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::{AuthSession, TransferType};

/// Handles the TYPE FTP command.
///
/// ASCII and image (binary) types are supported; the representation flag
/// changes how RETR/STOR translate line endings.
pub fn handle_type_command(auth: &mut AuthSession, arg: &str) -> ReplyBuf {
    let primary = arg.split_whitespace().next().unwrap_or("");
    match primary.to_ascii_uppercase().as_str() {
        "A" => {
            auth.ttype = TransferType::Ascii;
            format_reply(200, "Type set to A.")
        }
        "I" => {
            auth.ttype = TransferType::Binary;
            format_reply(200, "Type set to I.")
        }
        _ => format_reply(504, "Command not implemented for that parameter."),
    }
}
