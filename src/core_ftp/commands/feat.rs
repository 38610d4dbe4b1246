use heapless::String as FixedString;

use crate::core_ftp::reply::ReplyBuf;

/// Handles the FEAT FTP command with the multiline feature listing.
pub fn handle_feat_command() -> ReplyBuf {
    let mut out: ReplyBuf = FixedString::new();
    let _ = out.push_str("211-Features:\r\n");
    let _ = out.push_str(" SIZE\r\n");
    let _ = out.push_str(" MDTM\r\n");
    let _ = out.push_str(" PASV\r\n");
    let _ = out.push_str(" UTF8\r\n");
    let _ = out.push_str("211 End\r\n");
    out
}
