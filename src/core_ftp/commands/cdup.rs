use crate::core_ftp::reply::ReplyBuf;
use crate::core_ftp::session::AuthSession;
use crate::core_storage::SandboxFs;

/// Handles the CDUP FTP command, which is CWD to the parent. At the
/// virtual root this is a successful no-op.
pub fn handle_cdup_command(auth: &mut AuthSession, fs: &SandboxFs<'_>) -> ReplyBuf {
    super::cwd::handle_cwd_command(auth, fs, "..")
}
