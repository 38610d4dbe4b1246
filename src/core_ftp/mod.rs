//! The FTP variant: single-client control connection, passive data
//! transfers, one cooperative `tick` per host scheduler pass.

pub mod command;
pub mod commands;
pub mod listfmt;
pub mod reply;
pub mod session;
pub mod transfer;

use log::{debug, info, warn};

use crate::config::Credentials;
use crate::constants::{
    CMD_BUF, FTP_BANNER, POLL_TIMEOUT_MS, SCRATCH_BUF, SEND_TIMEOUT_MS, TRANSFER_BUF,
};
use crate::core_host::clock::Clock;
use crate::core_host::fs::HostFs;
use crate::core_host::net::{send_all, Conn, Listener, NetAdapter};
use crate::core_storage::SandboxFs;
use crate::error::{NetError, StartError};

use command::{split_line, FtpCommand};
use reply::{format_reply, ReplyBuf};
use session::{Session, Transfer};
use transfer::{step_list, step_retr, step_stor, Outcome, StepResult};

pub struct FtpServer<'a> {
    net: &'a mut dyn NetAdapter,
    fs: SandboxFs<'a>,
    clock: &'a dyn Clock,
    creds: Credentials,
    listener: Option<Box<dyn Listener>>,
    conn: Option<Box<dyn Conn>>,
    session: Session,
    running: bool,
    cmd_buf: [u8; CMD_BUF],
    cmd_len: usize,
    /// A control line overflowed; drop input until the next terminator.
    discarding: bool,
    xfer_buf: [u8; TRANSFER_BUF],
}

impl<'a> FtpServer<'a> {
    pub fn new(
        net: &'a mut dyn NetAdapter,
        host_fs: &'a dyn HostFs,
        root: &'a str,
        clock: &'a dyn Clock,
        creds: Credentials,
    ) -> Self {
        Self {
            net,
            fs: SandboxFs::new(host_fs, root),
            clock,
            creds,
            listener: None,
            conn: None,
            session: Session::new(),
            running: false,
            cmd_buf: [0; CMD_BUF],
            cmd_len: 0,
            discarding: false,
            xfer_buf: [0; TRANSFER_BUF],
        }
    }

    /// Bind the control listener and verify the storage root is reachable.
    pub fn start(&mut self, port: u16) -> Result<(), StartError> {
        match self.fs.stat("/") {
            Ok(info) if info.is_dir => {}
            _ => return Err(StartError::Root),
        }
        self.listener = Some(self.net.bind(port)?);
        self.running = true;
        info!("FTP server listening on port {}", port);
        Ok(())
    }

    /// Close everything, innermost handle first. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.session = Session::new();
        self.conn = None;
        self.listener = None;
        self.cmd_len = 0;
        self.discarding = false;
        self.running = false;
    }

    pub fn local_port(&self) -> Option<u16> {
        self.listener.as_ref().map(|l| l.local_port())
    }

    /// One cooperative scheduler pass: accept, or advance the in-flight
    /// transfer by one chunk, or dispatch at most one control command.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.running {
            return;
        }

        if self.conn.is_none() {
            self.try_accept();
            return;
        }

        if let Session::Authenticated(auth) = &mut self.session {
            if auth.transfer.in_progress() {
                self.step_transfer(now_ms);
                return;
            }
        }

        if !self.read_control() {
            return;
        }
        if let Some(line_len) = self.take_line() {
            // Copy the line out so dispatch can borrow the buffers freely.
            let mut line = [0u8; SCRATCH_BUF];
            line[..line_len].copy_from_slice(&self.cmd_buf[..line_len]);
            let remaining = self.cmd_len - line_len;
            self.cmd_buf.copy_within(line_len..self.cmd_len, 0);
            self.cmd_len = remaining;
            match core::str::from_utf8(&line[..line_len]) {
                Ok(text) => self.dispatch(text, now_ms),
                Err(_) => {
                    self.send_reply(&format_reply(500, "Syntax error, command unrecognized."))
                }
            }
        }
    }

    fn try_accept(&mut self) {
        let listener = match self.listener.as_mut() {
            Some(listener) => listener,
            None => return,
        };
        match listener.accept(POLL_TIMEOUT_MS) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.session = Session::new();
                self.cmd_len = 0;
                self.discarding = false;
                self.send_reply(&format_reply(220, FTP_BANNER));
            }
            Err(NetError::WouldBlock) => {}
            Err(e) => debug!("control accept failed: {}", e),
        }
    }

    /// Pull pending control bytes into the command buffer. Returns false
    /// when the connection went away.
    fn read_control(&mut self) -> bool {
        let conn = match self.conn.as_mut() {
            Some(conn) => conn,
            None => return false,
        };
        match conn.recv(&mut self.cmd_buf[self.cmd_len..], POLL_TIMEOUT_MS) {
            Ok(n) => self.cmd_len += n,
            Err(NetError::WouldBlock) => {}
            Err(_) => {
                info!("control connection closed");
                self.drop_conn();
                return false;
            }
        }

        if self.discarding {
            match self.cmd_buf[..self.cmd_len].iter().position(|&b| b == b'\n') {
                Some(idx) => {
                    self.cmd_buf.copy_within(idx + 1..self.cmd_len, 0);
                    self.cmd_len -= idx + 1;
                    self.discarding = false;
                }
                None => {
                    self.cmd_len = 0;
                    return false;
                }
            }
        }

        if self.cmd_len == CMD_BUF && !self.cmd_buf.contains(&b'\n') {
            warn!("control line overflowed the command buffer");
            self.cmd_len = 0;
            self.discarding = true;
            self.send_reply(&format_reply(500, "Line too long."));
            return false;
        }
        true
    }

    /// Length of the first complete line (through its `\n`), if any.
    fn take_line(&self) -> Option<usize> {
        self.cmd_buf[..self.cmd_len]
            .iter()
            .position(|&b| b == b'\n')
            .map(|idx| idx + 1)
    }

    fn dispatch(&mut self, line: &str, now_ms: u64) {
        let (verb, arg) = split_line(line);
        if verb.is_empty() {
            return;
        }
        debug!("command: {} {}", verb, if verb.eq_ignore_ascii_case("PASS") { "***" } else { arg });

        let cmd = match FtpCommand::from_verb(verb) {
            Some(cmd) => cmd,
            None => {
                self.send_reply(&format_reply(502, "Command not implemented."));
                return;
            }
        };

        // Authentication phase: only USER, PASS and QUIT get through.
        if self.session.authenticated().is_none()
            && !matches!(cmd, FtpCommand::USER | FtpCommand::PASS | FtpCommand::QUIT)
        {
            self.send_reply(&commands::not_logged_in());
            return;
        }

        let reply = match cmd {
            FtpCommand::USER => {
                commands::user::handle_user_command(&mut self.session, &self.creds, arg)
            }
            FtpCommand::PASS => {
                commands::pass::handle_pass_command(&mut self.session, &self.creds, arg)
            }
            FtpCommand::QUIT => {
                let reply = commands::quit::handle_quit_command();
                self.send_reply(&reply);
                self.drop_conn();
                return;
            }
            _ => {
                let control_ipv4 = self.conn.as_ref().and_then(|c| c.local_ipv4());
                let auth = match &mut self.session {
                    Session::Authenticated(auth) => auth,
                    // Unauthenticated sessions were answered 530 above.
                    _ => return,
                };
                match cmd {
                    FtpCommand::SYST => commands::syst::handle_syst_command(),
                    FtpCommand::FEAT => commands::feat::handle_feat_command(),
                    FtpCommand::OPTS => commands::opts::handle_opts_command(arg),
                    FtpCommand::NOOP => commands::noop::handle_noop_command(),
                    FtpCommand::ALLO => commands::allo::handle_allo_command(),
                    FtpCommand::MODE => commands::mode::handle_mode_command(arg),
                    FtpCommand::STRU => commands::stru::handle_stru_command(arg),
                    FtpCommand::PWD => commands::pwd::handle_pwd_command(auth),
                    FtpCommand::CWD => commands::cwd::handle_cwd_command(auth, &self.fs, arg),
                    FtpCommand::CDUP => commands::cdup::handle_cdup_command(auth, &self.fs),
                    FtpCommand::TYPE => commands::type_::handle_type_command(auth, arg),
                    FtpCommand::PASV => {
                        commands::pasv::handle_pasv_command(auth, self.net, control_ipv4)
                    }
                    FtpCommand::LIST => {
                        commands::list::handle_list_command(auth, arg, false, now_ms)
                    }
                    FtpCommand::NLST => {
                        commands::list::handle_list_command(auth, arg, true, now_ms)
                    }
                    FtpCommand::RETR => {
                        commands::retr::handle_retr_command(auth, &self.fs, arg, now_ms)
                    }
                    FtpCommand::STOR => {
                        commands::stor::handle_stor_command(auth, &self.fs, arg, now_ms)
                    }
                    FtpCommand::DELE => commands::dele::handle_dele_command(auth, &self.fs, arg),
                    FtpCommand::MKD => commands::mkd::handle_mkd_command(auth, &self.fs, arg),
                    FtpCommand::RMD => commands::rmd::handle_rmd_command(auth, &self.fs, arg),
                    FtpCommand::RNFR => commands::rnfr::handle_rnfr_command(auth, arg),
                    FtpCommand::RNTO => commands::rnto::handle_rnto_command(auth, &self.fs, arg),
                    FtpCommand::SIZE => commands::size::handle_size_command(auth, &self.fs, arg),
                    FtpCommand::MDTM => commands::mdtm::handle_mdtm_command(auth, &self.fs, arg),
                    FtpCommand::USER | FtpCommand::PASS | FtpCommand::QUIT => return,
                }
            }
        };
        self.send_reply(&reply);
    }

    fn step_transfer(&mut self, now_ms: u64) {
        let auth = match &mut self.session {
            Session::Authenticated(auth) => auth,
            _ => return,
        };
        let now_unix = self.clock.now_unix();
        let result = match &mut auth.transfer {
            Transfer::List(t) => step_list(t, &self.fs, now_unix, now_ms, &mut self.xfer_buf),
            Transfer::Retr(t) => step_retr(t, now_ms, &mut self.xfer_buf),
            Transfer::Stor(t) => step_stor(t, now_ms, &mut self.xfer_buf),
            Transfer::None | Transfer::PassiveArmed { .. } => return,
        };
        match result {
            StepResult::Progress => {}
            StepResult::Finished(outcome) => {
                // Drop the handle and data channel before the final reply.
                auth.transfer = Transfer::None;
                match outcome {
                    Outcome::Complete => self.send_reply(&format_reply(226, "Transfer complete.")),
                    Outcome::Failed => self.send_reply(&format_reply(550, "Transfer failed.")),
                    Outcome::DataError => {
                        self.send_reply(&format_reply(426, "Connection closed; transfer aborted."));
                        self.send_reply(&format_reply(550, "Transfer failed."));
                    }
                    Outcome::PasvTimeout => {
                        self.send_reply(&format_reply(425, "Can't open data connection."));
                    }
                }
            }
        }
    }

    fn send_reply(&mut self, reply: &ReplyBuf) {
        if let Some(conn) = self.conn.as_mut() {
            if send_all(conn.as_mut(), reply.as_bytes(), SEND_TIMEOUT_MS).is_err() {
                info!("control connection lost while replying");
                self.drop_conn();
            }
        }
    }

    fn drop_conn(&mut self) {
        self.session = Session::new();
        self.conn = None;
        self.cmd_len = 0;
        self.discarding = false;
    }
}
