#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    SYST,
    FEAT,
    OPTS,
    PWD,
    CWD,
    CDUP,
    TYPE,
    MODE,
    STRU,
    PASV,
    LIST,
    NLST,
    RETR,
    STOR,
    DELE,
    MKD,
    RMD,
    RNFR,
    RNTO,
    SIZE,
    MDTM,
    ALLO,
    NOOP,
}

impl FtpCommand {
    pub fn from_verb(verb: &str) -> Option<FtpCommand> {
        match verb.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "SYST" => Some(FtpCommand::SYST),
            "FEAT" => Some(FtpCommand::FEAT),
            "OPTS" => Some(FtpCommand::OPTS),
            "PWD" => Some(FtpCommand::PWD),
            "XPWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "TYPE" => Some(FtpCommand::TYPE),
            "MODE" => Some(FtpCommand::MODE),
            "STRU" => Some(FtpCommand::STRU),
            "PASV" => Some(FtpCommand::PASV),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "DELE" => Some(FtpCommand::DELE),
            "MKD" => Some(FtpCommand::MKD),
            "XMKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "XRMD" => Some(FtpCommand::RMD),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "ALLO" => Some(FtpCommand::ALLO),
            "NOOP" => Some(FtpCommand::NOOP),
            _ => None,
        }
    }
}

/// Split a control line into its verb and the rest-of-line argument.
/// FTP arguments may contain spaces, so only the first separator splits.
pub fn split_line(line: &str) -> (&str, &str) {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.split_once(' ') {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    }
}
