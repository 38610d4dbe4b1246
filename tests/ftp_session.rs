//! End-to-end FTP scenarios over loopback sockets with the std adapters,
//! pumping the tick loop by hand.

mod common;

use std::fs;
use std::net::TcpStream;

use tempfile::TempDir;

use paperportald::config::Credentials;
use paperportald::core_ftp::reply::parse_pasv;
use paperportald::core_ftp::FtpServer;
use paperportald::core_host::{StdFs, StdNet, SystemClock};

use common::{connect, read_line, read_to_end, send};

const PASV_MIN: u16 = 52100;
const PASV_MAX: u16 = 52199;

fn creds() -> Credentials {
    Credentials {
        user: "paper".to_string(),
        password: "paper".to_string(),
    }
}

/// Build a server over a scratch root, run the scenario, tear down.
fn with_server(scenario: impl FnOnce(&mut FtpServer<'_>, u16, &TempDir)) {
    let root = tempfile::tempdir().expect("tempdir");
    let mut net = StdNet::new(PASV_MIN, PASV_MAX, None);
    let host_fs = StdFs;
    let clock = SystemClock;
    let root_str = root.path().to_str().expect("utf8 root").to_string();
    let mut server = FtpServer::new(&mut net, &host_fs, &root_str, &clock, creds());
    server.start(0).expect("start");
    let port = server.local_port().expect("port");

    scenario(&mut server, port, &root);

    // stop is idempotent.
    server.stop();
    server.stop();
}

fn login(tick: &mut impl FnMut(), control: &mut TcpStream) {
    let banner = read_line(tick, control);
    assert_eq!(banner, "220 Paper Portal FTP Ready\r\n");
    send(control, b"USER paper\r\n");
    assert!(read_line(tick, control).starts_with("331 "));
    send(control, b"PASS paper\r\n");
    assert!(read_line(tick, control).starts_with("230 "));
}

fn open_data(tick: &mut impl FnMut(), control: &mut TcpStream) -> TcpStream {
    send(control, b"PASV\r\n");
    let reply = read_line(tick, control);
    assert!(reply.starts_with("227 "), "{reply}");
    let (ip, port) = parse_pasv(&reply).expect("pasv tuple");
    assert_eq!(ip, [127, 0, 0, 1]);
    connect(port)
}

#[test]
fn login_pwd_quit() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        send(&mut control, b"PWD\r\n");
        let reply = read_line(&mut tick, &mut control);
        assert!(reply.starts_with("257 \"/\""), "{reply}");

        send(&mut control, b"QUIT\r\n");
        let reply = read_line(&mut tick, &mut control);
        assert!(reply.starts_with("221 "), "{reply}");
    });
}

#[test]
fn commands_before_login_are_rejected() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        let _banner = read_line(&mut tick, &mut control);

        send(&mut control, b"PWD\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("530 "));

        send(&mut control, b"USER nobody\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("530 "));
    });
}

#[test]
fn retr_streams_file_contents() {
    with_server(|server, port, root| {
        fs::write(root.path().join("readme.txt"), b"hello").expect("seed file");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        let mut data = open_data(&mut tick, &mut control);
        send(&mut control, b"RETR readme.txt\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("150 "));
        let payload = read_to_end(&mut tick, &mut data);
        assert_eq!(payload, b"hello");
        assert!(read_line(&mut tick, &mut control).starts_with("226 "));
    });
}

#[test]
fn retr_missing_file_is_550() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        let _data = open_data(&mut tick, &mut control);
        send(&mut control, b"RETR nope.txt\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("550 "));
    });
}

#[test]
fn stor_then_size_round_trip() {
    with_server(|server, port, root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        let mut data = open_data(&mut tick, &mut control);
        send(&mut control, b"STOR new.bin\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("150 "));
        let payload = vec![0xA5u8; 4096];
        send(&mut data, &payload);
        drop(data);
        assert!(read_line(&mut tick, &mut control).starts_with("226 "));

        send(&mut control, b"SIZE new.bin\r\n");
        let reply = read_line(&mut tick, &mut control);
        assert_eq!(reply, "213 4096\r\n");
        assert_eq!(fs::read(root.path().join("new.bin")).expect("stored"), payload);
    });
}

#[test]
fn cwd_clamps_at_root_and_rejects_missing() {
    with_server(|server, port, root| {
        fs::create_dir(root.path().join("music")).expect("mkdir");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        // CWD .. from the root stays at the root.
        send(&mut control, b"CWD ..\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("250 "));
        send(&mut control, b"PWD\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("257 \"/\""));

        send(&mut control, b"CWD /etc\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("550 "));

        send(&mut control, b"CWD music\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("250 "));
        send(&mut control, b"PWD\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("257 \"/music\""));

        send(&mut control, b"CDUP\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("250 "));
        send(&mut control, b"PWD\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("257 \"/\""));
    });
}

#[test]
fn rename_sequence_and_missing_source() {
    with_server(|server, port, root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        // RNFR does not stat; the failure surfaces at RNTO.
        send(&mut control, b"RNFR /a\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("350 "));
        send(&mut control, b"RNTO /b\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("550 "));

        // The pending state was cleared by the failed RNTO.
        send(&mut control, b"RNTO /c\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("503 "));

        fs::write(root.path().join("a.txt"), b"x").expect("seed");
        send(&mut control, b"RNFR a.txt\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("350 "));
        send(&mut control, b"RNTO b.txt\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("250 "));
        assert!(root.path().join("b.txt").exists());
    });
}

#[test]
fn list_includes_seeded_entries() {
    with_server(|server, port, root| {
        fs::write(root.path().join("one.txt"), b"1").expect("seed");
        fs::create_dir(root.path().join("sub")).expect("seed dir");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        let mut data = open_data(&mut tick, &mut control);
        send(&mut control, b"LIST\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("150 "));
        let listing = String::from_utf8(read_to_end(&mut tick, &mut data)).unwrap();
        assert!(read_line(&mut tick, &mut control).starts_with("226 "));

        assert!(listing.contains("one.txt"), "{listing}");
        assert!(listing.contains("sub"), "{listing}");
        assert!(listing.lines().any(|l| l.starts_with('d')), "{listing}");

        // NLST produces bare names.
        let mut data = open_data(&mut tick, &mut control);
        send(&mut control, b"NLST\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("150 "));
        let names = String::from_utf8(read_to_end(&mut tick, &mut data)).unwrap();
        assert!(read_line(&mut tick, &mut control).starts_with("226 "));
        let mut lines: Vec<&str> = names.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["one.txt", "sub"]);
    });
}

#[test]
fn dele_mkd_rmd_mutations() {
    with_server(|server, port, root| {
        fs::write(root.path().join("junk"), b"x").expect("seed");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        send(&mut control, b"MKD box\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("257 "));
        assert!(root.path().join("box").is_dir());

        send(&mut control, b"RMD box\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("250 "));
        assert!(!root.path().join("box").exists());

        send(&mut control, b"DELE junk\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("250 "));
        assert!(!root.path().join("junk").exists());

        send(&mut control, b"DELE junk\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("550 "));
    });
}

#[test]
fn mdtm_reports_utc_stamp() {
    with_server(|server, port, root| {
        fs::write(root.path().join("dated.txt"), b"x").expect("seed");
        // 2021-03-14 01:59:26 UTC
        filetime::set_file_mtime(
            root.path().join("dated.txt"),
            filetime::FileTime::from_unix_time(1_615_687_166, 0),
        )
        .expect("set mtime");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        send(&mut control, b"MDTM dated.txt\r\n");
        let reply = read_line(&mut tick, &mut control);
        assert_eq!(reply, "213 20210314015926\r\n");
    });
}

#[test]
fn type_ascii_translates_line_endings() {
    with_server(|server, port, root| {
        fs::write(root.path().join("notes.txt"), b"a\nb\r\nc\n").expect("seed");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        send(&mut control, b"TYPE A\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("200 "));

        let mut data = open_data(&mut tick, &mut control);
        send(&mut control, b"RETR notes.txt\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("150 "));
        let payload = read_to_end(&mut tick, &mut data);
        assert!(read_line(&mut tick, &mut control).starts_with("226 "));
        assert_eq!(payload, b"a\r\nb\r\nc\r\n");

        // Inbound, CRLF collapses to LF.
        let mut data = open_data(&mut tick, &mut control);
        send(&mut control, b"STOR up.txt\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("150 "));
        send(&mut data, b"x\r\ny\r\n");
        drop(data);
        assert!(read_line(&mut tick, &mut control).starts_with("226 "));
        assert_eq!(fs::read(root.path().join("up.txt")).expect("stored"), b"x\ny\n");
    });
}

#[test]
fn unknown_and_unsupported_commands() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut control = connect(port);
        login(&mut tick, &mut control);

        send(&mut control, b"XYZZY\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("502 "));

        send(&mut control, b"MODE B\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("504 "));

        send(&mut control, b"LIST\r\n");
        assert!(read_line(&mut tick, &mut control).starts_with("425 "));

        send(&mut control, b"SYST\r\n");
        assert_eq!(
            read_line(&mut tick, &mut control),
            "215 UNIX Type: L8\r\n"
        );
    });
}
