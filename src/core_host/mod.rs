pub mod clock;
pub mod fs;
pub mod net;
pub mod std_clock;
pub mod std_fs;
pub mod std_net;

pub use clock::Clock;
pub use fs::{DirEntry, DirIter, FileInfo, FileRead, FileWrite, HostFs};
pub use net::{Conn, Listener, NetAdapter};
pub use std_clock::SystemClock;
pub use std_fs::StdFs;
pub use std_net::StdNet;
