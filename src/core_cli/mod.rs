use structopt::StructOpt;

/// Command-line arguments
#[derive(StructOpt, Debug)]
#[structopt(name = "paperportald", about = "Paper Portal LAN file server.")]
pub struct Cli {
    /// Path to the configuration file
    #[structopt(short, long, default_value = "")]
    pub config: String,

    /// Protocol variant override: ftp or webdav
    #[structopt(short, long)]
    pub protocol: Option<String>,

    /// Listen port override
    #[structopt(long)]
    pub port: Option<u16>,

    /// Storage root override
    #[structopt(long)]
    pub root: Option<String>,

    /// Enable verbose mode
    #[structopt(short, long)]
    pub verbose: bool,
}
