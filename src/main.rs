use clap::Parser;
use std::io;
use std::net::SocketAddrV4;
use std::sync::Arc;
use streamwire::tcp::Key;
use streamwire::{Config, Endpoint, Error, SystemClock, Tun};

/// Fetch a page over a userspace TCP connection on a tun device.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Tun interface to open (must already exist and be up).
    #[arg(long, default_value = "tun0")]
    tun: String,

    /// Our address on the tun network.
    #[arg(long, default_value = "10.0.0.2:40000")]
    local: SocketAddrV4,

    /// HTTP server to connect to.
    #[arg(long, default_value = "10.0.0.1:80")]
    remote: SocketAddrV4,

    /// Host header; defaults to the remote IP.
    #[arg(long)]
    host: Option<String>,

    /// Path to request.
    #[arg(default_value = "/")]
    path: String,
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let cli = Cli::parse();
    let host = cli.host.unwrap_or_else(|| cli.remote.ip().to_string());

    let device = Tun::new(&cli.tun)?;
    let key = Key::between(cli.local, cli.remote);
    let mut endpoint = Endpoint::new(
        1,
        Box::new(device),
        Arc::new(SystemClock),
        key,
        Config::default(),
    );

    endpoint.connect()?;
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        cli.path, host
    );
    let sent = endpoint.write(request.as_bytes())?;
    log::debug!("queued {} byte request", sent);
    endpoint.close()?;

    endpoint.run(&mut io::stdout().lock())
}
