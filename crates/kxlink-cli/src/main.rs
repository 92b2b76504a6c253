//! kxlink CLI
//!
//! Connects to a kxlink server, performs the key exchange and prints the
//! single message the server sends.

mod config;

use clap::Parser;
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use config::Config;
use kxlink_core::{ClientSession, ErrorKind};

/// kxlink - receive one encrypted message over an ephemeral key exchange
#[derive(Parser)]
#[command(name = "kxlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path [default: <config dir>/kxlink/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the message as hex instead of text
    #[arg(long)]
    hex: bool,

    /// Largest ciphertext accepted from the server, in bytes
    #[arg(long, value_name = "N")]
    max_message_size: Option<u32>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,

    /// Server IP address
    #[arg(required_unless_present = "write_config")]
    server_ip: Option<IpAddr>,

    /// Server port [default: from config, 12345]
    port: Option<u16>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    // Command-line flags win over the file
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if let Some(max) = cli.max_message_size {
        config.protocol.max_message_size = max;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;

    if cli.write_config {
        let path = cli.config.unwrap_or_else(Config::default_path);
        config.save(&path)?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    init_logging(&config.logging.level);

    kxlink_crypto::init().map_err(|e| anyhow::anyhow!("crypto initialization failed: {e}"))?;

    let Some(ip) = cli.server_ip else {
        anyhow::bail!("missing server IP address");
    };
    let addr = SocketAddr::new(ip, config.connection.port);

    println!("Connecting to {}:{}...", ip, addr.port());
    let plaintext = receive_message(addr, &config)?;

    let mut stdout = io::stdout().lock();
    if cli.hex {
        writeln!(stdout, "{}", hex::encode(&plaintext))?;
    } else {
        writeln!(stdout, "{}", String::from_utf8_lossy(&plaintext))?;
    }

    Ok(())
}

/// Connect, handshake and read the message
fn receive_message(addr: SocketAddr, config: &Config) -> kxlink_core::Result<Vec<u8>> {
    let mut session = ClientSession::connect(addr, &config.to_session_config())?;
    session.handshake()?;
    let plaintext = session.receive_message()?;

    let stats = session.stats();
    tracing::info!(
        "Session closed: {} bytes sent, {} bytes received",
        stats.bytes_sent,
        stats.bytes_received
    );

    Ok(plaintext)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Process exit status for an error
fn exit_code(err: &anyhow::Error) -> u8 {
    let Some(err) = err.downcast_ref::<kxlink_core::Error>() else {
        return 1;
    };

    match err.kind() {
        ErrorKind::Connection => 2,
        ErrorKind::Handshake => 3,
        ErrorKind::Protocol => 4,
        ErrorKind::Authentication => 5,
        ErrorKind::NotInitialized | ErrorKind::Crypto | ErrorKind::InvalidState => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kxlink_core::ProtocolError;
    use kxlink_transport::StreamError;

    #[test]
    fn test_cli_parses_positional_args() {
        let cli = Cli::try_parse_from(["kxlink", "127.0.0.1", "4000"]).unwrap();
        assert_eq!(cli.server_ip, Some(IpAddr::from([127, 0, 0, 1])));
        assert_eq!(cli.port, Some(4000));
        assert!(!cli.hex);
    }

    #[test]
    fn test_cli_port_is_optional() {
        let cli = Cli::try_parse_from(["kxlink", "--hex", "::1"]).unwrap();
        assert!(cli.port.is_none());
        assert!(cli.hex);
    }

    #[test]
    fn test_cli_requires_server_ip() {
        assert!(Cli::try_parse_from(["kxlink"]).is_err());
        assert!(Cli::try_parse_from(["kxlink", "not-an-ip"]).is_err());
        assert!(Cli::try_parse_from(["kxlink", "--write-config"]).is_ok());
    }

    #[test]
    fn test_exit_codes() {
        let connection = anyhow::Error::new(kxlink_core::Error::Connection(StreamError::Closed {
            expected: 32,
            received: 0,
        }));
        assert_eq!(exit_code(&connection), 2);

        let protocol = anyhow::Error::new(kxlink_core::Error::from(ProtocolError::MessageTooShort {
            declared: 3,
            min: 16,
        }));
        assert_eq!(exit_code(&protocol), 4);

        assert_eq!(exit_code(&anyhow::Error::new(kxlink_core::Error::Authentication)), 5);
        assert_eq!(exit_code(&anyhow::anyhow!("bad config")), 1);
    }
}
