//! Entry point for `icmp-stream`.
//!
//! Moves stdin to the peer and the peer's bytes to stdout over one session.
//! UDP carries the frames here; the frame layer is the same one an ICMP
//! envelope would carry.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use icmp_stream::config::{FrameConfig, IdlePolicy};
use icmp_stream::session::Session;
use icmp_stream::socket::Socket;

/// Reliable byte stream over a lossy datagram path.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    tuning: Tuning,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Wait for a peer and serve one session.
    Listen {
        /// Local address to bind.
        #[arg(short, long, default_value = "0.0.0.0:7000")]
        bind: SocketAddr,
    },
    /// Open a session to a listening peer.
    Connect {
        /// Address of the listening peer.
        #[arg(short, long)]
        peer: SocketAddr,
        /// Local address to bind.
        #[arg(short, long, default_value = "0.0.0.0:0")]
        bind: SocketAddr,
    },
}

#[derive(Args)]
struct Tuning {
    /// Maximum outstanding frames.
    #[arg(long, global = true, default_value_t = 10_000)]
    window: usize,
    /// Largest DATA payload in bytes.
    #[arg(long, global = true, default_value_t = 888)]
    payload: usize,
    /// Resend timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 400)]
    resend_ms: u64,
    /// Compress payloads longer than this many bytes (0 disables).
    #[arg(long, global = true, default_value_t = 0)]
    compress: usize,
    /// Log traffic counters once per second.
    #[arg(long, global = true)]
    stats: bool,
    /// Give up after this many seconds without hearing from the peer.
    #[arg(long, global = true)]
    idle_secs: Option<u64>,
    /// Seconds to wait for the peer to finish closing.
    #[arg(long, global = true, default_value_t = 10)]
    close_secs: u64,
}

impl Tuning {
    fn config(&self) -> FrameConfig {
        FrameConfig {
            window_size: self.window,
            max_frame_payload: self.payload,
            resend_timeout: Duration::from_millis(self.resend_ms),
            compression_threshold: self.compress,
            stats_enabled: self.stats,
            idle_policy: self
                .idle_secs
                .map_or(IdlePolicy::Disabled, |s| IdlePolicy::After(Duration::from_secs(s))),
            close_grace: Duration::from_secs(self.close_secs),
            ..FrameConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.tuning.config();
    config.validate().context("invalid tuning")?;

    let session = match cli.mode {
        Mode::Listen { bind } => {
            let socket = Socket::bind(bind).await.context("bind")?;
            log::info!("listening on {}", socket.local_addr);
            Session::accept(socket, config).await?
        }
        Mode::Connect { peer, bind } => {
            let socket = Socket::bind(bind).await.context("bind")?;
            Session::connect(socket, peer, config)?
        }
    };

    pipe(session).await
}

/// Copy stdin into the session and the session into stdout until both
/// directions are finished.
async fn pipe(mut session: Session) -> anyhow::Result<()> {
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut buf = vec![0u8; 16 * 1024];
    let mut stdin_open = true;

    loop {
        tokio::select! {
            n = stdin.read(&mut buf), if stdin_open => {
                let n = n.context("read stdin")?;
                if n == 0 {
                    log::debug!("stdin closed");
                    stdin_open = false;
                    session.close();
                } else {
                    session.send(buf[..n].to_vec()).await?;
                }
            }
            chunk = session.recv() => match chunk {
                Some(bytes) => {
                    stdout.write_all(&bytes).await.context("write stdout")?;
                    stdout.flush().await.context("flush stdout")?;
                }
                None => break,
            },
        }
    }

    session.finish().await?;
    Ok(())
}
