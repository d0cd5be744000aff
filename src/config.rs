//! Command-line configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;

use clap::{Parser, ValueEnum};

/// Fewest worker threads the runtime is built with.
pub const MIN_WORKER_THREADS: usize = 2;

/// Output format of the log written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Multi-client line-oriented TCP chat server.
#[derive(Debug, Clone, Parser)]
#[command(name = "chatcast", version, about)]
pub struct Config {
    /// TCP port to listen on.
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Worker threads driving the I/O loop [default: available cores, at least 2].
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Number of runtime worker threads, never below [`MIN_WORKER_THREADS`].
    pub fn worker_threads(&self) -> usize {
        self.workers
            .unwrap_or_else(default_worker_threads)
            .max(MIN_WORKER_THREADS)
    }
}

/// `max(2, available parallelism)`.
pub fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(MIN_WORKER_THREADS)
        .max(MIN_WORKER_THREADS)
}
