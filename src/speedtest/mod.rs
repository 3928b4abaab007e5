pub mod cloudflare;
pub mod download;
pub mod ping;
pub mod upload;

use async_trait::async_trait;
use std::time::Duration;

/// Divisor turning the client's bits/second into the displayed "Mbps" figure.
pub const BITS_PER_MEBIBIT: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// `address:port` of the measurement endpoint.
    pub host: String,
    pub city: String,
    pub country: String,
    /// Operator of the server.
    pub sponsor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementResult {
    pub ping_ms: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub server: ServerInfo,
}

pub fn bits_to_mbps(bits_per_second: f64) -> f64 {
    bits_per_second / BITS_PER_MEBIBIT
}

#[derive(Debug, thiserror::Error)]
pub enum MeasurementError {
    #[error("no measurement server could be reached")]
    NoServer,
    #[error("a server must be selected before measuring throughput")]
    NoServerSelected,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transfer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One measurement session against a single selected server.
#[async_trait]
pub trait MeasurementClient: Send {
    async fn select_best_server(&mut self) -> Result<ServerInfo, MeasurementError>;

    /// Returns the aggregate download rate in bits/second.
    async fn measure_download(&mut self, threads: usize) -> Result<f64, MeasurementError>;

    /// Returns the aggregate upload rate in bits/second.
    async fn measure_upload(&mut self, threads: usize) -> Result<f64, MeasurementError>;

    /// Latency recorded while selecting the server, in milliseconds.
    fn last_ping_ms(&self) -> f64;
}

pub trait ClientFactory: Send + Sync {
    fn connect(&self, timeout: Duration) -> Result<Box<dyn MeasurementClient>, MeasurementError>;
}
