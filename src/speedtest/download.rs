use super::MeasurementError;
use futures::StreamExt;
use std::time::Instant;
use tracing::debug;

const DOWNLOAD_PATH: &str = "__down";

/// Multi-stream download throughput test.
pub struct DownloadTest {
    download_size: u64,
}

impl DownloadTest {
    pub fn new(download_size: u64) -> Self {
        Self { download_size }
    }

    /// Runs `threads` concurrent downloads and returns the combined rate in
    /// bits/second.
    pub async fn run(&self, client: &reqwest::Client, base_url: &str, threads: usize) -> Result<f64, MeasurementError> {
        let url = format!(
            "{}/{}?bytes={}",
            base_url.trim_end_matches('/'),
            DOWNLOAD_PATH,
            self.download_size
        );

        let start = Instant::now();
        let handles: Vec<_> = (0..threads.max(1))
            .map(|stream| {
                let client = client.clone();
                let url = url.clone();
                tokio::spawn(async move { download_stream(client, url, stream).await })
            })
            .collect();

        let mut downloaded: u64 = 0;
        for handle in handles {
            downloaded += handle.await??;
        }

        Ok(bits_per_second(downloaded, start.elapsed().as_secs_f64()))
    }
}

async fn download_stream(client: reqwest::Client, url: String, stream: usize) -> Result<u64, MeasurementError> {
    let response = client.get(&url).send().await?.error_for_status()?;
    let mut body = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = body.next().await {
        downloaded += chunk?.len() as u64;
    }

    debug!(stream, downloaded, "download stream finished");
    Ok(downloaded)
}

pub(crate) fn bits_per_second(bytes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 * 8.0 / elapsed_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_bits_over_seconds() {
        assert_eq!(bits_per_second(1_000, 2.0), 4_000.0);
    }

    #[test]
    fn zero_elapsed_yields_zero_rate() {
        assert_eq!(bits_per_second(1_000, 0.0), 0.0);
    }
}
