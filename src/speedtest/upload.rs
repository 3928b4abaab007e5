use super::download::bits_per_second;
use super::MeasurementError;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const UPLOAD_PATH: &str = "__up";
const CHUNK_SIZE: usize = 1_000_000; // 1MB chunks

/// Multi-stream upload throughput test.
pub struct UploadTest {
    data: Arc<Vec<u8>>,
}

impl UploadTest {
    pub fn new(upload_size: usize) -> Self {
        let mut rng = rand::rngs::StdRng::from_entropy();
        let data: Vec<u8> = (0..upload_size).map(|_| rng.gen()).collect();
        Self { data: Arc::new(data) }
    }

    /// Runs `threads` concurrent uploads of the payload and returns the
    /// combined rate in bits/second.
    pub async fn run(&self, client: &reqwest::Client, base_url: &str, threads: usize) -> Result<f64, MeasurementError> {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), UPLOAD_PATH);

        let start = Instant::now();
        let handles: Vec<_> = (0..threads.max(1))
            .map(|stream| {
                let client = client.clone();
                let url = url.clone();
                let data = Arc::clone(&self.data);
                tokio::spawn(async move { upload_stream(client, url, data, stream).await })
            })
            .collect();

        let mut uploaded: u64 = 0;
        for handle in handles {
            uploaded += handle.await??;
        }

        Ok(bits_per_second(uploaded, start.elapsed().as_secs_f64()))
    }
}

async fn upload_stream(
    client: reqwest::Client,
    url: String,
    data: Arc<Vec<u8>>,
    stream: usize,
) -> Result<u64, MeasurementError> {
    let mut uploaded: u64 = 0;

    for chunk in data.chunks(CHUNK_SIZE) {
        client
            .post(&url)
            .body(chunk.to_vec())
            .send()
            .await?
            .error_for_status()?;
        uploaded += chunk.len() as u64;
    }

    debug!(stream, uploaded, "upload stream finished");
    Ok(uploaded)
}
