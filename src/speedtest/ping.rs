use std::time::{Duration, Instant};
use tracing::debug;

const PROBE_PATH: &str = "__down?bytes=0";
const PROBE_GAP: Duration = Duration::from_millis(50);

/// Latency probe against one candidate server.
pub struct PingTest {
    samples: Vec<f64>,
    ping_count: usize,
}

impl PingTest {
    pub fn new(ping_count: usize) -> Self {
        Self {
            samples: Vec::new(),
            ping_count: ping_count.max(1),
        }
    }

    /// Probes `base_url` and returns the mean latency of the probes that
    /// answered, or `None` when none did.
    pub async fn run(&mut self, client: &reqwest::Client, base_url: &str, timeout: Duration) -> Option<f64> {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), PROBE_PATH);
        self.samples.clear();

        for attempt in 0..self.ping_count {
            let start = Instant::now();
            match client.get(&url).timeout(timeout).send().await {
                Ok(_) => {
                    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                    debug!(%url, attempt, elapsed_ms = elapsed, "latency probe");
                    self.samples.push(elapsed);
                }
                Err(err) => debug!(%url, attempt, error = %err, "latency probe failed"),
            }

            if attempt + 1 < self.ping_count {
                tokio::time::sleep(PROBE_GAP).await;
            }
        }

        mean(&self.samples)
    }
}

/// Mean latency, kept to microsecond (3 decimal) precision.
fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let avg = samples.iter().sum::<f64>() / samples.len() as f64;
    Some((avg * 1000.0).round() / 1000.0)
}
