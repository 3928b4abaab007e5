use super::download::DownloadTest;
use super::ping::PingTest;
use super::upload::UploadTest;
use super::{ClientFactory, MeasurementClient, MeasurementError, ServerInfo};
use crate::settings::MeasurementSettings;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCandidate {
    pub base_url: String,
    pub sponsor: String,
}

impl ServerCandidate {
    pub fn new(base_url: impl Into<String>, sponsor: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            sponsor: sponsor.into(),
        }
    }
}

pub fn default_candidates() -> Vec<ServerCandidate> {
    vec![ServerCandidate::new("https://speed.cloudflare.com", "Cloudflare")]
}

/// Location data served by `{base}/meta`.
#[derive(Debug, Default, Deserialize)]
struct ServerMeta {
    colo: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

pub struct CloudflareFactory {
    settings: MeasurementSettings,
    candidates: Vec<ServerCandidate>,
}

impl CloudflareFactory {
    pub fn new(settings: MeasurementSettings) -> Self {
        Self {
            settings,
            candidates: default_candidates(),
        }
    }
}

impl ClientFactory for CloudflareFactory {
    fn connect(&self, timeout: Duration) -> Result<Box<dyn MeasurementClient>, MeasurementError> {
        let http = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Box::new(CloudflareClient {
            http,
            timeout,
            settings: self.settings.clone(),
            candidates: self.candidates.clone(),
            selected: None,
            last_ping_ms: 0.0,
        }))
    }
}

pub struct CloudflareClient {
    http: reqwest::Client,
    timeout: Duration,
    settings: MeasurementSettings,
    candidates: Vec<ServerCandidate>,
    selected: Option<ServerCandidate>,
    last_ping_ms: f64,
}

impl CloudflareClient {
    fn selected_base_url(&self) -> Result<&str, MeasurementError> {
        self.selected
            .as_ref()
            .map(|candidate| candidate.base_url.as_str())
            .ok_or(MeasurementError::NoServerSelected)
    }

    async fn fetch_meta(&self, base_url: &str) -> ServerMeta {
        let url = format!("{}/meta", base_url.trim_end_matches('/'));
        let response = match self.http.get(&url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "server metadata unavailable");
                return ServerMeta::default();
            }
        };
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                debug!(%url, error = %err, "server metadata unreadable");
                return ServerMeta::default();
            }
        };
        parse_meta(&body)
    }
}

#[async_trait]
impl MeasurementClient for CloudflareClient {
    async fn select_best_server(&mut self) -> Result<ServerInfo, MeasurementError> {
        let mut best: Option<(ServerCandidate, f64)> = None;

        for candidate in &self.candidates {
            let mut test = PingTest::new(self.settings.ping_count);
            match test.run(&self.http, &candidate.base_url, self.timeout).await {
                Some(latency) => {
                    debug!(server = %candidate.base_url, latency_ms = latency, "candidate latency");
                    if best.as_ref().map_or(true, |(_, current)| latency < *current) {
                        best = Some((candidate.clone(), latency));
                    }
                }
                None => debug!(server = %candidate.base_url, "candidate unreachable"),
            }
        }

        let (candidate, latency) = best.ok_or(MeasurementError::NoServer)?;
        info!(server = %candidate.base_url, latency_ms = latency, "best server selected");

        let meta = self.fetch_meta(&candidate.base_url).await;
        let server = server_info(&candidate, meta);

        self.last_ping_ms = latency;
        self.selected = Some(candidate);
        Ok(server)
    }

    async fn measure_download(&mut self, threads: usize) -> Result<f64, MeasurementError> {
        let base_url = self.selected_base_url()?;
        DownloadTest::new(self.settings.download_size_bytes())
            .run(&self.http, base_url, threads)
            .await
    }

    async fn measure_upload(&mut self, threads: usize) -> Result<f64, MeasurementError> {
        let base_url = self.selected_base_url()?;
        UploadTest::new(self.settings.upload_size_bytes())
            .run(&self.http, base_url, threads)
            .await
    }

    fn last_ping_ms(&self) -> f64 {
        self.last_ping_ms
    }
}

fn parse_meta(body: &[u8]) -> ServerMeta {
    serde_json::from_slice(body).unwrap_or_else(|err| {
        debug!(error = %err, "server metadata is not valid json");
        ServerMeta::default()
    })
}

fn server_info(candidate: &ServerCandidate, meta: ServerMeta) -> ServerInfo {
    let city = meta.city.or(meta.colo).unwrap_or_else(|| UNKNOWN.to_string());
    let country = meta.country.unwrap_or_else(|| UNKNOWN.to_string());

    ServerInfo {
        host: host_with_port(&candidate.base_url),
        city,
        country,
        sponsor: candidate.sponsor.clone(),
    }
}

fn host_with_port(base_url: &str) -> String {
    match reqwest::Url::parse(base_url) {
        Ok(url) => match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => base_url.to_string(),
        },
        Err(_) => base_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_includes_default_port() {
        assert_eq!(host_with_port("https://speed.cloudflare.com"), "speed.cloudflare.com:443");
        assert_eq!(host_with_port("http://example.net:8080/"), "example.net:8080");
    }

    #[test]
    fn city_falls_back_to_colo() {
        let candidate = ServerCandidate::new("https://speed.cloudflare.com", "Cloudflare");
        let meta: ServerMeta = serde_json::from_str(r#"{"colo":"SJC","country":"US"}"#).unwrap();

        let server = server_info(&candidate, meta);

        assert_eq!(server.city, "SJC");
        assert_eq!(server.country, "US");
        assert_eq!(server.sponsor, "Cloudflare");
        assert_eq!(server.host, "speed.cloudflare.com:443");
    }

    #[test]
    fn meta_body_is_parsed() {
        let meta = parse_meta(br#"{"colo":"AMS","city":"Amsterdam","country":"NL","asn":13335}"#);
        assert_eq!(meta.colo.as_deref(), Some("AMS"));
        assert_eq!(meta.city.as_deref(), Some("Amsterdam"));
        assert_eq!(meta.country.as_deref(), Some("NL"));
    }

    #[test]
    fn unreadable_meta_body_falls_back_to_default() {
        let meta = parse_meta(b"<html>502</html>");
        assert!(meta.colo.is_none() && meta.city.is_none() && meta.country.is_none());
    }

    #[test]
    fn missing_meta_reads_unknown() {
        let candidate = ServerCandidate::new("https://speed.cloudflare.com", "Cloudflare");
        let server = server_info(&candidate, ServerMeta::default());
        assert_eq!(server.city, UNKNOWN);
        assert_eq!(server.country, UNKNOWN);
    }

    #[tokio::test]
    async fn measuring_before_selection_fails() {
        let factory = CloudflareFactory::new(MeasurementSettings::default());
        let mut client = factory.connect(Duration::from_secs(5)).unwrap();

        let err = client.measure_download(2).await.unwrap_err();

        assert!(matches!(err, MeasurementError::NoServerSelected));
        assert_eq!(client.last_ping_ms(), 0.0);
    }
}
