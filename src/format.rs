//! Turns a finished measurement into the rows shown in the launcher.

use crate::speedtest::MeasurementResult;

pub const PING_ICON: &str = "images/ping.png";
pub const DOWNLOAD_ICON: &str = "images/download.png";
pub const UPLOAD_ICON: &str = "images/upload.png";
pub const SERVER_ICON: &str = "images/server.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub icon: &'static str,
    pub title: String,
    pub subtitle: String,
    /// Text placed on the clipboard when the row is activated.
    pub copy_payload: String,
}

impl DisplayItem {
    fn new(icon: &'static str, title: String, subtitle: String) -> Self {
        Self {
            icon,
            copy_payload: title.clone(),
            title,
            subtitle,
        }
    }
}

/// Whole numbers keep a trailing `.0`, everything else prints as measured.
pub fn ping_line(ping_ms: f64) -> String {
    if ping_ms.is_finite() && ping_ms.fract() == 0.0 {
        format!("Ping: {ping_ms:.1} ms")
    } else {
        format!("Ping: {ping_ms} ms")
    }
}

pub fn download_line(mbps: f64) -> String {
    format!("Download Speed: {mbps:.2} Mbps")
}

pub fn upload_line(mbps: f64) -> String {
    format!("Upload Speed: {mbps:.2} Mbps")
}

/// Rows in display order: ping, download, upload, server.
pub fn format_results(result: &MeasurementResult) -> [DisplayItem; 4] {
    let server = &result.server;
    [
        DisplayItem::new(
            PING_ICON,
            ping_line(result.ping_ms),
            "Display ping information".to_string(),
        ),
        DisplayItem::new(
            DOWNLOAD_ICON,
            download_line(result.download_mbps),
            "Display download speed information".to_string(),
        ),
        DisplayItem::new(
            UPLOAD_ICON,
            upload_line(result.upload_mbps),
            "Display upload speed information".to_string(),
        ),
        DisplayItem::new(
            SERVER_ICON,
            format!("Server: {} ({})", server.sponsor, server.host),
            format!(
                "Server: {}(Host: {}) located in {}, {}",
                server.sponsor, server.host, server.city, server.country
            ),
        ),
    ]
}
