use std::collections::HashMap;
use std::time::Duration;

/// Preference id under which the host stores the trigger keyword.
pub const KEYWORD_PREFERENCE: &str = "recents_kw";
pub const DEFAULT_KEYWORD: &str = "speedtest";

/// Timeout handed to the measurement client for connection setup.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
/// Concurrent transfer streams per direction.
pub const TRANSFER_THREADS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    trigger_keyword: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD)
    }
}

impl Preferences {
    pub fn new(trigger_keyword: impl Into<String>) -> Self {
        Self {
            trigger_keyword: trigger_keyword.into(),
        }
    }

    pub fn trigger_keyword(&self) -> &str {
        &self.trigger_keyword
    }

    /// Takes the keyword from the host's initial preferences snapshot.
    pub fn load(&mut self, snapshot: &HashMap<String, String>) -> anyhow::Result<()> {
        let keyword = snapshot
            .get(KEYWORD_PREFERENCE)
            .ok_or_else(|| anyhow::anyhow!("preference `{KEYWORD_PREFERENCE}` missing from snapshot"))?;
        self.trigger_keyword = keyword.clone();
        Ok(())
    }

    /// Applies a live preference change. Returns whether the keyword changed.
    pub fn apply_update(&mut self, id: &str, new_value: &str) -> bool {
        if id != KEYWORD_PREFERENCE {
            return false;
        }
        self.trigger_keyword = new_value.to_string();
        true
    }
}

#[derive(Debug, Clone)]
pub struct MeasurementSettings {
    pub ping_count: usize,
    pub download_size_mb: u64,
    pub upload_size_mb: u64,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            ping_count: 5,
            download_size_mb: 25,
            upload_size_mb: 10,
        }
    }
}

impl MeasurementSettings {
    pub fn download_size_bytes(&self) -> u64 {
        self.download_size_mb.saturating_mul(1_000_000)
    }

    pub fn upload_size_bytes(&self) -> usize {
        usize::try_from(self.upload_size_mb.saturating_mul(1_000_000)).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn load_reads_keyword() {
        let mut prefs = Preferences::default();
        prefs.load(&snapshot(&[("recents_kw", "spd")])).unwrap();
        assert_eq!(prefs.trigger_keyword(), "spd");
    }

    #[test]
    fn load_without_keyword_fails_and_keeps_value() {
        let mut prefs = Preferences::new("spd");
        assert!(prefs.load(&snapshot(&[("other_pref", "x")])).is_err());
        assert_eq!(prefs.trigger_keyword(), "spd");
    }

    #[test]
    fn update_only_touches_keyword_preference() {
        let mut prefs = Preferences::new("spd");

        assert!(!prefs.apply_update("other_pref", "nope"));
        assert_eq!(prefs.trigger_keyword(), "spd");

        assert!(prefs.apply_update("recents_kw", "speed"));
        assert_eq!(prefs.trigger_keyword(), "speed");
    }

    #[test]
    fn any_keyword_value_is_accepted() {
        let mut prefs = Preferences::default();
        prefs.apply_update("recents_kw", "");
        assert_eq!(prefs.trigger_keyword(), "");
    }

    #[test]
    fn sizes_are_decimal_megabytes() {
        let settings = MeasurementSettings::default();
        assert_eq!(settings.download_size_bytes(), 25_000_000);
        assert_eq!(settings.upload_size_bytes(), 10_000_000);
    }

    #[test]
    fn huge_sizes_saturate() {
        let settings = MeasurementSettings {
            ping_count: 1,
            download_size_mb: u64::MAX,
            upload_size_mb: u64::MAX,
        };
        assert_eq!(settings.download_size_bytes(), u64::MAX);
        assert_eq!(settings.upload_size_bytes(), usize::MAX);
    }
}
