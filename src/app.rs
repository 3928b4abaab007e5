use crate::format::{format_results, ping_line};
use crate::host::{EventKind, HostEvent, RenderAction};
use crate::settings::{Preferences, CLIENT_TIMEOUT, TRANSFER_THREADS};
use crate::speedtest::{bits_to_mbps, ClientFactory, MeasurementResult};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

/// State handed to every listener.
pub struct ExtensionContext {
    pub preferences: Preferences,
    pub clients: Box<dyn ClientFactory>,
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &HostEvent, ctx: &mut ExtensionContext) -> Result<Option<RenderAction>>;
}

pub struct Extension {
    listeners: HashMap<EventKind, Box<dyn EventListener>>,
    ctx: ExtensionContext,
}

impl Extension {
    /// Builds the extension with its listeners subscribed.
    pub fn new(preferences: Preferences, clients: Box<dyn ClientFactory>) -> Self {
        let mut ext = Self {
            listeners: HashMap::new(),
            ctx: ExtensionContext { preferences, clients },
        };
        ext.subscribe(EventKind::KeywordQuery, SpeedTestListener);
        ext.subscribe(EventKind::Preferences, PreferencesListener);
        ext.subscribe(EventKind::PreferencesUpdate, PreferencesUpdateListener);
        ext
    }

    pub fn subscribe(&mut self, kind: EventKind, listener: impl EventListener + 'static) {
        self.listeners.insert(kind, Box::new(listener));
    }

    pub fn keyword(&self) -> &str {
        self.ctx.preferences.trigger_keyword()
    }

    pub async fn dispatch(&mut self, event: &HostEvent) -> Result<Option<RenderAction>> {
        let Some(listener) = self.listeners.get(&event.kind()) else {
            debug!(kind = ?event.kind(), "no listener subscribed");
            return Ok(None);
        };
        listener.on_event(event, &mut self.ctx).await
    }
}

/// Performs one measurement run. Client failures are returned untouched.
pub async fn run_speed_test(clients: &dyn ClientFactory) -> Result<MeasurementResult> {
    let mut client = clients.connect(CLIENT_TIMEOUT)?;

    let server = client.select_best_server().await?;
    let download_mbps = bits_to_mbps(client.measure_download(TRANSFER_THREADS).await?);
    let upload_mbps = bits_to_mbps(client.measure_upload(TRANSFER_THREADS).await?);
    let ping_ms = client.last_ping_ms();

    info!(
        "Selected Server: {} (Host: {}) located in {}, {}",
        server.sponsor, server.host, server.city, server.country
    );
    info!("Download speed: {download_mbps:.2} Mbps");
    info!("Upload speed: {upload_mbps:.2} Mbps");
    info!("{}", ping_line(ping_ms));

    Ok(MeasurementResult {
        ping_ms,
        download_mbps,
        upload_mbps,
        server,
    })
}

pub struct SpeedTestListener;

#[async_trait]
impl EventListener for SpeedTestListener {
    async fn on_event(&self, event: &HostEvent, ctx: &mut ExtensionContext) -> Result<Option<RenderAction>> {
        if let HostEvent::KeywordQuery { keyword, argument } = event {
            debug!(%keyword, ?argument, "speed test triggered");
        }
        let result = run_speed_test(ctx.clients.as_ref()).await?;
        Ok(Some(RenderAction::result_list(format_results(&result))))
    }
}

pub struct PreferencesListener;

#[async_trait]
impl EventListener for PreferencesListener {
    async fn on_event(&self, event: &HostEvent, ctx: &mut ExtensionContext) -> Result<Option<RenderAction>> {
        let HostEvent::Preferences { preferences } = event else {
            debug!(kind = ?event.kind(), "preferences listener got a foreign event");
            return Ok(None);
        };
        ctx.preferences.load(preferences)?;
        info!(keyword = ctx.preferences.trigger_keyword(), "preferences loaded");
        Ok(None)
    }
}

pub struct PreferencesUpdateListener;

#[async_trait]
impl EventListener for PreferencesUpdateListener {
    async fn on_event(&self, event: &HostEvent, ctx: &mut ExtensionContext) -> Result<Option<RenderAction>> {
        let HostEvent::PreferencesUpdate { id, old_value, new_value } = event else {
            debug!(kind = ?event.kind(), "preferences update listener got a foreign event");
            return Ok(None);
        };
        if ctx.preferences.apply_update(id, new_value) {
            info!(?old_value, keyword = %new_value, "trigger keyword updated");
        } else {
            debug!(%id, "ignoring preference update");
        }
        Ok(None)
    }
}
