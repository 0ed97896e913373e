use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[async_trait]
pub trait Pinger: Send + Sync {
    /// Returns the HTTP status of the ping.
    async fn ping(&self) -> Result<u16>;
}

/// GETs the upstream health route.
pub struct HealthPinger {
    url: String,
    client: reqwest::Client,
}

impl HealthPinger {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl Pinger for HealthPinger {
    async fn ping(&self) -> Result<u16> {
        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Keep-alive ping failed: {}", e)))?;
        Ok(response.status().as_u16())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub initial_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeepAliveStatus {
    pub enabled: bool,
    pub paused: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running,
    Paused,
}

struct Inner {
    phase: Phase,
    task: Option<JoinHandle<()>>,
}

impl Inner {
    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Periodic warm-up pings against the metadata backend.
///
/// The pinging task is owned by this handle: `stop` (or dropping the handle)
/// cancels it. `pause`/`resume` cancel and re-schedule the task without
/// forgetting that the service is enabled.
pub struct KeepAlive {
    pinger: Arc<dyn Pinger>,
    settings: KeepAliveSettings,
    inner: Mutex<Inner>,
}

impl KeepAlive {
    pub fn new(pinger: Arc<dyn Pinger>, settings: KeepAliveSettings) -> Self {
        Self {
            pinger,
            settings,
            inner: Mutex::new(Inner {
                phase: Phase::Stopped,
                task: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn(&self, first_ping_after: Duration) -> JoinHandle<()> {
        let pinger = self.pinger.clone();
        let period = self.settings.interval;
        let first_tick = Instant::now() + first_ping_after;
        tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                ping_once(pinger.as_ref()).await;
            }
        })
    }

    /// Starts pinging. Returns `false` when disabled or already started.
    pub fn start(&self) -> bool {
        if !self.settings.enabled {
            tracing::info!(
                "Keep-alive disabled (set KEEP_ALIVE_ENABLED=true or ENVIRONMENT=production to enable)"
            );
            return false;
        }

        let mut inner = self.lock();
        if inner.phase != Phase::Stopped {
            tracing::info!("Keep-alive already running");
            return false;
        }

        tracing::info!(
            "Starting keep-alive service (ping every {}s)",
            self.settings.interval.as_secs()
        );
        inner.task = Some(self.spawn(self.settings.initial_delay));
        inner.phase = Phase::Running;
        true
    }

    /// Suspends pinging until `resume`.
    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.phase == Phase::Running {
            tracing::info!("Pausing keep-alive");
            inner.abort_task();
            inner.phase = Phase::Paused;
        }
    }

    /// Restarts a paused service; the next ping comes one full interval later.
    pub fn resume(&self) {
        let mut inner = self.lock();
        if inner.phase == Phase::Paused {
            tracing::info!("Resuming keep-alive");
            inner.task = Some(self.spawn(self.settings.interval));
            inner.phase = Phase::Running;
        }
    }

    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.abort_task();
        if inner.phase != Phase::Stopped {
            tracing::info!("Keep-alive service stopped");
        }
        inner.phase = Phase::Stopped;
    }

    pub fn status(&self) -> KeepAliveStatus {
        let inner = self.lock();
        KeepAliveStatus {
            enabled: inner.phase != Phase::Stopped,
            paused: inner.phase == Phase::Paused,
            interval_ms: u64::try_from(self.settings.interval.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.lock().abort_task();
    }
}

async fn ping_once(pinger: &dyn Pinger) {
    tracing::debug!("Pinging server to keep it warm...");
    match pinger.ping().await {
        Ok(status) if (200..300).contains(&status) => {
            tracing::debug!("Server ping successful")
        }
        Ok(status) => tracing::warn!("Server ping returned {}", status),
        Err(e) => tracing::warn!("{}", e),
    }
}
