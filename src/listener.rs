//! ==============================================================================
//! listener.rs - alert listener (poll loop)
//! ==============================================================================
//!
//! purpose:
//!     polls the service's GET /alert on a fixed cadence and plays a localized
//!     cue whenever the level or the language changes.
//!
//! one iteration, strictly sequential:
//!
//!     fetch ──fail──> log, keep last observation
//!       │
//!       ok
//!       ▼
//!     compare (level, language) with last observation
//!       │ unchanged -> nothing
//!       │ changed
//!       ▼
//!     cue? (GREEN has none) -> play (blocking, offloaded) -> remember
//!
//! the cadence never changes: no backoff on failure, no early re-poll on a
//! change. a slow playback pushes the next poll back instead of queueing.
//!
//! relationships:
//!     - polls: service.rs (GET /alert)
//!     - uses: audio.rs (Cue mapping, AudioPlayer capability)
//!
//! ==============================================================================

use crate::audio::{AudioPlayer, Cue};
use crate::domain::AlertLevel;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// where the listener gets the current alert from
pub trait AlertSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Observation>> + Send;
}

/// GET <backend_url> with a bounded timeout
pub struct HttpAlertSource {
    client: reqwest::Client,
    url: String,
}

impl HttpAlertSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, url: url.into() })
    }
}

impl AlertSource for HttpAlertSource {
    fn fetch(&self) -> impl Future<Output = Result<Observation>> + Send {
        async move {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .with_context(|| format!("GET {}", self.url))?
                .error_for_status()?;

            response.json::<Observation>().await.context("invalid /alert body")
        }
    }
}

/// the (level, language) pair the listener cares about.
/// decoded straight from GET /alert; everything else in the body
/// (last_updated included) is ignored, whatever its format.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Observation {
    pub level: AlertLevel,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Unchanged,
    /// changed; None for GREEN
    Changed(Option<Cue>),
}

/// remembers the last observation and decides what a new one means
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<Observation>,
}

impl ChangeDetector {
    /// compare against the last observation, then make `snapshot` the new
    /// baseline. the baseline moves even when no cue is played.
    pub fn observe(&mut self, snapshot: &Observation) -> Decision {
        let changed = match &self.last {
            Some(last) => last.level != snapshot.level || last.language != snapshot.language,
            None => true,
        };
        if !changed {
            return Decision::Unchanged;
        }

        self.last = Some(snapshot.clone());
        Decision::Changed(Cue::for_alert(snapshot.level, &snapshot.language))
    }
}

/// what one poll iteration ended up doing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    FetchFailed,
    Unchanged,
    /// changed into GREEN
    Silent,
    Played(Cue),
    PlaybackFailed(Cue),
}

pub struct Listener<S> {
    source: S,
    player: Arc<dyn AudioPlayer>,
    detector: ChangeDetector,
    interval: Duration,
}

impl<S: AlertSource> Listener<S> {
    pub fn new(source: S, player: Arc<dyn AudioPlayer>, interval: Duration) -> Self {
        Self { source, player, detector: ChangeDetector::default(), interval }
    }

    #[cfg(test)]
    pub fn last_observation(&self) -> Option<&Observation> {
        self.detector.last.as_ref()
    }

    /// one full fetch -> compare -> play -> remember iteration
    pub async fn tick(&mut self) -> TickOutcome {
        let snapshot = match self.source.fetch().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Backend not reachable, retrying next interval: {:#}", e);
                return TickOutcome::FetchFailed;
            }
        };

        let cue = match self.detector.observe(&snapshot) {
            Decision::Unchanged => return TickOutcome::Unchanged,
            Decision::Changed(cue) => cue,
        };

        tracing::info!(level = %snapshot.level, language = %snapshot.language, "New alert");

        let Some(cue) = cue else {
            return TickOutcome::Silent;
        };

        let player = self.player.clone();
        let result = tokio::task::spawn_blocking(move || player.play(&cue))
            .await
            .map_err(|e| anyhow::anyhow!("playback task join error: {}", e))
            .and_then(|r| r);

        match result {
            Ok(()) => {
                tracing::info!("[AUDIO] played {}", cue.stem());
                TickOutcome::Played(cue)
            }
            Err(e) => {
                tracing::warn!("[AUDIO] playback of {} failed: {:#}", cue.stem(), e);
                TickOutcome::PlaybackFailed(cue)
            }
        }
    }

    /// poll until `shutdown` flips to true (or its sender is dropped).
    /// the first poll happens immediately.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("polling every {}s", self.interval.as_secs());

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("listener stopped");
    }
}
