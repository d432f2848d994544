//! Server liveness beacon
//!
//! A loop that asks the server whether it is alive, writes the answer into
//! the page's `beacon` element and sleeps for the configured interval. The
//! loop keeps running until its cancellation token fires; a suspended
//! beacon keeps ticking but skips the request.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::settings::{SettingKey, SettingValue, SharedSettings};
use crate::config::storage::{KeyValueStore, StoreError};
use crate::network::client::LivenessProbe;
use crate::ui::page::SharedPage;

/// Id of the element showing the beacon status
pub const BEACON_ELEMENT: &str = "beacon";

/// Class marking the beacon element as failed
pub const ERROR_CLASS: &str = "error";

pub const NOT_RESPONDING: &str = "Server is not responding";

pub const SUSPENDED: &str = "Beacon is suspended";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconState {
    Suspended,
    Polling,
}

impl BeaconState {
    pub fn from_active(active: bool) -> Self {
        if active {
            BeaconState::Polling
        } else {
            BeaconState::Suspended
        }
    }
}

/// Result of one liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeaconOutcome {
    Alive(String),
    NotResponding,
}

impl BeaconOutcome {
    pub fn text(&self) -> &str {
        match self {
            BeaconOutcome::Alive(text) => text,
            BeaconOutcome::NotResponding => NOT_RESPONDING,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BeaconOutcome::NotResponding)
    }
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// `None` when the beacon was suspended and no request went out
    pub outcome: Option<BeaconOutcome>,
    /// Delay before the next cycle
    pub next_delay: Duration,
}

async fn render(page: &SharedPage, text: &str, error: bool) {
    let mut page = page.write().await;
    match page.element_mut(BEACON_ELEMENT) {
        Some(element) => {
            element.set_content(text);
            if error {
                element.add_class(ERROR_CLASS);
            } else {
                element.remove_class(ERROR_CLASS);
            }
        }
        None => tracing::warn!("Beacon field was not found"),
    }
}

/// The polling loop
pub struct BeaconPoller<P, S: KeyValueStore> {
    probe: P,
    settings: SharedSettings<S>,
    page: SharedPage,
}

impl<P, S> BeaconPoller<P, S>
where
    P: LivenessProbe,
    S: KeyValueStore + Send + Sync,
{
    pub fn new(probe: P, settings: SharedSettings<S>, page: SharedPage) -> Self {
        Self {
            probe,
            settings,
            page,
        }
    }

    /// Handle for user actions on the same settings and page
    pub fn control(&self) -> BeaconControl<S> {
        BeaconControl {
            settings: self.settings.clone(),
            page: self.page.clone(),
        }
    }

    pub async fn state(&self) -> BeaconState {
        BeaconState::from_active(self.settings.read().await.settings().beacon.active)
    }

    /// Run one cycle: check liveness if active, render the result, and
    /// report the delay until the next cycle.
    pub async fn cycle(&self) -> CycleReport {
        // Read fresh so a toggle takes effect on the next cycle
        let active = self.settings.read().await.settings().beacon.active;

        let outcome = if active {
            let outcome = match self.probe.check().await {
                Ok(response) if response.status => BeaconOutcome::Alive(response.alive_text()),
                Ok(response) => {
                    tracing::debug!("Beacon answered with failure status: {:?}", response);
                    BeaconOutcome::NotResponding
                }
                Err(e) => {
                    tracing::warn!("Beacon request failed: {}", e);
                    BeaconOutcome::NotResponding
                }
            };
            render(&self.page, outcome.text(), outcome.is_error()).await;
            Some(outcome)
        } else {
            None
        };

        let next_delay = self.settings.read().await.settings().beacon.interval();
        CycleReport {
            outcome,
            next_delay,
        }
    }

    /// Loop until `cancel` fires, reporting every cycle on `progress_tx`.
    pub async fn run(self, progress_tx: mpsc::Sender<CycleReport>, cancel: CancellationToken) {
        tracing::info!("Beacon loop started ({:?})", self.state().await);

        loop {
            let report = tokio::select! {
                report = self.cycle() => report,
                _ = cancel.cancelled() => break,
            };

            let delay = report.next_delay;
            // A slow or gone receiver loses reports, the beacon keeps going
            match progress_tx.try_send(report) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!("Progress channel full, dropping cycle report");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("Beacon loop stopped");
    }
}

/// User-facing switch for the beacon
pub struct BeaconControl<S: KeyValueStore> {
    settings: SharedSettings<S>,
    page: SharedPage,
}

impl<S: KeyValueStore> Clone for BeaconControl<S> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            page: self.page.clone(),
        }
    }
}

impl<S: KeyValueStore> BeaconControl<S> {
    pub fn new(settings: SharedSettings<S>, page: SharedPage) -> Self {
        Self { settings, page }
    }

    /// Flip and persist `beacon.active`. Suspending immediately replaces the
    /// beacon text and clears the error styling; an in-flight check may still
    /// render its own result afterwards.
    pub async fn toggle(&self) -> Result<BeaconState, StoreError> {
        let active = {
            let mut settings = self.settings.write().await;
            let next = !settings.settings().beacon.active;
            settings.set_key(SettingKey::BeaconActive, SettingValue::Bool(next))?;
            next
        };

        if !active {
            render(&self.page, SUSPENDED, false).await;
        }

        let state = BeaconState::from_active(active);
        tracing::info!("Beacon is now {:?}", state);
        Ok(state)
    }
}
