//! [`ScanPipeline`] – capture an image and turn it into a journal entry.
//!
//! One scan walks `Idle → Capturing → Identifying → CardGenerating →
//! Persisting → Idle`. Remote failures end the walk early with a
//! [`ScanOutcome`] the front end can show; only capture and storage faults
//! surface as errors.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use tuklas_hal::{Camera, Feedback, Haptics};
use tuklas_memory::{DiscoveryStore, SaveOutcome};
use tuklas_types::{Discovery, LearningCard, ProfileState, TuklasError};

use crate::gateway::InferenceGateway;

/// Points awarded for every newly stored discovery.
pub const POINTS_PER_DISCOVERY: u32 = 10;

pub const UNIDENTIFIED_MESSAGE: &str = "Could not identify the object.";
pub const CARD_UNAVAILABLE_MESSAGE: &str = "Tuklascope could not generate learning content for \
     this object. The AI may be busy or has reached its limit.";

/// Where a scan currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Capturing,
    Identifying,
    CardGenerating,
    Persisting,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanState::Idle => "idle",
            ScanState::Capturing => "capturing",
            ScanState::Identifying => "identifying",
            ScanState::CardGenerating => "card-generating",
            ScanState::Persisting => "persisting",
        };
        f.write_str(label)
    }
}

/// How a scan that reached the network ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// New object: stored at the head of the journal and points awarded.
    Discovered {
        discovery: Discovery,
        points_awarded: u32,
        total_points: u32,
    },
    /// The journal already holds this object; the fresh card is shown but
    /// nothing is stored.
    Rediscovered { discovery: Discovery },
    Unidentified,
    CardUnavailable { object_name: String },
}

impl ScanOutcome {
    /// The card to show, if the scan produced one.
    pub fn card(&self) -> Option<&LearningCard> {
        match self {
            ScanOutcome::Discovered { discovery, .. } | ScanOutcome::Rediscovered { discovery } => {
                Some(&discovery.learning_data)
            }
            _ => None,
        }
    }

    /// User-facing alert for the failure outcomes.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ScanOutcome::Unidentified => Some(UNIDENTIFIED_MESSAGE),
            ScanOutcome::CardUnavailable { .. } => Some(CARD_UNAVAILABLE_MESSAGE),
            _ => None,
        }
    }
}

/// Drives one scan at a time from shutter press to journal entry.
///
/// `scan` takes `&mut self`, so a pipeline can never run two scans at once.
pub struct ScanPipeline<C: Camera> {
    camera: C,
    haptics: Box<dyn Haptics>,
    gateway: Arc<dyn InferenceGateway>,
    state: ScanState,
}

impl<C: Camera> ScanPipeline<C> {
    pub fn new(camera: C, haptics: Box<dyn Haptics>, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self {
            camera,
            haptics,
            gateway,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    /// Run one full scan against `store`.
    ///
    /// `profile` supplies the explanation level and receives the new point
    /// total when a discovery is stored.
    ///
    /// # Errors
    ///
    /// Returns [`TuklasError::Capture`] if the camera fails, or
    /// [`TuklasError::Storage`] if the discovery cannot be written.
    pub async fn scan(
        &mut self,
        store: &DiscoveryStore,
        profile: &mut ProfileState,
    ) -> Result<ScanOutcome, TuklasError> {
        self.haptics.notify(Feedback::Impact);
        let result = self.run(store, profile).await;
        self.enter(ScanState::Idle);
        result
    }

    async fn run(
        &mut self,
        store: &DiscoveryStore,
        profile: &mut ProfileState,
    ) -> Result<ScanOutcome, TuklasError> {
        self.enter(ScanState::Capturing);
        let image = match self.camera.capture() {
            Ok(image) => image,
            Err(e) => {
                warn!(camera = self.camera.id(), error = %e, "capture failed");
                self.haptics.notify(Feedback::Error);
                return Err(e);
            }
        };

        self.enter(ScanState::Identifying);
        let found = self.gateway.identify(&image).await;
        if !found.is_identified() {
            info!("object not identified");
            self.haptics.notify(Feedback::Error);
            return Ok(ScanOutcome::Unidentified);
        }

        self.enter(ScanState::CardGenerating);
        let Some(card) = self
            .gateway
            .generate_card(&found.object_name, &found.context, profile.level)
            .await
        else {
            self.haptics.notify(Feedback::Error);
            return Ok(ScanOutcome::CardUnavailable {
                object_name: found.object_name,
            });
        };

        self.enter(ScanState::Persisting);
        self.haptics.notify(Feedback::Success);
        let discovery = Discovery::new(found.object_name, card)?;
        let saved = store
            .save_discovery(&discovery)
            .map_err(|e| TuklasError::Storage(e.to_string()))?;

        match saved {
            SaveOutcome::Duplicate => {
                info!(object = %discovery.object_name, "already in journal");
                Ok(ScanOutcome::Rediscovered { discovery })
            }
            SaveOutcome::Saved => {
                let points_awarded = match store.add_points(POINTS_PER_DISCOVERY) {
                    Ok(total) => {
                        profile.points = total;
                        POINTS_PER_DISCOVERY
                    }
                    Err(e) => {
                        warn!(error = %e, "discovery stored but points were not awarded");
                        0
                    }
                };
                info!(
                    object = %discovery.object_name,
                    points = profile.points,
                    "new discovery"
                );
                Ok(ScanOutcome::Discovered {
                    discovery,
                    points_awarded,
                    total_points: profile.points,
                })
            }
        }
    }

    fn enter(&mut self, next: ScanState) {
        debug!(from = %self.state, to = %next, "scan state");
        self.state = next;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
