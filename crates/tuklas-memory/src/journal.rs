//! Discovery Store.
//!
//! Owns the persisted discovery list and the two profile scalars. Each lives
//! under its own key and every operation is a whole-document
//! read-modify-write: the full list is decoded, changed and re-encoded.
//!
//! | key             | value                                   |
//! |-----------------|-----------------------------------------|
//! | `@discoveries`  | JSON array of [`Discovery`], newest first |
//! | `@tuklasPoints` | decimal integer string                  |
//! | `@userLevel`    | one of the [`UserLevel`] labels         |
//!
//! Reads fail soft: an absent or unreadable key yields the empty list, zero
//! points or the default level. Writes do not: a save or delete whose read
//! fails returns the error and leaves the stored list alone. There is no locking; if two writers race the
//! last one wins.
//!
//! # Example
//!
//! ```rust
//! use tuklas_memory::{DiscoveryStore, MemoryKvStore, SaveOutcome};
//! use tuklas_types::{Discovery, LearningCard, SectionText};
//!
//! let store = DiscoveryStore::new(Box::new(MemoryKvStore::new()));
//! let card = LearningCard::new(
//!     SectionText::new("Observe", "..."),
//!     SectionText::new("Understand", "..."),
//!     SectionText::new("Create", "..."),
//! )
//! .unwrap();
//!
//! let first = Discovery::new("Electric Fan", card.clone()).unwrap();
//! assert_eq!(store.save_discovery(&first).unwrap(), SaveOutcome::Saved);
//!
//! let again = Discovery::new("electric fan", card).unwrap();
//! assert_eq!(store.save_discovery(&again).unwrap(), SaveOutcome::Duplicate);
//! assert_eq!(store.load_discoveries().len(), 1);
//! ```

use serde_json::Value;
use tracing::{debug, info, warn};
use tuklas_types::{Discovery, ProfileState, UserLevel};

use crate::kv::{KeyValueStore, StoreError};

pub const DISCOVERIES_KEY: &str = "@discoveries";
pub const POINTS_KEY: &str = "@tuklasPoints";
pub const LEVEL_KEY: &str = "@userLevel";

/// Result of [`DiscoveryStore::save_discovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The discovery was inserted at the head of the journal.
    Saved,
    /// An entry with the same object name (ignoring case) already exists;
    /// nothing was written.
    Duplicate,
}

/// The learner's journal and profile settings.
pub struct DiscoveryStore {
    kv: Box<dyn KeyValueStore>,
}

impl DiscoveryStore {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    // -------------------------------------------------------------------------
    // Discoveries
    // -------------------------------------------------------------------------

    /// All stored discoveries, newest first.
    ///
    /// Never fails. A missing key gives an empty list; a document that is not
    /// a JSON array also gives an empty list; individual records that no
    /// longer decode are skipped.
    pub fn load_discoveries(&self) -> Vec<Discovery> {
        match self.kv.get(DISCOVERIES_KEY) {
            Ok(raw) => decode_discoveries(raw.as_deref()),
            Err(e) => {
                warn!(error = %e, "failed to read discoveries; treating journal as empty");
                Vec::new()
            }
        }
    }

    /// Like [`load_discoveries`](Self::load_discoveries), but a failed read
    /// is an error. Save and delete start from this one.
    fn read_discoveries(&self) -> Result<Vec<Discovery>, StoreError> {
        let raw = self.kv.get(DISCOVERIES_KEY)?;
        Ok(decode_discoveries(raw.as_deref()))
    }

    /// Insert `discovery` at the head of the journal unless an entry with the
    /// same object name (ignoring case) is already present.
    pub fn save_discovery(&self, discovery: &Discovery) -> Result<SaveOutcome, StoreError> {
        let mut discoveries = self.read_discoveries()?;
        if discoveries
            .iter()
            .any(|d| d.is_same_object(&discovery.object_name))
        {
            debug!(object = %discovery.object_name, "duplicate discovery suppressed");
            return Ok(SaveOutcome::Duplicate);
        }

        discoveries.insert(0, discovery.clone());
        self.write_discoveries(&discoveries)?;
        info!(object = %discovery.object_name, date = %discovery.date, "discovery saved");
        Ok(SaveOutcome::Saved)
    }

    /// Remove the entry whose `date` equals `date_key`.
    ///
    /// An unknown key leaves the journal untouched.
    pub fn delete_discovery(&self, date_key: &str) -> Result<(), StoreError> {
        let mut discoveries = self.read_discoveries()?;
        let before = discoveries.len();
        discoveries.retain(|d| d.date != date_key);
        if discoveries.len() == before {
            debug!(date = %date_key, "no discovery with that date; nothing deleted");
            return Ok(());
        }
        self.write_discoveries(&discoveries)?;
        info!(date = %date_key, "discovery deleted");
        Ok(())
    }

    pub fn discovery_count(&self) -> usize {
        self.load_discoveries().len()
    }

    /// Object names of the `limit` most recent discoveries, newest first.
    pub fn recent_object_names(&self, limit: usize) -> Vec<String> {
        self.load_discoveries()
            .into_iter()
            .take(limit)
            .map(|d| d.object_name)
            .collect()
    }

    fn write_discoveries(&self, discoveries: &[Discovery]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(discoveries).map_err(|e| StoreError::Encode {
            key: DISCOVERIES_KEY.to_string(),
            details: e.to_string(),
        })?;
        self.kv.set(DISCOVERIES_KEY, &raw)
    }

    // -------------------------------------------------------------------------
    // Points
    // -------------------------------------------------------------------------

    /// Accumulated points, `0` when absent or unparseable.
    pub fn get_points(&self) -> u32 {
        self.read_points().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read points; using 0");
            0
        })
    }

    /// Add `n` points and return the new total. A failed read leaves the
    /// stored total untouched.
    pub fn add_points(&self, n: u32) -> Result<u32, StoreError> {
        let total = self.read_points()?.saturating_add(n);
        self.kv.set(POINTS_KEY, &total.to_string())?;
        debug!(added = n, total, "points updated");
        Ok(total)
    }

    fn read_points(&self) -> Result<u32, StoreError> {
        Ok(match self.kv.get(POINTS_KEY)? {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                warn!(value = %raw, "stored points are not a number; using 0");
                0
            }),
            None => 0,
        })
    }

    // -------------------------------------------------------------------------
    // Level
    // -------------------------------------------------------------------------

    /// Chosen explanation level, [`UserLevel::BatangKuryoso`] by default.
    pub fn get_level(&self) -> UserLevel {
        match self.kv.get(LEVEL_KEY) {
            Ok(Some(raw)) => raw.parse::<UserLevel>().unwrap_or_else(|e| {
                warn!(error = %e, "unknown stored level; using default");
                UserLevel::default()
            }),
            Ok(None) => UserLevel::default(),
            Err(e) => {
                warn!(error = %e, "failed to read level; using default");
                UserLevel::default()
            }
        }
    }

    pub fn set_level(&self, level: UserLevel) -> Result<(), StoreError> {
        self.kv.set(LEVEL_KEY, level.label())?;
        info!(level = %level, "level changed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Profile snapshot
    // -------------------------------------------------------------------------

    /// Read both profile scalars into a session snapshot.
    pub fn profile(&self) -> ProfileState {
        ProfileState {
            points: self.get_points(),
            level: self.get_level(),
        }
    }

    /// Re-read the snapshot; call when a screen becomes active.
    pub fn refresh_profile(&self, profile: &mut ProfileState) {
        *profile = self.profile();
    }
}

/// Decode the `@discoveries` document. Absent or corrupt documents give an
/// empty list; records that no longer decode are skipped.
fn decode_discoveries(raw: Option<&str>) -> Vec<Discovery> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let records: Vec<Value> = match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "discoveries document is corrupt; treating journal as empty");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<Discovery>(record) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(index = i, error = %e, "skipping unreadable discovery record");
                None
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
