//! `tuklas-types` – the shared data model of Tuklascope.
//!
//! Every other crate in the workspace speaks in terms of these types:
//!
//! - [`Discovery`] – one journal record per successfully identified object.
//! - [`LearningCard`] – the three-part Observe / Understand / Create card.
//! - [`UserLevel`] and [`ProfileState`] – the learner's explanation tier and
//!   accumulated points.
//! - [`ConversationEntry`] – one bubble in a "Bakit?" explanation thread.
//! - [`careers`] – the static Tuklas-Connect career catalog.

pub mod careers;

pub use careers::{Career, CareerFilter, UnknownFilter};

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Learning card
// ─────────────────────────────────────────────────────────────────────────────

/// A titled block of explanatory text, as produced by the AI service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SectionText {
    pub title: String,
    pub text: String,
}

impl SectionText {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.text.trim().is_empty()
    }
}

/// The three stages of the "Observe, Understand, Create" learning journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// An attention-grabbing, observable fact about the object.
    Observe,
    /// The STEM principle behind the observable fact.
    Understand,
    /// How the principle is applied, and a related career path.
    Create,
}

impl SectionKind {
    /// All kinds in card order.
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Observe,
        SectionKind::Understand,
        SectionKind::Create,
    ];

    /// Field name used for this section in the persisted journal.
    pub fn storage_key(self) -> &'static str {
        match self {
            SectionKind::Observe => "stem",
            SectionKind::Understand => "tech",
            SectionKind::Create => "local",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Observe => "Observe",
            SectionKind::Understand => "Understand",
            SectionKind::Create => "Create",
        }
    }
}

/// One section of a [`LearningCard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSection {
    pub kind: SectionKind,
    pub title: String,
    pub text: String,
}

/// Returned when a card would be missing a title or text in any section.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("learning card is incomplete: every section needs a title and text")]
pub struct IncompleteCard;

/// Exactly three sections, always in Observe, Understand, Create order.
///
/// A card is built whole or not at all: [`LearningCard::new`] refuses any
/// section with a blank title or text, so a stored card is never partially
/// filled.
///
/// On disk the card keeps the journal's historical field names
/// (`stem`, `tech`, `local`); see [`SectionKind::storage_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCard", into = "StoredCard")]
pub struct LearningCard {
    sections: [CardSection; 3],
}

impl LearningCard {
    /// Assemble a card from its three parts, or `None` if any part is blank.
    pub fn new(observe: SectionText, understand: SectionText, create: SectionText) -> Option<Self> {
        if !(observe.is_complete() && understand.is_complete() && create.is_complete()) {
            return None;
        }
        let section = |kind, s: SectionText| CardSection {
            kind,
            title: s.title,
            text: s.text,
        };
        Some(Self {
            sections: [
                section(SectionKind::Observe, observe),
                section(SectionKind::Understand, understand),
                section(SectionKind::Create, create),
            ],
        })
    }

    /// Sections in card order.
    pub fn sections(&self) -> &[CardSection] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> &CardSection {
        match kind {
            SectionKind::Observe => &self.sections[0],
            SectionKind::Understand => &self.sections[1],
            SectionKind::Create => &self.sections[2],
        }
    }
}

/// Persisted shape of a [`LearningCard`].
#[derive(Serialize, Deserialize)]
struct StoredCard {
    stem: SectionText,
    tech: SectionText,
    local: SectionText,
}

impl TryFrom<StoredCard> for LearningCard {
    type Error = IncompleteCard;

    fn try_from(stored: StoredCard) -> Result<Self, Self::Error> {
        LearningCard::new(stored.stem, stored.tech, stored.local).ok_or(IncompleteCard)
    }
}

impl From<LearningCard> for StoredCard {
    fn from(card: LearningCard) -> Self {
        let [observe, understand, create] = card.sections;
        let text = |s: CardSection| SectionText {
            title: s.title,
            text: s.text,
        };
        Self {
            stem: text(observe),
            tech: text(understand),
            local: text(create),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────────────

/// One journal record per successfully identified object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    /// Identified label, e.g. `"Computer Mouse"`.
    pub object_name: String,
    pub learning_data: LearningCard,
    /// ISO-8601 creation time; doubles as the record's key.
    pub date: String,
}

impl Discovery {
    /// Create a discovery stamped with the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`TuklasError::InvalidDiscovery`] when `object_name` is blank.
    pub fn new(object_name: impl Into<String>, card: LearningCard) -> Result<Self, TuklasError> {
        Self::with_date(object_name, card, iso_timestamp_now())
    }

    /// Create a discovery with an explicit date key.
    pub fn with_date(
        object_name: impl Into<String>,
        card: LearningCard,
        date: impl Into<String>,
    ) -> Result<Self, TuklasError> {
        let object_name = object_name.into();
        if object_name.trim().is_empty() {
            return Err(TuklasError::InvalidDiscovery(
                "object name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            object_name,
            learning_data: card,
            date: date.into(),
        })
    }

    /// Case-insensitive comparison used for journal de-duplication.
    pub fn is_same_object(&self, object_name: &str) -> bool {
        self.object_name.to_lowercase() == object_name.to_lowercase()
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn iso_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Explanation-complexity tier chosen by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserLevel {
    #[default]
    #[serde(rename = "Batang Kuryoso")]
    BatangKuryoso,
    #[serde(rename = "High School Explorer")]
    HighSchoolExplorer,
    #[serde(rename = "College Innovator")]
    CollegeInnovator,
}

impl UserLevel {
    pub const ALL: [UserLevel; 3] = [
        UserLevel::BatangKuryoso,
        UserLevel::HighSchoolExplorer,
        UserLevel::CollegeInnovator,
    ];

    /// Stored and displayed label.
    pub fn label(self) -> &'static str {
        match self {
            UserLevel::BatangKuryoso => "Batang Kuryoso",
            UserLevel::HighSchoolExplorer => "High School Explorer",
            UserLevel::CollegeInnovator => "College Innovator",
        }
    }

    /// Register instruction appended to the learning-card prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            UserLevel::BatangKuryoso => {
                "Explain things in simple English terms for a curious kid, using fun analogies."
            }
            UserLevel::HighSchoolExplorer => {
                "Explain things in clear, informative English using standard high school science terms."
            }
            UserLevel::CollegeInnovator => {
                "Explain things in English using technical terms, mentioning deeper principles."
            }
        }
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string is not one of the three level labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown user level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for UserLevel {
    type Err = UnknownLevel;

    /// Accepts the exact label, or the same label ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        UserLevel::ALL
            .into_iter()
            .find(|l| l.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// Session snapshot of the learner's profile.
///
/// Fetched once from the store and handed by reference to whichever
/// component needs it; refreshed only when a screen explicitly asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileState {
    pub points: u32,
    pub level: UserLevel,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversation
// ─────────────────────────────────────────────────────────────────────────────

/// One bubble of an expanding explanation thread. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub title: Option<String>,
    pub text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Failures that leave the scan flow without a usable result.
///
/// Remote-inference failures never appear here: the gateway turns
/// them into fallback values before they reach any caller.
#[derive(Error, Debug)]
pub enum TuklasError {
    #[error("Capture failed on {device}: {details}")]
    Capture { device: String, details: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid discovery: {0}")]
    InvalidDiscovery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> LearningCard {
        LearningCard::new(
            SectionText::new("It clicks!", "A mouse has a tiny switch under each button."),
            SectionText::new("Springs", "The switch uses a metal dome that snaps back."),
            SectionText::new("Design", "Hardware engineers in Cebu design such parts."),
        )
        .unwrap()
    }

    #[test]
    fn card_sections_are_in_fixed_order() {
        let kinds: Vec<SectionKind> = card().sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());
        assert_eq!(card().section(SectionKind::Create).title, "Design");
    }

    #[test]
    fn card_with_blank_section_is_rejected() {
        let result = LearningCard::new(
            SectionText::new("t", "x"),
            SectionText::new("", "x"),
            SectionText::new("t", "x"),
        );
        assert!(result.is_none());
        let result = LearningCard::new(
            SectionText::new("t", "x"),
            SectionText::new("t", "x"),
            SectionText::new("t", "   "),
        );
        assert!(result.is_none());
    }

    #[test]
    fn card_serializes_with_journal_field_names() {
        let json = serde_json::to_value(card()).unwrap();
        assert_eq!(json["stem"]["title"], "It clicks!");
        assert_eq!(json["tech"]["title"], "Springs");
        assert_eq!(json["local"]["title"], "Design");
    }

    #[test]
    fn incomplete_stored_card_fails_to_deserialize() {
        let raw = r#"{"stem":{"title":"a","text":"b"},"tech":{"title":"","text":"c"},"local":{"title":"d","text":"e"}}"#;
        assert!(serde_json::from_str::<LearningCard>(raw).is_err());
    }

    #[test]
    fn discovery_uses_camel_case_keys() {
        let d = Discovery::with_date("Computer Mouse", card(), "2024-05-01T08:00:00.000Z").unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["objectName"], "Computer Mouse");
        assert_eq!(json["date"], "2024-05-01T08:00:00.000Z");
        assert!(json["learningData"]["stem"].is_object());
    }

    #[test]
    fn discovery_rejects_blank_name() {
        let err = Discovery::new("  ", card()).unwrap_err();
        assert!(matches!(err, TuklasError::InvalidDiscovery(_)));
    }

    #[test]
    fn discovery_name_match_ignores_case() {
        let d = Discovery::new("Computer Mouse", card()).unwrap();
        assert!(d.is_same_object("computer mouse"));
        assert!(d.is_same_object("COMPUTER MOUSE"));
        assert!(!d.is_same_object("Keyboard"));
    }

    #[test]
    fn timestamp_looks_like_js_iso_string() {
        let ts = iso_timestamp_now();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-05-01T08:00:00.000Z".len());
    }

    #[test]
    fn level_labels_parse_back() {
        for level in UserLevel::ALL {
            assert_eq!(level.label().parse::<UserLevel>().unwrap(), level);
        }
        assert_eq!(
            "college innovator".parse::<UserLevel>().unwrap(),
            UserLevel::CollegeInnovator
        );
        assert!("Grandmaster".parse::<UserLevel>().is_err());
    }

    #[test]
    fn level_serializes_as_label() {
        let json = serde_json::to_string(&UserLevel::HighSchoolExplorer).unwrap();
        assert_eq!(json, "\"High School Explorer\"");
        assert_eq!(UserLevel::default(), UserLevel::BatangKuryoso);
    }

    #[test]
    fn tuklas_error_display() {
        let err = TuklasError::Capture {
            device: "file_camera".to_string(),
            details: "no such file".to_string(),
        };
        assert!(err.to_string().contains("file_camera"));
    }
}
