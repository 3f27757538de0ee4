//! "Bakit?" threads: ask why, one level deeper at a time.
//!
//! A [`CardConversation`] lives only while a card section is open. Entries
//! are appended oldest first and are never stored.

use thiserror::Error;
use tracing::debug;
use tuklas_types::{CardSection, ConversationEntry};

use crate::gateway::InferenceGateway;

/// Title given to every generated follow-up.
pub const FOLLOW_UP_TITLE: &str = "Dahil (Because)...";

/// Why an expansion did not produce a real explanation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandError {
    #[error("no deeper explanation was available; a placeholder was added")]
    Fallback,
}

#[derive(Debug, Clone)]
pub struct CardConversation {
    entries: Vec<ConversationEntry>,
}

impl CardConversation {
    /// Start a thread seeded with `section`.
    pub fn open(section: &CardSection) -> Self {
        Self {
            entries: vec![ConversationEntry {
                title: Some(section.title.clone()),
                text: section.text.clone(),
            }],
        }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// All entry texts, oldest first, one per line.
    pub fn history(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Ask the gateway to explain the latest entry and append its answer.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::Fallback`] when the gateway could only offer
    /// its canned reply. That reply is still appended, so the thread stays
    /// usable.
    pub async fn expand(
        &mut self,
        gateway: &dyn InferenceGateway,
    ) -> Result<&ConversationEntry, ExpandError> {
        let reply = gateway.deepen(&self.history()).await;
        let fell_back = reply.is_fallback();
        self.entries.push(ConversationEntry {
            title: Some(FOLLOW_UP_TITLE.to_string()),
            text: reply.into_text(),
        });
        debug!(entries = self.entries.len(), fell_back, "conversation expanded");

        if fell_back {
            return Err(ExpandError::Fallback);
        }
        self.entries.last().ok_or(ExpandError::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{DEEPEN_FALLBACK, Identification, Reply};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tuklas_hal::CapturedImage;
    use tuklas_types::{LearningCard, SectionKind, UserLevel};

    /// Answers with numbered replies and records every history it was given.
    #[derive(Default)]
    struct EchoGateway {
        inputs: Mutex<Vec<String>>,
        offline: bool,
    }

    #[async_trait]
    impl InferenceGateway for EchoGateway {
        async fn identify(&self, _image: &CapturedImage) -> Identification {
            Identification::unidentified()
        }

        async fn generate_card(&self, _: &str, _: &str, _: UserLevel) -> Option<LearningCard> {
            None
        }

        async fn deepen(&self, conversation: &str) -> Reply {
            if self.offline {
                return Reply::Fallback(DEEPEN_FALLBACK);
            }
            let mut inputs = self.inputs.lock().unwrap();
            inputs.push(conversation.to_string());
            Reply::Generated(format!("answer {}", inputs.len()))
        }

        async fn daily_quest(&self) -> Reply {
            Reply::Fallback("")
        }

        async fn career_insight(&self, _: &[String]) -> Reply {
            Reply::Fallback("")
        }
    }

    fn section() -> CardSection {
        CardSection {
            kind: SectionKind::Understand,
            title: "Electromagnets".into(),
            text: "Current makes the coil magnetic.".into(),
        }
    }

    #[test]
    fn opening_seeds_one_entry() {
        let convo = CardConversation::open(&section());
        assert_eq!(
            convo.entries(),
            [ConversationEntry {
                title: Some("Electromagnets".into()),
                text: "Current makes the coil magnetic.".into(),
            }]
        );
    }

    #[tokio::test]
    async fn expansions_append_in_order_and_feed_history() {
        let gateway = EchoGateway::default();
        let mut convo = CardConversation::open(&section());

        let first = convo.expand(&gateway).await.unwrap();
        assert_eq!(first.title.as_deref(), Some(FOLLOW_UP_TITLE));
        assert_eq!(first.text, "answer 1");
        convo.expand(&gateway).await.unwrap();

        assert_eq!(convo.entries().len(), 3);
        assert_eq!(convo.entries()[2].text, "answer 2");

        let inputs = gateway.inputs.lock().unwrap();
        assert_eq!(inputs[0], "Current makes the coil magnetic.");
        assert_eq!(inputs[1], "Current makes the coil magnetic.\nanswer 1");
    }

    #[tokio::test]
    async fn fallback_is_appended_and_reported() {
        let gateway = EchoGateway {
            offline: true,
            ..EchoGateway::default()
        };
        let mut convo = CardConversation::open(&section());

        let err = convo.expand(&gateway).await.unwrap_err();
        assert_eq!(err, ExpandError::Fallback);
        assert_eq!(convo.entries().len(), 2);
        assert_eq!(convo.entries()[1].text, DEEPEN_FALLBACK);
        assert_eq!(convo.entries()[1].title.as_deref(), Some(FOLLOW_UP_TITLE));
    }
}
