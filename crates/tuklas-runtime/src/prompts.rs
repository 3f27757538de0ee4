//! Prompt builders for every request the gateway sends.
//!
//! Each builder returns the complete text part of a `generateContent`
//! request. The card prompt embeds the JSON Schema of [`CardReply`] so the
//! model sees the exact shape it must return.

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use tuklas_types::{LearningCard, SectionText, UserLevel};

/// Number of discovery names fed into the career-insight prompt.
pub const CAREER_INSIGHT_SAMPLE: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Reply shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Reply expected for the identify prompt.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyReply {
    #[serde(default)]
    pub object_name: String,
    #[serde(default)]
    pub context: String,
}

/// Reply expected for the learning-card prompt.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CardReply {
    /// A fun, observable fact about the object.
    pub observe: SectionText,
    /// The core STEM principle behind it.
    pub understand: SectionText,
    /// A real-world application and a related career in the Philippines.
    pub create: SectionText,
}

impl CardReply {
    /// `None` when any section came back with a blank title or text.
    pub fn into_card(self) -> Option<LearningCard> {
        LearningCard::new(self.observe, self.understand, self.create)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────────────────────────

pub fn identify() -> &'static str {
    "Analyze the object in this image. Respond with a valid JSON object containing \
     two keys: 'objectName' (the most specific name, e.g., 'Computer Mouse') and \
     'context' (a single-word category like 'Technology', 'Animal', 'Food', 'Tool')."
}

pub fn learning_card(object_name: &str, context: &str, level: UserLevel) -> String {
    let schema = serde_json::to_string_pretty(&schema_for!(CardReply)).unwrap_or_default();
    let article = if starts_with_vowel(object_name) { "an" } else { "a" };
    format!(
        "You are 'Tuklascope,' an AI science guide. A user has scanned {article} \
         '{object_name}', which you know is in the context of '{context}'.\n\
         \n\
         Generate a short learning card following the \"Observe, Understand, Create\" \
         framework:\n\
         1. Observe: an attention-grabbing, observable fact about the object.\n\
         2. Understand: the core STEM principle that explains that fact.\n\
         3. Create: how the principle is applied in the real world, connected to a \
         career path in the Philippines.\n\
         \n\
         {instruction}\n\
         \n\
         You MUST format the output as a single, valid JSON object only, with no text \
         before or after it. The keys must be \"observe\", \"understand\", and \"create\", \
         and each value must be an object with a \"title\" and a \"text\". The reply must \
         match this JSON Schema:\n{schema}",
        instruction = level.instruction(),
    )
}

pub fn deepen(history: &str) -> String {
    format!(
        "You are 'Tuklascope,' an expert science educator who excels at making complex \
         topics simple. The user is asking \"Why?\" about the last statement in the \
         following conversation.\n\
         \n\
         CONVERSATION HISTORY:\n\
         ---\n\
         {history}\n\
         ---\n\
         \n\
         Rules for your answer:\n\
         1. DO NOT repeat information that is already in the conversation.\n\
         2. Explain the more FUNDAMENTAL principle behind the last statement, going \
         exactly one level deeper.\n\
         3. Use a simple analogy to make the idea easy to picture.\n\
         \n\
         Respond with plain text only."
    )
}

pub fn daily_quest() -> &'static str {
    "You are 'Tuklascope,' a playful science guide. Write a single-sentence, fun \
     discovery quest for a student in Cebu, Philippines, that encourages them to find \
     and scan an everyday object around them. The sentence must start with \
     \"Today's Quest:\". Respond with that sentence only."
}

pub fn career_insight(object_names: &[String]) -> String {
    let items = object_names
        .iter()
        .take(CAREER_INSIGHT_SAMPLE)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a wise and encouraging career guide for a Filipino student. The student \
         has recently discovered these items: {items}.\n\
         \n\
         Find a common theme or \"meta-skill\" that connects at least two of the items, \
         and explain in two or three sentences how that skill leads to careers in the \
         Philippine IT-BPM and technology industries. End with one uplifting sentence. \
         Respond with plain text only."
    )
}

fn starts_with_vowel(word: &str) -> bool {
    word.trim_start()
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_prompt_names_object_context_and_level() {
        let prompt = learning_card("Electric Fan", "Technology", UserLevel::CollegeInnovator);
        assert!(prompt.contains("scanned an 'Electric Fan'"));
        assert!(prompt.contains("context of 'Technology'"));
        assert!(prompt.contains(UserLevel::CollegeInnovator.instruction()));
        assert!(prompt.contains("\"observe\", \"understand\", and \"create\""));
    }

    #[test]
    fn card_prompt_embeds_reply_schema() {
        let prompt = learning_card("Kettle", "Tool", UserLevel::BatangKuryoso);
        assert!(prompt.contains("scanned a 'Kettle'"));
        // The schema lists the three section properties.
        let schema_start = prompt.find("JSON Schema:").expect("schema header");
        let schema = &prompt[schema_start..];
        for key in ["observe", "understand", "create", "title", "text"] {
            assert!(schema.contains(key), "schema is missing {key}");
        }
    }

    #[test]
    fn deepen_prompt_fences_history() {
        let prompt = deepen("Fans spin.\nMotors use magnets.");
        assert!(prompt.contains("---\nFans spin.\nMotors use magnets.\n---"));
    }

    #[test]
    fn career_prompt_uses_first_five_names() {
        let names: Vec<String> = ["Mouse", "Fan", "Kettle", "Guitar", "Cactus", "Jeepney"]
            .into_iter()
            .map(String::from)
            .collect();
        let prompt = career_insight(&names);
        assert!(prompt.contains("Mouse, Fan, Kettle, Guitar, Cactus."));
        assert!(!prompt.contains("Jeepney"));
    }

    #[test]
    fn card_reply_with_blank_section_is_rejected() {
        let reply: CardReply = serde_json::from_str(
            r#"{
                "observe": {"title": "Spin", "text": "Blades push air."},
                "understand": {"title": "", "text": "Torque."},
                "create": {"title": "Build", "text": "Engineers in Laguna."}
            }"#,
        )
        .unwrap();
        assert!(reply.into_card().is_none());
    }
}
