//! Profile: the accumulating record of a candidate's answers for one screening session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a screening profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    #[default]
    InProgress,
    QuestionsGenerated,
    Completed,
    Abandoned,
}

impl ScreeningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningStatus::InProgress => "in_progress",
            ScreeningStatus::QuestionsGenerated => "questions_generated",
            ScreeningStatus::Completed => "completed",
            ScreeningStatus::Abandoned => "abandoned",
        }
    }

    /// Parses the stored column value. Unknown values map to `InProgress`.
    pub fn from_db(value: &str) -> Self {
        match value {
            "questions_generated" => ScreeningStatus::QuestionsGenerated,
            "completed" => ScreeningStatus::Completed,
            "abandoned" => ScreeningStatus::Abandoned,
            _ => ScreeningStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScreeningStatus::Completed | ScreeningStatus::Abandoned)
    }
}

/// Categorized technologies parsed from the candidate's free-text tech stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl TechStack {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.frameworks.is_empty()
            && self.databases.is_empty()
            && self.tools.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A generated technical screening question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalQuestion {
    pub technology: String,
    pub question: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "assistant" => Role::Assistant,
            "system" => Role::System,
            _ => Role::User,
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The collected candidate profile. Fields are filled strictly in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub desired_positions: Vec<String>,
    pub current_location: Option<String>,
    pub tech_stack_raw: Option<String>,
    pub tech_stack: Option<TechStack>,
    #[serde(default)]
    pub technical_questions: Vec<TechnicalQuestion>,
    #[serde(default)]
    pub status: ScreeningStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Marks the profile finished. Terminal states are never left once entered.
    pub fn finish(&mut self, status: ScreeningStatus) {
        if self.is_terminal() {
            return;
        }
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// First desired position, used to condition question generation.
    pub fn primary_position(&self) -> Option<&str> {
        self.desired_positions.first().map(String::as_str)
    }
}

/// Conversation state, derived from field presence except for the recorded terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Greeting,
    CollectFullName,
    CollectEmail,
    CollectPhone,
    CollectExperience,
    CollectPosition,
    CollectLocation,
    CollectTechStack,
    QuestionsGenerated,
    Completed,
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip_names() {
        for status in [
            ScreeningStatus::InProgress,
            ScreeningStatus::QuestionsGenerated,
            ScreeningStatus::Completed,
            ScreeningStatus::Abandoned,
        ] {
            assert_eq!(ScreeningStatus::from_db(status.as_str()), status);
        }
        assert_eq!(ScreeningStatus::from_db("garbage"), ScreeningStatus::InProgress);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ScreeningStatus::QuestionsGenerated).unwrap();
        assert_eq!(json, r#""questions_generated""#);
    }

    #[test]
    fn test_finish_is_sticky() {
        let mut profile = Profile::new();
        profile.finish(ScreeningStatus::Abandoned);
        let first = profile.completed_at;
        profile.finish(ScreeningStatus::Completed);
        assert_eq!(profile.status, ScreeningStatus::Abandoned);
        assert_eq!(profile.completed_at, first);
    }

    #[test]
    fn test_question_difficulty_defaults_to_medium() {
        let q: TechnicalQuestion =
            serde_json::from_str(r#"{"technology": "rust", "question": "Why borrow?"}"#).unwrap();
        assert_eq!(q.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_tech_stack_partial_json_deserializes() {
        let stack: TechStack = serde_json::from_str(r#"{"languages": ["Go"]}"#).unwrap();
        assert_eq!(stack.languages, vec!["Go"]);
        assert!(stack.tools.is_empty());
        assert!(!stack.is_empty());
    }

    #[test]
    fn test_conversation_state_serializes_screaming() {
        let json = serde_json::to_string(&ConversationState::CollectTechStack).unwrap();
        assert_eq!(json, r#""COLLECT_TECH_STACK""#);
    }
}
