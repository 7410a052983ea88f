//! Screening engine: advances a profile one utterance at a time through the field sequence.
//!
//! `advance` is the pure conversation step: it mutates the profile and returns the reply.
//! `respond` appends the turn to the session transcript; `take_turn` also archives a snapshot.
//! Neither ever fails: capability errors are absorbed by `FallbackAssistant` and the archive
//! error is logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::screening::archive::TranscriptArchive;
use crate::screening::assistant::{FallbackAssistant, QuestionRequest};
use crate::screening::fields::{first_missing, Field};
use crate::screening::profile::{
    ChatMessage, ConversationState, Profile, ScreeningStatus, TechnicalQuestion,
};

pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POSITION: &str = "Developer";

/// Phrases that end the conversation wherever they appear in an utterance, as whole words.
const END_KEYWORDS: &[&str] = &[
    "bye",
    "goodbye",
    "exit",
    "quit",
    "stop",
    "end",
    "thanks bye",
    "thank you bye",
    "that's all",
    "thats all",
    "no thanks",
    "done",
];

pub const SESSION_ENDED_MESSAGE: &str = "This screening session has already ended. \
    Please start a new conversation if you'd like to continue.";

/// One screening session: its id, the profile being collected, and the transcript so far.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub profile: Profile,
    pub transcript: Vec<ChatMessage>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            profile: Profile::new(),
            transcript: Vec::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        conversation_state(&self.profile, self.transcript.len())
    }
}

pub struct ScreeningEngine {
    assistant: FallbackAssistant,
    archive: Arc<dyn TranscriptArchive>,
    question_count: usize,
    history_limit: usize,
}

impl ScreeningEngine {
    pub fn new(assistant: FallbackAssistant, archive: Arc<dyn TranscriptArchive>) -> Self {
        Self {
            assistant,
            archive,
            question_count: DEFAULT_QUESTION_COUNT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count.max(1);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn archive(&self) -> &Arc<dyn TranscriptArchive> {
        &self.archive
    }

    pub fn backend_name(&self) -> &str {
        self.assistant.backend_name()
    }

    pub async fn greeting(&self) -> String {
        self.assistant.greeting().await
    }

    /// One conversation step. Mutates `profile` in place and returns the assistant reply.
    pub async fn advance(
        &self,
        profile: &mut Profile,
        utterance: &str,
        history: &[ChatMessage],
    ) -> String {
        if profile.is_terminal() {
            return SESSION_ENDED_MESSAGE.to_string();
        }

        let pending = first_missing(profile);
        // A tech stack answer is a list of technologies ("end-to-end testing", "Stop&Shop
        // internal tools"), so only a bare keyword ends the session there.
        let ends = match pending {
            Some(spec) if spec.field == Field::TechStackRaw => is_bare_end_keyword(utterance),
            _ => is_conversation_end(utterance),
        };
        if ends {
            info!("End of conversation requested");
            profile.finish(ScreeningStatus::Completed);
            return self.assistant.closing_message().await;
        }

        let Some(spec) = pending else {
            return self.assistant.reply(utterance, history, profile).await;
        };

        if !spec.apply(profile, utterance) {
            debug!("Rejected utterance for {:?}", spec.field);
            return spec.reprompt.to_string();
        }
        debug!("Collected {:?}", spec.field);

        if spec.field == Field::TechStackRaw {
            return self.derive_questions(profile).await;
        }

        spec.next_prompt(profile)
            .unwrap_or_else(|| spec.reprompt.to_string())
    }

    /// Runs `advance` for a session, appends the user/assistant pair to its transcript and
    /// archives a snapshot. Archive failures never affect the reply.
    pub async fn take_turn(&self, session: &mut Session, utterance: &str) -> String {
        let reply = self.respond(session, utterance).await;
        self.archive_snapshot(session).await;
        reply
    }

    /// `advance` plus the transcript append, without archiving. Callers that persist the turn
    /// elsewhere archive with `archive_snapshot` once the turn is durable.
    pub async fn respond(&self, session: &mut Session, utterance: &str) -> String {
        let start = session.transcript.len().saturating_sub(self.history_limit);
        let reply = self
            .advance(&mut session.profile, utterance, &session.transcript[start..])
            .await;

        session.transcript.push(ChatMessage::user(utterance));
        session.transcript.push(ChatMessage::assistant(reply.clone()));
        reply
    }

    /// Archives the session's current snapshot. Errors and timeouts are logged and dropped.
    pub async fn archive_snapshot(&self, session: &Session) {
        let archived = tokio::time::timeout(
            ARCHIVE_TIMEOUT,
            self.archive
                .archive(session.id, &session.transcript, &session.profile),
        )
        .await;
        match archived {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                "Failed to archive transcript for {} ({}): {e}",
                session.id,
                self.archive.name()
            ),
            Err(_) => warn!(
                "Archiving transcript for {} timed out after {:?}",
                session.id, ARCHIVE_TIMEOUT
            ),
        }
    }

    /// Marks an unfinished profile abandoned. Returns `false` if it had already ended.
    pub fn abandon(&self, profile: &mut Profile) -> bool {
        if profile.is_terminal() {
            return false;
        }
        profile.finish(ScreeningStatus::Abandoned);
        true
    }

    /// Classifies the raw stack and generates the question list. Runs once, right after
    /// `tech_stack_raw` is filled.
    async fn derive_questions(&self, profile: &mut Profile) -> String {
        if profile.tech_stack.is_none() {
            let raw = profile.tech_stack_raw.clone().unwrap_or_default();
            profile.tech_stack = Some(self.assistant.classify_tech_stack(&raw).await);
        }

        if profile.technical_questions.is_empty() {
            let tech_stack = profile.tech_stack.clone().unwrap_or_default();
            let request = QuestionRequest {
                tech_stack: &tech_stack,
                years_experience: profile.years_experience.unwrap_or(1),
                position: profile.primary_position().unwrap_or(DEFAULT_POSITION),
                count: self.question_count,
            };
            profile.technical_questions = self.assistant.generate_questions(&request).await;
        }

        profile.status = ScreeningStatus::QuestionsGenerated;
        info!(
            "Generated {} technical questions via {}",
            profile.technical_questions.len(),
            self.assistant.backend_name()
        );
        format_questions_reply(&profile.technical_questions)
    }
}

fn normalized_words(utterance: &str) -> Vec<String> {
    utterance
        .trim()
        .to_lowercase()
        .replace('’', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the utterance contains an end keyword as whole words anywhere.
pub fn is_conversation_end(utterance: &str) -> bool {
    let words = normalized_words(utterance);
    END_KEYWORDS.iter().any(|keyword| {
        let phrase: Vec<&str> = keyword.split(' ').collect();
        words
            .windows(phrase.len())
            .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
    })
}

/// True when the whole utterance, punctuation aside, is one end keyword.
pub fn is_bare_end_keyword(utterance: &str) -> bool {
    let words = normalized_words(utterance).join(" ");
    END_KEYWORDS.contains(&words.as_str())
}

/// Derives the conversation state. Only the terminal states and `QUESTIONS_GENERATED` are
/// recorded; everything else follows from which field is missing.
pub fn conversation_state(profile: &Profile, messages_exchanged: usize) -> ConversationState {
    match profile.status {
        ScreeningStatus::Completed => return ConversationState::Completed,
        ScreeningStatus::Abandoned => return ConversationState::Abandoned,
        ScreeningStatus::QuestionsGenerated => return ConversationState::QuestionsGenerated,
        ScreeningStatus::InProgress => {}
    }
    match first_missing(profile) {
        Some(spec) if spec.field == Field::FullName && messages_exchanged == 0 => {
            ConversationState::Greeting
        }
        Some(spec) => spec.state,
        None => ConversationState::QuestionsGenerated,
    }
}

/// Intro, one numbered line per question, then an invitation to answer.
pub fn format_questions_reply(questions: &[TechnicalQuestion]) -> String {
    let mut reply = String::from(
        "Perfect! I've analyzed your tech stack. ✅\n\n\
         Based on your skills, here are some technical questions:\n\n",
    );
    for (i, q) in questions.iter().enumerate() {
        reply.push_str(&format!("{}. **{}**: {}\n\n", i + 1, q.technology, q.question));
    }
    reply.push_str(
        "Feel free to answer these questions, or let me know if you have any concerns! \
         Type 'goodbye' when you're ready to finish.",
    );
    reply
}
