//! Screening assistant: pluggable, trait-based capability the engine calls for anything
//! that needs language generation.
//!
//! Backends:
//! - `LlmAssistant`: remote, via `LlmClient` (Claude).
//! - `RuleBasedAssistant`: deterministic keyword/template rules, no network.
//!
//! The engine never talks to a backend directly. It holds a `FallbackAssistant`, which
//! tries the optional remote backend first and falls back to the rules on any error or
//! malformed output. Callers of `FallbackAssistant` never observe a failure.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, SCREENER_PERSONA};
use crate::llm_client::{LlmClient, LlmError};
use crate::screening::profile::{ChatMessage, Profile, Role, TechStack, TechnicalQuestion};
use crate::screening::prompts::{
    CLOSING_PROMPT, GREETING_PROMPT, QUESTION_PROMPT_TEMPLATE, REPLY_PROMPT_TEMPLATE,
    TECH_STACK_PROMPT_TEMPLATE,
};
use crate::screening::rules;

/// Messages of trailing history included in a free-form reply prompt.
const REPLY_HISTORY_WINDOW: usize = 10;

const CLASSIFY_TEMPERATURE: f32 = 0.3;
const QUESTION_TEMPERATURE: f32 = 0.7;
const CHAT_TEMPERATURE: f32 = 0.8;

pub const WELCOME_MESSAGE: &str = "Hello! 👋 Welcome to TalentScout. I'm your AI hiring assistant.\n\n\
    I'll ask you a few questions to understand your background and technical skills. \
    Then I'll generate some relevant technical questions for you.\n\n\
    Let's get started! What's your full name?";

pub const FAREWELL_MESSAGE: &str = "Thank you for your time! 🎉\n\n\
    Our team will review your profile and responses. You'll hear from us within 2-3 business days.\n\n\
    Good luck! 🚀";

pub const ACKNOWLEDGEMENT_MESSAGE: &str = "Thanks, I've noted your answer. ✅ \
    Feel free to continue with the next question, or type 'goodbye' when you're ready to finish.";

pub const APOLOGY_MESSAGE: &str = "I apologize, I'm having trouble processing that right now. \
    Could you please rephrase? You can also type 'goodbye' to finish the screening.";

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("LLM output unusable: {0}")]
    Malformed(String),
}

/// Inputs for question generation.
#[derive(Debug, Clone, Copy)]
pub struct QuestionRequest<'a> {
    pub tech_stack: &'a TechStack,
    pub years_experience: u32,
    pub position: &'a str,
    pub count: usize,
}

/// A language-generation backend. Implement this to swap backends without touching the engine.
#[async_trait]
pub trait ScreeningAssistant: Send + Sync {
    /// Opening message; must end by asking for the candidate's full name.
    async fn greeting(&self) -> Result<String, CapabilityError>;

    async fn classify_tech_stack(&self, raw: &str) -> Result<TechStack, CapabilityError>;

    async fn generate_questions(
        &self,
        request: &QuestionRequest<'_>,
    ) -> Result<Vec<TechnicalQuestion>, CapabilityError>;

    /// Free-form contextual reply once every field is collected.
    async fn reply(
        &self,
        utterance: &str,
        history: &[ChatMessage],
        profile: &Profile,
    ) -> Result<String, CapabilityError>;

    async fn closing_message(&self) -> Result<String, CapabilityError>;

    fn name(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmAssistant: remote backend
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmAssistant(pub LlmClient);

#[async_trait]
impl ScreeningAssistant for LlmAssistant {
    async fn greeting(&self) -> Result<String, CapabilityError> {
        Ok(self
            .0
            .call_text(GREETING_PROMPT, SCREENER_PERSONA, CHAT_TEMPERATURE)
            .await?)
    }

    async fn classify_tech_stack(&self, raw: &str) -> Result<TechStack, CapabilityError> {
        let prompt = TECH_STACK_PROMPT_TEMPLATE.replace("{tech_stack_raw}", raw);
        Ok(self
            .0
            .call_json::<TechStack>(&prompt, JSON_ONLY_SYSTEM, CLASSIFY_TEMPERATURE)
            .await?)
    }

    async fn generate_questions(
        &self,
        request: &QuestionRequest<'_>,
    ) -> Result<Vec<TechnicalQuestion>, CapabilityError> {
        let prompt = build_question_prompt(request)?;
        let questions: Vec<TechnicalQuestion> = self
            .0
            .call_json(&prompt, JSON_ONLY_SYSTEM, QUESTION_TEMPERATURE)
            .await?;
        usable_questions(questions)
    }

    async fn reply(
        &self,
        utterance: &str,
        history: &[ChatMessage],
        profile: &Profile,
    ) -> Result<String, CapabilityError> {
        let prompt = build_reply_prompt(utterance, history, profile)?;
        Ok(self
            .0
            .call_text(&prompt, SCREENER_PERSONA, CHAT_TEMPERATURE)
            .await?)
    }

    async fn closing_message(&self) -> Result<String, CapabilityError> {
        Ok(self
            .0
            .call_text(CLOSING_PROMPT, SCREENER_PERSONA, CHAT_TEMPERATURE)
            .await?)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

fn build_question_prompt(request: &QuestionRequest<'_>) -> Result<String, CapabilityError> {
    let stack_json = serde_json::to_string_pretty(request.tech_stack)
        .map_err(|e| CapabilityError::Malformed(e.to_string()))?;
    Ok(QUESTION_PROMPT_TEMPLATE
        .replace("{num_questions}", &request.count.to_string())
        .replace("{tech_stack}", &stack_json)
        .replace("{years_exp}", &request.years_experience.to_string())
        .replace("{position}", request.position))
}

fn build_reply_prompt(
    utterance: &str,
    history: &[ChatMessage],
    profile: &Profile,
) -> Result<String, CapabilityError> {
    let start = history.len().saturating_sub(REPLY_HISTORY_WINDOW);
    let history_text = history[start..]
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::User => "User",
                _ => "Assistant",
            };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let profile_json = serde_json::to_string_pretty(profile)
        .map_err(|e| CapabilityError::Malformed(e.to_string()))?;

    Ok(REPLY_PROMPT_TEMPLATE
        .replace("{history}", &history_text)
        .replace("{profile_json}", &profile_json)
        .replace("{user_message}", utterance))
}

/// Drops blank questions; an empty result counts as malformed output.
fn usable_questions(
    questions: Vec<TechnicalQuestion>,
) -> Result<Vec<TechnicalQuestion>, CapabilityError> {
    let questions: Vec<_> = questions
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .collect();
    if questions.is_empty() {
        return Err(CapabilityError::Malformed(
            "no usable questions in LLM output".to_string(),
        ));
    }
    Ok(questions)
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedAssistant: deterministic backend
// ────────────────────────────────────────────────────────────────────────────

/// Keyword classifier and template questions. Never fails.
pub struct RuleBasedAssistant;

#[async_trait]
impl ScreeningAssistant for RuleBasedAssistant {
    async fn greeting(&self) -> Result<String, CapabilityError> {
        Ok(WELCOME_MESSAGE.to_string())
    }

    async fn classify_tech_stack(&self, raw: &str) -> Result<TechStack, CapabilityError> {
        Ok(rules::classify_tech_stack(raw))
    }

    async fn generate_questions(
        &self,
        request: &QuestionRequest<'_>,
    ) -> Result<Vec<TechnicalQuestion>, CapabilityError> {
        Ok(rules::generate_questions(
            request.tech_stack,
            request.position,
            request.count,
        ))
    }

    async fn reply(
        &self,
        _utterance: &str,
        _history: &[ChatMessage],
        _profile: &Profile,
    ) -> Result<String, CapabilityError> {
        Ok(ACKNOWLEDGEMENT_MESSAGE.to_string())
    }

    async fn closing_message(&self) -> Result<String, CapabilityError> {
        Ok(FAREWELL_MESSAGE.to_string())
    }

    fn name(&self) -> &str {
        "rules"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FallbackAssistant: remote first, rules on failure
// ────────────────────────────────────────────────────────────────────────────

/// Chain of responsibility over an optional primary backend and the deterministic rules.
#[derive(Clone)]
pub struct FallbackAssistant {
    primary: Option<Arc<dyn ScreeningAssistant>>,
}

impl FallbackAssistant {
    pub fn new(primary: Option<Arc<dyn ScreeningAssistant>>) -> Self {
        Self { primary }
    }

    /// Rules only; no network calls are ever made.
    pub fn rules_only() -> Self {
        Self { primary: None }
    }

    pub fn backend_name(&self) -> &str {
        self.primary.as_ref().map_or("rules", |p| p.name())
    }

    pub async fn greeting(&self) -> String {
        if let Some(primary) = &self.primary {
            match primary.greeting().await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!("{} returned an empty greeting, using default", primary.name()),
                Err(e) => warn!("{} greeting failed, using default: {e}", primary.name()),
            }
        }
        WELCOME_MESSAGE.to_string()
    }

    pub async fn classify_tech_stack(&self, raw: &str) -> TechStack {
        if let Some(primary) = &self.primary {
            match primary.classify_tech_stack(raw).await {
                Ok(stack) => return stack,
                Err(e) => warn!(
                    "{} tech stack classification failed, using keyword matcher: {e}",
                    primary.name()
                ),
            }
        }
        rules::classify_tech_stack(raw)
    }

    /// Always returns `request.count` questions when the templates allow it.
    pub async fn generate_questions(&self, request: &QuestionRequest<'_>) -> Vec<TechnicalQuestion> {
        if let Some(primary) = &self.primary {
            match primary.generate_questions(request).await {
                Ok(questions) => {
                    debug!("{} generated {} questions", primary.name(), questions.len());
                    return rules::fit_to_count(
                        questions,
                        request.tech_stack,
                        request.position,
                        request.count,
                    );
                }
                Err(e) => warn!(
                    "{} question generation failed, using templates: {e}",
                    primary.name()
                ),
            }
        }
        rules::generate_questions(request.tech_stack, request.position, request.count)
    }

    pub async fn reply(&self, utterance: &str, history: &[ChatMessage], profile: &Profile) -> String {
        match &self.primary {
            Some(primary) => match primary.reply(utterance, history, profile).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => APOLOGY_MESSAGE.to_string(),
                Err(e) => {
                    warn!("{} reply failed: {e}", primary.name());
                    APOLOGY_MESSAGE.to_string()
                }
            },
            None => ACKNOWLEDGEMENT_MESSAGE.to_string(),
        }
    }

    pub async fn closing_message(&self) -> String {
        if let Some(primary) = &self.primary {
            match primary.closing_message().await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!("{} returned an empty closing message", primary.name()),
                Err(e) => warn!("{} closing message failed, using default: {e}", primary.name()),
            }
        }
        FAREWELL_MESSAGE.to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Backend whose every call fails, counting how often it was asked.
    #[derive(Default)]
    pub struct FailingAssistant {
        pub calls: AtomicUsize,
    }

    impl FailingAssistant {
        fn fail<T>(&self) -> Result<T, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CapabilityError::Llm(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }))
        }
    }

    #[async_trait]
    impl ScreeningAssistant for FailingAssistant {
        async fn greeting(&self) -> Result<String, CapabilityError> {
            self.fail()
        }

        async fn classify_tech_stack(&self, _raw: &str) -> Result<TechStack, CapabilityError> {
            self.fail()
        }

        async fn generate_questions(
            &self,
            _request: &QuestionRequest<'_>,
        ) -> Result<Vec<TechnicalQuestion>, CapabilityError> {
            self.fail()
        }

        async fn reply(
            &self,
            _utterance: &str,
            _history: &[ChatMessage],
            _profile: &Profile,
        ) -> Result<String, CapabilityError> {
            self.fail()
        }

        async fn closing_message(&self) -> Result<String, CapabilityError> {
            self.fail()
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Backend with canned answers, as a well-behaved remote model would give.
    pub struct ScriptedAssistant {
        pub stack: TechStack,
        pub questions: Vec<TechnicalQuestion>,
        pub reply: String,
    }

    #[async_trait]
    impl ScreeningAssistant for ScriptedAssistant {
        async fn greeting(&self) -> Result<String, CapabilityError> {
            Ok("Hi from the model! What's your full name?".to_string())
        }

        async fn classify_tech_stack(&self, _raw: &str) -> Result<TechStack, CapabilityError> {
            Ok(self.stack.clone())
        }

        async fn generate_questions(
            &self,
            _request: &QuestionRequest<'_>,
        ) -> Result<Vec<TechnicalQuestion>, CapabilityError> {
            Ok(self.questions.clone())
        }

        async fn reply(
            &self,
            _utterance: &str,
            _history: &[ChatMessage],
            _profile: &Profile,
        ) -> Result<String, CapabilityError> {
            Ok(self.reply.clone())
        }

        async fn closing_message(&self) -> Result<String, CapabilityError> {
            Ok("Goodbye from the model!".to_string())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}
