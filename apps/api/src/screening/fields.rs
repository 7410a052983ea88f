//! The fixed, ordered field sequence the engine walks.
//!
//! Each record bundles the presence check, the extractor that writes into the profile,
//! the re-prompt on rejection, and the prompt for the next field. The engine loops over
//! `FIELD_SEQUENCE`; reordering or adding a field touches only this table.

use crate::screening::extract::{
    extract_email, extract_full_name, extract_phone, extract_positions, extract_text,
    extract_years,
};
use crate::screening::profile::{ConversationState, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Email,
    Phone,
    YearsExperience,
    DesiredPositions,
    CurrentLocation,
    TechStackRaw,
}

pub struct FieldSpec {
    pub field: Field,
    pub state: ConversationState,
    pub reprompt: &'static str,
    is_filled: fn(&Profile) -> bool,
    apply: fn(&mut Profile, &str) -> bool,
    next_prompt: Option<fn(&Profile) -> String>,
}

impl FieldSpec {
    pub fn is_filled(&self, profile: &Profile) -> bool {
        (self.is_filled)(profile)
    }

    /// Extracts the value from `utterance` and writes it into the profile.
    /// Returns `false` (profile untouched) when the utterance is rejected.
    pub fn apply(&self, profile: &mut Profile, utterance: &str) -> bool {
        (self.apply)(profile, utterance)
    }

    /// Prompt asking for whatever comes after this field, rendered against the updated profile.
    /// `None` for the last field, whose completion triggers question generation instead.
    pub fn next_prompt(&self, profile: &Profile) -> Option<String> {
        self.next_prompt.map(|render| render(profile))
    }
}

pub const TECH_STACK_PROMPT: &str = "Excellent! Now, please tell me about your technical skills.\n\n\
    List your tech stack including:\n\
    - Programming languages\n\
    - Frameworks\n\
    - Databases\n\
    - Tools & technologies\n\n\
    For example: \"Python, Django, PostgreSQL, Docker, AWS\"";

pub static FIELD_SEQUENCE: &[FieldSpec] = &[
    FieldSpec {
        field: Field::FullName,
        state: ConversationState::CollectFullName,
        reprompt: "I didn't catch your full name. Could you please provide your first and last name?",
        is_filled: has_full_name,
        apply: apply_full_name,
        next_prompt: Some(prompt_after_name),
    },
    FieldSpec {
        field: Field::Email,
        state: ConversationState::CollectEmail,
        reprompt: "That doesn't look like a valid email. Please provide a valid email address.",
        is_filled: has_email,
        apply: apply_email,
        next_prompt: Some(prompt_after_email),
    },
    FieldSpec {
        field: Field::Phone,
        state: ConversationState::CollectPhone,
        reprompt: "Please provide a valid phone number (e.g., +1234567890 or 1234567890).",
        is_filled: has_phone,
        apply: apply_phone,
        next_prompt: Some(prompt_after_phone),
    },
    FieldSpec {
        field: Field::YearsExperience,
        state: ConversationState::CollectExperience,
        reprompt: "Please provide your years of experience as a number (e.g., 3, 5, 10).",
        is_filled: has_years,
        apply: apply_years,
        next_prompt: Some(prompt_after_years),
    },
    FieldSpec {
        field: Field::DesiredPositions,
        state: ConversationState::CollectPosition,
        reprompt: "What position(s) are you looking for? (e.g., Full Stack Developer, Data Scientist)",
        is_filled: has_positions,
        apply: apply_positions,
        next_prompt: Some(prompt_after_positions),
    },
    FieldSpec {
        field: Field::CurrentLocation,
        state: ConversationState::CollectLocation,
        reprompt: "Where are you located? (City, Country)",
        is_filled: has_location,
        apply: apply_location,
        next_prompt: Some(prompt_after_location),
    },
    FieldSpec {
        field: Field::TechStackRaw,
        state: ConversationState::CollectTechStack,
        reprompt: "Please list your technologies separated by commas.",
        is_filled: has_tech_stack_raw,
        apply: apply_tech_stack_raw,
        next_prompt: None,
    },
];

/// First field still absent from the profile, in collection order.
pub fn first_missing(profile: &Profile) -> Option<&'static FieldSpec> {
    FIELD_SEQUENCE.iter().find(|spec| !spec.is_filled(profile))
}

fn has_full_name(p: &Profile) -> bool {
    p.full_name.is_some()
}

fn has_email(p: &Profile) -> bool {
    p.email.is_some()
}

fn has_phone(p: &Profile) -> bool {
    p.phone.is_some()
}

fn has_years(p: &Profile) -> bool {
    p.years_experience.is_some()
}

fn has_positions(p: &Profile) -> bool {
    !p.desired_positions.is_empty()
}

fn has_location(p: &Profile) -> bool {
    p.current_location.is_some()
}

fn has_tech_stack_raw(p: &Profile) -> bool {
    p.tech_stack_raw.is_some()
}

fn apply_full_name(profile: &mut Profile, utterance: &str) -> bool {
    store(&mut profile.full_name, extract_full_name(utterance))
}

fn apply_email(profile: &mut Profile, utterance: &str) -> bool {
    store(&mut profile.email, extract_email(utterance))
}

fn apply_phone(profile: &mut Profile, utterance: &str) -> bool {
    store(&mut profile.phone, extract_phone(utterance))
}

fn apply_years(profile: &mut Profile, utterance: &str) -> bool {
    store(&mut profile.years_experience, extract_years(utterance))
}

fn apply_positions(profile: &mut Profile, utterance: &str) -> bool {
    match extract_positions(utterance) {
        Some(positions) => {
            profile.desired_positions = positions;
            true
        }
        None => false,
    }
}

fn apply_location(profile: &mut Profile, utterance: &str) -> bool {
    store(&mut profile.current_location, extract_text(utterance))
}

fn apply_tech_stack_raw(profile: &mut Profile, utterance: &str) -> bool {
    store(&mut profile.tech_stack_raw, extract_text(utterance))
}

fn store<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *slot = Some(value);
            true
        }
        None => false,
    }
}

fn prompt_after_name(profile: &Profile) -> String {
    format!(
        "Nice to meet you, {}! 👋\n\nWhat's your email address?",
        profile.full_name.as_deref().unwrap_or("there")
    )
}

fn prompt_after_email(_: &Profile) -> String {
    "Great! What's your phone number?".to_string()
}

fn prompt_after_phone(_: &Profile) -> String {
    "Perfect! How many years of professional experience do you have in tech?".to_string()
}

fn prompt_after_positions(_: &Profile) -> String {
    "Great choice! Where are you currently located?".to_string()
}

fn prompt_after_location(_: &Profile) -> String {
    TECH_STACK_PROMPT.to_string()
}

fn prompt_after_years(profile: &Profile) -> String {
    format!(
        "{} years - excellent! What position(s) are you interested in? \
         You can list several, separated by commas.",
        profile.years_experience.unwrap_or_default()
    )
}
