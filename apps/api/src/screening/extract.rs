//! Field extractors: pull a candidate value out of a free-text utterance and validate its shape.
//!
//! Every extractor is pure: `None` means the utterance was rejected for that field.

use std::sync::OnceLock;

use regex::Regex;

/// Phrases people put in front of their name.
const NAME_LEAD_INS: &[&str] = &["my name is ", "my name's ", "this is ", "i am ", "i'm "];

fn email_search_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
    })
}

fn email_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
    })
}

fn phone_search_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[+\d][\d\s\-().]{9,}").expect("valid regex"))
}

fn phone_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?\d{10,15}$").expect("valid regex"))
}

fn years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*(?:years?|yrs?)\b").expect("valid regex"))
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d+)\b").expect("valid regex"))
}

/// Accepts a full name: at least two tokens and no digits, after dropping a lead-in
/// like "my name is".
pub fn extract_full_name(utterance: &str) -> Option<String> {
    let trimmed = utterance.trim();

    let mut name = trimmed;
    for lead_in in NAME_LEAD_INS {
        let matches = trimmed
            .get(..lead_in.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(lead_in));
        if matches {
            name = trimmed[lead_in.len()..].trim();
            break;
        }
    }
    let name = name.trim_end_matches(['.', '!', ',']).trim();

    if name.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    Some(tokens.join(" "))
}

/// Finds the first email-looking token and checks it has a `local@domain.tld` shape.
pub fn extract_email(utterance: &str) -> Option<String> {
    let candidate = email_search_re().find(utterance)?.as_str();
    if is_valid_email(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email_shape_re().is_match(email)
}

/// Finds a phone-looking run, strips separators and requires 10–15 digits with an optional `+`.
/// The stored value is the stripped form, e.g. `+15551234567`.
pub fn extract_phone(utterance: &str) -> Option<String> {
    let run = phone_search_re()
        .find(utterance)
        .map(|m| m.as_str())
        .unwrap_or(utterance);
    let stripped = strip_phone_separators(run);
    if phone_shape_re().is_match(&stripped) {
        Some(stripped)
    } else {
        None
    }
}

fn strip_phone_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect()
}

/// Upper bound on a believable career length; anything above is a typo or a joke.
pub const MAX_YEARS_EXPERIENCE: u32 = 70;

/// Years of experience: "<N> years|yrs" first, then a bare integer, then the first integer
/// anywhere in the utterance. Values above `MAX_YEARS_EXPERIENCE` are rejected.
pub fn extract_years(utterance: &str) -> Option<u32> {
    let lower = utterance.trim().to_lowercase();

    let years = if let Some(caps) = years_re().captures(&lower) {
        caps[1].parse().ok()
    } else if let Ok(years) = lower.parse::<u32>() {
        Some(years)
    } else {
        integer_re()
            .captures(&lower)
            .and_then(|caps| caps[1].parse().ok())
    };
    years.filter(|y| *y <= MAX_YEARS_EXPERIENCE)
}

/// Comma-separated positions, trimmed, empties dropped. `None` when nothing is left.
pub fn extract_positions(utterance: &str) -> Option<Vec<String>> {
    let positions: Vec<String> = utterance
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();
    if positions.is_empty() {
        None
    } else {
        Some(positions)
    }
}

/// Free text accepted verbatim once trimmed; only blank input is rejected.
pub fn extract_text(utterance: &str) -> Option<String> {
    let trimmed = utterance.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
