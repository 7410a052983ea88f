//! Rule-based classification and question generation. Pure, deterministic, no LLM call.
//!
//! Used directly when the LLM path is disabled and as the fallback whenever the remote
//! adapter errors or returns output that does not parse.

use crate::screening::profile::{Difficulty, TechStack, TechnicalQuestion};

const LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "java",
    "c++",
    "c#",
    "go",
    "rust",
    "typescript",
    "php",
    "ruby",
    "swift",
    "kotlin",
];

const FRAMEWORKS: &[&str] = &[
    "django", "flask", "fastapi", "react", "vue", "angular", "next.js", "express", "spring",
    "laravel", ".net",
];

const DATABASES: &[&str] = &[
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "elasticsearch",
    "sqlite",
    "cassandra",
    "dynamodb",
];

const TOOLS: &[&str] = &[
    "docker",
    "kubernetes",
    "git",
    "aws",
    "gcp",
    "azure",
    "jenkins",
    "terraform",
    "ansible",
];

const MAX_LANGUAGE_QUESTIONS: usize = 2;
const MAX_FRAMEWORK_QUESTIONS: usize = 2;
const MAX_DATABASE_QUESTIONS: usize = 1;

/// Technology label used for padding questions that are not tied to the stack.
pub const GENERAL_TECHNOLOGY: &str = "General";

/// Classifies free text against the fixed vocabularies. Case-insensitive, matched on
/// word boundaries so that "django" does not also yield "go".
pub fn classify_tech_stack(raw: &str) -> TechStack {
    let text = raw.to_lowercase();
    TechStack {
        languages: matching_terms(&text, LANGUAGES),
        frameworks: matching_terms(&text, FRAMEWORKS),
        databases: matching_terms(&text, DATABASES),
        tools: matching_terms(&text, TOOLS),
    }
}

fn matching_terms(text: &str, vocabulary: &[&str]) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|term| contains_term(text, term))
        .map(|term| term.to_string())
        .collect()
}

fn contains_term(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(is_term_continuation)
    })
}

// "c" followed by "++" or "#" is part of the term itself; anything alphanumeric or
// another symbol glued on means a different word.
fn is_term_continuation(c: char) -> bool {
    c.is_alphanumeric() || c == '+' || c == '#'
}

/// Template questions: at most two per language, two per framework, one per database,
/// in that order, truncated to `count`.
pub fn template_questions(stack: &TechStack, count: usize) -> Vec<TechnicalQuestion> {
    let mut questions = Vec::new();

    for lang in stack.languages.iter().take(MAX_LANGUAGE_QUESTIONS) {
        questions.push(question(
            lang,
            format!("Explain your experience with {lang} and a challenging problem you solved."),
        ));
    }
    for framework in stack.frameworks.iter().take(MAX_FRAMEWORK_QUESTIONS) {
        questions.push(question(
            framework,
            format!("What are the key features of {framework} and why did you choose it?"),
        ));
    }
    for db in stack.databases.iter().take(MAX_DATABASE_QUESTIONS) {
        questions.push(question(
            db,
            format!("How do you optimize queries in {db} for large-scale applications?"),
        ));
    }

    questions.truncate(count);
    questions
}

/// General questions used to pad a short question list.
fn general_questions(position: &str) -> Vec<TechnicalQuestion> {
    [
        format!("Describe a challenging project you've worked on as a {position}."),
        "How do you approach debugging complex issues in production?".to_string(),
        "What best practices do you follow in your development workflow?".to_string(),
        "How do you stay updated with the latest technologies?".to_string(),
        "Tell me about a time you had to learn a new technology quickly.".to_string(),
    ]
    .into_iter()
    .map(|text| question(GENERAL_TECHNOLOGY, text))
    .collect()
}

/// Brings a question list to exactly `count` items when possible: truncates long lists,
/// tops short ones up with template questions, then general questions, skipping duplicates.
pub fn fit_to_count(
    mut questions: Vec<TechnicalQuestion>,
    stack: &TechStack,
    position: &str,
    count: usize,
) -> Vec<TechnicalQuestion> {
    if questions.len() >= count {
        questions.truncate(count);
        return questions;
    }

    let candidates = template_questions(stack, usize::MAX)
        .into_iter()
        .chain(general_questions(position));
    for candidate in candidates {
        if questions.len() >= count {
            break;
        }
        if !questions.iter().any(|q| q.question == candidate.question) {
            questions.push(candidate);
        }
    }
    questions
}

/// Deterministic generator: templates for the stack, padded to `count`.
pub fn generate_questions(stack: &TechStack, position: &str, count: usize) -> Vec<TechnicalQuestion> {
    fit_to_count(template_questions(stack, count), stack, position, count)
}

fn question(technology: &str, text: String) -> TechnicalQuestion {
    TechnicalQuestion {
        technology: technology.to_string(),
        question: text,
        difficulty: Difficulty::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_reference_stack() {
        let stack = classify_tech_stack("Python, Django, PostgreSQL, Docker");
        assert_eq!(stack.languages, vec!["python"]);
        assert_eq!(stack.frameworks, vec!["django"]);
        assert_eq!(stack.databases, vec!["postgresql"]);
        assert_eq!(stack.tools, vec!["docker"]);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let raw = "TypeScript, React, Next.js, MongoDB, Redis, AWS, Terraform";
        assert_eq!(classify_tech_stack(raw), classify_tech_stack(raw));
    }

    #[test]
    fn test_java_not_matched_inside_javascript() {
        let stack = classify_tech_stack("JavaScript and Node");
        assert_eq!(stack.languages, vec!["javascript"]);
    }

    #[test]
    fn test_symbol_terms() {
        let stack = classify_tech_stack("C++ and C# on .NET, some Go");
        assert_eq!(stack.languages, vec!["c++", "c#", "go"]);
        assert_eq!(stack.frameworks, vec![".net"]);
    }

    #[test]
    fn test_classify_nothing_known() {
        assert!(classify_tech_stack("COBOL on a mainframe").is_empty());
    }

    #[test]
    fn test_template_limits_per_category() {
        let stack = TechStack {
            languages: vec!["python".into(), "go".into(), "rust".into()],
            frameworks: vec!["django".into(), "flask".into(), "react".into()],
            databases: vec!["mysql".into(), "redis".into()],
            tools: vec!["docker".into()],
        };
        let questions = template_questions(&stack, 100);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0].technology, "python");
        assert_eq!(questions[1].technology, "go");
        assert_eq!(questions[2].technology, "django");
        assert_eq!(questions[3].technology, "flask");
        assert_eq!(questions[4].technology, "mysql");
    }

    #[test]
    fn test_generate_pads_to_count() {
        let stack = classify_tech_stack("Python, Django, PostgreSQL, Docker");
        let questions = generate_questions(&stack, "Backend Engineer", 5);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0].technology, "python");
        assert_eq!(questions[3].technology, GENERAL_TECHNOLOGY);
        assert!(questions[3].question.contains("Backend Engineer"));
    }

    #[test]
    fn test_generate_empty_stack_uses_general_questions() {
        let questions = generate_questions(&TechStack::default(), "Developer", 3);
        assert_eq!(questions.len(), 3);
        assert!(questions.iter().all(|q| q.technology == GENERAL_TECHNOLOGY));
    }

    #[test]
    fn test_fit_to_count_truncates() {
        let stack = classify_tech_stack("Python, Go, Django, Flask, MySQL");
        let long = template_questions(&stack, 100);
        assert_eq!(fit_to_count(long, &stack, "Dev", 2).len(), 2);
    }

    #[test]
    fn test_fit_to_count_skips_duplicates() {
        let stack = classify_tech_stack("Rust");
        let existing = template_questions(&stack, 1);
        let fitted = fit_to_count(existing, &stack, "Dev", 3);
        assert_eq!(fitted.len(), 3);
        assert_ne!(fitted[0].question, fitted[1].question);
    }
}
