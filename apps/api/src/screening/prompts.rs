// All LLM prompt constants for the screening module.
// Reuses cross-cutting fragments from llm_client::prompts.

pub const GREETING_PROMPT: &str = "Generate a warm, professional greeting for a candidate \
    who just started the screening process. Include: a welcome to TalentScout, a brief \
    explanation of the process (gathering their details, then a few technical questions), \
    encouragement to be honest and detailed, and finally ask for their full name. \
    Keep it under 4 sentences.";

pub const CLOSING_PROMPT: &str = "Generate a warm, professional closing message for a candidate \
    who has finished the screening conversation. Thank them for their time, confirm we have \
    their information, mention that our team will review their profile and contact them, \
    and wish them well. Keep it under 4 sentences.";

/// Tech stack classification prompt. Replace `{tech_stack_raw}` before sending.
pub const TECH_STACK_PROMPT_TEMPLATE: &str = r#"Parse the following tech stack description into structured categories.

Tech Stack Description: {tech_stack_raw}

Categories:
1. languages: programming languages (e.g. Python, JavaScript, Java)
2. frameworks: frameworks and libraries (e.g. Django, React, Spring Boot)
3. databases: databases and data stores (e.g. PostgreSQL, MongoDB, MySQL)
4. tools: tools, platforms and infrastructure (e.g. Docker, Git, AWS, Kubernetes)

Return ONLY a JSON object in this exact format:
{
  "languages": ["language1"],
  "frameworks": ["framework1"],
  "databases": ["database1"],
  "tools": ["tool1"]
}

If a category is empty, use an empty array []."#;

/// Question generation prompt.
/// Replace: {num_questions}, {tech_stack}, {years_exp}, {position}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate {num_questions} technical interview questions for a candidate with the following profile:

CANDIDATE PROFILE:
- Tech Stack: {tech_stack}
- Years of Experience: {years_exp} years
- Desired Position: {position}

REQUIREMENTS:
1. Questions must be relevant to the technologies listed
2. Difficulty must match the experience level ({years_exp} years)
3. Mix conceptual and practical questions
4. Cover different technologies from the stack
5. Clear, specific, and answerable in a few paragraphs

Return ONLY a JSON array in this exact format:
[
  {
    "technology": "Technology Name",
    "question": "Question text here?",
    "difficulty": "easy" | "medium" | "hard"
  }
]

Generate exactly {num_questions} questions."#;

/// Free-form reply prompt used once every field is collected.
/// Replace: {history}, {profile_json}, {user_message}
pub const REPLY_PROMPT_TEMPLATE: &str = r#"Conversation History:
{history}

Candidate Info:
{profile_json}

User: {user_message}

Respond as the TalentScout assistant. The candidate is answering the technical questions listed in their profile or raising concerns. Acknowledge their answer briefly, and ask at most ONE follow-up question. Remind them they can say "goodbye" when they are done."#;
