//! Postgres persistence for conversations, transcripts and candidate profiles.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateRow;
use crate::models::conversation::{state_label, status_label, ConversationRow, MessageRow};
use crate::screening::profile::{ChatMessage, ConversationState, Profile};

const CONVERSATION_COLUMNS: &str =
    "id, user_id, state, status, message_count, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, created_at";

/// Creates a conversation with its empty profile and stores the greeting as its first message.
pub async fn create_conversation(
    pool: &PgPool,
    user_id: Uuid,
    greeting: &str,
) -> Result<(ConversationRow, Uuid), AppError> {
    let mut tx = pool.begin().await?;
    let conversation_id = Uuid::new_v4();

    let conversation: ConversationRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO conversations (id, user_id, state, status, message_count)
        VALUES ($1, $2, $3, 'active', 1)
        RETURNING {CONVERSATION_COLUMNS}
        "#
    ))
    .bind(conversation_id)
    .bind(user_id)
    .bind(state_label(ConversationState::Greeting))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO candidates (id, conversation_id, user_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let message_id = insert_message(&mut tx, conversation_id, &ChatMessage::assistant(greeting)).await?;

    tx.commit().await?;
    Ok((conversation, message_id))
}

/// Fetches a conversation only if it belongs to `user_id`.
pub async fn get_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<ConversationRow, AppError> {
    let row: Option<ConversationRow> = sqlx::query_as(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1 AND user_id = $2"
    ))
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))
}

/// The user's conversations, newest first.
pub async fn list_conversations(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ConversationRow>, AppError> {
    Ok(sqlx::query_as(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Deletes a conversation; messages and profile go with it via cascade.
pub async fn delete_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
        .bind(conversation_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Conversation {conversation_id} not found"
        )));
    }
    Ok(())
}

/// Full transcript in chronological order.
pub async fn list_messages(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<MessageRow>, AppError> {
    Ok(sqlx::query_as(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 ORDER BY seq ASC"
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?)
}

/// The last `limit` messages, oldest first.
pub async fn recent_messages(
    pool: &PgPool,
    conversation_id: Uuid,
    limit: usize,
) -> Result<Vec<ChatMessage>, AppError> {
    let mut rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 ORDER BY seq DESC LIMIT $2"
    ))
    .bind(conversation_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows.iter().map(MessageRow::to_chat_message).collect())
}

pub async fn get_candidate(pool: &PgPool, candidate_id: Uuid) -> Result<CandidateRow, AppError> {
    let row: Option<CandidateRow> = sqlx::query_as("SELECT * FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .fetch_optional(pool)
        .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))
}

pub async fn get_candidate_for_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<CandidateRow, AppError> {
    let row: Option<CandidateRow> =
        sqlx::query_as("SELECT * FROM candidates WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_optional(pool)
            .await?;

    row.ok_or_else(|| {
        AppError::NotFound(format!("No profile for conversation {conversation_id}"))
    })
}

/// Persists one completed turn atomically: the new transcript entries, the profile and the
/// conversation's state and message count. Returns the id of the last inserted message.
pub async fn save_turn(
    pool: &PgPool,
    conversation_id: Uuid,
    new_messages: &[ChatMessage],
    profile: &Profile,
    state: ConversationState,
) -> Result<Option<Uuid>, AppError> {
    let mut tx = pool.begin().await?;

    let mut last_id = None;
    for message in new_messages {
        last_id = Some(insert_message(&mut tx, conversation_id, message).await?);
    }

    save_profile(&mut tx, conversation_id, profile).await?;

    sqlx::query(
        r#"
        UPDATE conversations
        SET state = $1, status = $2, message_count = message_count + $3, updated_at = NOW()
        WHERE id = $4
        "#,
    )
    .bind(state_label(state))
    .bind(status_label(profile.status))
    .bind(new_messages.len() as i32)
    .bind(conversation_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(last_id)
}

async fn insert_message(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: Uuid,
    message: &ChatMessage,
) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, role, content)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(conversation_id)
    .bind(message.role.as_str())
    .bind(&message.content)
    .execute(&mut **tx)
    .await?;
    Ok(id)
}

async fn save_profile(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: Uuid,
    profile: &Profile,
) -> Result<(), AppError> {
    let tech_stack = profile
        .tech_stack
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(anyhow::Error::from)?;
    let questions =
        serde_json::to_value(&profile.technical_questions).map_err(anyhow::Error::from)?;
    let years_experience = years_column(profile.years_experience)?;

    sqlx::query(
        r#"
        UPDATE candidates
        SET full_name = $1, email = $2, phone = $3, years_experience = $4,
            desired_positions = $5, current_location = $6, tech_stack_raw = $7,
            tech_stack = $8, technical_questions = $9, screening_status = $10,
            screening_completed_at = $11, updated_at = NOW()
        WHERE conversation_id = $12
        "#,
    )
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(&profile.phone)
    .bind(years_experience)
    .bind(&profile.desired_positions)
    .bind(&profile.current_location)
    .bind(&profile.tech_stack_raw)
    .bind(tech_stack)
    .bind(questions)
    .bind(profile.status.as_str())
    .bind(profile.completed_at)
    .bind(conversation_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// `years_experience` as stored; a value the column cannot hold is an error, never a wrap.
fn years_column(years: Option<u32>) -> Result<Option<i32>, AppError> {
    years
        .map(i32::try_from)
        .transpose()
        .map_err(|_| AppError::Validation("Years of experience is out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::CandidateRow;
    use crate::screening::extract::{extract_years, MAX_YEARS_EXPERIENCE};
    use chrono::Utc;
    use serde_json::json;

    fn reload_years(stored: Option<i32>) -> Option<u32> {
        let row = CandidateRow {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: None,
            email: None,
            phone: None,
            years_experience: stored,
            desired_positions: vec![],
            current_location: None,
            tech_stack_raw: None,
            tech_stack: None,
            technical_questions: json!([]),
            screening_status: "in_progress".into(),
            screening_completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        row.to_profile().unwrap().years_experience
    }

    #[test]
    fn test_accepted_years_survive_save_and_reload() {
        for utterance in ["0", "I have 5 years", "70 yrs"] {
            let years = extract_years(utterance);
            assert!(years.is_some());
            let stored = years_column(years).unwrap();
            assert_eq!(reload_years(stored), years);
        }
        assert_eq!(
            reload_years(years_column(Some(MAX_YEARS_EXPERIENCE)).unwrap()),
            Some(MAX_YEARS_EXPERIENCE)
        );
    }

    #[test]
    fn test_years_column_rejects_overflow() {
        assert!(years_column(Some(3_000_000_000)).is_err());
        assert_eq!(years_column(None).unwrap(), None);
    }
}
