use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::screening::profile::{Profile, ScreeningStatus, TechStack, TechnicalQuestion};

/// One row of `candidates`: the persisted profile of a single conversation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<i32>,
    pub desired_positions: Vec<String>,
    pub current_location: Option<String>,
    pub tech_stack_raw: Option<String>,
    pub tech_stack: Option<Value>,
    pub technical_questions: Value,
    pub screening_status: String,
    pub screening_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CandidateRow {
    pub fn to_profile(&self) -> Result<Profile, serde_json::Error> {
        let tech_stack = self
            .tech_stack
            .clone()
            .map(serde_json::from_value::<TechStack>)
            .transpose()?;
        let technical_questions: Vec<TechnicalQuestion> =
            serde_json::from_value(self.technical_questions.clone())?;

        Ok(Profile {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            years_experience: self.years_experience.and_then(|y| u32::try_from(y).ok()),
            desired_positions: self.desired_positions.clone(),
            current_location: self.current_location.clone(),
            tech_stack_raw: self.tech_stack_raw.clone(),
            tech_stack,
            technical_questions,
            status: ScreeningStatus::from_db(&self.screening_status),
            completed_at: self.screening_completed_at,
        })
    }
}

/// API view of a stored candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for CandidateResponse {
    type Error = serde_json::Error;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(CandidateResponse {
            profile: row.to_profile()?,
            id: row.id,
            conversation_id: row.conversation_id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
