use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::access::EstimatedAccess;
use crate::validation::{validate_interest_reason, validate_languages, validate_name, NameError};

/// Table holding waitlist signups.
pub const WAITLIST_TABLE: &str = "waitlist_users";

/// Raw signup payload as received from clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub interest_reason: String,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupValidationError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("unknown interest reason '{0}'")]
    InterestReason(String),
    #[error("at least one supported language is required")]
    Languages,
}

impl SignupRequest {
    /// Schema-level checks that run before the waitlist service sees the signup.
    ///
    /// Email format is left to the service, which answers with a structured rejection.
    pub fn validate(self) -> Result<WaitlistCandidate, SignupValidationError> {
        let name = validate_name(&self.name)?;

        if !validate_interest_reason(&self.interest_reason) {
            return Err(SignupValidationError::InterestReason(self.interest_reason));
        }

        let (ok, preferred_languages) = validate_languages(&self.preferred_languages);
        if !ok {
            return Err(SignupValidationError::Languages);
        }

        Ok(WaitlistCandidate {
            email: self.email,
            name,
            interest_reason: self.interest_reason,
            preferred_languages,
        })
    }
}

/// Signup that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistCandidate {
    pub email: String,
    pub name: String,
    pub interest_reason: String,
    pub preferred_languages: Vec<String>,
}

/// Persisted waitlist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub interest_reason: String,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub verification_token: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Row written on signup; `id` is assigned by the store.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewWaitlistUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub interest_reason: &'a str,
    pub preferred_languages: &'a [String],
    pub created_at: DateTime<Utc>,
    pub verification_token: &'a str,
    pub is_verified: bool,
}

/// Accepts RFC 3339 timestamps and offset-less ones, which are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| serde::de::Error::custom(format!("invalid timestamp '{raw}': {err}")))
}

/// Result of a signup attempt that did not fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined {
        user_id: i64,
        /// 0 when the rank could not be counted.
        position: u64,
        /// Absent when the position is unknown.
        estimated_access: Option<EstimatedAccess>,
    },
    InvalidEmail,
    AlreadyRegistered {
        position: u64,
    },
}

impl JoinOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JoinOutcome::Joined { .. })
    }

    pub fn view(&self) -> JoinResponse {
        match self {
            JoinOutcome::Joined {
                user_id,
                position,
                estimated_access,
            } => JoinResponse {
                success: true,
                message: "You have joined the waitlist. We will contact you soon.".to_string(),
                user_id: Some(*user_id),
                waitlist_position: Some(*position),
                estimated_access: *estimated_access,
                error: None,
            },
            JoinOutcome::InvalidEmail => JoinResponse {
                success: false,
                message: "Invalid email format".to_string(),
                user_id: None,
                waitlist_position: None,
                estimated_access: None,
                error: Some("invalid_email".to_string()),
            },
            JoinOutcome::AlreadyRegistered { position } => JoinResponse {
                success: false,
                message: "This email is already registered".to_string(),
                user_id: None,
                waitlist_position: Some(*position),
                estimated_access: None,
                error: Some("email_exists".to_string()),
            },
        }
    }
}

/// Wire shape of `POST /waitlist/join` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_access: Option<EstimatedAccess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitlistStats {
    pub total_users: u64,
    pub today_signups: u64,
    pub top_languages: Vec<LanguageCount>,
    pub top_reasons: Vec<ReasonCount>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistStats {
    pub fn empty(updated_at: DateTime<Utc>) -> Self {
        Self {
            total_users: 0,
            today_signups: 0,
            top_languages: Vec::new(),
            top_reasons: Vec::new(),
            updated_at,
        }
    }
}

/// Answer for `GET /waitlist/check-email/{email}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailCheck {
    pub exists: bool,
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
}
