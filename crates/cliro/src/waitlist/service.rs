use std::sync::Arc;

use chrono::{DateTime, Days, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use super::access::EstimatedAccess;
use super::domain::{
    EmailCheck, JoinOutcome, LanguageCount, NewWaitlistUser, ReasonCount, WaitlistCandidate,
    WaitlistStats, WaitlistUser, WAITLIST_TABLE,
};
use super::stats::{top_counts, TOP_ENTRIES};
use super::token::verification_token;
use crate::persistence::{Gateway, Select, StoreError, TableStore};
use crate::validation::{sanitize_input, validate_email, NAME_MAX_LENGTH};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Signup, position and statistics over the waitlist table.
pub struct WaitlistService<S> {
    gateway: Arc<Gateway<S>>,
    clock: Clock,
}

/// Outcome of the database health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseHealth {
    Healthy,
    Unhealthy,
    Error(String),
}

impl<S> WaitlistService<S>
where
    S: TableStore + 'static,
{
    pub fn new(gateway: Arc<Gateway<S>>) -> Self {
        Self::with_clock(gateway, Arc::new(Utc::now))
    }

    pub fn with_clock(gateway: Arc<Gateway<S>>, clock: Clock) -> Self {
        Self { gateway, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Register a validated candidate.
    ///
    /// Rejections (bad email, already registered) are outcomes; only store faults are errors.
    pub async fn join_waitlist(
        &self,
        candidate: WaitlistCandidate,
    ) -> Result<JoinOutcome, WaitlistError> {
        let email = candidate.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Ok(JoinOutcome::InvalidEmail);
        }

        if let Some(existing) = self.find_user_by_email(&email).await? {
            let position = self.calculate_waitlist_position(existing.id).await;
            return Ok(JoinOutcome::AlreadyRegistered { position });
        }

        let name = sanitize_input(&candidate.name, NAME_MAX_LENGTH)
            .unwrap_or_else(|| candidate.name.clone());
        let created_at = self.now();
        let token = verification_token(&email, created_at);

        let row = NewWaitlistUser {
            email: &email,
            name: &name,
            interest_reason: &candidate.interest_reason,
            preferred_languages: &candidate.preferred_languages,
            created_at,
            verification_token: &token,
            is_verified: false,
        };
        let row =
            serde_json::to_value(&row).map_err(|err| WaitlistError::Decode(err.to_string()))?;

        let table = self.gateway.table(WAITLIST_TABLE).await?;
        let inserted = match table.insert(row).await {
            Ok(rows) => rows,
            Err(StoreError::Conflict(detail)) => {
                // lost the race against a concurrent signup for the same email
                warn!(%detail, "signup hit the unique email constraint");
                return match self.find_user_by_email(&email).await? {
                    Some(existing) => {
                        let position = self.calculate_waitlist_position(existing.id).await;
                        Ok(JoinOutcome::AlreadyRegistered { position })
                    }
                    None => Err(StoreError::Conflict(detail).into()),
                };
            }
            Err(err) => return Err(err.into()),
        };

        let stored = inserted
            .into_iter()
            .next()
            .ok_or(WaitlistError::InsertReturnedNothing)?;
        let user = decode_user(stored)?;

        let position = self.calculate_waitlist_position(user.id).await;
        let estimated_access = if position == 0 {
            warn!(user_id = user.id, "signup stored without a known position");
            None
        } else {
            Some(EstimatedAccess::for_position(
                position,
                created_at.date_naive(),
            ))
        };

        info!(
            user_id = user.id,
            interest_reason = %user.interest_reason,
            position,
            "new waitlist signup"
        );

        Ok(JoinOutcome::Joined {
            user_id: user.id,
            position,
            estimated_access,
        })
    }

    /// Exact, case-insensitive lookup that propagates store failures.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<WaitlistUser>, WaitlistError> {
        let table = self.gateway.table(WAITLIST_TABLE).await?;
        let query = Select::columns("*")
            .eq("email", email.trim().to_lowercase())
            .limit(1);
        let result = table.select(&query).await?;

        result.rows.into_iter().next().map(decode_user).transpose()
    }

    /// Lookup for display paths; store failures are logged and read as "not found".
    pub async fn get_user_by_email(&self, email: &str) -> Option<WaitlistUser> {
        match self.find_user_by_email(email).await {
            Ok(user) => user,
            Err(err) => {
                error!(error = %err, "failed to look up waitlist user");
                None
            }
        }
    }

    /// 1-based rank by insertion order, or 0 when the count cannot be read.
    ///
    /// Relies on the store assigning increasing ids. Display only.
    pub async fn calculate_waitlist_position(&self, user_id: i64) -> u64 {
        match self.count_before(user_id).await {
            Ok(before) => before + 1,
            Err(err) => {
                warn!(user_id, error = %err, "waitlist position unavailable");
                0
            }
        }
    }

    async fn count_before(&self, user_id: i64) -> Result<u64, WaitlistError> {
        let table = self.gateway.table(WAITLIST_TABLE).await?;
        let result = table.select(&Select::count_only().lt("id", user_id)).await?;
        Ok(result.count.unwrap_or(0))
    }

    /// Best-effort statistics; any failure yields an all-zero snapshot.
    pub async fn get_waitlist_stats(&self) -> WaitlistStats {
        let now = self.now();
        match self.collect_stats(now).await {
            Ok(stats) => stats,
            Err(err) => {
                error!(error = %err, "failed to collect waitlist stats");
                WaitlistStats::empty(now)
            }
        }
    }

    async fn collect_stats(&self, now: DateTime<Utc>) -> Result<WaitlistStats, WaitlistError> {
        let table = self.gateway.table(WAITLIST_TABLE).await?;

        let total_users = table
            .select(&Select::count_only())
            .await?
            .count
            .unwrap_or(0);

        let (day_start, next_day_start) = utc_day_bounds(now);
        let today_signups = table
            .select(
                &Select::count_only()
                    .gte("created_at", day_start)
                    .lt("created_at", next_day_start),
            )
            .await?
            .count
            .unwrap_or(0);

        let language_rows = table
            .select(&Select::columns("preferred_languages"))
            .await?
            .rows;
        let languages = language_rows
            .iter()
            .filter_map(|row| row.get("preferred_languages").and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_str);
        let top_languages = top_counts(languages, TOP_ENTRIES)
            .into_iter()
            .map(|(language, count)| LanguageCount { language, count })
            .collect();

        let reason_rows = table.select(&Select::columns("interest_reason")).await?.rows;
        let reasons = reason_rows
            .iter()
            .filter_map(|row| row.get("interest_reason").and_then(Value::as_str));
        let top_reasons = top_counts(reasons, TOP_ENTRIES)
            .into_iter()
            .map(|(reason, count)| ReasonCount { reason, count })
            .collect();

        Ok(WaitlistStats {
            total_users,
            today_signups,
            top_languages,
            top_reasons,
            updated_at: now,
        })
    }

    pub async fn check_email(&self, email: &str) -> EmailCheck {
        if !validate_email(email.trim()) {
            return EmailCheck {
                exists: false,
                valid: false,
                message: "Invalid email format".to_string(),
                position: None,
            };
        }

        match self.get_user_by_email(email).await {
            Some(user) => EmailCheck {
                exists: true,
                valid: true,
                message: "Email already registered".to_string(),
                position: Some(self.calculate_waitlist_position(user.id).await),
            },
            None => EmailCheck {
                exists: false,
                valid: true,
                message: "Email available".to_string(),
                position: None,
            },
        }
    }

    pub async fn database_health(&self) -> DatabaseHealth {
        match self.gateway.check().await {
            Ok(()) => DatabaseHealth::Healthy,
            Err(StoreError::Transport(_) | StoreError::Unavailable(_)) => {
                DatabaseHealth::Unhealthy
            }
            Err(other) => DatabaseHealth::Error(other.to_string()),
        }
    }
}

fn decode_user(row: Value) -> Result<WaitlistUser, WaitlistError> {
    serde_json::from_value(row).map_err(|err| WaitlistError::Decode(err.to_string()))
}

/// `[00:00 today, 00:00 tomorrow)` in UTC, formatted for range filters.
fn utc_day_bounds(now: DateTime<Utc>) -> (String, String) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    let end = start.checked_add_days(Days::new(1)).unwrap_or(start);
    (
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("insert returned no row")]
    InsertReturnedNothing,
    #[error("waitlist row could not be decoded: {0}")]
    Decode(String),
}
