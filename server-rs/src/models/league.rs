use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::codec::{flexible_datetime, flexible_datetime_opt, parse_clock};
use crate::error::{AppError, AppResult};
use crate::models::{ParseEnumError, Submission, SubmissionKind, SubmissionStatus};

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    PerTeam,
    PerPerson,
}

impl PricingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingStrategy::PerTeam => "per_team",
            PricingStrategy::PerPerson => "per_person",
        }
    }
}

impl FromStr for PricingStrategy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_team" => Ok(PricingStrategy::PerTeam),
            "per_person" => Ok(PricingStrategy::PerPerson),
            other => Err(ParseEnumError {
                kind: "pricing strategy",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for PricingStrategy {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOccurrence {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

impl GameOccurrence {
    fn validate(&self, index: usize) -> AppResult<()> {
        if !WEEKDAYS.contains(&self.day.trim().to_lowercase().as_str()) {
            return Err(AppError::Validation(format!(
                "game_occurrences[{index}].day must be a weekday name"
            )));
        }
        let start = parse_clock(&self.start_time).ok_or_else(|| {
            AppError::Validation(format!("game_occurrences[{index}].start_time must be HH:MM"))
        })?;
        let end = parse_clock(&self.end_time).ok_or_else(|| {
            AppError::Validation(format!("game_occurrences[{index}].end_time must be HH:MM"))
        })?;
        if end <= start {
            return Err(AppError::Validation(format!(
                "game_occurrences[{index}] must end after it starts"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct League {
    pub id: i64,
    pub org_id: Uuid,
    pub sport_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub season_start_date: DateTime<Utc>,
    #[serde(with = "flexible_datetime_opt", default)]
    pub season_end_date: Option<DateTime<Utc>>,
    #[serde(with = "flexible_datetime_opt", default)]
    pub registration_deadline: Option<DateTime<Utc>>,
    #[sqlx(json)]
    pub game_occurrences: Vec<GameOccurrence>,
    #[sqlx(try_from = "String")]
    pub pricing_strategy: PricingStrategy,
    pub pricing_amount: f64,
    pub duration: Option<i32>,
    pub minimum_team_players: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub created_by: String,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Submission for League {
    const KIND: SubmissionKind = SubmissionKind::League;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> SubmissionStatus {
        self.status
    }

    fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    fn created_by(&self) -> &str {
        &self.created_by
    }
}

/// League body as submitted by clients, for both creation and admin edits.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueInput {
    pub sport_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub season_start_date: DateTime<Utc>,
    #[serde(with = "flexible_datetime_opt", default)]
    pub season_end_date: Option<DateTime<Utc>>,
    #[serde(with = "flexible_datetime_opt", default)]
    pub registration_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_occurrences: Vec<GameOccurrence>,
    pub pricing_strategy: PricingStrategy,
    pub pricing_amount: f64,
    pub duration: Option<i32>,
    pub minimum_team_players: Option<i32>,
}

impl LeagueInput {
    pub fn validate(&self) -> AppResult<()> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > 200 {
            return Err(AppError::Validation("name must be 1-200 characters".into()));
        }
        if let Some(end) = self.season_end_date {
            if end < self.season_start_date {
                return Err(AppError::Validation(
                    "season_end_date must not precede season_start_date".into(),
                ));
            }
        }
        if let Some(deadline) = self.registration_deadline {
            if deadline > self.season_start_date {
                return Err(AppError::Validation(
                    "registration_deadline must not be after season_start_date".into(),
                ));
            }
        }
        if !self.pricing_amount.is_finite() || self.pricing_amount < 0.0 {
            return Err(AppError::Validation(
                "pricing_amount must be a non-negative number".into(),
            ));
        }
        if matches!(self.duration, Some(d) if d <= 0) {
            return Err(AppError::Validation("duration must be positive".into()));
        }
        if matches!(self.minimum_team_players, Some(n) if n <= 0) {
            return Err(AppError::Validation(
                "minimum_team_players must be positive".into(),
            ));
        }
        for (i, occurrence) in self.game_occurrences.iter().enumerate() {
            occurrence.validate(i)?;
        }
        Ok(())
    }
}

/// Everything needed to insert a league row.
#[derive(Debug, Clone)]
pub struct NewLeague {
    pub org_id: Uuid,
    pub input: LeagueInput,
    pub status: SubmissionStatus,
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(extra: serde_json::Value) -> LeagueInput {
        let mut base = json!({
            "name": "Tuesday Night Volleyball",
            "season_start_date": "2025-09-02",
            "pricing_strategy": "per_team",
            "pricing_amount": 450.0,
            "game_occurrences": [{"day": "Tuesday", "start_time": "18:30", "end_time": "21:00"}]
        });
        for (k, v) in extra.as_object().unwrap() {
            base[k] = v.clone();
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn accepts_a_reasonable_league() {
        assert!(input(json!({})).validate().is_ok());
    }

    #[test]
    fn rejects_inverted_season() {
        let bad = input(json!({"season_end_date": "2025-08-01T00:00:00Z"}));
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_deadline_after_start() {
        let bad = input(json!({"registration_deadline": "2025-09-10"}));
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_bad_occurrence() {
        let bad = input(json!({
            "game_occurrences": [{"day": "Funday", "start_time": "18:30", "end_time": "21:00"}]
        }));
        assert!(bad.validate().is_err());

        let backwards = input(json!({
            "game_occurrences": [{"day": "friday", "start_time": "21:00", "end_time": "18:30"}]
        }));
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn unknown_pricing_strategy_fails_to_decode() {
        let raw = json!({
            "name": "x",
            "season_start_date": "2025-09-02",
            "pricing_strategy": "per_game",
            "pricing_amount": 1.0
        });
        assert!(serde_json::from_value::<LeagueInput>(raw).is_err());
    }
}
