use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::*;

const USER_COLS: &str =
    "id, email, role, is_active, last_login, login_count, created_at, updated_at";
const ORG_COLS: &str =
    "o.id, o.name, o.url, o.email, o.phone, o.address, o.created_by, o.is_deleted, o.created_at, o.updated_at";
const LEAGUE_COLS: &str = "id, org_id, sport_id, venue_id, name, description, season_start_date, \
    season_end_date, registration_deadline, game_occurrences, pricing_strategy, pricing_amount, \
    duration, minimum_team_players, status, rejection_reason, created_by, created_at, updated_at";
const SPORT_COLS: &str =
    "id, name, description, status, rejection_reason, created_by, created_at, updated_at";
const VENUE_COLS: &str = "id, name, address, latitude, longitude, status, rejection_reason, \
    created_by, created_at, updated_at";
const DRAFT_COLS: &str = "id, org_id, created_by, draft_data, created_at, updated_at";
const TEMPLATE_COLS: &str =
    "id, org_id, name, template_data, created_by, created_at, updated_at";
const NOTIFICATION_COLS: &str = "id, user_id, type, title, message, read, league_id, \
    organization_id, created_at, updated_at";
/// Approved leagues whose organization is still live.
const PUBLIC_LEAGUES: &str = "WHERE status = 'approved' \
    AND org_id IN (SELECT id FROM organizations WHERE NOT is_deleted)";
const PREFERENCE_COLS: &str =
    "user_id, league_approved, league_rejected, league_submitted, draft_saved, template_saved";

/// Postgres-backed store. Which database role it runs as is decided by the
/// pool it was built from.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn leagues_where(&self, clause: &str) -> AppResult<Vec<League>> {
        let sql = format!("SELECT {LEAGUE_COLS} FROM leagues {clause} ORDER BY created_at DESC, id DESC");
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn leagues_page(&self, clause: &str, page: Page) -> AppResult<(Vec<League>, i64)> {
        let sql = format!(
            "SELECT {LEAGUE_COLS} FROM leagues {clause} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*)::bigint FROM leagues {clause}"))
            .fetch_one(&self.pool)
            .await?;
        Ok((rows, total))
    }
}

fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as(&format!(
            "INSERT INTO users (id, email, role) VALUES ($1, $2, $3) RETURNING {USER_COLS}"
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists"))
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        Ok(
            sqlx::query_as(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn user_exists(&self, id: &str) -> AppResult<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn list_active_admins(&self) -> AppResult<Vec<User>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {USER_COLS} FROM users WHERE role = 'admin' AND is_active ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_last_login(&self, id: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE users SET last_login = NOW(), login_count = login_count + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_role(&self, id: &str, role: GlobalRole) -> AppResult<Option<User>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_user_active(&self, id: &str, active: bool) -> AppResult<Option<User>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization(&self, org: &NewOrganization) -> AppResult<Organization> {
        let mut tx = self.pool.begin().await?;

        let row: Organization = sqlx::query_as(&format!(
            "INSERT INTO organizations AS o (name, url, email, phone, address, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORG_COLS}"
        ))
        .bind(&org.name)
        .bind(&org.url)
        .bind(&org.email)
        .bind(&org.phone)
        .bind(&org.address)
        .bind(&org.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO org_memberships (user_id, org_id, role, is_active) VALUES ($1, $2, 'owner', TRUE)",
        )
        .bind(&org.created_by)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn get_organization(&self, id: Uuid) -> AppResult<Option<Organization>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {ORG_COLS} FROM organizations o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_organizations(&self) -> AppResult<Vec<Organization>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {ORG_COLS} FROM organizations o WHERE NOT o.is_deleted ORDER BY o.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_organizations_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<OrganizationWithRole>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {ORG_COLS}, m.role FROM organizations o \
             JOIN org_memberships m ON m.org_id = o.id \
             WHERE m.user_id = $1 AND m.is_active AND NOT o.is_deleted \
             ORDER BY m.joined_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_membership(
        &self,
        user_id: &str,
        org_id: Uuid,
    ) -> AppResult<Option<OrgMembership>> {
        Ok(sqlx::query_as(
            "SELECT user_id, org_id, role, is_active, joined_at FROM org_memberships \
             WHERE user_id = $1 AND org_id = $2",
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn link_user(
        &self,
        user_id: &str,
        org_id: Uuid,
        role: OrgRole,
    ) -> AppResult<OrgMembership> {
        Ok(sqlx::query_as(
            "INSERT INTO org_memberships (user_id, org_id, role, is_active) VALUES ($1, $2, $3, TRUE) \
             ON CONFLICT (user_id, org_id) DO UPDATE SET role = EXCLUDED.role, is_active = TRUE \
             RETURNING user_id, org_id, role, is_active, joined_at",
        )
        .bind(user_id)
        .bind(org_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_members(&self, org_id: Uuid) -> AppResult<Vec<OrgMember>> {
        Ok(sqlx::query_as(
            "SELECT m.user_id, COALESCE(u.email, '') AS email, m.role, m.joined_at \
             FROM org_memberships m LEFT JOIN users u ON u.id = m.user_id \
             WHERE m.org_id = $1 AND m.is_active ORDER BY m.joined_at",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn remove_user(&self, user_id: &str, org_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE org_memberships SET is_active = FALSE \
             WHERE user_id = $1 AND org_id = $2 AND is_active",
        )
        .bind(user_id)
        .bind(org_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        changes: &OrganizationChanges,
    ) -> AppResult<Option<Organization>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE organizations AS o SET \
               name = COALESCE(TRIM($2), o.name), \
               url = COALESCE($3, o.url), \
               email = COALESCE($4, o.email), \
               phone = COALESCE($5, o.phone), \
               address = COALESCE($6, o.address), \
               updated_at = NOW() \
             WHERE o.id = $1 AND NOT o.is_deleted RETURNING {ORG_COLS}"
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.url)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.address)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn soft_delete_organization(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE organizations SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LeagueStore for PgStore {
    async fn get_all_leagues(&self) -> AppResult<Vec<League>> {
        self.leagues_where("").await
    }

    async fn get_approved_leagues(&self) -> AppResult<Vec<League>> {
        self.leagues_where(PUBLIC_LEAGUES).await
    }

    async fn get_approved_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)> {
        self.leagues_page(PUBLIC_LEAGUES, page).await
    }

    async fn get_league(&self, id: i64) -> AppResult<Option<League>> {
        Ok(
            sqlx::query_as(&format!("SELECT {LEAGUE_COLS} FROM leagues WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_leagues_by_org(&self, org_id: Uuid) -> AppResult<Vec<League>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {LEAGUE_COLS} FROM leagues WHERE org_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_leagues_by_org_and_status(
        &self,
        org_id: Uuid,
        status: SubmissionStatus,
    ) -> AppResult<Vec<League>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {LEAGUE_COLS} FROM leagues WHERE org_id = $1 AND status = $2 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(org_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_league(&self, league: &NewLeague) -> AppResult<League> {
        let input = &league.input;
        Ok(sqlx::query_as(&format!(
            "INSERT INTO leagues (org_id, sport_id, venue_id, name, description, season_start_date, \
             season_end_date, registration_deadline, game_occurrences, pricing_strategy, pricing_amount, \
             duration, minimum_team_players, status, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {LEAGUE_COLS}"
        ))
        .bind(league.org_id)
        .bind(input.sport_id)
        .bind(input.venue_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.season_start_date)
        .bind(input.season_end_date)
        .bind(input.registration_deadline)
        .bind(Json(&input.game_occurrences))
        .bind(input.pricing_strategy.as_str())
        .bind(input.pricing_amount)
        .bind(input.duration)
        .bind(input.minimum_team_players)
        .bind(league.status.as_str())
        .bind(&league.created_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_pending_leagues(&self) -> AppResult<Vec<League>> {
        self.leagues_where("WHERE status = 'pending'").await
    }

    async fn get_pending_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)> {
        self.leagues_page("WHERE status = 'pending'", page).await
    }

    async fn get_all_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)> {
        self.leagues_page("", page).await
    }

    async fn update_league_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<League>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE leagues SET status = $2, rejection_reason = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $4 RETURNING {LEAGUE_COLS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(rejection_reason)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_league(&self, id: i64, input: &LeagueInput) -> AppResult<Option<League>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE leagues SET sport_id = $2, venue_id = $3, name = $4, description = $5, \
             season_start_date = $6, season_end_date = $7, registration_deadline = $8, \
             game_occurrences = $9, pricing_strategy = $10, pricing_amount = $11, duration = $12, \
             minimum_team_players = $13, updated_at = NOW() \
             WHERE id = $1 RETURNING {LEAGUE_COLS}"
        ))
        .bind(id)
        .bind(input.sport_id)
        .bind(input.venue_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.season_start_date)
        .bind(input.season_end_date)
        .bind(input.registration_deadline)
        .bind(Json(&input.game_occurrences))
        .bind(input.pricing_strategy.as_str())
        .bind(input.pricing_amount)
        .bind(input.duration)
        .bind(input.minimum_team_players)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn approve_league_with_children(&self, id: i64) -> AppResult<Option<Approval>> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let locked: Option<League> = sqlx::query_as(&format!(
            "SELECT {LEAGUE_COLS} FROM leagues WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = locked else {
            return Ok(None);
        };
        if current.status == SubmissionStatus::Approved {
            return Ok(Some(Approval::Unchanged(current)));
        }
        let (sport_id, venue_id) = (current.sport_id, current.venue_id);

        if let Some(sid) = sport_id {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT id FROM sports WHERE id = $1 FOR UPDATE")
                    .bind(sid)
                    .fetch_optional(&mut *tx)
                    .await?;
            if found.is_none() {
                return Err(AppError::NotFound(format!("Sport {sid} not found")));
            }
            sqlx::query(
                "UPDATE sports SET status = 'approved', rejection_reason = NULL, updated_at = NOW() \
                 WHERE id = $1 AND status = 'pending'",
            )
            .bind(sid)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(vid) = venue_id {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT id FROM venues WHERE id = $1 FOR UPDATE")
                    .bind(vid)
                    .fetch_optional(&mut *tx)
                    .await?;
            if found.is_none() {
                return Err(AppError::NotFound(format!("Venue {vid} not found")));
            }
            sqlx::query(
                "UPDATE venues SET status = 'approved', rejection_reason = NULL, updated_at = NOW() \
                 WHERE id = $1 AND status = 'pending'",
            )
            .bind(vid)
            .execute(&mut *tx)
            .await?;
        }

        let league: League = sqlx::query_as(&format!(
            "UPDATE leagues SET status = 'approved', rejection_reason = NULL, updated_at = NOW() \
             WHERE id = $1 RETURNING {LEAGUE_COLS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(Approval::Applied(league)))
    }
}

#[async_trait]
impl SportStore for PgStore {
    async fn get_all_sports(&self) -> AppResult<Vec<Sport>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {SPORT_COLS} FROM sports ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_approved_sports(&self) -> AppResult<Vec<Sport>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {SPORT_COLS} FROM sports WHERE status = 'approved' ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_sport(&self, id: i64) -> AppResult<Option<Sport>> {
        Ok(
            sqlx::query_as(&format!("SELECT {SPORT_COLS} FROM sports WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_sport_by_name(&self, name: &str) -> AppResult<Option<Sport>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {SPORT_COLS} FROM sports WHERE LOWER(name) = LOWER(TRIM($1))"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_sport(&self, sport: &NewSport) -> AppResult<Sport> {
        sqlx::query_as(&format!(
            "INSERT INTO sports (name, description, status, created_by) VALUES (TRIM($1), $2, $3, $4) \
             RETURNING {SPORT_COLS}"
        ))
        .bind(&sport.name)
        .bind(&sport.description)
        .bind(sport.status.as_str())
        .bind(&sport.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Sport already exists"))
    }

    async fn get_pending_sports(&self) -> AppResult<Vec<Sport>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {SPORT_COLS} FROM sports WHERE status = 'pending' ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_sport_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<Sport>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE sports SET status = $2, rejection_reason = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $4 RETURNING {SPORT_COLS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(rejection_reason)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl VenueStore for PgStore {
    async fn get_all_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {VENUE_COLS} FROM venues ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_approved_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {VENUE_COLS} FROM venues WHERE status = 'approved' ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_venue(&self, id: i64) -> AppResult<Option<Venue>> {
        Ok(
            sqlx::query_as(&format!("SELECT {VENUE_COLS} FROM venues WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_venue_by_address(&self, address: &str) -> AppResult<Option<Venue>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {VENUE_COLS} FROM venues WHERE LOWER(address) = LOWER(TRIM($1))"
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_venue(&self, venue: &NewVenue) -> AppResult<Venue> {
        sqlx::query_as(&format!(
            "INSERT INTO venues (name, address, latitude, longitude, status, created_by) \
             VALUES (TRIM($1), TRIM($2), $3, $4, $5, $6) RETURNING {VENUE_COLS}"
        ))
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(venue.latitude)
        .bind(venue.longitude)
        .bind(venue.status.as_str())
        .bind(&venue.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Venue already exists"))
    }

    async fn get_pending_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {VENUE_COLS} FROM venues WHERE status = 'pending' ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_venue_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<Venue>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE venues SET status = $2, rejection_reason = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $4 RETURNING {VENUE_COLS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(rejection_reason)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl DraftStore for PgStore {
    async fn get_draft(&self, org_id: Uuid, created_by: &str) -> AppResult<Option<Draft>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {DRAFT_COLS} FROM league_drafts WHERE org_id = $1 AND created_by = $2"
        ))
        .bind(org_id)
        .bind(created_by)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn save_draft(&self, org_id: Uuid, created_by: &str, data: &Value) -> AppResult<Draft> {
        Ok(sqlx::query_as(&format!(
            "INSERT INTO league_drafts (org_id, created_by, draft_data) VALUES ($1, $2, $3) \
             ON CONFLICT (org_id, created_by) \
             DO UPDATE SET draft_data = EXCLUDED.draft_data, updated_at = NOW() \
             RETURNING {DRAFT_COLS}"
        ))
        .bind(org_id)
        .bind(created_by)
        .bind(data)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_draft(&self, id: i64, org_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM league_drafts WHERE id = $1 AND org_id = $2")
            .bind(id)
            .bind(org_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_drafts_by_org(&self, org_id: Uuid) -> AppResult<Vec<Draft>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {DRAFT_COLS} FROM league_drafts WHERE org_id = $1 ORDER BY updated_at DESC, id DESC"
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_all_drafts(&self) -> AppResult<Vec<Draft>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {DRAFT_COLS} FROM league_drafts ORDER BY updated_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl TemplateStore for PgStore {
    async fn create_template(&self, template: &NewTemplate) -> AppResult<Template> {
        Ok(sqlx::query_as(&format!(
            "INSERT INTO league_templates (org_id, name, template_data, created_by) \
             VALUES ($1, TRIM($2), $3, $4) RETURNING {TEMPLATE_COLS}"
        ))
        .bind(template.org_id)
        .bind(&template.name)
        .bind(&template.template_data)
        .bind(&template.created_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_template(&self, id: i64) -> AppResult<Option<Template>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLS} FROM league_templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_templates_by_org(&self, org_id: Uuid) -> AppResult<Vec<Template>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLS} FROM league_templates WHERE org_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_template(
        &self,
        id: i64,
        name: &str,
        data: &Value,
    ) -> AppResult<Option<Template>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE league_templates SET name = TRIM($2), template_data = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {TEMPLATE_COLS}"
        ))
        .bind(id)
        .bind(name)
        .bind(data)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_template(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM league_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn get_preferences(&self, user_id: &str) -> AppResult<Option<NotificationPreferences>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {PREFERENCE_COLS} FROM notification_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_preferences(
        &self,
        prefs: &NotificationPreferences,
    ) -> AppResult<NotificationPreferences> {
        Ok(sqlx::query_as(&format!(
            "INSERT INTO notification_preferences ({PREFERENCE_COLS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id) DO UPDATE SET \
               league_approved = EXCLUDED.league_approved, \
               league_rejected = EXCLUDED.league_rejected, \
               league_submitted = EXCLUDED.league_submitted, \
               draft_saved = EXCLUDED.draft_saved, \
               template_saved = EXCLUDED.template_saved, \
               updated_at = NOW() \
             RETURNING {PREFERENCE_COLS}"
        ))
        .bind(&prefs.user_id)
        .bind(prefs.league_approved)
        .bind(prefs.league_rejected)
        .bind(prefs.league_submitted)
        .bind(prefs.draft_saved)
        .bind(prefs.template_saved)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_notification(&self, n: &NewNotification) -> AppResult<Notification> {
        sqlx::query_as(&format!(
            "INSERT INTO notifications (user_id, type, title, message, league_id, organization_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {NOTIFICATION_COLS}"
        ))
        .bind(&n.user_id)
        .bind(&n.kind)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.league_id)
        .bind(n.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound(format!("Recipient {} not found", n.user_id))
            }
            _ => AppError::Database(e),
        })
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        page: Page,
    ) -> AppResult<(Vec<Notification>, i64)> {
        let rows = sqlx::query_as(&format!(
            "SELECT {NOTIFICATION_COLS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*)::bigint FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok((rows, total))
    }

    async fn mark_read(&self, id: i64, user_id: &str) -> AppResult<Option<Notification>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE notifications SET read = TRUE, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {NOTIFICATION_COLS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, updated_at = NOW() WHERE user_id = $1 AND NOT read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: &str) -> AppResult<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*)::bigint FROM notifications WHERE user_id = $1 AND NOT read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = include_str!("../../migrations/20250101000000_init.sql");

    #[test]
    fn every_submission_table_ties_reason_to_rejection() {
        for table in ["sports", "venues", "leagues"] {
            let start = SCHEMA
                .find(&format!("CREATE TABLE IF NOT EXISTS {table} ("))
                .unwrap();
            let body = &SCHEMA[start..start + SCHEMA[start..].find(");").unwrap()];
            assert!(
                body.contains(&format!("CONSTRAINT {table}_rejection_reason_iff_rejected"))
                    && body.contains("(status = 'rejected') = (rejection_reason IS NOT NULL"),
                "{table} lacks the rejection reason constraint"
            );
        }
    }
}
