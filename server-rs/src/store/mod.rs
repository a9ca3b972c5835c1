//! Persistence contract for every durable entity.
//!
//! Each mutation is a single statement against the database, except
//! [`LeagueStore::approve_league_with_children`] which must be all-or-nothing.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::*;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the subject is already registered.
    async fn create_user(&self, user: &NewUser) -> AppResult<User>;
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;
    async fn user_exists(&self, id: &str) -> AppResult<bool>;
    async fn admin_exists(&self) -> AppResult<bool>;
    async fn list_active_admins(&self) -> AppResult<Vec<User>>;
    /// Sets `last_login` to now and increments `login_count` atomically.
    async fn update_last_login(&self, id: &str) -> AppResult<Option<User>>;
    async fn update_role(&self, id: &str, role: GlobalRole) -> AppResult<Option<User>>;
    async fn set_user_active(&self, id: &str, active: bool) -> AppResult<Option<User>>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Inserts the organization and links its creator as owner.
    async fn create_organization(&self, org: &NewOrganization) -> AppResult<Organization>;
    /// Returns soft-deleted rows too; callers decide visibility.
    async fn get_organization(&self, id: Uuid) -> AppResult<Option<Organization>>;
    async fn list_organizations(&self) -> AppResult<Vec<Organization>>;
    async fn list_organizations_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<OrganizationWithRole>>;
    async fn get_membership(
        &self,
        user_id: &str,
        org_id: Uuid,
    ) -> AppResult<Option<OrgMembership>>;
    /// Upserts the membership and marks it active.
    async fn link_user(&self, user_id: &str, org_id: Uuid, role: OrgRole)
        -> AppResult<OrgMembership>;
    async fn list_members(&self, org_id: Uuid) -> AppResult<Vec<OrgMember>>;
    /// Soft removal: the membership row is deactivated, not deleted.
    async fn remove_user(&self, user_id: &str, org_id: Uuid) -> AppResult<bool>;
    async fn update_organization(
        &self,
        id: Uuid,
        changes: &OrganizationChanges,
    ) -> AppResult<Option<Organization>>;
    async fn soft_delete_organization(&self, id: Uuid) -> AppResult<bool>;

    async fn user_has_access(&self, user_id: &str, org_id: Uuid) -> AppResult<bool> {
        Ok(self
            .get_membership(user_id, org_id)
            .await?
            .is_some_and(|m| m.is_active))
    }

    async fn get_user_role(&self, user_id: &str, org_id: Uuid) -> AppResult<Option<OrgRole>> {
        Ok(self
            .get_membership(user_id, org_id)
            .await?
            .filter(|m| m.is_active)
            .map(|m| m.role))
    }

    async fn is_admin_or_owner(&self, user_id: &str, org_id: Uuid) -> AppResult<bool> {
        Ok(self
            .get_user_role(user_id, org_id)
            .await?
            .is_some_and(|r| r.can_manage()))
    }
}

#[async_trait]
pub trait LeagueStore: Send + Sync {
    async fn get_all_leagues(&self) -> AppResult<Vec<League>>;
    /// Public view: approved leagues of organizations that are not deleted.
    async fn get_approved_leagues(&self) -> AppResult<Vec<League>>;
    async fn get_approved_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)>;
    async fn get_league(&self, id: i64) -> AppResult<Option<League>>;
    async fn get_leagues_by_org(&self, org_id: Uuid) -> AppResult<Vec<League>>;
    async fn get_leagues_by_org_and_status(
        &self,
        org_id: Uuid,
        status: SubmissionStatus,
    ) -> AppResult<Vec<League>>;
    async fn create_league(&self, league: &NewLeague) -> AppResult<League>;
    async fn get_pending_leagues(&self) -> AppResult<Vec<League>>;
    async fn get_pending_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)>;
    async fn get_all_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)>;
    /// Compare-and-set: only a row still in `from` changes. `None` when the
    /// row is missing or was moved by someone else first.
    async fn update_league_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<League>>;
    async fn update_league(&self, id: i64, input: &LeagueInput) -> AppResult<Option<League>>;
    /// Approves the league and promotes the referenced sport/venue out of
    /// `pending` in one unit: either every row changes or none does. The
    /// league's status and references are read under the same lock, so an
    /// already-approved league comes back as [`Approval::Unchanged`].
    async fn approve_league_with_children(&self, id: i64) -> AppResult<Option<Approval>>;
}

#[derive(Debug, Clone)]
pub enum Approval {
    Applied(League),
    Unchanged(League),
}

#[async_trait]
pub trait SportStore: Send + Sync {
    async fn get_all_sports(&self) -> AppResult<Vec<Sport>>;
    async fn get_approved_sports(&self) -> AppResult<Vec<Sport>>;
    async fn get_sport(&self, id: i64) -> AppResult<Option<Sport>>;
    /// Case-insensitive.
    async fn get_sport_by_name(&self, name: &str) -> AppResult<Option<Sport>>;
    async fn create_sport(&self, sport: &NewSport) -> AppResult<Sport>;
    async fn get_pending_sports(&self) -> AppResult<Vec<Sport>>;
    /// Compare-and-set, as [`LeagueStore::update_league_status`].
    async fn update_sport_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<Sport>>;
}

#[async_trait]
pub trait VenueStore: Send + Sync {
    async fn get_all_venues(&self) -> AppResult<Vec<Venue>>;
    async fn get_approved_venues(&self) -> AppResult<Vec<Venue>>;
    async fn get_venue(&self, id: i64) -> AppResult<Option<Venue>>;
    /// Case-insensitive.
    async fn get_venue_by_address(&self, address: &str) -> AppResult<Option<Venue>>;
    async fn create_venue(&self, venue: &NewVenue) -> AppResult<Venue>;
    async fn get_pending_venues(&self) -> AppResult<Vec<Venue>>;
    /// Compare-and-set, as [`LeagueStore::update_league_status`].
    async fn update_venue_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<Venue>>;
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn get_draft(&self, org_id: Uuid, created_by: &str) -> AppResult<Option<Draft>>;
    /// Upsert on (org, creator); an existing draft keeps its id and `created_at`.
    async fn save_draft(&self, org_id: Uuid, created_by: &str, data: &Value) -> AppResult<Draft>;
    async fn delete_draft(&self, id: i64, org_id: Uuid) -> AppResult<bool>;
    async fn list_drafts_by_org(&self, org_id: Uuid) -> AppResult<Vec<Draft>>;
    async fn list_all_drafts(&self) -> AppResult<Vec<Draft>>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn create_template(&self, template: &NewTemplate) -> AppResult<Template>;
    async fn get_template(&self, id: i64) -> AppResult<Option<Template>>;
    async fn list_templates_by_org(&self, org_id: Uuid) -> AppResult<Vec<Template>>;
    async fn update_template(
        &self,
        id: i64,
        name: &str,
        data: &Value,
    ) -> AppResult<Option<Template>>;
    async fn delete_template(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn get_preferences(&self, user_id: &str) -> AppResult<Option<NotificationPreferences>>;
    async fn upsert_preferences(
        &self,
        prefs: &NotificationPreferences,
    ) -> AppResult<NotificationPreferences>;
    async fn insert_notification(&self, n: &NewNotification) -> AppResult<Notification>;
    /// Newest first, with the exact total for the recipient.
    async fn list_notifications(
        &self,
        user_id: &str,
        page: Page,
    ) -> AppResult<(Vec<Notification>, i64)>;
    /// Only updates when both id and recipient match.
    async fn mark_read(&self, id: i64, user_id: &str) -> AppResult<Option<Notification>>;
    async fn mark_all_read(&self, user_id: &str) -> AppResult<u64>;
    async fn unread_count(&self, user_id: &str) -> AppResult<i64>;
}

pub trait Store:
    UserStore
    + OrganizationStore
    + LeagueStore
    + SportStore
    + VenueStore
    + DraftStore
    + TemplateStore
    + NotificationStore
{
}

impl<T> Store for T where
    T: UserStore
        + OrganizationStore
        + LeagueStore
        + SportStore
        + VenueStore
        + DraftStore
        + TemplateStore
        + NotificationStore
{
}
