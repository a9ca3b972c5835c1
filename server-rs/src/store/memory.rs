use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::*;

/// In-process store for tests and local development. Every operation runs
/// under one lock, so multi-row updates are trivially atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    orgs: HashMap<Uuid, Organization>,
    memberships: HashMap<(String, Uuid), OrgMembership>,
    leagues: Vec<League>,
    sports: Vec<Sport>,
    venues: Vec<Venue>,
    drafts: Vec<Draft>,
    templates: Vec<Template>,
    notifications: Vec<Notification>,
    preferences: HashMap<String, NotificationPreferences>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone, F>(rows: &[T], keep: F) -> Vec<T>
where
    F: Fn(&T) -> bool,
{
    let mut out: Vec<T> = rows.iter().filter(|r| keep(r)).cloned().collect();
    out.reverse();
    out
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(&user.id) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        let now = Utc::now();
        let row = User {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: true,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(id).cloned())
    }

    async fn user_exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.inner.lock().await.users.contains_key(id))
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        Ok(self
            .inner
            .lock()
            .await
            .users
            .values()
            .any(|u| u.role == GlobalRole::Admin))
    }

    async fn list_active_admins(&self) -> AppResult<Vec<User>> {
        let inner = self.inner.lock().await;
        let mut admins: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.is_active_admin())
            .cloned()
            .collect();
        admins.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(admins)
    }

    async fn update_last_login(&self, id: &str) -> AppResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(id).map(|u| {
            let now = Utc::now();
            u.last_login = Some(now);
            u.login_count += 1;
            u.updated_at = now;
            u.clone()
        }))
    }

    async fn update_role(&self, id: &str, role: GlobalRole) -> AppResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(id).map(|u| {
            u.role = role;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn set_user_active(&self, id: &str, active: bool) -> AppResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(id).map(|u| {
            u.is_active = active;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_organization(&self, org: &NewOrganization) -> AppResult<Organization> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let row = Organization {
            id: Uuid::new_v4(),
            name: org.name.clone(),
            url: org.url.clone(),
            email: org.email.clone(),
            phone: org.phone.clone(),
            address: org.address.clone(),
            created_by: org.created_by.clone(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        inner.orgs.insert(row.id, row.clone());
        inner.memberships.insert(
            (org.created_by.clone(), row.id),
            OrgMembership {
                user_id: org.created_by.clone(),
                org_id: row.id,
                role: OrgRole::Owner,
                is_active: true,
                joined_at: now,
            },
        );
        Ok(row)
    }

    async fn get_organization(&self, id: Uuid) -> AppResult<Option<Organization>> {
        Ok(self.inner.lock().await.orgs.get(&id).cloned())
    }

    async fn list_organizations(&self) -> AppResult<Vec<Organization>> {
        let inner = self.inner.lock().await;
        let mut orgs: Vec<Organization> =
            inner.orgs.values().filter(|o| !o.is_deleted).cloned().collect();
        orgs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orgs)
    }

    async fn list_organizations_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<OrganizationWithRole>> {
        let inner = self.inner.lock().await;
        let mut out: Vec<(chrono::DateTime<Utc>, OrganizationWithRole)> = inner
            .memberships
            .values()
            .filter(|m| m.user_id == user_id && m.is_active)
            .filter_map(|m| {
                inner
                    .orgs
                    .get(&m.org_id)
                    .filter(|o| !o.is_deleted)
                    .map(|o| {
                        (
                            m.joined_at,
                            OrganizationWithRole {
                                organization: o.clone(),
                                role: m.role,
                            },
                        )
                    })
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out.into_iter().map(|(_, o)| o).collect())
    }

    async fn get_membership(
        &self,
        user_id: &str,
        org_id: Uuid,
    ) -> AppResult<Option<OrgMembership>> {
        Ok(self
            .inner
            .lock()
            .await
            .memberships
            .get(&(user_id.to_string(), org_id))
            .cloned())
    }

    async fn link_user(
        &self,
        user_id: &str,
        org_id: Uuid,
        role: OrgRole,
    ) -> AppResult<OrgMembership> {
        let mut inner = self.inner.lock().await;
        let membership = inner
            .memberships
            .entry((user_id.to_string(), org_id))
            .and_modify(|m| {
                m.role = role;
                m.is_active = true;
            })
            .or_insert_with(|| OrgMembership {
                user_id: user_id.to_string(),
                org_id,
                role,
                is_active: true,
                joined_at: Utc::now(),
            });
        Ok(membership.clone())
    }

    async fn list_members(&self, org_id: Uuid) -> AppResult<Vec<OrgMember>> {
        let inner = self.inner.lock().await;
        let mut members: Vec<OrgMember> = inner
            .memberships
            .values()
            .filter(|m| m.org_id == org_id && m.is_active)
            .map(|m| OrgMember {
                user_id: m.user_id.clone(),
                email: inner
                    .users
                    .get(&m.user_id)
                    .map(|u| u.email.clone())
                    .unwrap_or_default(),
                role: m.role,
                joined_at: m.joined_at,
            })
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn remove_user(&self, user_id: &str, org_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner.memberships.get_mut(&(user_id.to_string(), org_id)) {
            Some(m) if m.is_active => {
                m.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_organization(
        &self,
        id: Uuid,
        changes: &OrganizationChanges,
    ) -> AppResult<Option<Organization>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.orgs.get_mut(&id).filter(|o| !o.is_deleted).map(|o| {
            if let Some(name) = &changes.name {
                o.name = name.trim().to_string();
            }
            if let Some(url) = &changes.url {
                o.url = Some(url.clone());
            }
            if let Some(email) = &changes.email {
                o.email = Some(email.clone());
            }
            if let Some(phone) = &changes.phone {
                o.phone = Some(phone.clone());
            }
            if let Some(address) = &changes.address {
                o.address = Some(address.clone());
            }
            o.updated_at = Utc::now();
            o.clone()
        }))
    }

    async fn soft_delete_organization(&self, id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        match inner.orgs.get_mut(&id) {
            Some(o) if !o.is_deleted => {
                o.is_deleted = true;
                o.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

trait Reviewable {
    fn review(&mut self, status: SubmissionStatus, reason: Option<&str>);
}

macro_rules! impl_reviewable {
    ($($ty:ty),*) => {
        $(impl Reviewable for $ty {
            fn review(&mut self, status: SubmissionStatus, reason: Option<&str>) {
                self.status = status;
                self.rejection_reason = reason.map(str::to_string);
                self.updated_at = Utc::now();
            }
        })*
    };
}

impl_reviewable!(League, Sport, Venue);

#[async_trait]
impl LeagueStore for MemoryStore {
    async fn get_all_leagues(&self) -> AppResult<Vec<League>> {
        Ok(newest_first(&self.inner.lock().await.leagues, |_| true))
    }

    async fn get_approved_leagues(&self) -> AppResult<Vec<League>> {
        let inner = self.inner.lock().await;
        Ok(newest_first(&inner.leagues, |l| {
            l.status == SubmissionStatus::Approved
                && inner.orgs.get(&l.org_id).is_some_and(|o| !o.is_deleted)
        }))
    }

    async fn get_approved_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)> {
        let rows = self.get_approved_leagues().await?;
        Ok(paginate(&rows, page))
    }

    async fn get_league(&self, id: i64) -> AppResult<Option<League>> {
        Ok(self
            .inner
            .lock()
            .await
            .leagues
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn get_leagues_by_org(&self, org_id: Uuid) -> AppResult<Vec<League>> {
        Ok(newest_first(&self.inner.lock().await.leagues, |l| {
            l.org_id == org_id
        }))
    }

    async fn get_leagues_by_org_and_status(
        &self,
        org_id: Uuid,
        status: SubmissionStatus,
    ) -> AppResult<Vec<League>> {
        Ok(newest_first(&self.inner.lock().await.leagues, |l| {
            l.org_id == org_id && l.status == status
        }))
    }

    async fn create_league(&self, league: &NewLeague) -> AppResult<League> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let input = &league.input;
        let row = League {
            id: inner.next_id(),
            org_id: league.org_id,
            sport_id: input.sport_id,
            venue_id: input.venue_id,
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            season_start_date: input.season_start_date,
            season_end_date: input.season_end_date,
            registration_deadline: input.registration_deadline,
            game_occurrences: input.game_occurrences.clone(),
            pricing_strategy: input.pricing_strategy,
            pricing_amount: input.pricing_amount,
            duration: input.duration,
            minimum_team_players: input.minimum_team_players,
            status: league.status,
            rejection_reason: None,
            created_by: league.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.leagues.push(row.clone());
        Ok(row)
    }

    async fn get_pending_leagues(&self) -> AppResult<Vec<League>> {
        Ok(newest_first(&self.inner.lock().await.leagues, |l| {
            l.status == SubmissionStatus::Pending
        }))
    }

    async fn get_pending_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)> {
        let rows = self.get_pending_leagues().await?;
        Ok(paginate(&rows, page))
    }

    async fn get_all_leagues_paginated(&self, page: Page) -> AppResult<(Vec<League>, i64)> {
        let rows = self.get_all_leagues().await?;
        Ok(paginate(&rows, page))
    }

    async fn update_league_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<League>> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .leagues
            .iter_mut()
            .find(|l| l.id == id && l.status == from)
            .map(|l| {
            l.review(status, rejection_reason);
            l.clone()
        }))
    }

    async fn update_league(&self, id: i64, input: &LeagueInput) -> AppResult<Option<League>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.leagues.iter_mut().find(|l| l.id == id).map(|l| {
            l.sport_id = input.sport_id;
            l.venue_id = input.venue_id;
            l.name = input.name.trim().to_string();
            l.description = input.description.clone();
            l.season_start_date = input.season_start_date;
            l.season_end_date = input.season_end_date;
            l.registration_deadline = input.registration_deadline;
            l.game_occurrences = input.game_occurrences.clone();
            l.pricing_strategy = input.pricing_strategy;
            l.pricing_amount = input.pricing_amount;
            l.duration = input.duration;
            l.minimum_team_players = input.minimum_team_players;
            l.updated_at = Utc::now();
            l.clone()
        }))
    }

    async fn approve_league_with_children(&self, id: i64) -> AppResult<Option<Approval>> {
        let mut inner = self.inner.lock().await;
        // Validate every row before touching any of them.
        let Some(league_idx) = inner.leagues.iter().position(|l| l.id == id) else {
            return Ok(None);
        };
        let current = &inner.leagues[league_idx];
        if current.status == SubmissionStatus::Approved {
            return Ok(Some(Approval::Unchanged(current.clone())));
        }
        let (sport_id, venue_id) = (current.sport_id, current.venue_id);
        let sport_idx = match sport_id {
            Some(sid) => Some(
                inner
                    .sports
                    .iter()
                    .position(|s| s.id == sid)
                    .ok_or_else(|| AppError::NotFound(format!("Sport {sid} not found")))?,
            ),
            None => None,
        };
        let venue_idx = match venue_id {
            Some(vid) => Some(
                inner
                    .venues
                    .iter()
                    .position(|v| v.id == vid)
                    .ok_or_else(|| AppError::NotFound(format!("Venue {vid} not found")))?,
            ),
            None => None,
        };

        if let Some(i) = sport_idx {
            let sport = &mut inner.sports[i];
            if sport.status == SubmissionStatus::Pending {
                sport.review(SubmissionStatus::Approved, None);
            }
        }
        if let Some(i) = venue_idx {
            let venue = &mut inner.venues[i];
            if venue.status == SubmissionStatus::Pending {
                venue.review(SubmissionStatus::Approved, None);
            }
        }
        let league = &mut inner.leagues[league_idx];
        league.review(SubmissionStatus::Approved, None);
        Ok(Some(Approval::Applied(league.clone())))
    }
}

#[async_trait]
impl SportStore for MemoryStore {
    async fn get_all_sports(&self) -> AppResult<Vec<Sport>> {
        Ok(newest_first(&self.inner.lock().await.sports, |_| true))
    }

    async fn get_approved_sports(&self) -> AppResult<Vec<Sport>> {
        Ok(newest_first(&self.inner.lock().await.sports, |s| {
            s.status == SubmissionStatus::Approved
        }))
    }

    async fn get_sport(&self, id: i64) -> AppResult<Option<Sport>> {
        Ok(self
            .inner
            .lock()
            .await
            .sports
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_sport_by_name(&self, name: &str) -> AppResult<Option<Sport>> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .inner
            .lock()
            .await
            .sports
            .iter()
            .find(|s| s.name.to_lowercase() == needle)
            .cloned())
    }

    async fn create_sport(&self, sport: &NewSport) -> AppResult<Sport> {
        let mut inner = self.inner.lock().await;
        let name = sport.name.trim().to_string();
        if inner
            .sports
            .iter()
            .any(|s| s.name.to_lowercase() == name.to_lowercase())
        {
            return Err(AppError::Conflict("Sport already exists".into()));
        }
        let now = Utc::now();
        let row = Sport {
            id: inner.next_id(),
            name,
            description: sport.description.clone(),
            status: sport.status,
            rejection_reason: None,
            created_by: sport.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.sports.push(row.clone());
        Ok(row)
    }

    async fn get_pending_sports(&self) -> AppResult<Vec<Sport>> {
        Ok(newest_first(&self.inner.lock().await.sports, |s| {
            s.status == SubmissionStatus::Pending
        }))
    }

    async fn update_sport_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<Sport>> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .sports
            .iter_mut()
            .find(|s| s.id == id && s.status == from)
            .map(|s| {
            s.review(status, rejection_reason);
            s.clone()
        }))
    }
}

#[async_trait]
impl VenueStore for MemoryStore {
    async fn get_all_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(newest_first(&self.inner.lock().await.venues, |_| true))
    }

    async fn get_approved_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(newest_first(&self.inner.lock().await.venues, |v| {
            v.status == SubmissionStatus::Approved
        }))
    }

    async fn get_venue(&self, id: i64) -> AppResult<Option<Venue>> {
        Ok(self
            .inner
            .lock()
            .await
            .venues
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn get_venue_by_address(&self, address: &str) -> AppResult<Option<Venue>> {
        let needle = address.trim().to_lowercase();
        Ok(self
            .inner
            .lock()
            .await
            .venues
            .iter()
            .find(|v| v.address.to_lowercase() == needle)
            .cloned())
    }

    async fn create_venue(&self, venue: &NewVenue) -> AppResult<Venue> {
        let mut inner = self.inner.lock().await;
        let address = venue.address.trim().to_string();
        if inner
            .venues
            .iter()
            .any(|v| v.address.to_lowercase() == address.to_lowercase())
        {
            return Err(AppError::Conflict("Venue already exists".into()));
        }
        let now = Utc::now();
        let row = Venue {
            id: inner.next_id(),
            name: venue.name.trim().to_string(),
            address,
            latitude: venue.latitude,
            longitude: venue.longitude,
            status: venue.status,
            rejection_reason: None,
            created_by: venue.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.venues.push(row.clone());
        Ok(row)
    }

    async fn get_pending_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(newest_first(&self.inner.lock().await.venues, |v| {
            v.status == SubmissionStatus::Pending
        }))
    }

    async fn update_venue_status(
        &self,
        id: i64,
        from: SubmissionStatus,
        status: SubmissionStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<Option<Venue>> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .venues
            .iter_mut()
            .find(|v| v.id == id && v.status == from)
            .map(|v| {
            v.review(status, rejection_reason);
            v.clone()
        }))
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn get_draft(&self, org_id: Uuid, created_by: &str) -> AppResult<Option<Draft>> {
        Ok(self
            .inner
            .lock()
            .await
            .drafts
            .iter()
            .find(|d| d.org_id == org_id && d.created_by == created_by)
            .cloned())
    }

    async fn save_draft(&self, org_id: Uuid, created_by: &str, data: &Value) -> AppResult<Draft> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        if let Some(existing) = inner
            .drafts
            .iter_mut()
            .find(|d| d.org_id == org_id && d.created_by == created_by)
        {
            existing.draft_data = data.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let row = Draft {
            id: inner.next_id(),
            org_id,
            created_by: created_by.to_string(),
            draft_data: data.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.drafts.push(row.clone());
        Ok(row)
    }

    async fn delete_draft(&self, id: i64, org_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.drafts.len();
        inner.drafts.retain(|d| !(d.id == id && d.org_id == org_id));
        Ok(inner.drafts.len() != before)
    }

    async fn list_drafts_by_org(&self, org_id: Uuid) -> AppResult<Vec<Draft>> {
        Ok(newest_first(&self.inner.lock().await.drafts, |d| {
            d.org_id == org_id
        }))
    }

    async fn list_all_drafts(&self) -> AppResult<Vec<Draft>> {
        Ok(newest_first(&self.inner.lock().await.drafts, |_| true))
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn create_template(&self, template: &NewTemplate) -> AppResult<Template> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let row = Template {
            id: inner.next_id(),
            org_id: template.org_id,
            name: template.name.trim().to_string(),
            template_data: template.template_data.clone(),
            created_by: template.created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.templates.push(row.clone());
        Ok(row)
    }

    async fn get_template(&self, id: i64) -> AppResult<Option<Template>> {
        Ok(self
            .inner
            .lock()
            .await
            .templates
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn list_templates_by_org(&self, org_id: Uuid) -> AppResult<Vec<Template>> {
        Ok(newest_first(&self.inner.lock().await.templates, |t| {
            t.org_id == org_id
        }))
    }

    async fn update_template(
        &self,
        id: i64,
        name: &str,
        data: &Value,
    ) -> AppResult<Option<Template>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.templates.iter_mut().find(|t| t.id == id).map(|t| {
            t.name = name.trim().to_string();
            t.template_data = data.clone();
            t.updated_at = Utc::now();
            t.clone()
        }))
    }

    async fn delete_template(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.templates.len();
        inner.templates.retain(|t| t.id != id);
        Ok(inner.templates.len() != before)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn get_preferences(&self, user_id: &str) -> AppResult<Option<NotificationPreferences>> {
        Ok(self.inner.lock().await.preferences.get(user_id).cloned())
    }

    async fn upsert_preferences(
        &self,
        prefs: &NotificationPreferences,
    ) -> AppResult<NotificationPreferences> {
        let mut inner = self.inner.lock().await;
        inner
            .preferences
            .insert(prefs.user_id.clone(), prefs.clone());
        Ok(prefs.clone())
    }

    async fn insert_notification(&self, n: &NewNotification) -> AppResult<Notification> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&n.user_id) {
            return Err(AppError::NotFound(format!(
                "Recipient {} not found",
                n.user_id
            )));
        }
        let now = Utc::now();
        let row = Notification {
            id: inner.next_id(),
            user_id: n.user_id.clone(),
            kind: n.kind.clone(),
            title: n.title.clone(),
            message: n.message.clone(),
            read: false,
            league_id: n.league_id,
            organization_id: n.organization_id,
            created_at: now,
            updated_at: now,
        };
        inner.notifications.push(row.clone());
        Ok(row)
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        page: Page,
    ) -> AppResult<(Vec<Notification>, i64)> {
        let rows = newest_first(&self.inner.lock().await.notifications, |n| {
            n.user_id == user_id
        });
        Ok(paginate(&rows, page))
    }

    async fn mark_read(&self, id: i64, user_id: &str) -> AppResult<Option<Notification>> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                if !n.read {
                    n.read = true;
                    n.updated_at = Utc::now();
                }
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let mut changed = 0;
        for n in inner
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            n.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: &str) -> AppResult<i64> {
        Ok(self
            .inner
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }
}
