//! Users service
//!
//! Manages the local account list (seeded with one demo account) and the
//! active session pointer. The session is a cached copy of one account and
//! is rewritten whenever that account changes.

use crate::clock::{Clock, IdGenerator};
use crate::crypto;
use crate::database::{PlanTier, Repository, StoredUser, Theme, User, UserPatch};
use crate::error::{AppError, Result};
use crate::services::gamification::{apply_xp, calculate_level, XpAward};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEMO_USER_ID: &str = "user_demo";
pub const DEMO_USER_NAME: &str = "Demo";
pub const DEMO_USER_EMAIL: &str = "demo@lumina.local";
pub const DEMO_USER_PASSWORD: &str = "demo1234";
const DEMO_USER_XP: u64 = 1250;

/// Service for accounts and the active session
#[derive(Clone)]
pub struct UsersService {
    repo: Repository,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    /// Serializes read-modify-write cycles on the users list
    write_lock: Arc<Mutex<()>>,
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl UsersService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            repo,
            clock,
            ids,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Seed the demo account if it is missing
    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.repo.load_users().await?;

        if users.iter().any(|u| same_email(&u.user.email, DEMO_USER_EMAIL)) {
            return Ok(());
        }

        users.push(StoredUser {
            user: User {
                id: DEMO_USER_ID.to_string(),
                name: DEMO_USER_NAME.to_string(),
                email: DEMO_USER_EMAIL.to_string(),
                plan: PlanTier::Free,
                xp: DEMO_USER_XP,
                level: calculate_level(DEMO_USER_XP),
                theme: Theme::Blue,
                has_seen_onboarding: false,
            },
            password_hash: crypto::hash_password(DEMO_USER_PASSWORD)?,
            created_at: self.clock.now(),
        });
        self.repo.save_users(&users).await?;

        tracing::info!("Seeded demo account {}", DEMO_USER_EMAIL);
        Ok(())
    }

    /// All accounts, without credentials
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.repo.load_users().await?;
        Ok(users.into_iter().map(|u| u.user).collect())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let users = self.repo.load_users().await?;
        Ok(users.into_iter().find(|u| u.user.id == id).map(|u| u.user))
    }

    /// Create a Free-tier account and log it in
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }

        let user = {
            let _guard = self.write_lock.lock().await;
            let mut users = self.repo.load_users().await?;

            if users.iter().any(|u| same_email(&u.user.email, email)) {
                return Err(AppError::EmailTaken(email.to_string()));
            }

            let user = User {
                id: self.ids.next_id(),
                name: name.to_string(),
                email: email.to_string(),
                plan: PlanTier::Free,
                xp: 0,
                level: 1,
                theme: Theme::Blue,
                has_seen_onboarding: false,
            };
            users.push(StoredUser {
                user: user.clone(),
                password_hash: crypto::hash_password(password)?,
                created_at: self.clock.now(),
            });
            self.repo.save_users(&users).await?;
            user
        };

        tracing::info!("Registered user {} ({})", user.id, user.email);
        self.start_session(&user).await?;
        Ok(user)
    }

    /// Match credentials against the account list and start a session
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let users = self.repo.load_users().await?;
        let user = users
            .into_iter()
            .find(|u| same_email(&u.user.email, email))
            .filter(|u| crypto::verify_password(password, &u.password_hash))
            .map(|u| u.user)
            .ok_or(AppError::InvalidCredentials)?;

        tracing::info!("User {} logged in", user.id);
        self.start_session(&user).await?;
        Ok(user)
    }

    /// Apply a patch to an account
    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User> {
        self.modify_user(id, |user| {
            if let Some(name) = patch.name {
                user.name = name;
            }
            if let Some(plan) = patch.plan {
                user.plan = plan;
            }
            if let Some(theme) = patch.theme {
                user.theme = theme;
            }
            if let Some(seen) = patch.has_seen_onboarding {
                user.has_seen_onboarding = seen;
            }
        })
        .await
    }

    /// Add XP to a paid account. Free accounts accrue nothing and get `None`.
    pub async fn award_xp(&self, id: &str, amount: u64) -> Result<Option<XpAward>> {
        let user = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;

        if !user.plan.is_paid() {
            tracing::debug!("Skipping XP award for free-tier user {}", id);
            return Ok(None);
        }

        let mut award = None;
        self.modify_user(id, |user| {
            let result = apply_xp(user.xp, user.level, amount);
            user.xp = result.xp;
            user.level = result.level;
            award = Some(result);
        })
        .await?;

        if let Some(award) = award {
            tracing::debug!("User {} now has {} XP (level {})", id, award.xp, award.level);
        }
        Ok(award)
    }

    // ===== Session =====

    pub async fn active_session(&self) -> Result<Option<User>> {
        self.repo.load_session().await
    }

    pub async fn start_session(&self, user: &User) -> Result<()> {
        self.repo.save_session(user).await
    }

    pub async fn end_session(&self) -> Result<()> {
        tracing::info!("Session ended");
        self.repo.clear_session().await
    }

    /// Reload the session user from the account list. Clears the session
    /// when the account no longer exists.
    pub async fn refresh_session(&self) -> Result<Option<User>> {
        let Some(cached) = self.active_session().await? else {
            return Ok(None);
        };

        match self.get_user(&cached.id).await? {
            Some(fresh) => {
                if fresh != cached {
                    self.repo.save_session(&fresh).await?;
                }
                Ok(Some(fresh))
            }
            None => {
                tracing::warn!("Session user {} no longer exists", cached.id);
                self.repo.clear_session().await?;
                Ok(None)
            }
        }
    }

    async fn modify_user<F>(&self, id: &str, change: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        let _guard = self.write_lock.lock().await;
        let mut users = self.repo.load_users().await?;

        let stored = users
            .iter_mut()
            .find(|u| u.user.id == id)
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;
        change(&mut stored.user);
        let updated = stored.user.clone();

        self.repo.save_users(&users).await?;

        if let Some(session) = self.repo.load_session().await? {
            if session.id == updated.id {
                self.repo.save_session(&updated).await?;
            }
        }

        Ok(updated)
    }
}
