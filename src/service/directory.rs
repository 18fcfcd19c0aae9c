//! User directory service
//!
//! Registration, login, the follow graph, profiles and role assignment.

use chrono::Utc;
use std::sync::Arc;

use super::validate;
use crate::auth::{Policy, Session, create_session_token, hash_password, verify_password};
use crate::config::AppConfig;
use crate::data::{
    Database, EntityId, Follow, Notification, NotificationVerb, Role, User,
};
use crate::error::AppError;
use crate::metrics::{FOLLOWS_TOTAL, NOTIFICATIONS_TOTAL, REGISTRATIONS_TOTAL};

/// Public profile with follow counts
#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub user: User,
    pub following_count: i64,
    pub followers_count: i64,
}

/// User directory service
pub struct DirectoryService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
}

impl DirectoryService {
    /// Create new directory service
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Register a new user and issue a session token
    ///
    /// # Errors
    /// Field-level `Validation` on malformed or duplicate username/email
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AppError> {
        let username = validate::username(username)?;
        let email = validate::email(email)?;
        validate::password(password)?;

        // Friendly fast path; the unique indexes still decide races
        if self.db.username_exists(&username).await? {
            return Err(AppError::field(
                "username",
                "A user with that username already exists.",
            ));
        }
        if self.db.email_exists(&email, None).await? {
            return Err(AppError::field(
                "email",
                "A user with that email already exists.",
            ));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        let is_admin = self
            .config
            .auth
            .admin_username
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(&username));
        let role = if is_admin { Role::Admin } else { Role::Member };

        let user = User {
            id: EntityId::new().0,
            username,
            email,
            password_hash,
            bio: None,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_user(&user).await?;
        REGISTRATIONS_TOTAL.inc();

        tracing::info!(user_id = %user.id, username = %user.username, role = role.as_str(), "User registered");

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Verify credentials and issue a session token
    ///
    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AppError> {
        let user = self
            .db
            .get_user_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

        if !verified {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let session = Session::for_user(user, self.config.auth.session_max_age)?;
        create_session_token(&session, &self.config.auth.session_secret)
    }

    // =========================================================================
    // Follow graph
    // =========================================================================

    /// Follow `target_id`
    ///
    /// # Returns
    /// `true` if a new edge was created, `false` if already following
    ///
    /// # Errors
    /// `SelfFollow` when actor == target, `NotFound` for unknown target
    pub async fn follow(&self, actor: &User, target_id: &str) -> Result<bool, AppError> {
        if actor.id == target_id {
            return Err(AppError::SelfFollow);
        }

        let target = self.get_user(target_id).await?;

        let follow = Follow {
            follower_id: actor.id.clone(),
            followee_id: target.id.clone(),
            created_at: Utc::now(),
        };
        let notification = Notification::new(
            &target.id,
            &actor.id,
            NotificationVerb::Followed,
            &actor.username,
        );

        let created = self.db.insert_follow(&follow, &notification).await?;
        if created {
            FOLLOWS_TOTAL.with_label_values(&["follow"]).inc();
            NOTIFICATIONS_TOTAL
                .with_label_values(&[NotificationVerb::Followed.as_str()])
                .inc();
            tracing::info!(follower = %actor.id, followee = %target.id, "Follow created");
        }

        Ok(created)
    }

    /// Unfollow `target_id`; a missing edge or user is a no-op
    pub async fn unfollow(&self, actor: &User, target_id: &str) -> Result<bool, AppError> {
        let removed = self.db.delete_follow(&actor.id, target_id).await?;
        if removed {
            FOLLOWS_TOTAL.with_label_values(&["unfollow"]).inc();
            tracing::info!(follower = %actor.id, followee = %target_id, "Follow removed");
        }
        Ok(removed)
    }

    pub async fn following(&self, user_id: &str) -> Result<Vec<User>, AppError> {
        self.get_user(user_id).await?;
        self.db.get_following(user_id).await
    }

    pub async fn followers(&self, user_id: &str) -> Result<Vec<User>, AppError> {
        self.get_user(user_id).await?;
        self.db.get_followers(user_id).await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<User, AppError> {
        self.db.get_user(id).await?.ok_or(AppError::NotFound)
    }

    /// Get user with follow counts
    pub async fn summary(&self, id: &str) -> Result<ProfileSummary, AppError> {
        let user = self.get_user(id).await?;
        let (following_count, followers_count) = self.db.count_follow_edges(&user.id).await?;

        Ok(ProfileSummary {
            user,
            following_count,
            followers_count,
        })
    }

    /// Update the actor's email and/or bio
    ///
    /// `None` leaves a field unchanged; a blank bio clears it.
    pub async fn update_profile(
        &self,
        actor: &User,
        email: Option<&str>,
        bio: Option<String>,
    ) -> Result<User, AppError> {
        let email = match email {
            Some(email) => {
                let email = validate::email(email)?;
                if self.db.email_exists(&email, Some(&actor.id)).await? {
                    return Err(AppError::field(
                        "email",
                        "A user with that email already exists.",
                    ));
                }
                email
            }
            None => actor.email.clone(),
        };
        let bio = match bio {
            Some(bio) => validate::optional_text(Some(bio)),
            None => actor.bio.clone(),
        };

        if !self
            .db
            .update_user_profile(&actor.id, &email, bio.as_deref())
            .await?
        {
            return Err(AppError::NotFound);
        }

        self.get_user(&actor.id).await
    }

    /// Assign `role` to `target_id`; admin only
    pub async fn assign_role(
        &self,
        actor: &User,
        target_id: &str,
        role: Role,
    ) -> Result<User, AppError> {
        Policy::Role(Role::Admin).enforce(Some(actor))?;

        if !self.db.update_user_role(target_id, role).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(admin = %actor.id, user_id = %target_id, role = role.as_str(), "Role assigned");
        self.get_user(target_id).await
    }
}
