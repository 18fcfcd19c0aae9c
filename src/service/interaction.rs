//! Interaction service
//!
//! Likes and the notification inbox.

use chrono::Utc;
use std::sync::Arc;

use crate::data::{Database, EntityId, Like, Notification, NotificationVerb, NotificationView, User};
use crate::error::AppError;
use crate::metrics::{LIKES_TOTAL, NOTIFICATIONS_TOTAL};

/// Interaction service
pub struct InteractionService {
    db: Arc<Database>,
}

impl InteractionService {
    /// Create new interaction service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Like a post
    ///
    /// # Returns
    /// The stored like and `true` if this call created it. Repeat likes
    /// return the existing record with `false` and emit nothing.
    pub async fn like(&self, user: &User, post_id: &str) -> Result<(Like, bool), AppError> {
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        let like = Like {
            id: EntityId::new().0,
            user_id: user.id.clone(),
            post_id: post.id.clone(),
            created_at: Utc::now(),
        };
        // No notification for self-likes
        let notification = (post.author_id != user.id).then(|| {
            Notification::new(
                &post.author_id,
                &user.id,
                NotificationVerb::LikedPost,
                &post.title,
            )
        });

        let (like, created) = self.db.insert_like(&like, notification.as_ref()).await?;

        if created {
            LIKES_TOTAL.with_label_values(&["created"]).inc();
            if notification.is_some() {
                NOTIFICATIONS_TOTAL
                    .with_label_values(&[NotificationVerb::LikedPost.as_str()])
                    .inc();
            }
            tracing::info!(user_id = %user.id, post_id = %post.id, "Post liked");
        } else {
            LIKES_TOTAL.with_label_values(&["duplicate"]).inc();
            tracing::debug!(user_id = %user.id, post_id = %post.id, "Post already liked");
        }

        Ok((like, created))
    }

    /// Remove a like if present
    ///
    /// # Returns
    /// `true` if a like was removed
    pub async fn unlike(&self, user: &User, post_id: &str) -> Result<bool, AppError> {
        self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        let removed = self.db.delete_like(&user.id, post_id).await?;
        if removed {
            LIKES_TOTAL.with_label_values(&["removed"]).inc();
        }
        Ok(removed)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub async fn notifications(
        &self,
        user: &User,
        unread_only: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<NotificationView>, AppError> {
        self.db
            .get_notifications(&user.id, unread_only, limit, offset)
            .await
    }

    pub async fn unread_count(&self, user: &User) -> Result<i64, AppError> {
        self.db.count_unread_notifications(&user.id).await
    }

    /// Mark one of the user's notifications read
    ///
    /// Someone else's notification is reported as `NotFound`.
    pub async fn mark_read(&self, user: &User, notification_id: &str) -> Result<(), AppError> {
        if self
            .db
            .mark_notification_read(notification_id, &user.id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    /// Mark all of the user's notifications read, returning how many changed
    pub async fn mark_all_read(&self, user: &User) -> Result<u64, AppError> {
        self.db.mark_all_notifications_read(&user.id).await
    }
}
