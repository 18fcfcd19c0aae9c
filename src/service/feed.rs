//! Feed service
//!
//! Pull-model feed: posts by everyone the reader follows, newest first.

use std::sync::Arc;

use super::content::{PostDetail, with_tags};
use crate::data::{Database, User};
use crate::error::AppError;

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    /// Create new feed service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Compose the feed for `user`
    ///
    /// Empty when the user follows no one.
    pub async fn feed(&self, user: &User) -> Result<Vec<PostDetail>, AppError> {
        let posts = self.db.get_feed(&user.id).await?;
        tracing::debug!(user_id = %user.id, count = posts.len(), "Feed composed");
        with_tags(&self.db, posts).await
    }
}
