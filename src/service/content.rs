//! Content service
//!
//! Posts, tags and comments. Every mutation runs the ownership policy
//! against the stored row before touching it.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use super::validate;
use crate::auth::Policy;
use crate::config::ContentConfig;
use crate::data::{
    Comment, CommentView, Database, EntityId, Notification, NotificationVerb, Post, PostFilter,
    PostView, User,
};
use crate::error::AppError;
use crate::metrics::{NOTIFICATIONS_TOTAL, POSTS_TOTAL};

const MAX_TITLE_CHARS: usize = 200;
const MAX_TAG_CHARS: usize = 50;

/// Post with its tag names
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostView,
    pub tags: Vec<String>,
}

/// Fields accepted when updating a post; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Outcome of a comment delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentDeletion {
    Deleted,
    /// Non-owner request answered as a no-op
    Ignored,
}

/// Trim, drop blanks and de-duplicate tag names case-insensitively
fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(AppError::field(
                "tags",
                format!("Tag names may not exceed {} characters.", MAX_TAG_CHARS),
            ));
        }
        if seen.insert(tag.to_lowercase()) {
            normalized.push(tag.to_string());
        }
    }
    Ok(normalized)
}

/// Attach tag names to a batch of post views, keeping order
pub(crate) async fn with_tags(
    db: &Database,
    posts: Vec<PostView>,
) -> Result<Vec<PostDetail>, AppError> {
    let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
    let mut tags = db.get_tags_for_posts(&ids).await?;

    Ok(posts
        .into_iter()
        .map(|post| {
            let tags = tags.remove(&post.id).unwrap_or_default();
            PostDetail { post, tags }
        })
        .collect())
}

/// Content service
pub struct ContentService {
    db: Arc<Database>,
    config: ContentConfig,
}

impl ContentService {
    /// Create new content service
    pub fn new(db: Arc<Database>, config: ContentConfig) -> Self {
        Self { db, config }
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Create a post owned by `author`
    pub async fn create_post(
        &self,
        author: &User,
        title: &str,
        content: &str,
        tags: Vec<String>,
    ) -> Result<PostDetail, AppError> {
        let now = Utc::now();
        let post = Post {
            id: EntityId::new().0,
            title: validate::required_text("title", title, Some(MAX_TITLE_CHARS))?,
            content: validate::required_text("content", content, None)?,
            author_id: author.id.clone(),
            created_at: now,
            updated_at: None,
        };
        let tags = normalize_tags(tags)?;

        self.db.insert_post(&post, &tags).await?;
        POSTS_TOTAL.with_label_values(&["created"]).inc();

        tracing::info!(post_id = %post.id, author = %author.id, "Post created");
        self.get_post(&post.id).await
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<PostDetail, AppError> {
        let post = self.db.get_post_view(id).await?.ok_or(AppError::NotFound)?;
        let mut details = with_tags(&self.db, vec![post]).await?;
        details.pop().ok_or(AppError::NotFound)
    }

    /// List posts matching `filter`, most recent first
    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostDetail>, AppError> {
        let posts = self.db.list_posts(filter).await?;
        with_tags(&self.db, posts).await
    }

    /// Update a post; owner only
    pub async fn update_post(
        &self,
        actor: &User,
        id: &str,
        changes: PostChanges,
    ) -> Result<PostDetail, AppError> {
        let mut post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        Policy::owner_of(&post).enforce(Some(actor))?;

        if let Some(title) = changes.title {
            post.title = validate::required_text("title", &title, Some(MAX_TITLE_CHARS))?;
        }
        if let Some(content) = changes.content {
            post.content = validate::required_text("content", &content, None)?;
        }
        let tags = changes.tags.map(normalize_tags).transpose()?;
        post.updated_at = Some(Utc::now());

        if !self.db.update_post(&post, tags.as_deref()).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(post_id = %post.id, "Post updated");
        self.get_post(&post.id).await
    }

    /// Delete a post; owner only
    pub async fn delete_post(&self, actor: &User, id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        Policy::owner_of(&post).enforce(Some(actor))?;

        if self.db.delete_post(&post.id).await? {
            POSTS_TOTAL.with_label_values(&["deleted"]).inc();
            tracing::info!(post_id = %post.id, "Post deleted");
        }
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comment on a post, notifying its author unless they wrote the comment
    pub async fn create_comment(
        &self,
        author: &User,
        post_id: &str,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let content = validate::required_text("content", content, None)?;
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        let comment = Comment {
            id: EntityId::new().0,
            content,
            author_id: author.id.clone(),
            post_id: post.id.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let notification = (post.author_id != author.id).then(|| {
            Notification::new(
                &post.author_id,
                &author.id,
                NotificationVerb::CommentedOnPost,
                &post.title,
            )
        });

        self.db
            .insert_comment(&comment, notification.as_ref())
            .await?;
        if notification.is_some() {
            NOTIFICATIONS_TOTAL
                .with_label_values(&[NotificationVerb::CommentedOnPost.as_str()])
                .inc();
        }

        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment created");
        self.get_comment(&comment.id).await
    }

    pub async fn get_comment(&self, id: &str) -> Result<CommentView, AppError> {
        self.db
            .get_comment_view(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// List comments, optionally for one post (which must exist)
    pub async fn list_comments(
        &self,
        post_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CommentView>, AppError> {
        if let Some(post_id) = post_id {
            self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;
        }
        self.db.list_comments(post_id, limit, offset).await
    }

    /// Edit a comment; owner only
    pub async fn update_comment(
        &self,
        actor: &User,
        id: &str,
        content: &str,
    ) -> Result<CommentView, AppError> {
        let mut comment = self.db.get_comment(id).await?.ok_or(AppError::NotFound)?;
        Policy::owner_of(&comment).enforce(Some(actor))?;

        comment.content = validate::required_text("content", content, None)?;
        comment.updated_at = Some(Utc::now());
        if !self.db.update_comment(&comment).await? {
            return Err(AppError::NotFound);
        }

        self.get_comment(&comment.id).await
    }

    /// Delete a comment
    ///
    /// Only the author removes anything. A non-owner gets `Ignored`, or
    /// `Forbidden` when `strict_comment_delete` is set.
    pub async fn delete_comment(&self, actor: &User, id: &str) -> Result<CommentDeletion, AppError> {
        let comment = self.db.get_comment(id).await?.ok_or(AppError::NotFound)?;

        match Policy::owner_of(&comment).enforce(Some(actor)) {
            Ok(()) => {}
            Err(AppError::Forbidden) if !self.config.strict_comment_delete => {
                tracing::info!(comment_id = %comment.id, user_id = %actor.id, "Ignored comment delete by non-owner");
                return Ok(CommentDeletion::Ignored);
            }
            Err(e) => return Err(e),
        }

        self.db.delete_comment(&comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Comment deleted");
        Ok(CommentDeletion::Deleted)
    }
}
