//! SQLite database operations
//!
//! All database access goes through this module.
//! Multi-row mutations that must be atomic (like + notification,
//! follow + notification, post + tags) run inside one transaction.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::models::*;
use crate::error::AppError;

const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.author_id,
        u.username AS author_username,
        p.created_at, p.updated_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_VIEW_SELECT: &str = r#"
    SELECT
        c.id, c.content, c.author_id,
        u.username AS author_username,
        c.post_id, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// Escape `%`, `_` and `\` so user text matches literally inside LIKE.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Map a users-table unique violation to a field-level validation error.
fn map_user_unique_violation(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let message = db_error.message();
            if message.contains("users.username") {
                return AppError::field("username", "A user with that username already exists.");
            }
            if message.contains("users.email") {
                return AppError::field("email", "A user with that email already exists.");
            }
        }
    }
    AppError::Database(error)
}

async fn insert_notification_in(
    conn: &mut SqliteConnection,
    notification: &Notification,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO notifications (
            id, recipient_id, actor_id, verb, target, read, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&notification.id)
    .bind(&notification.recipient_id)
    .bind(&notification.actor_id)
    .bind(&notification.verb)
    .bind(&notification.target)
    .bind(notification.read)
    .bind(&notification.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn attach_tags_in(
    conn: &mut SqliteConnection,
    post_id: &str,
    tags: &[String],
) -> Result<(), AppError> {
    for name in tags {
        sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(EntityId::new().0)
            .bind(name)
            .execute(&mut *conn)
            .await?;

        let tag_id = sqlx::query_scalar::<_, String>("SELECT id FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(&tag_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// Duplicate username/email races resolve on the unique indexes and
    /// surface as field-level validation errors.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, bio, role, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(&user.role)
        .bind(&user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_user_unique_violation)?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by username (case-insensitive)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Check whether a username is taken (case-insensitive)
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Check whether an email is taken by anyone other than `except_user_id`
    pub async fn email_exists(
        &self,
        email: &str,
        except_user_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? AND (? IS NULL OR id <> ?)",
        )
        .bind(email)
        .bind(except_user_id)
        .bind(except_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Update email and bio.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching user row exists.
    pub async fn update_user_profile(
        &self,
        user_id: &str,
        email: &str,
        bio: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET email = ?, bio = ? WHERE id = ?")
            .bind(email)
            .bind(bio)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_user_unique_violation)?;

        Ok(result.rows_affected() == 1)
    }

    /// Set a user's role
    pub async fn update_user_role(&self, user_id: &str, role: Role) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Follow graph
    // =========================================================================

    /// Insert follow edge, emitting `notification` only when the edge is new.
    ///
    /// # Returns
    /// `true` if the edge was created, `false` if it already existed.
    pub async fn insert_follow(
        &self,
        follow: &Follow,
        notification: &Notification,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(&follow.follower_id)
        .bind(&follow.followee_id)
        .bind(&follow.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            insert_notification_in(&mut tx, notification).await?;
        }

        tx.commit().await?;

        Ok(inserted)
    }

    /// Delete follow edge
    ///
    /// # Returns
    /// `true` if an edge was removed
    pub async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if `follower_id` follows `followee_id`
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Users that `user_id` follows, most recent edge first
    pub async fn get_following(&self, user_id: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC, u.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Users following `user_id`, most recent edge first
    pub async fn get_followers(&self, user_id: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = ?
            ORDER BY f.created_at DESC, u.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Count (following, followers) for a user
    pub async fn count_follow_edges(&self, user_id: &str) -> Result<(i64, i64), AppError> {
        let following: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        let followers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((following, followers))
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post and its tags atomically
    pub async fn insert_post(&self, post: &Post, tags: &[String]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, author_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author_id)
        .bind(&post.created_at)
        .bind(&post.updated_at)
        .execute(&mut *tx)
        .await?;

        attach_tags_in(&mut tx, &post.id, tags).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Update title/content and optionally replace the tag set
    pub async fn update_post(&self, post: &Post, tags: Option<&[String]>) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.updated_at)
            .bind(&post.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(tags) = tags {
            sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
                .bind(&post.id)
                .execute(&mut *tx)
                .await?;
            attach_tags_in(&mut tx, &post.id, tags).await?;
        }

        tx.commit().await?;

        Ok(true)
    }

    /// Delete post (comments, likes and tag links cascade)
    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Get post with author name and counts
    pub async fn get_post_view(&self, id: &str) -> Result<Option<PostView>, AppError> {
        let query = format!("{POST_VIEW_SELECT} WHERE p.id = ?");
        let post = sqlx::query_as::<_, PostView>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// List posts, most recent first
    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostView>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        query_builder.push(" WHERE 1 = 1");

        if let Some(author_id) = &filter.author_id {
            query_builder
                .push(" AND p.author_id = ")
                .push_bind(author_id.clone());
        }

        if let Some(tag) = &filter.tag {
            query_builder
                .push(
                    " AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                     WHERE pt.post_id = p.id AND t.name = ",
                )
                .push_bind(tag.clone())
                .push(")");
        }

        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query_builder
                .push(" AND (p.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR p.content LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        query_builder
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(filter.limit as i64)
            .push(" OFFSET ")
            .push_bind(filter.offset as i64);

        let posts = query_builder
            .build_query_as::<PostView>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Posts by every author `user_id` follows, most recent first
    pub async fn get_feed(&self, user_id: &str) -> Result<Vec<PostView>, AppError> {
        let query = format!(
            "{POST_VIEW_SELECT} \
             WHERE p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?) \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let posts = sqlx::query_as::<_, PostView>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Tag names keyed by post ID (batch operation to avoid N+1)
    pub async fn get_tags_for_posts(
        &self,
        post_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(tags);
        }

        // SQLite limits bound parameters, so chunk the IN clause
        for chunk in post_ids.chunks(100) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT pt.post_id, t.name FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.post_id IN (",
            );
            {
                let mut separated = query_builder.separated(", ");
                for post_id in chunk {
                    separated.push_bind(post_id.clone());
                }
            }
            query_builder.push(") ORDER BY t.name COLLATE NOCASE");

            let rows = query_builder
                .build_query_as::<(String, String)>()
                .fetch_all(&self.pool)
                .await?;

            for (post_id, name) in rows {
                tags.entry(post_id).or_default().push(name);
            }
        }

        Ok(tags)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert comment, plus its notification in the same transaction
    pub async fn insert_comment(
        &self,
        comment: &Comment,
        notification: Option<&Notification>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO comments (id, content, author_id, post_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.author_id)
        .bind(&comment.post_id)
        .bind(&comment.created_at)
        .bind(&comment.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(notification) = notification {
            insert_notification_in(&mut tx, notification).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Get comment with author name
    pub async fn get_comment_view(&self, id: &str) -> Result<Option<CommentView>, AppError> {
        let query = format!("{COMMENT_VIEW_SELECT} WHERE c.id = ?");
        let comment = sqlx::query_as::<_, CommentView>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// List comments, most recent first, optionally for a single post
    pub async fn list_comments(
        &self,
        post_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CommentView>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(COMMENT_VIEW_SELECT);
        if let Some(post_id) = post_id {
            query_builder
                .push(" WHERE c.post_id = ")
                .push_bind(post_id.to_string());
        }
        query_builder
            .push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let comments = query_builder
            .build_query_as::<CommentView>()
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    /// Update comment content
    pub async fn update_comment(&self, comment: &Comment) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(&comment.updated_at)
            .bind(&comment.id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete comment
    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Insert like unless the (user, post) pair already exists.
    ///
    /// The unique constraint serializes concurrent duplicates; the loser
    /// reads back the stored row. `notification` is written only together
    /// with a newly created like.
    ///
    /// # Returns
    /// The stored like and whether it was created by this call.
    pub async fn insert_like(
        &self,
        like: &Like,
        notification: Option<&Notification>,
    ) -> Result<(Like, bool), AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO likes (id, user_id, post_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, post_id) DO NOTHING
            "#,
        )
        .bind(&like.id)
        .bind(&like.user_id)
        .bind(&like.post_id)
        .bind(&like.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            let existing = sqlx::query_as::<_, Like>(
                "SELECT * FROM likes WHERE user_id = ? AND post_id = ?",
            )
            .bind(&like.user_id)
            .bind(&like.post_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok((existing, false));
        }

        if let Some(notification) = notification {
            insert_notification_in(&mut tx, notification).await?;
        }

        tx.commit().await?;

        Ok((like.clone(), true))
    }

    /// Delete like
    pub async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count likes stored for (user, post); 0 or 1
    pub async fn count_likes_by(&self, user_id: &str, post_id: &str) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?")
                .bind(user_id)
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Post IDs among `post_ids` that `user_id` has liked
    pub async fn get_liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[String],
    ) -> Result<std::collections::HashSet<String>, AppError> {
        let mut liked = std::collections::HashSet::new();
        if post_ids.is_empty() {
            return Ok(liked);
        }

        for chunk in post_ids.chunks(100) {
            let mut query_builder =
                QueryBuilder::<Sqlite>::new("SELECT post_id FROM likes WHERE user_id = ");
            query_builder.push_bind(user_id.to_string());
            query_builder.push(" AND post_id IN (");
            {
                let mut separated = query_builder.separated(", ");
                for post_id in chunk {
                    separated.push_bind(post_id.clone());
                }
            }
            query_builder.push(")");

            let ids = query_builder
                .build_query_scalar::<String>()
                .fetch_all(&self.pool)
                .await?;
            liked.extend(ids);
        }

        Ok(liked)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Get notifications for a recipient (paginated, most recent first)
    pub async fn get_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<NotificationView>, AppError> {
        let notifications = sqlx::query_as::<_, NotificationView>(
            r#"
            SELECT
                n.id, n.recipient_id, n.actor_id,
                u.username AS actor_username,
                n.verb, n.target, n.read, n.created_at
            FROM notifications n
            JOIN users u ON u.id = n.actor_id
            WHERE n.recipient_id = ? AND (? = 0 OR n.read = 0)
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Count unread notifications for a recipient
    pub async fn count_unread_notifications(&self, recipient_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND read = 0",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one notification read; only matches the recipient's own rows
    pub async fn mark_notification_read(&self, id: &str, recipient_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND recipient_id = ?")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark all of a recipient's notifications read
    pub async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE recipient_id = ? AND read = 0")
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Book catalog
    // =========================================================================

    /// Insert author
    pub async fn insert_author(&self, author: &Author) -> Result<(), AppError> {
        sqlx::query("INSERT INTO authors (id, name) VALUES (?, ?)")
            .bind(&author.id)
            .bind(&author.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get author by ID
    pub async fn get_author(&self, id: &str) -> Result<Option<Author>, AppError> {
        let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    /// List authors by name
    pub async fn list_authors(&self) -> Result<Vec<Author>, AppError> {
        let authors =
            sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY name COLLATE NOCASE, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(authors)
    }

    /// Insert book
    pub async fn insert_book(&self, book: &Book) -> Result<(), AppError> {
        sqlx::query("INSERT INTO books (id, title, publication_year, author_id) VALUES (?, ?, ?, ?)")
            .bind(&book.id)
            .bind(&book.title)
            .bind(book.publication_year)
            .bind(&book.author_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get book by ID
    pub async fn get_book(&self, id: &str) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Update book
    pub async fn update_book(&self, book: &Book) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE books SET title = ?, publication_year = ?, author_id = ? WHERE id = ?",
        )
        .bind(&book.title)
        .bind(book.publication_year)
        .bind(&book.author_id)
        .bind(&book.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete book
    pub async fn delete_book(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List books matching `filter`
    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT b.id, b.title, b.publication_year, b.author_id \
             FROM books b JOIN authors a ON a.id = b.author_id WHERE 1 = 1",
        );

        if let Some(title) = &filter.title {
            query_builder.push(" AND b.title = ").push_bind(title.clone());
        }
        if let Some(author_id) = &filter.author_id {
            query_builder
                .push(" AND b.author_id = ")
                .push_bind(author_id.clone());
        }
        if let Some(year) = filter.publication_year {
            query_builder
                .push(" AND b.publication_year = ")
                .push_bind(year);
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query_builder
                .push(" AND (b.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR a.name LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        query_builder.push(" ORDER BY ").push(filter.ordering.sql());

        let books = query_builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Books grouped by author ID
    pub async fn get_books_by_authors(
        &self,
        author_ids: &[String],
    ) -> Result<HashMap<String, Vec<Book>>, AppError> {
        let mut grouped: HashMap<String, Vec<Book>> = HashMap::new();
        if author_ids.is_empty() {
            return Ok(grouped);
        }

        for chunk in author_ids.chunks(100) {
            let mut query_builder =
                QueryBuilder::<Sqlite>::new("SELECT * FROM books WHERE author_id IN (");
            {
                let mut separated = query_builder.separated(", ");
                for author_id in chunk {
                    separated.push_bind(author_id.clone());
                }
            }
            query_builder.push(") ORDER BY title COLLATE NOCASE, id");

            let books = query_builder
                .build_query_as::<Book>()
                .fetch_all(&self.pool)
                .await?;

            for book in books {
                grouped.entry(book.author_id.clone()).or_default().push(book);
            }
        }

        Ok(grouped)
    }
}
