//! Data models
//!
//! Rust structs representing database entities and joined read views.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Users
// =============================================================================

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: Option<String>,
    /// Values: admin, librarian, member
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Parsed role; unknown values degrade to member
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Member)
    }
}

/// Single role attribute used by role-gated views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Librarian,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Librarian => "librarian",
            Self::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "librarian" => Some(Self::Librarian),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

/// Directed follow edge
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Content
// =============================================================================

/// A post owned by its author
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Post joined with author name and interaction counts
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Post list filter
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<String>,
    pub tag: Option<String>,
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Comment joined with author name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_username: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Interactions
// =============================================================================

/// Like record, unique per (user, post)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

/// Notification for user interactions
///
/// Only ever written as a side effect of a like, comment or follow.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: String,
    pub verb: String,
    /// Denormalized label of the thing acted upon
    pub target: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build an unread notification stamped now
    pub fn new(recipient_id: &str, actor_id: &str, verb: NotificationVerb, target: &str) -> Self {
        Self {
            id: EntityId::new().0,
            recipient_id: recipient_id.to_string(),
            actor_id: actor_id.to_string(),
            verb: verb.as_str().to_string(),
            target: target.to_string(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Notification joined with the actor's username
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationView {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: String,
    pub actor_username: String,
    pub verb: String,
    pub target: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVerb {
    LikedPost,
    CommentedOnPost,
    Followed,
}

impl NotificationVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LikedPost => "liked your post",
            Self::CommentedOnPost => "commented on your post",
            Self::Followed => "started following you",
        }
    }
}

// =============================================================================
// Book catalog
// =============================================================================

/// A writer; one author has many books
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// A book written by one author
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub publication_year: i64,
    pub author_id: String,
}

/// Sort key for book listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookOrdering {
    #[default]
    TitleAsc,
    TitleDesc,
    YearAsc,
    YearDesc,
}

impl BookOrdering {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "title" => Some(Self::TitleAsc),
            "-title" => Some(Self::TitleDesc),
            "publication_year" => Some(Self::YearAsc),
            "-publication_year" => Some(Self::YearDesc),
            _ => None,
        }
    }

    pub(crate) fn sql(&self) -> &'static str {
        match self {
            Self::TitleAsc => "b.title COLLATE NOCASE ASC, b.id ASC",
            Self::TitleDesc => "b.title COLLATE NOCASE DESC, b.id DESC",
            Self::YearAsc => "b.publication_year ASC, b.id ASC",
            Self::YearDesc => "b.publication_year DESC, b.id DESC",
        }
    }
}

/// Book list filter
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author_id: Option<String>,
    pub publication_year: Option<i64>,
    /// Case-insensitive substring of title or author name
    pub search: Option<String>,
    pub ordering: BookOrdering,
}
