//! API request and response DTOs
//!
//! Data Transfer Objects for the JSON surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{Book, CommentView, NotificationView, User};
use crate::service::{AuthorDetail, PostDetail, ProfileSummary};

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub bio: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            bio: user.bio.clone(),
            role: user.role().as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

/// The caller's own profile, including email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            role: user.role().as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummaryResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub following_count: i64,
    pub followers_count: i64,
}

impl From<&ProfileSummary> for UserSummaryResponse {
    fn from(summary: &ProfileSummary) -> Self {
        Self {
            user: UserResponse::from(&summary.user),
            following_count: summary.following_count,
            followers_count: summary.followers_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: ProfileResponse,
}

// =============================================================================
// Posts & comments
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PostListParams {
    pub author: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_username: String,
    pub tags: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PostDetail> for PostResponse {
    fn from(detail: PostDetail) -> Self {
        let post = detail.post;
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author_username: post.author_username,
            tags: detail.tags,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub post: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub post: String,
    pub content: String,
    pub author_id: String,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CommentView> for CommentResponse {
    fn from(comment: CommentView) -> Self {
        Self {
            id: comment.id,
            post: comment.post_id,
            content: comment.content,
            author_id: comment.author_id,
            author_username: comment.author_username,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

// =============================================================================
// Interactions
// =============================================================================

/// Plain confirmation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub message: String,
    pub created: bool,
    pub like_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowResponse {
    pub message: String,
    pub following: bool,
}

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: String,
    pub actor_id: String,
    pub actor_username: String,
    pub verb: String,
    pub target: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationView> for NotificationResponse {
    fn from(n: NotificationView) -> Self {
        Self {
            id: n.id,
            actor_id: n.actor_id,
            actor_username: n.actor_username,
            verb: n.verb,
            target: n.target,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

// =============================================================================
// Book catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthorRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub publication_year: i64,
    /// Author ID
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct BookListParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub publication_year: i64,
    pub author: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            publication_year: book.publication_year,
            author: book.author_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: String,
    pub name: String,
    pub books: Vec<BookResponse>,
}

impl From<AuthorDetail> for AuthorResponse {
    fn from(detail: AuthorDetail) -> Self {
        Self {
            id: detail.author.id,
            name: detail.author.name,
            books: detail.books.into_iter().map(BookResponse::from).collect(),
        }
    }
}
