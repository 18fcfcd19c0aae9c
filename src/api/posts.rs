//! Post and comment endpoints
//!
//! Reads are public; writes need a session and, for edits and
//! deletes, ownership of the target.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::json;

use super::dto::*;
use super::extract::{Json, Path, Query};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::PostFilter;
use crate::error::AppError;
use crate::service::{CommentDeletion, ContentService, InteractionService, PostChanges, page};

fn content(state: &AppState) -> ContentService {
    ContentService::new(state.db.clone(), state.config.content.clone())
}

// =============================================================================
// Posts
// =============================================================================

/// GET /posts
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let (limit, offset) = page(params.limit, params.offset);
    let filter = PostFilter {
        author_id: params.author,
        tag: params.tag,
        search: params.search.filter(|s| !s.trim().is_empty()),
        limit,
        offset,
    };

    let posts = content(&state).list_posts(&filter).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// POST /posts
async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let post = content(&state)
        .create_post(&user, &req.title, &req.content, req.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// GET /posts/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let post = content(&state).get_post(&id).await?;
    Ok(Json(PostResponse::from(post)))
}

/// PUT /posts/:id
async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let changes = PostChanges {
        title: req.title,
        content: req.content,
        tags: req.tags,
    };
    let post = content(&state).update_post(&user, &id, changes).await?;
    Ok(Json(PostResponse::from(post)))
}

/// DELETE /posts/:id
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    content(&state).delete_post(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/:id/like
async fn like_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let (like, created) = InteractionService::new(state.db.clone())
        .like(&user, &id)
        .await?;

    let message = if created {
        "Post liked successfully."
    } else {
        "You already liked this post."
    };
    Ok(Json(LikeResponse {
        message: message.to_string(),
        created,
        like_id: like.id,
    }))
}

/// POST /posts/:id/unlike
async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    InteractionService::new(state.db.clone())
        .unlike(&user, &id)
        .await?;
    Ok(Json(MessageResponse::new("Post unliked successfully.")))
}

/// GET /posts/:id/comments
async fn list_post_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let (limit, offset) = page(params.limit, params.offset);
    let comments = content(&state)
        .list_comments(Some(&id), limit, offset)
        .await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

// =============================================================================
// Comments
// =============================================================================

/// GET /comments
async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let (limit, offset) = page(params.limit, params.offset);
    let comments = content(&state)
        .list_comments(params.post.as_deref(), limit, offset)
        .await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

/// POST /comments
async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let comment = content(&state)
        .create_comment(&user, &req.post, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// GET /comments/:id
async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = content(&state).get_comment(&id).await?;
    Ok(Json(CommentResponse::from(comment)))
}

/// PUT /comments/:id
async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = content(&state)
        .update_comment(&user, &id, &req.content)
        .await?;
    Ok(Json(CommentResponse::from(comment)))
}

/// DELETE /comments/:id
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let outcome = content(&state).delete_comment(&user, &id).await?;
    let deleted = outcome == CommentDeletion::Deleted;
    Ok((StatusCode::OK, Json(json!({ "deleted": deleted }))))
}

/// Create post and comment router
pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(like_post))
        .route("/posts/:id/unlike", post(unlike_post))
        .route("/posts/:id/comments", get(list_post_comments))
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/:id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
}
