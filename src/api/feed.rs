//! Feed and notification endpoints

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};

use super::dto::*;
use super::extract::{Json, Path, Query};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{FeedService, InteractionService, page};

/// GET /feed
async fn get_feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = FeedService::new(state.db.clone()).feed(&user).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// GET /notifications
async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<NotificationParams>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let (limit, offset) = page(params.limit, params.offset);
    let notifications = InteractionService::new(state.db.clone())
        .notifications(&user, params.unread_only, limit, offset)
        .await?;
    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// GET /notifications/unread_count
async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = InteractionService::new(state.db.clone())
        .unread_count(&user)
        .await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /notifications/:id/read
async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    InteractionService::new(state.db.clone())
        .mark_read(&user, &id)
        .await?;
    Ok(Json(MessageResponse::new("Notification marked as read.")))
}

/// POST /notifications/read_all
async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    InteractionService::new(state.db.clone())
        .mark_all_read(&user)
        .await?;
    Ok(Json(UnreadCountResponse { unread: 0 }))
}

/// Create feed and notification router
pub fn feed_router() -> Router<AppState> {
    Router::new()
        .route("/feed", get(get_feed))
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread_count", get(unread_count))
        .route("/notifications/read_all", post(mark_all_read))
        .route("/notifications/:id/read", post(mark_read))
}
