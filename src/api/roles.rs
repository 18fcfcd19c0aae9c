//! Role-gated views

use axum::{Json, Router, routing::get};

use super::dto::MessageResponse;
use crate::AppState;
use crate::auth::{CurrentUser, can_access};
use crate::data::{Role, User};
use crate::error::AppError;

fn greet(user: &User, role: Role) -> Result<Json<MessageResponse>, AppError> {
    if !can_access(user, role) {
        return Err(AppError::Forbidden);
    }
    Ok(Json(MessageResponse::new(format!(
        "Welcome to the {} area, {}.",
        role.as_str(),
        user.username
    ))))
}

/// GET /roles/admin
async fn admin_view(CurrentUser(user): CurrentUser) -> Result<Json<MessageResponse>, AppError> {
    greet(&user, Role::Admin)
}

/// GET /roles/librarian
async fn librarian_view(
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    greet(&user, Role::Librarian)
}

/// GET /roles/member
async fn member_view(CurrentUser(user): CurrentUser) -> Result<Json<MessageResponse>, AppError> {
    greet(&user, Role::Member)
}

pub fn roles_router() -> Router<AppState> {
    Router::new()
        .route("/roles/admin", get(admin_view))
        .route("/roles/librarian", get(librarian_view))
        .route("/roles/member", get(member_view))
}
