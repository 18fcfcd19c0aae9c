//! Account endpoints
//!
//! Registration, login, profiles, the follow graph and role assignment.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use super::dto::*;
use super::extract::{Json, Path};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::Role;
use crate::error::AppError;
use crate::service::DirectoryService;

fn directory(state: &AppState) -> DirectoryService {
    DirectoryService::new(state.db.clone(), state.config.clone())
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(("session", token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// POST /register
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let (user, token) = directory(&state)
        .register(&req.username, &req.email, &req.password)
        .await?;

    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            token,
            user: ProfileResponse::from(&user),
        }),
    ))
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let (user, token) = directory(&state).login(&req.username, &req.password).await?;

    let jar = jar.add(session_cookie(
        token.clone(),
        state.config.should_use_secure_cookies(),
    ));
    Ok((
        jar,
        Json(AuthResponse {
            token,
            user: ProfileResponse::from(&user),
        }),
    ))
}

/// GET /profile
async fn get_profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(&user))
}

/// PATCH /profile
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let updated = directory(&state)
        .update_profile(&user, req.email.as_deref(), req.bio)
        .await?;
    Ok(Json(ProfileResponse::from(&updated)))
}

/// GET /users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserSummaryResponse>, AppError> {
    let summary = directory(&state).summary(&id).await?;
    Ok(Json(UserSummaryResponse::from(&summary)))
}

/// GET /users/:id/following
async fn get_following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = directory(&state).following(&id).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /users/:id/followers
async fn get_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = directory(&state).followers(&id).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// POST /users/:id/follow
async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FollowResponse>, AppError> {
    let created = directory(&state).follow(&user, &id).await?;
    let message = if created {
        "You are now following this user."
    } else {
        "You are already following this user."
    };
    Ok(Json(FollowResponse {
        message: message.to_string(),
        following: true,
    }))
}

/// POST /users/:id/unfollow
async fn unfollow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FollowResponse>, AppError> {
    directory(&state).unfollow(&user, &id).await?;
    Ok(Json(FollowResponse {
        message: "You have unfollowed this user.".to_string(),
        following: false,
    }))
}

/// PUT /users/:id/role
async fn assign_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let role = Role::parse(&req.role)
        .ok_or_else(|| AppError::field("role", format!("\"{}\" is not a valid choice.", req.role)))?;
    let updated = directory(&state).assign_role(&user, &id, role).await?;
    Ok(Json(UserResponse::from(&updated)))
}

/// Create account router
pub fn accounts_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/users/:id", get(get_user))
        .route("/users/:id/following", get(get_following))
        .route("/users/:id/followers", get(get_followers))
        .route("/users/:id/follow", post(follow))
        .route("/users/:id/unfollow", post(unfollow))
        .route("/users/:id/role", put(assign_role))
}
