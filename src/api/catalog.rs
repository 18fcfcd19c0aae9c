//! Book catalog endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use super::dto::*;
use super::extract::{Json, Path, Query};
use crate::AppState;
use crate::auth::MaybeUser;
use crate::data::{BookFilter, BookOrdering};
use crate::error::AppError;
use crate::service::{BookInput, CatalogService};

fn catalog(state: &AppState) -> CatalogService {
    CatalogService::new(state.db.clone())
}

impl From<BookRequest> for BookInput {
    fn from(req: BookRequest) -> Self {
        Self {
            title: req.title,
            publication_year: req.publication_year,
            author_id: req.author,
        }
    }
}

/// GET /authors
async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuthorResponse>>, AppError> {
    let authors = catalog(&state).list_authors().await?;
    Ok(Json(authors.into_iter().map(AuthorResponse::from).collect()))
}

/// POST /authors
async fn create_author(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<AuthorRequest>,
) -> Result<(StatusCode, Json<AuthorResponse>), AppError> {
    let author = catalog(&state)
        .create_author(user.as_ref(), &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(AuthorResponse::from(author))))
}

/// GET /authors/:id
async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuthorResponse>, AppError> {
    let author = catalog(&state).get_author(&id).await?;
    Ok(Json(AuthorResponse::from(author)))
}

/// GET /books
async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let ordering = match params.ordering.as_deref() {
        None | Some("") => BookOrdering::default(),
        Some(value) => BookOrdering::parse(value).ok_or_else(|| {
            AppError::field("ordering", format!("Unsupported ordering \"{}\".", value))
        })?,
    };
    let filter = BookFilter {
        title: params.title,
        author_id: params.author,
        publication_year: params.publication_year,
        search: params.search.filter(|s| !s.trim().is_empty()),
        ordering,
    };

    let books = catalog(&state).list_books(&filter).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// POST /books
async fn create_book(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = catalog(&state)
        .create_book(user.as_ref(), req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /books/:id
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = catalog(&state).get_book(&id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// PUT /books/:id
async fn update_book(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    let book = catalog(&state)
        .update_book(user.as_ref(), &id, req.into())
        .await?;
    Ok(Json(BookResponse::from(book)))
}

/// DELETE /books/:id
async fn delete_book(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog(&state).delete_book(user.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create catalog router
pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors).post(create_author))
        .route("/authors/:id", get(get_author))
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
}
