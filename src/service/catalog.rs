//! Book catalog service
//!
//! Authors and their books. Reads are public; mutations need an
//! authenticated actor.

use chrono::{Datelike, Utc};
use std::sync::Arc;

use super::validate;
use crate::auth::Policy;
use crate::data::{Author, Book, BookFilter, Database, EntityId, User};
use crate::error::AppError;

const MAX_AUTHOR_NAME_CHARS: usize = 100;
const MAX_BOOK_TITLE_CHARS: usize = 200;

/// Author with nested books
#[derive(Debug, Clone)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<Book>,
}

/// Book fields as submitted by a client
#[derive(Debug, Clone)]
pub struct BookInput {
    pub title: String,
    pub publication_year: i64,
    pub author_id: String,
}

/// Catalog service
pub struct CatalogService {
    db: Arc<Database>,
}

impl CatalogService {
    /// Create new catalog service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Authors
    // =========================================================================

    pub async fn create_author(&self, actor: Option<&User>, name: &str) -> Result<AuthorDetail, AppError> {
        Policy::Authenticated.enforce(actor)?;

        let author = Author {
            id: EntityId::new().0,
            name: validate::required_text("name", name, Some(MAX_AUTHOR_NAME_CHARS))?,
        };
        self.db.insert_author(&author).await?;

        tracing::info!(author_id = %author.id, "Author created");
        Ok(AuthorDetail {
            author,
            books: Vec::new(),
        })
    }

    pub async fn get_author(&self, id: &str) -> Result<AuthorDetail, AppError> {
        let author = self.db.get_author(id).await?.ok_or(AppError::NotFound)?;
        let books = self
            .db
            .get_books_by_authors(&[author.id.clone()])
            .await?
            .remove(&author.id)
            .unwrap_or_default();

        Ok(AuthorDetail { author, books })
    }

    /// All authors by name, each with their books
    pub async fn list_authors(&self) -> Result<Vec<AuthorDetail>, AppError> {
        let authors = self.db.list_authors().await?;
        let ids: Vec<String> = authors.iter().map(|a| a.id.clone()).collect();
        let mut books = self.db.get_books_by_authors(&ids).await?;

        Ok(authors
            .into_iter()
            .map(|author| {
                let books = books.remove(&author.id).unwrap_or_default();
                AuthorDetail { author, books }
            })
            .collect())
    }

    // =========================================================================
    // Books
    // =========================================================================

    async fn validated_book(&self, id: String, input: BookInput) -> Result<Book, AppError> {
        let title = validate::required_text("title", &input.title, Some(MAX_BOOK_TITLE_CHARS))?;

        if input.publication_year > i64::from(Utc::now().year()) {
            return Err(AppError::field(
                "publication_year",
                "Publication year cannot be in the future.",
            ));
        }

        if self.db.get_author(&input.author_id).await?.is_none() {
            return Err(AppError::field(
                "author",
                format!("Invalid pk \"{}\" - object does not exist.", input.author_id),
            ));
        }

        Ok(Book {
            id,
            title,
            publication_year: input.publication_year,
            author_id: input.author_id,
        })
    }

    pub async fn create_book(&self, actor: Option<&User>, input: BookInput) -> Result<Book, AppError> {
        Policy::Authenticated.enforce(actor)?;

        let book = self.validated_book(EntityId::new().0, input).await?;
        self.db.insert_book(&book).await?;

        tracing::info!(book_id = %book.id, author_id = %book.author_id, "Book created");
        Ok(book)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, AppError> {
        self.db.get_book(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, AppError> {
        self.db.list_books(filter).await
    }

    /// Replace all fields of a book
    pub async fn update_book(
        &self,
        actor: Option<&User>,
        id: &str,
        input: BookInput,
    ) -> Result<Book, AppError> {
        Policy::Authenticated.enforce(actor)?;

        let existing = self.get_book(id).await?;
        let book = self.validated_book(existing.id, input).await?;
        if !self.db.update_book(&book).await? {
            return Err(AppError::NotFound);
        }

        Ok(book)
    }

    pub async fn delete_book(&self, actor: Option<&User>, id: &str) -> Result<(), AppError> {
        Policy::Authenticated.enforce(actor)?;

        if !self.db.delete_book(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BookOrdering;
    use crate::service::test_support::{create_test_db, seed_user};

    fn input(title: &str, year: i64, author_id: &str) -> BookInput {
        BookInput {
            title: title.to_string(),
            publication_year: year,
            author_id: author_id.to_string(),
        }
    }

    #[tokio::test]
    async fn mutations_require_authentication() {
        let (db, _temp_dir) = create_test_db().await;
        let catalog = CatalogService::new(db);

        assert!(matches!(
            catalog.create_author(None, "Anonymous").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn future_publication_year_is_rejected() {
        let (db, _temp_dir) = create_test_db().await;
        let librarian = seed_user(&db, "librarian").await;
        let catalog = CatalogService::new(db);

        let author = catalog
            .create_author(Some(&librarian), "Octavia Butler")
            .await
            .unwrap();
        let next_year = i64::from(Utc::now().year()) + 1;

        let error = catalog
            .create_book(
                Some(&librarian),
                input("Parable of the Talents", next_year, &author.author.id),
            )
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Publication year cannot be in the future.");

        let unknown_author = catalog
            .create_book(Some(&librarian), input("Kindred", 1979, "missing"))
            .await;
        assert!(matches!(
            unknown_author,
            Err(AppError::Validation {
                field: Some("author"),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn authors_nest_their_books() {
        let (db, _temp_dir) = create_test_db().await;
        let librarian = seed_user(&db, "librarian").await;
        let catalog = CatalogService::new(db);

        let butler = catalog
            .create_author(Some(&librarian), "Octavia Butler")
            .await
            .unwrap();
        let herbert = catalog
            .create_author(Some(&librarian), "Frank Herbert")
            .await
            .unwrap();
        catalog
            .create_book(Some(&librarian), input("Kindred", 1979, &butler.author.id))
            .await
            .unwrap();
        let dune = catalog
            .create_book(Some(&librarian), input("Dune", 1965, &herbert.author.id))
            .await
            .unwrap();

        let authors = catalog.list_authors().await.unwrap();
        let names: Vec<_> = authors.iter().map(|a| a.author.name.as_str()).collect();
        assert_eq!(names, vec!["Frank Herbert", "Octavia Butler"]);
        assert_eq!(authors[0].books[0].title, "Dune");

        let oldest_first = catalog
            .list_books(&BookFilter {
                ordering: BookOrdering::YearAsc,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(oldest_first[0].id, dune.id);

        let updated = catalog
            .update_book(
                Some(&librarian),
                &dune.id,
                input("Dune Messiah", 1969, &herbert.author.id),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Dune Messiah");

        catalog.delete_book(Some(&librarian), &dune.id).await.unwrap();
        assert!(catalog.get_author(&herbert.author.id).await.unwrap().books.is_empty());
        assert!(matches!(
            catalog.delete_book(Some(&librarian), &dune.id).await,
            Err(AppError::NotFound)
        ));
    }
}
