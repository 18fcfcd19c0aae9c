//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services validate input, evaluate access policy and orchestrate
//! database operations.

mod catalog;
mod content;
mod directory;
mod feed;
mod interaction;
mod validate;

pub(crate) use validate::page;

pub use catalog::{AuthorDetail, BookInput, CatalogService};
pub use content::{CommentDeletion, ContentService, PostChanges, PostDetail};
pub use directory::{DirectoryService, ProfileSummary};
pub use feed::FeedService;
pub use interaction::InteractionService;
